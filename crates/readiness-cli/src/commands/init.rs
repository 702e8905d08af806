//! The `readiness init` command.

use anyhow::Result;

pub fn execute() -> Result<()> {
    if std::path::Path::new("readiness.toml").exists() {
        println!("readiness.toml already exists, skipping.");
    } else {
        std::fs::write("readiness.toml", SAMPLE_CONFIG)?;
        println!("Created readiness.toml");
    }

    std::fs::create_dir_all("catalog")?;
    let example_path = std::path::Path::new("catalog/example.toml");
    if example_path.exists() {
        println!("catalog/example.toml already exists, skipping.");
    } else {
        std::fs::write(example_path, EXAMPLE_CATALOG)?;
        println!("Created catalog/example.toml");
    }

    println!("\nNext steps:");
    println!("  1. Edit catalog/example.toml with your institution's modules and drills");
    println!("  2. Run: readiness validate");
    println!("  3. Run: readiness modules --learner s-1 --grade 8");

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# readiness configuration

catalog_path = "catalog"
state_path = "readiness-state.json"
default_institution_type = "school"

[institutions]
"default" = "school"
"#;

const EXAMPLE_CATALOG: &str = r#"[[modules]]
id = "fire-basics"
title = "Fire Safety Basics"
description = "Recognising fire hazards and leaving a building safely"
target_audience = "secondary"
content_type = "video"
duration_minutes = 20

[[modules]]
id = "quake-kids"
title = "Drop, Cover, Hold On"
description = "Earthquake response for younger students"
target_audience = "primary"
content_type = "interactive"
duration_minutes = 15

[[assessments]]
id = "fire-cert"
module_id = "fire-basics"
title = "Fire Safety Certification"
passing_score = 70.0
time_limit_minutes = 15
max_attempts = 3
is_certification = true

[[assessments.questions]]
id = "q1"
prompt = "What should you do first when the fire alarm sounds?"
options = ["Collect your bag", "Leave by the nearest exit", "Open the windows"]
correct_answer = "Leave by the nearest exit"

[[assessments.questions]]
id = "q2"
prompt = "Lifts are safe to use during a fire."
type = "true_false"
options = ["true", "false"]
correct_answer = "false"

[[assessments.questions]]
id = "q3"
prompt = "Where do you go after leaving the building?"
options = ["Home", "The assembly point", "The car park exit"]
correct_answer = "The assembly point"

[[alerts]]
id = "drill-week"
institution_id = "default"
title = "Evacuation drill this week"
message = "All classes will take part in an evacuation drill on Thursday."
severity = "medium"
audience = "all"
created_at = "2026-01-05T08:00:00Z"

[[protocols]]
id = "fire-evacuation"
title = "Fire Evacuation"
institution_type = "both"

[[protocols.steps]]
order = 1
instruction = "Raise the alarm"

[[protocols.steps]]
order = 2
instruction = "Leave by the nearest safe exit; do not use lifts"

[[protocols.steps]]
order = 3
instruction = "Report to your assembly point and wait for roll call"

[[protocols.assembly_points]]
name = "Main field"
location = "North side of the sports ground"

[[protocols.emergency_contacts]]
name = "Fire services"
phone = "101"
"#;
