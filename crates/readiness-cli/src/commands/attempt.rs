//! Assessment commands: `begin`, `submit`, `attempts`.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;
use comfy_table::{Cell, Table};

use readiness_core::model::Answer;

use super::{Identity, Workspace};

pub async fn begin(
    identity: Identity,
    assessment: String,
    json: bool,
    config: Option<&Path>,
) -> Result<()> {
    let learner = identity.learner()?;
    let mut workspace = Workspace::open(config)?;
    let session = workspace.session()?;
    let begun = session
        .services
        .governor
        .begin_attempt(&learner.id, &assessment, Utc::now())
        .await?;
    session.save()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&begun)?);
        return Ok(());
    }

    println!("Attempt: {}", begun.attempt_id);
    println!(
        "{} (attempt {}, {} remaining, {} min, due {})",
        begun.title,
        begun.attempt_number,
        begun.attempts_remaining,
        begun.time_limit_minutes,
        begun.deadline.format("%Y-%m-%d %H:%M:%S UTC")
    );
    for (i, q) in begun.questions.iter().enumerate() {
        println!("\n{}. [{}] {}", i + 1, q.id, q.prompt);
        for option in &q.options {
            println!("   - {option}");
        }
    }
    Ok(())
}

/// Parse `QUESTION_ID=RESPONSE`.
fn parse_answer(raw: &str) -> Result<Answer> {
    let (question_id, response) = raw
        .split_once('=')
        .with_context(|| format!("invalid answer '{raw}', expected QUESTION_ID=RESPONSE"))?;
    Ok(Answer::new(question_id.trim(), response))
}

pub async fn submit(attempt: String, answers: Vec<String>, config: Option<&Path>) -> Result<()> {
    let answers = answers
        .iter()
        .map(|a| parse_answer(a))
        .collect::<Result<Vec<_>>>()?;

    let mut workspace = Workspace::open(config)?;
    let session = workspace.session()?;
    let outcome = session
        .services
        .governor
        .submit_attempt(&attempt, answers, Utc::now())
        .await?;
    session.save()?;

    println!(
        "Score: {:.1}% ({})",
        outcome.score,
        if outcome.passed { "passed" } else { "not passed" }
    );
    if outcome.overtime {
        println!("Submitted after the time limit.");
    }
    if let Some(progress) = &outcome.certified_progress {
        println!("Module {} is now {}.", progress.module_id, progress.status);
    }
    Ok(())
}

pub async fn status(identity: Identity, assessment: String, config: Option<&Path>) -> Result<()> {
    let learner = identity.learner()?;
    let mut workspace = Workspace::open(config)?;
    let session = workspace.session()?;
    let status = session
        .services
        .governor
        .attempt_status(&learner.id, &assessment)
        .await?;

    let mut table = Table::new();
    table.set_header(vec!["Assessment", "Used", "Remaining", "Best score", "Passed"]);
    table.add_row(vec![
        Cell::new(&status.assessment_id),
        Cell::new(format!("{}/{}", status.attempts_used, status.max_attempts)),
        Cell::new(status.attempts_remaining),
        Cell::new(
            status
                .best_score
                .map(|s| format!("{s:.1}%"))
                .unwrap_or_else(|| "-".into()),
        ),
        Cell::new(if status.passed { "yes" } else { "no" }),
    ]);
    println!("{table}");

    if status.is_exhausted() && !status.passed {
        println!("No attempts left.");
    }
    Ok(())
}
