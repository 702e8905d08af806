//! The `readiness protocols` command.

use std::path::Path;

use anyhow::Result;

use readiness_core::protocols::applicable_protocols;

use super::Workspace;

pub fn execute(institution: String, config: Option<&Path>) -> Result<()> {
    let mut workspace = Workspace::open(config)?;
    let session = workspace.session()?;
    let institution_type = session.config.institution_type(&institution);
    let catalog = session.store().catalog();

    let protocols = applicable_protocols(institution_type, &catalog.protocols);
    println!(
        "{} protocol(s) for {institution} ({institution_type})",
        protocols.len()
    );

    for protocol in protocols {
        println!("\n== {} ==", protocol.title);
        for step in protocol.ordered_steps() {
            println!("  {}. {}", step.order, step.instruction);
        }
        if !protocol.evacuation_routes.is_empty() {
            println!("  Evacuation routes:");
            for route in &protocol.evacuation_routes {
                println!("    - {}: {}", route.name, route.description);
            }
        }
        if !protocol.assembly_points.is_empty() {
            println!("  Assembly points:");
            for point in &protocol.assembly_points {
                println!("    - {}: {}", point.name, point.location);
            }
        }
        if !protocol.emergency_contacts.is_empty() {
            println!("  Emergency contacts:");
            for contact in &protocol.emergency_contacts {
                match &contact.role {
                    Some(role) => println!("    - {} ({role}): {}", contact.name, contact.phone),
                    None => println!("    - {}: {}", contact.name, contact.phone),
                }
            }
        }
    }
    Ok(())
}
