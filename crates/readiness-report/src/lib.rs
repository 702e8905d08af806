//! readiness-report: Learner progress report generation.

pub mod html;
pub mod markdown;
