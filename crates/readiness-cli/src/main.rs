//! readiness CLI: the user-facing command-line interface.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

use readiness_core::CoreError;

mod commands;

use commands::Identity;

#[derive(Parser)]
#[command(
    name = "readiness",
    version,
    about = "Disaster-preparedness learning: progress, assessments and alerts"
)]
struct Cli {
    /// Config file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create starter config and example catalog
    Init,

    /// Validate catalog TOML files
    Validate {
        /// Catalog file or directory (defaults to the configured catalog)
        #[arg(long)]
        catalog: Option<PathBuf>,
    },

    /// List modules available to a learner, with their progress
    Modules {
        #[command(flatten)]
        identity: Identity,
    },

    /// Start (or resume) a module
    Start {
        #[command(flatten)]
        identity: Identity,

        /// Module id
        #[arg(long)]
        module: String,
    },

    /// Record content consumption for a module in progress
    Activity {
        #[command(flatten)]
        identity: Identity,

        /// Module id
        #[arg(long)]
        module: String,

        /// Progress percentage reached (0-100)
        #[arg(long)]
        percent: f64,

        /// Minutes spent in this session
        #[arg(long, default_value = "0")]
        minutes: u32,
    },

    /// Mark a module in progress as completed
    Complete {
        #[command(flatten)]
        identity: Identity,

        /// Module id
        #[arg(long)]
        module: String,

        /// Optional score to record
        #[arg(long)]
        score: Option<f64>,
    },

    /// Show a learner's progress records
    Progress {
        #[command(flatten)]
        identity: Identity,

        /// Limit to one module
        #[arg(long)]
        module: Option<String>,
    },

    /// Begin an assessment attempt
    Begin {
        #[command(flatten)]
        identity: Identity,

        /// Assessment id
        #[arg(long)]
        assessment: String,

        /// Print the attempt as JSON
        #[arg(long)]
        json: bool,
    },

    /// Submit answers for an attempt
    Submit {
        /// Attempt id returned by `begin`
        #[arg(long)]
        attempt: String,

        /// Answer as QUESTION_ID=RESPONSE (repeatable)
        #[arg(long = "answer")]
        answers: Vec<String>,
    },

    /// Show attempt usage for an assessment
    Attempts {
        #[command(flatten)]
        identity: Identity,

        /// Assessment id
        #[arg(long)]
        assessment: String,
    },

    /// Show alerts visible to a learner
    Alerts {
        #[command(flatten)]
        identity: Identity,

        /// Only high and critical alerts
        #[arg(long)]
        urgent: bool,
    },

    /// Retract an alert (admins and coordinators only)
    Retract {
        #[command(flatten)]
        identity: Identity,

        /// Alert id
        #[arg(long)]
        alert: String,
    },

    /// Show emergency protocols for an institution
    Protocols {
        /// Institution id
        #[arg(long, default_value = "default")]
        institution: String,
    },

    /// Show aggregate statistics for a module
    Stats {
        /// Module id
        #[arg(long)]
        module: String,
    },

    /// Generate a learner progress report
    Report {
        #[command(flatten)]
        identity: Identity,

        /// Output format: html, markdown
        #[arg(long, default_value = "html")]
        format: String,

        /// Output file
        #[arg(long, default_value = "./readiness-report.html")]
        output: PathBuf,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("readiness=info".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();
    let config = cli.config.as_deref();

    let result = match cli.command {
        Commands::Init => commands::init::execute(),
        Commands::Validate { catalog } => commands::validate::execute(catalog, config),
        Commands::Modules { identity } => commands::modules::execute(identity, config).await,
        Commands::Start { identity, module } => {
            commands::progress::start(identity, module, config).await
        }
        Commands::Activity {
            identity,
            module,
            percent,
            minutes,
        } => commands::progress::activity(identity, module, percent, minutes, config).await,
        Commands::Complete {
            identity,
            module,
            score,
        } => commands::progress::complete(identity, module, score, config).await,
        Commands::Progress { identity, module } => {
            commands::progress::show(identity, module, config).await
        }
        Commands::Begin {
            identity,
            assessment,
            json,
        } => commands::attempt::begin(identity, assessment, json, config).await,
        Commands::Submit { attempt, answers } => {
            commands::attempt::submit(attempt, answers, config).await
        }
        Commands::Attempts {
            identity,
            assessment,
        } => commands::attempt::status(identity, assessment, config).await,
        Commands::Alerts { identity, urgent } => {
            commands::alerts::list(identity, urgent, config).await
        }
        Commands::Retract { identity, alert } => {
            commands::alerts::retract(identity, alert, config).await
        }
        Commands::Protocols { institution } => commands::protocols::execute(institution, config),
        Commands::Stats { module } => commands::report::stats(module, config).await,
        Commands::Report {
            identity,
            format,
            output,
        } => commands::report::execute(identity, format, output, config).await,
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        let exhausted = e
            .downcast_ref::<CoreError>()
            .is_some_and(CoreError::is_attempts_exhausted);
        process::exit(if exhausted { 3 } else { 1 });
    }
}
