use clap::{Parser, Subcommand};
use eyre::Result;

use medq_core::RecordId;

mod commands;
mod config;

#[derive(Parser)]
#[command(name = "medq")]
#[command(about = "Clinical questionnaire responses")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write the config file and an empty state file
    Init {
        /// Name recorded on audit events
        #[arg(long)]
        actor: Option<String>,
        /// Where to keep the state file
        #[arg(long)]
        state_path: Option<std::path::PathBuf>,
        /// Log as JSON lines
        #[arg(long)]
        json_logs: bool,
    },
    /// Register a patient
    AddPatient {
        name: String,
        #[arg(long)]
        gender: Option<String>,
        /// Birth date (YYYY-MM-DD)
        #[arg(long)]
        birth_date: Option<String>,
    },
    /// Register a practitioner
    AddPractitioner {
        name: String,
        #[arg(long)]
        identifier: Option<String>,
    },
    /// Register a service
    AddService {
        name: String,
        #[arg(long)]
        code: Option<String>,
    },
    /// Import a questionnaire and its questions from a JSON file
    AddQuestionnaire {
        /// Path to the questionnaire JSON
        json: std::path::PathBuf,
    },
    /// Request a questionnaire for a patient
    AddRequest {
        #[arg(long)]
        patient: RecordId,
        #[arg(long)]
        questionnaire: RecordId,
        #[arg(long)]
        performer: Option<RecordId>,
        #[arg(long)]
        service: Option<RecordId>,
    },
    /// Delete a procedure request no response refers to
    DeleteRequest { id: RecordId },
    /// Create a response directly
    Create {
        #[arg(long)]
        patient: RecordId,
        #[arg(long)]
        questionnaire: RecordId,
        #[arg(long)]
        performer: Option<RecordId>,
        #[arg(long)]
        service: Option<RecordId>,
    },
    /// Create a response from a procedure request
    FromRequest { request: RecordId },
    /// List responses
    List,
    /// Print the serialized response
    Show { id: RecordId },
    /// Print the items of a response
    Items {
        id: RecordId,
        /// Show typed answers as the filling widget sees them
        #[arg(long)]
        widget: bool,
    },
    /// Answer an item; omit the text to clear the answer
    Answer { item: RecordId, text: Option<String> },
    /// preparation -> in_progress
    Start { ids: Vec<RecordId> },
    /// in_progress -> completed
    Complete { ids: Vec<RecordId> },
    /// Back to preparation, dropping all items
    Draft { ids: Vec<RecordId> },
    /// Print the action that opens the fill form
    Fill { id: RecordId },
    /// Check the signature of a completed response
    Verify { id: RecordId },
    /// Define the sequence that numbers responses
    Sequence {
        #[arg(long, default_value = "")]
        prefix: String,
        #[arg(long, default_value_t = 5)]
        padding: usize,
    },
}

fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    if json {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    let config = config::load_or_default()?;
    init_tracing(config.json_logs);

    commands::run(cli.command, config)
}
