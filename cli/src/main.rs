use clap::{Parser, Subcommand};

use kilo_cli::client::ReminderClient;
use kilo_cli::commands;
use kilo_cli::config::{ClientArgs, ClientConfig};
use kilo_cli::logging;
use kilo_cli::reconciler::Reconciler;
use kilo_cli::util::exit_error;

#[derive(Parser)]
#[command(name = "kilo", version, about = "Review and resolve pending Kilo reminders")]
struct Cli {
    #[command(flatten)]
    client: ClientArgs,

    /// Emit logs as JSON lines on stderr
    #[arg(long, env = "KILO_LOG_JSON")]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Poll once and print pending notifications as JSON
    Pending,
    /// Keep polling and resolve notifications interactively
    Watch,
    /// Record a resolution for a notification
    Confirm {
        /// Notification id
        id: i64,
        /// completed, skipped or snoozed
        #[arg(long)]
        action: String,
        /// Snooze duration (5, 15, 30 or 60); required with --action snoozed
        #[arg(long)]
        snooze_minutes: Option<u32>,
        /// Free-form notes (blank notes are not sent)
        #[arg(long)]
        notes: Option<String>,
    },
    /// Mark a notification read without recording an outcome
    Dismiss {
        /// Notification id
        id: i64,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();
    logging::init(cli.log_json);

    let config = ClientConfig::try_from(&cli.client).unwrap_or_else(|e| {
        exit_error(&e, Some("Check KILO_API_URL, KILO_ORIGIN and the interval/timeout settings"))
    });
    let client = ReminderClient::new(&config).unwrap_or_else(|e| {
        exit_error(&format!("Failed to build HTTP client: {e}"), None)
    });
    tracing::debug!(base_url = client.base_url(), "client configured");

    let code = match cli.command {
        Commands::Pending => {
            let reconciler = Reconciler::new(client);
            commands::pending::run(&reconciler).await
        }
        Commands::Watch => {
            let reconciler = Reconciler::new(client);
            commands::watch::run(reconciler, config.poll_interval).await
        }
        Commands::Confirm {
            id,
            action,
            snooze_minutes,
            notes,
        } => {
            commands::resolve::run(&client, id, &action, snooze_minutes, notes.as_deref()).await
        }
        Commands::Dismiss { id } => commands::dismiss::run(&client, id).await,
    };

    std::process::exit(code);
}
