mod commands;
mod state;

use clap::{Parser, Subcommand};
use state::AppState;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "inboxgenie", version, about = "InboxGenie mail client", long_about = None)]
struct Cli {
    /// Config file to use instead of the platform default
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
pub(crate) enum Command {
    /// Print the Google sign-in URL
    LoginUrl,
    /// Finish sign-in from the URL the browser was redirected to
    AuthCallback { url: String },
    /// List emails
    Inbox {
        /// all, inbox, starred, archive, trash, unread, sent or a category name
        #[arg(long)]
        view: Option<String>,
        #[arg(long)]
        search: Option<String>,
        /// Only emails from the last N days
        #[arg(long)]
        days: Option<u32>,
    },
    /// Unread, starred and per-category totals
    Counts,
    Archive { id: String },
    Trash { id: String },
    /// Restore from trash
    Restore { id: String },
    Unarchive { id: String },
    /// Move back to the inbox
    InboxRestore { id: String },
    /// Mark as read
    Read { id: String },
    /// Toggle the star
    Star { id: String },
    /// AI summary of an email
    Summarize { id: String },
    /// Draft a reply to an email
    Reply {
        id: String,
        #[arg(long, default_value = "professional")]
        tone: String,
        /// Show reply suggestions instead of a full draft
        #[arg(long)]
        suggest: bool,
    },
    Send {
        #[arg(long)]
        to: String,
        #[arg(long)]
        subject: String,
        #[arg(long, default_value = "")]
        body: String,
        #[arg(long, default_value = "professional")]
        tone: String,
        /// Let the AI write or polish the body before sending
        #[arg(long)]
        generate: bool,
    },
    /// Save a draft
    Draft {
        #[arg(long, default_value = "")]
        to: String,
        #[arg(long, default_value = "")]
        subject: String,
        #[arg(long, default_value = "")]
        body: String,
    },
    /// List saved drafts
    Drafts,
    /// Rewrite text in another tone
    Rewrite {
        #[arg(long, default_value = "professional")]
        tone: String,
        text: String,
    },
    Classify { text: String },
    SmartReplies { text: String },
    Logout,
    /// Show the config file in use and the effective backend URL
    Config,
}

fn init_tracing(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let (config_manager, config) = state::load_config(cli.config)?;
    init_tracing(&config.logging.filter);

    let app_state = AppState::new(config_manager, config)?;
    if let Err(err) = commands::run(&app_state, cli.command).await {
        if commands::is_auth_failure(&err) {
            let login_url = app_state.session.login_url(&app_state.api)?;
            eprintln!("Not signed in. Open {login_url} in a browser, then run `inboxgenie auth-callback <redirect url>`.");
            std::process::exit(2);
        }
        return Err(err);
    }
    Ok(())
}
