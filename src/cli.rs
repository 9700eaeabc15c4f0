use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "meowpay")]
#[command(author, version, about = "Telegram shop bot for Premium, Stars and Coins", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Run the bot (default)
    Run {
        /// Require webhook mode; WEBHOOK_URL must be set
        #[arg(long, conflicts_with = "polling")]
        webhook: bool,

        /// Long-poll even when WEBHOOK_URL is set
        #[arg(long)]
        polling: bool,
    },

    /// Validate the environment, print a configuration summary and exit
    CheckConfig,

    /// Create ledger tables or write spreadsheet header rows
    InitStore,
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

/// How the bot receives updates
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transport {
    Polling,
    Webhook(String),
}

/// A configured `WEBHOOK_URL` selects the webhook unless `--polling` is given.
pub fn select_transport(force_polling: bool, webhook_url: Option<&str>) -> Transport {
    match webhook_url {
        Some(url) if !force_polling => Transport::Webhook(url.to_string()),
        _ => Transport::Polling,
    }
}
