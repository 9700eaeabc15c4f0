use anyhow::Result;
use dotenvy::dotenv;
use std::net::SocketAddr;
use teloxide::prelude::*;
use teloxide::update_listeners::webhooks;

use meowpay::cli::{select_transport, Cli, Commands, Transport};
use meowpay::core::{config, init_logger, log_configuration};
use meowpay::storage::open_ledger;
use meowpay::telegram::{create_bot, notify_admin_startup, schema, setup_bot_commands, HandlerDeps};

/// Main entry point for the Telegram bot
///
/// Parses CLI arguments and dispatches to appropriate subcommand.
///
/// # Errors
/// Returns an error if initialization fails (logging, configuration, ledger, bot creation).
#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse_args();

    // Log panics from handler tasks
    std::panic::set_hook(Box::new(|panic_info| {
        log::error!("Panic caught: {:?}", panic_info);
        if let Some(location) = panic_info.location() {
            log::error!("Panic at {}:{}:{}", location.file(), location.line(), location.column());
        }
        if let Some(msg) = panic_info.payload().downcast_ref::<&str>() {
            log::error!("Panic message: {}", msg);
        }
    }));

    // Load environment variables from .env if present; config statics read them lazily
    let _ = dotenv();

    // Initialize logger (console + file)
    init_logger(&config::LOG_FILE_PATH)?;

    match cli.command {
        Some(Commands::Run { webhook, polling }) => {
            if webhook && config::WEBHOOK_URL.is_none() {
                log::warn!("--webhook given but WEBHOOK_URL is not set; falling back to long polling");
            }
            run_bot(polling).await
        }
        Some(Commands::CheckConfig) => run_check_config(),
        Some(Commands::InitStore) => run_init_store().await,
        None => {
            log::info!("No command specified, running bot in default mode");
            run_bot(false).await
        }
    }
}

/// Validates the environment and prints the summary.
fn run_check_config() -> Result<()> {
    log_configuration();
    config::validate_required()?;
    println!("✅ Configuration is valid");
    Ok(())
}

/// Creates tables or header rows for the configured backend.
async fn run_init_store() -> Result<()> {
    config::validate_required()?;
    let ledger = open_ledger().await?;
    ledger.init().await?;
    println!("✅ {} ledger initialized", ledger.backend_name());
    Ok(())
}

async fn run_bot(force_polling: bool) -> Result<()> {
    log::info!("Starting bot...");
    log_configuration();

    // Missing configuration is the only fatal error; abort before serving traffic
    config::validate_required()?;

    let ledger = open_ledger().await?;
    if let Err(e) = ledger.init().await {
        log::warn!("Failed to initialize {} ledger: {}. Continuing anyway.", ledger.backend_name(), e);
    }

    let bot = create_bot()?;

    let bot_info = bot
        .get_me()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to connect to Bot API: {}", e))?;
    let bot_username = bot_info.username.clone();
    log::info!("Bot username: {:?}, Bot ID: {}", bot_username, bot_info.id);

    if let Err(e) = setup_bot_commands(&bot).await {
        log::warn!("Failed to register bot commands: {}", e);
    }

    let admin_chat_id = ChatId(*config::admin::ADMIN_CHAT_ID);
    notify_admin_startup(&bot, admin_chat_id, bot_username.as_deref(), ledger.backend_name()).await;

    let handler_deps = HandlerDeps::new(ledger, admin_chat_id, config::admin::all_admin_ids(), bot_username);
    let handler = schema(handler_deps);

    let mut dispatcher = Dispatcher::builder(bot.clone(), handler)
        .enable_ctrlc_handler()
        .build();

    if let Transport::Webhook(url) = select_transport(force_polling, config::WEBHOOK_URL.as_deref()) {
        let url = url::Url::parse(&url)?;
        let addr = SocketAddr::from(([0, 0, 0, 0], *config::PORT));
        log::info!("Starting bot in webhook mode at {} (listening on {})", url, addr);

        let listener = webhooks::axum(bot, webhooks::Options::new(addr, url)).await?;
        dispatcher
            .dispatch_with_listener(
                listener,
                LoggingErrorHandler::with_custom_text("An error from the update listener"),
            )
            .await;
    } else {
        log::info!("Starting bot in long polling mode");
        log::info!("📡 Ready to receive updates!");
        dispatcher.dispatch().await;
    }

    log::info!("Dispatcher shutdown gracefully");
    Ok(())
}
