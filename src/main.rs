use anyhow::Result;
use dotenvy::dotenv;
use std::sync::Arc;
use std::time::Duration;
use teloxide::prelude::*;
use tokio::time::interval;

use reclin_bot::core::{config, init_logger, metrics, metrics_server};
use reclin_bot::reminders::start_reminder_scheduler;
use reclin_bot::storage::create_pool;
use reclin_bot::telegram::notifications::notify_admin_startup;
use reclin_bot::telegram::webapp::run_webapp_server;
use reclin_bot::telegram::{create_bot, schema, setup_bot_commands, HandlerDeps};

/// Main entry point for the bot.
///
/// Starts the registration web server, the reminder scheduler and the
/// long-polling dispatcher on one runtime.
#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env if present
    let _ = dotenv();

    // Initialize logger (console + file)
    init_logger(&config::LOG_FILE_PATH)?;

    log::info!("Starting bot...");

    let community_chat_id = *config::COMMUNITY_CHAT_ID;
    if community_chat_id == 0 {
        return Err(anyhow::anyhow!("COMMUNITY_CHAT_ID environment variable not set"));
    }
    if config::admin::ADMIN_IDS.is_empty() && *config::admin::ADMIN_USER_ID == 0 {
        log::warn!("No admin ids configured; /broadcast, /export and /info will be unavailable");
    }

    // Initialize metrics registry
    metrics::init_metrics();

    // Create bot instance
    let bot = create_bot()?;

    let bot_info = bot.get_me().await?;
    log::info!(
        "Bot username: {:?}, Bot ID: {}",
        bot_info.username,
        bot_info.id
    );

    if let Err(e) = setup_bot_commands(&bot).await {
        log::warn!("Failed to set bot commands: {}", e);
    }

    // Create database connection pool
    let db_pool = Arc::new(create_pool(&config::DATABASE_PATH)?);

    // Start metrics HTTP server if enabled
    if *config::metrics::ENABLED {
        let metrics_port = *config::metrics::PORT;
        log::info!("Starting metrics server on port {}", metrics_port);

        tokio::spawn(async move {
            if let Err(e) = metrics_server::start_metrics_server(metrics_port).await {
                log::error!("Metrics server error: {}", e);
            }
        });

        // Update the uptime counter every 60 seconds
        tokio::spawn(async {
            let mut ticker = interval(Duration::from_secs(60));
            loop {
                ticker.tick().await;
                metrics::BOT_UPTIME_SECONDS.inc_by(60.0);
            }
        });
    } else {
        log::info!("Metrics collection disabled (METRICS_ENABLED=false)");
    }

    // Start the registration web server
    {
        let webapp_pool = Arc::clone(&db_pool);
        let webapp_bot = bot.clone();
        let webapp_port = *config::webapp::PORT;

        tokio::spawn(async move {
            if let Err(e) = run_webapp_server(webapp_port, webapp_pool, webapp_bot).await {
                log::error!("Web server error: {}", e);
            }
        });
    }

    // Start the reminder sweep; the task runs for the lifetime of the process
    let _scheduler_handle =
        start_reminder_scheduler(bot.clone(), Arc::clone(&db_pool), ChatId(community_chat_id));

    notify_admin_startup(&bot, bot_info.username.as_deref()).await;

    let deps = HandlerDeps::new(Arc::clone(&db_pool));

    log::info!("Starting dispatcher...");

    Dispatcher::builder(bot, schema(deps))
        .dependencies(DependencyMap::new())
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    Ok(())
}
