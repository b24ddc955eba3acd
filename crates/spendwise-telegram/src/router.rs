use std::{net::SocketAddr, sync::Arc};

use teloxide::{
    dispatching::Dispatcher,
    dptree,
    error_handlers::LoggingErrorHandler,
    prelude::*,
    update_listeners::webhooks,
};
use tracing::{info, warn};

use spendwise_core::{
    backend::ExpenseBackend,
    config::Config,
    messaging::{
        port::MessagingPort,
        throttled::{ThrottleConfig, ThrottledMessenger},
    },
    service::ExpenseBot,
};

use crate::{handlers, server, TelegramMessenger};

#[derive(Clone)]
pub struct AppState {
    pub cfg: Arc<Config>,
    pub service: Arc<ExpenseBot>,
}

/// Register the webhook and serve Telegram updates plus the internal endpoints
/// on one listener until the update listener stops.
pub async fn run_webhook(
    cfg: Arc<Config>,
    backend: Arc<dyn ExpenseBackend>,
) -> anyhow::Result<()> {
    let bot = Bot::new(cfg.bot_token.clone());

    match bot.get_me().await {
        Ok(me) => info!("spendwise bot started: @{}", me.username()),
        Err(e) => warn!("getMe failed: {e}"),
    }
    info!(
        port = cfg.port,
        api_url = %cfg.api_url,
        allowed_chats = cfg.allowed_chat_ids.len(),
        "configuration loaded"
    );

    let raw_messenger: Arc<dyn MessagingPort> =
        Arc::new(TelegramMessenger::new(bot.clone(), cfg.bot_token.clone()));
    let messenger: Arc<dyn MessagingPort> = Arc::new(ThrottledMessenger::new(
        raw_messenger,
        ThrottleConfig::default(),
    ));

    let state = Arc::new(AppState {
        cfg: cfg.clone(),
        service: Arc::new(ExpenseBot::new(cfg.clone(), messenger, backend)),
    });

    let addr = SocketAddr::from(([0, 0, 0, 0], cfg.port));
    let url: reqwest::Url = cfg.webhook_url().parse()?;
    info!(%url, "setting webhook");

    let (listener, stop_flag, webhook_routes) =
        webhooks::axum_to_router(bot.clone(), webhooks::Options::new(addr, url)).await?;
    let app = webhook_routes.merge(server::routes(state.clone()));

    let http = tokio::spawn(
        axum::Server::bind(&addr)
            .serve(app.into_make_service())
            .with_graceful_shutdown(stop_flag),
    );
    info!(%addr, "server ready to accept requests");

    let handler = dptree::entry()
        .branch(Update::filter_callback_query().endpoint(handlers::handle_callback))
        .branch(Update::filter_message().endpoint(handlers::handle_message));

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![state])
        .build()
        .dispatch_with_listener(
            listener,
            LoggingErrorHandler::with_custom_text("error from the webhook listener"),
        )
        .await;

    http.await??;
    Ok(())
}
