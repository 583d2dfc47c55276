use std::sync::Arc;

use teloxide::{dispatching::Dispatcher, dptree, prelude::*};
use tokio_util::sync::CancellationToken;

use npsync_core::{
    composer::{ComposerSettings, StatusComposer},
    config::Config,
    links::LinkResolver,
    messaging::port::MessagingPort,
    playback::PlaybackSource,
    publish::PublishTarget,
    sync::{SyncDriver, SyncOptions},
};

use crate::handlers;
use crate::TelegramMessenger;

#[derive(Clone)]
pub struct AppState {
    pub cfg: Arc<Config>,
    pub driver: Arc<SyncDriver>,
}

/// Wire the engine to Telegram, start the timer and poll for updates until
/// Ctrl-C.
pub async fn run_polling(
    cfg: Arc<Config>,
    playback: Arc<dyn PlaybackSource>,
    links: Arc<dyn LinkResolver>,
) -> anyhow::Result<()> {
    let bot = Bot::new(cfg.telegram_bot_token.clone());

    match bot.get_me().await {
        Ok(me) => tracing::info!("npsync started: @{}", me.username()),
        Err(e) => tracing::warn!("getMe failed (continuing): {e}"),
    }
    tracing::info!(
        "allowed users: {}, command: {}nowplay",
        cfg.telegram_allowed_users.len(),
        cfg.command_prefix
    );

    let messenger: Arc<dyn MessagingPort> = Arc::new(TelegramMessenger::new(bot.clone()));
    let composer = StatusComposer::new(ComposerSettings::from(cfg.as_ref()), playback, links);
    let publisher = PublishTarget::new(messenger, cfg.parse_mode);
    let driver = Arc::new(SyncDriver::new(
        composer,
        publisher,
        SyncOptions::from(cfg.as_ref()),
    ));

    let cancel = CancellationToken::new();
    let timer = driver.spawn_timer(cancel.clone());
    if timer.is_none() {
        tracing::info!("scheduled status disabled (USE_CHANNEL_NOWPLAY=false)");
    }

    let state = Arc::new(AppState { cfg, driver });

    let handler = dptree::entry()
        .branch(Update::filter_message().endpoint(handlers::handle_message))
        .branch(Update::filter_channel_post().endpoint(handlers::handle_message));

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![state])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    cancel.cancel();
    if let Some(handle) = timer {
        let _ = handle.await;
    }

    Ok(())
}
