use std::sync::Arc;

use npsync_core::{
    config::Config,
    links::{LinkResolver, OdesliResolver},
    playback::PlaybackSource,
};
use npsync_spotify::SpotifyClient;

#[tokio::main]
async fn main() -> Result<(), npsync_core::Error> {
    npsync_core::logging::init("npsync")?;

    let cfg = Arc::new(Config::load()?);

    tracing::info!("starting Spotify client");
    let playback: Arc<dyn PlaybackSource> = Arc::new(SpotifyClient::new(cfg.spotify.clone())?);
    let links: Arc<dyn LinkResolver> = Arc::new(OdesliResolver::new(
        cfg.resolver_base_url.clone(),
        cfg.resolver_timeout,
    )?);

    tracing::info!("starting Telegram bot");
    npsync_telegram::router::run_polling(cfg, playback, links)
        .await
        .map_err(|e| npsync_core::Error::External(format!("telegram bot failed: {e}")))?;

    Ok(())
}
