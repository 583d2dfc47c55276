//! Builds the status text for one cycle.

use std::sync::Arc;

use crate::{
    config::Config,
    formatting::{format_time, progress_ratio, render_progress_bar, ProgressBarStyle},
    links::LinkResolver,
    messaging::types::ParseMode,
    playback::{PlaybackSnapshot, PlaybackSource},
    template::{StatusFields, StatusTemplate},
    Result,
};

/// Rendering settings, copied out of `Config` once at startup.
#[derive(Clone, Debug)]
pub struct ComposerSettings {
    pub default_message: String,
    pub template: StatusTemplate,
    pub parse_mode: ParseMode,
    pub progress_bar: ProgressBarStyle,
}

impl From<&Config> for ComposerSettings {
    fn from(cfg: &Config) -> Self {
        Self {
            default_message: cfg.default_message.clone(),
            template: cfg.template.clone(),
            parse_mode: cfg.parse_mode,
            progress_bar: cfg.progress_bar.clone(),
        }
    }
}

pub struct StatusComposer {
    settings: ComposerSettings,
    playback: Arc<dyn PlaybackSource>,
    links: Arc<dyn LinkResolver>,
}

impl StatusComposer {
    pub fn new(
        settings: ComposerSettings,
        playback: Arc<dyn PlaybackSource>,
        links: Arc<dyn LinkResolver>,
    ) -> Self {
        Self {
            settings,
            playback,
            links,
        }
    }

    /// Compose the status for the current playback.
    ///
    /// Playback errors propagate; link resolution never fails the cycle.
    pub async fn compose(&self) -> Result<String> {
        let snapshot = match self.playback.current_playback().await? {
            Some(s) if s.is_playing => s,
            _ => {
                tracing::info!("nothing playing");
                return Ok(self.settings.default_message.clone());
            }
        };

        let other = self.links.resolve(&snapshot.canonical_url).await;
        let fields = self.fields_for(&snapshot, other.value);
        let fields = match self.settings.parse_mode {
            ParseMode::Html => fields.escaped_html(),
            ParseMode::Markdown => fields,
        };

        let text = self.settings.template.render(&fields);
        tracing::info!("{text}");
        Ok(text)
    }

    fn fields_for(&self, s: &PlaybackSnapshot, other: String) -> StatusFields {
        let ratio = progress_ratio(s.progress_ms, s.duration_ms);
        StatusFields {
            artist: s.artist_name.clone(),
            track: s.track_name.clone(),
            spotify: s.canonical_url.clone(),
            progress_bar: render_progress_bar(ratio, &self.settings.progress_bar),
            elapsed_time: format_time(s.progress_ms),
            total_time: format_time(s.duration_ms),
            other,
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::{errors::Error, links::ResolvedLink};

    pub(crate) enum FakePlayback {
        Nothing,
        Snapshot(PlaybackSnapshot),
        Fails,
    }

    #[async_trait]
    impl PlaybackSource for FakePlayback {
        async fn current_playback(&self) -> Result<Option<PlaybackSnapshot>> {
            match self {
                FakePlayback::Nothing => Ok(None),
                FakePlayback::Snapshot(s) => Ok(Some(s.clone())),
                FakePlayback::Fails => Err(Error::External("spotify 401".to_string())),
            }
        }
    }

    /// Resolver that records calls and answers with a fixed link.
    pub(crate) struct FakeResolver {
        pub(crate) answer: ResolvedLink,
        pub(crate) calls: Mutex<Vec<String>>,
    }

    impl FakeResolver {
        pub(crate) fn ok(value: &str) -> Self {
            Self {
                answer: ResolvedLink {
                    value: value.to_string(),
                },
                calls: Mutex::new(Vec::new()),
            }
        }

        pub(crate) fn failing() -> Self {
            Self {
                answer: ResolvedLink::error(),
                calls: Mutex::new(Vec::new()),
            }
        }

        pub(crate) fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl LinkResolver for FakeResolver {
        async fn resolve(&self, canonical_url: &str) -> ResolvedLink {
            self.calls.lock().unwrap().push(canonical_url.to_string());
            self.answer.clone()
        }
    }

    pub(crate) fn song(duration_ms: u64, progress_ms: u64) -> PlaybackSnapshot {
        PlaybackSnapshot {
            is_playing: true,
            track_name: "Song".to_string(),
            artist_name: "Artist".to_string(),
            canonical_url: "https://open.spotify.com/track/X".to_string(),
            duration_ms,
            progress_ms,
        }
    }

    pub(crate) fn settings(template: &str) -> ComposerSettings {
        ComposerSettings {
            default_message: "idle".to_string(),
            template: StatusTemplate::parse(template).unwrap(),
            parse_mode: ParseMode::Markdown,
            progress_bar: ProgressBarStyle::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;
    use crate::errors::Error;

    const FULL: &str = "$artist|$track|$spotify|$progress_bar|$elapsed_time|$total_time|$other";

    fn composer(
        playback: FakePlayback,
        resolver: Arc<FakeResolver>,
        settings: ComposerSettings,
    ) -> StatusComposer {
        StatusComposer::new(settings, Arc::new(playback), resolver)
    }

    #[tokio::test]
    async fn composes_full_status() {
        let resolver = Arc::new(FakeResolver::ok("https://song.link/s/X"));
        let c = composer(
            FakePlayback::Snapshot(song(200_000, 50_000)),
            resolver.clone(),
            settings(FULL),
        );

        let text = c.compose().await.unwrap();
        assert_eq!(
            text,
            "Artist|Song|https://open.spotify.com/track/X|▓▓●░░░░░░░|00:50|03:20|https://song.link/s/X"
        );
        assert_eq!(
            resolver.calls.lock().unwrap().as_slice(),
            ["https://open.spotify.com/track/X".to_string()]
        );
    }

    #[tokio::test]
    async fn nothing_playing_returns_default_without_resolving() {
        let resolver = Arc::new(FakeResolver::ok("x"));
        let c = composer(FakePlayback::Nothing, resolver.clone(), settings(FULL));
        assert_eq!(c.compose().await.unwrap(), "idle");
        assert_eq!(resolver.call_count(), 0);
    }

    #[tokio::test]
    async fn paused_returns_default_without_resolving() {
        let mut paused = song(200_000, 50_000);
        paused.is_playing = false;
        let resolver = Arc::new(FakeResolver::ok("x"));
        let c = composer(FakePlayback::Snapshot(paused), resolver.clone(), settings(FULL));
        assert_eq!(c.compose().await.unwrap(), "idle");
        assert_eq!(resolver.call_count(), 0);
    }

    #[tokio::test]
    async fn resolver_failure_still_yields_complete_message() {
        let resolver = Arc::new(FakeResolver::failing());
        let c = composer(
            FakePlayback::Snapshot(song(200_000, 50_000)),
            resolver,
            settings("$track [other]($other)"),
        );
        assert_eq!(c.compose().await.unwrap(), "Song [other](Error)");
    }

    #[tokio::test]
    async fn zero_duration_renders_empty_bar() {
        let resolver = Arc::new(FakeResolver::ok("x"));
        let c = composer(
            FakePlayback::Snapshot(song(0, 12_000)),
            resolver,
            settings("$progress_bar $elapsed_time/$total_time"),
        );
        assert_eq!(c.compose().await.unwrap(), "●░░░░░░░░░ 00:12/00:00");
    }

    #[tokio::test]
    async fn playback_error_propagates() {
        let resolver = Arc::new(FakeResolver::ok("x"));
        let c = composer(FakePlayback::Fails, resolver.clone(), settings(FULL));
        assert!(matches!(c.compose().await, Err(Error::External(_))));
        assert_eq!(resolver.call_count(), 0);
    }

    #[tokio::test]
    async fn html_mode_escapes_track_fields() {
        let mut s = song(200_000, 0);
        s.artist_name = "Simon & Garfunkel".to_string();
        let mut st = settings("<b>$artist</b>");
        st.parse_mode = ParseMode::Html;
        let c = composer(FakePlayback::Snapshot(s), Arc::new(FakeResolver::ok("x")), st);
        assert_eq!(c.compose().await.unwrap(), "<b>Simon &amp; Garfunkel</b>");
    }
}
