//! Spotify Web API adapter.
//!
//! Implements the `npsync-core` playback port with the refresh-token grant and
//! the `me/player/currently-playing` endpoint.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::{header::ACCEPT_LANGUAGE, StatusCode};
use serde::Deserialize;
use tokio::sync::Mutex;

use npsync_core::{
    config::SpotifyCredentials,
    errors::Error,
    playback::{PlaybackSnapshot, PlaybackSource},
    Result,
};

const TOKEN_URL: &str = "https://accounts.spotify.com/api/token";
const API_BASE: &str = "https://api.spotify.com/v1";
const API_TIMEOUT: Duration = Duration::from_secs(10);
/// Refresh this long before the token actually expires.
const EXPIRY_MARGIN: Duration = Duration::from_secs(30);

#[derive(Clone, Debug)]
struct AccessToken {
    value: String,
    expires_at: Instant,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

#[derive(Debug, Deserialize)]
struct CurrentlyPlaying {
    #[serde(default)]
    is_playing: bool,
    progress_ms: Option<u64>,
    item: Option<PlayingItem>,
}

#[derive(Debug, Deserialize)]
struct PlayingItem {
    name: String,
    #[serde(default)]
    duration_ms: u64,
    #[serde(default)]
    artists: Vec<NamedEntity>,
    /// Present for podcast episodes instead of `artists`.
    show: Option<NamedEntity>,
    #[serde(default)]
    external_urls: ExternalUrls,
}

#[derive(Debug, Deserialize)]
struct NamedEntity {
    name: String,
}

#[derive(Debug, Default, Deserialize)]
struct ExternalUrls {
    spotify: Option<String>,
}

pub struct SpotifyClient {
    creds: SpotifyCredentials,
    http: reqwest::Client,
    token_url: String,
    api_base: String,
    token: Mutex<Option<AccessToken>>,
}

impl SpotifyClient {
    pub fn new(creds: SpotifyCredentials) -> Result<Self> {
        Self::with_endpoints(creds, TOKEN_URL, API_BASE)
    }

    /// Point the client at other hosts (local stubs in tests).
    pub fn with_endpoints(
        creds: SpotifyCredentials,
        token_url: impl Into<String>,
        api_base: impl Into<String>,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(API_TIMEOUT)
            .user_agent("npsync/0.1")
            .build()
            .map_err(|e| Error::External(format!("spotify client build: {e}")))?;
        Ok(Self {
            creds,
            http,
            token_url: token_url.into(),
            api_base: api_base.into().trim_end_matches('/').to_string(),
            token: Mutex::new(None),
        })
    }

    async fn access_token(&self) -> Result<String> {
        let mut guard = self.token.lock().await;
        if let Some(t) = guard.as_ref() {
            if Instant::now() < t.expires_at {
                return Ok(t.value.clone());
            }
        }

        let resp = self
            .http
            .post(&self.token_url)
            .basic_auth(&self.creds.client_id, Some(&self.creds.client_secret))
            .form(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", self.creds.refresh_token.as_str()),
            ])
            .send()
            .await
            .map_err(|e| Error::External(format!("spotify token request error: {e}")))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::External(format!(
                "spotify token refresh failed: {status} {}",
                body.chars().take(200).collect::<String>()
            )));
        }

        let tr: TokenResponse = resp
            .json()
            .await
            .map_err(|e| Error::External(format!("spotify token json error: {e}")))?;

        let lifetime = Duration::from_secs(tr.expires_in).saturating_sub(EXPIRY_MARGIN);
        tracing::debug!("spotify access token refreshed ({}s)", lifetime.as_secs());
        *guard = Some(AccessToken {
            value: tr.access_token.clone(),
            expires_at: Instant::now() + lifetime,
        });
        Ok(tr.access_token)
    }

    async fn invalidate_token(&self) {
        *self.token.lock().await = None;
    }
}

#[async_trait]
impl PlaybackSource for SpotifyClient {
    async fn current_playback(&self) -> Result<Option<PlaybackSnapshot>> {
        let token = self.access_token().await?;

        let mut req = self
            .http
            .get(format!("{}/me/player/currently-playing", self.api_base))
            .bearer_auth(token);
        if let Some(lang) = &self.creds.language {
            req = req.header(ACCEPT_LANGUAGE, lang.as_str());
        }

        let resp = req
            .send()
            .await
            .map_err(|e| Error::External(format!("spotify request error: {e}")))?;

        match resp.status() {
            StatusCode::NO_CONTENT => return Ok(None),
            StatusCode::UNAUTHORIZED => {
                self.invalidate_token().await;
                return Err(Error::External(
                    "spotify rejected the access token (401)".to_string(),
                ));
            }
            s if !s.is_success() => {
                let body = resp.text().await.unwrap_or_default();
                return Err(Error::External(format!(
                    "spotify currently-playing failed: {s} {}",
                    body.chars().take(200).collect::<String>()
                )));
            }
            _ => {}
        }

        let body = resp
            .text()
            .await
            .map_err(|e| Error::External(format!("spotify read error: {e}")))?;
        if body.trim().is_empty() {
            return Ok(None);
        }
        let cp: CurrentlyPlaying = serde_json::from_str(&body)?;
        Ok(snapshot_from(cp))
    }
}

fn snapshot_from(cp: CurrentlyPlaying) -> Option<PlaybackSnapshot> {
    let item = cp.item?;
    let artist_name = item
        .artists
        .into_iter()
        .next()
        .or(item.show)
        .map(|a| a.name)
        .unwrap_or_default();

    Some(PlaybackSnapshot {
        is_playing: cp.is_playing,
        track_name: item.name,
        artist_name,
        canonical_url: item.external_urls.spotify.unwrap_or_default(),
        duration_ms: item.duration_ms,
        progress_ms: cp.progress_ms.unwrap_or(0),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    use tokio::{
        io::{AsyncReadExt, AsyncWriteExt},
        net::TcpListener,
    };

    fn parse(json: serde_json::Value) -> Option<PlaybackSnapshot> {
        snapshot_from(serde_json::from_value(json).unwrap())
    }

    #[test]
    fn maps_track_payload() {
        let s = parse(serde_json::json!({
          "is_playing": true,
          "progress_ms": 50000,
          "currently_playing_type": "track",
          "item": {
            "name": "Song",
            "duration_ms": 200000,
            "artists": [{"name": "Artist"}, {"name": "Feat"}],
            "external_urls": {"spotify": "https://open.spotify.com/track/X"}
          }
        }))
        .unwrap();

        assert_eq!(
            s,
            PlaybackSnapshot {
                is_playing: true,
                track_name: "Song".to_string(),
                artist_name: "Artist".to_string(),
                canonical_url: "https://open.spotify.com/track/X".to_string(),
                duration_ms: 200_000,
                progress_ms: 50_000,
            }
        );
    }

    #[test]
    fn episode_falls_back_to_show_name() {
        let s = parse(serde_json::json!({
          "is_playing": false,
          "progress_ms": null,
          "item": {
            "name": "Ep 1",
            "duration_ms": 1000,
            "show": {"name": "The Show"},
            "external_urls": {"spotify": "https://open.spotify.com/episode/E"}
          }
        }))
        .unwrap();
        assert_eq!(s.artist_name, "The Show");
        assert_eq!(s.progress_ms, 0);
        assert!(!s.is_playing);
    }

    #[test]
    fn missing_item_means_nothing_playing() {
        assert!(parse(serde_json::json!({"is_playing": true, "item": null})).is_none());
    }

    /// Serves canned responses in order, one per connection.
    async fn spawn_stub(responses: Vec<String>) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            for resp in responses {
                let Ok((mut sock, _)) = listener.accept().await else {
                    return;
                };
                let mut buf = Vec::new();
                let mut chunk = [0u8; 2048];
                loop {
                    let n = sock.read(&mut chunk).await.unwrap_or(0);
                    if n == 0 {
                        break;
                    }
                    buf.extend_from_slice(&chunk[..n]);
                    if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                        let head = String::from_utf8_lossy(&buf[..pos]).to_lowercase();
                        let len = head
                            .lines()
                            .find_map(|l| l.strip_prefix("content-length:"))
                            .and_then(|v| v.trim().parse::<usize>().ok())
                            .unwrap_or(0);
                        if buf.len() >= pos + 4 + len {
                            break;
                        }
                    }
                }
                let _ = sock.write_all(resp.as_bytes()).await;
                let _ = sock.shutdown().await;
            }
        });
        format!("http://{addr}")
    }

    fn http(status: &str, body: &str) -> String {
        format!(
            "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        )
    }

    fn creds() -> SpotifyCredentials {
        SpotifyCredentials {
            client_id: "id".to_string(),
            client_secret: "secret".to_string(),
            refresh_token: "refresh".to_string(),
            language: Some("ru".to_string()),
        }
    }

    #[tokio::test]
    async fn no_content_means_nothing_playing() {
        let base = spawn_stub(vec![
            http("200 OK", r#"{"access_token":"tok","expires_in":3600}"#),
            "HTTP/1.1 204 No Content\r\nConnection: close\r\n\r\n".to_string(),
        ])
        .await;
        let client =
            SpotifyClient::with_endpoints(creds(), format!("{base}/api/token"), base.clone())
                .unwrap();
        assert_eq!(client.current_playback().await.unwrap(), None);
    }

    #[tokio::test]
    async fn token_is_reused_between_calls() {
        let playing = r#"{"is_playing":true,"progress_ms":1000,"item":{"name":"Song","duration_ms":2000,"artists":[{"name":"A"}],"external_urls":{"spotify":"https://open.spotify.com/track/X"}}}"#;
        // Only one token response is served; a second refresh would hit the
        // playback response instead and fail to parse.
        let base = spawn_stub(vec![
            http("200 OK", r#"{"access_token":"tok","expires_in":3600}"#),
            http("200 OK", playing),
            http("200 OK", playing),
        ])
        .await;
        let client =
            SpotifyClient::with_endpoints(creds(), format!("{base}/api/token"), base.clone())
                .unwrap();

        let first = client.current_playback().await.unwrap().unwrap();
        let second = client.current_playback().await.unwrap().unwrap();
        assert_eq!(first.track_name, "Song");
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn failed_refresh_is_an_error() {
        let base = spawn_stub(vec![http("400 Bad Request", r#"{"error":"invalid_grant"}"#)]).await;
        let client =
            SpotifyClient::with_endpoints(creds(), format!("{base}/api/token"), base.clone())
                .unwrap();
        let err = client.current_playback().await.unwrap_err();
        assert!(matches!(err, Error::External(ref m) if m.contains("invalid_grant")));
    }
}
