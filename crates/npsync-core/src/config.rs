use std::{env, fs, path::Path, time::Duration};

use crate::{
    domain::{ChatId, MessageId, MessageRef},
    errors::Error,
    formatting::ProgressBarStyle,
    links::DEFAULT_RESOLVER_BASE_URL,
    messaging::types::ParseMode,
    template::StatusTemplate,
    Result,
};

pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 17;
/// Telegram's message limit; a longer bar can never be published.
pub const MAX_PROGRESS_BAR_LENGTH: usize = 4096;
pub const DEFAULT_COMMAND_PREFIX: &str = "!";
pub const DEFAULT_IDLE_MESSAGE: &str = "🎧 Nothing is playing right now";
pub const DEFAULT_TEMPLATE: &str = "🎧 Now playing: [$artist - $track]($spotify)\n\
$progress_bar $elapsed_time / $total_time\n\
[Other platforms]($other)";

/// Spotify app credentials plus a long-lived refresh token.
#[derive(Clone, Debug)]
pub struct SpotifyCredentials {
    pub client_id: String,
    pub client_secret: String,
    pub refresh_token: String,
    /// Sent as `Accept-Language` so track names come back localized.
    pub language: Option<String>,
}

/// Typed configuration, read from the environment (and `.env`).
#[derive(Clone, Debug)]
pub struct Config {
    // Telegram
    pub telegram_bot_token: String,
    pub telegram_allowed_users: Vec<i64>,

    // Spotify
    pub spotify: SpotifyCredentials,

    // Sync
    pub use_channel_nowplay: bool,
    pub nowplay_target: Option<MessageRef>,
    pub poll_interval: Duration,
    pub serialize_cycles: bool,
    pub command_prefix: String,

    // Rendering
    pub default_message: String,
    pub template: StatusTemplate,
    pub parse_mode: ParseMode,
    pub progress_bar: ProgressBarStyle,

    // Link resolution
    pub resolver_base_url: String,
    pub resolver_timeout: Duration,
}

impl Config {
    pub fn load() -> Result<Self> {
        load_dotenv_if_present(Path::new(".env"));
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the config from an arbitrary key lookup (env, map in tests).
    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = &get as &dyn Fn(&str) -> Option<String>;

        let telegram_bot_token = required(get, "TELEGRAM_BOT_TOKEN")?;
        let telegram_allowed_users = parse_csv_i64(get, "TELEGRAM_ALLOWED_USERS")?;

        let spotify = SpotifyCredentials {
            client_id: required(get, "SPOTIFY_CLIENT_ID")?,
            client_secret: required(get, "SPOTIFY_CLIENT_SECRET")?,
            refresh_token: required(get, "SPOTIFY_REFRESH_TOKEN")?,
            language: var_str(get, "SPOTIFY_LANGUAGE"),
        };

        let use_channel_nowplay = var_bool(get, "USE_CHANNEL_NOWPLAY")?.unwrap_or(true);
        let chat_id = var_parse::<i64>(get, "NOWPLAY_CHAT_ID")?;
        let message_id = var_parse::<i32>(get, "NOWPLAY_MESSAGE_ID")?;
        let nowplay_target = match (chat_id, message_id) {
            (Some(c), Some(m)) => Some(MessageRef {
                chat_id: ChatId(c),
                message_id: MessageId(m),
            }),
            _ => None,
        };
        if use_channel_nowplay && nowplay_target.is_none() {
            return Err(Error::Config(
                "NOWPLAY_CHAT_ID and NOWPLAY_MESSAGE_ID are required when USE_CHANNEL_NOWPLAY is enabled"
                    .to_string(),
            ));
        }

        let interval_secs =
            var_parse::<u64>(get, "NOWPLAY_INTERVAL_SECS")?.unwrap_or(DEFAULT_POLL_INTERVAL_SECS);
        if interval_secs == 0 {
            return Err(Error::Config(
                "NOWPLAY_INTERVAL_SECS must be at least 1".to_string(),
            ));
        }
        let poll_interval = Duration::from_secs(interval_secs);
        let serialize_cycles = var_bool(get, "NOWPLAY_SERIALIZE_CYCLES")?.unwrap_or(false);
        let command_prefix =
            var_str(get, "NOWPLAY_COMMAND_PREFIX").unwrap_or(DEFAULT_COMMAND_PREFIX.to_string());

        let default_message = var_str(get, "NOWPLAY_DEFAULT_MESSAGE")
            .map(|s| unescape_newlines(&s))
            .unwrap_or(DEFAULT_IDLE_MESSAGE.to_string());
        let template_src = var_str(get, "NOWPLAY_TEMPLATE")
            .map(|s| unescape_newlines(&s))
            .unwrap_or(DEFAULT_TEMPLATE.to_string());
        let template = StatusTemplate::parse(&template_src)
            .map_err(|e| Error::Config(format!("NOWPLAY_TEMPLATE: {e}")))?;
        let parse_mode = match var_str(get, "NOWPLAY_PARSE_MODE") {
            Some(s) => ParseMode::parse(&s)?,
            None => ParseMode::default(),
        };

        let defaults = ProgressBarStyle::default();
        let length = var_parse::<usize>(get, "PROGRESS_BAR_LENGTH")?.unwrap_or(defaults.length);
        if !(1..=MAX_PROGRESS_BAR_LENGTH).contains(&length) {
            return Err(Error::Config(format!(
                "PROGRESS_BAR_LENGTH must be between 1 and {MAX_PROGRESS_BAR_LENGTH}"
            )));
        }
        let progress_bar = ProgressBarStyle {
            length,
            filled: var_char(get, "PROGRESS_BAR_FILLED")?.unwrap_or(defaults.filled),
            center: var_char(get, "PROGRESS_BAR_CENTER")?.unwrap_or(defaults.center),
            empty: var_char(get, "PROGRESS_BAR_EMPTY")?.unwrap_or(defaults.empty),
        };

        let resolver_base_url = var_str(get, "LINK_RESOLVER_BASE_URL")
            .unwrap_or(DEFAULT_RESOLVER_BASE_URL.to_string());
        let resolver_timeout =
            Duration::from_millis(var_parse::<u64>(get, "LINK_RESOLVER_TIMEOUT_MS")?.unwrap_or(10_000));

        Ok(Self {
            telegram_bot_token,
            telegram_allowed_users,
            spotify,
            use_channel_nowplay,
            nowplay_target,
            poll_interval,
            serialize_cycles,
            command_prefix,
            default_message,
            template,
            parse_mode,
            progress_bar,
            resolver_base_url,
            resolver_timeout,
        })
    }
}

type Lookup<'a> = &'a dyn Fn(&str) -> Option<String>;

/// Present and non-blank.
fn var_str(get: Lookup<'_>, key: &str) -> Option<String> {
    get(key).filter(|s| !s.trim().is_empty())
}

fn required(get: Lookup<'_>, key: &str) -> Result<String> {
    var_str(get, key)
        .map(|s| s.trim().to_string())
        .ok_or_else(|| Error::Config(format!("{key} environment variable is required")))
}

fn var_parse<T: std::str::FromStr>(get: Lookup<'_>, key: &str) -> Result<Option<T>> {
    let Some(raw) = var_str(get, key) else {
        return Ok(None);
    };
    raw.trim()
        .parse::<T>()
        .map(Some)
        .map_err(|_| Error::Config(format!("{key}: invalid value `{}`", raw.trim())))
}

fn var_bool(get: Lookup<'_>, key: &str) -> Result<Option<bool>> {
    let Some(raw) = var_str(get, key) else {
        return Ok(None);
    };
    match raw.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(Some(true)),
        "0" | "false" | "no" | "off" => Ok(Some(false)),
        other => Err(Error::Config(format!("{key}: invalid boolean `{other}`"))),
    }
}

/// Exactly one character; surrounding whitespace is not trimmed.
fn var_char(get: Lookup<'_>, key: &str) -> Result<Option<char>> {
    let Some(raw) = get(key).filter(|s| !s.is_empty()) else {
        return Ok(None);
    };
    let mut chars = raw.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Ok(Some(c)),
        _ => Err(Error::Config(format!(
            "{key}: expected a single character, got `{raw}`"
        ))),
    }
}

fn parse_csv_i64(get: Lookup<'_>, key: &str) -> Result<Vec<i64>> {
    get(key)
        .unwrap_or_default()
        .split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<i64>()
                .map_err(|_| Error::Config(format!("{key}: invalid id `{s}`")))
        })
        .collect()
}

fn unescape_newlines(s: &str) -> String {
    s.replace("\\n", "\n")
}

fn load_dotenv_if_present(path: &Path) {
    let Ok(contents) = fs::read_to_string(path) else {
        return;
    };

    for raw in contents.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((k, v)) = line.split_once('=') else {
            continue;
        };

        let key = k.trim();
        if key.is_empty() {
            continue;
        }
        if env::var_os(key).is_some() {
            continue; // do not override existing env
        }

        let mut val = v.trim().to_string();
        // Strip optional surrounding quotes.
        if val.len() >= 2
            && ((val.starts_with('"') && val.ends_with('"'))
                || (val.starts_with('\'') && val.ends_with('\'')))
        {
            val = val[1..val.len() - 1].to_string();
        }

        env::set_var(key, val);
    }
}
