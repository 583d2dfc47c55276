//! Core engine for the now-playing sync bot.
//!
//! This crate is intentionally framework-agnostic. Spotify / Telegram / the
//! link-resolution service live behind ports (traits) implemented in adapter
//! crates or in `links`.

pub mod composer;
pub mod config;
pub mod domain;
pub mod errors;
pub mod formatting;
pub mod links;
pub mod logging;
pub mod messaging;
pub mod playback;
pub mod publish;
pub mod security;
pub mod sync;
pub mod template;

pub use errors::{Error, Result};
