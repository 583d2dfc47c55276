//! Status message template.
//!
//! Syntax follows shell-style substitution: `$name` or `${name}` inserts a
//! field, `$$` is a literal `$`. The template is parsed once at config load so
//! an unknown placeholder fails fast instead of on the first playing track.

use std::sync::OnceLock;

use regex::Regex;

use crate::{errors::Error, formatting::escape_html, Result};

/// A named slot in the status template.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Placeholder {
    Artist,
    Track,
    /// Canonical (Spotify) share link.
    Spotify,
    ProgressBar,
    ElapsedTime,
    TotalTime,
    /// Cross-platform link from the resolver.
    Other,
}

impl Placeholder {
    pub const ALL: [Placeholder; 7] = [
        Placeholder::Artist,
        Placeholder::Track,
        Placeholder::Spotify,
        Placeholder::ProgressBar,
        Placeholder::ElapsedTime,
        Placeholder::TotalTime,
        Placeholder::Other,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Placeholder::Artist => "artist",
            Placeholder::Track => "track",
            Placeholder::Spotify => "spotify",
            Placeholder::ProgressBar => "progress_bar",
            Placeholder::ElapsedTime => "elapsed_time",
            Placeholder::TotalTime => "total_time",
            Placeholder::Other => "other",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.name() == name)
    }
}

/// Values substituted into the template for one cycle.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StatusFields {
    pub artist: String,
    pub track: String,
    pub spotify: String,
    pub progress_bar: String,
    pub elapsed_time: String,
    pub total_time: String,
    pub other: String,
}

impl StatusFields {
    pub fn get(&self, p: Placeholder) -> &str {
        match p {
            Placeholder::Artist => &self.artist,
            Placeholder::Track => &self.track,
            Placeholder::Spotify => &self.spotify,
            Placeholder::ProgressBar => &self.progress_bar,
            Placeholder::ElapsedTime => &self.elapsed_time,
            Placeholder::TotalTime => &self.total_time,
            Placeholder::Other => &self.other,
        }
    }

    /// Escape the free-text fields for HTML parse mode.
    ///
    /// Bar and clock fields come from config/formatting and are left as-is.
    pub fn escaped_html(self) -> Self {
        Self {
            artist: escape_html(&self.artist),
            track: escape_html(&self.track),
            spotify: escape_html(&self.spotify),
            other: escape_html(&self.other),
            ..self
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Field(Placeholder),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StatusTemplate {
    source: String,
    segments: Vec<Segment>,
}

fn placeholder_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"\$(?:(?P<escaped>\$)|(?P<named>[_A-Za-z][_A-Za-z0-9]*)|\{(?P<braced>[_A-Za-z][_A-Za-z0-9]*)\}|(?P<invalid>))",
        )
        .expect("valid regex")
    })
}

impl StatusTemplate {
    pub fn parse(source: &str) -> Result<Self> {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut last = 0usize;

        for caps in placeholder_re().captures_iter(source) {
            let Some(whole) = caps.get(0) else {
                continue;
            };
            literal.push_str(&source[last..whole.start()]);
            last = whole.end();

            if caps.name("escaped").is_some() {
                literal.push('$');
                continue;
            }

            let name = caps
                .name("named")
                .or_else(|| caps.name("braced"))
                .map(|m| m.as_str());
            let Some(name) = name else {
                let (line, col) = line_col(source, whole.start());
                return Err(Error::Template(format!(
                    "invalid placeholder at line {line}, col {col}"
                )));
            };

            let placeholder = Placeholder::from_name(name).ok_or_else(|| {
                Error::Template(format!(
                    "unknown placeholder `{name}` (expected one of: {})",
                    Placeholder::ALL.map(Placeholder::name).join(", ")
                ))
            })?;

            if !literal.is_empty() {
                segments.push(Segment::Literal(std::mem::take(&mut literal)));
            }
            segments.push(Segment::Field(placeholder));
        }

        literal.push_str(&source[last..]);
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        Ok(Self {
            source: source.to_string(),
            segments,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn uses(&self, p: Placeholder) -> bool {
        self.segments
            .iter()
            .any(|s| matches!(s, Segment::Field(f) if *f == p))
    }

    pub fn render(&self, fields: &StatusFields) -> String {
        let mut out = String::with_capacity(self.source.len() + 64);
        for seg in &self.segments {
            match seg {
                Segment::Literal(s) => out.push_str(s),
                Segment::Field(p) => out.push_str(fields.get(*p)),
            }
        }
        out
    }
}

fn line_col(source: &str, byte_idx: usize) -> (usize, usize) {
    let before = &source[..byte_idx];
    let line = before.matches('\n').count() + 1;
    let col = before
        .rsplit('\n')
        .next()
        .map(|l| l.chars().count() + 1)
        .unwrap_or(1);
    (line, col)
}
