//! Parsing of requested field names.
//!
//! A request is a leading token (a field, group or glob pattern) optionally
//! followed by qualifier words: `"T3 UTC"` parses to token `t3`, qualifier
//! `utc`.

use crate::types::{TimeForm, TimeScale};

/// The absolute-time qualifiers a plain numeric field accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Qualifier {
    Utc,
    Tai,
    Utc6,
    Tai6,
}

impl Qualifier {
    pub fn parse(text: &str) -> Option<Self> {
        match text {
            "utc" => Some(Qualifier::Utc),
            "tai" => Some(Qualifier::Tai),
            "6utc" => Some(Qualifier::Utc6),
            "6tai" => Some(Qualifier::Tai6),
            _ => None,
        }
    }

    pub fn scale(&self) -> TimeScale {
        match self {
            Qualifier::Utc | Qualifier::Utc6 => TimeScale::Utc,
            Qualifier::Tai | Qualifier::Tai6 => TimeScale::Tai,
        }
    }

    pub fn form(&self) -> TimeForm {
        match self {
            Qualifier::Utc | Qualifier::Tai => TimeForm::DayOfYear,
            Qualifier::Utc6 | Qualifier::Tai6 => TimeForm::Calendar,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Qualifier::Utc => "utc",
            Qualifier::Tai => "tai",
            Qualifier::Utc6 => "6utc",
            Qualifier::Tai6 => "6tai",
        }
    }
}

/// A normalized request: trimmed, lower-cased, split on whitespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldName {
    pub token: String,
    /// Remaining words joined by single spaces.
    pub qualifier: Option<String>,
}

impl FieldName {
    /// `None` for an empty or all-whitespace request.
    pub fn parse(raw: &str) -> Option<Self> {
        let lowered = raw.trim().to_lowercase();
        let mut words = lowered.split_whitespace();
        let token = words.next()?.to_string();
        let rest: Vec<&str> = words.collect();
        let qualifier = (!rest.is_empty()).then(|| rest.join(" "));
        Some(Self { token, qualifier })
    }

    /// Whether the token is a glob pattern.
    pub fn is_pattern(&self) -> bool {
        self.token.contains(['*', '?'])
    }

    /// The absolute-time qualifier, only when the qualifier is exactly one
    /// of the four recognised words.
    pub fn time_qualifier(&self) -> Option<Qualifier> {
        self.qualifier.as_deref().and_then(Qualifier::parse)
    }

    /// This request's qualifier attached to another token.
    pub fn with_token(&self, token: &str) -> String {
        match &self.qualifier {
            Some(q) => format!("{token} {q}"),
            None => token.to_string(),
        }
    }
}

impl std::fmt::Display for FieldName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.with_token(&self.token))
    }
}
