use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use zeroize::Zeroize;

use crate::error::RecoveryError;

pub const MAX_DISPLAY_NAME_CHARS: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RestorationId(pub Uuid);

impl RestorationId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RestorationId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RestorationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Stage of the account restoration flow.
///
/// `RecoveryPassword -> Loading -> Finishing -> Finished -> Complete`, with
/// `DisplayName` as the manual fallback from any of the progress phases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RestorationPhase {
    #[default]
    RecoveryPassword,
    Loading,
    Finishing,
    Finished,
    DisplayName,
    Complete,
}

impl RestorationPhase {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::RecoveryPassword => "recovery_password",
            Self::Loading => "loading",
            Self::Finishing => "finishing",
            Self::Finished => "finished",
            Self::DisplayName => "display_name",
            Self::Complete => "complete",
        }
    }

    /// Phases whose bar advances one percent per tick.
    pub fn has_ticker(self) -> bool {
        matches!(self, Self::Loading | Self::Finishing)
    }

    /// Phases rendered as a progress bar rather than an input form.
    pub fn shows_progress_bar(self) -> bool {
        matches!(self, Self::Loading | Self::Finishing | Self::Finished)
    }

    /// Phases during which a display-name lookup result is still meaningful.
    pub fn awaits_lookup(self) -> bool {
        self.shows_progress_bar()
    }
}

impl fmt::Display for RestorationPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Recovery phrase as typed by the user. Wiped from memory on drop.
#[derive(Clone)]
pub struct RecoveryPhrase(String);

impl RecoveryPhrase {
    pub fn parse(raw: impl Into<String>) -> Result<Self, RecoveryError> {
        let mut raw = raw.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            raw.zeroize();
            return Err(RecoveryError::Validation("recovery phrase is empty".into()));
        }

        let phrase = trimmed.to_string();
        raw.zeroize();
        Ok(Self(phrase))
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn word_count(&self) -> usize {
        self.0.split_whitespace().count()
    }
}

impl Drop for RecoveryPhrase {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

impl fmt::Debug for RecoveryPhrase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RecoveryPhrase(<{} words redacted>)", self.word_count())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DisplayName(String);

impl DisplayName {
    /// Strips control characters and surrounding whitespace, then enforces
    /// the non-empty and length rules.
    pub fn sanitize(raw: &str) -> Result<Self, RecoveryError> {
        let cleaned: String = raw.chars().filter(|c| !c.is_control()).collect();
        let cleaned = cleaned.trim();
        if cleaned.is_empty() {
            return Err(RecoveryError::Validation("display name is empty".into()));
        }

        let len = cleaned.chars().count();
        if len > MAX_DISPLAY_NAME_CHARS {
            return Err(RecoveryError::Validation(format!(
                "display name is {len} characters, the limit is {MAX_DISPLAY_NAME_CHARS}"
            )));
        }

        Ok(Self(cleaned.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for DisplayName {
    type Error = RecoveryError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::sanitize(&value)
    }
}

impl From<DisplayName> for String {
    fn from(value: DisplayName) -> Self {
        value.0
    }
}

impl fmt::Display for DisplayName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phrase_is_trimmed_and_redacted() {
        let phrase = RecoveryPhrase::parse("  alpha bravo charlie  ").expect("phrase");
        assert_eq!(phrase.expose(), "alpha bravo charlie");
        assert_eq!(
            format!("{phrase:?}"),
            "RecoveryPhrase(<3 words redacted>)"
        );
    }

    #[test]
    fn blank_phrase_is_rejected() {
        let err = RecoveryPhrase::parse(" \t ").expect_err("blank phrase");
        assert!(matches!(err, RecoveryError::Validation(_)));
    }

    #[test]
    fn display_name_drops_control_characters() {
        let name = DisplayName::sanitize("\u{7}  Alice\n").expect("name");
        assert_eq!(name.as_str(), "Alice");
    }

    #[test]
    fn display_name_length_is_counted_in_chars() {
        let at_limit = "é".repeat(MAX_DISPLAY_NAME_CHARS);
        assert!(DisplayName::sanitize(&at_limit).is_ok());

        let over = "a".repeat(MAX_DISPLAY_NAME_CHARS + 1);
        assert!(matches!(
            DisplayName::sanitize(&over),
            Err(RecoveryError::Validation(_))
        ));
    }

    #[test]
    fn display_name_deserialization_validates() {
        let name: DisplayName = serde_json::from_str("\" Bob \"").expect("valid name");
        assert_eq!(name.as_str(), "Bob");
        assert!(serde_json::from_str::<DisplayName>("\"   \"").is_err());
    }

    #[test]
    fn only_progress_phases_show_a_bar() {
        assert!(RestorationPhase::Finished.shows_progress_bar());
        assert!(!RestorationPhase::Finished.has_ticker());
        assert!(!RestorationPhase::DisplayName.shows_progress_bar());
        assert!(!RestorationPhase::Complete.shows_progress_bar());
        assert_eq!(RestorationPhase::default(), RestorationPhase::RecoveryPassword);
    }
}
