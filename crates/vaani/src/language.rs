//! Narration languages.
//!
//! The remote endpoint and the on-device voice catalog both speak in
//! two-letter tags; everything else in the crate passes [`Language`]
//! values so an unsupported tag can never travel past the API boundary.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Languages the narrator can speak.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Language {
    #[serde(rename = "en")]
    English,
    #[serde(rename = "ta")]
    Tamil,
}

impl Language {
    /// Every supported language, in catalog order.
    pub const ALL: [Self; 2] = [Self::English, Self::Tamil];

    /// Two-letter tag used on the wire and in cache keys.
    #[must_use]
    pub const fn tag(self) -> &'static str {
        match self {
            Self::English => "en",
            Self::Tamil => "ta",
        }
    }

    /// Human-readable name for CLI output and voice listings.
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::English => "English",
            Self::Tamil => "Tamil",
        }
    }

    /// Map an arbitrary BCP-47-ish tag to the nearest supported language.
    ///
    /// Anything in the Tamil family (`ta`, `ta-IN`, ...) maps to Tamil;
    /// everything else, including unknown tags, maps to English.
    #[must_use]
    pub fn from_tag_lossy(tag: &str) -> Self {
        if tag.to_ascii_lowercase().starts_with("ta") {
            Self::Tamil
        } else {
            Self::English
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Tag that matches no supported language exactly.
#[derive(Debug, thiserror::Error)]
#[error("unknown language tag '{0}' (expected 'en' or 'ta')")]
pub struct UnknownLanguage(String);

impl FromStr for Language {
    type Err = UnknownLanguage;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "en" => Ok(Self::English),
            "ta" => Ok(Self::Tamil),
            other => Err(UnknownLanguage(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_round_trip_through_from_str() {
        for language in Language::ALL {
            assert_eq!(language.tag().parse::<Language>().unwrap(), language);
        }
    }

    #[test]
    fn from_str_rejects_unknown_tags() {
        assert!("fr".parse::<Language>().is_err());
        assert!("".parse::<Language>().is_err());
    }

    #[test]
    fn lossy_mapping_prefers_tamil_family() {
        assert_eq!(Language::from_tag_lossy("ta"), Language::Tamil);
        assert_eq!(Language::from_tag_lossy("ta-IN"), Language::Tamil);
        assert_eq!(Language::from_tag_lossy("en-US"), Language::English);
        assert_eq!(Language::from_tag_lossy("klingon"), Language::English);
    }

    #[test]
    fn serde_uses_wire_tags() {
        assert_eq!(serde_json::to_string(&Language::Tamil).unwrap(), "\"ta\"");
        let parsed: Language = serde_json::from_str("\"en\"").unwrap();
        assert_eq!(parsed, Language::English);
    }
}
