//! Language of human-readable report text

use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportLocale {
    #[default]
    Pt,
    En,
}

/// Locale tag that is neither Portuguese nor English
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unsupported locale: {0}")]
pub struct LocaleParseError(pub String);

impl FromStr for ReportLocale {
    type Err = LocaleParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pt" | "pt-br" | "pt_br" => Ok(Self::Pt),
            "en" | "en-us" | "en_us" => Ok(Self::En),
            other => Err(LocaleParseError(other.to_string())),
        }
    }
}
