//! Program and video records extracted from list items.

use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;

use super::client::WS_BASE_URL;
use super::error::{AlacartaError, Result};
use super::xml::XmlElement;

/// `HH:MM:SS` prefix of the `durada_h` field.
#[allow(clippy::expect_used)]
static DURATION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{2}):(\d{2}):(\d{2})").expect("failed to compile duration regex")
});

/// Air date format of the `data` field.
const DATE_FORMAT: &str = "%d/%m/%Y";

/// A program (series) in the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Program {
    /// Program ID (`idint_rss`).
    pub id: u64,
    /// Title (`titol`).
    pub title: String,
    /// Image URL (`img`), empty when absent.
    pub image: String,
}

impl Program {
    /// Extracts a program from an `item` element.
    ///
    /// # Errors
    ///
    /// Returns `Service` if `idint_rss` is missing or not an integer.
    pub fn from_element(el: &XmlElement) -> Result<Self> {
        let raw_id = el.field("idint_rss");
        Ok(Self {
            id: parse_id(raw_id.as_deref(), "idint_rss")?,
            title: el.field("titol").unwrap_or_default(),
            image: absolute_url(el.field("img").as_deref()),
        })
    }
}

/// A single video.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Video {
    /// Video ID (`idint` attribute).
    pub id: u64,
    /// Title (`titol`).
    pub title: String,
    /// Subtitle (`subtitol`).
    pub subtitle: Option<String>,
    /// Raw air date text (`data`, `DD/MM/YYYY`).
    pub date_text: Option<String>,
    /// Raw duration text (`durada_h`, `HH:MM:SS`).
    pub duration_text: Option<String>,
    /// Duration in seconds; `0` when `durada_h` is absent or malformed.
    pub duration_secs: u32,
    /// Keyframe URL (`keyframe`), empty when absent.
    pub keyframe: String,
    /// Image URL (`img`), empty when absent.
    pub image: String,
}

impl Video {
    /// Extracts a video from an `item` element.
    ///
    /// # Errors
    ///
    /// Returns `Service` if the `idint` attribute is missing or not an integer.
    pub fn from_element(el: &XmlElement) -> Result<Self> {
        let duration_text = el.field("durada_h");
        Ok(Self {
            id: parse_id(el.attribute("idint").map(str::trim), "idint")?,
            title: el.field("titol").unwrap_or_default(),
            subtitle: el.field("subtitol"),
            date_text: el.field("data"),
            duration_secs: parse_duration(duration_text.as_deref()),
            duration_text,
            keyframe: absolute_url(el.field("keyframe").as_deref()),
            image: absolute_url(el.field("img").as_deref()),
        })
    }

    /// Air date.
    ///
    /// Unlike the duration, a bad date is not papered over.
    ///
    /// # Errors
    ///
    /// Returns `InvalidDate` if `data` is missing or not `DD/MM/YYYY`.
    pub fn air_date(&self) -> Result<NaiveDate> {
        let value = self.date_text.as_deref().unwrap_or_default();
        NaiveDate::parse_from_str(value, DATE_FORMAT).map_err(|e| AlacartaError::InvalidDate {
            value: String::from(value),
            reason: e.to_string(),
        })
    }

    /// Listing title: `"<subtitle> - <title>"` when `with_subtitle` is set and
    /// the title does not already contain the subtitle.
    #[must_use]
    pub fn display_title(&self, with_subtitle: bool) -> String {
        match self.subtitle.as_deref() {
            Some(sub) if with_subtitle && !self.title.contains(sub) => {
                format!("{sub} - {}", self.title)
            }
            _ => self.title.clone(),
        }
    }
}

/// Sorts videos newest first; videos without a valid air date go last.
pub fn sort_newest_first(videos: &mut [Video]) {
    videos.sort_by_key(|v| std::cmp::Reverse(v.air_date().ok()));
}

fn parse_id(raw: Option<&str>, field: &str) -> Result<u64> {
    let raw = raw.ok_or_else(|| AlacartaError::Service(format!("missing {field} in item")))?;
    raw.parse::<u64>()
        .map_err(|e| AlacartaError::Service(format!("invalid {field} {raw:?}: {e}")))
}

/// Converts `HH:MM:SS` to seconds. Anything else yields `0`.
#[must_use]
pub fn parse_duration(text: Option<&str>) -> u32 {
    let Some(caps) = text.and_then(|t| DURATION_RE.captures(t)) else {
        return 0;
    };
    let part = |i: usize| caps.get(i).and_then(|m| m.as_str().parse::<u32>().ok());
    match (part(1), part(2), part(3)) {
        (Some(h), Some(m), Some(s)) => h
            .checked_mul(3600)
            .zip(m.checked_mul(60))
            .and_then(|(h, m)| h.checked_add(m))
            .and_then(|hm| hm.checked_add(s))
            .unwrap_or(0),
        _ => 0,
    }
}

/// Prefixes host-relative paths with the web service host.
/// Absent values become an empty string.
#[must_use]
pub fn absolute_url(path: Option<&str>) -> String {
    match path {
        None => String::new(),
        Some(p) if p.starts_with('/') => format!("{WS_BASE_URL}{p}"),
        Some(p) => String::from(p),
    }
}
