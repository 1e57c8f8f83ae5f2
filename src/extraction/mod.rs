//! Release name metadata extraction
//!
//! Subtitle catalogs only know the free-text release name of a subtitle
//! ("Show.S02E05.720p.HDTV.x264-GRP"). This module defines the capability that
//! turns such a name into a structured attribute mapping, and the mapping type
//! itself. Extraction never fails: unknown input yields an empty or partial
//! mapping.

mod release_name;

pub use release_name::ReleaseNameExtractor;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Attribute names shared by extractors, descriptors and match sets.
pub mod attribute {
    pub const TITLE: &str = "title";
    pub const SERIES: &str = "series";
    pub const SEASON: &str = "season";
    pub const EPISODE: &str = "episode";
    pub const EPISODE_TITLE: &str = "episode_title";
    pub const YEAR: &str = "year";
    pub const FORMAT: &str = "format";
    pub const RELEASE_GROUP: &str = "release_group";
    pub const VIDEO_CODEC: &str = "video_codec";
    pub const AUDIO_CODEC: &str = "audio_codec";
    pub const SCREEN_SIZE: &str = "screen_size";
    pub const RESOLUTION: &str = "resolution";
    pub const IMDB_ID: &str = "imdb_id";
    pub const SERIES_IMDB_ID: &str = "series_imdb_id";
    pub const HEARING_IMPAIRED: &str = "hearing_impaired";
}

/// A single guessed attribute value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttrValue {
    Flag(bool),
    Number(u32),
    Text(String),
}

impl AttrValue {
    /// Numeric view of the value, if it is a number.
    pub fn as_number(&self) -> Option<u32> {
        match self {
            AttrValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Text view of the value, if it is text.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            AttrValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Whether the value carries information.
    ///
    /// Empty text, zero and `false` count as "not exposed" when comparing
    /// against a descriptor.
    pub fn is_truthy(&self) -> bool {
        match self {
            AttrValue::Flag(b) => *b,
            AttrValue::Number(n) => *n != 0,
            AttrValue::Text(s) => !s.is_empty(),
        }
    }
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttrValue::Flag(b) => write!(f, "{}", b),
            AttrValue::Number(n) => write!(f, "{}", n),
            AttrValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for AttrValue {
    fn from(value: &str) -> Self {
        AttrValue::Text(value.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(value: String) -> Self {
        AttrValue::Text(value)
    }
}

impl From<u32> for AttrValue {
    fn from(value: u32) -> Self {
        AttrValue::Number(value)
    }
}

impl From<bool> for AttrValue {
    fn from(value: bool) -> Self {
        AttrValue::Flag(value)
    }
}

/// Attributes guessed from a release name, keyed by attribute name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExtractedInfo(BTreeMap<String, AttrValue>);

impl ExtractedInfo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&AttrValue> {
        self.0.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn insert(&mut self, name: &str, value: impl Into<AttrValue>) {
        self.0.insert(name.to_string(), value.into());
    }

    pub fn remove(&mut self, name: &str) -> Option<AttrValue> {
        self.0.remove(name)
    }

    pub fn number(&self, name: &str) -> Option<u32> {
        self.get(name).and_then(AttrValue::as_number)
    }

    pub fn text(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(AttrValue::as_text)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &AttrValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl<K: Into<String>, V: Into<AttrValue>> FromIterator<(K, V)> for ExtractedInfo {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// Capability that guesses structured attributes from a release name.
///
/// Implementations must tolerate arbitrary free text and return a partial or
/// empty mapping instead of failing.
pub trait MetadataExtractor {
    /// Guesses attributes from the given release name.
    fn extract(&self, release_name: &str) -> ExtractedInfo;
}

impl<F> MetadataExtractor for F
where
    F: Fn(&str) -> ExtractedInfo,
{
    fn extract(&self, release_name: &str) -> ExtractedInfo {
        self(release_name)
    }
}
