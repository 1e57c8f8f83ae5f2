//! Language normalization
//!
//! Catalog pages label subtitle languages with human readable names
//! ("English", "Farsi/Persian", "Brazillian Portuguese"). Everything inside the
//! crate works with ISO 639-3 codes instead; this module converts between the
//! two and knows the numeric codes the catalog expects in its language filter.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use thiserror::Error;

/// Errors that can occur while normalizing languages
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LanguageError {
    /// The catalog label does not map to any known language
    #[error("Unsupported language: {0}")]
    UnsupportedLanguage(String),
}

/// A normalized language, identified by its ISO 639-3 code.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Language(String);

impl Language {
    /// Creates a language from an ISO 639-3 code ("eng", "fra", ...).
    pub fn new(alpha3: &str) -> Self {
        Self(alpha3.trim().to_lowercase())
    }

    pub fn alpha3(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Converts catalog language labels into normalized languages.
pub trait LanguageResolver {
    /// Resolves a catalog label to a language.
    ///
    /// # Errors
    ///
    /// Returns `LanguageError::UnsupportedLanguage` for unknown labels.
    fn resolve(&self, label: &str) -> Result<Language, LanguageError>;

    /// Numeric code used by the catalog's server side language filter.
    fn filter_code(&self, language: &Language) -> Option<u32>;

    /// All languages this resolver can produce.
    fn supported(&self) -> BTreeSet<Language>;
}

/// Label, ISO 639-3 code and language filter code of every language subscene lists.
const SUBSCENE_LANGUAGES: &[(&str, &str, Option<u32>)] = &[
    ("Albanian", "sqi", Some(1)),
    ("Arabic", "ara", Some(2)),
    ("Armenian", "hye", Some(73)),
    ("Azerbaijani", "aze", Some(55)),
    ("Basque", "eus", Some(74)),
    ("Belarusian", "bel", Some(68)),
    ("Bengali", "ben", Some(54)),
    ("Big 5 code", "zho", None),
    ("Bosnian", "bos", Some(60)),
    ("Brazillian Portuguese", "por", Some(32)),
    ("Bulgarian", "bul", Some(5)),
    ("Burmese", "mya", Some(61)),
    ("Catalan", "cat", Some(49)),
    ("Chinese BG code", "zho", None),
    ("Croatian", "hrv", Some(8)),
    ("Czech", "ces", Some(9)),
    ("Danish", "dan", Some(10)),
    ("Dutch", "nld", Some(11)),
    ("English", "eng", Some(13)),
    ("Esperanto", "epo", Some(47)),
    ("Estonian", "est", Some(16)),
    ("Farsi/Persian", "fas", Some(46)),
    ("Finnish", "fin", Some(17)),
    ("French", "fra", Some(18)),
    ("Georgian", "kat", Some(62)),
    ("German", "deu", Some(19)),
    ("Greek", "ell", Some(21)),
    ("Greenlandic", "kal", Some(57)),
    ("Hebrew", "heb", Some(22)),
    ("Hindi", "hin", Some(51)),
    ("Hungarian", "hun", Some(23)),
    ("Icelandic", "isl", Some(25)),
    ("Indonesian", "ind", Some(44)),
    ("Italian", "ita", Some(26)),
    ("Japanese", "jpn", Some(27)),
    ("Korean", "kor", Some(28)),
    ("Kurdish", "kur", Some(52)),
    ("Latvian", "lav", Some(29)),
    ("Lithuanian", "lit", Some(43)),
    ("Macedonian", "mkd", Some(48)),
    ("Malay", "msa", Some(50)),
    ("Malayalam", "mal", Some(64)),
    ("Manipuri", "mni", Some(65)),
    ("Mongolian", "mon", Some(72)),
    ("Norwegian", "nor", Some(30)),
    ("Pashto", "pus", Some(67)),
    ("Polish", "pol", Some(31)),
    ("Portuguese", "por", Some(32)),
    ("Punjabi", "pan", Some(66)),
    ("Romanian", "ron", Some(33)),
    ("Russian", "rus", Some(34)),
    ("Serbian", "srp", Some(35)),
    ("Sinhala", "sin", Some(58)),
    ("Slovak", "slk", Some(36)),
    ("Slovenian", "slv", Some(37)),
    ("Somali", "som", Some(70)),
    ("Spanish", "spa", Some(38)),
    ("Swedish", "swe", Some(39)),
    ("Tagalog", "tgl", Some(53)),
    ("Tamil", "tam", Some(59)),
    ("Telugu", "tel", Some(63)),
    ("Thai", "tha", Some(40)),
    ("Turkish", "tur", Some(41)),
    ("Ukrainian", "ukr", Some(56)),
    ("Urdu", "urd", Some(42)),
    ("Vietnamese", "vie", Some(45)),
    ("Yoruba", "yor", Some(71)),
];

/// Language table of the subscene catalog.
#[derive(Debug, Clone, Copy, Default)]
pub struct SubsceneLanguages;

impl SubsceneLanguages {
    /// Parses user input naming a language, either by ISO 639-3 code
    /// ("eng") or by catalog label ("English").
    pub fn lookup(&self, input: &str) -> Result<Language, LanguageError> {
        let code = Language::new(input);
        if self.supported().contains(&code) {
            return Ok(code);
        }
        self.resolve(input)
    }
}

impl LanguageResolver for SubsceneLanguages {
    fn resolve(&self, label: &str) -> Result<Language, LanguageError> {
        let label = label.trim();
        SUBSCENE_LANGUAGES
            .iter()
            .find(|(name, _, _)| name.eq_ignore_ascii_case(label))
            .map(|(_, alpha3, _)| Language::new(alpha3))
            .ok_or_else(|| LanguageError::UnsupportedLanguage(label.to_string()))
    }

    fn filter_code(&self, language: &Language) -> Option<u32> {
        SUBSCENE_LANGUAGES
            .iter()
            .find(|(_, alpha3, _)| *alpha3 == language.alpha3())
            .and_then(|(_, _, code)| *code)
    }

    fn supported(&self) -> BTreeSet<Language> {
        SUBSCENE_LANGUAGES
            .iter()
            .map(|(_, alpha3, _)| Language::new(alpha3))
            .collect()
    }
}
