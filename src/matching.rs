//! Match computation
//!
//! A match set lists the attributes on which a subtitle agrees with the
//! media descriptor. Each subtitle flavor compares a fixed attribute list;
//! ranking the resulting sets is left to the caller.

use crate::extraction::{ExtractedInfo, attribute};
use crate::media::MediaDescriptor;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Names of the attributes a subtitle matched on.
pub type MatchSet = BTreeSet<&'static str>;

/// Which provider family built a subtitle, and therefore how it is matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubtitleFlavor {
    /// Plain catalog listing
    Baseline,
    /// Listing filtered by language and season/episode
    LanguageAware,
}

struct MatchProfile {
    common: &'static [&'static str],
    episode: &'static [&'static str],
    filename_token: &'static str,
}

const BASELINE: MatchProfile = MatchProfile {
    common: &[
        attribute::TITLE,
        attribute::YEAR,
        attribute::FORMAT,
        attribute::RELEASE_GROUP,
        attribute::VIDEO_CODEC,
        attribute::AUDIO_CODEC,
    ],
    episode: &[
        attribute::SERIES,
        attribute::SEASON,
        attribute::EPISODE,
        attribute::HEARING_IMPAIRED,
    ],
    filename_token: "name",
};

const LANGUAGE_AWARE: MatchProfile = MatchProfile {
    common: &[
        attribute::TITLE,
        attribute::YEAR,
        attribute::FORMAT,
        attribute::RELEASE_GROUP,
        attribute::VIDEO_CODEC,
        attribute::AUDIO_CODEC,
        attribute::IMDB_ID,
        attribute::RESOLUTION,
    ],
    episode: &[
        attribute::SERIES,
        attribute::SEASON,
        attribute::EPISODE,
        attribute::HEARING_IMPAIRED,
        attribute::SERIES_IMDB_ID,
        attribute::TITLE,
    ],
    filename_token: "hash",
};

impl SubtitleFlavor {
    fn profile(self) -> &'static MatchProfile {
        match self {
            SubtitleFlavor::Baseline => &BASELINE,
            SubtitleFlavor::LanguageAware => &LANGUAGE_AWARE,
        }
    }

    /// Token added when the release name equals the media file's base name.
    pub fn filename_token(self) -> &'static str {
        self.profile().filename_token
    }

    /// Every name a match set of this flavor can contain for `descriptor`.
    pub fn candidate_attributes(self, descriptor: &MediaDescriptor) -> MatchSet {
        let profile = self.profile();
        let mut candidates: MatchSet = profile.common.iter().copied().collect();
        if descriptor.is_episode() {
            candidates.extend(profile.episode.iter().copied());
        }
        candidates.insert(profile.filename_token);
        candidates
    }

    /// Computes the match set of a subtitle against `descriptor`.
    pub fn matches(
        self,
        info: &ExtractedInfo,
        release_name: &str,
        descriptor: &MediaDescriptor,
    ) -> MatchSet {
        let profile = self.profile();
        let mut matches = matches_for(info, descriptor, profile.common);

        if descriptor.is_episode() {
            matches.extend(matches_for(info, descriptor, profile.episode));
        }

        if descriptor.base_name() == release_name {
            matches.insert(profile.filename_token);
        }

        matches
    }
}

/// Attributes present in both mappings with equal values.
fn matches_for(
    info: &ExtractedInfo,
    descriptor: &MediaDescriptor,
    attributes: &[&'static str],
) -> MatchSet {
    attributes
        .iter()
        .copied()
        .filter(|name| match (info.get(name), descriptor.attribute(name)) {
            (Some(guessed), Some(known)) => *guessed == known,
            _ => false,
        })
        .collect()
}
