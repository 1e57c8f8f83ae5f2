//! Server side search filters
//!
//! The catalog narrows its results through cookies. `FilterState` holds the
//! filters built for a search together with the cookies currently applied to
//! the session, and moves between the enabled and disabled states through pure
//! transitions.

use crate::language::{Language, LanguageResolver};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{info, warn};

pub const FOREIGN_ONLY: &str = "ForeignOnly";
pub const HEARING_IMPAIRED: &str = "HearingImpaired";
pub const LANGUAGE_FILTER: &str = "LanguageFilter";

/// Filters built for a search and the cookies currently applied.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterState {
    filters: BTreeMap<String, String>,
    session: BTreeMap<String, String>,
}

impl FilterState {
    /// Builds the filters for the requested languages.
    ///
    /// The returned state is disabled; call `with_filters_enabled` to apply
    /// it. Languages without a catalog filter code are left out of the
    /// language filter.
    pub fn create(languages: &BTreeSet<Language>, resolver: &dyn LanguageResolver) -> Self {
        let mut codes = Vec::new();
        for language in languages {
            match resolver.filter_code(language) {
                Some(code) => codes.push(code.to_string()),
                None => warn!("No language filter code for '{}'", language),
            }
        }

        let filters = BTreeMap::from([
            (FOREIGN_ONLY.to_string(), "False".to_string()),
            (HEARING_IMPAIRED.to_string(), "2".to_string()),
            (LANGUAGE_FILTER.to_string(), codes.join(",")),
        ]);
        info!("Filter created: '{:?}'", filters);

        Self {
            filters,
            session: BTreeMap::new(),
        }
    }

    /// Returns a state whose session carries every filter.
    pub fn with_filters_enabled(&self) -> Self {
        let mut session = self.session.clone();
        session.extend(self.filters.clone());
        info!("Filters applied");
        Self {
            filters: self.filters.clone(),
            session,
        }
    }

    /// Returns a state whose session carries none of the filter keys.
    pub fn with_filters_disabled(&self) -> Self {
        let session = self
            .session
            .iter()
            .filter(|(key, _)| !self.filters.contains_key(*key))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        info!("Filters discarded");
        Self {
            filters: self.filters.clone(),
            session,
        }
    }

    /// Cookies to send with the next request.
    pub fn cookies(&self) -> &BTreeMap<String, String> {
        &self.session
    }

    /// Filters built for the current search.
    pub fn filters(&self) -> &BTreeMap<String, String> {
        &self.filters
    }

    pub fn is_enabled(&self) -> bool {
        !self.filters.is_empty()
            && self
                .filters
                .iter()
                .all(|(k, v)| self.session.get(k) == Some(v))
    }
}
