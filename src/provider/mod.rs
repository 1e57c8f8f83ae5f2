/// Subtitle providers.
///
/// A provider searches one remote catalog for subtitles of a media file and
/// downloads the subtitles it found. Providers own a transport session that
/// lives between `initialize` and `terminate`; `ProviderGuard` ties that
/// lifecycle to a scope.
mod cached;
mod catalog;
mod language_aware;
mod listing;
mod subscene;

#[cfg(test)]
pub(crate) mod testing;

pub use cached::CachedProvider;
pub use language_aware::LanguageAwareSubsceneProvider;
pub use subscene::SubsceneProvider;

use crate::archive::ArchiveError;
use crate::language::Language;
use crate::media::MediaDescriptor;
use crate::subtitle::Subtitle;
use crate::transport::{HttpConnector, TransportError};
use std::collections::BTreeSet;
use std::ops::{Deref, DerefMut};
use std::time::Duration;
use thiserror::Error;

/// Default catalog server
pub const DEFAULT_SERVER_URL: &str = "https://subscene.com";

/// Errors that can occur while searching or downloading subtitles
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Talking to the catalog failed
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The catalog did not have the expected content
    #[error("Content not found: {0}")]
    ContentNotFound(String),

    /// The downloaded archive could not be used
    #[error(transparent)]
    Archive(#[from] ArchiveError),

    /// An operation needing a session was called before `initialize`
    #[error("Provider used before initialize")]
    NotInitialized,
}

/// Settings shared by all catalog providers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderConfig {
    /// Base URL of the catalog server
    pub server_url: String,
    /// User agent sent with every request
    pub user_agent: String,
    /// Per request timeout
    pub timeout: Duration,
    /// Also search by title, with filters disabled, in language aware
    /// providers
    pub extended_search: bool,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            user_agent: format!("subscout/{}", env!("CARGO_PKG_VERSION")),
            timeout: Duration::from_secs(30),
            extended_search: false,
        }
    }
}

impl ProviderConfig {
    /// Connector opening HTTP sessions with these settings.
    pub fn connector(&self) -> HttpConnector {
        HttpConnector::new(self.user_agent.as_str(), self.timeout)
    }

    /// Settings that change search results, as a cache key fragment.
    pub fn cache_scope(&self) -> String {
        let mode = if self.extended_search { "extended" } else { "simple" };
        format!("{}_{}", self.server_url, mode)
    }
}

/// A subtitle catalog.
///
/// The lifecycle is `initialize`, any number of `list_subtitles` and
/// `download_subtitle` calls, then `terminate`.
pub trait Provider {
    /// Short name identifying the provider.
    fn name(&self) -> &'static str;

    /// Distinguishes searches of the same provider that can return different
    /// results, such as another server or search mode.
    fn cache_scope(&self) -> String;

    /// Languages the provider can return subtitles in.
    fn languages(&self) -> BTreeSet<Language>;

    /// Opens the provider's session. Calling it on an initialized provider
    /// keeps the existing session.
    ///
    /// # Errors
    ///
    /// Returns `ProviderError::Transport` if the session cannot be opened.
    fn initialize(&mut self) -> Result<(), ProviderError>;

    /// Closes the session. A no-op on providers that were never initialized.
    fn terminate(&mut self);

    /// Finds the subtitles of `descriptor` in the given languages.
    ///
    /// # Arguments
    ///
    /// * `descriptor` - The media file to find subtitles for
    /// * `languages` - Languages to keep; every returned subtitle has one of them
    ///
    /// # Errors
    ///
    /// Returns `ProviderError::NotInitialized` without a session and
    /// `ProviderError::Transport` if the catalog cannot be reached.
    fn list_subtitles(
        &mut self,
        descriptor: &MediaDescriptor,
        languages: &BTreeSet<Language>,
    ) -> Result<Vec<Subtitle>, ProviderError>;

    /// Downloads the content of `subtitle`, storing it in the subtitle.
    ///
    /// # Errors
    ///
    /// Returns `ProviderError::ContentNotFound` if the catalog page has no
    /// download or the archive has no subtitle file, and
    /// `ProviderError::Archive` if the download is not a readable archive.
    fn download_subtitle(&mut self, subtitle: &mut Subtitle) -> Result<(), ProviderError>;
}

impl<P: Provider + ?Sized> Provider for Box<P> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn cache_scope(&self) -> String {
        (**self).cache_scope()
    }

    fn languages(&self) -> BTreeSet<Language> {
        (**self).languages()
    }

    fn initialize(&mut self) -> Result<(), ProviderError> {
        (**self).initialize()
    }

    fn terminate(&mut self) {
        (**self).terminate()
    }

    fn list_subtitles(
        &mut self,
        descriptor: &MediaDescriptor,
        languages: &BTreeSet<Language>,
    ) -> Result<Vec<Subtitle>, ProviderError> {
        (**self).list_subtitles(descriptor, languages)
    }

    fn download_subtitle(&mut self, subtitle: &mut Subtitle) -> Result<(), ProviderError> {
        (**self).download_subtitle(subtitle)
    }
}

/// An initialized provider that is terminated when dropped.
pub struct ProviderGuard<'a, P: Provider + ?Sized> {
    provider: &'a mut P,
}

impl<'a, P: Provider + ?Sized> ProviderGuard<'a, P> {
    /// Initializes `provider` for the lifetime of the guard.
    ///
    /// # Errors
    ///
    /// Returns the error of `Provider::initialize`.
    pub fn open(provider: &'a mut P) -> Result<Self, ProviderError> {
        provider.initialize()?;
        Ok(Self { provider })
    }
}

impl<P: Provider + ?Sized> Deref for ProviderGuard<'_, P> {
    type Target = P;

    fn deref(&self) -> &P {
        self.provider
    }
}

impl<P: Provider + ?Sized> DerefMut for ProviderGuard<'_, P> {
    fn deref_mut(&mut self) -> &mut P {
        self.provider
    }
}

impl<P: Provider + ?Sized> Drop for ProviderGuard<'_, P> {
    fn drop(&mut self) {
        self.provider.terminate();
    }
}
