//! Unicode, whitespace, case, and linguistic normalization.
//!
//! Normalization modes form a ladder: `Basic` fixes Unicode form and
//! whitespace, `Advanced` adds case folding, `Linguistic` adds
//! tokenization, stop-word removal, and stemming. The stemmer is an
//! injected capability: when it is absent and not required, `Linguistic`
//! silently degrades to `Advanced`.

use rust_stemmers::{Algorithm as StemAlgorithm, Stemmer};
use serde::{Deserialize, Serialize};
use unicode_normalization::UnicodeNormalization;
use unicode_segmentation::UnicodeSegmentation;

use crate::error::{ExpungeError, ExpungeResult};
use crate::text::is_stop_word;

/// How aggressively text is normalized before comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NormalizeMode {
    /// Pass text through untouched.
    None,
    /// NFKC Unicode form, collapsed whitespace.
    #[default]
    Basic,
    /// Basic plus case folding.
    Advanced,
    /// Advanced plus tokenization, stop-word removal, and stemming.
    Linguistic,
}

/// Configuration for constructing a [`Normalizer`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NormalizerConfig {
    /// Default mode applied by [`Normalizer::normalize_default`].
    pub mode: NormalizeMode,
    /// When true, construction fails if the stemming backend is absent
    /// instead of degrading `Linguistic` to `Advanced`.
    pub require_stemmer: bool,
}

/// Stateless text normalizer with an optional stemming capability.
pub struct Normalizer {
    config: NormalizerConfig,
    stemmer: Option<Stemmer>,
}

impl Normalizer {
    /// Creates a normalizer with the English Snowball stemmer attached.
    pub fn new(config: NormalizerConfig) -> ExpungeResult<Self> {
        Self::with_stemmer(config, Some(Stemmer::create(StemAlgorithm::English)))
    }

    /// Creates a normalizer with an explicit (possibly absent) stemmer.
    ///
    /// Fails fast when the config requires a stemmer that is not supplied,
    /// rather than downgrading deep inside a matching run.
    pub fn with_stemmer(config: NormalizerConfig, stemmer: Option<Stemmer>) -> ExpungeResult<Self> {
        if config.require_stemmer && stemmer.is_none() {
            return Err(ExpungeError::Configuration(
                "linguistic normalization requires a stemmer, but none is available".to_string(),
            ));
        }
        Ok(Self { config, stemmer })
    }

    /// Normalizes `text` using the configured default mode.
    pub fn normalize_default(&self, text: &str) -> String {
        self.normalize(text, self.config.mode)
    }

    /// Normalizes `text` under the given mode.
    pub fn normalize(&self, text: &str, mode: NormalizeMode) -> String {
        match mode {
            NormalizeMode::None => text.to_string(),
            NormalizeMode::Basic => Self::basic(text),
            NormalizeMode::Advanced => Self::basic(text).to_lowercase(),
            NormalizeMode::Linguistic => {
                let advanced = Self::basic(text).to_lowercase();
                match &self.stemmer {
                    Some(stemmer) => Self::linguistic(&advanced, stemmer),
                    // Best-effort fallback when the backend is unavailable.
                    None => advanced,
                }
            }
        }
    }

    fn basic(text: &str) -> String {
        let unified: String = text.nfkc().collect();
        unified.split_whitespace().collect::<Vec<_>>().join(" ")
    }

    fn linguistic(text: &str, stemmer: &Stemmer) -> String {
        text.unicode_words()
            .filter(|w| !is_stop_word(w))
            .map(|w| stemmer.stem(w).into_owned())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// True when the stemming capability is attached.
    pub fn has_stemmer(&self) -> bool {
        self.stemmer.is_some()
    }
}
