//! Configuration and capability gating for annotation editing.
//!
//! A page is created with an [`AnnotConfig`]. Modules that would otherwise be
//! gated by a licence check (redaction) are enabled or disabled here.

use serde::{Deserialize, Serialize};

/// Predicate deciding whether a page content element falls under a
/// redaction region.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub enum RedactionCoverage {
    /// The element's bounding box must lie entirely inside the region
    #[default]
    FullyContained,
    /// At least this fraction (0.0..=1.0) of the element's bounding box
    /// area must be covered by the region
    AtLeast(f32),
}

impl RedactionCoverage {
    /// Check whether an element with the given covered fraction qualifies.
    pub fn accepts(&self, covered_fraction: f32) -> bool {
        match *self {
            RedactionCoverage::FullyContained => covered_fraction >= 1.0 - 1e-4,
            RedactionCoverage::AtLeast(min) => {
                covered_fraction > 0.0 && covered_fraction + 1e-4 >= min.clamp(0.0, 1.0)
            },
        }
    }
}

/// Annotation editing configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnnotConfig {
    /// Redaction module right. `Redact` annotations cannot be created or
    /// applied without it.
    pub redaction: bool,

    /// Title given to new markup annotations and state notes.
    pub default_author: Option<String>,

    /// Which content elements a redaction removes.
    pub redaction_coverage: RedactionCoverage,

    /// Assign a UUID `NM` entry to every new annotation.
    pub generate_unique_ids: bool,

    /// Regenerate appearance streams for imported annotations without one.
    pub auto_regenerate_on_import: bool,
}

impl Default for AnnotConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl AnnotConfig {
    /// Create new configuration with defaults.
    pub fn new() -> Self {
        Self {
            redaction: true,
            default_author: None,
            redaction_coverage: RedactionCoverage::default(),
            generate_unique_ids: true,
            auto_regenerate_on_import: false,
        }
    }

    /// Grant or revoke the redaction module right.
    pub fn with_redaction(mut self, enable: bool) -> Self {
        self.redaction = enable;
        self
    }

    /// Set the default author.
    pub fn with_default_author(mut self, author: impl Into<String>) -> Self {
        self.default_author = Some(author.into());
        self
    }

    /// Set the redaction coverage predicate.
    pub fn with_redaction_coverage(mut self, coverage: RedactionCoverage) -> Self {
        self.redaction_coverage = coverage;
        self
    }

    /// Enable unique ID generation.
    pub fn with_unique_ids(mut self, enable: bool) -> Self {
        self.generate_unique_ids = enable;
        self
    }

    /// Enable appearance regeneration on import.
    pub fn with_auto_regenerate_on_import(mut self, enable: bool) -> Self {
        self.auto_regenerate_on_import = enable;
        self
    }
}
