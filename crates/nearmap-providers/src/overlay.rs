//! Static per-business overrides loaded from YAML.
//!
//! ```yaml
//! overrides:
//!   - id: "4b5a1c2ef964a520"
//!     website: "https://unionstationcoffee.example"
//! ```

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use nearmap_core::{Business, OverlayPolicy};

#[derive(Debug, Error)]
pub enum OverlayError {
    #[error("failed to read overlay file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse overlay file: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("overlay entry has an empty id")]
    EmptyId,
    #[error("duplicate overlay id: '{0}'")]
    DuplicateId(String),
}

/// Fields that may be overlaid onto a provider record with matching `id`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BusinessOverride {
    pub id: String,
    pub website: Option<String>,
    pub name: Option<String>,
    pub phone: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OverlayFile {
    #[serde(default)]
    overrides: Vec<BusinessOverride>,
}

#[derive(Debug, Clone, Default)]
pub struct StaticOverlay {
    by_id: HashMap<String, BusinessOverride>,
    policy: OverlayPolicy,
}

impl StaticOverlay {
    /// Load and validate an overlay file.
    ///
    /// # Errors
    ///
    /// Returns `OverlayError` if the file cannot be read, parsed, or has
    /// empty or duplicate ids.
    pub fn load(path: &Path, policy: OverlayPolicy) -> Result<Self, OverlayError> {
        let content = std::fs::read_to_string(path).map_err(|e| OverlayError::Io {
            path: path.display().to_string(),
            source: e,
        })?;
        Self::from_yaml_str(&content, policy)
    }

    /// # Errors
    ///
    /// Returns `OverlayError` if the YAML is malformed or has empty or
    /// duplicate ids.
    pub fn from_yaml_str(yaml: &str, policy: OverlayPolicy) -> Result<Self, OverlayError> {
        let file: OverlayFile = serde_yaml::from_str(yaml)?;
        Self::from_overrides(file.overrides, policy)
    }

    /// # Errors
    ///
    /// Returns `OverlayError` on empty or duplicate ids.
    pub fn from_overrides(
        overrides: Vec<BusinessOverride>,
        policy: OverlayPolicy,
    ) -> Result<Self, OverlayError> {
        let mut by_id = HashMap::with_capacity(overrides.len());
        for entry in overrides {
            if entry.id.trim().is_empty() {
                return Err(OverlayError::EmptyId);
            }
            if by_id.contains_key(&entry.id) {
                return Err(OverlayError::DuplicateId(entry.id));
            }
            by_id.insert(entry.id.clone(), entry);
        }
        Ok(Self { by_id, policy })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    /// Apply the matching override, if any. Fields absent from the override
    /// are never touched.
    #[must_use]
    pub fn apply(&self, mut business: Business) -> Business {
        let Some(entry) = self.by_id.get(&business.id) else {
            return business;
        };

        overlay_field(&mut business.website, entry.website.as_ref(), self.policy);
        overlay_field(&mut business.phone, entry.phone.as_ref(), self.policy);
        if let Some(name) = entry.name.as_ref() {
            if self.policy == OverlayPolicy::Replace || business.name.trim().is_empty() {
                business.name.clone_from(name);
            }
        }
        tracing::debug!(id = %business.id, "applied overlay");
        business
    }
}

fn overlay_field(target: &mut Option<String>, value: Option<&String>, policy: OverlayPolicy) {
    let Some(value) = value else {
        return;
    };
    let primary_missing = target.as_deref().map_or(true, |s| s.trim().is_empty());
    if primary_missing || policy == OverlayPolicy::Replace {
        *target = Some(value.clone());
    }
}
