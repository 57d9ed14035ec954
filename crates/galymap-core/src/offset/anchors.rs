use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::offset::scanner::resolve_signature;
use crate::offset::signature::SignatureSet;
use crate::process::ModuleImage;

/// A named, module-relative offset discovered by one signature scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Anchor {
    pub offset: u64,
    pub required: bool,
}

/// Resolved anchors for one attach. Immutable once built.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnchorTable {
    anchors: BTreeMap<String, Anchor>,
}

impl AnchorTable {
    pub fn from_entries<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (S, Anchor)>,
        S: Into<String>,
    {
        Self {
            anchors: entries
                .into_iter()
                .map(|(name, anchor)| (name.into(), anchor))
                .collect(),
        }
    }

    pub fn get(&self, name: &str) -> Option<u64> {
        self.anchors.get(name).map(|anchor| anchor.offset)
    }

    /// Module-relative offset of `name`, or `MissingAnchor`.
    pub fn require(&self, name: &str) -> Result<u64> {
        self.get(name)
            .ok_or_else(|| Error::MissingAnchor(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.anchors.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Anchor)> {
        self.anchors.iter().map(|(name, anchor)| (name.as_str(), anchor))
    }

    pub fn len(&self) -> usize {
        self.anchors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.anchors.is_empty()
    }

    /// Run every configured signature once against `image`.
    ///
    /// Never fails as a whole; per-name failures are collected in the result
    /// and the caller decides which of them are fatal.
    pub fn resolve_all(image: &ModuleImage, signatures: &SignatureSet) -> AnchorResolution {
        let mut anchors = BTreeMap::new();
        let mut failures = Vec::new();

        for spec in &signatures.entries {
            match resolve_signature(image, spec) {
                Ok(offset) => {
                    info!("Resolved anchor {} = {:#x}", spec.name, offset);
                    anchors.insert(
                        spec.name.clone(),
                        Anchor {
                            offset,
                            required: spec.required,
                        },
                    );
                }
                Err(e) => {
                    if spec.required {
                        warn!("Required anchor {} not resolved: {}", spec.name, e);
                    } else {
                        warn!("Optional anchor {} not resolved, feature disabled: {}", spec.name, e);
                    }
                    failures.push(AnchorFailure {
                        name: spec.name.clone(),
                        required: spec.required,
                        error: e,
                    });
                }
            }
        }

        AnchorResolution {
            table: AnchorTable { anchors },
            failures,
        }
    }
}

#[derive(Debug)]
pub struct AnchorFailure {
    pub name: String,
    pub required: bool,
    pub error: Error,
}

/// Outcome of [`AnchorTable::resolve_all`]: what resolved and what did not.
#[derive(Debug)]
pub struct AnchorResolution {
    pub table: AnchorTable,
    pub failures: Vec<AnchorFailure>,
}

impl AnchorResolution {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn missing_required(&self) -> impl Iterator<Item = &AnchorFailure> {
        self.failures.iter().filter(|failure| failure.required)
    }

    /// The table, provided every required anchor resolved.
    pub fn into_table(self) -> Result<AnchorTable> {
        match self.failures.into_iter().find(|failure| failure.required) {
            Some(failure) => Err(match failure.error {
                Error::SignatureNotFound { name } => Error::SignatureNotFound { name },
                _ => Error::MissingAnchor(failure.name),
            }),
            None => Ok(self.table),
        }
    }
}
