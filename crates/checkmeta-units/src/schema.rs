//! Canonical rStat schema: which statistic codes exist and which division
//! each belongs to.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;

use checkmeta_types::Division;

use crate::error::CatalogError;

/// Shared-domain codes, valid on every unit.
pub const SHARED_CODES: &[&str] = &[
    "DD", "DS", "OTD", "AST", "ULT", "LVS", "LLS", "CTT", "EVS", "FFD", "FFI", "HLG",
];

/// Operations-only codes.
pub const OPS_CODES: &[&str] = &["DFS", "KNB", "RTOo", "CQTo", "BRXo", "HWIo", "MOTo", "AMBo"];

/// Intelligence-only codes.
pub const INTEL_CODES: &[&str] = &["MBi", "ILSi", "FEi", "DSRi", "INFi", "RSPi"];

#[derive(Deserialize)]
struct SchemaFile {
    #[serde(default)]
    codes: BTreeMap<String, Division>,
}

/// Mapping of statistic code to domain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatSchema {
    codes: BTreeMap<String, Division>,
}

impl Default for StatSchema {
    fn default() -> Self {
        Self::canonical()
    }
}

impl StatSchema {
    /// The canonical schema.
    pub fn canonical() -> Self {
        let shared = SHARED_CODES.iter().map(|c| (*c, Division::Both));
        let ops = OPS_CODES.iter().map(|c| (*c, Division::Ops));
        let intel = INTEL_CODES.iter().map(|c| (*c, Division::Intel));
        Self {
            codes: shared
                .chain(ops)
                .chain(intel)
                .map(|(code, domain)| (code.to_owned(), domain))
                .collect(),
        }
    }

    /// Load a schema from a YAML file of the form `codes: { DD: both, ... }`.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Io`] or [`CatalogError::Yaml`].
    pub fn from_file(path: &Path) -> Result<Self, CatalogError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse a schema from YAML.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Yaml`] for malformed YAML.
    pub fn parse(yaml: &str) -> Result<Self, CatalogError> {
        let file: SchemaFile = serde_yml::from_str(yaml)?;
        Ok(Self { codes: file.codes })
    }

    /// Domain of an exact canonical code.
    pub fn domain(&self, code: &str) -> Option<Division> {
        self.codes.get(code).copied()
    }

    /// Resolve a raw code to its canonical spelling and domain.
    ///
    /// A leading lowercase `r` is accepted as an alias (`rDD` -> `DD`)
    /// when the bare code is canonical and the raw code is not.
    pub fn resolve<'a>(&'a self, raw: &str) -> Option<(&'a str, Division)> {
        if let Some((code, domain)) = self.codes.get_key_value(raw) {
            return Some((code.as_str(), *domain));
        }
        let bare = raw.strip_prefix('r')?;
        self.codes
            .get_key_value(bare)
            .map(|(code, domain)| (code.as_str(), *domain))
    }

    /// Number of canonical codes.
    pub fn len(&self) -> usize {
        self.codes.len()
    }

    /// Whether the schema has no codes.
    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }
}
