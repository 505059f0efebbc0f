//! Upload domain types
//!
//! An `Upload` is the file the user selected plus the free-form metadata
//! fields sent alongside it in the create-job form.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// A file selected for analysis
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upload {
    pub file_name: String,
    pub bytes: Vec<u8>,
    /// Extra form fields, sent as text parts
    pub fields: BTreeMap<String, String>,
}

impl Upload {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes,
            fields: BTreeMap::new(),
        }
    }

    /// Adds a metadata field, replacing any previous value under `name`
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// Adds every non-empty option as a metadata field
    pub fn with_options(mut self, options: &AnalysisOptions) -> Self {
        for (name, value) in options.fields() {
            self.fields.insert(name.to_string(), value.to_string());
        }
        self
    }

    /// Lower-cased file extension, if any
    pub fn extension(&self) -> Option<String> {
        Path::new(&self.file_name)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Optional analysis parameters accepted by the server
///
/// Anything left unset falls back to the server's configured investor
/// profile.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisOptions {
    /// Recipient of the emailed report
    pub email: Option<String>,
    pub investor_name: Option<String>,
    /// Comma-separated focus areas
    pub focus_areas: Option<String>,
    pub investment_stage: Option<String>,
}

impl AnalysisOptions {
    /// Form field names and trimmed values of the options that are set
    pub fn fields(&self) -> Vec<(&'static str, &str)> {
        [
            ("email", &self.email),
            ("investor_name", &self.investor_name),
            ("focus_areas", &self.focus_areas),
            ("investment_stage", &self.investment_stage),
        ]
        .into_iter()
        .filter_map(|(name, value)| {
            value
                .as_deref()
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(|v| (name, v))
        })
        .collect()
    }
}
