//! Typed job parameters.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::LedgerError;

/// A single typed parameter value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum JobParameter {
    String(String),
    Long(i64),
    Double(f64),
    Date(DateTime<Utc>),
    Boolean(bool),
}

impl fmt::Display for JobParameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobParameter::String(v) => write!(f, "{}", v),
            JobParameter::Long(v) => write!(f, "{}", v),
            JobParameter::Double(v) => write!(f, "{}", v),
            JobParameter::Date(v) => write!(f, "{}", v.to_rfc3339()),
            JobParameter::Boolean(v) => write!(f, "{}", v),
        }
    }
}

/// Immutable name -> value mapping that identifies a launch request.
///
/// Keys are kept ordered so the serialized blob is canonical: two parameter
/// sets are the same identity exactly when their blobs are equal.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobParameters {
    entries: BTreeMap<String, JobParameter>,
}

impl JobParameters {
    /// Empty parameter set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a parameter, replacing any previous value for the key.
    pub fn with(mut self, key: impl Into<String>, value: JobParameter) -> Self {
        self.entries.insert(key.into(), value);
        self
    }

    pub fn with_string(self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.with(key, JobParameter::String(value.into()))
    }

    pub fn with_long(self, key: impl Into<String>, value: i64) -> Self {
        self.with(key, JobParameter::Long(value))
    }

    /// Add a double. NaN and infinities have no JSON form and are refused.
    pub fn with_double(self, key: impl Into<String>, value: f64) -> Result<Self, LedgerError> {
        let key = key.into();
        if !value.is_finite() {
            return Err(LedgerError::NonFiniteParameter(key));
        }
        Ok(self.with(key, JobParameter::Double(value)))
    }

    pub fn with_date(self, key: impl Into<String>, value: DateTime<Utc>) -> Self {
        self.with(key, JobParameter::Date(value))
    }

    pub fn with_boolean(self, key: impl Into<String>, value: bool) -> Self {
        self.with(key, JobParameter::Boolean(value))
    }

    pub fn get(&self, key: &str) -> Option<&JobParameter> {
        self.entries.get(key)
    }

    pub fn get_string(&self, key: &str) -> Option<&str> {
        match self.entries.get(key) {
            Some(JobParameter::String(v)) => Some(v),
            _ => None,
        }
    }

    pub fn get_long(&self, key: &str) -> Option<i64> {
        match self.entries.get(key) {
            Some(JobParameter::Long(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn get_double(&self, key: &str) -> Option<f64> {
        match self.entries.get(key) {
            Some(JobParameter::Double(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn get_date(&self, key: &str) -> Option<DateTime<Utc>> {
        match self.entries.get(key) {
            Some(JobParameter::Date(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn get_boolean(&self, key: &str) -> Option<bool> {
        match self.entries.get(key) {
            Some(JobParameter::Boolean(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &JobParameter)> {
        self.entries.iter()
    }

    /// Canonical JSON blob, as persisted by the ledger.
    ///
    /// Fails with [`LedgerError::NonFiniteParameter`] rather than writing a
    /// blob that could not be read back.
    pub fn to_blob(&self) -> Result<String, LedgerError> {
        for (key, value) in &self.entries {
            if let JobParameter::Double(v) = value {
                if !v.is_finite() {
                    return Err(LedgerError::NonFiniteParameter(key.clone()));
                }
            }
        }
        Ok(serde_json::to_string(self)?)
    }

    /// Parse a blob produced by [`JobParameters::to_blob`].
    pub fn from_blob(blob: &str) -> Result<Self, LedgerError> {
        Ok(serde_json::from_str(blob)?)
    }
}
