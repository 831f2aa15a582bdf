//! Configuration validation.

use jobledger_core::is_identifier;

use crate::error::ConfigError;
use crate::schema::{BatchConfig, DatasourceKind};

/// Validation result.
#[derive(Debug, Default)]
pub struct ValidationResult {
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<ValidationWarning>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    pub fn add_warning(&mut self, warning: ValidationWarning) {
        self.warnings.push(warning);
    }

    /// Turn the first error into a `ConfigError`.
    pub fn into_result(self) -> Result<Vec<ValidationWarning>, ConfigError> {
        match self.errors.into_iter().next() {
            Some(e) => Err(ConfigError::InvalidValue {
                field: e.path,
                message: e.message,
            }),
            None => Ok(self.warnings),
        }
    }
}

/// A validation error.
#[derive(Debug)]
pub struct ValidationError {
    pub path: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// A validation warning.
#[derive(Debug)]
pub struct ValidationWarning {
    pub path: String,
    pub message: String,
}

impl ValidationWarning {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Configuration validator.
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate the configuration.
    pub fn validate(config: &BatchConfig) -> ValidationResult {
        let mut result = ValidationResult::default();

        Self::validate_datasource(config, &mut result);
        Self::validate_job(config, &mut result);
        Self::validate_ledger(config, &mut result);

        result
    }

    fn validate_datasource(config: &BatchConfig, result: &mut ValidationResult) {
        if config.datasource.kind == DatasourceKind::Memory {
            if config.datasource.path.is_some() {
                result.add_warning(ValidationWarning::new(
                    "datasource.path",
                    "path is ignored for the memory datasource",
                ));
            }
            if !config.initializer.enabled {
                result.add_warning(ValidationWarning::new(
                    "initializer.enabled",
                    "the memory datasource has no tables to initialize",
                ));
            }
        }
    }

    fn validate_job(config: &BatchConfig, result: &mut ValidationResult) {
        if config.job.names.iter().any(|n| n.trim().is_empty()) {
            result.add_error(ValidationError::new(
                "job.names",
                "job names cannot be empty",
            ));
        }
    }

    fn validate_ledger(config: &BatchConfig, result: &mut ValidationResult) {
        let prefix = &config.ledger.table_prefix;
        // Interpolated into DDL, so only identifier characters are allowed.
        if !is_identifier(prefix) {
            result.add_error(ValidationError::new(
                "ledger.table_prefix",
                format!("'{}' is not a valid SQL identifier prefix", prefix),
            ));
        }
    }
}

#[cfg(test)]
#[path = "validator_tests.rs"]
mod tests;
