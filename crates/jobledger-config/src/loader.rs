//! Configuration loader.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;
use crate::schema::BatchConfig;

/// Configuration loader with environment variable substitution.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<BatchConfig, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.display().to_string()));
        }
        let content = fs::read_to_string(path)?;
        Self::load_str(&content)
    }

    /// Load configuration from a string.
    pub fn load_str(content: &str) -> Result<BatchConfig, ConfigError> {
        let expanded = Self::expand_env_vars(content)?;
        let mut config: BatchConfig = toml::from_str(&expanded)?;
        if let Some(path) = &config.datasource.path {
            config.datasource.path = Some(PathBuf::from(Self::expand_path(&path.to_string_lossy())));
        }
        Ok(config)
    }

    /// Expand environment variables in the format `${VAR}`.
    fn expand_env_vars(content: &str) -> Result<String, ConfigError> {
        let mut result = content.to_string();
        let re = regex::Regex::new(r"\$\{([^}]+)\}")
            .map_err(|e| ConfigError::InvalidFormat(e.to_string()))?;

        for cap in re.captures_iter(content) {
            let var_name = &cap[1];
            let var_value = std::env::var(var_name)
                .map_err(|_| ConfigError::EnvVarNotSet(var_name.to_string()))?;
            result = result.replace(&cap[0], &var_value);
        }

        Ok(result)
    }

    /// Expand shell-style paths (e.g., `~/jobs.db`).
    pub fn expand_path(path: &str) -> String {
        shellexpand::tilde(path).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::DatasourceKind;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_empty_config() {
        let config = ConfigLoader::load_str("").unwrap();
        assert!(config.initializer.enabled);
        assert_eq!(config.ledger.table_prefix, "BATCH_");
    }

    #[test]
    fn test_disable_initializer() {
        let content = r#"
            [datasource]
            name = "batchtest"

            [initializer]
            enabled = false
        "#;
        let config = ConfigLoader::load_str(content).unwrap();
        assert_eq!(config.datasource.name, "batchtest");
        assert!(!config.initializer.enabled);
    }

    #[test]
    fn test_load_full_config() {
        let content = r#"
            [datasource]
            kind = "memory"

            [job]
            enabled = false
            names = ["import", "export"]

            [ledger]
            table_prefix = "ETL_"
        "#;
        let config = ConfigLoader::load_str(content).unwrap();
        assert_eq!(config.datasource.kind, DatasourceKind::Memory);
        assert!(!config.job.enabled);
        assert_eq!(config.job.names.len(), 2);
        assert_eq!(config.ledger.table_prefix, "ETL_");
    }

    #[test]
    fn test_load_expands_tilde_in_path() {
        let config = ConfigLoader::load_str("[datasource]\npath = \"~/jobs.db\"").unwrap();
        let path = config.datasource.path.unwrap();
        assert!(!path.to_string_lossy().starts_with('~'));
        assert!(path.to_string_lossy().ends_with("jobs.db"));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[initializer]").unwrap();
        writeln!(file, "enabled = false").unwrap();

        let config = ConfigLoader::load(file.path()).unwrap();
        assert!(!config.initializer.enabled);
    }

    #[test]
    fn test_load_nonexistent_file() {
        let result = ConfigLoader::load(Path::new("/nonexistent/path/batch.toml"));
        assert!(matches!(result, Err(ConfigError::NotFound(_))));
    }

    #[test]
    fn test_load_invalid_toml() {
        let result = ConfigLoader::load_str("enabled = [unclosed");
        assert!(result.is_err());
    }

    #[test]
    fn test_expand_env_vars() {
        // SAFETY: This test runs in isolation and sets a unique test-only env var
        unsafe {
            std::env::set_var("JOBLEDGER_TEST_DB_NAME", "from_env");
        }
        let config = ConfigLoader::load_str("[datasource]\nname = \"${JOBLEDGER_TEST_DB_NAME}\"").unwrap();
        assert_eq!(config.datasource.name, "from_env");
        unsafe {
            std::env::remove_var("JOBLEDGER_TEST_DB_NAME");
        }
    }

    #[test]
    fn test_expand_env_vars_not_set() {
        let result = ConfigLoader::expand_env_vars("value = \"${NONEXISTENT_JOBLEDGER_VAR_12345}\"");
        assert!(matches!(result, Err(ConfigError::EnvVarNotSet(_))));
    }

    #[test]
    fn test_expand_path_no_tilde() {
        assert_eq!(ConfigLoader::expand_path("/var/lib/jobs.db"), "/var/lib/jobs.db");
    }
}
