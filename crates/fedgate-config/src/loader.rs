//! Configuration loading: TOML file plus environment overrides.

use std::path::Path;

use config::{Config, Environment, File};

use crate::{ConfigError, NodeConfig};

/// Loads and validates node configuration.
///
/// Sources, in ascending priority:
///
/// 1. The TOML file at `path`, when it exists
/// 2. Environment variables, e.g. `FEDGATE__CACHE__BACKEND=redis` or
///    `FEDGATE__CORRELATION__REQUEST__SECRET=…`
///
/// A missing file is not an error; a node can be configured entirely
/// through the environment. An invalid merged configuration is.
///
/// # Errors
///
/// Returns a build error when sources cannot be merged, a parse error
/// when the merged tree does not match the schema, and a validation
/// error for semantic problems (blank secrets, zero TTLs, a Redis
/// backend without a URL).
pub fn load_config(path: Option<&Path>) -> Result<NodeConfig, ConfigError> {
    let mut builder = Config::builder();
    if let Some(path) = path
        && path.exists()
    {
        builder = builder.add_source(File::from(path.to_path_buf()));
    }
    builder = builder.add_source(
        Environment::with_prefix("FEDGATE")
            .try_parsing(true)
            .separator("__"),
    );

    let merged = builder
        .build()
        .map_err(|e| ConfigError::Build(e.to_string()))?;
    let config: NodeConfig = merged
        .try_deserialize()
        .map_err(|e| ConfigError::Parse(e.to_string()))?;
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new()
            .suffix(".toml")
            .tempfile()
            .unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_load_from_file() {
        let file = write_config(
            r#"
            [correlation.request]
            issuer = "connector-request"
            secret = "s1"

            [correlation.response]
            issuer = "connector-response"
            secret = "s2"
            "#,
        );

        let config = load_config(Some(file.path())).unwrap();
        assert_eq!(config.correlation.request.issuer, "connector-request");
        // Unspecified sections fall back to defaults.
        assert_eq!(config.cache.max_entries, 10_000);
    }

    #[test]
    fn test_missing_secrets_fail_validation() {
        let file = write_config(
            r#"
            [cache]
            max_entries = 100
            "#,
        );

        let err = load_config(Some(file.path())).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }

    #[test]
    fn test_malformed_toml_is_a_build_error() {
        let file = write_config("cache = not-a-table");
        assert!(load_config(Some(file.path())).is_err());
    }

    #[test]
    fn test_missing_file_uses_defaults_and_fails_on_secrets() {
        // No file: defaults apply, and blank secrets are rejected.
        let err = load_config(Some(Path::new("/nonexistent/fedgate.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }
}
