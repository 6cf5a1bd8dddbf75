use crate::config::types::Config;
use crate::config::validation::validate;
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Loads and parses a configuration file from the given path
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(Config)` - Successfully loaded and validated configuration
/// * `Err(ConfigError)` - Failed to load, parse, or validate the configuration
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use reelmine::config::load_config;
///
/// let config = load_config(Path::new("reelmine.toml")).unwrap();
/// println!("Dataset: {}", config.output.dataset_path);
/// ```
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let config: Config = toml::from_str(&content)?;
    validate(&config)?;
    Ok(config)
}

/// Computes a SHA-256 hash of the configuration file content
///
/// Recorded with each run so runs made under different settings can be told
/// apart.
pub fn compute_config_hash(path: &Path) -> Result<String, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    Ok(hex::encode(hasher.finalize()))
}

/// Loads a configuration and returns both the config and its hash
pub fn load_config_with_hash(path: &Path) -> Result<(Config, String), ConfigError> {
    let config = load_config(path)?;
    let hash = compute_config_hash(path)?;
    Ok((config, hash))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::types::{DatasetFormat, DEFAULT_REQUEST_TIMEOUT_MS};
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_load_valid_config() {
        let config_content = r#"
[target]
url-template = "https://www.kinopoisk.ru/film/{}"
ids-path = "data/movie_ids.txt"

[network]
proxy = "socks5h://127.0.0.1:9050"
request-timeout-ms = 5000

[network.headers]
User-Agent = "TestAgent/1.0"
Accept-Language = "ru-RU"

[retry]
max-attempts-per-target = 12
rotation-delay-ms = 250

[output]
dataset-path = "data/kinopoisk.sqlite"
format = "sqlite"
"#;

        let file = create_temp_config(config_content);
        let config = load_config(file.path()).unwrap();

        assert_eq!(config.target.ids_path, "data/movie_ids.txt");
        assert_eq!(
            config.network.proxy.as_deref(),
            Some("socks5h://127.0.0.1:9050")
        );
        assert!(config.network.isolate_circuits);
        assert_eq!(config.network.effective_headers().len(), 2);
        assert_eq!(config.retry.attempt_limit(), Some(12));
        assert_eq!(config.retry.rotation_delay_ms, 250);
        assert_eq!(config.output.format, DatasetFormat::Sqlite);
    }

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config_content = r#"
[target]
url-template = "https://www.kinopoisk.ru/film/{}"
ids-path = "ids.txt"

[output]
dataset-path = "kinopoisk.csv"
"#;

        let file = create_temp_config(config_content);
        let config = load_config(file.path()).unwrap();

        assert_eq!(config.network.proxy, None);
        assert_eq!(config.network.request_timeout_ms, DEFAULT_REQUEST_TIMEOUT_MS);
        assert!(config
            .network
            .effective_headers()
            .iter()
            .any(|(name, _)| name == "User-Agent"));
        assert_eq!(config.retry.attempt_limit(), None);
        assert_eq!(config.retry.rotation_delay_ms, 0);
        assert_eq!(config.output.format, DatasetFormat::Csv);
    }

    #[test]
    fn test_example_config_is_valid() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("reelmine.example.toml");
        let config = load_config(&path).unwrap();
        assert_eq!(config.output.format, DatasetFormat::Csv);
        assert_eq!(config.retry.attempt_limit(), None);
    }

    #[test]
    fn test_load_config_with_invalid_path() {
        let result = load_config(Path::new("/nonexistent/reelmine.toml"));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn test_load_config_with_invalid_toml() {
        let file = create_temp_config("this is not valid TOML {{{");
        let result = load_config(file.path());
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_load_config_with_unknown_format() {
        let config_content = r#"
[target]
url-template = "https://www.kinopoisk.ru/film/{}"
ids-path = "ids.txt"

[output]
dataset-path = "kinopoisk.parquet"
format = "parquet"
"#;
        let file = create_temp_config(config_content);
        assert!(matches!(
            load_config(file.path()),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_load_config_with_validation_error() {
        let config_content = r#"
[target]
url-template = "https://www.kinopoisk.ru/film/"
ids-path = "ids.txt"

[output]
dataset-path = "kinopoisk.csv"
"#;

        let file = create_temp_config(config_content);
        let result = load_config(file.path());
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_compute_config_hash() {
        let file = create_temp_config("test content");

        let hash1 = compute_config_hash(file.path()).unwrap();
        let hash2 = compute_config_hash(file.path()).unwrap();

        assert_eq!(hash1, hash2);
        assert_eq!(hash1.len(), 64);
    }

    #[test]
    fn test_different_content_different_hash() {
        let file1 = create_temp_config("content 1");
        let file2 = create_temp_config("content 2");

        let hash1 = compute_config_hash(file1.path()).unwrap();
        let hash2 = compute_config_hash(file2.path()).unwrap();

        assert_ne!(hash1, hash2);
    }
}
