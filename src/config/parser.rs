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
/// use sumi_harvest::config::load_config;
///
/// let config = load_config(Path::new("harvest.toml")).unwrap();
/// println!("Detail workers: {}", config.crawler.detail_concurrency);
/// ```
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    parse_config(&content)
}

/// Parses and validates configuration from TOML text
pub fn parse_config(content: &str) -> Result<Config, ConfigError> {
    let config: Config = toml::from_str(content)?;
    validate(&config)?;
    Ok(config)
}

/// Computes a SHA-256 hash of the configuration file content
///
/// Recorded alongside exported runs so results can be traced back to the
/// configuration that produced them.
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
    use crate::config::OutputFormat;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    const MINIMAL_CONFIG: &str = r#"
[site]
base-url = "https://www.example.com"
listing-template = "https://www.example.com/parts/search/?page={page}"

[crawler]

[user-agent]
value = "Mozilla/5.0"

[output]
path = "data/products.csv"
"#;

    #[test]
    fn test_load_minimal_config_uses_defaults() {
        let file = create_temp_config(MINIMAL_CONFIG);
        let config = load_config(file.path()).unwrap();

        assert_eq!(config.crawler.max_pages, None);
        assert_eq!(config.crawler.detail_concurrency, 8);
        assert_eq!(config.crawler.page_delay_ms, 1000);
        assert_eq!(config.crawler.request_timeout_ms, 30_000);
        assert_eq!(config.crawler.recycle_client_every, None);
        assert!(!config.crawler.dedupe_by_url);
        assert_eq!(config.schema.listing_item, "div.search-title-row");
        assert_eq!(config.schema.image_attribute, "data-original");
        assert!(!config.images.enabled);
        assert_eq!(config.output.format, OutputFormat::Csv);
    }

    #[test]
    fn test_load_full_config() {
        let config_content = r#"
[site]
base-url = "https://www.example.com"
listing-template = "https://www.example.com/parts/?page={page}"

[crawler]
max-pages = 3
detail-concurrency = 4
page-delay-ms = 250
request-timeout-ms = 5000
recycle-client-every = 10
dedupe-by-url = true

[user-agent]
value = "SumiHarvest/1.0"

[schema]
listing-item = "li.result"
price = "span.amount"

[images]
enabled = true
directory = "out/images"

[output]
path = "out/products.db"
format = "sqlite"
"#;

        let file = create_temp_config(config_content);
        let config = load_config(file.path()).unwrap();

        assert_eq!(config.crawler.max_pages, Some(3));
        assert_eq!(config.crawler.detail_concurrency, 4);
        assert_eq!(config.crawler.recycle_client_every, Some(10));
        assert!(config.crawler.dedupe_by_url);
        assert_eq!(config.schema.listing_item, "li.result");
        assert_eq!(config.schema.price, "span.amount");
        assert_eq!(config.schema.title, "h3");
        assert!(config.images.enabled);
        assert_eq!(config.images.directory, "out/images");
        assert_eq!(config.output.format, OutputFormat::Sqlite);
    }

    #[test]
    fn test_load_config_with_invalid_path() {
        let result = load_config(Path::new("/nonexistent/harvest.toml"));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn test_load_config_with_invalid_toml() {
        let file = create_temp_config("this is not valid TOML {{{");
        let result = load_config(file.path());
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_load_config_with_validation_error() {
        let content = MINIMAL_CONFIG.replace("[crawler]", "[crawler]\ndetail-concurrency = 0");
        let result = parse_config(&content);
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_unknown_output_format_is_rejected() {
        let content = MINIMAL_CONFIG.replace(
            "path = \"data/products.csv\"",
            "path = \"data/products.csv\"\nformat = \"parquet\"",
        );
        assert!(matches!(parse_config(&content), Err(ConfigError::Parse(_))));
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
