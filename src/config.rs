use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

fn default_rate_limit_ms() -> u64 {
    150
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub database: PathBuf,
    pub sources: SourcesConfig,
    /// minimum delay between calls to the same upstream host
    #[serde(default = "default_rate_limit_ms")]
    pub rate_limit_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourcesConfig {
    /// raw-file source, one JSON array per chapter, Spanish filenames
    pub github_base_url: String,
    /// REST API source, 3-letter book codes
    pub api_base_url: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: PathBuf::from("./database/scriptura.db"),
            sources: SourcesConfig {
                github_base_url:
                    "https://raw.githubusercontent.com/biblia-es/rv1960/main".to_string(),
                api_base_url: "https://api.biblia-abierta.dev/v1".to_string(),
            },
            rate_limit_ms: default_rate_limit_ms(),
        }
    }
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Config = toml::from_str(&content)?;
        // env wins over file, so deployments can point at another database
        let _ = dotenvy::dotenv();
        if let Ok(db) = dotenvy::var("SCRIPTURA_DATABASE") {
            config.database = PathBuf::from(db);
        }
        Ok(config)
    }

    /// config file missing is not an error, defaults apply
    pub fn load_or_default(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        if path.as_ref().exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_config() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
database = "/tmp/test.db"
rate_limit_ms = 200

[sources]
github_base_url = "https://example.com/raw"
api_base_url = "https://example.com/api"
"#
        )
        .unwrap();
        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.rate_limit_ms, 200);
        assert_eq!(config.sources.api_base_url, "https://example.com/api");
    }

    #[test]
    fn test_default_rate_limit() {
        let config = Config::default();
        assert_eq!(config.rate_limit_ms, 150);
    }
}
