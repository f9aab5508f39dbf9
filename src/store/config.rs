use config::{Config, ConfigError, Environment, File, FileFormat};
use serde::Deserialize;

const CONFIG_FILE: &str = "config/config.toml";
const ENV_PREFIX: &str = "CATTERY";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_name")]
    pub name: String,
    /// First identifier handed out by the shared sequence
    #[serde(default = "default_sequence_start")]
    pub sequence_start: i64,
    /// Log the SQL rendering of every executed criteria query
    #[serde(default)]
    pub show_sql: bool,
}

fn default_name() -> String {
    "cattery".to_string()
}

fn default_sequence_start() -> i64 {
    1
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            sequence_start: default_sequence_start(),
            show_sql: false,
        }
    }
}

impl DatabaseConfig {
    /// Load the database configuration from `config/config.toml`, falling back to env vars.
    ///
    /// Environment variables use the `CATTERY` prefix and `__` as separator, e.g.
    /// `CATTERY__DATABASE__SHOW_SQL=true`.
    pub fn load() -> Result<Self, ConfigError> {
        let builder = Config::builder()
            .add_source(File::with_name(CONFIG_FILE).required(false))
            .add_source(Environment::with_prefix(ENV_PREFIX).separator("__"));

        let settings = match builder.build() {
            Ok(cfg) => cfg,
            Err(err) => {
                // An unreadable file is not fatal; retry with the environment alone
                if std::path::Path::new(CONFIG_FILE).exists() {
                    tracing::warn!(
                        error = %err,
                        "failed to load config file, falling back to env"
                    );
                }
                Config::builder()
                    .add_source(Environment::with_prefix(ENV_PREFIX).separator("__"))
                    .build()
                    .map_err(|env_err| {
                        ConfigError::Message(format!(
                            "Failed to load configuration from file and env: {}, then env-only error: {}",
                            err, env_err
                        ))
                    })?
            }
        };

        Self::from_settings(&settings)
    }

    /// Parse a TOML document with a `[database]` table
    pub fn from_toml_str(toml: &str) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()?;
        Self::from_settings(&settings)
    }

    fn from_settings(settings: &Config) -> Result<Self, ConfigError> {
        match settings.get::<DatabaseConfig>("database") {
            Ok(config) => Ok(config),
            // No section at all means defaults
            Err(ConfigError::NotFound(_)) => Ok(Self::default()),
            Err(e) => Err(ConfigError::Message(format!(
                "Database configuration could not be loaded from file or environment: {}",
                e
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = DatabaseConfig::default();
        assert_eq!(config.name, "cattery");
        assert_eq!(config.sequence_start, 1);
        assert!(!config.show_sql);
    }

    #[test]
    fn test_from_toml_str() {
        let config = DatabaseConfig::from_toml_str(
            r#"
            [database]
            name = "shelter"
            sequence_start = 100
            show_sql = true
            "#,
        )
        .unwrap();
        assert_eq!(config.name, "shelter");
        assert_eq!(config.sequence_start, 100);
        assert!(config.show_sql);
    }

    #[test]
    fn test_partial_section_uses_defaults() {
        let config = DatabaseConfig::from_toml_str("[database]\nshow_sql = true\n").unwrap();
        assert_eq!(config.name, "cattery");
        assert_eq!(config.sequence_start, 1);
        assert!(config.show_sql);
    }

    #[test]
    fn test_missing_section_uses_defaults() {
        let config = DatabaseConfig::from_toml_str("[server]\nport = 8080\n").unwrap();
        assert_eq!(config, DatabaseConfig::default());
    }

    #[test]
    fn test_load_reads_environment_overrides() {
        std::env::set_var("CATTERY__DATABASE__SEQUENCE_START", "500");
        std::env::set_var("CATTERY__DATABASE__SHOW_SQL", "true");
        let loaded = DatabaseConfig::load();
        let em = crate::EntityManager::from_env();
        std::env::remove_var("CATTERY__DATABASE__SEQUENCE_START");
        std::env::remove_var("CATTERY__DATABASE__SHOW_SQL");

        let config = loaded.unwrap();
        assert_eq!(config.name, "cattery");
        assert_eq!(config.sequence_start, 500);
        assert!(config.show_sql);

        let em = em.unwrap();
        let cat = em.persist(crate::entity::Cat::new("Mugi", 3)).unwrap();
        assert_eq!(cat.id, Some(500));
    }

    #[test]
    fn test_invalid_value_is_an_error() {
        let err = DatabaseConfig::from_toml_str("[database]\nsequence_start = \"soon\"\n");
        assert!(err.is_err());
    }
}
