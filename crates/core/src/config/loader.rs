use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use std::path::{Path, PathBuf};

use super::{types::Config, ConfigError};

/// Environment variable naming the config file.
pub const CONFIG_PATH_ENV: &str = "SWARMSCRAPE_CONFIG";

const DEFAULT_CONFIG_PATH: &str = "config.toml";

/// Environment names used by older deployments, mapped onto config keys.
const LEGACY_ENV: &[(&str, &str)] = &[
    ("ORBITDB_API_SERVER", "store.endpoint"),
    ("ORBIT_DB_ADDR", "store.address"),
    ("LIBGEN_SCRAPER_COUNT", "worker.count"),
    ("LIBGEN_SCRAPER_ID", "worker.index"),
    ("MAX_STALE", "staleness.max_stale_secs"),
    ("TRACKERS_FILE", "inputs.trackers_file"),
    ("UPDATES_FILE", "inputs.updates_file"),
];

fn legacy_key(name: &str) -> Option<&'static str> {
    LEGACY_ENV
        .iter()
        .find(|(env, _)| env.eq_ignore_ascii_case(name))
        .map(|(_, key)| *key)
}

/// File (if any), then legacy env names, then `SWARMSCRAPE_` env.
fn figment(path: Option<&Path>) -> Figment {
    let mut figment = Figment::new();
    if let Some(path) = path {
        figment = figment.merge(Toml::file(path));
    }
    figment
        .merge(Env::raw().filter_map(|key| legacy_key(key.as_str()).map(Into::into)))
        .merge(
            Env::prefixed("SWARMSCRAPE_")
                .ignore(&["CONFIG", "LOG_JSON"])
                .split("__"),
        )
}

/// Load configuration from file with environment variable overrides
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::FileNotFound(path.display().to_string()));
    }

    figment(Some(path))
        .extract()
        .map_err(|e| ConfigError::ParseError(e.to_string()))
}

/// Load configuration from the file named by `SWARMSCRAPE_CONFIG` and the
/// environment.
///
/// An explicitly named file must exist. The default `config.toml` is
/// optional, so a deployment may configure everything through env.
pub fn load_config_from_env() -> Result<Config, ConfigError> {
    match std::env::var_os(CONFIG_PATH_ENV) {
        Some(path) => load_config(&PathBuf::from(path)),
        None => {
            let default = Path::new(DEFAULT_CONFIG_PATH);
            figment(default.exists().then_some(default))
                .extract()
                .map_err(|e| ConfigError::ParseError(e.to_string()))
        }
    }
}

/// Load configuration from TOML string (useful for testing)
pub fn load_config_from_str(toml_str: &str) -> Result<Config, ConfigError> {
    toml::from_str(toml_str).map_err(|e| ConfigError::ParseError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const VALID: &str = r#"
[store]
endpoint = "http://localhost:3000"
address = "torrents"

[worker]
count = 1
index = 1

[staleness]
max_stale_secs = 86400
"#;

    #[test]
    fn test_load_config_from_str_valid() {
        let config = load_config_from_str(VALID).unwrap();
        assert_eq!(config.store.address, "torrents");
        assert_eq!(config.staleness.max_stale_secs, 86400);
    }

    #[test]
    fn test_load_config_from_str_missing_worker() {
        let toml = r#"
[store]
endpoint = "http://localhost:3000"
address = "torrents"

[staleness]
max_stale_secs = 60
"#;
        let result = load_config_from_str(toml);
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn test_load_config_file_not_found() {
        let result = load_config(Path::new("/nonexistent/config.toml"));
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound(_)));
    }

    #[test]
    fn test_load_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(
            temp_file,
            "{}\n[server]\nhost = \"127.0.0.1\"\nport = 3001\n",
            VALID
        )
        .unwrap();

        let config = load_config(temp_file.path()).unwrap();
        assert_eq!(config.server.port, 3001);
        assert_eq!(config.server.host.to_string(), "127.0.0.1");
        assert_eq!(config.worker.count, 1);
    }

    #[test]
    fn test_legacy_env_names() {
        assert_eq!(legacy_key("ORBITDB_API_SERVER"), Some("store.endpoint"));
        assert_eq!(legacy_key("orbit_db_addr"), Some("store.address"));
        assert_eq!(legacy_key("LIBGEN_SCRAPER_ID"), Some("worker.index"));
        assert_eq!(legacy_key("MAX_STALE"), Some("staleness.max_stale_secs"));
        assert_eq!(legacy_key("PATH"), None);
    }

    #[test]
    fn test_legacy_env_names_populate_config() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("ORBITDB_API_SERVER", "http://store.internal:3000");
            jail.set_env("ORBIT_DB_ADDR", "/orbitdb/zdpuTest/records");
            jail.set_env("LIBGEN_SCRAPER_COUNT", "3");
            jail.set_env("LIBGEN_SCRAPER_ID", "2");
            jail.set_env("MAX_STALE", "3600");
            jail.set_env("TRACKERS_FILE", "/tmp/trackers.json");
            jail.set_env("UPDATES_FILE", "/tmp/updates.json");

            let config = load_config_from_env().unwrap();

            assert_eq!(config.store.endpoint, "http://store.internal:3000");
            assert_eq!(config.store.address, "/orbitdb/zdpuTest/records");
            assert_eq!(config.worker.count, 3);
            assert_eq!(config.worker.index, 2);
            assert_eq!(config.staleness.max_stale_secs, 3600);
            assert_eq!(
                config.inputs.trackers_file.as_deref(),
                Some(Path::new("/tmp/trackers.json"))
            );
            assert_eq!(
                config.inputs.updates_file.as_deref(),
                Some(Path::new("/tmp/updates.json"))
            );
            Ok(())
        });
    }

    #[test]
    fn test_env_precedence_over_file() {
        figment::Jail::expect_with(|jail| {
            jail.create_file("config.toml", VALID)?;
            jail.set_env("MAX_STALE", "120");
            jail.set_env("LIBGEN_SCRAPER_COUNT", "4");
            jail.set_env("SWARMSCRAPE_WORKER__COUNT", "5");
            jail.set_env("SWARMSCRAPE_SERVER__PORT", "9191");

            let config = load_config_from_env().unwrap();

            // File value
            assert_eq!(config.store.address, "torrents");
            // Legacy name over file
            assert_eq!(config.staleness.max_stale_secs, 120);
            // Prefixed name over legacy name
            assert_eq!(config.worker.count, 5);
            assert_eq!(config.server.port, 9191);
            Ok(())
        });
    }
}
