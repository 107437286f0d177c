use directories::ProjectDirs;
use exn::ResultExt;
use figment::Figment;
use figment::providers::{Env, Format, Json, Serialized, Toml, Yaml};
use std::path::{Path, PathBuf};

use crate::error::{ErrorKind, Result};
use crate::models::Config;

pub const ENV_PREFIX: &str = "FOLIO_";
const FILE_STEM: &str = "folio";

/// The platform config directory (`~/.config/folio` on Linux), if the
/// platform has one.
pub fn config_dir() -> Option<PathBuf> {
    ProjectDirs::from("org", "folio", "folio").map(|dirs| dirs.config_dir().to_path_buf())
}

impl Config {
    /// Load every layer, with the platform config directory as the
    /// directory layer.
    pub fn load(file: Option<&Path>) -> Result<Self> {
        Self::load_from(config_dir().as_deref(), file)
    }

    /// Load every layer, reading the directory layer from `dir`.
    pub fn load_from(dir: Option<&Path>, file: Option<&Path>) -> Result<Self> {
        let config: Self = Self::figment(dir, file)?.extract().or_raise(|| ErrorKind::Load)?;
        config.validate()?;
        tracing::debug!(?config, "Loaded configuration");
        Ok(config)
    }

    /// The layered figment, before extraction.
    pub fn figment(dir: Option<&Path>, file: Option<&Path>) -> Result<Figment> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        if let Some(dir) = dir {
            figment = figment
                .merge(Toml::file(dir.join(format!("{FILE_STEM}.toml"))))
                .merge(Yaml::file(dir.join(format!("{FILE_STEM}.yaml"))))
                .merge(Json::file(dir.join(format!("{FILE_STEM}.json"))));
        }
        if let Some(file) = file {
            if !file.is_file() {
                exn::bail!(ErrorKind::NotFound(file.to_path_buf()));
            }
            figment = match file.extension().and_then(|ext| ext.to_str()) {
                Some("toml") => figment.merge(Toml::file(file)),
                Some("yaml" | "yml") => figment.merge(Yaml::file(file)),
                Some("json") => figment.merge(Json::file(file)),
                _ => exn::bail!(ErrorKind::UnsupportedFormat(file.to_path_buf())),
            };
        }
        Ok(figment.merge(Env::prefixed(ENV_PREFIX).split("__")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_without_files() {
        Jail::expect_with(|_jail| {
            let config = Config::load_from(None, None).unwrap();
            assert_eq!(config, Config::default());
            Ok(())
        });
    }

    #[test]
    fn test_layers_override_in_order() {
        Jail::expect_with(|jail| {
            let dir = jail.directory().to_path_buf();
            jail.create_file("folio.toml", "[api]\nbase_url = \"http://dir.example\"\nrequest_timeout_ms = 1000\n")?;
            jail.create_file("explicit.yaml", "api:\n  request_timeout_ms: 2000\ncache:\n  prefetch_spanning: false\n")?;
            jail.set_env("FOLIO_LOG__FILTER", "folio=debug");

            let config = Config::load_from(Some(&dir), Some(&dir.join("explicit.yaml"))).unwrap();
            assert_eq!(config.api.base_url, "http://dir.example");
            assert_eq!(config.api.request_timeout_ms, 2000);
            assert_eq!(config.api.connect_timeout_ms, 5_000);
            assert!(!config.cache.prefetch_spanning);
            assert_eq!(config.log.filter, "folio=debug");
            Ok(())
        });
    }

    #[test]
    fn test_env_overrides_file() {
        Jail::expect_with(|jail| {
            let dir = jail.directory().to_path_buf();
            jail.create_file("folio.json", r#"{"titles": {"path": "/srv/titles.json"}, "api": {"base_url": "http://a"}}"#)?;
            jail.set_env("FOLIO_API__BASE_URL", "https://b.example");

            let config = Config::load_from(Some(&dir), None).unwrap();
            assert_eq!(config.api.base_url, "https://b.example");
            assert_eq!(config.titles.path, Some(PathBuf::from("/srv/titles.json")));
            Ok(())
        });
    }

    #[test]
    fn test_missing_explicit_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nope.toml");
        let err = Config::figment(None, Some(&path)).unwrap_err();
        assert_eq!(*err, ErrorKind::NotFound(path));
    }

    #[test]
    fn test_unsupported_format() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("folio.ini");
        fs::write(&path, "[api]").unwrap();
        let err = Config::figment(None, Some(&path)).unwrap_err();
        assert_eq!(*err, ErrorKind::UnsupportedFormat(path));
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        Jail::expect_with(|jail| {
            jail.create_file("folio.toml", "[api]\nbase_url = \"example.org\"\n")?;
            let err = Config::load_from(None, Some(Path::new("folio.toml"))).unwrap_err();
            assert!(matches!(*err, ErrorKind::Invalid { field: "api.base_url", .. }));
            Ok(())
        });
    }

    #[test]
    fn test_wrong_type_is_a_load_error() {
        Jail::expect_with(|jail| {
            jail.create_file("folio.toml", "[api]\nconnect_timeout_ms = \"soon\"\n")?;
            let err = Config::load_from(None, Some(Path::new("folio.toml"))).unwrap_err();
            assert_eq!(*err, ErrorKind::Load);
            Ok(())
        });
    }
}
