use std::fs;
use std::io;
use std::path;

use lazy_static::lazy_static;
use serde_derive::Deserialize;
use serde_derive::Serialize;
use tracing::instrument;

pub const APPLICATION: &str = "tessera";
pub const FILE_NAME: &str = "core.toml";

/// How a document's file gets into memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SourceKind {
    /// Map files at least `mmap_threshold` bytes long, read the rest.
    #[default]
    Auto,
    Mapped,
    InMemory,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub source: SourceKind,
    pub mmap_threshold: u64, /* bytes */
    pub skip_bom: bool,
}

impl Default for Config {
    fn default() -> Config {
        Config {
            source: SourceKind::Auto,
            mmap_threshold: 10 * 1024 * 1024,
            skip_bom: true,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not read config file {}: {source}", .path.display())]
    Read { path: path::PathBuf, source: io::Error },

    #[error("could not parse config file {}: {source}", .path.display())]
    Parse { path: path::PathBuf, source: toml::de::Error },
}

lazy_static! {
    static ref INSTANCE: parking_lot::RwLock<Config> = parking_lot::RwLock::new(Config::default());
}

pub fn get() -> parking_lot::RwLockReadGuard<'static, Config> {
    INSTANCE.read()
}

pub fn set() -> parking_lot::RwLockWriteGuard<'static, Config> {
    INSTANCE.write()
}

/// Where the user's config file lives, if they have one.
pub fn default_path() -> Option<path::PathBuf> {
    match xdg::BaseDirectories::with_prefix(APPLICATION) {
        Ok(dirs) => dirs.find_config_file(FILE_NAME),
        Err(e) => {
            tracing::warn!(error = %e, "could not locate XDG base directories");
            None
        },
    }
}

impl Config {
    pub fn parse(text: &str, path: &path::Path) -> Result<Config, ConfigError> {
        toml::from_str(text).map_err(|source| ConfigError::Parse { path: path.to_path_buf(), source })
    }

    pub fn read(path: &path::Path) -> Result<Config, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read { path: path.to_path_buf(), source })?;
        Config::parse(&text, path)
    }
}

/// Loads the config file at `path`, or the user's default one if `path` is
/// None, and installs it as the global config. Having no default file is not
/// an error; the defaults stay in place.
#[instrument]
pub fn load(path: Option<&path::Path>) -> Result<(), ConfigError> {
    let config = match path.map(path::Path::to_path_buf).or_else(default_path) {
        Some(path) => {
            let config = Config::read(&path)?;
            tracing::info!(path = %path.display(), ?config, "loaded config");
            config
        },
        None => {
            tracing::debug!("no config file, using defaults");
            Config::default()
        },
    };

    *set() = config;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::io::Write;

    use assert_matches::assert_matches;
    use pretty_assertions::assert_eq;
    use rusty_fork::rusty_fork_test;

    fn parse(text: &str) -> Result<Config, ConfigError> {
        Config::parse(text, path::Path::new("test.toml"))
    }

    #[test]
    fn empty_file_is_defaults() {
        assert_eq!(parse("").unwrap(), Config::default());
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let config = parse("source = \"in-memory\"\n").unwrap();
        assert_eq!(config.source, SourceKind::InMemory);
        assert_eq!(config.mmap_threshold, Config::default().mmap_threshold);
        assert!(config.skip_bom);
    }

    #[test]
    fn every_field() {
        let config = parse("source = \"mapped\"\nmmap_threshold = 4096\nskip_bom = false\n").unwrap();
        assert_eq!(config, Config {
            source: SourceKind::Mapped,
            mmap_threshold: 4096,
            skip_bom: false,
        });
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert_matches!(parse("mmap_treshold = 1\n"), Err(ConfigError::Parse { .. }));
        assert_matches!(parse("source = \"network\"\n"), Err(ConfigError::Parse { .. }));
    }

    #[test]
    fn round_trips_through_toml() {
        let config = Config {
            source: SourceKind::InMemory,
            mmap_threshold: 1,
            skip_bom: false,
        };
        let text = toml::to_string(&config).unwrap();
        assert!(text.contains("in-memory"));
        assert_eq!(parse(&text).unwrap(), config);
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert_matches!(load(Some(&dir.path().join("absent.toml"))), Err(ConfigError::Read { .. }));
    }

    rusty_fork_test! {
        #[test]
        fn load_installs_config() {
            let mut file = tempfile::NamedTempFile::new().unwrap();
            file.write_all(b"source = \"mapped\"\nskip_bom = false\n").unwrap();
            file.flush().unwrap();

            load(Some(file.path())).unwrap();
            assert_eq!(get().source, SourceKind::Mapped);
            assert!(!get().skip_bom);
        }

        #[test]
        fn bad_file_leaves_config_alone() {
            set().mmap_threshold = 7;

            let mut file = tempfile::NamedTempFile::new().unwrap();
            file.write_all(b"skip_bom = \"sometimes\"\n").unwrap();
            file.flush().unwrap();

            assert_matches!(load(Some(file.path())), Err(ConfigError::Parse { .. }));
            assert_eq!(get().mmap_threshold, 7);
        }
    }
}
