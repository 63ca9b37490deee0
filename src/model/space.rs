use std::fs;
use std::io;
use std::path;

use enum_dispatch::enum_dispatch;
use tracing::instrument;

use crate::config;

pub mod file;
pub mod memory;

/// Anything that can back a piece: an immutable run of bytes.
#[enum_dispatch]
pub trait TextResource: Send + Sync {
    /// Empty when the resource is empty; never dangling.
    fn data(&self) -> &[u8];

    fn size(&self) -> usize {
        self.data().len()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SpaceError {
    #[error("could not open {}: {source}", .path.display())]
    Open { path: path::PathBuf, source: io::Error },

    #[error("could not stat {}: {source}", .path.display())]
    Stat { path: path::PathBuf, source: io::Error },

    #[error("{} is locked by another process", .path.display())]
    Locked { path: path::PathBuf },

    #[error("could not lock {}: {source}", .path.display())]
    Lock { path: path::PathBuf, source: io::Error },

    #[error("could not map {}: {source}", .path.display())]
    Map { path: path::PathBuf, source: io::Error },

    #[error("could not advise access pattern for {}: {source}", .path.display())]
    Advise { path: path::PathBuf, source: io::Error },

    #[error("could not read {}: {source}", .path.display())]
    Read { path: path::PathBuf, source: io::Error },

    #[error("read {read} of {expected} bytes from {}", .path.display())]
    ShortRead { path: path::PathBuf, expected: u64, read: u64 },

    #[error("{} is too large to address ({len} bytes)", .path.display())]
    TooLarge { path: path::PathBuf, len: u64 },
}

impl SpaceError {
    pub fn path(&self) -> &path::Path {
        match self {
            SpaceError::Open { path, .. } => path,
            SpaceError::Stat { path, .. } => path,
            SpaceError::Locked { path } => path,
            SpaceError::Lock { path, .. } => path,
            SpaceError::Map { path, .. } => path,
            SpaceError::Advise { path, .. } => path,
            SpaceError::Read { path, .. } => path,
            SpaceError::ShortRead { path, .. } => path,
            SpaceError::TooLarge { path, .. } => path,
        }
    }
}

/// A file opened as document storage, either mapped or read into memory.
#[enum_dispatch(TextResource)]
#[derive(Debug)]
pub enum Space {
    Mapped(file::MappedFile),
    Loaded(memory::LoadedFile),
}

impl Space {
    /// Opens `path` with whichever variant `config` asks for.
    #[instrument(skip(config))]
    pub fn open(path: &path::Path, config: &config::Config) -> Result<Space, SpaceError> {
        let mapped = match config.source {
            config::SourceKind::Mapped => true,
            config::SourceKind::InMemory => false,
            config::SourceKind::Auto => {
                let meta = fs::metadata(path).map_err(|source| SpaceError::Stat { path: path.to_path_buf(), source })?;
                meta.len() >= config.mmap_threshold
            },
        };

        Ok(if mapped {
            Space::Mapped(file::MappedFile::open(path)?)
        } else {
            Space::Loaded(memory::LoadedFile::open(path)?)
        })
    }

    pub fn path(&self) -> &path::Path {
        match self {
            Space::Mapped(f) => f.path(),
            Space::Loaded(f) => f.path(),
        }
    }

    pub fn is_mapped(&self) -> bool {
        matches!(self, Space::Mapped(_))
    }
}

impl TextResource for Vec<u8> {
    fn data(&self) -> &[u8] {
        self
    }
}

impl TextResource for Box<[u8]> {
    fn data(&self) -> &[u8] {
        self
    }
}

impl TextResource for &'static [u8] {
    fn data(&self) -> &[u8] {
        self
    }
}
