use std::fmt;
use std::fs;
use std::io::Read;
use std::path;

use tracing::instrument;

use crate::model::space;

/// A file read completely into memory when it was opened.
pub struct LoadedFile {
    contents: Vec<u8>,
    path: path::PathBuf,
}

impl LoadedFile {
    #[instrument]
    pub fn open(path: &path::Path) -> Result<LoadedFile, space::SpaceError> {
        let file = fs::File::open(path).map_err(|source| space::SpaceError::Open { path: path.to_path_buf(), source })?;

        let expected = file.metadata().map_err(|source| space::SpaceError::Stat { path: path.to_path_buf(), source })?.len();
        let capacity = usize::try_from(expected).map_err(|_| space::SpaceError::TooLarge { path: path.to_path_buf(), len: expected })?;

        let mut contents = Vec::with_capacity(capacity);
        let read = file.take(expected).read_to_end(&mut contents)
            .map_err(|source| space::SpaceError::Read { path: path.to_path_buf(), source })? as u64;

        if read != expected {
            return Err(space::SpaceError::ShortRead { path: path.to_path_buf(), expected, read });
        }

        tracing::debug!(size = read, "loaded file");

        Ok(LoadedFile {
            contents,
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &path::Path {
        &self.path
    }
}

impl space::TextResource for LoadedFile {
    fn data(&self) -> &[u8] {
        &self.contents
    }
}

impl fmt::Debug for LoadedFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadedFile")
            .field("path", &self.path)
            .field("size", &self.contents.len())
            .finish()
    }
}
