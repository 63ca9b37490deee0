use std::fmt;
use std::fs;
use std::io;
use std::path;

use tracing::instrument;

use crate::model::space;

/// A file mapped copy-on-write into our address space. Scratch writes to the
/// mapping never reach the disk.
///
/// While this object lives, it holds an exclusive advisory lock on the file so
/// that other cooperating processes don't map it at the same time. The lock is
/// not a guard between threads of this process.
pub struct MappedFile {
    /* None for empty files, which can't be mapped */
    map: Option<memmap2::MmapMut>,
    /* dropped after the map; closing it releases the lock */
    _lock: fs::File,
    path: path::PathBuf,
}

impl MappedFile {
    #[instrument]
    pub fn open(path: &path::Path) -> Result<MappedFile, space::SpaceError> {
        let file = fs::File::open(path).map_err(|source| space::SpaceError::Open { path: path.to_path_buf(), source })?;

        match file.try_lock() {
            Ok(()) => {},
            Err(fs::TryLockError::WouldBlock) => return Err(space::SpaceError::Locked { path: path.to_path_buf() }),
            Err(fs::TryLockError::Error(source)) => return Err(space::SpaceError::Lock { path: path.to_path_buf(), source }),
        }

        let len = file.metadata().map_err(|source| space::SpaceError::Stat { path: path.to_path_buf(), source })?.len();
        let size = usize::try_from(len).map_err(|_| space::SpaceError::TooLarge { path: path.to_path_buf(), len })?;

        let map = if size == 0 {
            None
        } else {
            // SAFETY: the mapping is private, so nothing we do to it is seen by
            // anyone else, and other cooperating processes are locked out while
            // we hold it. A non-cooperating process truncating the file under
            // us can still fault; that is the usual caveat of mapping files.
            let map = unsafe { memmap2::MmapOptions::new().len(size).map_copy(&file) }
                .map_err(|source| space::SpaceError::Map { path: path.to_path_buf(), source })?;

            advise_random(&map).map_err(|source| space::SpaceError::Advise { path: path.to_path_buf(), source })?;
            Some(map)
        };

        tracing::debug!(size, "mapped file");

        Ok(MappedFile {
            map,
            _lock: file,
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &path::Path {
        &self.path
    }
}

#[cfg(unix)]
fn advise_random(map: &memmap2::MmapMut) -> io::Result<()> {
    map.advise(memmap2::Advice::Random)
}

#[cfg(not(unix))]
fn advise_random(_map: &memmap2::MmapMut) -> io::Result<()> {
    Ok(())
}

impl space::TextResource for MappedFile {
    fn data(&self) -> &[u8] {
        self.map.as_deref().unwrap_or(&[])
    }
}

impl fmt::Debug for MappedFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MappedFile")
            .field("path", &self.path)
            .field("size", &self.map.as_ref().map_or(0, |m| m.len()))
            .finish_non_exhaustive()
    }
}
