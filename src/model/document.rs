pub mod cursor;
pub mod history;
pub mod piece;

use std::path;
use std::sync;

use tracing::instrument;

use crate::config;
use crate::model::space;
use crate::model::space::TextResource;
use crate::model::utf8;
use crate::model::utf8::DecodeError;

/// An immutable document: a sequence of pieces read as one stream of code
/// points. Nothing is decoded until a cursor is placed, so invalid UTF-8 is
/// reported by the cursor that runs into it rather than here.
#[derive(Debug, Clone, Default)]
pub struct PieceTable {
    pieces: piece::PieceSequence,
}

#[derive(Debug, thiserror::Error)]
pub enum OpenError {
    #[error(transparent)]
    Space(#[from] space::SpaceError),
}

impl PieceTable {
    /// One piece spanning all of `resource`.
    pub fn new<R: TextResource + 'static>(resource: R) -> PieceTable {
        let resource: sync::Arc<dyn TextResource> = sync::Arc::new(resource);
        Self::from_pieces(std::iter::once(piece::Piece::whole(resource)))
    }

    /// Like [PieceTable::new], but the piece starts after a leading byte
    /// order mark.
    pub fn new_skipping_bom<R: TextResource + 'static>(resource: R) -> PieceTable {
        let bom = utf8::bom_length(resource.data());
        let resource: sync::Arc<dyn TextResource> = sync::Arc::new(resource);
        Self::from_pieces(std::iter::once(piece::Piece::from_offset(resource, bom)))
    }

    pub fn from_pieces<I: IntoIterator<Item = piece::Piece>>(pieces: I) -> PieceTable {
        let pieces: piece::PieceSequence = pieces.into_iter().collect();
        tracing::trace!(pieces = pieces.len(), bytes = pieces.byte_len(), "built piece table");
        PieceTable { pieces }
    }

    pub fn pieces(&self) -> &piece::PieceSequence {
        &self.pieces
    }

    pub fn byte_len(&self) -> usize {
        self.pieces.byte_len()
    }

    pub fn begin(&self) -> Result<cursor::Cursor<'_>, DecodeError> {
        cursor::Cursor::begin(self.pieces.as_slice())
    }

    pub fn end(&self) -> cursor::Cursor<'_> {
        cursor::Cursor::end(self.pieces.as_slice())
    }

    pub fn rbegin(&self) -> Result<cursor::ReverseCursor<'_>, DecodeError> {
        cursor::ReverseCursor::new(self.end())
    }

    pub fn rend(&self) -> Result<cursor::ReverseCursor<'_>, DecodeError> {
        cursor::ReverseCursor::new(self.begin()?)
    }

    pub fn code_points(&self) -> cursor::CodePoints<'_> {
        cursor::CodePoints::new(self.pieces.as_slice())
    }
}

impl<'a> IntoIterator for &'a PieceTable {
    type Item = Result<utf8::CodePoint, DecodeError>;
    type IntoIter = cursor::CodePoints<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.code_points()
    }
}

/// Opens the file at `path` as a document, using the global config to pick
/// how the file is brought into memory.
#[instrument]
pub fn open(path: &path::Path) -> Result<PieceTable, OpenError> {
    let config = config::get().clone();
    let space = space::Space::open(path, &config)?;

    tracing::debug!(mapped = space.is_mapped(), size = space.size(), "opened document");

    Ok(if config.skip_bom {
        PieceTable::new_skipping_bom(space)
    } else {
        PieceTable::new(space)
    })
}
