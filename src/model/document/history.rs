use crate::model::document::PieceTable;

/// Undo/redo stacks of document snapshots. The present document is the top
/// of `past`; undone snapshots wait in `future` until something new is pushed.
///
/// Snapshots are cheap: cloning a [PieceTable] only clones its piece list,
/// and the resources behind the pieces are shared.
#[derive(Debug, Default)]
pub struct History {
    past: Vec<PieceTable>,
    future: Vec<PieceTable>,
}

impl History {
    pub fn new() -> History {
        History::default()
    }

    /// The current document, or None before anything has been pushed (or
    /// after everything has been undone).
    pub fn present(&self) -> Option<&PieceTable> {
        self.past.last()
    }

    /// Moves the present document onto the redo stack. No-op with nothing to undo.
    pub fn undo(&mut self) {
        if let Some(document) = self.past.pop() {
            self.future.push(document);
        }
    }

    /// No-op with nothing to redo.
    pub fn redo(&mut self) {
        if let Some(document) = self.future.pop() {
            self.past.push(document);
        }
    }

    /// Makes `document` the present one and forgets everything that was undone.
    pub fn push(&mut self, document: PieceTable) {
        self.future.clear();
        self.past.push(document);
        tracing::trace!(past = self.past.len(), "pushed document");
    }

    pub fn can_undo(&self) -> bool {
        !self.past.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.future.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::model::utf8::DecodeError;

    fn text(document: Option<&PieceTable>) -> Option<String> {
        document.map(|d| {
            d.code_points()
                .map(|cp| cp.map(|cp| cp.to_char().unwrap()))
                .collect::<Result<String, DecodeError>>()
                .unwrap()
        })
    }

    #[test]
    fn empty_history() {
        let mut history = History::new();
        assert!(history.present().is_none());
        assert!(!history.can_undo());
        assert!(!history.can_redo());

        history.undo();
        history.redo();
        assert!(history.present().is_none());
    }

    #[test]
    fn undo_and_redo() {
        let mut history = History::new();
        history.push(PieceTable::new(b"one".to_vec()));
        history.push(PieceTable::new(b"two".to_vec()));
        assert_eq!(text(history.present()).as_deref(), Some("two"));

        history.undo();
        assert_eq!(text(history.present()).as_deref(), Some("one"));
        assert!(history.can_redo());

        history.undo();
        assert!(history.present().is_none());

        /* nothing left to undo */
        history.undo();
        assert!(history.present().is_none());

        history.redo();
        history.redo();
        assert_eq!(text(history.present()).as_deref(), Some("two"));

        /* nothing left to redo */
        history.redo();
        assert_eq!(text(history.present()).as_deref(), Some("two"));
        assert!(!history.can_redo());
    }

    #[test]
    fn push_clears_future() {
        let mut history = History::new();
        history.push(PieceTable::new(b"one".to_vec()));
        history.push(PieceTable::new(b"two".to_vec()));
        history.undo();
        assert!(history.can_redo());

        history.push(PieceTable::new(b"three".to_vec()));
        assert!(!history.can_redo());

        history.redo();
        assert_eq!(text(history.present()).as_deref(), Some("three"));

        history.undo();
        assert_eq!(text(history.present()).as_deref(), Some("one"));
    }

    #[test]
    fn snapshots_share_resources() {
        let table = PieceTable::new(b"shared".to_vec());
        let resource = table.pieces().as_slice()[0].resource().clone();

        let mut history = History::new();
        history.push(table.clone());
        history.push(table);
        assert_eq!(std::sync::Arc::strong_count(&resource), 3);
    }
}
