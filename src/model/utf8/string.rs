use std::collections::HashSet;
use std::fmt;
use std::hash;
use std::sync;

use lazy_static::lazy_static;
use once_cell::sync::OnceCell;

use crate::model::utf8;
use crate::model::utf8::iter;
use crate::model::utf8::CodePoint;
use crate::model::utf8::DecodeError;

lazy_static! {
    static ref INTERNED: parking_lot::Mutex<HashSet<sync::Arc<[u8]>>> = parking_lot::Mutex::new(HashSet::new());
    static ref EMPTY: sync::Arc<[u8]> = sync::Arc::from(&[][..]);
}

/// An immutable UTF-8 string. Strings with the same contents share one
/// interned allocation, so equality is a pointer comparison.
///
/// Construction does not validate; the contents are decoded lazily, so
/// iteration or the first call to [Utf8String::len] is where invalid UTF-8
/// shows up.
#[derive(Clone)]
pub struct Utf8String {
    bytes: sync::Arc<[u8]>,
    length: OnceCell<usize>,
}

impl Utf8String {
    /// A leading byte order mark is dropped.
    pub fn new(bytes: &[u8]) -> Utf8String {
        let bytes = &bytes[utf8::bom_length(bytes)..];

        if bytes.is_empty() {
            return Utf8String::default();
        }

        let mut table = INTERNED.lock();
        let bytes = match table.get(bytes) {
            Some(existing) => existing.clone(),
            None => {
                let fresh: sync::Arc<[u8]> = sync::Arc::from(bytes);
                table.insert(fresh.clone());
                fresh
            }
        };

        Utf8String {
            bytes,
            length: OnceCell::new(),
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// O(1), unlike [Utf8String::len].
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Number of code points. O(n) the first time, memoized afterwards.
    pub fn len(&self) -> Result<usize, DecodeError> {
        self.length.get_or_try_init(|| self.code_points().try_fold(0, |n, cp| cp.map(|_| n + 1))).copied()
    }

    pub fn code_points(&self) -> iter::CodePoints<'_> {
        iter::CodePoints::new(&self.bytes)
    }

    pub fn begin(&self) -> Result<iter::CodePointIter<'_>, DecodeError> {
        iter::CodePointIter::new(&self.bytes)
    }

    pub fn end(&self) -> iter::CodePointIter<'_> {
        iter::CodePointIter::end(&self.bytes)
    }

    pub fn rbegin(&self) -> Result<iter::ReverseCodePointIter<'_>, DecodeError> {
        iter::ReverseCodePointIter::new(self.end())
    }

    pub fn rend(&self) -> Result<iter::ReverseCodePointIter<'_>, DecodeError> {
        iter::ReverseCodePointIter::new(self.begin()?)
    }

    /// Random access by code point index. Each call is O(n); iterate instead
    /// where possible. Returns None past the end.
    pub fn at(&self, pos: usize) -> Result<Option<CodePoint>, DecodeError> {
        for (i, cp) in self.code_points().enumerate() {
            let cp = cp?;
            if i == pos {
                return Ok(Some(cp));
            }
        }
        Ok(None)
    }

    pub fn front(&self) -> Result<Option<CodePoint>, DecodeError> {
        self.code_points().next().transpose()
    }

    pub fn back(&self) -> Result<Option<CodePoint>, DecodeError> {
        self.code_points().next_back().transpose()
    }
}

impl Default for Utf8String {
    fn default() -> Utf8String {
        Utf8String {
            bytes: EMPTY.clone(),
            length: OnceCell::with_value(0),
        }
    }
}

impl Drop for Utf8String {
    fn drop(&mut self) {
        if self.bytes.is_empty() {
            return;
        }

        let mut table = INTERNED.lock();
        let bytes = std::mem::replace(&mut self.bytes, EMPTY.clone());

        /* the table holds one reference and we hold the other */
        if sync::Arc::strong_count(&bytes) == 2 {
            table.remove(&bytes);
        }
    }
}

impl From<&str> for Utf8String {
    fn from(s: &str) -> Utf8String {
        Utf8String::new(s.as_bytes())
    }
}

impl PartialEq for Utf8String {
    fn eq(&self, other: &Self) -> bool {
        sync::Arc::ptr_eq(&self.bytes, &other.bytes)
    }
}

impl Eq for Utf8String {
}

impl hash::Hash for Utf8String {
    fn hash<H: hash::Hasher>(&self, state: &mut H) {
        self.bytes.hash(state);
    }
}

impl fmt::Debug for Utf8String {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Utf8String({:?})", String::from_utf8_lossy(&self.bytes))
    }
}
