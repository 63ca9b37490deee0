pub mod document;
pub mod space;
pub mod utf8;
