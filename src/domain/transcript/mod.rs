//! Transcript domain module

mod document;
mod token;

pub use document::Transcript;
pub use token::{TokenKind, WordToken};
