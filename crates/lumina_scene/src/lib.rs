//! Lumina scene - the scene-description language.
//!
//! This crate turns a scene text file into a renderable [`Scene`]:
//!
//! - **Lexer**: a character stream with source locations (file, line,
//!   column), producing keyword / identifier / literal / symbol tokens
//!   with one-token pushback
//! - **Parser**: recursive descent over the statement grammar
//!   (`float`, `material`, `sphere`, `plane`, `pointLight`, `camera`),
//!   with named materials, float variables and caller overrides
//!
//! Every error carries the source location it was raised at.

pub mod lexer;
pub mod parser;

pub use lexer::{
    FileRegistry, GrammarError, InputStream, Keyword, SourceLocation, Token, TokenKind,
};
pub use parser::{Scene, SceneError};
