//! mprot-compiler
//!
//! This crate implements:
//!  1) A tokenizer with automatic semicolon insertion for `.mprot` IDL files,
//!  2) A recursive-descent parser that keeps going after errors,
//!  3) Type resolution (local declarations, forward references, imports),
//!  4) A verifier for the structural rules of structs, enums, unions and services,
//!  5) File discovery by glob pattern and assembly into a [`Schema`](mprot_schema::Schema),
//!  6) Removal of members tagged `deprecated`.

pub mod error;
pub mod utils;
pub mod tokenizer;
pub mod parser;
pub mod resolver;
pub mod verifier;
pub mod glob;
pub mod deprecation;
pub mod compiler;

pub use compiler::{compile, parse_file, parse_files, Options, DEFAULT_PATTERN};
pub use deprecation::{remove_deprecated, remove_deprecated_members};
pub use error::{CompileError, LexError};
pub use parser::parse;
