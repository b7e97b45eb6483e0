//! mprot-schema
//!
//! The declaration model produced by the mprot compiler front end and read by
//! code generators:
//!  1) positions and positioned error lists (`Pos`, `Error`, `ErrorList`),
//!  2) the closed set of value types (`Type`),
//!  3) declarations (`Const`, `Enum`, `Struct`, `Union`, `Service`) and their tags,
//!  4) files with their per-file symbol table, and the `Schema` holding them.

pub mod pos;
pub mod error;
pub mod types;
pub mod tags;
pub mod symbols;
pub mod decl;
pub mod file;

pub use decl::*;
pub use error::{Error, ErrorList};
pub use file::{File, Schema, Target};
pub use pos::Pos;
pub use symbols::{Symbol, SymbolId, SymbolTable, SymbolTarget};
pub use tags::Tags;
pub use types::{DefinedType, Type, BUILTIN_TYPES};
