use crate::{
    decl::{Decl, DeclId, DeclKind, Import, Package},
    symbols::{SymbolTable, SymbolTarget},
    types::DefinedType,
};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// The parsed contents of one schema file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct File {
    pub name:    String,
    pub doc:     Vec<String>,
    pub package: Package,
    pub imports: BTreeMap<String, Import>,
    /// Declarations in source order.
    pub decls:   Vec<Decl>,
    pub symbols: SymbolTable,
}

/// The declaration a [`DefinedType`] refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target<'a> {
    Decl(&'a Decl),
    Import(&'a Import),
}

impl File {
    pub fn new(name: impl Into<String>) -> Self {
        File {
            name: name.into(),
            ..File::default()
        }
    }

    pub fn decl(&self, id: DeclId) -> Option<&Decl> {
        self.decls.get(id.0)
    }

    /// Looks up a type declaration (enum, struct, union or service) by name.
    pub fn type_decl(&self, name: &str) -> Option<&Decl> {
        self.decls.iter().find(|d| d.is_type() && d.name() == name)
    }

    pub fn target(&self, ty: &DefinedType) -> Option<Target<'_>> {
        match self.symbols.target(ty.symbol)? {
            SymbolTarget::Local(id) => self.decl(*id).map(Target::Decl),
            SymbolTarget::Import(name) => self.imports.get(name).map(Target::Import),
        }
    }

    /// Kind of the local declaration `ty` refers to. Imported and unresolved
    /// references have no kind at this level.
    pub fn defined_kind(&self, ty: &DefinedType) -> Option<DeclKind> {
        match self.target(ty)? {
            Target::Decl(decl) => Some(decl.kind()),
            Target::Import(_) => None,
        }
    }
}

/// A set of schema files, ordered by path.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Schema {
    /// Directory the files were discovered in; import paths are relative to it.
    pub root:  PathBuf,
    pub files: Vec<File>,
}

impl Schema {
    /// Returns the file an import of `file` points at, if that file is part of
    /// the schema.
    pub fn imported_file(&self, import: &Import) -> Option<&File> {
        let wanted = self.root.join(&import.path);
        self.files.iter().find(|f| Path::new(&f.name) == wanted)
    }

    /// Follows an imported reference into the declaring file.
    pub fn resolve_import<'a>(&'a self, file: &'a File, ty: &DefinedType) -> Option<&'a Decl> {
        match file.target(ty)? {
            Target::Decl(decl) => Some(decl),
            Target::Import(import) => self.imported_file(import)?.type_decl(&ty.name),
        }
    }
}
