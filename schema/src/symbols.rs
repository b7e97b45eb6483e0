use crate::decl::DeclId;
use serde::Serialize;
use std::collections::HashMap;

/// Index of a symbol in a file's [`SymbolTable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct SymbolId(pub usize);

/// What a type name refers to once it is known.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "target", rename_all = "snake_case")]
pub enum SymbolTarget {
    /// A declaration of the same file.
    Local(DeclId),
    /// The import with the given name. The declaration itself lives in the
    /// imported file.
    Import(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Symbol {
    /// The name as written, including a package qualifier.
    pub name:   String,
    /// `None` while the symbol is only a placeholder.
    pub target: Option<SymbolTarget>,
}

/// Per-file arena of type names.
///
/// A name used before its declaration gets a placeholder slot; declaring the
/// name later fills that slot in, so every reference handed out earlier sees
/// the declaration without being rewritten.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SymbolTable {
    symbols: Vec<Symbol>,
    #[serde(skip)]
    by_name: HashMap<String, SymbolId>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lookup(&self, name: &str) -> Option<SymbolId> {
        self.by_name.get(name).copied()
    }

    /// Adds a new symbol. The name must not be present yet.
    pub fn insert(&mut self, name: &str, target: Option<SymbolTarget>) -> SymbolId {
        let id = SymbolId(self.symbols.len());
        self.symbols.push(Symbol {
            name: name.to_string(),
            target,
        });
        self.by_name.insert(name.to_string(), id);
        id
    }

    pub fn get(&self, id: SymbolId) -> Option<&Symbol> {
        self.symbols.get(id.0)
    }

    pub fn target(&self, id: SymbolId) -> Option<&SymbolTarget> {
        self.get(id).and_then(|s| s.target.as_ref())
    }

    /// Fills in the slot of `id`. Unknown ids are ignored.
    pub fn set_target(&mut self, id: SymbolId, target: SymbolTarget) {
        if let Some(symbol) = self.symbols.get_mut(id.0) {
            symbol.target = Some(target);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholder_is_filled_in_place() {
        let mut table = SymbolTable::new();
        let id = table.insert("Point", None);
        assert_eq!(table.lookup("Point"), Some(id));
        assert!(table.target(id).is_none());

        table.set_target(id, SymbolTarget::Local(DeclId(3)));
        assert_eq!(table.target(id), Some(&SymbolTarget::Local(DeclId(3))));
        assert_eq!(table.get(id).map(|s| s.name.as_str()), Some("Point"));
    }
}
