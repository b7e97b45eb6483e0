use mprot_schema::{ErrorList, File, Pos, SymbolId, SymbolTarget};

/// A placeholder symbol created for a type name that was used before any
/// declaration of it, with the position of that first use.
#[derive(Debug, Clone, PartialEq)]
pub struct Unresolved {
    pub symbol: SymbolId,
    pub pos:    Pos,
}

/// Binds the placeholders that are still open after parsing. Qualified names
/// whose package is an import of the file are bound to that import, every
/// other open name is reported as undefined.
pub fn resolve(file: &mut File, unresolved: &[Unresolved], errs: &mut ErrorList) {
    for u in unresolved {
        if file.symbols.target(u.symbol).is_some() {
            continue;
        }
        let Some(symbol) = file.symbols.get(u.symbol) else {
            continue;
        };
        let name = symbol.name.clone();

        match name.split_once('.') {
            Some((package, _)) if file.imports.contains_key(package) => {
                file.symbols
                    .set_target(u.symbol, SymbolTarget::Import(package.to_string()));
            }
            _ => errs.add(u.pos.clone(), format!("undefined type {}", name)),
        }
    }
}
