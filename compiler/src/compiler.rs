use crate::{
    deprecation::remove_deprecated,
    error::CompileError,
    glob::glob,
    parser::parse,
};
use mprot_schema::{Decl, ErrorList, File, Pos, Schema, SymbolTarget, Type};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::{debug, info};

/// Pattern used when no glob pattern is configured.
pub const DEFAULT_PATTERN: &str = "**/*.mprot";

/// What to compile and how.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Options {
    /// Directory the glob patterns are relative to.
    pub root_directory:  PathBuf,
    pub glob_patterns:   Vec<String>,
    /// Keep members tagged `deprecated` in the result.
    pub keep_deprecated: bool,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            root_directory:  PathBuf::from("."),
            glob_patterns:   Vec::new(),
            keep_deprecated: false,
        }
    }
}

impl Options {
    /// Fills in the defaults for an empty root directory or pattern list.
    pub fn sanitize(&mut self) {
        if self.root_directory.as_os_str().is_empty() {
            self.root_directory = PathBuf::from(".");
        }
        if self.glob_patterns.is_empty() {
            self.glob_patterns = vec![DEFAULT_PATTERN.to_string()];
        }
    }
}

/// Reads and parses one file. Failing to read it is fatal, everything wrong
/// inside it ends up in the returned list.
pub fn parse_file(path: &Path) -> Result<(File, ErrorList), CompileError> {
    let source = fs::read(path).map_err(|e| CompileError::io(path, e))?;
    let name = path.to_string_lossy();
    Ok(parse(&source, &name))
}

/// Parses every file under `root` matching `patterns`.
///
/// Files come back in path order. The error list covers all files, is sorted
/// by position and includes references to types a parsed import does not
/// declare. I/O and glob problems abort instead.
pub fn parse_files(root: &Path, patterns: &[String]) -> Result<(Schema, ErrorList), CompileError> {
    let root = root
        .canonicalize()
        .map_err(|e| CompileError::io(root, e))?;
    let paths = glob(&root, patterns)?;
    debug!(root = %root.display(), count = paths.len(), "matched schema files");

    let mut files = Vec::with_capacity(paths.len());
    let mut errs = ErrorList::new();
    for path in &paths {
        let (file, file_errs) = parse_file(path)?;
        debug!(file = %path.display(), errors = file_errs.len(), "parsed schema file");
        files.push(file);
        errs.append(file_errs);
    }

    let schema = Schema { root, files };
    check_imported_types(&schema, &mut errs);
    errs.sort();
    Ok((schema, errs))
}

/// Runs the whole pipeline: discovery, parsing, resolution, verification and,
/// unless `keep_deprecated` is set, removal of deprecated members.
pub fn compile(options: &Options) -> Result<Schema, CompileError> {
    let mut options = options.clone();
    options.sanitize();

    let (mut schema, errs) = parse_files(&options.root_directory, &options.glob_patterns)?;
    if !errs.is_empty() {
        info!(errors = errs.len(), "schema has errors");
        return Err(CompileError::Schema(errs));
    }

    if !options.keep_deprecated {
        remove_deprecated(&mut schema);
    }
    info!(files = schema.files.len(), "compiled schema");
    Ok(schema)
}

/// Reports references like `pkg.T` where the file behind `pkg` was parsed but
/// declares no type `T`. Imports of files outside the set are not checked.
fn check_imported_types(schema: &Schema, errs: &mut ErrorList) {
    for file in &schema.files {
        for decl in &file.decls {
            for (pos, ty) in member_types(decl) {
                ty.walk_defined(&mut |defined| {
                    let Some(SymbolTarget::Import(alias)) = file.symbols.target(defined.symbol) else {
                        return;
                    };
                    let Some(imported) = file.imports.get(alias).and_then(|i| schema.imported_file(i)) else {
                        return;
                    };
                    if imported.type_decl(&defined.name).is_none() {
                        errs.add(pos.clone(), format!("undefined type {}", defined));
                    }
                });
            }
        }
    }
}

fn member_types(decl: &Decl) -> Vec<(&Pos, &Type)> {
    match decl {
        Decl::Const(c) => vec![(&c.pos, &c.ty)],
        Decl::Enum(_) => Vec::new(),
        Decl::Struct(s) => s.fields.iter().map(|f| (&f.pos, &f.ty)).collect(),
        Decl::Union(u) => u.branches.iter().map(|b| (&b.pos, &b.ty)).collect(),
        Decl::Service(s) => s
            .methods
            .iter()
            .flat_map(|m| m.args.iter().chain(m.ret.as_ref()).map(move |ty| (&m.pos, ty)))
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize() {
        let mut options = Options {
            root_directory:  PathBuf::new(),
            glob_patterns:   vec![],
            keep_deprecated: true,
        };
        options.sanitize();
        assert_eq!(options.root_directory, PathBuf::from("."));
        assert_eq!(options.glob_patterns, vec![DEFAULT_PATTERN.to_string()]);
        assert!(options.keep_deprecated);

        let mut options = Options {
            root_directory:  PathBuf::from("schemas"),
            glob_patterns:   vec!["*.idl".into()],
            keep_deprecated: false,
        };
        let before = options.clone();
        options.sanitize();
        assert_eq!(options, before);
    }

    #[test]
    fn test_options_from_json() {
        let options: Options =
            serde_json::from_str(r#"{ "root_directory": "idl", "keep_deprecated": true }"#).unwrap();
        assert_eq!(options.root_directory, PathBuf::from("idl"));
        assert!(options.glob_patterns.is_empty());
        assert!(options.keep_deprecated);
    }
}
