use mprot_schema::{Decl, File, Schema};
use std::collections::HashSet;
use tracing::debug;

/// Drops every member tagged `deprecated` from all files of the schema.
pub fn remove_deprecated(schema: &mut Schema) {
    for file in &mut schema.files {
        remove_deprecated_members(file);
    }
}

/// Drops deprecated enumerators, fields, branches and methods, then the
/// imports nothing refers to anymore. Declarations themselves stay.
pub fn remove_deprecated_members(file: &mut File) {
    let mut removed = 0;
    for decl in &mut file.decls {
        match decl {
            Decl::Const(_) => {}
            Decl::Enum(e) => removed += retain(&mut e.enumerators, |m| !m.tags.deprecated()),
            Decl::Struct(s) => removed += retain(&mut s.fields, |m| !m.tags.deprecated()),
            Decl::Union(u) => removed += retain(&mut u.branches, |m| !m.tags.deprecated()),
            Decl::Service(s) => removed += retain(&mut s.methods, |m| !m.tags.deprecated()),
        }
    }

    let used = referenced_packages(file);
    let imports = file.imports.len();
    file.imports.retain(|name, _| used.contains(name));

    if removed > 0 || imports != file.imports.len() {
        debug!(
            file = %file.name,
            members = removed,
            imports = imports - file.imports.len(),
            "removed deprecated members"
        );
    }
}

fn retain<T>(members: &mut Vec<T>, keep: impl FnMut(&T) -> bool) -> usize {
    let before = members.len();
    members.retain(keep);
    before - members.len()
}

fn referenced_packages(file: &File) -> HashSet<String> {
    let mut used = HashSet::new();
    for decl in &file.decls {
        decl.walk_types(&mut |ty| {
            ty.walk_defined(&mut |defined| {
                if let Some(package) = &defined.package {
                    used.insert(package.clone());
                }
            })
        });
    }
    used
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    const INPUT: &str = "package p
import \"ext.mprot\"
import \"keep.mprot\"

enum E {
	A \"1\"
	B \"2 deprecated\"
}

struct S {
	X ext.T  \"1 deprecated\"
	Y keep.T \"2\"
}

union U {
	string \"1\"
	bool   \"2 deprecated\"
}

service Svc {
	Old() \"1 deprecated\"
	New() \"2\"
}
";

    #[test]
    fn test_remove_deprecated_members() {
        let (mut file, errs) = parse(INPUT.as_bytes(), "p.mprot");
        assert!(errs.is_empty(), "{}", errs);

        remove_deprecated_members(&mut file);

        let Decl::Enum(e) = &file.decls[0] else { panic!("expected enum") };
        assert_eq!(e.enumerators.iter().map(|m| m.name.as_str()).collect::<Vec<_>>(), vec!["A"]);
        let Decl::Struct(s) = &file.decls[1] else { panic!("expected struct") };
        assert_eq!(s.fields.iter().map(|m| m.name.as_str()).collect::<Vec<_>>(), vec!["Y"]);
        let Decl::Union(u) = &file.decls[2] else { panic!("expected union") };
        assert_eq!(u.branches.len(), 1);
        let Decl::Service(svc) = &file.decls[3] else { panic!("expected service") };
        assert_eq!(svc.methods.iter().map(|m| m.name.as_str()).collect::<Vec<_>>(), vec!["New"]);

        assert_eq!(file.imports.keys().collect::<Vec<_>>(), vec!["keep"]);
    }

    #[test]
    fn test_remove_deprecated_is_idempotent() {
        let (mut file, _) = parse(INPUT.as_bytes(), "p.mprot");
        remove_deprecated_members(&mut file);
        let once = file.clone();
        remove_deprecated_members(&mut file);
        assert_eq!(file, once);
    }
}
