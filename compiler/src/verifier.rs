use std::collections::{HashMap, HashSet};
use mprot_schema::{
    Decl, DeclKind, Enum, ErrorList, File, Pos, Service, Struct, Type, Union,
};

/// Checks the semantic rules of one resolved file and appends every violation
/// to `errs`. Each error points at the offending member.
pub fn verify_file(file: &File, errs: &mut ErrorList) {
    let mut consts: HashMap<&str, &Pos> = HashMap::new();

    for decl in &file.decls {
        match decl {
            Decl::Const(c) => {
                if let Some(prev) = consts.get(c.name.as_str()) {
                    errs.add(
                        c.pos.clone(),
                        format!("constant {} redeclared (see position {})", c.name, prev),
                    );
                } else {
                    consts.insert(&c.name, &c.pos);
                }
            }
            Decl::Enum(e) => verify_enum(e, errs),
            Decl::Struct(s) => verify_struct(file, s, errs),
            Decl::Union(u) => verify_union(file, u, errs),
            Decl::Service(s) => verify_service(file, s, errs),
        }
    }
}

fn verify_enum(e: &Enum, errs: &mut ErrorList) {
    let mut names = HashSet::new();
    for enumerator in &e.enumerators {
        if !names.insert(enumerator.name.as_str()) {
            errs.add(
                enumerator.pos.clone(),
                format!("duplicate enumerator {} in enum {}", enumerator.name, e.name),
            );
        }
    }
}

fn verify_struct(file: &File, s: &Struct, errs: &mut ErrorList) {
    let mut names = HashSet::new();
    let mut ordinals = HashSet::new();

    for field in &s.fields {
        let duplicate_name = !names.insert(field.name.as_str());
        let duplicate_ordinal = !ordinals.insert(field.ordinal) && field.ordinal != 0;

        if duplicate_name {
            errs.add(
                field.pos.clone(),
                format!("duplicate field {} in struct {}", field.name, s.name),
            );
        } else if duplicate_ordinal {
            errs.add(
                field.pos.clone(),
                format!(
                    "duplicate ordinal {} for field {} in struct {}",
                    field.ordinal, field.name, s.name
                ),
            );
        }

        if is_service(file, &field.ty) {
            errs.add(
                field.pos.clone(),
                format!("service field {} in struct {}", field.name, s.name),
            );
        }
    }
}

fn verify_union(file: &File, u: &Union, errs: &mut ErrorList) {
    if u.branches.is_empty() {
        errs.add(u.pos.clone(), format!("union {} does not contain a branch", u.name));
        return;
    }

    // int, float and enum branches share one numeric slot
    let mut has_numeric = false;
    let mut ids: HashSet<&str> = HashSet::new();
    let mut ordinals = HashSet::new();

    for branch in &u.branches {
        let id = branch.ty.type_id();
        let mut numeric = false;

        match &branch.ty {
            Type::Pointer { .. } => {
                errs.add(
                    branch.pos.clone(),
                    format!("pointer branch {} in union {}", branch.ty, u.name),
                );
            }
            Type::Int { .. } | Type::Float { .. } => numeric = true,
            Type::Raw => {
                errs.add(branch.pos.clone(), format!("raw branch in union {}", u.name));
            }
            Type::Defined(defined) => {
                if ids.contains(id) {
                    errs.add(
                        branch.pos.clone(),
                        format!("duplicate branch {} in union {}", defined, u.name),
                    );
                } else {
                    match file.defined_kind(defined) {
                        Some(DeclKind::Enum) => numeric = true,
                        Some(DeclKind::Union) => {
                            errs.add(
                                branch.pos.clone(),
                                format!("union branch {} in union {}", defined, u.name),
                            );
                            continue;
                        }
                        Some(DeclKind::Service) => {
                            errs.add(
                                branch.pos.clone(),
                                format!("service branch {} in union {}", defined, u.name),
                            );
                            continue;
                        }
                        _ => {}
                    }
                }
            }
            _ => {
                if ids.contains(id) {
                    errs.add(
                        branch.pos.clone(),
                        format!(
                            "duplicate branch {} in union {} (only one {} branch is allowed)",
                            branch.ty, u.name, id
                        ),
                    );
                }
            }
        }

        if numeric {
            if has_numeric {
                errs.add(
                    branch.pos.clone(),
                    format!("duplicate numeric branch {} in union {}", branch.ty, u.name),
                );
            }
            has_numeric = true;
        }

        if !ordinals.insert(branch.ordinal) && branch.ordinal != 0 {
            errs.add(
                branch.pos.clone(),
                format!(
                    "duplicate ordinal {} for branch {} in union {}",
                    branch.ordinal, branch.ty, u.name
                ),
            );
        }
        ids.insert(id);
    }
}

fn verify_service(file: &File, s: &Service, errs: &mut ErrorList) {
    let mut names = HashSet::new();
    let mut ordinals = HashSet::new();

    for method in &s.methods {
        let duplicate_name = !names.insert(method.name.as_str());
        let duplicate_ordinal = !ordinals.insert(method.ordinal) && method.ordinal != 0;

        if duplicate_name {
            errs.add(
                method.pos.clone(),
                format!("duplicate method {} in service {}", method.name, s.name),
            );
        } else if duplicate_ordinal {
            errs.add(
                method.pos.clone(),
                format!(
                    "duplicate ordinal {} for method {} in service {}",
                    method.ordinal, method.name, s.name
                ),
            );
        }

        if method.args.iter().any(|arg| is_service(file, arg)) {
            errs.add(
                method.pos.clone(),
                format!(
                    "argument in method {} of service {} must not be a service",
                    method.name, s.name
                ),
            );
        }
        if method.ret.as_ref().is_some_and(|ret| is_service(file, ret)) {
            errs.add(
                method.pos.clone(),
                format!(
                    "method {} of service {} must not return a service type",
                    method.name, s.name
                ),
            );
        }
    }
}

fn is_service(file: &File, ty: &Type) -> bool {
    match ty {
        Type::Defined(defined) => file.defined_kind(defined) == Some(DeclKind::Service),
        _ => false,
    }
}
