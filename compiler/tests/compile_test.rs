#![cfg(test)]

use mprot_compiler::{compile, parse, parse_files, CompileError, Options};
use mprot_schema::{Decl, DeclKind, Schema, Target, Type};
use std::{fs, path::Path};

fn write(root: &Path, rel: &str, text: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, text).unwrap();
}

fn errors(input: &str) -> Vec<String> {
    let (_, errs) = parse(input.as_bytes(), "test.mprot");
    errs.iter().map(|e| e.text.clone()).collect()
}

fn options(root: &Path) -> Options {
    Options {
        root_directory: root.to_path_buf(),
        ..Options::default()
    }
}

#[test]
fn test_struct_duplicate_ordinal() {
    let input = "package p\nstruct S {\n\tA int32 \"1\"\n\tB string \"1\"\n}\n";
    let (_, errs) = parse(input.as_bytes(), "test.mprot");
    assert_eq!(errs.texts(), vec!["duplicate ordinal 1 for field B in struct S"]);
    assert_eq!(errs.iter().next().unwrap().pos.line, 4);
}

#[test]
fn test_enum_duplicate_enumerator() {
    assert_eq!(
        errors("package p\nenum E { X \"1\" X \"2\" }\n"),
        vec!["duplicate enumerator X in enum E"]
    );
    // equal values are fine
    assert!(errors("package p\nenum E { X \"1\" Y \"1\" }\n").is_empty());
}

#[test]
fn test_union_numeric_family() {
    assert_eq!(
        errors("package p\nunion U { int32 \"1\" float64 \"2\" }\n"),
        vec!["duplicate numeric branch float64 in union U"]
    );
}

#[test]
fn test_union_array_branches() {
    let input = "package p\nstruct A {}\nstruct B {}\nunion U {\n\t[]A \"1\"\n\t[]B \"2\"\n}\n";
    let (_, errs) = parse(input.as_bytes(), "test.mprot");
    assert_eq!(
        errs.texts(),
        vec!["duplicate branch []B in union U (only one array branch is allowed)"]
    );
    assert_eq!(errs.iter().next().unwrap().pos.line, 6);
}

#[test]
fn test_zero_ordinals_never_collide() {
    let input = "package p\nstruct S {\n\tA int \"x\"\n\tB int \"y\"\n\tC int \"z\"\n}\n";
    let (file, errs) = parse(input.as_bytes(), "test.mprot");
    assert_eq!(
        errs.texts(),
        vec!["invalid ordinal \"x\"", "invalid ordinal \"y\"", "invalid ordinal \"z\""]
    );

    let Decl::Struct(s) = &file.decls[0] else { panic!("expected struct") };
    assert!(s.fields.iter().all(|f| f.ordinal == 0));
    assert_eq!(s.fields.len(), 3);
}

#[test]
fn test_undefined_type_keeps_model() {
    let (file, errs) = parse(b"package p\nstruct S {\n\tA Nope \"1\"\n}\n", "test.mprot");
    assert_eq!(errs.texts(), vec!["undefined type Nope"]);
    assert_eq!(file.package.name, "p");
    assert_eq!(file.decls.len(), 1);
}

#[test]
fn test_compile_schema_directory() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    write(
        root,
        "shapes/geometry.mprot",
        "package geometry\n\nstruct Point {\n\tX float64 \"1\"\n\tY float64 \"2\"\n}\n",
    );
    write(
        root,
        "scene.mprot",
        "// Scene description.
package scene

import \"shapes/geometry.mprot\"

enum Color {
	Red   \"1\"
	Green \"2\"
	Blue  \"3 deprecated\"
}

struct Node {
	Name     string               \"1\"
	Origin   geometry.Point       \"2\"
	Children []Node               \"3\"
	Props    map[string]string    \"4\"
	Legacy   int32                \"5 deprecated\"
	Color    Color                \"6\"
}

union Value {
	Node   \"1\"
	string \"2\"
	Color  \"3\"
}

service Renderer {
	Render(Node) bytes \"1\"
	Flush() \"2\"
}
",
    );
    write(root, "notes.txt", "not a schema");

    let schema = compile(&options(root)).unwrap();
    let names: Vec<String> = schema
        .files
        .iter()
        .map(|f| {
            Path::new(&f.name)
                .strip_prefix(&schema.root)
                .unwrap()
                .to_string_lossy()
                .replace('\\', "/")
        })
        .collect();
    assert_eq!(names, vec!["scene.mprot", "shapes/geometry.mprot"]);

    let scene = &schema.files[0];
    assert_eq!(scene.doc, vec!["Scene description."]);
    let kinds: Vec<DeclKind> = scene.decls.iter().map(Decl::kind).collect();
    assert_eq!(
        kinds,
        vec![DeclKind::Enum, DeclKind::Struct, DeclKind::Union, DeclKind::Service]
    );

    // deprecated members are gone
    let Decl::Enum(color) = &scene.decls[0] else { panic!("expected enum") };
    assert_eq!(color.enumerators.len(), 2);
    let Decl::Struct(node) = &scene.decls[1] else { panic!("expected struct") };
    assert!(node.fields.iter().all(|f| f.name != "Legacy"));

    // the imported type resolves across files
    let Type::Defined(origin) = &node.fields[1].ty else { panic!("expected defined type") };
    assert!(matches!(scene.target(origin), Some(Target::Import(_))));
    let point = schema.resolve_import(scene, origin).unwrap();
    assert_eq!(point.kind(), DeclKind::Struct);
    assert_eq!(point.name(), "Point");
}

#[test]
fn test_keep_deprecated() {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "a.mprot",
        "package a\nstruct S {\n\tOld int \"1 deprecated\"\n\tNew int \"2\"\n}\n",
    );

    let mut opts = options(dir.path());
    opts.keep_deprecated = true;
    let schema = compile(&opts).unwrap();
    let Decl::Struct(s) = &schema.files[0].decls[0] else { panic!("expected struct") };
    assert_eq!(s.fields.len(), 2);

    opts.keep_deprecated = false;
    let schema = compile(&opts).unwrap();
    let Decl::Struct(s) = &schema.files[0].decls[0] else { panic!("expected struct") };
    assert_eq!(s.fields.len(), 1);
}

#[test]
fn test_missing_imported_type() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "ext.mprot", "package ext\nstruct T {}\n");
    write(
        dir.path(),
        "main.mprot",
        "package main\nimport \"ext.mprot\"\nstruct S {\n\tA ext.T \"1\"\n\tB ext.Missing \"2\"\n}\n",
    );

    let (schema, errs) = parse_files(dir.path(), &["*.mprot".to_string()]).unwrap();
    assert_eq!(schema.files.len(), 2);
    assert_eq!(errs.texts(), vec!["undefined type ext.Missing"]);
    assert_eq!(errs.iter().next().unwrap().pos.line, 5);

    match compile(&options(dir.path())) {
        Err(CompileError::Schema(list)) => assert_eq!(list.len(), 1),
        other => panic!("unexpected result {:?}", other),
    }
}

#[test]
fn test_errors_across_files_are_sorted() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "b.mprot", "package b\nstruct S {\n\tA X \"1\"\n}\n");
    write(dir.path(), "a.mprot", "package a\nstruct S {\n\tA int \"1\"\n\tB int \"1\"\n\tC Y \"2\"\n}\n");

    let (_, errs) = parse_files(dir.path(), &["*.mprot".to_string()]).unwrap();
    assert_eq!(
        errs.texts(),
        vec![
            "duplicate ordinal 1 for field B in struct S",
            "undefined type Y",
            "undefined type X",
        ]
    );
}

#[test]
fn test_empty_directory() {
    let dir = tempfile::tempdir().unwrap();
    let schema = compile(&options(dir.path())).unwrap();
    assert_eq!(schema, Schema { root: dir.path().canonicalize().unwrap(), files: vec![] });
}

#[test]
fn test_missing_root_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let result = compile(&options(&dir.path().join("missing")));
    assert!(matches!(result, Err(CompileError::Io { .. })));
}

#[cfg(unix)]
#[test]
fn test_unreadable_file_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "good.mprot", "package good\n");
    std::os::unix::fs::symlink(dir.path().join("gone"), dir.path().join("bad.mprot")).unwrap();

    match compile(&options(dir.path())) {
        Err(CompileError::Io { path, .. }) => assert!(path.ends_with("bad.mprot")),
        other => panic!("unexpected result {:?}", other),
    }
}

#[cfg(unix)]
#[test]
fn test_symlink_loop_yields_each_file_once() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().canonicalize().unwrap();
    write(&root, "sub/a.mprot", "package a\n");
    std::os::unix::fs::symlink(&root, root.join("sub/loop")).unwrap();

    let schema = compile(&options(&root)).unwrap();
    assert_eq!(schema.files.len(), 1);
    assert!(schema.files[0].name.ends_with("a.mprot"));
}

#[test]
fn test_invalid_glob_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let mut opts = options(dir.path());
    opts.glob_patterns = vec!["[oops".into()];
    assert!(matches!(compile(&opts), Err(CompileError::Glob(_))));
}
