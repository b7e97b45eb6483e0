use crate::error::CompileError;
use regex::Regex;
use std::{
    collections::BTreeSet,
    fs,
    path::{Path, PathBuf},
};
use tracing::trace;

/// One `/`-separated piece of a glob pattern.
#[derive(Debug)]
enum Segment {
    /// `**`: zero or more directories.
    AnyDirs,
    Literal(String),
    Pattern(Regex),
}

impl Segment {
    fn parse(seg: &str) -> Result<Segment, CompileError> {
        if seg == "**" {
            return Ok(Segment::AnyDirs);
        }
        if seg == ".." {
            return Err(CompileError::Glob("invalid glob token '..'".into()));
        }
        if !seg.contains(['*', '?', '[']) {
            return Ok(Segment::Literal(seg.to_string()));
        }
        segment_regex(seg).map(Segment::Pattern)
    }
}

/// Returns the regular files below `root` matching any of `patterns`, as
/// absolute paths in sorted order without duplicates.
///
/// Patterns use `/` as separator. Within a segment `*` matches any run of
/// characters, `?` a single character and `[...]` a character class (`[!...]`
/// negates). A segment that is exactly `**` matches any number of directories;
/// as the last segment it matches every file below. Directory symlinks are
/// not followed and `..` is rejected, so every file is found under one path.
pub fn glob(root: &Path, patterns: &[String]) -> Result<Vec<PathBuf>, CompileError> {
    let root = root
        .canonicalize()
        .map_err(|e| CompileError::io(root, e))?;

    let mut found = BTreeSet::new();
    for pattern in patterns {
        let mut segments = pattern
            .split('/')
            .filter(|seg| !seg.is_empty() && *seg != ".")
            .map(Segment::parse)
            .collect::<Result<Vec<_>, _>>()?;
        if matches!(segments.last(), Some(Segment::AnyDirs)) {
            segments.push(Segment::parse("*")?);
        }

        trace!(pattern = %pattern, "expanding glob pattern");
        walk(&segments, &root, &mut found)?;
    }
    Ok(found.into_iter().collect())
}

fn walk(segments: &[Segment], dir: &Path, found: &mut BTreeSet<PathBuf>) -> Result<(), CompileError> {
    let Some((first, rest)) = segments.split_first() else {
        return Ok(());
    };
    let last = rest.is_empty();

    match first {
        Segment::AnyDirs => {
            walk(rest, dir, found)?;
            for entry in read_dir(dir)? {
                if entry.is_dir {
                    walk(segments, &entry.path, found)?;
                }
            }
        }

        Segment::Literal(name) => {
            let path = dir.join(name);
            if last {
                if path.is_file() || (path.is_symlink() && !path.is_dir()) {
                    found.insert(path);
                }
            } else if is_real_dir(&path) {
                walk(rest, &path, found)?;
            }
        }

        Segment::Pattern(rx) => {
            for entry in read_dir(dir)? {
                if !rx.is_match(&entry.name) {
                    continue;
                }
                if last && entry.is_file {
                    found.insert(entry.path);
                } else if !last && entry.is_dir {
                    walk(rest, &entry.path, found)?;
                }
            }
        }
    }
    Ok(())
}

struct Entry {
    name:    String,
    path:    PathBuf,
    is_dir:  bool,
    /// Regular file, or a symlink that does not point at a directory.
    is_file: bool,
}

fn read_dir(dir: &Path) -> Result<Vec<Entry>, CompileError> {
    let mut entries = Vec::new();
    for entry in fs::read_dir(dir).map_err(|e| CompileError::io(dir, e))? {
        let entry = entry.map_err(|e| CompileError::io(dir, e))?;
        let file_type = entry.file_type().map_err(|e| CompileError::io(entry.path(), e))?;
        let path = entry.path();
        entries.push(Entry {
            name:    entry.file_name().to_string_lossy().into_owned(),
            is_dir:  file_type.is_dir(),
            is_file: file_type.is_file() || (file_type.is_symlink() && !path.is_dir()),
            path,
        });
    }
    Ok(entries)
}

fn is_real_dir(path: &Path) -> bool {
    fs::symlink_metadata(path).is_ok_and(|m| m.is_dir())
}

/// Translates a single glob segment into an anchored regular expression.
fn segment_regex(seg: &str) -> Result<Regex, CompileError> {
    let invalid = || CompileError::Glob(format!("invalid glob token '{}'", seg));

    let mut rx = String::from("^");
    let mut chars = seg.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '*' => {
                if chars.peek() == Some(&'*') {
                    return Err(CompileError::Glob("invalid glob token '**'".into()));
                }
                rx.push_str(".*");
            }
            '?' => rx.push('.'),
            '[' => {
                let mut class = String::from("[");
                if matches!(chars.peek(), Some(&'!') | Some(&'^')) {
                    chars.next();
                    class.push('^');
                }

                let mut closed = false;
                let mut first = true;
                while let Some(c) = chars.next() {
                    match c {
                        ']' if !first => {
                            closed = true;
                            break;
                        }
                        ']' => class.push_str("\\]"),
                        '[' if chars.peek() == Some(&':') => {
                            // named class such as [:alpha:]
                            class.push('[');
                            for c in chars.by_ref() {
                                class.push(c);
                                if c == ']' {
                                    break;
                                }
                            }
                        }
                        '\\' | '[' | '&' | '~' => {
                            class.push('\\');
                            class.push(c);
                        }
                        _ => class.push(c),
                    }
                    first = false;
                }
                if !closed {
                    return Err(invalid());
                }
                class.push(']');
                rx.push_str(&class);
            }
            _ => rx.push_str(&regex::escape(c.encode_utf8(&mut [0; 4]))),
        }
    }
    rx.push('$');

    Regex::new(&rx).map_err(|_| invalid())
}
