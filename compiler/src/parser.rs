use crate::{
    resolver::{resolve, Unresolved},
    tokenizer::{Token, TokenKind, Tokenizer},
    utils::quote,
    verifier::verify_file,
};
use mprot_schema::{
    Branch, Const, Decl, DeclId, DefinedType, Enum, Enumerator, ErrorList, Field, File, Import,
    Method, Package, Pos, Service, Struct, SymbolTable, SymbolTarget, Tags, Type, Union,
};
use std::collections::BTreeMap;

/// Parses, resolves and verifies one schema file.
///
/// Never stops at the first problem: the returned file is a best-effort model
/// and the list holds every error found, sorted by position. When the list is
/// empty every defined type in the file has a target.
pub fn parse(source: &[u8], filename: &str) -> (File, ErrorList) {
    let (mut file, unresolved, mut errs) = Parser::new(source, filename).parse_file();
    resolve(&mut file, &unresolved, &mut errs);
    verify_file(&file, &mut errs);
    errs.sort();
    (file, errs)
}

/// Recursive-descent parser over a [`Tokenizer`].
///
/// Type names are looked up while parsing. A name that is not known yet gets a
/// placeholder symbol which a later declaration of the same name fills in;
/// whatever is still open at the end is left to the resolver.
pub struct Parser<'a> {
    t:          Tokenizer<'a>,
    tok:        Token,
    doc:        Vec<String>, // comment lines directly above `tok`
    errs:       ErrorList,
    name:       String,
    decls:      Vec<Decl>,
    symbols:    SymbolTable,
    unresolved: Vec<Unresolved>,
}

impl<'a> Parser<'a> {
    pub fn new(source: &'a [u8], filename: &str) -> Self {
        let mut t = Tokenizer::new(source, filename);
        let tok = t.next();
        let mut p = Parser {
            t,
            tok,
            doc: Vec::new(),
            errs: ErrorList::new(),
            name: filename.to_string(),
            decls: Vec::new(),
            symbols: SymbolTable::new(),
            unresolved: Vec::new(),
        };
        p.scan_doc_comment();
        p
    }

    /// Parses the whole file. Placeholders that are still open are returned
    /// for the resolver.
    pub fn parse_file(mut self) -> (File, Vec<Unresolved>, ErrorList) {
        let doc = self.doc_comments();
        let package = self.parse_package();
        let imports = self.parse_imports();
        self.parse_decls();

        let file = File {
            name: self.name,
            doc,
            package,
            imports,
            decls: self.decls,
            symbols: self.symbols,
        };
        (file, self.unresolved, self.errs)
    }

    fn parse_package(&mut self) -> Package {
        let pos = self.tok.pos.clone();
        if self.tok.kind == TokenKind::Eof {
            self.expect(TokenKind::Package);
            return Package { pos, name: String::new() };
        }

        self.expect(TokenKind::Package);
        let name = self.parse_ident();
        // one error is enough for a clause cut off by the end of file
        if !name.is_empty() || self.tok.kind != TokenKind::Eof {
            self.expect(TokenKind::Semicolon);
        }
        Package { pos, name }
    }

    fn parse_imports(&mut self) -> BTreeMap<String, Import> {
        let mut imports = BTreeMap::new();
        while self.tok.kind == TokenKind::Import {
            let pos = self.tok.pos.clone();
            self.next();

            let mut name = String::new();
            if self.tok.kind == TokenKind::Ident {
                name = self.tok.text.clone();
                self.next();
            }

            let path = if self.tok.kind == TokenKind::Str {
                strip_delimiters(&self.tok.text).to_string()
            } else {
                String::new()
            };
            self.expect(TokenKind::Str);

            if name.is_empty() {
                name = import_name(&path);
            }

            if path.is_empty() || name.is_empty() {
                self.error_at(pos, format!("invalid import path {}", quote(&path)));
            } else if imports.contains_key(&name) {
                self.error_at(pos, format!("import {} already defined", quote(&name)));
            } else {
                imports.insert(name.clone(), Import { pos, path, name });
            }

            self.expect(TokenKind::Semicolon);
        }
        imports
    }

    fn parse_decls(&mut self) {
        loop {
            match &self.tok.kind {
                TokenKind::Eof => return,
                TokenKind::Const => {
                    if let Some(c) = self.parse_const() {
                        self.push_decl(Decl::Const(c));
                    }
                }
                TokenKind::Enum => {
                    let e = self.parse_enum();
                    self.push_decl(Decl::Enum(e));
                }
                TokenKind::Struct => {
                    let s = self.parse_struct();
                    self.push_decl(Decl::Struct(s));
                }
                TokenKind::Union => {
                    let u = self.parse_union();
                    self.push_decl(Decl::Union(u));
                }
                TokenKind::Service => {
                    let s = self.parse_service();
                    self.push_decl(Decl::Service(s));
                }
                TokenKind::Semicolon => self.next(),
                TokenKind::Invalid(err) => {
                    let text = err.to_string();
                    self.error(text);
                    self.next();
                }
                TokenKind::Ident => {
                    let text = format!("unexpected identifier {}", quote(&self.tok.text));
                    self.error(text);
                    self.skip_statement();
                }
                _ => {
                    let text = format!("unexpected token {}", quote(&self.tok.text));
                    self.error(text);
                    self.next();
                }
            }
        }
    }

    fn parse_const(&mut self) -> Option<Const> {
        let pos = self.tok.pos.clone();
        let doc = self.doc_comments();

        self.expect(TokenKind::Const);
        let name = self.parse_ident();
        self.expect(TokenKind::Assign);

        let value = match &self.tok.kind {
            TokenKind::Int => Some((Type::Int { bits: 64, unsigned: false }, self.tok.text.clone())),
            TokenKind::Float => Some((Type::Float { bits: 64 }, self.tok.text.clone())),
            TokenKind::Str => Some((Type::String, strip_delimiters(&self.tok.text).to_string())),
            TokenKind::Invalid(err) => {
                let text = err.to_string();
                self.error(text);
                None
            }
            _ => {
                let text = format!(
                    "unexpected token {} in constant declaration",
                    quote(&self.tok.text)
                );
                self.error(text);
                None
            }
        };
        self.next();
        self.expect(TokenKind::Semicolon);

        let (ty, value) = value?;
        if name.is_empty() {
            return None;
        }
        Some(Const { pos, doc, name, ty, value })
    }

    fn parse_enum(&mut self) -> Enum {
        let pos = self.tok.pos.clone();
        let doc = self.doc_comments();

        self.expect(TokenKind::Enum);
        let name = self.parse_ident();
        self.expect(TokenKind::LBrace);

        let mut enumerators = Vec::new();
        while self.tok.kind == TokenKind::Ident {
            let member_pos = self.tok.pos.clone();
            let member = self.parse_ident();
            let (value, tags) = self.parse_tag_string(true);
            self.skip_terminator();

            enumerators.push(Enumerator {
                pos: member_pos,
                name: member,
                value,
                tags,
            });
        }

        self.expect(TokenKind::RBrace);
        self.expect(TokenKind::Semicolon);
        Enum { pos, doc, name, enumerators }
    }

    fn parse_struct(&mut self) -> Struct {
        let pos = self.tok.pos.clone();
        let doc = self.doc_comments();

        self.expect(TokenKind::Struct);
        let name = self.parse_ident();
        self.expect(TokenKind::LBrace);

        let mut fields = Vec::new();
        while !self.at_body_end() {
            let member_pos = self.tok.pos.clone();
            let member = self.parse_ident();
            let ty = self.parse_type();
            let (ordinal, tags) = self.parse_tag_string(false);
            self.skip_terminator();

            if let (false, Some(ty)) = (member.is_empty(), ty) {
                fields.push(Field {
                    pos: member_pos,
                    name: member,
                    ty,
                    ordinal,
                    tags,
                });
            }
        }

        self.expect(TokenKind::RBrace);
        self.expect(TokenKind::Semicolon);
        Struct { pos, doc, name, fields }
    }

    fn parse_union(&mut self) -> Union {
        let pos = self.tok.pos.clone();
        let doc = self.doc_comments();

        self.expect(TokenKind::Union);
        let name = self.parse_ident();
        self.expect(TokenKind::LBrace);

        let mut branches = Vec::new();
        while !self.at_body_end() {
            let member_pos = self.tok.pos.clone();
            let ty = self.parse_type();
            let (ordinal, tags) = self.parse_tag_string(false);
            self.skip_terminator();

            if let Some(ty) = ty {
                branches.push(Branch {
                    pos: member_pos,
                    ty,
                    ordinal,
                    tags,
                });
            }
        }

        self.expect(TokenKind::RBrace);
        self.expect(TokenKind::Semicolon);
        Union { pos, doc, name, branches }
    }

    fn parse_service(&mut self) -> Service {
        let pos = self.tok.pos.clone();
        let doc = self.doc_comments();

        self.expect(TokenKind::Service);
        let name = self.parse_ident();
        self.expect(TokenKind::LBrace);

        let mut methods = Vec::new();
        while !self.at_body_end() {
            let member_pos = self.tok.pos.clone();
            let member_doc = self.doc_comments();
            let member = self.parse_ident();

            self.expect(TokenKind::LParen);
            let mut args = Vec::new();
            while !matches!(self.tok.kind, TokenKind::RParen | TokenKind::Semicolon | TokenKind::Eof) {
                if let Some(arg) = self.parse_type() {
                    args.push(arg);
                }
                if self.tok.kind != TokenKind::Comma {
                    break;
                }
                self.next();
            }
            self.expect(TokenKind::RParen);

            let ret = match self.tok.kind {
                TokenKind::Str | TokenKind::Semicolon | TokenKind::RBrace | TokenKind::Eof => None,
                _ => self.parse_type(),
            };
            let (ordinal, tags) = self.parse_tag_string(false);
            self.skip_terminator();

            if !member.is_empty() {
                methods.push(Method {
                    pos: member_pos,
                    doc: member_doc,
                    name: member,
                    args,
                    ret,
                    ordinal,
                    tags,
                });
            }
        }

        self.expect(TokenKind::RBrace);
        self.expect(TokenKind::Semicolon);
        Service { pos, doc, name, methods }
    }

    /// Parses `"<ordinal> key key:\"value\" ..."`. Enumerator values may be
    /// zero or negative, all other ordinals must be positive. An invalid
    /// ordinal is reported and recorded as 0.
    fn parse_tag_string(&mut self, allow_negative: bool) -> (i64, Tags) {
        let mut tags = Tags::new();
        match self.tok.kind {
            TokenKind::Str => {}
            TokenKind::Semicolon => {
                self.error("missing tag string");
                return (0, tags);
            }
            _ => {
                self.expect(TokenKind::Str);
                return (0, tags);
            }
        }

        let raw = self.tok.text.clone();
        let lit = strip_delimiters(&raw).trim_start_matches(' ');

        // ordinal
        let end = lit.find(' ').unwrap_or(lit.len());
        let ordinal = match lit[..end].parse::<i64>() {
            Ok(n) if allow_negative || n > 0 => n,
            _ => {
                self.error(format!("invalid ordinal {}", quote(&lit[..end])));
                0
            }
        };

        // tags
        let mut rest = &lit[end..];
        loop {
            rest = rest.trim_start_matches(' ');
            if rest.is_empty() {
                break;
            }

            let i = rest.find(|c| matches!(c, ' ' | ':' | '"')).unwrap_or(rest.len());
            if i == rest.len() || rest.as_bytes()[i] == b' ' {
                // key without value
                tags.insert(&rest[..i], "");
                rest = &rest[i..];
                continue;
            }
            if i == 0 || !rest[i..].starts_with(":\"") {
                self.error(format!("invalid tag format {}", raw));
                break;
            }

            let key = &rest[..i];
            let start = i + 2;
            let bytes = rest.as_bytes();
            let mut j = start;
            while j < bytes.len() && bytes[j] != b'"' {
                if bytes[j] == b'\\' {
                    j += 1;
                }
                j += 1;
            }
            if j >= bytes.len() {
                self.error(format!("tag value string not closed for {}", quote(key)));
                break;
            }

            tags.insert(key, &rest[start..j]);
            rest = &rest[j + 1..];
        }

        self.next();
        (ordinal, tags)
    }

    fn parse_type(&mut self) -> Option<Type> {
        match &self.tok.kind {
            TokenKind::LBrack => {
                self.next();
                let mut size = 0;
                if self.tok.kind == TokenKind::Int {
                    match self.tok.text.parse::<u32>() {
                        Ok(n) if n > 0 => size = n,
                        _ => {
                            let text = format!("invalid array size {}", self.tok.text);
                            self.error(text);
                        }
                    }
                    self.next();
                }
                self.expect(TokenKind::RBrack);

                let element = self.parse_type()?;
                let nested = matches!(element, Type::Array { .. });
                let array = Type::Array {
                    size,
                    element: Box::new(element),
                };
                if nested {
                    self.error(format!("multidimensional array {} not supported", array));
                }
                Some(array)
            }

            TokenKind::Asterisk => {
                self.next();
                let value = self.parse_type()?;
                if matches!(
                    value,
                    Type::Pointer { .. } | Type::Array { .. } | Type::Map { .. } | Type::Raw
                ) {
                    self.error(format!("pointer type *{} not supported", value));
                }
                Some(Type::Pointer {
                    value: Box::new(value),
                })
            }

            TokenKind::Map => {
                self.next();
                self.expect(TokenKind::LBrack);
                let key = self.parse_type();
                self.expect(TokenKind::RBrack);
                let value = self.parse_type();
                Some(Type::Map {
                    key:   Box::new(key?),
                    value: Box::new(value?),
                })
            }

            TokenKind::Ident => {
                let pos = self.tok.pos.clone();
                let mut name = self.tok.text.clone();
                self.next();
                if self.tok.kind == TokenKind::Period {
                    self.next();
                    if self.tok.kind == TokenKind::Ident {
                        name.push('.');
                        name.push_str(&self.tok.text);
                    }
                    self.expect(TokenKind::Ident);
                }
                Some(self.resolve(&name, pos))
            }

            TokenKind::Invalid(err) => {
                let text = err.to_string();
                self.error(text);
                self.next();
                None
            }

            _ => {
                let text = format!("unexpected token {}", quote(&self.tok.text));
                self.error(text);
                self.next();
                None
            }
        }
    }

    fn parse_ident(&mut self) -> String {
        if self.tok.kind != TokenKind::Ident {
            self.expect(TokenKind::Ident);
            return String::new();
        }
        let ident = self.tok.text.clone();
        self.next();
        ident
    }

    /// Maps a type name to its type, creating a placeholder symbol for names
    /// that are not declared (yet).
    fn resolve(&mut self, name: &str, pos: Pos) -> Type {
        if let Some(ty) = Type::builtin(name) {
            return ty;
        }
        let symbol = match self.symbols.lookup(name) {
            Some(symbol) => symbol,
            None => {
                let symbol = self.symbols.insert(name, None);
                self.unresolved.push(Unresolved { symbol, pos });
                symbol
            }
        };
        Type::Defined(DefinedType::new(name, symbol))
    }

    fn push_decl(&mut self, decl: Decl) {
        let id = DeclId(self.decls.len());
        if decl.is_type() && !decl.name().is_empty() {
            self.register(decl.name(), id, decl.pos());
        }
        self.decls.push(decl);
    }

    fn register(&mut self, name: &str, id: DeclId, pos: &Pos) {
        let Some(symbol) = self.symbols.lookup(name) else {
            self.symbols.insert(name, Some(SymbolTarget::Local(id)));
            return;
        };
        match self.symbols.target(symbol) {
            None => self.symbols.set_target(symbol, SymbolTarget::Local(id)),
            Some(SymbolTarget::Local(prev)) => {
                let prev_pos = self.decls[prev.0].pos().clone();
                self.error_at(
                    pos.clone(),
                    format!("type {} redeclared (see position {})", name, prev_pos),
                );
            }
            Some(SymbolTarget::Import(_)) => {}
        }
    }

    fn expect(&mut self, kind: TokenKind) {
        if self.tok.kind != kind {
            let text = match &self.tok.kind {
                TokenKind::Invalid(err) => err.to_string(),
                TokenKind::Eof => format!("unexpected end of file ({} expected)", kind),
                _ if self.tok.text == "\n" => format!("unexpected newline ({} expected)", kind),
                _ => format!("unexpected token {} ({} expected)", quote(&self.tok.text), kind),
            };
            self.error(text);
        }
        self.next();
    }

    /// The `;` after a member's tag string may be left out.
    fn skip_terminator(&mut self) {
        if self.tok.kind == TokenKind::Semicolon {
            self.next();
        }
    }

    fn at_body_end(&self) -> bool {
        matches!(self.tok.kind, TokenKind::RBrace | TokenKind::Eof)
    }

    /// Skips to the next `;` that is not nested in braces.
    fn skip_statement(&mut self) {
        let mut level = 0i32;
        loop {
            self.next();
            match self.tok.kind {
                TokenKind::Eof | TokenKind::Invalid(_) => return,
                TokenKind::Semicolon if level == 0 => return,
                TokenKind::LBrace => level += 1,
                TokenKind::RBrace => level -= 1,
                _ => {}
            }
        }
    }

    fn error(&mut self, text: impl Into<String>) {
        let pos = self.tok.pos.clone();
        self.errs.add(pos, text);
    }

    fn error_at(&mut self, pos: Pos, text: impl Into<String>) {
        self.errs.add(pos, text);
    }

    fn next(&mut self) {
        self.tok = self.t.next();
        self.scan_doc_comment();
    }

    /// Collects the comments in front of the next real token. A gap line
    /// between comments starts a new block, so only the last block counts.
    fn scan_doc_comment(&mut self) {
        self.doc.clear();

        while self.tok.kind == TokenKind::Comment {
            let before = self.doc.len();
            append_comment_lines(&mut self.doc, &self.tok.text);
            let count = self.doc.len() - before;

            let line = self.tok.pos.line;
            self.tok = self.t.next();
            if line + count < self.tok.pos.line {
                self.doc.clear();
            }
        }

        let lead = self.doc.iter().take_while(|l| l.is_empty()).count();
        self.doc.drain(..lead);
        while self.doc.last().is_some_and(|l| l.is_empty()) {
            self.doc.pop();
        }
    }

    fn doc_comments(&self) -> Vec<String> {
        self.doc.clone()
    }
}

fn append_comment_lines(lines: &mut Vec<String>, comment: &str) {
    if let Some(line) = comment.strip_prefix("//") {
        let line = line.strip_prefix(' ').unwrap_or(line);
        lines.push(trim_trailing_spaces(line).to_string());
        return;
    }

    let mut body = comment
        .strip_prefix("/*")
        .and_then(|c| c.strip_suffix("*/"))
        .unwrap_or("");
    while !body.is_empty() {
        let line = match body.split_once('\n') {
            Some((line, rest)) => {
                body = rest;
                line
            }
            None => std::mem::take(&mut body),
        };
        lines.push(trim_trailing_spaces(line).to_string());
    }
}

fn trim_trailing_spaces(s: &str) -> &str {
    s.trim_end_matches([' ', '\t', '\r', '\n'])
}

/// Removes the quote or back-tick delimiters of a string literal.
fn strip_delimiters(lit: &str) -> &str {
    if lit.len() < 2 {
        return "";
    }
    &lit[1..lit.len() - 1]
}

/// Default import name: the base name of the path without its extension.
fn import_name(path: &str) -> String {
    let base = path.trim_end_matches('/').rsplit('/').next().unwrap_or("");
    match base.rfind('.') {
        Some(i) => base[..i].to_string(),
        None => base.to_string(),
    }
}
