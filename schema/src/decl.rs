use crate::{pos::Pos, tags::Tags, types::Type};
use serde::Serialize;
use std::fmt;

/// Index of a declaration in [`crate::File::decls`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct DeclId(pub usize);

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Package {
    pub pos:  Pos,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Import {
    pub pos:  Pos,
    pub path: String,
    /// Explicit alias, or the base name of `path` without its extension.
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Const {
    pub pos:   Pos,
    pub doc:   Vec<String>,
    pub name:  String,
    #[serde(rename = "type")]
    pub ty:    Type,
    /// Literal text; string constants without their delimiters.
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Enumerator {
    pub pos:   Pos,
    pub name:  String,
    pub value: i64,
    pub tags:  Tags,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Enum {
    pub pos:         Pos,
    pub doc:         Vec<String>,
    pub name:        String,
    pub enumerators: Vec<Enumerator>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Field {
    pub pos:     Pos,
    pub name:    String,
    #[serde(rename = "type")]
    pub ty:      Type,
    pub ordinal: i64,
    pub tags:    Tags,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Struct {
    pub pos:    Pos,
    pub doc:    Vec<String>,
    pub name:   String,
    pub fields: Vec<Field>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Branch {
    pub pos:     Pos,
    #[serde(rename = "type")]
    pub ty:      Type,
    pub ordinal: i64,
    pub tags:    Tags,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Union {
    pub pos:      Pos,
    pub doc:      Vec<String>,
    pub name:     String,
    pub branches: Vec<Branch>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Method {
    pub pos:     Pos,
    pub doc:     Vec<String>,
    pub name:    String,
    pub args:    Vec<Type>,
    /// `None` for methods without a result.
    #[serde(rename = "return")]
    pub ret:     Option<Type>,
    pub ordinal: i64,
    pub tags:    Tags,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Service {
    pub pos:     Pos,
    pub doc:     Vec<String>,
    pub name:    String,
    pub methods: Vec<Method>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeclKind {
    Const,
    Enum,
    Struct,
    Union,
    Service,
}

impl fmt::Display for DeclKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DeclKind::Const   => "const",
            DeclKind::Enum    => "enum",
            DeclKind::Struct  => "struct",
            DeclKind::Union   => "union",
            DeclKind::Service => "service",
        })
    }
}

/// A top level declaration of a schema file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "decl", rename_all = "snake_case")]
pub enum Decl {
    Const(Const),
    Enum(Enum),
    Struct(Struct),
    Union(Union),
    Service(Service),
}

impl Decl {
    pub fn pos(&self) -> &Pos {
        match self {
            Decl::Const(c)   => &c.pos,
            Decl::Enum(e)    => &e.pos,
            Decl::Struct(s)  => &s.pos,
            Decl::Union(u)   => &u.pos,
            Decl::Service(s) => &s.pos,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Decl::Const(c)   => &c.name,
            Decl::Enum(e)    => &e.name,
            Decl::Struct(s)  => &s.name,
            Decl::Union(u)   => &u.name,
            Decl::Service(s) => &s.name,
        }
    }

    pub fn kind(&self) -> DeclKind {
        match self {
            Decl::Const(_)   => DeclKind::Const,
            Decl::Enum(_)    => DeclKind::Enum,
            Decl::Struct(_)  => DeclKind::Struct,
            Decl::Union(_)   => DeclKind::Union,
            Decl::Service(_) => DeclKind::Service,
        }
    }

    /// Reports whether the declaration introduces a type name.
    pub fn is_type(&self) -> bool {
        !matches!(self, Decl::Const(_))
    }

    /// Calls `visit` for every type the declaration refers to.
    pub fn walk_types<'a>(&'a self, visit: &mut impl FnMut(&'a Type)) {
        match self {
            Decl::Const(c) => visit(&c.ty),
            Decl::Enum(_) => {}
            Decl::Struct(s) => s.fields.iter().for_each(|f| visit(&f.ty)),
            Decl::Union(u) => u.branches.iter().for_each(|b| visit(&b.ty)),
            Decl::Service(s) => {
                for m in &s.methods {
                    for arg in &m.args {
                        visit(arg);
                    }
                    if let Some(ret) = &m.ret {
                        visit(ret);
                    }
                }
            }
        }
    }
}
