use crate::symbols::SymbolId;
use serde::Serialize;
use std::fmt;

/// Names of the built-in types, in the order the parser checks them.
pub const BUILTIN_TYPES: [&str; 17] = [
    "bool", "int", "int8", "int16", "int32", "int64", "uint", "uint8", "uint16", "uint32",
    "uint64", "float32", "float64", "string", "bytes", "raw", "time",
];

/// The closed set of value types a schema can express.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Type {
    Bool,
    /// `bits == 0` is the platform sized `int`/`uint`.
    Int { bits: u8, unsigned: bool },
    Float { bits: u8 },
    String,
    Bytes,
    /// An already encoded value passed through untouched.
    Raw,
    Time,
    /// `size == 0` is a dynamic array.
    Array { size: u32, element: Box<Type> },
    Map { key: Box<Type>, value: Box<Type> },
    Pointer { value: Box<Type> },
    Defined(DefinedType),
}

/// A reference to a user declared type, possibly imported from another file.
///
/// The referenced declaration lives in the owning file's symbol table, so the
/// reference itself stays a plain value that can be cloned freely.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DefinedType {
    /// Import name for `pkg.Name` references, `None` for local ones.
    pub package: Option<String>,
    pub name:    String,
    pub symbol:  SymbolId,
}

impl DefinedType {
    /// Builds a reference from a possibly qualified name such as `ext.Point`.
    pub fn new(qualified: &str, symbol: SymbolId) -> Self {
        match qualified.split_once('.') {
            Some((package, name)) => DefinedType {
                package: Some(package.to_string()),
                name: name.to_string(),
                symbol,
            },
            None => DefinedType {
                package: None,
                name: qualified.to_string(),
                symbol,
            },
        }
    }

    pub fn imported(&self) -> bool {
        self.package.is_some()
    }
}

impl fmt::Display for DefinedType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.package {
            Some(package) => write!(f, "{}.{}", package, self.name),
            None => f.write_str(&self.name),
        }
    }
}

impl Type {
    /// Returns the built-in type for `name`, if there is one.
    pub fn builtin(name: &str) -> Option<Type> {
        let ty = match name {
            "bool" => Type::Bool,
            "int" => Type::Int { bits: 0, unsigned: false },
            "int8" => Type::Int { bits: 8, unsigned: false },
            "int16" => Type::Int { bits: 16, unsigned: false },
            "int32" => Type::Int { bits: 32, unsigned: false },
            "int64" => Type::Int { bits: 64, unsigned: false },
            "uint" => Type::Int { bits: 0, unsigned: true },
            "uint8" => Type::Int { bits: 8, unsigned: true },
            "uint16" => Type::Int { bits: 16, unsigned: true },
            "uint32" => Type::Int { bits: 32, unsigned: true },
            "uint64" => Type::Int { bits: 64, unsigned: true },
            "float32" => Type::Float { bits: 32 },
            "float64" => Type::Float { bits: 64 },
            "string" => Type::String,
            "bytes" => Type::Bytes,
            "raw" => Type::Raw,
            "time" => Type::Time,
            _ => return None,
        };
        Some(ty)
    }

    /// Canonical display name, e.g. `map[string][]int32`.
    pub fn name(&self) -> String {
        self.to_string()
    }

    /// Identity used to detect union branches that would collide on the wire.
    ///
    /// All widths of a primitive share one identity, arrays and maps share one
    /// identity regardless of their element types, and defined types are
    /// identified by their declared name.
    pub fn type_id(&self) -> &str {
        match self {
            Type::Bool => "boolean",
            Type::Int { .. } => "integer",
            Type::Float { .. } => "floating-point",
            Type::String => "string",
            Type::Bytes => "bytes",
            Type::Raw => "raw",
            Type::Time => "time",
            Type::Array { .. } => "array",
            Type::Map { .. } => "map",
            Type::Pointer { .. } => "pointer",
            Type::Defined(defined) => &defined.name,
        }
    }

    /// Calls `visit` for every defined type reachable from this type.
    pub fn walk_defined<'a>(&'a self, visit: &mut impl FnMut(&'a DefinedType)) {
        match self {
            Type::Array { element, .. } => element.walk_defined(visit),
            Type::Map { key, value } => {
                key.walk_defined(visit);
                value.walk_defined(visit);
            }
            Type::Pointer { value } => value.walk_defined(visit),
            Type::Defined(defined) => visit(defined),
            _ => {}
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Bool => f.write_str("bool"),
            Type::Int { bits, unsigned } => {
                f.write_str(if *unsigned { "uint" } else { "int" })?;
                if *bits > 0 {
                    write!(f, "{}", bits)?;
                }
                Ok(())
            }
            Type::Float { bits } => {
                f.write_str("float")?;
                if *bits > 0 {
                    write!(f, "{}", bits)?;
                }
                Ok(())
            }
            Type::String => f.write_str("string"),
            Type::Bytes => f.write_str("bytes"),
            Type::Raw => f.write_str("raw"),
            Type::Time => f.write_str("time"),
            Type::Array { size, element } if *size > 0 => write!(f, "[{}]{}", size, element),
            Type::Array { element, .. } => write!(f, "[]{}", element),
            Type::Map { key, value } => write!(f, "map[{}]{}", key, value),
            Type::Pointer { value } => write!(f, "*{}", value),
            Type::Defined(defined) => write!(f, "{}", defined),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn defined(name: &str) -> Type {
        Type::Defined(DefinedType::new(name, SymbolId(0)))
    }

    #[test]
    fn test_builtin_names_round_trip() {
        for name in BUILTIN_TYPES {
            let ty = Type::builtin(name).unwrap();
            assert_eq!(ty.name(), name);
        }
        assert!(Type::builtin("Foo").is_none());
    }

    #[test]
    fn test_composite_names() {
        let array = Type::Array {
            size:    0,
            element: Box::new(Type::Int { bits: 32, unsigned: false }),
        };
        assert_eq!(array.name(), "[]int32");

        let sized = Type::Array {
            size:    4,
            element: Box::new(Type::String),
        };
        assert_eq!(sized.name(), "[4]string");

        let map = Type::Map {
            key:   Box::new(Type::String),
            value: Box::new(defined("ext.Point")),
        };
        assert_eq!(map.name(), "map[string]ext.Point");

        let ptr = Type::Pointer {
            value: Box::new(defined("E")),
        };
        assert_eq!(ptr.name(), "*E");
    }

    #[test]
    fn test_type_ids() {
        assert_eq!(Type::builtin("int8").unwrap().type_id(), "integer");
        assert_eq!(Type::builtin("uint64").unwrap().type_id(), "integer");
        assert_eq!(Type::builtin("float32").unwrap().type_id(), "floating-point");
        assert_eq!(defined("ext.Point").type_id(), "Point");

        let a = Type::Array { size: 0, element: Box::new(Type::String) };
        let b = Type::Array { size: 3, element: Box::new(Type::Bool) };
        assert_eq!(a.type_id(), b.type_id());
    }

    #[test]
    fn test_qualified_defined_type() {
        let local = DefinedType::new("Point", SymbolId(1));
        assert!(!local.imported());
        assert_eq!(local.to_string(), "Point");

        let imported = DefinedType::new("geo.Point", SymbolId(2));
        assert!(imported.imported());
        assert_eq!(imported.package.as_deref(), Some("geo"));
        assert_eq!(imported.name, "Point");
        assert_eq!(imported.to_string(), "geo.Point");
    }

    #[test]
    fn test_walk_defined() {
        let ty = Type::Map {
            key:   Box::new(Type::String),
            value: Box::new(Type::Array {
                size:    0,
                element: Box::new(Type::Pointer { value: Box::new(defined("ext.A")) }),
            }),
        };
        let mut seen = Vec::new();
        ty.walk_defined(&mut |d| seen.push(d.to_string()));
        assert_eq!(seen, vec!["ext.A"]);
    }
}
