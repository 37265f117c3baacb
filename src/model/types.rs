//! Core IR types describing the model universe.
//!
//! A `ModelDefinition` is one named generated type; a `TypeDescriptor` is the
//! annotation of a field or container element. `Display` on `TypeDescriptor`
//! renders the Python annotation text, which doubles as the structural
//! fingerprint used by deduplication.

use std::collections::BTreeSet;
use std::fmt;

/// Scalar types the generated models support.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Primitive {
    Str,
    Int,
    Float,
    Bool,
    /// Unknown or untyped content.
    Any,
}

impl Primitive {
    pub fn as_py(self) -> &'static str {
        match self {
            Primitive::Str => "str",
            Primitive::Int => "int",
            Primitive::Float => "float",
            Primitive::Bool => "bool",
            Primitive::Any => "Any",
        }
    }
}

/// A literal value of an inline enumeration.
#[derive(Debug, Clone, PartialEq)]
pub enum EnumLiteral {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Null,
}

impl EnumLiteral {
    /// Render as Python literal source text.
    pub fn as_py(&self) -> String {
        match self {
            EnumLiteral::Str(s) => format!("{:?}", s),
            EnumLiteral::Int(i) => i.to_string(),
            EnumLiteral::Float(f) => f.to_string(),
            EnumLiteral::Bool(true) => "True".to_string(),
            EnumLiteral::Bool(false) => "False".to_string(),
            EnumLiteral::Null => "None".to_string(),
        }
    }
}

/// An enumeration synthesized from an inline `enum` property.
#[derive(Debug, Clone, PartialEq)]
pub struct EnumDef {
    /// Generated class name, `<FieldName>Enum`.
    pub name: String,
    /// `(MEMBER_NAME, literal)` pairs in declaration order.
    pub members: Vec<(String, EnumLiteral)>,
}

/// The annotation of a field, container element or model root.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeDescriptor {
    Primitive(Primitive),
    /// A direct reference to another model by canonical name.
    Reference(String),
    /// A reference participating in a cycle; rendered quoted and finalized
    /// with a rebuild marker.
    Deferred(String),
    List(Box<TypeDescriptor>),
    Map(Box<TypeDescriptor>, Box<TypeDescriptor>),
    Enum(EnumDef),
}

impl TypeDescriptor {
    pub fn list(inner: TypeDescriptor) -> Self {
        TypeDescriptor::List(Box::new(inner))
    }

    pub fn map(key: TypeDescriptor, value: TypeDescriptor) -> Self {
        TypeDescriptor::Map(Box::new(key), Box::new(value))
    }

    /// Collect every model name this descriptor refers to, deferred or not.
    pub fn collect_references(&self, out: &mut BTreeSet<String>) {
        match self {
            TypeDescriptor::Reference(name) | TypeDescriptor::Deferred(name) => {
                out.insert(name.clone());
            }
            TypeDescriptor::List(inner) => inner.collect_references(out),
            TypeDescriptor::Map(key, value) => {
                key.collect_references(out);
                value.collect_references(out);
            }
            TypeDescriptor::Primitive(_) | TypeDescriptor::Enum(_) => {}
        }
    }

    /// Collect only deferred (cycle-breaking) references.
    pub fn collect_deferred(&self, out: &mut BTreeSet<String>) {
        match self {
            TypeDescriptor::Deferred(name) => {
                out.insert(name.clone());
            }
            TypeDescriptor::List(inner) => inner.collect_deferred(out),
            TypeDescriptor::Map(key, value) => {
                key.collect_deferred(out);
                value.collect_deferred(out);
            }
            _ => {}
        }
    }

    /// Collect the names of enum classes nested in this descriptor.
    pub fn collect_enums<'a>(&'a self, out: &mut Vec<&'a EnumDef>) {
        match self {
            TypeDescriptor::Enum(def) => out.push(def),
            TypeDescriptor::List(inner) => inner.collect_enums(out),
            TypeDescriptor::Map(key, value) => {
                key.collect_enums(out);
                value.collect_enums(out);
            }
            _ => {}
        }
    }

    /// True when rendering this annotation requires `typing.Any`.
    pub fn uses_any(&self) -> bool {
        match self {
            TypeDescriptor::Primitive(p) => *p == Primitive::Any,
            TypeDescriptor::List(inner) => inner.uses_any(),
            TypeDescriptor::Map(key, value) => key.uses_any() || value.uses_any(),
            _ => false,
        }
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeDescriptor::Primitive(p) => f.write_str(p.as_py()),
            TypeDescriptor::Reference(name) => f.write_str(name),
            TypeDescriptor::Deferred(name) => write!(f, "'{name}'"),
            TypeDescriptor::List(inner) => write!(f, "list[{inner}]"),
            TypeDescriptor::Map(key, value) => write!(f, "dict[{key}, {value}]"),
            TypeDescriptor::Enum(def) => f.write_str(&def.name),
        }
    }
}

/// How a model's payload is shaped at the root.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RootKind {
    /// A keyed object with named fields.
    Object,
    /// A bare array payload (`RootModel[list[...]]`).
    List,
    /// A free-form mapping payload (`RootModel[dict[...]]`).
    Map,
    /// An opaque payload (`RootModel` over `Any`); used by the generic
    /// response marker.
    Opaque,
}

/// One field of an object-rooted model.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDefinition {
    /// The property name as it appears on the wire.
    pub source_name: String,
    /// The sanitized Python attribute name.
    pub name: String,
    pub ty: TypeDescriptor,
    /// Set when the attribute name differs from the wire name.
    pub alias: Option<String>,
    pub required: bool,
}

/// One named generated model.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelDefinition {
    pub name: String,
    pub kind: RootKind,
    /// Fields, for `Object` models. Empty otherwise.
    pub fields: Vec<FieldDefinition>,
    /// Root annotation, for `List` and `Map` models. `None` for objects.
    pub root: Option<TypeDescriptor>,
}

impl ModelDefinition {
    pub fn object(name: impl Into<String>, fields: Vec<FieldDefinition>) -> Self {
        ModelDefinition {
            name: name.into(),
            kind: RootKind::Object,
            fields,
            root: None,
        }
    }

    pub fn list(name: impl Into<String>, inner: TypeDescriptor) -> Self {
        ModelDefinition {
            name: name.into(),
            kind: RootKind::List,
            fields: Vec::new(),
            root: Some(TypeDescriptor::list(inner)),
        }
    }

    pub fn map(name: impl Into<String>, key: TypeDescriptor, value: TypeDescriptor) -> Self {
        ModelDefinition {
            name: name.into(),
            kind: RootKind::Map,
            fields: Vec::new(),
            root: Some(TypeDescriptor::map(key, value)),
        }
    }

    pub fn opaque(name: impl Into<String>) -> Self {
        ModelDefinition {
            name: name.into(),
            kind: RootKind::Opaque,
            fields: Vec::new(),
            root: Some(TypeDescriptor::Primitive(Primitive::Any)),
        }
    }

    /// Every model name this definition depends on.
    pub fn references(&self) -> BTreeSet<String> {
        let mut out = BTreeSet::new();
        for field in &self.fields {
            field.ty.collect_references(&mut out);
        }
        if let Some(root) = &self.root {
            root.collect_references(&mut out);
        }
        out
    }

    /// Enum classes nested in this model's fields, in field order.
    pub fn enums(&self) -> Vec<&EnumDef> {
        let mut out = Vec::new();
        for field in &self.fields {
            field.ty.collect_enums(&mut out);
        }
        if let Some(root) = &self.root {
            root.collect_enums(&mut out);
        }
        out
    }
}
