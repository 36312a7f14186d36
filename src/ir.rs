// Strongly-typed record model for codec generation. No syn here.
use std::fmt;
use std::str::FromStr;

// ————————————————————————————————————————————————————————————————————————————
// STORAGE KINDS
// ————————————————————————————————————————————————————————————————————————————

/// Element-level storage kind. `Codec` is the nested-record kind (`rql`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    String,
    Number,
    Bool,
    Time,
    Codec,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContainerShape {
    Array,
    Map,
}

/// How a field is represented in the untyped tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageKind {
    Scalar(ScalarKind),
    Container(ContainerShape, ScalarKind),
}

/// The annotation value is not one of the closed set of kinds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownKind(pub String);

impl ScalarKind {
    /// The annotation spelling (`number`, `rql`, ...).
    pub fn name(self) -> &'static str {
        match self {
            ScalarKind::String => "string",
            ScalarKind::Number => "number",
            ScalarKind::Bool => "bool",
            ScalarKind::Time => "time",
            ScalarKind::Codec => "rql",
        }
    }

    /// Runtime type table: the canonical in-tree representation of a scalar kind.
    /// Nested codecs have no scalar representation.
    pub fn canonical(self) -> Option<&'static str> {
        match self {
            ScalarKind::String => Some("String"),
            ScalarKind::Number => Some("f64"),
            ScalarKind::Bool => Some("bool"),
            ScalarKind::Time => Some("DateTime<Utc>"),
            ScalarKind::Codec => None,
        }
    }

    fn from_name(s: &str) -> Option<Self> {
        match s {
            "string" => Some(ScalarKind::String),
            "number" => Some(ScalarKind::Number),
            "bool" => Some(ScalarKind::Bool),
            "time" => Some(ScalarKind::Time),
            "rql" => Some(ScalarKind::Codec),
            _ => None,
        }
    }
}

impl ContainerShape {
    pub fn name(self) -> &'static str {
        match self {
            ContainerShape::Array => "array",
            ContainerShape::Map => "map",
        }
    }
}

impl FromStr for StorageKind {
    type Err = UnknownKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let unknown = || UnknownKind(s.to_owned());
        if let Some(kind) = ScalarKind::from_name(s) {
            return Ok(StorageKind::Scalar(kind));
        }
        let (shape, elem) = s.split_once('_').ok_or_else(unknown)?;
        let shape = match shape {
            "array" => ContainerShape::Array,
            "map" => ContainerShape::Map,
            _ => return Err(unknown()),
        };
        let elem = ScalarKind::from_name(elem).ok_or_else(unknown)?;
        Ok(StorageKind::Container(shape, elem))
    }
}

impl fmt::Display for StorageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageKind::Scalar(kind) => f.write_str(kind.name()),
            StorageKind::Container(shape, kind) => write!(f, "{}_{}", shape.name(), kind.name()),
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// DECLARED TYPES
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerKind {
    Box,
    Option,
    Ref,
}

/// Declared type of a field, resolved from its type expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeDesc {
    /// Plain or qualified name with optional generic arguments: `i32`, `chrono::DateTime<Utc>`.
    Path { segments: Vec<String>, args: Vec<TypeDesc> },
    Pointer { kind: PointerKind, inner: Box<TypeDesc> },
    /// `Vec<T>`
    Array(Box<TypeDesc>),
    /// `HashMap<K, V>`, `BTreeMap<K, V>`, `IndexMap<K, V>` (container path kept verbatim)
    Map { container: Vec<String>, key: Box<TypeDesc>, value: Box<TypeDesc> },
    /// Type expression we could not resolve. Renders as the empty string.
    Unresolved,
}

impl TypeDesc {
    pub fn named(name: &str) -> Self {
        TypeDesc::Path { segments: name.split("::").map(str::to_owned).collect(), args: Vec::new() }
    }

    pub fn is_resolved(&self) -> bool {
        match self {
            TypeDesc::Unresolved => false,
            TypeDesc::Path { args, .. } => args.iter().all(TypeDesc::is_resolved),
            TypeDesc::Pointer { inner, .. } | TypeDesc::Array(inner) => inner.is_resolved(),
            TypeDesc::Map { key, value, .. } => key.is_resolved() && value.is_resolved(),
        }
    }

    fn last_segment(&self) -> Option<&str> {
        match self {
            TypeDesc::Path { segments, .. } => segments.last().map(String::as_str),
            _ => None,
        }
    }

    /// Whether this declared type already is the canonical runtime type of `kind`.
    pub fn matches_canonical(&self, kind: ScalarKind) -> bool {
        let TypeDesc::Path { args, .. } = self else {
            return false;
        };
        let last = self.last_segment();
        match kind {
            ScalarKind::String => last == Some("String") && args.is_empty(),
            ScalarKind::Number => last == Some("f64"),
            ScalarKind::Bool => last == Some("bool"),
            ScalarKind::Time => {
                last == Some("DateTime") && args.len() == 1 && args[0].last_segment() == Some("Utc")
            }
            ScalarKind::Codec => false,
        }
    }

    pub fn is_string(&self) -> bool {
        self.matches_canonical(ScalarKind::String)
    }
}

impl fmt::Display for TypeDesc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeDesc::Path { segments, args } => {
                f.write_str(&segments.join("::"))?;
                write_args(f, args)
            }
            TypeDesc::Pointer { kind: PointerKind::Box, inner } => write!(f, "Box<{inner}>"),
            TypeDesc::Pointer { kind: PointerKind::Option, inner } => write!(f, "Option<{inner}>"),
            TypeDesc::Pointer { kind: PointerKind::Ref, inner } => write!(f, "&{inner}"),
            TypeDesc::Array(inner) => write!(f, "Vec<{inner}>"),
            TypeDesc::Map { container, key, value } => {
                write!(f, "{}<{key}, {value}>", container.join("::"))
            }
            TypeDesc::Unresolved => Ok(()),
        }
    }
}

fn write_args(f: &mut fmt::Formatter<'_>, args: &[TypeDesc]) -> fmt::Result {
    if args.is_empty() {
        return Ok(());
    }
    f.write_str("<")?;
    for (ix, arg) in args.iter().enumerate() {
        if ix > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{arg}")?;
    }
    f.write_str(">")
}

// ————————————————————————————————————————————————————————————————————————————
// RECORDS
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    pub name: String,
    pub storage_key: String,
    pub declared_type: TypeDesc,
    pub storage_kind: StorageKind,
    pub optional: bool,
    pub is_polymorphic: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecordSpec {
    pub type_name: String,
    pub receiver_alias: String,
    pub fields: Vec<FieldSpec>, // declaration order == emission order
}

impl RecordSpec {
    pub fn new(type_name: impl Into<String>, fields: Vec<FieldSpec>) -> Self {
        let type_name = type_name.into();
        let receiver_alias = receiver_alias(&type_name);
        RecordSpec { type_name, receiver_alias, fields }
    }

    pub fn polymorphic_field(&self) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.is_polymorphic)
    }
}

/// First character of the type name, lower-cased. Falls back to `r` when that
/// character cannot start a binding (`_Foo` would give the wildcard pattern).
pub fn receiver_alias(type_name: &str) -> String {
    match type_name.chars().next() {
        Some(c) if c.is_ascii_alphabetic() => c.to_ascii_lowercase().to_string(),
        _ => "r".to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_the_closed_kind_set() {
        assert_eq!("number".parse::<StorageKind>(), Ok(StorageKind::Scalar(ScalarKind::Number)));
        assert_eq!("rql".parse::<StorageKind>(), Ok(StorageKind::Scalar(ScalarKind::Codec)));
        assert_eq!(
            "array_rql".parse::<StorageKind>(),
            Ok(StorageKind::Container(ContainerShape::Array, ScalarKind::Codec))
        );
        assert_eq!(
            "map_time".parse::<StorageKind>(),
            Ok(StorageKind::Container(ContainerShape::Map, ScalarKind::Time))
        );
        assert_eq!("array_array_string".parse::<StorageKind>(), Err(UnknownKind("array_array_string".into())));
        assert_eq!("set_string".parse::<StorageKind>(), Err(UnknownKind("set_string".into())));
        assert_eq!("".parse::<StorageKind>(), Err(UnknownKind(String::new())));
    }

    #[test]
    fn kind_display_is_the_annotation_spelling() {
        for raw in ["string", "time", "map_bool", "array_number", "map_rql"] {
            let kind: StorageKind = raw.parse().unwrap();
            assert_eq!(kind.to_string(), raw);
        }
    }

    #[test]
    fn canonical_matching_uses_the_last_segment() {
        let utc = TypeDesc::Path {
            segments: vec!["chrono".into(), "DateTime".into()],
            args: vec![TypeDesc::named("chrono::Utc")],
        };
        assert!(utc.matches_canonical(ScalarKind::Time));
        assert_eq!(utc.to_string(), "chrono::DateTime<chrono::Utc>");
        assert!(TypeDesc::named("std::string::String").matches_canonical(ScalarKind::String));
        assert!(!TypeDesc::named("i32").matches_canonical(ScalarKind::Number));
        assert!(!TypeDesc::Unresolved.matches_canonical(ScalarKind::Bool));
    }

    #[test]
    fn receiver_alias_is_lowercased_initial() {
        assert_eq!(receiver_alias("Post"), "p");
        assert_eq!(receiver_alias("_Hidden"), "r");
    }
}
