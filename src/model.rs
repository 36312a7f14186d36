//! Record model builder: one annotated `struct` → [`RecordSpec`].
//!
//! Annotations are name-value attributes, either bare or behind a `cfg_attr`
//! so the annotated source compiles without a helper derive:
//!
//! ```text
//! #[cfg_attr(rqlgen, rethink = "tags,omitempty", rqlgen = "array_string")]
//! pub tags: Vec<String>,
//! ```
use once_cell::sync::Lazy;
use quote::ToTokens;
use regex::Regex;
use syn::ext::IdentExt;
use syn::punctuated::Punctuated;
use syn::{Attribute, Expr, ExprLit, Fields, GenericArgument, Item, Lit, Meta, MetaNameValue, PathArguments, Token, Type};
use tracing::{debug, warn};

use crate::error::{Error, StructuralError};
use crate::ir::{FieldSpec, PointerKind, RecordSpec, StorageKind, TypeDesc, UnknownKind};

/// Storage annotation: `key[,omitempty]`.
pub const STORAGE_ATTR: &str = "rethink";
/// Kind annotation: one of the closed storage kinds.
pub const KIND_ATTR: &str = "rqlgen";

// 1st capture = key, 2nd capture (if any) = tolerate absence
static STORAGE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([A-Za-z0-9_-]*),?(omitempty)?[A-Za-z0-9_,-]*$").expect("storage annotation pattern")
});

// ————————————————————————————————————————————————————————————————————————————
// ENTRY POINTS
// ————————————————————————————————————————————————————————————————————————————

pub fn build_record_from_source(source: &str, type_name: &str, poly_field: &str) -> Result<RecordSpec, Error> {
    let file = syn::parse_file(source)?;
    Ok(build_record(&file, type_name, poly_field)?)
}

/// Build the model of `type_name`. `poly_field` names the discriminator field
/// whose decoding triggers the `Polymorphic` hook; empty means none.
pub fn build_record(file: &syn::File, type_name: &str, poly_field: &str) -> Result<RecordSpec, StructuralError> {
    let item = find_item(&file.items, type_name)
        .ok_or_else(|| StructuralError::NotFound(type_name.to_owned()))?;
    let Item::Struct(item) = item else {
        return Err(StructuralError::NotAStruct(type_name.to_owned()));
    };
    if !item.generics.params.is_empty() {
        return Err(StructuralError::Generic(type_name.to_owned()));
    }

    let declared: Vec<&syn::Field> = match &item.fields {
        Fields::Named(named) => named.named.iter().collect(),
        Fields::Unit => Vec::new(),
        Fields::Unnamed(_) => return Err(StructuralError::TupleStruct(type_name.to_owned())),
    };

    let mut fields: Vec<FieldSpec> = Vec::with_capacity(declared.len());
    for field in declared {
        let spec = read_field(type_name, field, poly_field)?;
        if let Some(first) = fields.iter().find(|f| f.storage_key == spec.storage_key) {
            return Err(StructuralError::DuplicateKey {
                record: type_name.to_owned(),
                key: spec.storage_key,
                first: first.name.clone(),
                second: spec.name,
            });
        }
        fields.push(spec);
    }

    let record = RecordSpec::new(type_name, fields);
    if !poly_field.is_empty() && record.polymorphic_field().is_none() {
        warn!(record = type_name, poly_field, "polymorphic field not found; no hook will be emitted");
    }
    debug!(record = %record.type_name, fields = record.fields.len(), "built record model");
    Ok(record)
}

// ————————————————————————————————————————————————————————————————————————————
// FIELDS
// ————————————————————————————————————————————————————————————————————————————

fn read_field(record: &str, field: &syn::Field, poly_field: &str) -> Result<FieldSpec, StructuralError> {
    let name = field.ident.as_ref().map(|ident| ident.unraw().to_string()).unwrap_or_default();
    let annotations = Annotations::read(record, &name, &field.attrs)?;

    let (storage_key, optional) = match &annotations.storage {
        Some(raw) => parse_storage(record, &name, raw)?,
        // no storage annotation: the key is the field name
        None => (name.clone(), false),
    };

    let kind = annotations.kind.ok_or_else(|| StructuralError::MissingKind {
        record: record.to_owned(),
        field: name.clone(),
    })?;
    let storage_kind = kind.parse::<StorageKind>().map_err(|UnknownKind(value)| StructuralError::InvalidKind {
        record: record.to_owned(),
        field: name.clone(),
        value,
    })?;

    let declared_type = resolve_type(&field.ty);
    if !declared_type.is_resolved() {
        warn!(
            record,
            field = %name,
            ty = %field.ty.to_token_stream(),
            "unresolved declared type"
        );
    }

    Ok(FieldSpec {
        is_polymorphic: name == poly_field,
        name,
        storage_key,
        declared_type,
        storage_kind,
        optional,
    })
}

fn parse_storage(record: &str, field: &str, raw: &str) -> Result<(String, bool), StructuralError> {
    let caps = STORAGE_RE.captures(raw).ok_or_else(|| StructuralError::InvalidStorage {
        record: record.to_owned(),
        field: field.to_owned(),
        value: raw.to_owned(),
    })?;
    let key = caps.get(1).map_or("", |m| m.as_str());
    let optional = caps.get(2).is_some_and(|m| !m.as_str().is_empty());
    let key = if key.is_empty() { field.to_owned() } else { key.to_owned() };
    Ok((key, optional))
}

#[derive(Debug, Default)]
struct Annotations {
    storage: Option<String>,
    kind: Option<String>,
}

impl Annotations {
    fn read(record: &str, field: &str, attrs: &[Attribute]) -> Result<Self, StructuralError> {
        let mut out = Annotations::default();
        for nv in attrs.iter().flat_map(name_values) {
            let slot = if nv.path.is_ident(STORAGE_ATTR) {
                &mut out.storage
            } else if nv.path.is_ident(KIND_ATTR) {
                &mut out.kind
            } else {
                continue;
            };
            match &nv.value {
                Expr::Lit(ExprLit { lit: Lit::Str(lit), .. }) => *slot = Some(lit.value()),
                _ => {
                    return Err(StructuralError::NonStringAnnotation {
                        record: record.to_owned(),
                        field: field.to_owned(),
                        name: nv.path.to_token_stream().to_string(),
                    });
                }
            }
        }
        Ok(out)
    }
}

/// Name-value metas carried by an attribute, looking through `cfg_attr(pred, ...)`.
fn name_values(attr: &Attribute) -> Vec<MetaNameValue> {
    match &attr.meta {
        Meta::NameValue(nv) => vec![nv.clone()],
        Meta::List(list) if list.path.is_ident("cfg_attr") => list
            .parse_args_with(Punctuated::<Meta, Token![,]>::parse_terminated)
            .map(|metas| {
                metas
                    .into_iter()
                    .skip(1) // predicate
                    .filter_map(|meta| match meta {
                        Meta::NameValue(nv) => Some(nv),
                        _ => None,
                    })
                    .collect()
            })
            .unwrap_or_default(),
        _ => Vec::new(),
    }
}

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// Resolve a field's type expression. Anything we do not understand (tuples, arrays,
/// fn pointers, trait objects, macros) becomes [`TypeDesc::Unresolved`].
pub fn resolve_type(ty: &Type) -> TypeDesc {
    match ty {
        Type::Path(path) if path.qself.is_none() => resolve_path(&path.path),
        Type::Reference(r) => TypeDesc::Pointer { kind: PointerKind::Ref, inner: Box::new(resolve_type(&r.elem)) },
        Type::Paren(p) => resolve_type(&p.elem),
        Type::Group(g) => resolve_type(&g.elem),
        _ => TypeDesc::Unresolved,
    }
}

fn resolve_path(path: &syn::Path) -> TypeDesc {
    let Some(last) = path.segments.last() else {
        return TypeDesc::Unresolved;
    };
    let segments: Vec<String> = path.segments.iter().map(|s| s.ident.to_string()).collect();
    let mut args: Vec<TypeDesc> = match &last.arguments {
        PathArguments::None => Vec::new(),
        PathArguments::AngleBracketed(angle) => angle
            .args
            .iter()
            .filter_map(|arg| match arg {
                GenericArgument::Type(ty) => Some(resolve_type(ty)),
                _ => None, // lifetimes, consts, bindings
            })
            .collect(),
        PathArguments::Parenthesized(_) => return TypeDesc::Unresolved,
    };

    match (last.ident.to_string().as_str(), args.len()) {
        ("Vec", 1) => TypeDesc::Array(Box::new(args.remove(0))),
        ("HashMap" | "BTreeMap" | "IndexMap", 2) => {
            let value = args.remove(1);
            let key = args.remove(0);
            TypeDesc::Map { container: segments, key: Box::new(key), value: Box::new(value) }
        }
        ("Box", 1) => TypeDesc::Pointer { kind: PointerKind::Box, inner: Box::new(args.remove(0)) },
        ("Option", 1) => TypeDesc::Pointer { kind: PointerKind::Option, inner: Box::new(args.remove(0)) },
        _ => TypeDesc::Path { segments, args },
    }
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

/// Find the item named `name` at top level or inside inline modules.
fn find_item<'a>(items: &'a [Item], name: &str) -> Option<&'a Item> {
    for item in items {
        if item_ident(item).is_some_and(|ident| ident == name) {
            return Some(item);
        }
        if let Item::Mod(module) = item {
            if let Some((_, inner)) = &module.content {
                if let Some(found) = find_item(inner, name) {
                    return Some(found);
                }
            }
        }
    }
    None
}

fn item_ident(item: &Item) -> Option<&syn::Ident> {
    match item {
        Item::Struct(s) => Some(&s.ident),
        Item::Enum(e) => Some(&e.ident),
        Item::Union(u) => Some(&u.ident),
        Item::Type(t) => Some(&t.ident),
        Item::Trait(t) => Some(&t.ident),
        Item::Fn(f) => Some(&f.sig.ident),
        Item::Const(c) => Some(&c.ident),
        Item::Static(s) => Some(&s.ident),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{ContainerShape, ScalarKind};
    use pretty_assertions::assert_eq;

    fn build(source: &str, type_name: &str, poly: &str) -> Result<RecordSpec, StructuralError> {
        let file = syn::parse_file(source).unwrap();
        build_record(&file, type_name, poly)
    }

    const POST: &str = r#"
        pub struct Post {
            #[cfg_attr(rqlgen, rethink = "name", rqlgen = "string")]
            pub name: String,
            #[cfg_attr(rqlgen, rethink = "tags,omitempty", rqlgen = "array_string")]
            pub tags: Vec<String>,
            #[rethink = "author"]
            #[rqlgen = "rql"]
            pub author: Option<Box<Author>>,
            #[cfg_attr(rqlgen, rethink = "kind", rqlgen = "string")]
            pub r#type: String,
        }
    "#;

    #[test]
    fn reads_keys_kinds_and_optionality() {
        let record = build(POST, "Post", "type").unwrap();
        assert_eq!(record.type_name, "Post");
        assert_eq!(record.receiver_alias, "p");

        let summary: Vec<_> = record
            .fields
            .iter()
            .map(|f| (f.name.as_str(), f.storage_key.as_str(), f.storage_kind.to_string(), f.optional, f.is_polymorphic))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("name", "name", "string".to_owned(), false, false),
                ("tags", "tags", "array_string".to_owned(), true, false),
                ("author", "author", "rql".to_owned(), false, false),
                ("type", "kind", "string".to_owned(), false, true),
            ]
        );
        assert_eq!(
            record.fields[1].storage_kind,
            StorageKind::Container(ContainerShape::Array, ScalarKind::String)
        );
        assert_eq!(record.fields[2].declared_type.to_string(), "Option<Box<Author>>");
    }

    #[test]
    fn missing_kind_names_the_field() {
        let source = r#"struct A { #[cfg_attr(rqlgen, rethink = "x")] x: i32 }"#;
        assert_eq!(
            build(source, "A", ""),
            Err(StructuralError::MissingKind { record: "A".into(), field: "x".into() })
        );
    }

    #[test]
    fn kinds_outside_the_closed_set_are_rejected() {
        let source = r#"struct A { #[cfg_attr(rqlgen, rethink = "x", rqlgen = "array_int")] x: Vec<i32> }"#;
        assert_eq!(
            build(source, "A", ""),
            Err(StructuralError::InvalidKind { record: "A".into(), field: "x".into(), value: "array_int".into() })
        );
    }

    #[test]
    fn malformed_storage_annotation_is_rejected() {
        let source = r#"struct A { #[cfg_attr(rqlgen, rethink = "a key", rqlgen = "string")] x: String }"#;
        assert!(matches!(build(source, "A", ""), Err(StructuralError::InvalidStorage { .. })));
    }

    #[test]
    fn empty_key_falls_back_to_the_field_name() {
        let source = r#"struct A { #[cfg_attr(rqlgen, rethink = ",omitempty", rqlgen = "bool")] on: bool }"#;
        let record = build(source, "A", "").unwrap();
        assert_eq!(record.fields[0].storage_key, "on");
        assert!(record.fields[0].optional);
    }

    #[test]
    fn target_must_be_a_struct_with_named_fields() {
        assert_eq!(build("struct A;", "B", ""), Err(StructuralError::NotFound("B".into())));
        assert_eq!(build("enum B { X }", "B", ""), Err(StructuralError::NotAStruct("B".into())));
        assert_eq!(build("struct C(i32);", "C", ""), Err(StructuralError::TupleStruct("C".into())));
        assert_eq!(build("struct D;", "D", "").unwrap().fields, vec![]);
        assert_eq!(build("struct E<T> { t: T }", "E", ""), Err(StructuralError::Generic("E".into())));
    }

    #[test]
    fn finds_structs_inside_inline_modules() {
        let source = r#"mod models { pub struct Inner { #[cfg_attr(rqlgen, rqlgen = "number")] n: u8 } }"#;
        let record = build(source, "Inner", "").unwrap();
        assert_eq!(record.fields[0].storage_key, "n");
    }

    #[test]
    fn duplicate_storage_keys_are_rejected() {
        let source = r#"
            struct A {
                #[cfg_attr(rqlgen, rethink = "k", rqlgen = "string")] a: String,
                #[cfg_attr(rqlgen, rethink = "k", rqlgen = "string")] b: String,
            }
        "#;
        assert_eq!(
            build(source, "A", ""),
            Err(StructuralError::DuplicateKey {
                record: "A".into(),
                key: "k".into(),
                first: "a".into(),
                second: "b".into(),
            })
        );
    }

    #[test]
    fn resolves_type_expressions_structurally() {
        let resolve = |src: &str| resolve_type(&syn::parse_str::<Type>(src).unwrap()).to_string();
        assert_eq!(resolve("i32"), "i32");
        assert_eq!(resolve("chrono::DateTime<chrono::Utc>"), "chrono::DateTime<chrono::Utc>");
        assert_eq!(resolve("std::collections::HashMap<String, Vec<u8>>"), "std::collections::HashMap<String, Vec<u8>>");
        assert_eq!(resolve("&'a str"), "&str");
        assert_eq!(resolve("(i32, i32)"), "");
        assert_eq!(resolve("Box<dyn Fn()>"), "Box<>");

        let map = resolve_type(&syn::parse_str::<Type>("BTreeMap<String, f64>").unwrap());
        let TypeDesc::Map { key, value, .. } = map else { panic!("expected a map") };
        assert!(key.is_string());
        assert_eq!(*value, TypeDesc::named("f64"));
    }
}
