//! Lowering: `RecordSpec` → `CodecPlan`.
//!
//! Decides, per field, which conversion the generated code performs. Every
//! mismatch between a declared type and its storage kind is reported here, at
//! build time; codegen only renders what this module decided.
use tracing::debug;

use crate::error::StructuralError;
use crate::ir::{ContainerShape, FieldSpec, RecordSpec, ScalarKind, StorageKind, TypeDesc};

#[derive(Debug, Clone, PartialEq)]
pub struct CodecPlan {
    pub type_name: String,
    pub receiver_alias: String,
    pub fields: Vec<FieldPlan>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldPlan {
    pub name: String,
    pub key: String,
    pub declared: TypeDesc,
    pub kind: StorageKind,
    pub optional: bool,
    pub polymorphic: bool,
    /// Drives both the encode and the decode instruction for this field.
    pub step: Step,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Conversion {
    /// Declared type is the canonical runtime type: copy.
    Direct,
    /// Declared type differs: go through `ToCanonical` / `FromCanonical`.
    Checked,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    /// `kind` is never `ScalarKind::Codec`.
    Scalar { kind: ScalarKind, conversion: Conversion },
    Codec,
    ContainerScalar { shape: ContainerShape, kind: ScalarKind, elem: TypeDesc, conversion: Conversion },
    ContainerCodec { shape: ContainerShape, elem: TypeDesc },
}

pub fn lower_record(record: &RecordSpec) -> Result<CodecPlan, StructuralError> {
    let fields = record
        .fields
        .iter()
        .map(|field| lower_field(&record.type_name, field))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(CodecPlan {
        type_name: record.type_name.clone(),
        receiver_alias: record.receiver_alias.clone(),
        fields,
    })
}

fn lower_field(record: &str, field: &FieldSpec) -> Result<FieldPlan, StructuralError> {
    let shape_mismatch = || StructuralError::ShapeMismatch {
        record: record.to_owned(),
        field: field.name.clone(),
        ty: field.declared_type.to_string(),
        kind: field.storage_kind,
    };

    let step = match field.storage_kind {
        StorageKind::Scalar(ScalarKind::Codec) => Step::Codec,
        StorageKind::Scalar(kind) => {
            // scalars only convert between plain named types
            if !matches!(field.declared_type, TypeDesc::Path { .. } | TypeDesc::Unresolved) {
                return Err(shape_mismatch());
            }
            Step::Scalar { kind, conversion: conversion_for(&field.declared_type, kind) }
        }
        StorageKind::Container(shape, kind) => {
            let elem = match (shape, &field.declared_type) {
                (ContainerShape::Array, TypeDesc::Array(elem)) => elem,
                (ContainerShape::Map, TypeDesc::Map { key, value, .. }) => {
                    if !key.is_string() {
                        return Err(StructuralError::MapKey {
                            record: record.to_owned(),
                            field: field.name.clone(),
                            key: key.to_string(),
                        });
                    }
                    value
                }
                (_, TypeDesc::Unresolved) => {
                    return Err(StructuralError::UnresolvedType {
                        record: record.to_owned(),
                        field: field.name.clone(),
                    });
                }
                _ => return Err(shape_mismatch()),
            };
            if !elem.is_resolved() {
                return Err(StructuralError::UnresolvedType {
                    record: record.to_owned(),
                    field: field.name.clone(),
                });
            }
            match kind {
                ScalarKind::Codec => Step::ContainerCodec { shape, elem: (**elem).clone() },
                kind => {
                    if !matches!(**elem, TypeDesc::Path { .. }) {
                        return Err(shape_mismatch());
                    }
                    Step::ContainerScalar {
                        shape,
                        kind,
                        elem: (**elem).clone(),
                        conversion: conversion_for(elem, kind),
                    }
                }
            }
        }
    };

    debug!(record, field = %field.name, key = %field.storage_key, kind = %field.storage_kind, ?step, "lowered field");

    Ok(FieldPlan {
        name: field.name.clone(),
        key: field.storage_key.clone(),
        declared: field.declared_type.clone(),
        kind: field.storage_kind,
        optional: field.optional,
        polymorphic: field.is_polymorphic,
        step,
    })
}

fn conversion_for(declared: &TypeDesc, kind: ScalarKind) -> Conversion {
    if declared.matches_canonical(kind) { Conversion::Direct } else { Conversion::Checked }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::build_record_from_source;
    use pretty_assertions::assert_eq;

    fn lower(source: &str, type_name: &str) -> Result<CodecPlan, StructuralError> {
        let record = build_record_from_source(source, type_name, "").unwrap();
        lower_record(&record)
    }

    fn steps(source: &str, type_name: &str) -> Vec<Step> {
        lower(source, type_name).unwrap().fields.into_iter().map(|f| f.step).collect()
    }

    #[test]
    fn scalars_copy_when_the_declared_type_is_canonical() {
        let source = r#"
            struct S {
                #[cfg_attr(rqlgen, rqlgen = "string")] a: String,
                #[cfg_attr(rqlgen, rqlgen = "number")] b: f64,
                #[cfg_attr(rqlgen, rqlgen = "number")] c: i32,
                #[cfg_attr(rqlgen, rqlgen = "time")] d: DateTime<Utc>,
                #[cfg_attr(rqlgen, rqlgen = "time")] e: NaiveDateTime,
                #[cfg_attr(rqlgen, rqlgen = "bool")] f: (bool,),
            }
        "#;
        assert_eq!(
            steps(source, "S"),
            vec![
                Step::Scalar { kind: ScalarKind::String, conversion: Conversion::Direct },
                Step::Scalar { kind: ScalarKind::Number, conversion: Conversion::Direct },
                Step::Scalar { kind: ScalarKind::Number, conversion: Conversion::Checked },
                Step::Scalar { kind: ScalarKind::Time, conversion: Conversion::Direct },
                Step::Scalar { kind: ScalarKind::Time, conversion: Conversion::Checked },
                Step::Scalar { kind: ScalarKind::Bool, conversion: Conversion::Checked },
            ]
        );
    }

    #[test]
    fn containers_carry_their_element_type() {
        let source = r#"
            struct S {
                #[cfg_attr(rqlgen, rqlgen = "array_string")] a: Vec<String>,
                #[cfg_attr(rqlgen, rqlgen = "map_number")] b: HashMap<String, u32>,
                #[cfg_attr(rqlgen, rqlgen = "array_rql")] c: Vec<Comment>,
                #[cfg_attr(rqlgen, rqlgen = "map_rql")] d: BTreeMap<String, Option<Comment>>,
            }
        "#;
        assert_eq!(
            steps(source, "S"),
            vec![
                Step::ContainerScalar {
                    shape: ContainerShape::Array,
                    kind: ScalarKind::String,
                    elem: TypeDesc::named("String"),
                    conversion: Conversion::Direct,
                },
                Step::ContainerScalar {
                    shape: ContainerShape::Map,
                    kind: ScalarKind::Number,
                    elem: TypeDesc::named("u32"),
                    conversion: Conversion::Checked,
                },
                Step::ContainerCodec { shape: ContainerShape::Array, elem: TypeDesc::named("Comment") },
                Step::ContainerCodec {
                    shape: ContainerShape::Map,
                    elem: TypeDesc::Pointer {
                        kind: crate::ir::PointerKind::Option,
                        inner: Box::new(TypeDesc::named("Comment")),
                    },
                },
            ]
        );
    }

    #[test]
    fn container_kinds_need_container_types() {
        let source = r#"struct S { #[cfg_attr(rqlgen, rqlgen = "map_string")] a: Vec<String> }"#;
        assert_eq!(
            lower(source, "S"),
            Err(StructuralError::ShapeMismatch {
                record: "S".into(),
                field: "a".into(),
                ty: "Vec<String>".into(),
                kind: StorageKind::Container(ContainerShape::Map, ScalarKind::String),
            })
        );
        let source = r#"struct S { #[cfg_attr(rqlgen, rqlgen = "string")] a: Vec<String> }"#;
        assert!(matches!(lower(source, "S"), Err(StructuralError::ShapeMismatch { .. })));
        let source = r#"struct S { #[cfg_attr(rqlgen, rqlgen = "array_number")] a: Vec<Option<i32>> }"#;
        assert!(matches!(lower(source, "S"), Err(StructuralError::ShapeMismatch { .. })));
    }

    #[test]
    fn map_keys_must_be_strings() {
        let source = r#"struct S { #[cfg_attr(rqlgen, rqlgen = "map_bool")] a: HashMap<u32, bool> }"#;
        assert_eq!(
            lower(source, "S"),
            Err(StructuralError::MapKey { record: "S".into(), field: "a".into(), key: "u32".into() })
        );
    }

    #[test]
    fn unresolved_element_types_fail_the_build() {
        let source = r#"struct S { #[cfg_attr(rqlgen, rqlgen = "array_number")] a: Vec<(i32, i32)> }"#;
        assert_eq!(
            lower(source, "S"),
            Err(StructuralError::UnresolvedType { record: "S".into(), field: "a".into() })
        );
    }

    #[test]
    fn unresolved_scalars_are_checked_and_nested_codecs_accept_anything() {
        let source = r#"
            struct S {
                #[cfg_attr(rqlgen, rqlgen = "number")] a: (i32, i32),
                #[cfg_attr(rqlgen, rqlgen = "rql")] b: Option<Box<S>>,
            }
        "#;
        assert_eq!(
            steps(source, "S"),
            vec![Step::Scalar { kind: ScalarKind::Number, conversion: Conversion::Checked }, Step::Codec]
        );
    }
}
