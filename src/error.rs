use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::ir::StorageKind;

/// The record model cannot be built (or cannot be lowered to codecs).
/// Generation stops at the first one of these; nothing is written.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StructuralError {
    #[error("not found target struct `{0}`")]
    NotFound(String),

    #[error("target `{0}` isn't a struct")]
    NotAStruct(String),

    #[error("target `{0}` is a tuple struct, named fields are required")]
    TupleStruct(String),

    #[error("target `{0}` has generic parameters")]
    Generic(String),

    #[error("please, set a correct storage kind for {record}.{field}")]
    MissingKind { record: String, field: String },

    #[error("unknown storage kind `{value}` for {record}.{field}")]
    InvalidKind { record: String, field: String, value: String },

    #[error("malformed storage annotation `{value}` for {record}.{field}")]
    InvalidStorage { record: String, field: String, value: String },

    #[error("annotation `{name}` on {record}.{field} must be a string literal")]
    NonStringAnnotation { record: String, field: String, name: String },

    #[error("storage key `{key}` is used by both {record}.{first} and {record}.{second}")]
    DuplicateKey { record: String, key: String, first: String, second: String },

    #[error("declared type `{ty}` of {record}.{field} cannot hold storage kind `{kind}`")]
    ShapeMismatch { record: String, field: String, ty: String, kind: StorageKind },

    #[error("map keys of {record}.{field} must be String, found `{key}`")]
    MapKey { record: String, field: String, key: String },

    #[error("cannot resolve the declared type of {record}.{field}")]
    UnresolvedType { record: String, field: String },
}

/// Everything that can stop a generation run.
#[derive(Debug, Error)]
pub enum Error {
    #[error("unable to open file {}: {source}", .path.display())]
    Read { path: PathBuf, source: io::Error },

    #[error("unable to parse file: {0}")]
    Parse(#[from] syn::Error),

    #[error("unable to build model: {0}")]
    Structural(#[from] StructuralError),

    #[error("invalid runtime path `{0}`")]
    RuntimePath(String),

    #[error("unable to create file {}: {source}", .path.display())]
    Write { path: PathBuf, source: io::Error },
}

impl Error {
    /// Process exit code: 1 source unreadable or unparsable, 2 model, 3 output.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::Read { .. } | Error::Parse(_) => 1,
            Error::Structural(_) | Error::RuntimePath(_) => 2,
            Error::Write { .. } => 3,
        }
    }
}
