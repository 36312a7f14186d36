use thiserror::Error;

/// Failure of a generated `encode`/`decode`. Every variant names the record
/// type so the message is actionable without a debugger.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    /// The tree (or a container inside it) has the wrong shape.
    #[error("can't decode {record}{}: expected {expected}, found {found}", field_suffix(.field))]
    TypeMismatch { record: String, field: Option<String>, expected: String, found: String },

    /// A required storage key is absent from the tree.
    #[error("not found field: {key} ({record})")]
    MissingField { record: String, key: String },

    /// A value is present but cannot be converted to the declared type.
    #[error("can't convert {from} to {to} ({record}.{field})")]
    Conversion { from: String, to: String, record: String, field: String },
}

impl CodecError {
    pub fn type_mismatch(
        record: impl Into<String>,
        field: Option<&str>,
        expected: impl Into<String>,
        found: impl Into<String>,
    ) -> Self {
        CodecError::TypeMismatch {
            record: record.into(),
            field: field.map(str::to_owned),
            expected: expected.into(),
            found: found.into(),
        }
    }

    pub fn missing_field(record: impl Into<String>, key: impl Into<String>) -> Self {
        CodecError::MissingField { record: record.into(), key: key.into() }
    }

    pub fn conversion(
        from: impl Into<String>,
        to: impl Into<String>,
        record: impl Into<String>,
        field: impl Into<String>,
    ) -> Self {
        CodecError::Conversion { from: from.into(), to: to.into(), record: record.into(), field: field.into() }
    }
}

fn field_suffix(field: &Option<String>) -> String {
    field.as_ref().map(|f| format!(".{f}")).unwrap_or_default()
}
