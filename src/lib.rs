//! Build-time codec generator for annotated record structs.
//!
//! ```text
//! source file ──model──▶ RecordSpec ──lower──▶ CodecPlan ──codegen──▶ impl Codec for <Record>
//! ```
//!
//! The generated impl converts the record to and from a [`runtime::Datum`]
//! tree, the in-memory form of a document-store row. Call [`generate`] from a
//! `build.rs`, or run the `rqlgen` binary next to the source file.
use std::path::{Path, PathBuf};

use tracing::info;

pub mod codegen;
pub mod emit;
pub mod error;
pub mod ir;
pub mod lower;
pub mod model;
pub mod runtime;

pub use error::{Error, StructuralError};

/// Module path the generated code calls into unless told otherwise.
pub const DEFAULT_RUNTIME_PATH: &str = "::rqlgen::runtime";

// ————————————————————————————————————————————————————————————————————————————
// CONFIGURATION
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    /// Record to generate for.
    pub type_name: String,
    /// Discriminator field whose decoding triggers `Polymorphic::mutate`.
    /// Empty means none.
    pub poly_field: String,
    pub runtime_path: String,
    /// Run `rustfmt` over written files.
    pub format: bool,
}

impl Options {
    pub fn new(type_name: impl Into<String>) -> Self {
        Options {
            type_name: type_name.into(),
            poly_field: String::new(),
            runtime_path: DEFAULT_RUNTIME_PATH.to_owned(),
            format: true,
        }
    }

    pub fn with_poly_field(mut self, poly_field: impl Into<String>) -> Self {
        self.poly_field = poly_field.into();
        self
    }

    pub fn with_runtime_path(mut self, runtime_path: impl Into<String>) -> Self {
        self.runtime_path = runtime_path.into();
        self
    }

    pub fn with_format(mut self, format: bool) -> Self {
        self.format = format;
        self
    }
}

// ————————————————————————————————————————————————————————————————————————————
// ENTRY POINTS
// ————————————————————————————————————————————————————————————————————————————

/// Generate the codec source for `options.type_name` declared in `source`.
pub fn generate(source: &str, options: &Options) -> Result<String, Error> {
    let runtime = syn::parse_str::<syn::Path>(&options.runtime_path)
        .map_err(|_| Error::RuntimePath(options.runtime_path.clone()))?;

    let record = model::build_record_from_source(source, &options.type_name, &options.poly_field)?;
    let plan = lower::lower_record(&record)?;

    let mut cg = codegen::Codegen::new(runtime);
    cg.emit(&plan)?;
    Ok(cg.into_string())
}

/// Generate from the file at `source_path` and write `<stem>_rqlgen.rs`
/// beside it. Returns the written path.
pub fn generate_file(source_path: &Path, options: &Options) -> Result<PathBuf, Error> {
    let source = std::fs::read_to_string(source_path).map_err(|source| Error::Read {
        path: source_path.to_path_buf(),
        source,
    })?;
    let text = generate(&source, options)?;

    let out = emit::output_path(source_path);
    emit::write_output(&out, &text)?;
    if options.format {
        emit::format_file(&out);
    }
    info!(record = %options.type_name, out = %out.display(), "wrote codec");
    Ok(out)
}
