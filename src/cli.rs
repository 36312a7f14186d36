//! Minimal CLI: annotated struct → `<stem>_rqlgen.rs`
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// generate a document codec (`impl Codec`) for an annotated struct
#[derive(Parser, Debug)]
#[command(name = "rqlgen", version)]
pub struct CommandLineInterface {
    /// source file declaring the record
    #[arg(long)]
    file: PathBuf,

    /// record type name
    #[arg(long = "type")]
    type_name: String,

    /// polymorphic (discriminator) field name; pass "" for none
    #[arg(long)]
    poly: String,

    /// module path the generated code calls into
    #[arg(long, default_value = rqlgen::DEFAULT_RUNTIME_PATH)]
    runtime_path: String,

    /// skip the rustfmt pass
    #[arg(long, default_value_t = false)]
    no_fmt: bool,

    /// debugging
    #[arg(long)]
    no_op: bool,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }

    pub fn options(&self) -> rqlgen::Options {
        rqlgen::Options::new(&self.type_name)
            .with_poly_field(&self.poly)
            .with_runtime_path(&self.runtime_path)
            .with_format(!self.no_fmt)
    }

    pub fn run(&self) -> anyhow::Result<()> {
        // debug path
        if self.no_op {
            eprintln!("{self:#?}");
            return Ok(());
        }

        let out = rqlgen::generate_file(&self.file, &self.options())
            .with_context(|| format!("generating codec for `{}` from {}", self.type_name, self.file.display()))?;
        println!("{}", out.display());
        Ok(())
    }
}

/// Exit code for a failed run; see [`rqlgen::Error::exit_code`].
pub fn exit_code(error: &anyhow::Error) -> i32 {
    error.downcast_ref::<rqlgen::Error>().map_or(1, rqlgen::Error::exit_code)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn flags_map_onto_options() {
        let cli = CommandLineInterface::parse_from([
            "rqlgen", "--file", "models/shape.rs", "--type", "Shape", "--poly", "kind", "--no-fmt",
        ]);
        assert_eq!(
            cli.options(),
            rqlgen::Options::new("Shape").with_poly_field("kind").with_format(false)
        );
    }

    #[test]
    fn poly_accepts_an_empty_value() {
        let cli = CommandLineInterface::parse_from([
            "rqlgen", "--file", "post.rs", "--type", "Post", "--poly", "", "--runtime-path", "crate::rql",
        ]);
        let options = cli.options();
        assert_eq!(options.poly_field, "");
        assert_eq!(options.runtime_path, "crate::rql");
        assert!(options.format);
    }

    #[test]
    fn poly_is_required() {
        assert!(CommandLineInterface::try_parse_from(["rqlgen", "--file", "a.rs", "--type", "A"]).is_err());
    }
}
