//! Generates the model codecs into `OUT_DIR`; each model file `include!`s its own.
use std::error::Error;
use std::path::PathBuf;
use std::{env, fs};

/// (model file, record, polymorphic field)
const RECORDS: &[(&str, &str, &str)] = &[
    ("src/blog.rs", "Post", ""),
    ("src/blog.rs", "Author", ""),
    ("src/blog.rs", "Comment", ""),
    ("src/blog.rs", "Article", ""),
    ("src/metrics.rs", "Sample", ""),
    ("src/metrics.rs", "Report", ""),
    ("src/shapes.rs", "Shape", "kind"),
    ("src/shapes.rs", "Circle", ""),
    ("src/shapes.rs", "Rect", ""),
];

fn main() -> Result<(), Box<dyn Error>> {
    println!("cargo::rustc-check-cfg=cfg(rqlgen)");
    let out_dir = PathBuf::from(env::var("OUT_DIR")?);

    for (path, record, poly) in RECORDS {
        println!("cargo::rerun-if-changed={path}");
        let source = fs::read_to_string(path)?;
        let options = rqlgen::Options::new(*record).with_poly_field(*poly);
        let text = rqlgen::generate(&source, &options)?;
        fs::write(out_dir.join(format!("{}_rqlgen.rs", record.to_lowercase())), text)?;
    }
    Ok(())
}
