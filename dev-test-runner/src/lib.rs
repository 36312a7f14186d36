//! Models whose codecs are generated by `build.rs`, exercised from `tests/`.
pub mod blog;
pub mod metrics;
pub mod shapes;
