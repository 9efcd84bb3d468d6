//! Loads an INI file and prints every section.
//!
//! ```text
//! RUST_LOG=debug cargo run --example dump -- path/to/app.conf
//! ```

use ini_directives::{AnnotationRegistry, Loader};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), ini_directives::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "demos/app.conf".to_string());

    let registry = AnnotationRegistry::new().register_fn("split", |raw: &str| {
        raw.split(',').map(|s| s.trim().to_string()).collect()
    });

    let ctx = Loader::builder()
        .with_annotations(Arc::new(registry))
        .load_file(&path)?;

    print!("{ctx}");
    println!(
        "scratch buffers: {} ({} bytes)",
        ctx.scratch().len(),
        ctx.scratch().total_bytes()
    );

    ctx.destroy();
    Ok(())
}
