//! Build script for the storefront crate.
//!
//! Fingerprints the stylesheet so templates can link it under a
//! content-addressed name and it can be cached forever.

use std::env;
use std::fs;
use std::path::Path;

use sha2::{Digest, Sha256};

fn main() {
    let manifest_dir =
        env::var("CARGO_MANIFEST_DIR").expect("CARGO_MANIFEST_DIR must be set by Cargo");
    fingerprint(Path::new(&manifest_dir), "main", "CSS_HASH");
}

/// Hash `static/css/{stem}.css` and copy it to `static/css/derived/{stem}.{hash}.css`.
///
/// Exposes the short hash to the crate as `env!({env_name})`.
fn fingerprint(root: &Path, stem: &str, env_name: &str) {
    let source = root.join("static/css").join(format!("{stem}.css"));
    println!("cargo:rerun-if-changed={}", source.display());

    let content = match fs::read(&source) {
        Ok(content) => content,
        Err(e) => {
            println!("cargo:warning=Could not read {}: {e}", source.display());
            println!("cargo:rustc-env={env_name}=");
            return;
        }
    };

    let digest = format!("{:x}", Sha256::digest(&content));
    let short = digest.get(..8).unwrap_or(&digest);
    println!("cargo:rustc-env={env_name}={short}");

    let derived_dir = root.join("static/css/derived");
    fs::create_dir_all(&derived_dir).expect("Failed to create derived CSS directory");
    fs::copy(&source, derived_dir.join(format!("{stem}.{short}.css")))
        .expect("Failed to copy CSS to derived directory");
}
