//! Build script for the admin crate.
//!
//! Fingerprints the admin stylesheet for cache-busting.

use std::env;
use std::fs;
use std::path::Path;

use sha2::{Digest, Sha256};

fn main() {
    let manifest_dir =
        env::var("CARGO_MANIFEST_DIR").expect("CARGO_MANIFEST_DIR must be set by Cargo");
    let root = Path::new(&manifest_dir);

    let source = root.join("static/css/admin.css");
    println!("cargo:rerun-if-changed={}", source.display());

    let Ok(content) = fs::read(&source) else {
        println!("cargo:warning=Could not read {}", source.display());
        println!("cargo:rustc-env=ADMIN_CSS_HASH=");
        return;
    };

    let digest = format!("{:x}", Sha256::digest(&content));
    let short = digest.get(..8).unwrap_or(&digest);
    println!("cargo:rustc-env=ADMIN_CSS_HASH={short}");

    let derived_dir = root.join("static/css/derived");
    fs::create_dir_all(&derived_dir).expect("Failed to create derived CSS directory");
    fs::copy(&source, derived_dir.join(format!("admin.{short}.css")))
        .expect("Failed to copy CSS to derived directory");
}
