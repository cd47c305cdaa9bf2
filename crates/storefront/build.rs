//! Fingerprints the storefront stylesheet.
//!
//! `base.html` links `/static/css/derived/main.<hash>.css`, so the CSS can be
//! cached forever and still change on every edit.

use std::path::{Path, PathBuf};
use std::{env, fs, io};

use sha2::{Digest, Sha256};

/// Hex digits of the SHA-256 kept in the file name.
const FINGERPRINT_LEN: usize = 8;

fn main() {
    let crate_dir = PathBuf::from(env::var_os("CARGO_MANIFEST_DIR").unwrap_or_default());
    let source = crate_dir.join("static/css/main.css");
    println!("cargo:rerun-if-changed={}", source.display());

    match fingerprint(&source, &crate_dir.join("static/css/derived")) {
        Ok(hash) => println!("cargo:rustc-env=CSS_HASH={hash}"),
        Err(e) => {
            // Templates still render; the stylesheet link just 404s.
            println!("cargo:warning=stylesheet not fingerprinted: {e}");
            println!("cargo:rustc-env=CSS_HASH=");
        }
    }
}

/// Write `main.<hash>.css` next to the other derived assets and return the hash.
fn fingerprint(source: &Path, out_dir: &Path) -> io::Result<String> {
    let css = fs::read(source)?;
    let mut hash = format!("{:x}", Sha256::digest(&css));
    hash.truncate(FINGERPRINT_LEN);

    fs::create_dir_all(out_dir)?;
    fs::write(out_dir.join(format!("main.{hash}.css")), &css)?;
    Ok(hash)
}
