use std::path::Path;

// shared::config::load_config looks for config.toml beside the binary
fn main() {
    let manifest_dir = Path::new(env!("CARGO_MANIFEST_DIR"));
    let config = manifest_dir.join("../../config.toml");
    println!("cargo:rerun-if-changed={}", config.display());
    if !config.exists() {
        return;
    }

    // OUT_DIR = target/<profile>/build/<pkg>-<hash>/out
    let out_dir = std::env::var("OUT_DIR").unwrap_or_default();
    if let Some(bin_dir) = Path::new(&out_dir).ancestors().nth(3) {
        if let Err(e) = std::fs::copy(&config, bin_dir.join("config.toml")) {
            println!("cargo:warning=config.toml not copied: {e}");
        }
    }
}
