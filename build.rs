use std::env;
use std::fs;
use std::io;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

const BUILD_ID_VAR: &str = "FNE_MANAGER_BUILD_ID";

fn main() {
    // Askama compiles templates into the binary.
    if let Err(e) = watch_tree(Path::new("templates"), "html") {
        println!("cargo:warning=cannot watch templates: {}", e);
    }

    println!("cargo:rerun-if-env-changed={}", BUILD_ID_VAR);
    let build_id = env::var(BUILD_ID_VAR)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(timestamp_id);
    println!("cargo:rustc-env={}={}", BUILD_ID_VAR, build_id);
}

// Release pipelines pass a commit id; local builds get the build time.
fn timestamp_id() -> String {
    match SystemTime::now().duration_since(UNIX_EPOCH) {
        Ok(d) => format!("local-{}", d.as_secs()),
        Err(_) => "dev".to_string(),
    }
}

fn watch_tree(dir: &Path, extension: &str) -> io::Result<()> {
    if !dir.is_dir() {
        return Ok(());
    }
    println!("cargo:rerun-if-changed={}", dir.display());
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            watch_tree(&path, extension)?;
        } else if path.extension().is_some_and(|ext| ext == extension) {
            println!("cargo:rerun-if-changed={}", path.display());
        }
    }
    Ok(())
}
