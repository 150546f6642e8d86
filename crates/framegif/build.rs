// Build scripts signal errors by panicking; there is no caller to
// return Result to.  Cargo treats a non-zero exit as a build failure.
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

//! Build script for the framegif binary crate.
//!
//! ## Encoder worker
//!
//! Builds `crates/framegif-worker` with `wasm-pack` and exposes the JS
//! glue and WASM binary through `WORKER_JS_PATH` / `WORKER_WASM_PATH`
//! so `main.rs` can embed them with `include_str!` / `include_bytes!`.
//!
//! Native builds (tests, clippy, the CLI workspace build) have no use
//! for the worker, so they get empty placeholder files instead and the
//! app falls back to encoding on the main thread.

use std::path::{Path, PathBuf};
use std::process::Command;
use std::{env, fs};

fn main() {
    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());
    let manifest_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR").unwrap());

    // Workspace root is two levels up from crates/framegif/.
    let workspace_root = manifest_dir
        .parent()
        .and_then(Path::parent)
        .expect("could not find workspace root");

    println!(
        "cargo:rerun-if-changed={}",
        manifest_dir.join("assets/style.css").display()
    );

    let target_arch = env::var("CARGO_CFG_TARGET_ARCH").unwrap_or_default();
    if target_arch == "wasm32" {
        build_worker_wasm(workspace_root, &out_dir);
    } else {
        write_worker_placeholders(&out_dir);
    }
}

/// Build the encoder web worker WASM module via `wasm-pack`.
///
/// Compiles `crates/framegif-worker/` into a no-modules WASM package in
/// `OUT_DIR`.  At runtime the app creates Blob URLs from the embedded
/// data, so the dev server does not need to serve extra static files.
fn build_worker_wasm(workspace_root: &Path, out_dir: &Path) {
    let worker_crate = workspace_root.join("crates/framegif-worker");
    let worker_pkg_dir = out_dir.join("worker-pkg");

    // The worker embeds the encoder and, through it, the core types.
    let dependencies = [
        worker_crate.clone(),
        workspace_root.join("crates/framegif-export"),
        workspace_root.join("crates/framegif-core"),
    ];
    for krate in &dependencies {
        register_rs_sources(&krate.join("src"));
        println!(
            "cargo:rerun-if-changed={}",
            krate.join("Cargo.toml").display()
        );
    }

    let js_path = worker_pkg_dir.join("framegif_worker.js");
    let wasm_path = worker_pkg_dir.join("framegif_worker_bg.wasm");

    // Skip wasm-pack when the output is newer than every worker input.
    if wasm_path.exists() && js_path.exists() {
        let wasm_mtime = fs::metadata(&wasm_path).and_then(|m| m.modified()).ok();
        if let Some(wasm_mtime) = wasm_mtime {
            let worker_stale = dependencies
                .iter()
                .any(|krate| is_any_newer_than(krate, wasm_mtime));
            if !worker_stale {
                emit_worker_paths(&js_path, &wasm_path);
                return;
            }
        }
    }

    // Host rustc flags and wrappers (e.g. coverage instrumentation) are
    // incompatible with the wasm32 sub-build.
    let status = Command::new("wasm-pack")
        .args([
            "build",
            &worker_crate.to_string_lossy(),
            "--target",
            "no-modules",
            "--no-typescript",
            "--out-dir",
            &worker_pkg_dir.to_string_lossy(),
        ])
        .env_remove("RUSTFLAGS")
        .env_remove("CARGO_ENCODED_RUSTFLAGS")
        .env_remove("RUSTC_WRAPPER")
        .env_remove("RUSTC_WORKSPACE_WRAPPER")
        .status()
        .unwrap_or_else(|e| {
            panic!(
                "failed to run `wasm-pack build`: {e}\n\
                 \n\
                 The encoder worker requires wasm-pack to compile.\n\
                 Install: cargo install wasm-pack"
            )
        });

    assert!(
        status.success(),
        "`wasm-pack build` for framegif-worker exited with {status}"
    );
    assert!(
        js_path.exists(),
        "expected worker JS at {}",
        js_path.display()
    );
    assert!(
        wasm_path.exists(),
        "expected worker WASM at {}",
        wasm_path.display()
    );

    emit_worker_paths(&js_path, &wasm_path);
}

/// Empty stand-ins so `include_str!` / `include_bytes!` resolve on
/// native targets.
fn write_worker_placeholders(out_dir: &Path) {
    let js_path = out_dir.join("framegif_worker.js");
    let wasm_path = out_dir.join("framegif_worker_bg.wasm");
    fs::write(&js_path, "")
        .unwrap_or_else(|e| panic!("failed to write {}: {e}", js_path.display()));
    fs::write(&wasm_path, [])
        .unwrap_or_else(|e| panic!("failed to write {}: {e}", wasm_path.display()));
    emit_worker_paths(&js_path, &wasm_path);
}

fn emit_worker_paths(js_path: &Path, wasm_path: &Path) {
    println!("cargo:rustc-env=WORKER_JS_PATH={}", js_path.display());
    println!("cargo:rustc-env=WORKER_WASM_PATH={}", wasm_path.display());
}

/// Recursively emit `cargo:rerun-if-changed` for every `.rs` file
/// under `dir`.
fn register_rs_sources(dir: &Path) {
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };

    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            register_rs_sources(&path);
        } else if path.extension().is_some_and(|ext| ext == "rs") {
            println!("cargo:rerun-if-changed={}", path.display());
        }
    }
}

/// Check if any `.rs` or `.toml` file under `dir` has a modification
/// time newer than `reference`.
fn is_any_newer_than(dir: &Path, reference: std::time::SystemTime) -> bool {
    let Ok(entries) = fs::read_dir(dir) else {
        return false;
    };

    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            if path.file_name().is_some_and(|name| name == "target") {
                continue;
            }
            if is_any_newer_than(&path, reference) {
                return true;
            }
        } else if path
            .extension()
            .is_some_and(|ext| ext == "rs" || ext == "toml")
            && fs::metadata(&path)
                .and_then(|m| m.modified())
                .is_ok_and(|t| t > reference)
        {
            return true;
        }
    }

    false
}
