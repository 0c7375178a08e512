//! Build Script for GPU Agent Subscriber
//!
//! Generates Rust protobuf stubs from the workspace proto definitions.
//!
//! Build scripts halt the build on failure, so errors are returned straight
//! to Cargo rather than handled.
#![allow(unsafe_code)]

use std::{env, path::PathBuf};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-changed=../../packages/proto/amdgpu/");

    // Emit cfg for coverage detection
    if env::var("CARGO_LLVM_COV").is_ok()
        || env::var("LLVM_PROFILE_FILE").is_ok()
        || env::var("RUSTFLAGS")
            .map(|f| f.contains("instrument-coverage"))
            .unwrap_or(false)
    {
        println!("cargo:rustc-cfg=coverage");
    }

    let manifest_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    let proto_root = manifest_dir.join("../../packages/proto");
    let proto_files = [
        proto_root.join("amdgpu/events.proto"),
        proto_root.join("amdgpu/gpu_watch.proto"),
    ];

    for proto in &proto_files {
        println!("cargo:rerun-if-changed={}", proto.display());
    }

    // Vendored protoc keeps the build free of a system protobuf install.
    let protoc = protoc_bin_vendored::protoc_bin_path()
        .map_err(|e| format!("failed to locate vendored protoc: {e}"))?;
    let well_known = protoc_bin_vendored::include_path()
        .map_err(|e| format!("failed to locate vendored protoc includes: {e}"))?;

    // SAFETY: build scripts are single-threaded; nothing else reads the
    // environment concurrently.
    unsafe {
        env::set_var("PROTOC", protoc);
    }

    tonic_prost_build::configure()
        .build_client(true)
        // Server stubs back the in-process agent used by integration tests
        .build_server(true)
        .compile_protos(&proto_files, &[proto_root, well_known])?;

    Ok(())
}
