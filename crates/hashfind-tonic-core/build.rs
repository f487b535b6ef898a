/// Builds the gRPC client and server code for the `hashfind.proto` definition
/// using `tonic-prost-build`.
///
/// This code generation step processes the Protocol Buffer definitions located
/// in the `proto` directory and emits Rust modules with gRPC bindings into the
/// crate's `OUT_DIR`. A file descriptor set is written alongside so the server
/// can expose gRPC reflection.
///
/// # Files and Paths
///
/// - Proto file: `proto/hashfind.proto`
/// - Includes: `proto/`
/// - Descriptor: `$OUT_DIR/hashfind_descriptor.bin`
///
/// # Panics
///
/// This function will `panic!` if code generation fails.
///
/// # Output
///
/// Generated code will be accessible in Rust via:
///
/// ```rust
/// pub mod proto {
///     tonic::include_proto!("hashfind");
/// }
/// ```
use std::env;
use std::path::PathBuf;
fn main() {
    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());
    let descriptor_path = out_dir.join("hashfind_descriptor.bin");

    let mut config = tonic_prost_build::Config::new();
    config.file_descriptor_set_path(&descriptor_path);

    println!("cargo:rerun-if-changed=proto/hashfind.proto");

    tonic_prost_build::configure()
        .compile_with_config(config, &["proto/hashfind.proto"], &["proto"])
        .unwrap();
}
