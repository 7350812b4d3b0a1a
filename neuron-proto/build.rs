fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Ensure protoc is available via vendored binary for reproducible builds
    if let Ok(path) = protoc_bin_vendored::protoc_bin_path() {
        std::env::set_var("PROTOC", path);
    }

    // google/protobuf/timestamp.proto ships with the vendored protoc
    let mut includes = vec![std::path::PathBuf::from("proto")];
    if let Ok(path) = protoc_bin_vendored::include_path() {
        includes.push(path);
    }

    println!("cargo:rerun-if-changed=proto/neuronai.proto");

    // Generate a single Rust file for package `neuronai.v1` to keep include path stable
    tonic_build::configure()
        .build_server(true)
        .build_client(true)
        .compile(&["proto/neuronai.proto"], &includes[..])?;
    Ok(())
}
