fn main() -> Result<(), Box<dyn std::error::Error>> {
    let protos = ["proto/csi.proto"];

    let mut config = prost_build::Config::new();
    config.protoc_executable(protoc_bin_vendored::protoc_bin_path()?);

    tonic_build::configure()
        .build_server(true)
        .build_client(true)
        .compile_protos_with_config(config, &protos, &["proto"])?;

    for file in &protos {
        println!("cargo:rerun-if-changed={file}");
    }
    Ok(())
}
