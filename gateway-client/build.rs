// Build script for gateway-client
// Compiles gateway.proto for gRPC client code generation
fn main() {
    println!("cargo:rerun-if-changed=../proto/services/gateway.proto");

    // gateway-client CONSUMES the gateway services.
    // Server code is also generated for the in-process integration tests.
    tonic_build::configure()
        .build_client(true)
        .build_server(true)
        .compile_protos(&["../proto/services/gateway.proto"], &["../proto/services"])
        .expect("Failed to compile gateway.proto for gateway-client");
}
