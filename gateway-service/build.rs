// Build script for gateway-service
// Compiles gateway.proto for gRPC server code generation
fn main() {
    println!("cargo:rerun-if-changed=../proto/services/gateway.proto");

    // gateway-service PROVIDES the gateway services (server implementation).
    // Client code is also generated for integration tests.
    tonic_build::configure()
        .build_server(true)
        .build_client(true)
        .compile_protos(&["../proto/services/gateway.proto"], &["../proto/services"])
        .expect("Failed to compile gateway.proto for gateway-service");
}
