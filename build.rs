fn main() {
    protobuf_codegen::Codegen::new()
        .pure()
        .includes(["proto"])
        .inputs(["proto/cast_channel.proto", "proto/auth_messages.proto"])
        .cargo_out_dir("proto")
        .run_from_script();
}
