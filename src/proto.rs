//! Generated protobuf bindings for the Cast V2 wire envelope
//! (`cast_channel.proto`) and the device-auth challenge/response messages
//! (`auth_messages.proto`). See `build.rs`.
#![allow(clippy::all)]
#![allow(dead_code)]

include!(concat!(env!("OUT_DIR"), "/proto/mod.rs"));

// protobuf-codegen emits one submodule per input file; flatten both onto
// this module so callers write `proto::CastMessage` rather than
// `proto::cast_channel::CastMessage`.
pub use auth_messages::*;
pub use cast_channel::*;
