//! JSON request/response payload shapes for every namespace. Continues the
//! teacher's tagged-enum convention
//! (`#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]`).

pub mod connection;
pub mod discovery;
pub mod heartbeat;
pub mod media;
pub mod multizone;
pub mod receiver;
pub mod setup;
