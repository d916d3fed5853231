/*
[INPUT]:  Stream payload schema and serde requirements
[OUTPUT]: Typed Rust structs/enums plus lenient payload parsers
[POS]:    Data layer - type definitions for stream payloads
[UPDATE]: When payload schema changes or new types added
*/

pub mod enums;
pub mod models;
pub(crate) mod parse;

pub use enums::*;
pub use models::*;
