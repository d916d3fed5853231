/*
[INPUT]:  API key and secret
[OUTPUT]: Signed login requests and the per-connection authenticated completion
[POS]:    Auth layer - handles the exchange's signed WebSocket login
[UPDATE]: When auth flow or signature method changes
*/

pub mod handshake;
pub mod signer;

pub use handshake::Authenticator;
pub use signer::HmacSigner;
