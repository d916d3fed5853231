/*
[INPUT]:  Crate modules and public type definitions
[OUTPUT]: Public Crypto.com streaming client crate surface
[POS]:    Crate root - module wiring
[UPDATE]: When public modules or exports change
*/

pub mod auth;
pub mod cache;
pub mod config;
pub mod error;
pub mod markets;
pub mod types;
pub mod ws;

pub use auth::{Authenticator, HmacSigner};

pub use cache::{CacheLimits, StreamState, TradeScope, Update};

pub use config::{Credentials, StreamConfig};

pub use error::{ExchangeErrorKind, Result, StreamError};

pub use markets::MarketDirectory;

// Re-export all types
pub use types::*;

pub use ws::{
    Channel,
    ChannelKind,
    Connector,
    CryptocomStream,
    Params,
    Transport,
    TransportEvent,
    TungsteniteConnector,
    Visibility,
    Watcher,
};
