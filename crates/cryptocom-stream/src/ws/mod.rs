/*
[INPUT]:  WebSocket configuration and subscription channels
[OUTPUT]: Subscriptions, routed frames, and re-resolvable watchers
[POS]:    WebSocket layer - real-time data streams
[UPDATE]: When adding new channels or changing connection logic
*/

pub mod channel;
pub mod client;
pub mod connection;
pub mod errors;
pub mod message;
pub mod registry;
pub mod router;
pub mod transport;

pub use channel::{CacheHandler, Channel, ChannelKind, Visibility};
pub use client::CryptocomStream;
pub use connection::Connection;
pub use message::{NonceSource, Params};
pub use registry::{Registry, Watcher};
pub use router::Router;
pub use transport::{Connector, Transport, TransportEvent, TungsteniteConnector};
