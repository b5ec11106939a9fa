//! duet-signal: pairs anonymous callers one-on-one and relays their WebRTC
//! handshake until the call ends. Audio itself flows peer to peer.
//!
//! ```text
//! WebSocket /pulse (server)
//!     |
//!     v
//! Matchmaker ---- ConnectionRegistry (socket senders, phase, identity)
//!     |
//!     +-- WaitingQueue  (FIFO, one entry per connection)
//!     +-- CallTable     (symmetric partner map)
//!     +-- FeedbackSink  (end-of-call ratings, fire-and-forget)
//! ```

pub mod auth;
pub mod calls;
pub mod config;
pub mod error;
pub mod feedback;
pub mod logging;
pub mod matchmaker;
pub mod protocol;
pub mod queue;
pub mod registry;
pub mod server;

pub use error::{CallError, ClientError};
pub use matchmaker::Matchmaker;
pub use protocol::{ClientEvent, ServerEvent, Signal};
pub use registry::ConnectionId;
