//! On-demand program streaming.
//!
//! A program request is served by an external worker that sends MPEG-TS over
//! UDP to a local port; this module turns that into an HTTP body.
//!
//! - [`port`]: ephemeral UDP port allocation
//! - [`relay`]: datagram to body-chunk relay, owns the worker
//! - [`sessions`]: registry of live relays, server-wide shutdown
//! - [`pipeline`]: the request pipeline tying the above to the catalog and
//!   the worker supervisor

pub mod pipeline;
pub mod port;
pub mod relay;
pub mod sessions;

pub use pipeline::open_program_stream;
pub use port::allocate_port;
pub use relay::DatagramRelay;
pub use sessions::{SessionManager, SessionTicket, StreamSession};

/// Content type of relayed streams.
pub const MIME_TS: &str = "video/MP2T";
