//! u7d-common: Shared types and errors for the u7d gateway.
//!
//! - **Request types**: [`RequestIdentity`] and its [`TokenKind`] classification
//! - **Catalog types**: [`ResolvedProgram`] as returned by the EPG service
//! - **Error Handling**: a unified [`Error`] carrying its HTTP status
//!
//! # Examples
//!
//! ```
//! use u7d_common::{RequestIdentity, TokenKind};
//!
//! let identity = RequestIdentity::new("1", "2", "video-abc");
//! assert_eq!(identity.kind(), TokenKind::Program);
//! assert_eq!(identity.to_string(), "1/2/video-abc");
//! ```

pub mod error;
pub mod types;

pub use error::{Error, Result};
pub use types::*;
