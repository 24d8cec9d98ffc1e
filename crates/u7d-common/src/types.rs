//! Request and catalog types.
//!
//! A relay request is addressed as `/rtp/{channel_id}/{channel_key}/{token}`.
//! The token's literal prefix decides how the request is served; see
//! [`TokenKind`].

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Token prefix of a live multicast group address.
pub const MULTICAST_PREFIX: &str = "239";

/// Token prefix of an on-demand program reference.
pub const PROGRAM_PREFIX: &str = "video-";

/// How a request token is served.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    /// A multicast address, redirected to the multicast proxy.
    Multicast,
    /// An on-demand program, served through a worker process.
    Program,
    /// Anything else.
    Unrecognized,
}

impl TokenKind {
    /// Classify a token by its literal prefix.
    pub fn classify(token: &str) -> Self {
        if token.starts_with(MULTICAST_PREFIX) {
            Self::Multicast
        } else if token.starts_with(PROGRAM_PREFIX) {
            Self::Program
        } else {
            Self::Unrecognized
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Multicast => write!(f, "multicast"),
            Self::Program => write!(f, "program"),
            Self::Unrecognized => write!(f, "unrecognized"),
        }
    }
}

/// The three path segments of a relay request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestIdentity {
    pub channel_id: String,
    pub channel_key: String,
    pub token: String,
}

impl RequestIdentity {
    pub fn new(
        channel_id: impl Into<String>,
        channel_key: impl Into<String>,
        token: impl Into<String>,
    ) -> Self {
        Self {
            channel_id: channel_id.into(),
            channel_key: channel_key.into(),
            token: token.into(),
        }
    }

    /// Classification of this request's token.
    pub fn kind(&self) -> TokenKind {
        TokenKind::classify(&self.token)
    }
}

impl fmt::Display for RequestIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.channel_id, self.channel_key, self.token)
    }
}

/// Catalog answer for a program lookup, as sent over the wire.
///
/// The catalog is loose about types: ids and offsets may arrive as JSON
/// strings or numbers. They are kept as strings and handed to the worker
/// untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedProgram {
    #[serde(deserialize_with = "string_or_number")]
    pub channel_id: String,

    /// `None` means the catalog did not find a program.
    #[serde(default, deserialize_with = "optional_string_or_number")]
    pub program_id: Option<String>,

    /// Playback start position in seconds.
    #[serde(default = "default_offset", deserialize_with = "string_or_number")]
    pub offset: String,
}

fn default_offset() -> String {
    "0".to_string()
}

impl ResolvedProgram {
    /// Turn the wire answer into a [`Program`], if a program was found.
    pub fn into_program(self) -> Option<Program> {
        let program_id = self.program_id?;
        Some(Program {
            channel_id: self.channel_id,
            program_id,
            offset: self.offset,
        })
    }
}

/// A successfully resolved program.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Program {
    pub channel_id: String,
    pub program_id: String,
    pub offset: String,
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(de::Error::custom(format!(
            "expected string or number, got {other}"
        ))),
    }
}

fn optional_string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(None),
        Value::String(s) if s.is_empty() => Ok(None),
        Value::String(s) => Ok(Some(s)),
        Value::Number(n) => Ok(Some(n.to_string())),
        other => Err(de::Error::custom(format!(
            "expected string or number, got {other}"
        ))),
    }
}
