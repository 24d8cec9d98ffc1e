//! Catalog (EPG) lookups.
//!
//! Turns a request's `(channel_id, channel_key, token)` into the program the
//! worker should play. The lookup is a single HTTP call; every failure is
//! reported as [`u7d_common::Error::NotFound`].

mod client;

pub use client::{CatalogResolver, EpgClient};
