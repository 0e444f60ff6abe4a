//! Client side of the MemoFee HTTP API
//!
//! The server crate routes these same paths and bodies; this module lets the
//! CLI talk to a running server for notes and feed retrieval.

mod client;
mod protocol;

pub use client::{MemoFeeClient, RemoteNoteStore};
pub use protocol::*;
