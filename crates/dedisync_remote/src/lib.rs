//! # dedisync remote
//!
//! Remote-control call surface for TrackMania dedicated servers.
//!
//! This crate provides:
//! - The [`DedicatedRemote`] capability trait, a typed view of the
//!   dedicated server's remote-control methods
//! - The [`ConnectionGuard`] wrapper that enforces the connection
//!   precondition in exactly one place
//! - The fault taxonomy ([`ProtocolFault`], [`RemoteError`])
//! - A [`MockRemote`] for tests
//!
//! ## Architecture
//!
//! The transport itself (socket handling, authentication, call encoding)
//! is deliberately out of scope: implementors of [`DedicatedRemote`] own
//! it. Everything above the transport goes through [`ConnectionGuard`],
//! so a disconnected remote is rejected before any call is issued.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod guard;
mod remote;
mod types;

pub use error::{ProtocolFault, RemoteError, RemoteResult};
pub use guard::ConnectionGuard;
pub use remote::{DedicatedRemote, MockRemote};
pub use types::{MapListPage, MaxPlayersInfo, PlayerEntry, RawMapInfo, ScriptSettings, ScriptValue};

/// Remote-control API version negotiated by transports at connect time.
pub const API_VERSION: &str = "2022-03-21";
