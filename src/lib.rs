//! Per-host connection descriptors for a multi-host remote-session
//! multiplexer.
//!
//! A multiplexer drives many remote connections off one shared poll loop.
//! Each connection is represented here by a [`Server`]: its immutable
//! identity (host, user, port, options), an advisory failure flag, a lazily
//! established [`Session`], and a two-phase staged/current swap that lets a
//! session built over several poll ticks be installed only between
//! iterations, never while the loop is enumerating readers and writers.
//!
//! The transport protocol, the tunneling mechanics, and the multiplexer's
//! scheduling policy are collaborators behind the [`Session`],
//! [`Proxy`]/[`Connector`], and [`Multiplexer`] traits.

pub mod error;
pub mod mux;
pub mod options;
pub mod registry;
pub mod server;
pub mod session;

pub use error::{ConnectError, SpecError};
pub use mux::{Connector, Multiplexer, Proxy};
pub use options::{HostOptions, HostSpec, DEFAULT_PORT};
pub use registry::SessionRegistry;
pub use server::{Server, ServerKey, ServerState};
pub use session::{ChannelId, IoHandle, Session, SessionId};
