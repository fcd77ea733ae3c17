use std::collections::HashSet;
use std::fmt;

use anyhow::Result;

/// Stable identity of a session, used to associate it with its owning
/// descriptor in a [`SessionRegistry`](crate::registry::SessionRegistry)
/// rather than tagging the session object itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(pub u64);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "session-{}", self.0)
    }
}

/// Identity of one multiplexed channel inside a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChannelId(pub u32);

/// Opaque token for an I/O handle registered with a session's internal
/// event tracking. The poll loop collects these across all descriptors,
/// polls them in one pass, and hands the ready subsets back through
/// [`Server::postprocess`](crate::server::Server::postprocess).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IoHandle(pub u64);

/// One authenticated, connected transport-level channel to a remote host.
///
/// The transport itself (encryption, authentication, channel multiplexing)
/// lives behind this trait; the descriptor only drives the per-tick hooks
/// and teardown.
pub trait Session: fmt::Debug {
    /// Stable identity for registry association.
    fn id(&self) -> SessionId;

    /// Whether the session has outstanding work. `include_invisible`
    /// counts channels that are not user-visible (e.g. forwarding
    /// plumbing).
    fn busy(&self, include_invisible: bool) -> bool;

    /// Close the underlying transport. Errors propagate to the caller but
    /// must leave the session safe to drop.
    fn close(&mut self) -> Result<()>;

    /// Identities of all currently open channels.
    fn channel_ids(&self) -> Vec<ChannelId>;

    /// Best-effort close of a single channel.
    fn close_channel(&mut self, id: ChannelId);

    /// The I/O handles registered with this session's event tracking.
    fn listeners(&self) -> HashSet<IoHandle>;

    /// Whether the given handle has pending outbound data.
    fn pending_write(&self, handle: IoHandle) -> bool;

    /// Per-tick hook invoked before the poll.
    fn preprocess(&mut self);

    /// Per-tick hook invoked with the ready subsets of this session's own
    /// listeners. Returns `false` when the session can no longer make
    /// progress (e.g. the transport dropped).
    fn postprocess(&mut self, readers: &HashSet<IoHandle>, writers: &HashSet<IoHandle>) -> bool;
}
