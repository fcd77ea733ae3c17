//! Collaborator contracts: the multiplexer that owns the poll loop and
//! brokers lazy session creation, and the two ways a session gets built
//! (direct dial, or tunneled through an already-connected proxy).

use crate::error::ConnectError;
use crate::options::HostOptions;
use crate::server::ServerKey;
use crate::session::Session;

/// The external owner driving the shared poll loop across many
/// descriptors.
pub trait Multiplexer {
    /// Session broker: produce a session for `server`, or return `Ok(None)`
    /// when establishment continues out-of-band and will be delivered later
    /// through [`Server::stage`](crate::server::Server::stage).
    fn next_session(&mut self, server: &ServerKey)
        -> Result<Option<Box<dyn Session>>, ConnectError>;

    /// Notification that `server`'s session was closed.
    fn server_closed(&mut self, server: &ServerKey);
}

/// Direct dial to a remote host.
pub trait Connector {
    fn connect(
        &self,
        host: &str,
        user: &str,
        options: &HostOptions,
    ) -> Result<Box<dyn Session>, ConnectError>;
}

/// Establishes a session by tunneling through an already-connected
/// session, instead of dialing the target directly.
pub trait Proxy {
    fn connect(
        &self,
        host: &str,
        user: &str,
        options: &HostOptions,
    ) -> Result<Box<dyn Session>, ConnectError>;
}
