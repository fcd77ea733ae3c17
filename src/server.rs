//! The per-host connection descriptor.
//!
//! A [`Server`] pairs one remote host's immutable identity with its lazily
//! established session. Sessions built out-of-band (proxy handshakes span
//! several poll ticks) are handed over through a staged/current swap so the
//! poll loop never observes a session appearing mid-iteration.

use std::collections::HashSet;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use anyhow::Result;
use serde_json::Value;
use tracing::{debug, trace, warn};

use crate::error::ConnectError;
use crate::mux::{Connector, Multiplexer, Proxy};
use crate::options::{HostOptions, HostSpec, DEFAULT_PORT};
use crate::registry::SessionRegistry;
use crate::session::{IoHandle, Session};

/// Owned identity triple of a descriptor: host, user, effective port.
///
/// This is what collaborators receive (broker calls, close notifications,
/// registry values) and what descriptor equality is defined over.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ServerKey {
    pub host: String,
    pub user: String,
    pub port: u16,
}

impl fmt::Display for ServerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}:{}", self.user, self.host, self.port)
    }
}

/// Lifecycle of a descriptor. The failed flag is orthogonal to this.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerState {
    /// No session exists and none is being established.
    Unconnected,
    /// A candidate session is staged, awaiting [`Server::apply_staged`].
    Connecting,
    /// A current session is installed.
    Connected,
    /// The session was closed; a retry policy may reconnect.
    Closed,
}

/// One remote host inside a multi-host multiplexer: identity, advisory
/// failure flag, lazy session, and the staged/current handoff.
///
/// Single-threaded cooperative model: nothing here blocks internally, and
/// no operation is safe to call concurrently without external
/// synchronization. The current-session field is mutated only by this type.
pub struct Server {
    host: String,
    user: String,
    options: HostOptions,
    proxy: Option<Arc<dyn Proxy>>,
    session: Option<Box<dyn Session>>,
    staged: Option<Box<dyn Session>>,
    failed: bool,
    closed: bool,
}

impl Server {
    /// Create a descriptor for `user` on `host`. The proxy reference, if
    /// any, is extracted out of `options` here and never mutated again.
    pub fn new(host: impl Into<String>, user: impl Into<String>, mut options: HostOptions) -> Self {
        let proxy = options.proxy.take();
        Self {
            host: host.into(),
            user: user.into(),
            options,
            proxy,
            session: None,
            staged: None,
            failed: false,
            closed: false,
        }
    }

    /// Build a descriptor from a parsed `[user@]host[:port]` specification,
    /// filling the user from `default_user` when the spec omits it. A port
    /// in the spec overrides one already present in `options`.
    pub fn from_spec(spec: &HostSpec, default_user: &str, mut options: HostOptions) -> Self {
        if spec.port.is_some() {
            options.port = spec.port;
        }
        let user = spec.user.clone().unwrap_or_else(|| default_user.to_string());
        Self::new(spec.host.clone(), user, options)
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn user(&self) -> &str {
        &self.user
    }

    pub fn options(&self) -> &HostOptions {
        &self.options
    }

    /// Effective port: the configured one, or [`DEFAULT_PORT`].
    pub fn port(&self) -> u16 {
        self.options.port.unwrap_or(DEFAULT_PORT)
    }

    /// Owned identity triple, as handed to collaborators.
    pub fn key(&self) -> ServerKey {
        ServerKey {
            host: self.host.clone(),
            user: self.user.clone(),
            port: self.port(),
        }
    }

    /// Look up a per-host property. `None` when the key is absent or no
    /// properties were configured at all.
    pub fn property(&self, key: &str) -> Option<&Value> {
        self.options.properties.as_ref()?.get(key)
    }

    pub fn has_proxy(&self) -> bool {
        self.proxy.is_some()
    }

    pub fn state(&self) -> ServerState {
        if self.session.is_some() {
            ServerState::Connected
        } else if self.staged.is_some() {
            ServerState::Connecting
        } else if self.closed {
            ServerState::Closed
        } else {
            ServerState::Unconnected
        }
    }

    // -----------------------------------------------------------------------
    // Failure bookkeeping (advisory only; consulted by the caller's retry
    // policy, never enforced here)
    // -----------------------------------------------------------------------

    pub fn failed(&self) -> bool {
        self.failed
    }

    /// Set or clear the failure flag. Clearing enables a caller-driven
    /// retry after a prior failure.
    pub fn set_failed(&mut self, failed: bool) {
        self.failed = failed;
    }

    // -----------------------------------------------------------------------
    // Lazy session establishment
    // -----------------------------------------------------------------------

    /// The current session, if any. With `require` set and no current
    /// session, asks the multiplexer's broker for one: a session returned
    /// synchronously is stored as current immediately; `Ok(None)` from the
    /// broker means establishment continues out-of-band and will arrive
    /// through [`stage`](Self::stage). Without `require`, no connection
    /// attempt is made.
    pub fn session(
        &mut self,
        mux: &mut dyn Multiplexer,
        require: bool,
    ) -> Result<Option<&mut (dyn Session + 'static)>, ConnectError> {
        if self.session.is_none() && require {
            let key = self.key();
            trace!(server = %key, "requesting session from broker");
            if let Some(session) = mux.next_session(&key)? {
                debug!(server = %key, id = %session.id(), "broker returned session");
                self.session = Some(session);
                self.closed = false;
            }
        }
        Ok(self.session.as_deref_mut())
    }

    /// Construct the actual session, through the proxy when one is set and
    /// directly otherwise, and record the session→descriptor association in
    /// the multiplexer-owned registry.
    ///
    /// Never assigns the current-session field: installation goes through
    /// [`stage`](Self::stage)/[`apply_staged`](Self::apply_staged) so
    /// visible state only changes at a poll-safe boundary. Authentication
    /// failures are re-raised annotated with this host's name; every other
    /// error propagates unchanged.
    pub fn new_session(
        &self,
        connector: &dyn Connector,
        registry: &SessionRegistry,
    ) -> Result<Box<dyn Session>, ConnectError> {
        debug!(server = %self, via_proxy = self.proxy.is_some(), "establishing session");
        let result = match &self.proxy {
            Some(proxy) => proxy.connect(&self.host, &self.user, &self.options),
            None => connector.connect(&self.host, &self.user, &self.options),
        };
        let session = result.map_err(|err| match err {
            ConnectError::AuthenticationFailed { reason, .. } => {
                warn!(server = %self, reason = %reason, "authentication failed");
                ConnectError::AuthenticationFailed {
                    host: self.host.clone(),
                    reason,
                }
            }
            other => other,
        })?;
        registry.register(session.id(), self.key());
        Ok(session)
    }

    // -----------------------------------------------------------------------
    // Staged/current swap
    // -----------------------------------------------------------------------

    /// Record `candidate` for installation at the next poll-safe boundary.
    /// Does not touch the current session. A second `stage` before
    /// [`apply_staged`](Self::apply_staged) overwrites the first.
    pub fn stage(&mut self, candidate: Box<dyn Session>) {
        if self.staged.is_some() {
            debug!(server = %self, "overwriting previously staged session");
        }
        trace!(server = %self, id = %candidate.id(), "session staged");
        self.staged = Some(candidate);
    }

    /// Whether a staged candidate is waiting to be applied.
    pub fn has_staged(&self) -> bool {
        self.staged.is_some()
    }

    /// Install the staged session as current, if one is staged. Called by
    /// the multiplexer strictly between poll iterations, never while
    /// readers/writers are being enumerated for a tick. No-op when nothing
    /// is staged.
    pub fn apply_staged(&mut self) {
        if let Some(session) = self.staged.take() {
            debug!(server = %self, id = %session.id(), "installing staged session");
            self.session = Some(session);
            self.closed = false;
        }
    }

    // -----------------------------------------------------------------------
    // Event-loop adapter, driven once per poll tick by the multiplexer
    // -----------------------------------------------------------------------

    /// Whether the current session has outstanding work. False without a
    /// session.
    pub fn busy(&self, include_invisible: bool) -> bool {
        self.session
            .as_ref()
            .is_some_and(|s| s.busy(include_invisible))
    }

    /// Close the current session and notify the multiplexer. The
    /// notification fires exactly once iff a session existed, and the
    /// current-session field is cleared on every exit path; a close error
    /// propagates after cleanup and notification have happened.
    pub fn close(&mut self, mux: &mut dyn Multiplexer) -> Result<()> {
        let Some(mut session) = self.session.take() else {
            return Ok(());
        };
        debug!(server = %self, "closing session");
        let result = session.close();
        self.closed = true;
        mux.server_closed(&self.key());
        if let Err(err) = &result {
            warn!(server = %self, error = %err, "session close reported an error");
        }
        result
    }

    /// Best-effort close of every open channel on the current session, for
    /// coordinated bulk teardown. No-op without a session.
    pub fn close_channels(&mut self) {
        if let Some(session) = self.session.as_mut() {
            for id in session.channel_ids() {
                session.close_channel(id);
            }
        }
    }

    /// Per-tick hook before the poll. No-op without a session.
    pub fn preprocess(&mut self) {
        if let Some(session) = self.session.as_mut() {
            session.preprocess();
        }
    }

    /// I/O handles the poll loop should watch for readability: the
    /// session's listener set, or empty without a session.
    pub fn readers(&self) -> HashSet<IoHandle> {
        self.session
            .as_ref()
            .map(|s| s.listeners())
            .unwrap_or_default()
    }

    /// The subset of listeners with pending outbound data, or empty
    /// without a session.
    pub fn writers(&self) -> HashSet<IoHandle> {
        match &self.session {
            Some(session) => session
                .listeners()
                .into_iter()
                .filter(|h| session.pending_write(*h))
                .collect(),
            None => HashSet::new(),
        }
    }

    /// Per-tick hook after the poll. The multiplexer polls every
    /// descriptor's handles in one pass, so the candidate sets are
    /// intersected with this session's own listeners before delegating.
    /// Returns true without a session.
    pub fn postprocess(
        &mut self,
        readers: &HashSet<IoHandle>,
        writers: &HashSet<IoHandle>,
    ) -> bool {
        let Some(session) = self.session.as_mut() else {
            return true;
        };
        let listeners = session.listeners();
        let ready_readers: HashSet<IoHandle> = listeners.intersection(readers).copied().collect();
        let ready_writers: HashSet<IoHandle> = listeners.intersection(writers).copied().collect();
        session.postprocess(&ready_readers, &ready_writers)
    }
}

/// `user@host`, with a `:port` suffix only when a port was explicitly
/// configured. Recomputed on demand; identity fields never change.
impl fmt::Display for Server {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.user, self.host)?;
        if let Some(port) = self.options.port {
            write!(f, ":{}", port)?;
        }
        Ok(())
    }
}

impl fmt::Debug for Server {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Server")
            .field("host", &self.host)
            .field("user", &self.user)
            .field("port", &self.port())
            .field("state", &self.state())
            .field("failed", &self.failed)
            .finish()
    }
}

/// Equality is defined solely by (host, user, effective port): two
/// descriptors with identical triples are interchangeable as set members
/// or map keys, regardless of differing other options.
impl PartialEq for Server {
    fn eq(&self, other: &Self) -> bool {
        self.host == other.host && self.user == other.user && self.port() == other.port()
    }
}

impl Eq for Server {}

impl Hash for Server {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.host.hash(state);
        self.user.hash(state);
        self.port().hash(state);
    }
}
