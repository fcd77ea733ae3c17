//! Shared mock collaborators for descriptor tests: an inspectable session,
//! a scripted multiplexer/broker, and direct/proxy connectors that count
//! their invocations.

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::HashSet;
use std::rc::Rc;

use anyhow::anyhow;
use sshmux::{
    ChannelId, ConnectError, Connector, HostOptions, IoHandle, Multiplexer, Proxy, ServerKey,
    Session, SessionId,
};

/// What a [`MockSession`] observed, readable after the session has been
/// moved into a descriptor.
#[derive(Debug, Default)]
pub struct SessionLog {
    pub closed: bool,
    pub closed_channels: Vec<ChannelId>,
    pub preprocess_calls: usize,
    pub postprocess_args: Option<(HashSet<IoHandle>, HashSet<IoHandle>)>,
}

#[derive(Debug)]
pub struct MockSession {
    pub id: SessionId,
    pub visible_busy: bool,
    pub invisible_busy: bool,
    pub listeners: HashSet<IoHandle>,
    pub pending: HashSet<IoHandle>,
    pub channels: Vec<ChannelId>,
    pub close_error: Option<String>,
    pub postprocess_result: bool,
    pub log: Rc<RefCell<SessionLog>>,
}

impl MockSession {
    pub fn new(id: u64) -> Self {
        Self {
            id: SessionId(id),
            visible_busy: false,
            invisible_busy: false,
            listeners: HashSet::new(),
            pending: HashSet::new(),
            channels: Vec::new(),
            close_error: None,
            postprocess_result: true,
            log: Rc::new(RefCell::new(SessionLog::default())),
        }
    }

    /// Keep a handle to the log before moving the session into a server.
    pub fn log_handle(&self) -> Rc<RefCell<SessionLog>> {
        Rc::clone(&self.log)
    }
}

impl Session for MockSession {
    fn id(&self) -> SessionId {
        self.id
    }

    fn busy(&self, include_invisible: bool) -> bool {
        self.visible_busy || (include_invisible && self.invisible_busy)
    }

    fn close(&mut self) -> anyhow::Result<()> {
        self.log.borrow_mut().closed = true;
        match &self.close_error {
            Some(msg) => Err(anyhow!(msg.clone())),
            None => Ok(()),
        }
    }

    fn channel_ids(&self) -> Vec<ChannelId> {
        self.channels.clone()
    }

    fn close_channel(&mut self, id: ChannelId) {
        self.log.borrow_mut().closed_channels.push(id);
    }

    fn listeners(&self) -> HashSet<IoHandle> {
        self.listeners.clone()
    }

    fn pending_write(&self, handle: IoHandle) -> bool {
        self.pending.contains(&handle)
    }

    fn preprocess(&mut self) {
        self.log.borrow_mut().preprocess_calls += 1;
    }

    fn postprocess(&mut self, readers: &HashSet<IoHandle>, writers: &HashSet<IoHandle>) -> bool {
        self.log.borrow_mut().postprocess_args = Some((readers.clone(), writers.clone()));
        self.postprocess_result
    }
}

/// Scripted multiplexer: hands out at most one prepared session and records
/// broker invocations and close notifications.
#[derive(Default)]
pub struct MockMux {
    pub next: Option<Box<dyn Session>>,
    pub next_error: Option<String>,
    pub next_calls: usize,
    pub closed: Vec<ServerKey>,
}

impl Multiplexer for MockMux {
    fn next_session(
        &mut self,
        server: &ServerKey,
    ) -> Result<Option<Box<dyn Session>>, ConnectError> {
        self.next_calls += 1;
        if let Some(reason) = self.next_error.take() {
            return Err(ConnectError::connection(server.host.clone(), reason));
        }
        Ok(self.next.take())
    }

    fn server_closed(&mut self, server: &ServerKey) {
        self.closed.push(server.clone());
    }
}

/// Direct connector that counts calls. `fail_auth` makes it raise an
/// authentication failure attributed to a placeholder host, so tests can
/// check that the descriptor re-annotates it with the real one.
#[derive(Default)]
pub struct MockConnector {
    pub calls: Cell<usize>,
    pub fail_auth: Option<String>,
    pub session_id: u64,
}

impl Connector for MockConnector {
    fn connect(
        &self,
        _host: &str,
        _user: &str,
        _options: &HostOptions,
    ) -> Result<Box<dyn Session>, ConnectError> {
        self.calls.set(self.calls.get() + 1);
        if let Some(reason) = &self.fail_auth {
            return Err(ConnectError::auth("unannotated-host", reason.clone()));
        }
        Ok(Box::new(MockSession::new(self.session_id)))
    }
}

/// Tunneling proxy that counts calls.
#[derive(Default)]
pub struct MockProxy {
    pub calls: Cell<usize>,
    pub session_id: u64,
}

impl Proxy for MockProxy {
    fn connect(
        &self,
        _host: &str,
        _user: &str,
        _options: &HostOptions,
    ) -> Result<Box<dyn Session>, ConnectError> {
        self.calls.set(self.calls.get() + 1);
        Ok(Box::new(MockSession::new(self.session_id)))
    }
}
