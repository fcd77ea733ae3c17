//! Per-host connection options and textual host specifications.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::SpecError;
use crate::mux::Proxy;

/// Port used when a host specification carries no explicit port.
pub const DEFAULT_PORT: u16 = 22;

/// Connection options for one remote host.
///
/// `port` and the free-form `properties` sub-map participate in descriptor
/// behavior; everything else the protocol layer cares about rides along in
/// `settings`. The proxy reference is a live object, not configuration, so
/// it is skipped by serde and extracted out of the options when the
/// descriptor is constructed.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct HostOptions {
    /// Explicitly configured port. `None` means [`DEFAULT_PORT`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,

    /// Free-form per-host properties, looked up by
    /// [`Server::property`](crate::server::Server::property).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<HashMap<String, Value>>,

    /// Remaining protocol-specific settings, passed through to the
    /// connector untouched.
    #[serde(flatten)]
    pub settings: HashMap<String, Value>,

    /// Tunnel to establish the session through, instead of dialing the
    /// host directly. Shared, never owned by the descriptor.
    #[serde(skip)]
    pub proxy: Option<Arc<dyn Proxy>>,
}

impl HostOptions {
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    pub fn with_proxy(mut self, proxy: Arc<dyn Proxy>) -> Self {
        self.proxy = Some(proxy);
        self
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties
            .get_or_insert_with(HashMap::new)
            .insert(key.into(), value.into());
        self
    }
}

impl fmt::Debug for HostOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostOptions")
            .field("port", &self.port)
            .field("properties", &self.properties)
            .field("settings", &self.settings)
            .field("proxy", &self.proxy.as_ref().map(|_| "..."))
            .finish()
    }
}

/// A parsed `[user@]host[:port]` specification.
///
/// IPv6 literals with a port must be bracketed (`[::1]:2222`); a bare
/// literal containing colons is taken as a host with no port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostSpec {
    pub user: Option<String>,
    pub host: String,
    pub port: Option<u16>,
}

impl FromStr for HostSpec {
    type Err = SpecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (user, rest) = match s.split_once('@') {
            Some((u, r)) if !u.is_empty() => (Some(u.to_string()), r),
            Some((_, r)) => (None, r),
            None => (None, s),
        };

        let (host, port) = if let Some(stripped) = rest.strip_prefix('[') {
            match stripped.split_once(']') {
                Some((h, "")) => (h, None),
                Some((h, tail)) => {
                    let p = tail
                        .strip_prefix(':')
                        .filter(|p| !p.is_empty())
                        .ok_or_else(|| SpecError::InvalidPort(s.to_string()))?;
                    let port = p
                        .parse()
                        .map_err(|_| SpecError::InvalidPort(s.to_string()))?;
                    (h, Some(port))
                }
                None => return Err(SpecError::EmptyHost(s.to_string())),
            }
        } else if let Some((h, p)) = rest.rsplit_once(':') {
            if h.contains(':') {
                // Bare IPv6 literal, no port.
                (rest, None)
            } else {
                let port = p
                    .parse()
                    .map_err(|_| SpecError::InvalidPort(s.to_string()))?;
                (h, Some(port))
            }
        } else {
            (rest, None)
        };

        if host.is_empty() {
            return Err(SpecError::EmptyHost(s.to_string()));
        }

        Ok(HostSpec {
            user,
            host: host.to_string(),
            port,
        })
    }
}

impl fmt::Display for HostSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(user) = &self.user {
            write!(f, "{}@", user)?;
        }
        if self.host.contains(':') {
            write!(f, "[{}]", self.host)?;
        } else {
            write!(f, "{}", self.host)?;
        }
        if let Some(port) = self.port {
            write!(f, ":{}", port)?;
        }
        Ok(())
    }
}
