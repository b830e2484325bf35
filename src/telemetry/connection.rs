//! Externally observable connection state.
//!
//! `ConnectionInfo` is mutated only through the transition methods below,
//! which the session driver calls; consumers get clones. The transitions
//! encode the negotiation rules, e.g. that a poll failure is only a
//! meaningful substate while the polling transport is active.

use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    Connecting,
    Connected,
    Disconnected,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Transport {
    Stream,
    Polling,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConnectionInfo {
    pub state: ConnectionState,
    pub transport: Transport,
    pub reconnect_attempt: u32,
    pub last_connected_at: Option<DateTime<Utc>>,
    pub error: Option<String>,
}

impl Default for ConnectionInfo {
    fn default() -> Self {
        Self {
            state: ConnectionState::Disconnected,
            transport: Transport::Polling,
            reconnect_attempt: 0,
            last_connected_at: None,
            error: None,
        }
    }
}

impl ConnectionInfo {
    /// A stream open (or re-open) is in flight.
    pub(crate) fn begin_connecting(&mut self, attempt: u32) {
        self.state = ConnectionState::Connecting;
        self.transport = Transport::Stream;
        self.reconnect_attempt = attempt;
        self.error = None;
    }

    /// The stream opened; prior error metadata is cleared and the attempt
    /// counter resets.
    pub(crate) fn stream_opened(&mut self, now: DateTime<Utc>) {
        *self = Self {
            state: ConnectionState::Connected,
            transport: Transport::Stream,
            reconnect_attempt: 0,
            last_connected_at: Some(now),
            error: None,
        };
    }

    /// The stream failed to open or dropped; a retry is pending.
    pub(crate) fn stream_lost(&mut self, attempt: u32) {
        self.state = ConnectionState::Disconnected;
        self.transport = Transport::Stream;
        self.reconnect_attempt = attempt;
        self.error = Some("connection lost, reconnecting".into());
    }

    /// Permanent fallback: polling is now the transport for the rest of the
    /// session. Not reported as a failure.
    pub(crate) fn polling_engaged(&mut self, now: DateTime<Utc>) {
        *self = Self {
            state: ConnectionState::Connected,
            transport: Transport::Polling,
            reconnect_attempt: 0,
            last_connected_at: Some(now),
            error: None,
        };
    }

    pub(crate) fn poll_succeeded(&mut self, now: DateTime<Utc>) {
        if self.transport == Transport::Polling {
            self.state = ConnectionState::Connected;
            self.last_connected_at = Some(now);
            self.error = None;
        }
    }

    pub(crate) fn poll_failed(&mut self, message: String) {
        if self.transport == Transport::Polling {
            self.state = ConnectionState::Error;
            self.error = Some(message);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initial_state_is_disconnected() {
        let info = ConnectionInfo::default();
        assert_eq!(info.state, ConnectionState::Disconnected);
        assert_eq!(info.reconnect_attempt, 0);
        assert!(info.last_connected_at.is_none());
        assert!(info.error.is_none());
    }

    #[test]
    fn stream_open_clears_prior_error() {
        let mut info = ConnectionInfo::default();
        info.begin_connecting(0);
        info.stream_lost(1);
        assert!(info.error.is_some());

        info.stream_opened(Utc::now());
        assert_eq!(info.state, ConnectionState::Connected);
        assert_eq!(info.transport, Transport::Stream);
        assert_eq!(info.reconnect_attempt, 0);
        assert!(info.error.is_none());
        assert!(info.last_connected_at.is_some());
    }

    #[test]
    fn poll_failure_ignored_while_streaming() {
        let mut info = ConnectionInfo::default();
        info.stream_opened(Utc::now());

        info.poll_failed("boom".into());
        assert_eq!(info.state, ConnectionState::Connected);
        assert!(info.error.is_none());
    }

    #[test]
    fn poll_failure_surfaces_while_polling() {
        let mut info = ConnectionInfo::default();
        info.polling_engaged(Utc::now());

        info.poll_failed("poll failed".into());
        assert_eq!(info.state, ConnectionState::Error);
        assert_eq!(info.error.as_deref(), Some("poll failed"));

        info.poll_succeeded(Utc::now());
        assert_eq!(info.state, ConnectionState::Connected);
        assert!(info.error.is_none());
    }
}
