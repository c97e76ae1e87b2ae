//! Connection-manager state machine
//!
//! Reconnection is modeled as an explicit state machine with a single
//! authoritative attempt counter, driven by one state-update function
//! consuming tagged events from the four sources that exist: transport open,
//! transport close, timer fire, visibility change. The driver executes the
//! returned action; the machine itself never touches the network or the
//! clock.
//!
//! A stale reconnect timer is not cancelled; it is neutralized by the state
//! check when it fires.

use std::time::Duration;

/// First reconnect delay; doubles on each subsequent attempt
pub const BASE_RECONNECT_DELAY: Duration = Duration::from_secs(1);

/// Reconnect attempts before giving up
pub const MAX_RECONNECT_ATTEMPTS: u32 = 5;

/// Close code for a deliberate, normal closure; never followed by a reconnect
pub const NORMAL_CLOSURE_CODE: u16 = 1000;

/// Connection state
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConnState {
    /// No connection and none pending
    Disconnected,
    /// A connect attempt is in flight
    Connecting,
    /// The transport is open
    Connected,
    /// A reconnect timer is pending
    ReconnectScheduled,
}

/// Tagged event consumed by the state machine
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConnEvent {
    /// Explicit request to connect (startup)
    ConnectRequested,
    /// The transport opened successfully
    TransportOpened,
    /// The transport closed, involuntarily unless the code says otherwise
    TransportClosed {
        /// Close code reported by the transport, when any
        code: Option<u16>,
    },
    /// A previously scheduled reconnect timer fired
    TimerFired,
    /// The UI boundary became visible/foregrounded
    VisibilityGained,
}

/// Action the driver must carry out after a transition
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConnAction {
    /// Nothing to do
    None,
    /// Start a connect attempt now
    Connect,
    /// Arm a reconnect timer for the given delay
    ScheduleReconnect(Duration),
}

/// The connection manager's state plus its reconnect attempt counter.
#[derive(Debug)]
pub struct ConnectionMachine {
    state: ConnState,
    attempts: u32,
}

impl Default for ConnectionMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl ConnectionMachine {
    /// New machine in the initial `Disconnected` state
    pub fn new() -> Self {
        Self {
            state: ConnState::Disconnected,
            attempts: 0,
        }
    }

    /// Current state
    pub fn state(&self) -> ConnState {
        self.state
    }

    /// Current reconnect attempt count
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Whether the transport is currently open
    pub fn is_connected(&self) -> bool {
        self.state == ConnState::Connected
    }

    /// Apply one event and return the action the driver must perform.
    pub fn on_event(&mut self, event: ConnEvent) -> ConnAction {
        match event {
            ConnEvent::ConnectRequested => match self.state {
                ConnState::Disconnected => {
                    self.state = ConnState::Connecting;
                    ConnAction::Connect
                }
                _ => ConnAction::None,
            },

            ConnEvent::TransportOpened => {
                self.state = ConnState::Connected;
                self.attempts = 0;
                ConnAction::None
            }

            ConnEvent::TransportClosed { code } => match self.state {
                ConnState::Connecting | ConnState::Connected => self.on_closed(code),
                // Already disconnected or waiting on a timer
                _ => ConnAction::None,
            },

            ConnEvent::TimerFired => match self.state {
                ConnState::ReconnectScheduled => {
                    self.state = ConnState::Connecting;
                    ConnAction::Connect
                }
                // Stale timer: a reconnect already succeeded or the session ended
                _ => ConnAction::None,
            },

            ConnEvent::VisibilityGained => match self.state {
                ConnState::Connected => ConnAction::None,
                // Opportunistic recovery, bypassing any pending backoff timer
                _ => {
                    self.state = ConnState::Connecting;
                    ConnAction::Connect
                }
            },
        }
    }

    fn on_closed(&mut self, code: Option<u16>) -> ConnAction {
        if code == Some(NORMAL_CLOSURE_CODE) {
            // Deliberate closure: terminal for this session
            self.state = ConnState::Disconnected;
            return ConnAction::None;
        }

        if self.attempts < MAX_RECONNECT_ATTEMPTS {
            // Increment first, then compute base * 2^(attempt - 1)
            self.attempts += 1;
            let delay = BASE_RECONNECT_DELAY * 2u32.pow(self.attempts - 1);
            self.state = ConnState::ReconnectScheduled;
            ConnAction::ScheduleReconnect(delay)
        } else {
            // Attempts exhausted: fail silently
            self.state = ConnState::Disconnected;
            ConnAction::None
        }
    }
}
