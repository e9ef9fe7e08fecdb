//! Connection state machine and inbound dispatch.
//!
//! [`SessionMachine`] tracks the link state and turns inputs (caller
//! operations and I/O notifications) into store mutations plus at most one
//! [`Effect`] for the I/O adapter to perform. It never touches the network,
//! so every transition is testable without a socket.
//!
//! # States
//!
//! ```text
//!            Connect            Opened
//!   Idle ─────────────► Connecting ──────► Open
//!    ▲                      │               │
//!    │ Disconnect           │ Closed        │ Closed
//!    │ (from any state)     ▼               ▼
//!    └─────────────────── Closed ◄──────────┘
//!                            │
//!                            └── Connect ──► Connecting
//! ```
//!
//! # Epochs
//!
//! Each `Connect` and `Disconnect` bumps the epoch. I/O notifications carry
//! the epoch of the connection that produced them and are ignored when it is
//! no longer current, so a late close from a torn-down socket cannot flip the
//! state of its successor.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use tracing::{debug, trace};
use url::Url;

use crate::error::{Error, Result};
use crate::identifiers::SessionId;
use crate::protocol::{ClientCommand, ServerEvent};
use crate::state::{NarrativeKind, SessionStore};

// ============================================================================
// Types
// ============================================================================

/// Connection generation counter.
pub type Epoch = u64;

// ============================================================================
// LinkState
// ============================================================================

/// Lifecycle state of the session channel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum LinkState {
    /// No connection requested.
    #[default]
    Idle,
    /// Connection requested, not yet open.
    Connecting,
    /// Channel open; frames flow both ways.
    Open,
    /// Channel closed by either side or failed to open.
    Closed,
}

impl LinkState {
    /// Returns `true` if a new connection may be started.
    #[inline]
    #[must_use]
    pub const fn can_connect(self) -> bool {
        matches!(self, Self::Idle | Self::Closed)
    }

    /// Returns `true` if a live socket may exist.
    #[inline]
    #[must_use]
    pub const fn is_active(self) -> bool {
        matches!(self, Self::Connecting | Self::Open)
    }
}

impl fmt::Display for LinkState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Idle => "idle",
            Self::Connecting => "connecting",
            Self::Open => "open",
            Self::Closed => "closed",
        })
    }
}

// ============================================================================
// Input / Effect
// ============================================================================

/// Something that happened to the session.
#[derive(Debug, Clone)]
pub enum Input {
    /// Caller asked to connect.
    Connect {
        /// Session to join.
        session_id: SessionId,
        /// Resolved endpoint.
        url: Url,
    },
    /// Socket handshake completed.
    Opened {
        /// Connection generation.
        epoch: Epoch,
    },
    /// Frame decoded from the socket.
    Event {
        /// Connection generation.
        epoch: Epoch,
        /// Decoded frame.
        event: ServerEvent,
    },
    /// Socket closed, cleanly or not.
    Closed {
        /// Connection generation.
        epoch: Epoch,
    },
    /// Player action from the caller.
    SendAction {
        /// Action text.
        content: String,
    },
    /// Save request from the caller.
    SaveGame {
        /// Slot label, `"manual"` when `None`.
        slot: Option<String>,
    },
    /// Host is shutting down.
    AutoSave,
    /// Keepalive request from the caller.
    Ping,
    /// Caller tore the session down.
    Disconnect,
}

/// I/O the adapter must perform after a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Open a socket to `url` for connection generation `epoch`.
    Open {
        /// Endpoint.
        url: Url,
        /// Connection generation.
        epoch: Epoch,
    },
    /// Write a command to the open socket.
    Send(ClientCommand),
    /// Close the current socket.
    Close,
}

// ============================================================================
// SessionMachine
// ============================================================================

/// Link state plus connection generation.
#[derive(Debug, Clone, Default)]
pub struct SessionMachine {
    state: LinkState,
    epoch: Epoch,
}

impl SessionMachine {
    /// Creates an idle machine.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current link state.
    #[inline]
    #[must_use]
    pub const fn state(&self) -> LinkState {
        self.state
    }

    /// Current connection generation.
    #[inline]
    #[must_use]
    pub const fn epoch(&self) -> Epoch {
        self.epoch
    }

    /// Applies one input.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidTransition`] when connecting while already connecting
    /// or open. Every other input is total.
    pub fn handle(&mut self, store: &mut SessionStore, input: Input) -> Result<Option<Effect>> {
        match input {
            Input::Connect { session_id, url } => {
                if !self.state.can_connect() {
                    return Err(Error::invalid_transition("connect", self.state));
                }

                if store.session_id() != &session_id {
                    store.set_session(session_id, String::new());
                }

                self.epoch += 1;
                self.state = LinkState::Connecting;
                debug!(epoch = self.epoch, %url, "Connecting");

                Ok(Some(Effect::Open {
                    url,
                    epoch: self.epoch,
                }))
            }

            Input::Opened { epoch } => {
                if self.is_current(epoch) && self.state == LinkState::Connecting {
                    self.state = LinkState::Open;
                    store.set_connected(true);
                    debug!(epoch, "Channel open");
                } else {
                    trace!(epoch, current = self.epoch, "Ignoring stale open");
                }
                Ok(None)
            }

            Input::Event { epoch, event } => {
                if self.is_current(epoch) && self.state == LinkState::Open {
                    dispatch(store, event);
                } else {
                    trace!(epoch, state = %self.state, "Ignoring frame outside open channel");
                }
                Ok(None)
            }

            Input::Closed { epoch } => {
                if self.is_current(epoch) && self.state.is_active() {
                    self.state = LinkState::Closed;
                    store.set_connected(false);
                    debug!(epoch, "Channel closed");
                } else {
                    trace!(epoch, current = self.epoch, "Ignoring stale close");
                }
                Ok(None)
            }

            Input::SendAction { content } => Ok(self.outbound(|| {
                let character_id = store
                    .active_character()
                    .map(|c| c.id.to_string())
                    .unwrap_or_default();
                ClientCommand::player_action(character_id, content)
            })),

            Input::SaveGame { slot } => {
                Ok(self.outbound(|| ClientCommand::save_game(slot.as_deref())))
            }

            Input::AutoSave => Ok(self.outbound(ClientCommand::auto_save)),

            Input::Ping => Ok(self.outbound(|| ClientCommand::Ping)),

            Input::Disconnect => {
                let was_active = self.state.is_active();
                self.epoch += 1;
                self.state = LinkState::Idle;
                store.set_connected(false);
                debug!(was_active, "Disconnected");

                Ok(was_active.then_some(Effect::Close))
            }
        }
    }

    #[inline]
    fn is_current(&self, epoch: Epoch) -> bool {
        epoch == self.epoch
    }

    /// Builds an outbound command only while open; otherwise drops it.
    fn outbound(&self, command: impl FnOnce() -> ClientCommand) -> Option<Effect> {
        if self.state != LinkState::Open {
            trace!(state = %self.state, "Dropping command, channel not open");
            return None;
        }
        Some(Effect::Send(command()))
    }
}

// ============================================================================
// Dispatch
// ============================================================================

/// Applies one decoded frame to the store.
///
/// Unknown frames and keepalive replies leave the store untouched.
pub fn dispatch(store: &mut SessionStore, event: ServerEvent) {
    match event {
        ServerEvent::Narrative { content } => {
            store.push_narrative(NarrativeKind::Narrative, content);
        }

        ServerEvent::DiceResult {
            description,
            roll,
            target,
        } => {
            let content = description.unwrap_or_else(|| format!("Roll: {roll}/{target}"));
            store.push_narrative(NarrativeKind::DiceResult, content);
        }

        ServerEvent::NpcAction { npc_id, content } => {
            store.push_narrative(NarrativeKind::Narrative, format!("[{npc_id}] {content}"));
        }

        ServerEvent::ClueDiscovered {
            clue_id,
            description,
        } => {
            store.add_clue(description.unwrap_or(clue_id));
        }

        ServerEvent::StateUpdate {
            phase,
            atmosphere,
            turn_state,
        } => {
            if let Some(phase) = phase {
                store.set_phase(phase);
            }
            if let Some(atmosphere) = atmosphere {
                store.set_atmosphere(atmosphere);
            }
            if let Some(turn_state) = turn_state {
                store.set_turn_state(turn_state);
            }
        }

        ServerEvent::System { content } => {
            store.push_narrative(NarrativeKind::System, content);
        }

        ServerEvent::Error { content } => {
            store.push_narrative(NarrativeKind::System, format!("Error: {content}"));
        }

        ServerEvent::TurnUpdate { turn_state } => {
            store.set_turn_state(turn_state);
        }

        ServerEvent::Pong => {
            trace!("Pong received");
        }

        ServerEvent::Unknown { frame_type } => {
            trace!(?frame_type, "Ignoring unrecognized frame");
        }
    }
}

// ============================================================================
// SessionCell
// ============================================================================

/// Machine and store, mutated together under one lock.
#[derive(Debug, Clone, Default)]
pub struct SessionCell {
    /// Link state machine.
    pub(crate) machine: SessionMachine,
    /// Session state.
    pub(crate) store: SessionStore,
}

impl SessionCell {
    /// Creates an idle cell with an empty store.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds one input through the machine.
    ///
    /// # Errors
    ///
    /// See [`SessionMachine::handle`].
    #[inline]
    pub fn apply(&mut self, input: Input) -> Result<Option<Effect>> {
        self.machine.handle(&mut self.store, input)
    }

    /// Read access to the store.
    #[inline]
    #[must_use]
    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    /// Read access to the machine.
    #[inline]
    #[must_use]
    pub fn machine(&self) -> &SessionMachine {
        &self.machine
    }
}

// ============================================================================
// Tests
// ============================================================================
