//! Session client handle.
//!
//! [`SessionClient`] is the entry point for calling code. It owns the
//! session state, the connection to the game engine and the shutdown hook
//! that auto-saves when the host exits.
//!
//! # Example
//!
//! ```no_run
//! use trpg_session::SessionClient;
//!
//! # async fn example() -> trpg_session::Result<()> {
//! let mut client = SessionClient::builder()
//!     .ws_base("ws://localhost:8000")
//!     .build()?;
//!
//! client.connect("a1b2c3").await?;
//! client.send_action("I examine the bookshelf");
//!
//! let phase = client.store().phase().to_string();
//! println!("phase: {phase}");
//!
//! client.save_game(None);
//! client.disconnect();
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::{Arc, Weak};

use parking_lot::{MappedRwLockReadGuard, Mutex, RwLock, RwLockReadGuard};
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::identifiers::{CharacterId, HookId, SessionId};
use crate::lifecycle::ShutdownNotifier;
use crate::state::{Character, SessionStore};
use crate::transport::{
    Connection, Effect, Epoch, Input, LinkState, SessionCell, SharedCell, open_socket,
};

use super::builder::SessionClientBuilder;
use super::config::ClientConfig;

// ============================================================================
// Types
// ============================================================================

/// State shared with the event loop and the shutdown hook.
struct SessionInner {
    /// Machine and store.
    cell: SharedCell,
    /// Live connection, if any.
    connection: Mutex<Option<Connection>>,
}

impl SessionInner {
    /// Applies a caller input and performs the resulting send.
    ///
    /// Lock order: cell, then connection. The cell lock is released before
    /// the connection lock is taken.
    fn execute(&self, input: Input) {
        let effect = match self.cell.write().apply(input) {
            Ok(effect) => effect,
            Err(e) => {
                warn!(error = %e, "Input rejected");
                return;
            }
        };

        if let Some(Effect::Send(command)) = effect {
            let kind = command.kind();
            let sent = self
                .connection
                .lock()
                .as_ref()
                .is_some_and(|connection| connection.send(command));
            if !sent {
                debug!(kind, "Command dropped, no running connection");
            }
        }
    }
}

// ============================================================================
// PendingOpen
// ============================================================================

/// Reports a close for an epoch whose handshake never completed.
struct PendingOpen<'a> {
    cell: &'a SharedCell,
    epoch: Epoch,
    armed: bool,
}

impl<'a> PendingOpen<'a> {
    fn new(cell: &'a SharedCell, epoch: Epoch) -> Self {
        Self {
            cell,
            epoch,
            armed: true,
        }
    }

    /// Handshake succeeded; nothing to close.
    fn commit(mut self) {
        self.armed = false;
    }
}

impl Drop for PendingOpen<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }

        debug!(epoch = self.epoch, "Handshake abandoned");
        if let Err(e) = self.cell.write().apply(Input::Closed { epoch: self.epoch }) {
            warn!(error = %e, "Close notification rejected");
        }
    }
}

// ============================================================================
// SessionClient
// ============================================================================

/// Handle to one game session.
///
/// Dropping the client disconnects it.
pub struct SessionClient {
    /// Validated configuration.
    config: ClientConfig,
    /// Host shutdown notifier.
    notifier: ShutdownNotifier,
    /// Registered shutdown hook, while connected.
    hook: Option<HookId>,
    /// Shared state.
    inner: Arc<SessionInner>,
}

impl fmt::Debug for SessionClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionClient")
            .field("ws_base", &self.config.ws_base().as_str())
            .field("state", &self.link_state())
            .field("hook", &self.hook)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// SessionClient - Constructor
// ============================================================================

impl SessionClient {
    /// Creates a configuration builder.
    #[inline]
    #[must_use]
    pub fn builder() -> SessionClientBuilder {
        SessionClientBuilder::new()
    }

    /// Creates an idle client.
    #[must_use]
    pub fn new(config: ClientConfig, notifier: ShutdownNotifier) -> Self {
        Self {
            config,
            notifier,
            hook: None,
            inner: Arc::new(SessionInner {
                cell: Arc::new(RwLock::new(SessionCell::new())),
                connection: Mutex::new(None),
            }),
        }
    }
}

// ============================================================================
// SessionClient - Lifecycle
// ============================================================================

impl SessionClient {
    /// Opens the channel for a session.
    ///
    /// Valid from `Idle` or `Closed`. On success connectivity is true and
    /// inbound frames start flowing into the store. A failed or cancelled
    /// handshake is treated like a close.
    ///
    /// # Errors
    ///
    /// - [`Error::Config`](crate::Error::Config) if the session ID is empty
    /// - [`Error::InvalidTransition`](crate::Error::InvalidTransition) if a
    ///   connection is already opening or open
    /// - [`Error::Connection`](crate::Error::Connection) if the handshake fails
    pub async fn connect(&mut self, session_id: impl Into<SessionId>) -> Result<()> {
        let session_id = session_id.into();
        let url = self.config.endpoint(&session_id)?;

        let effect = self.inner.cell.write().apply(Input::Connect {
            session_id: session_id.clone(),
            url,
        })?;
        let Some(Effect::Open { url, epoch }) = effect else {
            return Ok(());
        };

        // Closes this epoch if the handshake fails or this future is dropped.
        let pending = PendingOpen::new(&self.inner.cell, epoch);

        if let Some(stale) = self.inner.connection.lock().take() {
            if stale.is_running() {
                debug!(epoch = stale.epoch(), "Shutting down superseded connection");
                stale.shutdown();
            }
        }

        let socket = match open_socket(&url).await {
            Ok(socket) => socket,
            Err(e) => {
                warn!(%session_id, error = %e, "Connection failed");
                return Err(e);
            }
        };
        pending.commit();

        // Hold the cell lock until the loop is registered so no frame can be
        // dispatched before the machine is open.
        let mut cell = self.inner.cell.write();
        cell.apply(Input::Opened { epoch })?;
        let connection = Connection::spawn(socket, epoch, Arc::clone(&self.inner.cell));
        *self.inner.connection.lock() = Some(connection);
        drop(cell);

        self.install_hook();

        info!(%session_id, epoch, "Session connected");
        Ok(())
    }

    /// Tears the session down.
    ///
    /// Unregisters the shutdown hook, closes the channel if open and releases
    /// the handle. Safe to call in any state; always ends `Idle`.
    pub fn disconnect(&mut self) {
        if let Some(id) = self.hook.take() {
            self.notifier.unregister(id);
        }

        let effect = match self.inner.cell.write().apply(Input::Disconnect) {
            Ok(effect) => effect,
            Err(e) => {
                warn!(error = %e, "Disconnect rejected");
                None
            }
        };

        if let Some(connection) = self.inner.connection.lock().take() {
            connection.shutdown();
        }

        if effect == Some(Effect::Close) {
            info!("Session disconnected");
        }
    }

    /// Registers the auto-save hook unless one is already registered.
    fn install_hook(&mut self) {
        if self.hook.is_some() {
            return;
        }

        let weak: Weak<SessionInner> = Arc::downgrade(&self.inner);
        let id = self.notifier.register(Box::new(move || {
            if let Some(inner) = weak.upgrade() {
                inner.execute(Input::AutoSave);
            }
        }));
        self.hook = Some(id);
    }
}

// ============================================================================
// SessionClient - Commands
// ============================================================================

impl SessionClient {
    /// Sends a player action for the active character.
    ///
    /// Dropped silently unless the channel is open; nothing is queued.
    pub fn send_action(&self, content: impl Into<String>) {
        self.inner.execute(Input::SendAction {
            content: content.into(),
        });
    }

    /// Requests a save to `slot`, or to `"manual"` when `None`.
    ///
    /// Dropped silently unless the channel is open.
    pub fn save_game(&self, slot: Option<&str>) {
        self.inner.execute(Input::SaveGame {
            slot: slot.map(str::to_string),
        });
    }

    /// Sends a keepalive; the engine answers with `pong`.
    ///
    /// Dropped silently unless the channel is open.
    pub fn ping(&self) {
        self.inner.execute(Input::Ping);
    }
}

// ============================================================================
// SessionClient - State Access
// ============================================================================

impl SessionClient {
    /// Read access to the session state.
    ///
    /// Inbound dispatch waits while the guard is held; keep it short. Do not
    /// hold it across an `.await` or while calling
    /// [`ShutdownNotifier::fire`]: both the event loop and the shutdown hook
    /// take the write lock and would deadlock.
    #[must_use]
    pub fn store(&self) -> MappedRwLockReadGuard<'_, SessionStore> {
        RwLockReadGuard::map(self.inner.cell.read(), SessionCell::store)
    }

    /// Clone of the current session state.
    #[must_use]
    pub fn snapshot(&self) -> SessionStore {
        self.inner.cell.read().store().clone()
    }

    /// Current link state.
    #[must_use]
    pub fn link_state(&self) -> LinkState {
        self.inner.cell.read().machine().state()
    }

    /// Client configuration.
    #[inline]
    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Notifier the shutdown hook is registered with.
    #[inline]
    #[must_use]
    pub fn shutdown_notifier(&self) -> &ShutdownNotifier {
        &self.notifier
    }

    /// Sets the session identity and scenario title.
    pub fn set_session(&self, session_id: impl Into<SessionId>, title: impl Into<String>) {
        self.inner.cell.write().store.set_session(session_id, title);
    }

    /// Replaces the party.
    pub fn set_party(&self, party: impl IntoIterator<Item = Character>) {
        self.inner.cell.write().store.set_party(party);
    }

    /// Inserts or replaces one party member.
    pub fn upsert_character(&self, character: Character) {
        self.inner.cell.write().store.upsert_character(character);
    }

    /// Selects the character that player actions are sent for.
    pub fn select_character(&self, id: impl Into<CharacterId>) {
        self.inner.cell.write().store.select_character(id);
    }
}

impl Drop for SessionClient {
    fn drop(&mut self) {
        self.disconnect();
    }
}

// ============================================================================
// Tests
// ============================================================================
