//! Host shutdown notifications.
//!
//! The host application owns a [`ShutdownNotifier`] and calls
//! [`ShutdownNotifier::fire`] once when it is about to exit. Components that
//! need a last word register a hook while they are running and unregister it
//! when they stop, so nothing lingers in process-wide state.
//!
//! # Example
//!
//! ```no_run
//! use trpg_session::{SessionClient, ShutdownNotifier};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let notifier = ShutdownNotifier::new();
//! let mut client = SessionClient::builder()
//!     .ws_base("ws://localhost:8000")
//!     .shutdown_notifier(notifier.clone())
//!     .build()?;
//!
//! client.connect("a1b2c3").await?;
//!
//! tokio::signal::ctrl_c().await?;
//! notifier.fire(); // sends an "auto" save if the channel is open
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use tracing::debug;

use crate::identifiers::HookId;

// ============================================================================
// Types
// ============================================================================

/// Callback run when the host shuts down.
///
/// Hooks must not block; they run on the thread that calls `fire`.
pub type ShutdownHook = Box<dyn Fn() + Send + Sync>;

/// Registered hooks by ID.
type HookMap = FxHashMap<HookId, Arc<dyn Fn() + Send + Sync>>;

// ============================================================================
// ShutdownNotifier
// ============================================================================

/// Registry of shutdown hooks that fires at most once.
///
/// Cloning yields another handle to the same registry.
#[derive(Clone, Default)]
pub struct ShutdownNotifier {
    inner: Arc<NotifierInner>,
}

#[derive(Default)]
struct NotifierInner {
    hooks: Mutex<HookMap>,
    fired: AtomicBool,
}

impl fmt::Debug for ShutdownNotifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShutdownNotifier")
            .field("hooks", &self.hook_count())
            .field("fired", &self.has_fired())
            .finish()
    }
}

impl ShutdownNotifier {
    /// Creates an empty registry.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a hook.
    pub fn register(&self, hook: ShutdownHook) -> HookId {
        let id = HookId::generate();
        self.inner.hooks.lock().insert(id, Arc::from(hook));
        debug!(%id, "Shutdown hook registered");
        id
    }

    /// Unregisters a hook.
    ///
    /// Returns `false` if the ID was not registered.
    pub fn unregister(&self, id: HookId) -> bool {
        let removed = self.inner.hooks.lock().remove(&id).is_some();
        if removed {
            debug!(%id, "Shutdown hook unregistered");
        }
        removed
    }

    /// Runs every registered hook.
    ///
    /// Only the first call has an effect. Returns the number of hooks run.
    pub fn fire(&self) -> usize {
        if self.inner.fired.swap(true, Ordering::AcqRel) {
            return 0;
        }

        // Snapshot so hooks can unregister themselves without deadlocking.
        let hooks: Vec<_> = self.inner.hooks.lock().values().cloned().collect();
        for hook in &hooks {
            hook();
        }

        debug!(count = hooks.len(), "Shutdown hooks fired");
        hooks.len()
    }

    /// Returns `true` once [`fire`](Self::fire) has been called.
    #[inline]
    #[must_use]
    pub fn has_fired(&self) -> bool {
        self.inner.fired.load(Ordering::Acquire)
    }

    /// Number of registered hooks.
    #[inline]
    #[must_use]
    pub fn hook_count(&self) -> usize {
        self.inner.hooks.lock().len()
    }
}

// ============================================================================
// Tests
// ============================================================================
