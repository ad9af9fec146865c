//! # Shared State
//!
//! The only handle worker tasks and the admin console hold on the game state.
//!
//! # Thread Safety
//!
//! A single `parking_lot::RwLock` guards the tables. Queries take the shared
//! mode and may run concurrently; admin commands take the exclusive mode.
//! Access is closure-scoped, so the guard is released on every exit path,
//! panics included, and can never be held across an `.await`.

use crate::state::GameState;
use parking_lot::RwLock;
use std::sync::Arc;

/// Cloneable, lock-guarded handle to the game state
#[derive(Debug, Clone, Default)]
pub struct SharedState {
    inner: Arc<RwLock<GameState>>,
}

impl SharedState {
    pub fn new(state: GameState) -> Self {
        Self {
            inner: Arc::new(RwLock::new(state)),
        }
    }

    /// Run `f` against a read-only view of the state
    ///
    /// Several readers may hold the lock at once; writers wait.
    #[inline]
    pub fn read<R>(&self, f: impl FnOnce(&GameState) -> R) -> R {
        let guard = self.inner.read();
        f(&guard)
    }

    /// Run `f` with exclusive access to the state
    #[inline]
    pub fn write<R>(&self, f: impl FnOnce(&mut GameState) -> R) -> R {
        let mut guard = self.inner.write();
        f(&mut guard)
    }

    /// Copy of the current state
    pub fn snapshot(&self) -> GameState {
        self.read(GameState::clone)
    }
}
