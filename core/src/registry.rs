//! Per-terminal lifecycle bookkeeping.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// Lifecycle of a card terminal.
/// The port number lives inside the states that have one, so it cannot be
/// observed without the lifecycle it belongs to.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum Terminal {
    /// Never opened successfully.
    #[default]
    Uninitialized,

    /// Opened with `CT_init` on the port number.
    Initialized { pn: u16 },

    /// A close was attempted after being opened on the port number.
    Closed { pn: u16 },
}

impl Terminal {
    /// Port number of an open terminal.
    pub fn open_port(&self) -> Option<u16> {
        match *self {
            Terminal::Initialized { pn } => Some(pn),
            _ => None,
        }
    }

    pub fn is_initialized(&self) -> bool {
        matches!(self, Terminal::Initialized { .. })
    }
}

/// Exclusive access to one terminal's state.
/// Held for the whole call, so calls on the same terminal are serialised.
pub type TerminalGuard = OwnedMutexGuard<Terminal>;

/// Map from card terminal number to its state, with one lock per terminal.
#[derive(Debug, Default)]
pub struct Registry {
    terminals: Mutex<HashMap<u16, Arc<AsyncMutex<Terminal>>>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Locks the terminal, creating an uninitialized entry on first reference.
    /// Waiters acquire the lock in the order they asked for it.
    pub async fn lock(&self, ctn: u16) -> TerminalGuard {
        let entry = Arc::clone(self.terminals.lock().entry(ctn).or_default());

        entry.lock_owned().await
    }

    /// Snapshot of a terminal's state. Waits for any call in flight on it.
    pub async fn get(&self, ctn: u16) -> Terminal {
        *self.lock(ctn).await
    }

    /// Forgets every terminal.
    pub fn clear(&self) {
        self.terminals.lock().clear();
    }

    /// Number of terminals referenced so far.
    pub fn len(&self) -> usize {
        self.terminals.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn entries_start_uninitialized() {
        let registry = Registry::new();

        assert!(registry.is_empty());
        assert_eq!(registry.get(1).await, Terminal::Uninitialized);
        assert_eq!(registry.len(), 1);
    }

    #[tokio::test]
    async fn transitions_are_kept() {
        let registry = Registry::new();

        *registry.lock(1).await = Terminal::Initialized { pn: 4 };
        assert_eq!(registry.get(1).await.open_port(), Some(4));
        assert_eq!(registry.get(2).await, Terminal::Uninitialized);

        *registry.lock(1).await = Terminal::Closed { pn: 4 };
        let terminal = registry.get(1).await;
        assert!(!terminal.is_initialized());
        assert_eq!(terminal, Terminal::Closed { pn: 4 });
        assert_eq!(terminal.open_port(), None);
    }

    #[tokio::test]
    async fn clear_forgets_terminals() {
        let registry = Registry::new();
        *registry.lock(1).await = Terminal::Initialized { pn: 1 };

        registry.clear();

        assert!(registry.is_empty());
        assert_eq!(registry.get(1).await, Terminal::Uninitialized);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn same_terminal_is_exclusive() {
        let registry = Arc::new(Registry::new());
        let guard = registry.lock(1).await;

        let contender = {
            let registry = Arc::clone(&registry);
            tokio::spawn(async move { registry.get(1).await })
        };

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!contender.is_finished());

        // Other terminals are not blocked meanwhile.
        assert_eq!(registry.get(2).await, Terminal::Uninitialized);

        let mut guard = guard;
        *guard = Terminal::Initialized { pn: 9 };
        drop(guard);

        assert_eq!(contender.await.unwrap(), Terminal::Initialized { pn: 9 });
    }
}
