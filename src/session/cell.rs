//! Observable single-slot holder for [`SessionState`].

use crate::session::state::SessionState;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;

type Observer = Arc<dyn Fn(&SessionState) + Send + Sync>;

/// Identifies the submission allowed to write to a [`StateCell`].
///
/// Only the ticket handed out by the most recent [`StateCell::begin`] is
/// current; [`StateCell::reset`] invalidates every outstanding ticket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket(u64);

struct CellInner {
    epoch: u64,
    observers: Vec<Observer>,
    // Transitions not yet handed to observers, oldest first.
    pending: VecDeque<SessionState>,
    delivering: bool,
}

/// Current session state plus change notification.
///
/// All writes go through one lock, so observers see transitions in the order
/// they happened. Observers are called after that lock is released and may
/// write back into the cell; such writes are delivered once the current
/// round of callbacks finishes.
pub struct StateCell {
    inner: Mutex<CellInner>,
    tx: watch::Sender<SessionState>,
}

impl Default for StateCell {
    fn default() -> Self {
        Self::new()
    }
}

impl StateCell {
    /// Creates a cell holding [`SessionState::Initial`].
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(SessionState::Initial);
        Self {
            inner: Mutex::new(CellInner {
                epoch: 0,
                observers: Vec::new(),
                pending: VecDeque::new(),
                delivering: false,
            }),
            tx,
        }
    }

    /// Returns a copy of the current state.
    pub fn current(&self) -> SessionState {
        self.tx.borrow().clone()
    }

    /// Returns a receiver that always holds the latest state.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.tx.subscribe()
    }

    /// Registers a callback invoked synchronously on every transition.
    pub fn observe(&self, observer: impl Fn(&SessionState) + Send + Sync + 'static) {
        self.lock().observers.push(Arc::new(observer));
    }

    /// Starts a new submission: invalidates older tickets and moves to `Loading`.
    pub fn begin(&self) -> Ticket {
        let ticket = {
            let mut inner = self.lock();
            inner.epoch += 1;
            self.write(&mut inner, SessionState::Loading);
            Ticket(inner.epoch)
        };
        self.deliver();
        ticket
    }

    /// Moves back to `Initial` and invalidates every outstanding ticket.
    pub fn reset(&self) {
        {
            let mut inner = self.lock();
            inner.epoch += 1;
            self.write(&mut inner, SessionState::Initial);
        }
        self.deliver();
    }

    /// Writes `state` if `ticket` is still current. Returns whether it was written.
    pub fn publish(&self, ticket: Ticket, state: SessionState) -> bool {
        {
            let mut inner = self.lock();
            if inner.epoch != ticket.0 {
                tracing::debug!(
                    ticket = ticket.0,
                    current = inner.epoch,
                    state = state.name(),
                    "discarding write from superseded submission"
                );
                return false;
            }
            self.write(&mut inner, state);
        }
        self.deliver();
        true
    }

    /// Returns true if `ticket` may still write.
    pub fn is_current(&self, ticket: Ticket) -> bool {
        self.lock().epoch == ticket.0
    }

    fn write(&self, inner: &mut CellInner, state: SessionState) {
        tracing::trace!(state = state.name(), "session transition");
        self.tx.send_replace(state.clone());
        inner.pending.push_back(state);
    }

    /// Hands queued transitions to observers, unless another call is already
    /// doing so further up the stack or on another thread.
    fn deliver(&self) {
        {
            let mut inner = self.lock();
            if inner.delivering {
                return;
            }
            inner.delivering = true;
        }
        let mut guard = DeliveryGuard {
            cell: self,
            armed: true,
        };

        loop {
            let (state, observers) = {
                let mut inner = self.lock();
                match inner.pending.pop_front() {
                    Some(state) => (state, inner.observers.clone()),
                    None => {
                        inner.delivering = false;
                        guard.armed = false;
                        return;
                    }
                }
            };
            for observer in &observers {
                observer(&state);
            }
        }
    }

    fn lock(&self) -> MutexGuard<'_, CellInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Releases the delivery flag if an observer panics.
struct DeliveryGuard<'a> {
    cell: &'a StateCell,
    armed: bool,
}

impl Drop for DeliveryGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.cell.lock().delivering = false;
        }
    }
}
