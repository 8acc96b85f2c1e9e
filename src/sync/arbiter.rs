use std::sync::Mutex;
use tokio::sync::Notify;

#[derive(Debug)]
struct ArbiterState {
    turn: usize,
    closed: bool,
}

/// Round-robin turn-taking primitive serializing the green phases of the
/// roads feeding one crossroad. At most one slot holds the turn at any
/// instant; the rotation is strict (0, 1, .., N-1, 0, ..), never skipped.
/// The turn index is the only state shared between light workers and no
/// other component touches it.
#[derive(Debug)]
pub struct RoundRobinArbiter {
    slots: usize,
    state: Mutex<ArbiterState>,
    notify: Notify,
}

impl RoundRobinArbiter {
    /// Creates an arbiter for `slots` competing roads. Slot 0 holds the
    /// first turn.
    pub fn new(slots: usize) -> Self {
        assert!(slots > 0, "arbiter needs at least one slot");
        RoundRobinArbiter {
            slots,
            state: Mutex::new(ArbiterState {
                turn: 0,
                closed: false,
            }),
            notify: Notify::new(),
        }
    }

    pub fn slots(&self) -> usize {
        self.slots
    }

    /// Suspends until the turn index equals `slot`. Returns `false` when the
    /// arbiter was closed, so a blocked worker can observe shutdown.
    pub async fn await_turn(&self, slot: usize) -> bool {
        loop {
            let notified = self.notify.notified();
            {
                let state = self.state.lock().unwrap();
                if state.closed {
                    return false;
                }
                if state.turn == slot {
                    return true;
                }
            }
            notified.await;
        }
    }

    /// Advances the turn cyclically and wakes all waiters. A worker that
    /// never calls this starves its peers; that liveness risk is accepted.
    pub fn end_turn(&self) {
        {
            let mut state = self.state.lock().unwrap();
            state.turn = (state.turn + 1) % self.slots;
        }
        self.notify.notify_waiters();
    }

    /// Wakes every waiter with a shutdown signal.
    pub fn close(&self) {
        {
            let mut state = self.state.lock().unwrap();
            state.closed = true;
        }
        self.notify.notify_waiters();
    }

    /// Current turn index, for diagnostics.
    pub fn current_turn(&self) -> usize {
        self.state.lock().unwrap().turn
    }
}
