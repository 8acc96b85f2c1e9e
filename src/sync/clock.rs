use std::sync::atomic::{AtomicU64, Ordering};

/// Per-process monotonically increasing counter used to order the events a
/// node emits. Each node's clock is independent; there is no cross-process
/// consensus, only local causal ordering for observers.
#[derive(Debug, Default)]
pub struct LogicalClock {
    value: AtomicU64,
}

impl LogicalClock {
    pub fn new() -> Self {
        LogicalClock {
            value: AtomicU64::new(0),
        }
    }

    /// Increments the clock and returns the new value.
    pub fn tick(&self) -> u64 {
        self.value.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Reads the current value without mutating it.
    pub fn get(&self) -> u64 {
        self.value.load(Ordering::SeqCst)
    }

    /// Merges a timestamp observed on a received message: raises the local
    /// clock to at least `received`, then ticks. Never decreases the clock.
    pub fn update(&self, received: u64) -> u64 {
        self.value.fetch_max(received, Ordering::SeqCst);
        self.tick()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tick_is_strictly_increasing() {
        let clock = LogicalClock::new();
        let mut last = clock.get();
        for _ in 0..100 {
            let next = clock.tick();
            assert!(next > last);
            last = next;
        }
    }

    #[test]
    fn update_never_decreases() {
        let clock = LogicalClock::new();
        clock.update(50);
        assert!(clock.get() > 50);
        let before = clock.get();
        clock.update(3);
        assert!(clock.get() > before);
    }

    #[test]
    fn get_does_not_mutate() {
        let clock = LogicalClock::new();
        clock.tick();
        let a = clock.get();
        let b = clock.get();
        assert_eq!(a, b);
    }
}
