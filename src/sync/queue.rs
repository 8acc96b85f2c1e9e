use std::collections::VecDeque;
use std::sync::Mutex;

/// Thread-safe unbounded FIFO used as the hand-off buffer between every pair
/// of concurrent workers inside a node. Ownership of an item transfers at
/// `push`/`try_pop`; `peek` only clones the front.
#[derive(Debug, Default)]
pub struct ConcurrentQueue<T> {
    inner: Mutex<VecDeque<T>>,
}

impl<T> ConcurrentQueue<T> {
    pub fn new() -> Self {
        ConcurrentQueue {
            inner: Mutex::new(VecDeque::new()),
        }
    }

    pub fn push(&self, item: T) {
        self.inner.lock().unwrap().push_back(item);
    }

    /// Non-blocking best-effort removal of the front item.
    pub fn try_pop(&self) -> Option<T> {
        self.inner.lock().unwrap().pop_front()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().unwrap().is_empty()
    }
}

impl<T: Clone> ConcurrentQueue<T> {
    /// Returns a copy of the front item without removing it.
    pub fn peek(&self) -> Option<T> {
        self.inner.lock().unwrap().front().cloned()
    }
}
