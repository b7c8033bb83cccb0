//! Pending interrupt requests.
//!
//! Seven FIFO queues, one per priority level, plus an "outstanding" flag the
//! interpreter polls at every instruction boundary. Producers (simulated
//! peripherals on other threads) enqueue through an [`InterruptRequester`];
//! only the interpreter's own thread dequeues, via
//! [`Context::maybe_deliver_interrupt`](crate::Context::maybe_deliver_interrupt).

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;

/// Number of interrupt priority levels (1-7).
pub const LEVELS: usize = 7;

/// The seven per-level queues.
#[derive(Debug, Default)]
pub struct InterruptQueues {
    /// `levels[0]` is priority 1, `levels[6]` is priority 7.
    levels: Mutex<[VecDeque<u8>; LEVELS]>,
    outstanding: AtomicBool,
}

/// A request selected for delivery: its priority and vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pending {
    /// Priority level, 1-7.
    pub priority: u8,
    /// Vector number.
    pub vector: u8,
}

impl InterruptQueues {
    /// Create an idle set of queues.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueue `vector` at `priority`.
    ///
    /// Returns `false` (and changes nothing) unless `priority` is 1-7.
    pub fn request(&self, priority: u8, vector: u8) -> bool {
        if !(1..=7).contains(&priority) {
            tracing::warn!("rejected interrupt request at priority {priority} (vector {vector})");
            return false;
        }
        let mut levels = self.levels.lock();
        levels[usize::from(priority - 1)].push_back(vector);
        self.outstanding.store(true, Ordering::Release);
        tracing::trace!("interrupt requested: priority {priority}, vector {vector}");
        true
    }

    /// True if any queue holds a request.
    #[must_use]
    pub fn is_outstanding(&self) -> bool {
        self.outstanding.load(Ordering::Acquire)
    }

    /// The front of the highest non-empty queue, if it beats `mask`.
    ///
    /// Priority 7 is non-maskable; any other level must be strictly above
    /// the mask. The request stays queued.
    #[must_use]
    pub fn eligible(&self, mask: u8) -> Option<Pending> {
        if !self.is_outstanding() {
            return None;
        }
        let levels = self.levels.lock();
        let (index, queue) = levels
            .iter()
            .enumerate()
            .rev()
            .find(|(_, queue)| !queue.is_empty())?;
        let priority = index as u8 + 1;
        if priority != 7 && priority <= mask {
            return None;
        }
        queue.front().map(|&vector| Pending { priority, vector })
    }

    /// Remove the front request at `priority` and recompute the flag.
    ///
    /// Producers only append, so the front seen by [`eligible`](Self::eligible)
    /// is still the front here.
    pub fn acknowledge(&self, priority: u8) -> Option<u8> {
        let mut levels = self.levels.lock();
        let vector = levels
            .get_mut(usize::from(priority).wrapping_sub(1))?
            .pop_front();
        let any = levels.iter().any(|queue| !queue.is_empty());
        self.outstanding.store(any, Ordering::Release);
        vector
    }

    /// Number of requests waiting at `priority` (0 for invalid levels).
    #[must_use]
    pub fn pending_at(&self, priority: u8) -> usize {
        let levels = self.levels.lock();
        usize::from(priority)
            .checked_sub(1)
            .and_then(|index| levels.get(index))
            .map_or(0, VecDeque::len)
    }

    /// Drop every queued request.
    pub fn clear(&self) {
        let mut levels = self.levels.lock();
        for queue in levels.iter_mut() {
            queue.clear();
        }
        self.outstanding.store(false, Ordering::Release);
    }
}

/// A cloneable handle for posting interrupts from any thread.
#[derive(Debug, Clone)]
pub struct InterruptRequester {
    queues: Arc<InterruptQueues>,
}

impl InterruptRequester {
    pub(crate) fn new(queues: Arc<InterruptQueues>) -> Self {
        Self { queues }
    }

    /// Post `vector` at `priority` (1-7). Returns `false` if rejected.
    pub fn request(&self, priority: u8, vector: u8) -> bool {
        self.queues.request(priority, vector)
    }
}
