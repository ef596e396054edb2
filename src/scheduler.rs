use std::time::Instant;

/// Work deferred to a later tick of the event loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Deferred {
    ReloadTasks,
}

/// Deadline queue polled by the event loop. Nothing here is ever cancelled.
#[derive(Debug, Default)]
pub struct Scheduler {
    pending: Vec<(Instant, Deferred)>,
}

impl Scheduler {
    pub fn schedule(&mut self, at: Instant, work: Deferred) {
        self.pending.push((at, work));
    }

    /// Removes and returns every entry due at `now`, oldest deadline first.
    pub fn due(&mut self, now: Instant) -> Vec<Deferred> {
        let mut ready: Vec<(Instant, Deferred)> = Vec::new();
        self.pending.retain(|entry| {
            if entry.0 <= now {
                ready.push(*entry);
                false
            } else {
                true
            }
        });
        ready.sort_by_key(|entry| entry.0);
        ready.into_iter().map(|entry| entry.1).collect()
    }

    #[cfg(test)]
    pub fn count(&self, work: Deferred) -> usize {
        self.pending.iter().filter(|entry| entry.1 == work).count()
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending.iter().map(|entry| entry.0).min()
    }
}
