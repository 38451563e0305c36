use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use iva_core::conversation::ConversationLog;
use iva_core::session::Session;

/// Everything the components share. Never held across an `.await`.
#[derive(Debug, Default)]
pub(crate) struct ClientState {
    pub session: Session,
    pub log: ConversationLog,

    // Bumped on logout. Work dispatched under an older generation is stale.
    pub generation: u64,

    // In-flight operations of the current generation; `loading` is `pending > 0`.
    pub pending: u32,

    pub login_attempt: u64,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct SharedState(Arc<Mutex<ClientState>>);

impl SharedState {
    pub fn lock(&self) -> MutexGuard<'_, ClientState> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Count an operation as in flight until the guard is settled or dropped.
    pub fn begin(&self) -> PendingGuard {
        let generation = {
            let mut s = self.lock();
            s.pending += 1;
            s.generation
        };
        PendingGuard {
            state: self.clone(),
            generation,
            settled: false,
        }
    }
}

pub(crate) struct PendingGuard {
    state: SharedState,
    generation: u64,
    settled: bool,
}

impl PendingGuard {
    /// Release the pending slot and apply `f` under the same lock. `f` is told
    /// whether the operation still belongs to the current generation.
    pub fn settle<R>(mut self, f: impl FnOnce(&mut ClientState, bool) -> R) -> R {
        self.settled = true;
        let mut s = self.state.lock();
        let current = release(&mut s, self.generation);
        f(&mut s, current)
    }
}

impl Drop for PendingGuard {
    fn drop(&mut self) {
        if !self.settled {
            let mut s = self.state.lock();
            release(&mut s, self.generation);
        }
    }
}

fn release(s: &mut ClientState, generation: u64) -> bool {
    let current = s.generation == generation;
    if current {
        s.pending = s.pending.saturating_sub(1);
    }
    current
}
