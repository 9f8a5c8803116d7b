use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

/// Iteration lifecycle: `NEW → RUNNING → (STOPPING → STOPPED |
/// TERMINATED)`. Only `Running`/`Stopping`/`Terminated` are ever reached by
/// the engine; `New`/`Stopped` exist purely for external observability.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum IterationState {
    New = 0,
    Running = 1,
    Stopping = 2,
    Stopped = 3,
    Terminated = 4,
}

impl IterationState {
    fn from_u8(v: u8) -> Self {
        match v {
            0 => IterationState::New,
            1 => IterationState::Running,
            2 => IterationState::Stopping,
            3 => IterationState::Stopped,
            _ => IterationState::Terminated,
        }
    }
}

/// A cheaply-cloneable, externally observable handle on one Iteration's
/// lifecycle state.
#[derive(Clone)]
pub struct IterationStateHandle(Arc<AtomicU8>);

impl IterationStateHandle {
    pub fn new() -> Self {
        Self(Arc::new(AtomicU8::new(IterationState::New as u8)))
    }

    pub fn get(&self) -> IterationState {
        IterationState::from_u8(self.0.load(Ordering::SeqCst))
    }

    pub fn set(&self, state: IterationState) {
        self.0.store(state as u8, Ordering::SeqCst);
    }
}

impl Default for IterationStateHandle {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_new_and_tracks_transitions() {
        let handle = IterationStateHandle::new();
        assert_eq!(handle.get(), IterationState::New);
        handle.set(IterationState::Running);
        assert_eq!(handle.get(), IterationState::Running);
        let clone = handle.clone();
        handle.set(IterationState::Terminated);
        assert_eq!(clone.get(), IterationState::Terminated);
    }
}
