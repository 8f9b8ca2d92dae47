use std::collections::HashSet;

use crate::state::GameState;

#[derive(Clone, Debug, Default)]
pub struct ExploredTrace {
    fingerprints: HashSet<u64>,
    expansions: u64,
}

impl ExploredTrace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, state: &GameState) {
        self.fingerprints.insert(state.fingerprint());
    }

    pub(crate) fn record_expansion(&mut self, parent: &GameState, child: &GameState) {
        self.expansions += 1;
        self.record(parent);
        self.record(child);
    }

    pub fn contains(&self, state: &GameState) -> bool {
        self.fingerprints.contains(&state.fingerprint())
    }

    pub fn len(&self) -> usize {
        self.fingerprints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fingerprints.is_empty()
    }

    pub fn expansions(&self) -> u64 {
        self.expansions
    }

    pub fn take(&mut self) -> HashSet<u64> {
        self.expansions = 0;
        std::mem::take(&mut self.fingerprints)
    }
}
