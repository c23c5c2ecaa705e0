//! Poll tally for the active question.

use crate::models::{OptionId, Question};
use crate::protocol::TallySnapshot;

#[derive(Debug, Clone)]
struct TallyEntry {
    id: OptionId,
    text: String,
    votes: u32,
}

/// Vote counts per option, keyed by option id.
#[derive(Debug, Default)]
pub struct PollTally {
    entries: Vec<TallyEntry>,
}

impl PollTally {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace every count with a zero entry per option of `question`.
    pub fn reset(&mut self, question: &Question) {
        self.entries = question
            .options
            .iter()
            .map(|opt| TallyEntry {
                id: opt.id,
                text: opt.text.clone(),
                votes: 0,
            })
            .collect();
    }

    /// Count one vote. Returns false if the option is not part of the tally.
    pub fn record(&mut self, option: OptionId) -> bool {
        match self.entries.iter_mut().find(|e| e.id == option) {
            Some(entry) => {
                entry.votes += 1;
                true
            }
            None => false,
        }
    }

    pub fn snapshot(&self) -> TallySnapshot {
        TallySnapshot(
            self.entries
                .iter()
                .map(|e| (e.text.clone(), e.votes))
                .collect(),
        )
    }
}
