use serde::Serialize;
use simple_voting::Candidate;

use crate::consts::DEMO_CANDIDATES;

/// Candidate row as presented to clients.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateTally {
    pub id: u64,
    pub name: String,
    pub vote_count: u64,
}

impl From<Candidate> for CandidateTally {
    fn from(candidate: Candidate) -> Self {
        Self {
            id: candidate.id,
            name: candidate.name,
            vote_count: candidate.vote_count,
        }
    }
}

/// Where the cached tallies came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SnapshotSource {
    /// Nothing loaded yet
    Empty,
    /// Read from the ledger by the latest refresh
    Live,
    /// Placeholder tallies, the ledger was never read successfully
    Demo,
    /// Last live tallies kept after a failed refresh
    Stale,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Snapshot {
    pub candidates: Vec<CandidateTally>,
    pub total_votes: u64,
    pub has_voted: bool,
    pub source: SnapshotSource,
}

impl Snapshot {
    pub fn empty() -> Self {
        Self {
            candidates: vec![],
            total_votes: 0,
            has_voted: false,
            source: SnapshotSource::Empty,
        }
    }

    pub fn live(candidates: Vec<Candidate>, has_voted: bool) -> Self {
        Self::from_tallies(
            candidates.into_iter().map(CandidateTally::from).collect(),
            has_voted,
            SnapshotSource::Live,
        )
    }

    pub fn demo() -> Self {
        let candidates = DEMO_CANDIDATES
            .iter()
            .enumerate()
            .map(|(id, (name, vote_count))| CandidateTally {
                id: id as u64,
                name: name.to_string(),
                vote_count: *vote_count,
            })
            .collect();
        Self::from_tallies(candidates, false, SnapshotSource::Demo)
    }

    fn from_tallies(candidates: Vec<CandidateTally>, has_voted: bool, source: SnapshotSource) -> Self {
        let total_votes = candidates
            .iter()
            .fold(0u64, |acc, c| acc.saturating_add(c.vote_count));
        Self {
            candidates,
            total_votes,
            has_voted,
            source,
        }
    }

    pub fn into_stale(self) -> Self {
        Self {
            source: SnapshotSource::Stale,
            ..self
        }
    }

    /// Live or stale tallies that were once read from the ledger.
    pub fn has_ledger_data(&self) -> bool {
        matches!(self.source, SnapshotSource::Live | SnapshotSource::Stale)
    }

    pub fn candidate(&self, candidate_id: u64) -> Option<&CandidateTally> {
        self.candidates.iter().find(|c| c.id == candidate_id)
    }
}

impl Default for Snapshot {
    fn default() -> Self {
        Self::empty()
    }
}
