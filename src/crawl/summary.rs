//! Run state and result tallies.

use std::collections::BTreeMap;
use std::fmt;

use crate::models::EntityKind;

/// Why a run stopped early.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbortReason {
    /// A seed request failed at the transport level.
    SeedTransport,
    /// The request budget ran out with requests still pending.
    BudgetExhausted,
    /// The persisted queue could not be read or written.
    Queue,
}

impl AbortReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SeedTransport => "seed transport failure",
            Self::BudgetExhausted => "request budget exhausted",
            Self::Queue => "queue storage failure",
        }
    }
}

/// Driver states. A request moves `Fetching -> Extracting -> Paginating`;
/// the run moves `Seeded -> Drained -> Done`, or ends `Aborted`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Seeded,
    Fetching,
    Extracting,
    Paginating,
    Drained,
    Done,
    Aborted(AbortReason),
}

impl RunState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Aborted(_))
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Seeded => f.write_str("seeded"),
            Self::Fetching => f.write_str("fetching"),
            Self::Extracting => f.write_str("extracting"),
            Self::Paginating => f.write_str("paginating"),
            Self::Drained => f.write_str("drained"),
            Self::Done => f.write_str("done"),
            Self::Aborted(reason) => write!(f, "aborted ({})", reason.as_str()),
        }
    }
}

/// Counts for one chain.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EntityTally {
    /// Pages fetched, whatever their outcome.
    pub pages: u64,
    /// Items found on decoded pages.
    pub fetched: u64,
    pub saved: u64,
    pub dropped: u64,
}

impl EntityTally {
    pub fn merge(&mut self, other: &EntityTally) {
        self.pages += other.pages;
        self.fetched += other.fetched;
        self.saved += other.saved;
        self.dropped += other.dropped;
    }
}

/// Outcome of one run of a crawl.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub crawl: String,
    pub entity: EntityKind,
    /// Tallies per chain (`-` for crawls without a chain parameter).
    pub chains: BTreeMap<String, EntityTally>,
    /// Chains ended by an undecodable body.
    pub decode_failures: u64,
    /// Requests that failed at the transport level.
    pub transport_failures: u64,
    /// Chains ended by a non-2xx status or a failed success check.
    pub rejected_pages: u64,
    /// Requests left in the queue when the run stopped.
    pub remaining: usize,
    pub state: RunState,
}

impl RunSummary {
    pub fn new(crawl: impl Into<String>, entity: EntityKind) -> Self {
        Self {
            crawl: crawl.into(),
            entity,
            chains: BTreeMap::new(),
            decode_failures: 0,
            transport_failures: 0,
            rejected_pages: 0,
            remaining: 0,
            state: RunState::Seeded,
        }
    }

    pub fn chain_mut(&mut self, chain: &str) -> &mut EntityTally {
        self.chains.entry(chain.to_string()).or_default()
    }

    /// Totals across every chain.
    pub fn totals(&self) -> EntityTally {
        let mut total = EntityTally::default();
        for tally in self.chains.values() {
            total.merge(tally);
        }
        total
    }

    pub fn is_aborted(&self) -> bool {
        matches!(self.state, RunState::Aborted(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_totals_merge_chains() {
        let mut summary = RunSummary::new("fans", EntityKind::Fan);
        *summary.chain_mut("1") = EntityTally { pages: 2, fetched: 62, saved: 60, dropped: 2 };
        summary.chain_mut("2").pages += 1;

        assert_eq!(
            summary.totals(),
            EntityTally { pages: 3, fetched: 62, saved: 60, dropped: 2 }
        );
    }

    #[test]
    fn test_state_display() {
        assert_eq!(RunState::Done.to_string(), "done");
        assert_eq!(
            RunState::Aborted(AbortReason::BudgetExhausted).to_string(),
            "aborted (request budget exhausted)"
        );
        assert!(RunState::Done.is_terminal());
        assert!(!RunState::Drained.is_terminal());
    }
}
