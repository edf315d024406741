//! Similarity signals: each proposes targets for one anchor dataset

use super::{Sampler, SimilarityIndex};
use uuid::Uuid;

pub trait SimilaritySignal: Send + Sync {
    /// Label used for per-signal edge counts
    fn name(&self) -> &'static str;

    /// Targets for `anchor`; the builder drops self references and duplicates.
    fn propose(&self, index: &SimilarityIndex, anchor: Uuid, sampler: &mut Sampler) -> Vec<Uuid>;
}

pub const CATEGORY: &str = "category";
pub const CO_CITATION: &str = "co_citation";
pub const FALLBACK: &str = "fallback";

/// Up to `limit` random peers from the anchor's category group
#[derive(Debug, Clone, Copy)]
pub struct CategorySignal {
    pub limit: usize,
}

impl SimilaritySignal for CategorySignal {
    fn name(&self) -> &'static str {
        CATEGORY
    }

    fn propose(&self, index: &SimilarityIndex, anchor: Uuid, sampler: &mut Sampler) -> Vec<Uuid> {
        let peers = index.category_peers(anchor);
        if peers.is_empty() {
            return Vec::new();
        }
        sampler.pick(peers, self.limit)
    }
}

/// The first `limit` datasets sharing a paper with the anchor, in table order
#[derive(Debug, Clone, Copy)]
pub struct CoCitationSignal {
    pub limit: usize,
}

impl SimilaritySignal for CoCitationSignal {
    fn name(&self) -> &'static str {
        CO_CITATION
    }

    fn propose(&self, index: &SimilarityIndex, anchor: Uuid, _sampler: &mut Sampler) -> Vec<Uuid> {
        index
            .co_occurring(anchor)
            .iter()
            .take(self.limit)
            .copied()
            .collect()
    }
}

/// Up to `limit` datasets from the whole table; applied only to anchors left without edges
#[derive(Debug, Clone, Copy)]
pub struct FallbackSignal {
    pub limit: usize,
}

impl SimilaritySignal for FallbackSignal {
    fn name(&self) -> &'static str {
        FALLBACK
    }

    fn propose(&self, index: &SimilarityIndex, anchor: Uuid, sampler: &mut Sampler) -> Vec<Uuid> {
        let others: Vec<Uuid> = index
            .datasets()
            .iter()
            .copied()
            .filter(|id| *id != anchor)
            .collect();
        sampler.pick(others, self.limit)
    }
}
