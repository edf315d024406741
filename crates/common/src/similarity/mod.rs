//! Similar-dataset relationship builder
//!
//! Rebuilds the directed `dataset_similar_datasets` edge set from a snapshot
//! of the dataset table and the dataset/paper associations:
//!
//! 1. every dataset gains up to N random peers from its category group,
//! 2. every dataset gains up to M datasets that share a paper with it,
//! 3. datasets still without out-edges get up to K edges to any other dataset.
//!
//! The plan is computed in memory, then each dataset's outgoing edges are
//! replaced in its own transaction so one failing dataset never blocks the rest.

mod sampler;
mod signals;

pub use sampler::Sampler;
pub use signals::{
    CategorySignal, CoCitationSignal, FallbackSignal, SimilaritySignal, CATEGORY, CO_CITATION,
    FALLBACK,
};

use crate::config::RelationsConfig;
use crate::errors::Result;
use async_trait::async_trait;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::{info, warn};
use uuid::Uuid;

/// One dataset as seen by the builder
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetNode {
    pub id: Uuid,
    /// Grouping label, already defaulted to `unknown`
    pub category: String,
}

/// Point-in-time copy of everything the builder reads
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    /// Table order (`created_at, id`)
    pub datasets: Vec<DatasetNode>,
    /// `(paper_id, dataset_id)` pairs
    pub associations: Vec<(Uuid, Uuid)>,
}

/// Grouping structures derived from a [`Snapshot`]
#[derive(Debug, Default)]
pub struct SimilarityIndex {
    order: Vec<Uuid>,
    category_of: HashMap<Uuid, String>,
    by_category: BTreeMap<String, Vec<Uuid>>,
    co_occurring: HashMap<Uuid, Vec<Uuid>>,
}

impl SimilarityIndex {
    pub fn build(snapshot: &Snapshot) -> Self {
        let mut order = Vec::with_capacity(snapshot.datasets.len());
        let mut position = HashMap::with_capacity(snapshot.datasets.len());
        let mut category_of = HashMap::with_capacity(snapshot.datasets.len());
        let mut by_category: BTreeMap<String, Vec<Uuid>> = BTreeMap::new();

        for node in &snapshot.datasets {
            if position.contains_key(&node.id) {
                continue;
            }
            position.insert(node.id, order.len());
            order.push(node.id);
            category_of.insert(node.id, node.category.clone());
            by_category.entry(node.category.clone()).or_default().push(node.id);
        }

        // paper -> datasets, ignoring associations to datasets outside the snapshot
        let mut by_paper: HashMap<Uuid, BTreeSet<Uuid>> = HashMap::new();
        for (paper_id, dataset_id) in &snapshot.associations {
            if position.contains_key(dataset_id) {
                by_paper.entry(*paper_id).or_default().insert(*dataset_id);
            }
        }

        let mut co_sets: HashMap<Uuid, BTreeSet<Uuid>> = HashMap::new();
        for datasets in by_paper.values() {
            for a in datasets {
                for b in datasets {
                    if a != b {
                        co_sets.entry(*a).or_default().insert(*b);
                    }
                }
            }
        }

        let co_occurring = co_sets
            .into_iter()
            .map(|(id, peers)| {
                let mut peers: Vec<Uuid> = peers.into_iter().collect();
                peers.sort_by_key(|p| position.get(p).copied().unwrap_or(usize::MAX));
                (id, peers)
            })
            .collect();

        Self {
            order,
            category_of,
            by_category,
            co_occurring,
        }
    }

    /// Dataset ids in table order
    pub fn datasets(&self) -> &[Uuid] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn category(&self, id: Uuid) -> Option<&str> {
        self.category_of.get(&id).map(String::as_str)
    }

    /// Other members of the anchor's category group, in table order
    pub fn category_peers(&self, anchor: Uuid) -> Vec<Uuid> {
        self.category(anchor)
            .and_then(|c| self.by_category.get(c))
            .map(|group| group.iter().copied().filter(|id| *id != anchor).collect())
            .unwrap_or_default()
    }

    /// Datasets sharing at least one paper with `anchor`, in table order
    pub fn co_occurring(&self, anchor: Uuid) -> &[Uuid] {
        self.co_occurring.get(&anchor).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// Planned edge set plus how many edges each signal contributed
#[derive(Debug, Default, Clone)]
pub struct EdgePlan {
    edges: BTreeMap<Uuid, BTreeSet<Uuid>>,
    contributed: BTreeMap<&'static str, usize>,
}

impl EdgePlan {
    /// Add an edge, returning false for self-loops and duplicates
    fn add(&mut self, signal: &'static str, from: Uuid, to: Uuid) -> bool {
        if from == to {
            return false;
        }
        let inserted = self.edges.entry(from).or_default().insert(to);
        if inserted {
            *self.contributed.entry(signal).or_default() += 1;
        }
        inserted
    }

    fn out_degree(&self, from: Uuid) -> usize {
        self.edges.get(&from).map_or(0, BTreeSet::len)
    }

    pub fn targets(&self, from: Uuid) -> Vec<Uuid> {
        self.edges
            .get(&from)
            .map(|t| t.iter().copied().collect())
            .unwrap_or_default()
    }

    pub fn edges(&self) -> impl Iterator<Item = (Uuid, Uuid)> + '_ {
        self.edges
            .iter()
            .flat_map(|(from, targets)| targets.iter().map(move |to| (*from, *to)))
    }

    pub fn edge_count(&self) -> usize {
        self.edges.values().map(BTreeSet::len).sum()
    }

    pub fn contributed_by(&self, signal: &str) -> usize {
        self.contributed.get(signal).copied().unwrap_or(0)
    }
}

/// Ordered list of signals plus the isolation post-pass
pub struct SimilarityBuilder {
    signals: Vec<Box<dyn SimilaritySignal>>,
    fallback: Option<Box<dyn SimilaritySignal>>,
}

impl Default for SimilarityBuilder {
    fn default() -> Self {
        Self::from_config(&RelationsConfig::default())
    }
}

impl SimilarityBuilder {
    /// Builder with no signals at all
    pub fn empty() -> Self {
        Self {
            signals: Vec::new(),
            fallback: None,
        }
    }

    pub fn from_config(config: &RelationsConfig) -> Self {
        Self::empty()
            .with_signal(CategorySignal {
                limit: config.category_limit,
            })
            .with_signal(CoCitationSignal {
                limit: config.co_citation_limit,
            })
            .with_fallback(FallbackSignal {
                limit: config.fallback_limit,
            })
    }

    pub fn with_signal(mut self, signal: impl SimilaritySignal + 'static) -> Self {
        self.signals.push(Box::new(signal));
        self
    }

    pub fn with_fallback(mut self, signal: impl SimilaritySignal + 'static) -> Self {
        self.fallback = Some(Box::new(signal));
        self
    }

    pub fn signal_names(&self) -> Vec<&'static str> {
        self.signals
            .iter()
            .chain(self.fallback.iter())
            .map(|s| s.name())
            .collect()
    }

    /// Run every signal over every anchor, then the fallback over anchors left isolated
    pub fn plan(&self, index: &SimilarityIndex, sampler: &mut Sampler) -> EdgePlan {
        let mut plan = EdgePlan::default();

        for signal in &self.signals {
            for &anchor in index.datasets() {
                for target in signal.propose(index, anchor, sampler) {
                    plan.add(signal.name(), anchor, target);
                }
            }
        }

        if let Some(fallback) = &self.fallback {
            for &anchor in index.datasets() {
                if plan.out_degree(anchor) > 0 {
                    continue;
                }
                for target in fallback.propose(index, anchor, sampler) {
                    plan.add(fallback.name(), anchor, target);
                }
            }
        }

        plan
    }
}

/// Persistence the builder needs
#[async_trait]
pub trait SimilarityStore: Send + Sync {
    /// Datasets in table order plus every paper/dataset association
    async fn load_snapshot(&self) -> Result<Snapshot>;

    /// Atomically delete every outgoing edge of `from` and insert `to`.
    /// Returns the number of rows inserted.
    async fn replace_edges(&self, from: Uuid, to: &[Uuid]) -> Result<u64>;
}

/// Outcome of one regeneration run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SimilarityReport {
    pub datasets: usize,
    pub edges_written: u64,
    pub category_edges: usize,
    pub co_citation_edges: usize,
    pub fallback_edges: usize,
    pub failed: usize,
}

/// Recompute and persist the similar-dataset graph
pub async fn regenerate<S>(
    store: &S,
    builder: &SimilarityBuilder,
    sampler: &mut Sampler,
) -> Result<SimilarityReport>
where
    S: SimilarityStore + ?Sized,
{
    let snapshot = store.load_snapshot().await?;
    if snapshot.datasets.is_empty() {
        info!("No datasets found, nothing to relate");
        return Ok(SimilarityReport::default());
    }

    let index = SimilarityIndex::build(&snapshot);
    info!(
        datasets = index.len(),
        associations = snapshot.associations.len(),
        signals = ?builder.signal_names(),
        "Planning similar dataset edges"
    );

    let plan = builder.plan(&index, sampler);

    let mut report = SimilarityReport {
        datasets: index.len(),
        category_edges: plan.contributed_by(CATEGORY),
        co_citation_edges: plan.contributed_by(CO_CITATION),
        fallback_edges: plan.contributed_by(FALLBACK),
        ..Default::default()
    };

    for &dataset_id in index.datasets() {
        let targets = plan.targets(dataset_id);
        match store.replace_edges(dataset_id, &targets).await {
            Ok(written) => report.edges_written += written,
            Err(e) => {
                warn!(dataset_id = %dataset_id, error = %e, "Failed to replace similar datasets");
                report.failed += 1;
            }
        }
    }

    info!(
        datasets = report.datasets,
        edges_written = report.edges_written,
        category_edges = report.category_edges,
        co_citation_edges = report.co_citation_edges,
        fallback_edges = report.fallback_edges,
        failed = report.failed,
        "Similar dataset generation finished"
    );

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SamplingMode;
    use crate::errors::AppError;
    use std::collections::HashSet;
    use std::sync::Mutex;
    use tokio_test::assert_ok;

    /// In-memory edge table with a uniqueness guarantee like the real one
    #[derive(Default)]
    struct MemoryStore {
        snapshot: Snapshot,
        edges: Mutex<BTreeSet<(Uuid, Uuid)>>,
        fail_on: HashSet<Uuid>,
    }

    impl MemoryStore {
        fn new(snapshot: Snapshot) -> Self {
            Self {
                snapshot,
                ..Default::default()
            }
        }

        fn edges(&self) -> BTreeSet<(Uuid, Uuid)> {
            self.edges.lock().unwrap().clone()
        }

        fn out_edges(&self, from: Uuid) -> Vec<Uuid> {
            self.edges()
                .into_iter()
                .filter(|(f, _)| *f == from)
                .map(|(_, t)| t)
                .collect()
        }
    }

    #[async_trait]
    impl SimilarityStore for MemoryStore {
        async fn load_snapshot(&self) -> Result<Snapshot> {
            Ok(self.snapshot.clone())
        }

        async fn replace_edges(&self, from: Uuid, to: &[Uuid]) -> Result<u64> {
            if self.fail_on.contains(&from) {
                return Err(AppError::Internal {
                    message: "simulated failure".into(),
                });
            }
            let mut edges = self.edges.lock().unwrap();
            edges.retain(|(f, _)| *f != from);
            let mut written = 0;
            for target in to {
                if edges.insert((from, *target)) {
                    written += 1;
                }
            }
            Ok(written)
        }
    }

    fn node(category: &str) -> DatasetNode {
        DatasetNode {
            id: Uuid::new_v4(),
            category: category.to_string(),
        }
    }

    fn seeded() -> Sampler {
        Sampler::new(SamplingMode::Random, Some(7))
    }

    #[tokio::test]
    async fn test_vision_nlp_scenario() {
        let (d1, d2, d3) = (node("vision"), node("vision"), node("nlp"));
        let paper = Uuid::new_v4();
        let store = MemoryStore::new(Snapshot {
            datasets: vec![d1.clone(), d2.clone(), d3.clone()],
            associations: vec![(paper, d1.id), (paper, d2.id)],
        });

        let report = regenerate(&store, &SimilarityBuilder::default(), &mut seeded())
            .await
            .unwrap();

        assert_eq!(store.out_edges(d1.id), vec![d2.id]);
        assert_eq!(store.out_edges(d2.id), vec![d1.id]);

        let d3_targets = store.out_edges(d3.id);
        assert!((1..=3).contains(&d3_targets.len()));
        assert!(d3_targets.iter().all(|t| *t == d1.id || *t == d2.id));

        assert_eq!(report.datasets, 3);
        assert_eq!(report.category_edges, 2);
        assert_eq!(report.co_citation_edges, 0);
        assert_eq!(report.fallback_edges, d3_targets.len());
        assert_eq!(report.edges_written as usize, store.edges().len());
        assert_eq!(report.failed, 0);
    }

    #[tokio::test]
    async fn test_no_isolated_nodes_and_no_self_loops() {
        let mut datasets: Vec<DatasetNode> = (0..12).map(|i| node(&format!("c{}", i % 5))).collect();
        datasets.push(node("solo"));
        let store = MemoryStore::new(Snapshot {
            datasets: datasets.clone(),
            associations: Vec::new(),
        });

        regenerate(&store, &SimilarityBuilder::default(), &mut seeded())
            .await
            .unwrap();

        let edges = store.edges();
        for d in &datasets {
            assert!(!store.out_edges(d.id).is_empty(), "dataset {} is isolated", d.id);
        }
        assert!(edges.iter().all(|(from, to)| from != to));
    }

    #[test]
    fn test_category_edges_stay_in_group_and_respect_cap() {
        let datasets: Vec<DatasetNode> = (0..20)
            .map(|i| node(if i % 2 == 0 { "vision" } else { "audio" }))
            .collect();
        let snapshot = Snapshot {
            datasets: datasets.clone(),
            associations: Vec::new(),
        };
        let index = SimilarityIndex::build(&snapshot);
        let builder = SimilarityBuilder::empty().with_signal(CategorySignal { limit: 5 });
        let plan = builder.plan(&index, &mut seeded());

        for (from, to) in plan.edges() {
            assert_eq!(index.category(from), index.category(to));
        }
        for d in &datasets {
            assert_eq!(plan.targets(d.id).len(), 5);
        }
        assert_eq!(plan.contributed_by(CATEGORY), 100);
    }

    #[test]
    fn test_co_citation_is_symmetric_for_a_shared_paper() {
        let (a, b) = (node("x"), node("y"));
        let paper = Uuid::new_v4();
        let snapshot = Snapshot {
            datasets: vec![a.clone(), b.clone()],
            associations: vec![(paper, a.id), (paper, b.id)],
        };
        let index = SimilarityIndex::build(&snapshot);
        let builder = SimilarityBuilder::empty().with_signal(CoCitationSignal { limit: 3 });
        let plan = builder.plan(&index, &mut seeded());

        let edges: Vec<(Uuid, Uuid)> = plan.edges().collect();
        assert!(edges.contains(&(a.id, b.id)));
        assert!(edges.contains(&(b.id, a.id)));
        assert_eq!(edges.len(), 2);
    }

    #[test]
    fn test_co_citation_takes_first_three_in_table_order() {
        let datasets: Vec<DatasetNode> = (0..6).map(|_| node("unknown")).collect();
        let paper = Uuid::new_v4();
        // associations listed in reverse; table order must still win
        let associations = datasets.iter().rev().map(|d| (paper, d.id)).collect();
        let index = SimilarityIndex::build(&Snapshot {
            datasets: datasets.clone(),
            associations,
        });

        let expected: Vec<Uuid> = datasets[1..4].iter().map(|d| d.id).collect();
        assert_eq!(&index.co_occurring(datasets[0].id)[..3], expected.as_slice());

        let builder = SimilarityBuilder::empty().with_signal(CoCitationSignal { limit: 3 });
        let plan = builder.plan(&index, &mut seeded());
        let mut targets = plan.targets(datasets[0].id);
        targets.sort();
        let mut expected_sorted = expected.clone();
        expected_sorted.sort();
        assert_eq!(targets, expected_sorted);
    }

    #[test]
    fn test_associations_to_unknown_datasets_ignored() {
        let a = node("x");
        let ghost = Uuid::new_v4();
        let paper = Uuid::new_v4();
        let index = SimilarityIndex::build(&Snapshot {
            datasets: vec![a.clone()],
            associations: vec![(paper, a.id), (paper, ghost)],
        });
        assert!(index.co_occurring(a.id).is_empty());
    }

    #[test]
    fn test_deterministic_mode_is_stable() {
        let datasets: Vec<DatasetNode> = (0..10).map(|_| node("same")).collect();
        let snapshot = Snapshot {
            datasets,
            associations: Vec::new(),
        };
        let index = SimilarityIndex::build(&snapshot);
        let builder = SimilarityBuilder::default();

        let first: Vec<_> = builder.plan(&index, &mut Sampler::deterministic()).edges().collect();
        let second: Vec<_> = builder.plan(&index, &mut Sampler::deterministic()).edges().collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_single_dataset_has_no_edges() {
        let index = SimilarityIndex::build(&Snapshot {
            datasets: vec![node("alone")],
            associations: Vec::new(),
        });
        let plan = SimilarityBuilder::default().plan(&index, &mut seeded());
        assert_eq!(plan.edge_count(), 0);
    }

    #[tokio::test]
    async fn test_empty_snapshot_is_not_an_error() {
        let store = MemoryStore::default();
        let report = regenerate(&store, &SimilarityBuilder::default(), &mut seeded())
            .await
            .unwrap();
        assert_eq!(report, SimilarityReport::default());
    }

    #[tokio::test]
    async fn test_rerun_replaces_previous_edges() {
        let datasets: Vec<DatasetNode> = (0..4).map(|_| node("same")).collect();
        let store = MemoryStore::new(Snapshot {
            datasets: datasets.clone(),
            associations: Vec::new(),
        });
        let stale = (datasets[0].id, Uuid::new_v4());
        store.edges.lock().unwrap().insert(stale);

        let builder = SimilarityBuilder::default();
        assert_ok!(regenerate(&store, &builder, &mut Sampler::deterministic()).await);
        let first = store.edges();
        assert_ok!(regenerate(&store, &builder, &mut Sampler::deterministic()).await);

        assert!(!first.contains(&stale));
        assert_eq!(first, store.edges());
        // 4 datasets in one group, each linked to the other 3
        assert_eq!(first.len(), 12);
    }

    #[tokio::test]
    async fn test_failures_are_counted_not_fatal() {
        let datasets: Vec<DatasetNode> = (0..3).map(|_| node("same")).collect();
        let mut store = MemoryStore::new(Snapshot {
            datasets: datasets.clone(),
            associations: Vec::new(),
        });
        store.fail_on.insert(datasets[1].id);

        let report = assert_ok!(
            regenerate(&store, &SimilarityBuilder::default(), &mut seeded()).await
        );

        assert_eq!(report.failed, 1);
        assert!(store.out_edges(datasets[1].id).is_empty());
        assert_eq!(store.out_edges(datasets[0].id).len(), 2);
        assert_eq!(store.out_edges(datasets[2].id).len(), 2);
    }
}
