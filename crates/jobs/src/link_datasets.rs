//! Link datasets to the papers whose titles they declare

use std::collections::{HashMap, HashSet};
use tracing::{debug, info};
use uuid::Uuid;

use scholarhub_common::{db::models::StringList, Repository, Result};

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct LinkDatasetsReport {
    pub datasets_processed: usize,
    pub titles_unmatched: usize,
    pub links_created: u64,
}

fn normalize(title: &str) -> String {
    title.trim().to_lowercase()
}

/// Case-insensitive title lookup; duplicate titles keep every paper
pub struct TitleIndex {
    by_title: HashMap<String, Vec<Uuid>>,
}

impl TitleIndex {
    pub fn new(papers: impl IntoIterator<Item = (Uuid, String)>) -> Self {
        let mut by_title: HashMap<String, Vec<Uuid>> = HashMap::new();
        for (id, title) in papers {
            let key = normalize(&title);
            if !key.is_empty() {
                by_title.entry(key).or_default().push(id);
            }
        }
        Self { by_title }
    }

    pub fn lookup(&self, title: &str) -> &[Uuid] {
        self.by_title
            .get(&normalize(title))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// `(dataset_id, paper_id)` pairs for one dataset, plus the number of unmatched titles
    pub fn links_for(&self, dataset_id: Uuid, titles: &StringList) -> (Vec<(Uuid, Uuid)>, usize) {
        let mut seen = HashSet::new();
        let mut links = Vec::new();
        let mut unmatched = 0;

        for title in titles.iter() {
            let papers = self.lookup(title);
            if papers.is_empty() {
                unmatched += 1;
                continue;
            }
            for &paper_id in papers {
                if seen.insert(paper_id) {
                    links.push((dataset_id, paper_id));
                }
            }
        }

        (links, unmatched)
    }
}

pub async fn run(repo: &Repository, batch_size: usize, limit: Option<u64>) -> Result<LinkDatasetsReport> {
    let batch_size = batch_size.max(1);
    let datasets = repo.datasets_with_paper_titles(limit).await?;
    if datasets.is_empty() {
        info!("No datasets declare paper titles");
        return Ok(LinkDatasetsReport::default());
    }

    let index = TitleIndex::new(repo.paper_titles().await?);
    info!(datasets = datasets.len(), batch_size, "Linking datasets to papers");

    let mut report = LinkDatasetsReport::default();
    for (batch_no, batch) in datasets.chunks(batch_size).enumerate() {
        let mut links = Vec::new();
        for (dataset_id, titles) in batch {
            let (found, unmatched) = index.links_for(*dataset_id, titles);
            report.titles_unmatched += unmatched;
            links.extend(found);
        }

        let created = repo.insert_dataset_links(&links).await?;
        report.datasets_processed += batch.len();
        report.links_created += created;
        debug!(batch = batch_no + 1, candidates = links.len(), created, "Batch committed");
    }

    info!(
        datasets_processed = report.datasets_processed,
        links_created = report.links_created,
        titles_unmatched = report.titles_unmatched,
        "Dataset linking finished"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn titles(items: &[&str]) -> StringList {
        StringList(items.iter().map(|s| s.to_string()).collect())
    }

    #[test]
    fn test_titles_match_case_insensitively() {
        let attention = Uuid::new_v4();
        let resnet = Uuid::new_v4();
        let index = TitleIndex::new(vec![
            (attention, "Attention Is All You Need".to_string()),
            (resnet, "Deep Residual Learning".to_string()),
        ]);
        let dataset = Uuid::new_v4();

        let (links, unmatched) = index.links_for(
            dataset,
            &titles(&["  attention is all you need ", "Unknown Paper"]),
        );
        assert_eq!(links, vec![(dataset, attention)]);
        assert_eq!(unmatched, 1);
    }

    #[test]
    fn test_duplicate_titles_link_every_paper_once() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let index = TitleIndex::new(vec![(a, "ImageNet".to_string()), (b, "imagenet".to_string())]);
        let dataset = Uuid::new_v4();

        let (links, _) = index.links_for(dataset, &titles(&["ImageNet", "IMAGENET"]));
        assert_eq!(links.len(), 2);
        assert!(links.contains(&(dataset, a)));
        assert!(links.contains(&(dataset, b)));
    }

    #[test]
    fn test_blank_titles_are_not_indexed() {
        let index = TitleIndex::new(vec![(Uuid::new_v4(), "   ".to_string())]);
        assert!(index.lookup("").is_empty());
    }
}
