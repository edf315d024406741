//! Resolve papers' raw venue strings to journal or conference references

use std::collections::HashMap;
use tracing::info;
use uuid::Uuid;

use scholarhub_common::{db::VenueTarget, Repository, Result};

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct LinkVenuesReport {
    pub papers_considered: usize,
    pub papers_updated: u64,
    pub conferences_created: u64,
}

/// Exact name match; journals take precedence over conferences
pub fn resolve(
    venue_name: &str,
    journals: &HashMap<String, Uuid>,
    conferences: &HashMap<String, Uuid>,
) -> Option<VenueTarget> {
    let name = venue_name.trim();
    if name.is_empty() {
        return None;
    }
    if let Some(id) = journals.get(name) {
        return Some(VenueTarget::Journal(*id));
    }
    if let Some(id) = conferences.get(name) {
        return Some(VenueTarget::Conference(*id));
    }
    Some(VenueTarget::NewConference(name.to_string()))
}

pub fn plan(
    papers: Vec<(Uuid, String)>,
    journals: &HashMap<String, Uuid>,
    conferences: &HashMap<String, Uuid>,
) -> Vec<(Uuid, VenueTarget)> {
    papers
        .into_iter()
        .filter_map(|(id, venue)| resolve(&venue, journals, conferences).map(|t| (id, t)))
        .collect()
}

pub async fn run(repo: &Repository) -> Result<LinkVenuesReport> {
    let papers = repo.papers_without_venue().await?;
    if papers.is_empty() {
        info!("Every paper with a venue name is already linked");
        return Ok(LinkVenuesReport::default());
    }

    let journals = repo.journal_name_index().await?;
    let conferences = repo.conference_name_index().await?;
    let considered = papers.len();
    let links = plan(papers, &journals, &conferences);

    let (papers_updated, conferences_created) = repo.apply_venue_links(&links).await?;
    let report = LinkVenuesReport {
        papers_considered: considered,
        papers_updated,
        conferences_created,
    };

    info!(
        papers_considered = report.papers_considered,
        papers_updated = report.papers_updated,
        conferences_created = report.conferences_created,
        "Venue linking finished"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_journal_wins_over_conference() {
        let journal = Uuid::new_v4();
        let conference = Uuid::new_v4();
        let journals = HashMap::from([("Nature".to_string(), journal)]);
        let conferences = HashMap::from([
            ("Nature".to_string(), Uuid::new_v4()),
            ("NeurIPS".to_string(), conference),
        ]);

        assert_eq!(
            resolve("Nature", &journals, &conferences),
            Some(VenueTarget::Journal(journal))
        );
        assert_eq!(
            resolve(" NeurIPS ", &journals, &conferences),
            Some(VenueTarget::Conference(conference))
        );
    }

    #[test]
    fn test_unknown_venue_becomes_new_conference() {
        let empty = HashMap::new();
        assert_eq!(
            resolve("Workshop on Graphs", &empty, &empty),
            Some(VenueTarget::NewConference("Workshop on Graphs".to_string()))
        );
        // Matching is exact, not case-insensitive
        let journals = HashMap::from([("Nature".to_string(), Uuid::new_v4())]);
        assert!(matches!(
            resolve("nature", &journals, &empty),
            Some(VenueTarget::NewConference(_))
        ));
        assert_eq!(resolve("  ", &empty, &empty), None);
    }

    #[test]
    fn test_plan_skips_blank_venues() {
        let empty = HashMap::new();
        let papers = vec![
            (Uuid::new_v4(), "ICML".to_string()),
            (Uuid::new_v4(), String::new()),
        ];
        assert_eq!(plan(papers, &empty, &empty).len(), 1);
    }
}
