//! Rebuild the similar-dataset graph

use tracing::info;

use scholarhub_common::{
    config::RelationsConfig,
    similarity::{regenerate, Sampler, SimilarityBuilder, SimilarityReport},
    Repository, Result,
};

pub async fn run(repo: &Repository, relations: &RelationsConfig) -> Result<SimilarityReport> {
    let builder = SimilarityBuilder::from_config(relations);
    let mut sampler = Sampler::new(relations.sampling, relations.seed);

    info!(
        sampling = ?sampler.mode(),
        seed = ?relations.seed,
        category_limit = relations.category_limit,
        co_citation_limit = relations.co_citation_limit,
        fallback_limit = relations.fallback_limit,
        "Generating similar datasets"
    );

    regenerate(repo, &builder, &mut sampler).await
}
