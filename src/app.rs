use std::collections::{BTreeMap, BTreeSet};

use camino::{Utf8Path, Utf8PathBuf};
use serde::Serialize;
use tracing::info;

use crate::aggregate::{self, NO_EVIDENCE_DISTANCE};
use crate::cache::{RequestPacer, ResolveStats, TaxonCache};
use crate::distance::{self, DEFAULT_BRANCH_PENALTY};
use crate::domain::{Taxon, TaxonLabel};
use crate::entrez::TaxonomyClient;
use crate::error::TaxoError;
use crate::reactions::ReactionTaxonMap;

/// Where the resolved taxa come from and whether they are persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheMode {
    /// Reuse a persisted cache as-is. Nothing is fetched for the taxon set;
    /// labels the cache predates are reported stale and score the sentinel.
    Load(Utf8PathBuf),
    /// Resolve through the directory and persist the snapshot.
    Persist(Utf8PathBuf),
    /// Resolve through the directory, keep nothing.
    Ephemeral,
}

#[derive(Debug, Clone, Copy)]
pub struct ScoreOptions {
    pub penalty: u32,
    pub sentinel: u32,
}

impl Default for ScoreOptions {
    fn default() -> Self {
        Self {
            penalty: DEFAULT_BRANCH_PENALTY,
            sentinel: NO_EVIDENCE_DISTANCE,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ScoreReport {
    pub organism: Taxon,
    pub resolve: ResolveStats,
    /// Labels in the input with no resolved record at distance time.
    pub stale_labels: usize,
    pub reaction_distances: BTreeMap<String, u32>,
}

pub struct App<C: TaxonomyClient, P: RequestPacer> {
    client: C,
    pacer: P,
}

impl<C: TaxonomyClient, P: RequestPacer> App<C, P> {
    pub fn new(client: C, pacer: P) -> Self {
        Self { client, pacer }
    }

    /// Full scoring run: resolve the query organism, obtain lineage records
    /// for every candidate taxon per `cache_mode`, compute per-taxon
    /// distances, and aggregate to one distance per reaction. Individual
    /// unresolvable taxa never abort the run; an unresolvable organism does.
    pub fn score(
        &mut self,
        organism: &str,
        reactions: &ReactionTaxonMap,
        cache_mode: CacheMode,
        options: ScoreOptions,
    ) -> Result<ScoreReport, TaxoError> {
        let query = Taxon::from_scientific_name(&self.client, organism)?;
        info!(organism, taxid = query.taxid.as_str(), "resolved query organism");

        let labels = reactions.all_labels();
        let (cache, resolve) = match cache_mode {
            CacheMode::Load(path) => {
                let cache = TaxonCache::load(&path)?;
                let reused = labels
                    .iter()
                    .filter(|label| cache.taxa().contains_key(*label))
                    .count();
                info!(path = %path, taxa = cache.len(), reused, "loaded taxon cache");
                let resolve = ResolveStats {
                    reused,
                    ..ResolveStats::default()
                };
                (cache, resolve)
            }
            CacheMode::Persist(path) => {
                let (cache, resolve) = self.resolve(&labels);
                cache.save(&path)?;
                info!(path = %path, taxa = cache.len(), "persisted taxon cache");
                (cache, resolve)
            }
            CacheMode::Ephemeral => self.resolve(&labels),
        };

        let taxon_distances =
            distance::taxon_distances(&query, &labels, cache.taxa(), options.penalty);
        let stale_labels = labels.len() - taxon_distances.len();
        let reaction_distances = aggregate::min_distance_per_reaction(
            reactions.reactions(),
            &taxon_distances,
            options.sentinel,
        );
        info!(
            reactions = reaction_distances.len(),
            resolved = taxon_distances.len(),
            stale = stale_labels,
            "scored reactions"
        );

        Ok(ScoreReport {
            organism: query,
            resolve,
            stale_labels,
            reaction_distances,
        })
    }

    /// Resolve every candidate taxon and persist the cache without scoring.
    pub fn build_cache(
        &mut self,
        reactions: &ReactionTaxonMap,
        destination: &Utf8Path,
    ) -> Result<ResolveStats, TaxoError> {
        let labels = reactions.all_labels();
        let (cache, resolve) = self.resolve(&labels);
        cache.save(destination)?;
        info!(path = %destination, taxa = cache.len(), "persisted taxon cache");
        Ok(resolve)
    }

    fn resolve(&mut self, labels: &BTreeSet<TaxonLabel>) -> (TaxonCache, ResolveStats) {
        let mut cache = TaxonCache::new();
        let resolve = cache.resolve_all(labels, &self.client, &mut self.pacer);
        (cache, resolve)
    }
}
