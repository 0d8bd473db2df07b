use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::io::Write;
use std::thread;
use std::time::{Duration, Instant};

use camino::Utf8Path;
use serde::Serialize;
use tempfile::Builder;
use tracing::warn;

use crate::domain::{Taxon, TaxonLabel};
use crate::entrez::TaxonomyClient;
use crate::error::TaxoError;

/// Minimum spacing between consecutive directory fetches. NCBI allows three
/// unkeyed requests per second; 350 ms stays under that quota.
pub const FETCH_INTERVAL: Duration = Duration::from_millis(350);

pub trait RequestPacer {
    /// Block until the next external request may be issued.
    fn pace(&mut self);
}

/// Blocking throttle enforcing a minimum interval between requests. Cache
/// hits never touch it, so a fully warm cache resolves without waiting.
#[derive(Debug)]
pub struct IntervalPacer {
    interval: Duration,
    last_request: Option<Instant>,
}

impl IntervalPacer {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_request: None,
        }
    }
}

impl Default for IntervalPacer {
    fn default() -> Self {
        Self::new(FETCH_INTERVAL)
    }
}

impl RequestPacer for IntervalPacer {
    fn pace(&mut self) {
        if let Some(last) = self.last_request {
            let elapsed = last.elapsed();
            if elapsed < self.interval {
                thread::sleep(self.interval - elapsed);
            }
        }
        self.last_request = Some(Instant::now());
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ResolveStats {
    /// Labels already resolved (loaded cache or earlier call).
    pub reused: usize,
    /// Labels resolved through the directory during this call.
    pub fetched: usize,
    /// Labels the directory had no record for.
    pub dropped: usize,
}

/// Persisted mapping from taxon label to resolved lineage record.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TaxonCache {
    taxa: BTreeMap<TaxonLabel, Taxon>,
}

impl TaxonCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_taxa(taxa: BTreeMap<TaxonLabel, Taxon>) -> Self {
        Self { taxa }
    }

    pub fn taxa(&self) -> &BTreeMap<TaxonLabel, Taxon> {
        &self.taxa
    }

    pub fn len(&self) -> usize {
        self.taxa.len()
    }

    pub fn is_empty(&self) -> bool {
        self.taxa.is_empty()
    }

    /// Reconstruct a cache field-for-field from a persisted snapshot. An
    /// entry missing any field (or carrying an unknown one) fails the whole
    /// load; nothing is defaulted.
    pub fn load(path: &Utf8Path) -> Result<Self, TaxoError> {
        let content = fs::read_to_string(path.as_std_path())
            .map_err(|_| TaxoError::CacheRead(path.to_owned()))?;
        let taxa = serde_json::from_str(&content)
            .map_err(|err| TaxoError::CacheSchema(err.to_string()))?;
        Ok(Self { taxa })
    }

    /// Write a complete snapshot of the in-memory map, every Taxon field
    /// included, through a temp file in the destination directory.
    pub fn save(&self, path: &Utf8Path) -> Result<(), TaxoError> {
        let parent = path
            .parent()
            .ok_or_else(|| TaxoError::Filesystem(format!("invalid cache path: {path}")))?;
        fs::create_dir_all(parent.as_std_path())
            .map_err(|err| TaxoError::Filesystem(err.to_string()))?;
        let content = serde_json::to_vec_pretty(&self.taxa)
            .map_err(|err| TaxoError::Filesystem(err.to_string()))?;
        let mut temp = Builder::new()
            .prefix("taxodist-cache")
            .tempfile_in(parent.as_std_path())
            .map_err(|err| TaxoError::Filesystem(err.to_string()))?;
        temp.write_all(&content)
            .map_err(|err| TaxoError::Filesystem(err.to_string()))?;
        temp.persist(path.as_std_path())
            .map_err(|err| TaxoError::Filesystem(err.to_string()))?;
        Ok(())
    }

    /// Resolve every label, reusing cached records and fetching the rest
    /// through the directory. Each external fetch waits on the pacer first;
    /// labels the directory cannot resolve are dropped with a warning and
    /// processing continues.
    pub fn resolve_all<C: TaxonomyClient, P: RequestPacer>(
        &mut self,
        labels: &BTreeSet<TaxonLabel>,
        client: &C,
        pacer: &mut P,
    ) -> ResolveStats {
        let mut stats = ResolveStats::default();
        for label in labels {
            if self.taxa.contains_key(label) {
                stats.reused += 1;
                continue;
            }
            pacer.pace();
            match Taxon::from_taxid(client, label.raw_taxid()) {
                Ok(taxon) => {
                    self.taxa.insert(label.clone(), taxon);
                    stats.fetched += 1;
                }
                Err(TaxoError::NotFound(taxid)) => {
                    warn!(label = label.as_str(), taxid, "taxonomic ID not found, skipping label");
                    stats.dropped += 1;
                }
                Err(err) => {
                    warn!(label = label.as_str(), error = %err, "taxon resolution failed, skipping label");
                    stats.dropped += 1;
                }
            }
        }
        stats
    }
}
