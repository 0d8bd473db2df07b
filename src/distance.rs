use std::collections::{BTreeMap, BTreeSet};

use tracing::warn;

use crate::domain::{Taxon, TaxonLabel};

/// Per-step cost of descending into a branch off the query's own lineage.
pub const DEFAULT_BRANCH_PENALTY: u32 = 20;

/// Tree distance between a query organism and a target taxon.
///
/// Climbing from the query toward the lowest common ancestor costs 1 per
/// step; descending from there into a different branch costs `penalty` per
/// step. A target at the tree root short-circuits to the query's depth.
///
/// The metric is not symmetric: the root special case inspects only the
/// target, and only the query side pays up-steps at unit cost. Swapping the
/// arguments can change the result.
pub fn tree_distance(query: &Taxon, target: &Taxon, penalty: u32) -> u32 {
    if target.taxid.is_root() {
        return query.lineage_taxa_id.len() as u32;
    }

    let shared = query
        .lineage_taxa_id
        .iter()
        .zip(&target.lineage_taxa_id)
        .take_while(|(ours, theirs)| ours == theirs)
        .count();

    let up = (query.lineage_taxa_id.len() - shared) as u32;
    let down = if up == 0 {
        0
    } else {
        (target.lineage_taxa_id.len() - shared) as u32
    };
    up + down * penalty
}

/// Distance from the query organism to every label resolvable through
/// `resolved`. A label with no resolved record is skipped: either the
/// directory never had it, or the loaded cache predates the reference
/// database.
pub fn taxon_distances(
    query: &Taxon,
    labels: &BTreeSet<TaxonLabel>,
    resolved: &BTreeMap<TaxonLabel, Taxon>,
    penalty: u32,
) -> BTreeMap<TaxonLabel, u32> {
    let mut distances = BTreeMap::new();
    for label in labels {
        match resolved.get(label) {
            Some(taxon) => {
                distances.insert(label.clone(), tree_distance(query, taxon, penalty));
            }
            None => {
                warn!(label = label.as_str(), "no taxonomic data for label, ignoring it");
            }
        }
    }
    distances
}

#[cfg(test)]
mod tests {
    use crate::domain::TaxId;

    use super::*;

    fn taxon(taxid: &str, lineage: &[&str]) -> Taxon {
        let lineage_taxa_id: Vec<TaxId> = lineage.iter().copied().map(TaxId::new).collect();
        let parent = if lineage.len() >= 2 {
            TaxId::new(lineage[lineage.len() - 2])
        } else {
            TaxId::new("1")
        };
        Taxon {
            taxid: TaxId::new(taxid),
            scientific_name: format!("taxon {taxid}"),
            lineage_taxa_name: lineage.iter().map(|id| format!("taxon {id}")).collect(),
            lineage_taxa_id,
            parent_taxid: parent,
        }
    }

    #[test]
    fn identical_taxa_are_at_distance_zero() {
        let q = taxon("30", &["10", "20", "30"]);
        assert_eq!(tree_distance(&q, &q, DEFAULT_BRANCH_PENALTY), 0);
    }

    #[test]
    fn sibling_costs_one_up_plus_one_penalized_down() {
        let q = taxon("30", &["10", "20", "30"]);
        let t = taxon("31", &["10", "20", "31"]);
        assert_eq!(tree_distance(&q, &t, 20), 21);
        assert_eq!(tree_distance(&q, &t, 1), 2);
    }

    #[test]
    fn ancestor_costs_only_up_steps() {
        let q = taxon("30", &["10", "20", "30"]);
        let t = taxon("10", &["10"]);
        assert_eq!(tree_distance(&q, &t, 20), 2);
        assert_eq!(tree_distance(&q, &t, 500), 2);
    }

    #[test]
    fn stale_labels_are_skipped() {
        let q = taxon("30", &["10", "20", "30"]);
        let labels: BTreeSet<TaxonLabel> = [TaxonLabel::new("TAX-30"), TaxonLabel::new("TAX-99")]
            .into_iter()
            .collect();
        let resolved: BTreeMap<TaxonLabel, Taxon> =
            [(TaxonLabel::new("TAX-30"), q.clone())].into_iter().collect();

        let distances = taxon_distances(&q, &labels, &resolved, DEFAULT_BRANCH_PENALTY);
        assert_eq!(distances.len(), 1);
        assert_eq!(distances.get(&TaxonLabel::new("TAX-30")), Some(&0));
    }
}
