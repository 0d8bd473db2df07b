use std::collections::{BTreeMap, BTreeSet};

use crate::domain::TaxonLabel;

/// Distance reported for a reaction with no resolvable taxonomic evidence.
/// Distinctly higher than any realistic tree distance, so downstream ranking
/// can tell "no evidence" from "close".
pub const NO_EVIDENCE_DISTANCE: u32 = 1000;

/// Collapse each reaction's candidate taxa to a single minimum distance.
/// Candidates without a distance entry were never resolved and are skipped;
/// a reaction whose whole candidate set is unresolved gets `sentinel`.
pub fn min_distance_per_reaction(
    reaction_taxa: &BTreeMap<String, BTreeSet<TaxonLabel>>,
    taxon_distances: &BTreeMap<TaxonLabel, u32>,
    sentinel: u32,
) -> BTreeMap<String, u32> {
    let mut reaction_distances = BTreeMap::new();
    for (reaction, candidates) in reaction_taxa {
        let distance = candidates
            .iter()
            .filter_map(|label| taxon_distances.get(label))
            .min()
            .copied()
            .unwrap_or(sentinel);
        reaction_distances.insert(reaction.clone(), distance);
    }
    reaction_distances
}
