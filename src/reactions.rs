use std::collections::{BTreeMap, BTreeSet};
use std::fs;

use camino::Utf8Path;
use serde::{Deserialize, Serialize};

use crate::domain::TaxonLabel;
use crate::error::TaxoError;

/// Reaction identifiers mapped to the taxonomic ranges declared on the
/// pathways containing each reaction, as exported from the reference
/// metabolic database. The engine never mutates it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReactionTaxonMap {
    reactions: BTreeMap<String, BTreeSet<TaxonLabel>>,
}

impl ReactionTaxonMap {
    pub fn from_map(reactions: BTreeMap<String, BTreeSet<TaxonLabel>>) -> Self {
        Self { reactions }
    }

    /// Load the exporter's JSON document:
    /// `{ "<reaction-id>": ["<taxon-label>", ...], ... }`.
    pub fn load(path: &Utf8Path) -> Result<Self, TaxoError> {
        let content = fs::read_to_string(path.as_std_path())
            .map_err(|_| TaxoError::InputRead(path.to_owned()))?;
        serde_json::from_str(&content).map_err(|err| TaxoError::InputParse(err.to_string()))
    }

    pub fn reactions(&self) -> &BTreeMap<String, BTreeSet<TaxonLabel>> {
        &self.reactions
    }

    pub fn labels_for(&self, reaction: &str) -> Option<&BTreeSet<TaxonLabel>> {
        self.reactions.get(reaction)
    }

    /// Union of all candidate sets. Every label the scoring flow will ever
    /// look at comes from here, so the "all taxa equals the union" input
    /// invariant holds by construction.
    pub fn all_labels(&self) -> BTreeSet<TaxonLabel> {
        self.reactions.values().flatten().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.reactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reactions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_labels_is_the_union() {
        let map: BTreeMap<String, BTreeSet<TaxonLabel>> = [
            (
                "RXN-1".to_string(),
                [TaxonLabel::new("TAX-1"), TaxonLabel::new("TAX-2")]
                    .into_iter()
                    .collect(),
            ),
            (
                "RXN-2".to_string(),
                [TaxonLabel::new("TAX-2"), TaxonLabel::new("TAX-3")]
                    .into_iter()
                    .collect(),
            ),
        ]
        .into_iter()
        .collect();
        let input = ReactionTaxonMap::from_map(map);

        let labels = input.all_labels();
        assert_eq!(labels.len(), 3);
        assert!(labels.contains(&TaxonLabel::new("TAX-2")));
    }
}
