use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::entrez::{TaxonRecord, TaxonomyClient};
use crate::error::TaxoError;

/// Tag conventionally prepended to taxonomic identifiers in pathway
/// annotations, e.g. `TAX-511145`.
pub const TAXON_LABEL_TAG: &str = "TAX-";

/// Identifier of the taxonomy tree root.
pub const ROOT_TAXID: &str = "1";

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaxId(String);

impl TaxId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0 == ROOT_TAXID
    }
}

impl fmt::Display for TaxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A taxonomic-range label exactly as it appears in the reference-database
/// annotations. The label keys every map surfaced to callers; only the
/// directory lookup sees the stripped identifier.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaxonLabel(String);

impl TaxonLabel {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The raw taxonomic identifier behind the label. Labels without the
    /// conventional tag pass through unchanged.
    pub fn raw_taxid(&self) -> TaxId {
        TaxId::new(self.0.strip_prefix(TAXON_LABEL_TAG).unwrap_or(&self.0))
    }
}

impl fmt::Display for TaxonLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One resolved node of the taxonomy. Field names match the persisted cache
/// layout; a cache entry missing any of them fails the load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Taxon {
    pub taxid: TaxId,
    pub scientific_name: String,
    /// Ancestor names root-first, self included last.
    pub lineage_taxa_name: Vec<String>,
    /// Ancestor identifiers root-first, self included last. Degrades to
    /// `[self]` for nodes the directory reports no extended lineage for.
    pub lineage_taxa_id: Vec<TaxId>,
    pub parent_taxid: TaxId,
}

impl Taxon {
    /// Resolve a taxon from its identifier via the directory's record
    /// endpoint. Absence and transport failure both surface as `NotFound`;
    /// the transport detail is logged before being absorbed.
    pub fn from_taxid<C: TaxonomyClient>(client: &C, taxid: TaxId) -> Result<Self, TaxoError> {
        let record = match client.fetch(&taxid) {
            Ok(Some(record)) => record,
            Ok(None) => return Err(TaxoError::NotFound(taxid.as_str().to_string())),
            Err(err) => {
                warn!(taxid = taxid.as_str(), error = %err, "taxonomy record fetch failed");
                return Err(TaxoError::NotFound(taxid.as_str().to_string()));
            }
        };
        Ok(Self::from_record(taxid, record))
    }

    /// Resolve a taxon from a scientific name via the directory's search
    /// endpoint, then its record endpoint.
    pub fn from_scientific_name<C: TaxonomyClient>(
        client: &C,
        name: &str,
    ) -> Result<Self, TaxoError> {
        let taxid = match client.search(name) {
            Ok(Some(taxid)) => taxid,
            Ok(None) => return Err(TaxoError::NotFound(name.to_string())),
            Err(err) => {
                warn!(name, error = %err, "taxonomy name search failed");
                return Err(TaxoError::NotFound(name.to_string()));
            }
        };
        Self::from_taxid(client, taxid)
    }

    fn from_record(taxid: TaxId, record: TaxonRecord) -> Self {
        let mut lineage_taxa_name = record.lineage_names;
        lineage_taxa_name.push(record.scientific_name.clone());
        let mut lineage_taxa_id = record.lineage_ids;
        lineage_taxa_id.push(taxid.clone());
        Self {
            taxid,
            scientific_name: record.scientific_name,
            lineage_taxa_name,
            lineage_taxa_id,
            parent_taxid: record.parent_taxid,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_strips_tag() {
        let label = TaxonLabel::new("TAX-511145");
        assert_eq!(label.raw_taxid(), TaxId::new("511145"));
        assert_eq!(label.as_str(), "TAX-511145");
    }

    #[test]
    fn bare_label_passes_through() {
        let label = TaxonLabel::new("2880");
        assert_eq!(label.raw_taxid(), TaxId::new("2880"));
    }

    #[test]
    fn root_taxid() {
        assert!(TaxId::new("1").is_root());
        assert!(!TaxId::new("131567").is_root());
    }

    #[test]
    fn record_without_extended_lineage_degrades_to_self() {
        let record = TaxonRecord {
            scientific_name: "cellular organisms".to_string(),
            lineage_names: Vec::new(),
            lineage_ids: Vec::new(),
            parent_taxid: TaxId::new("1"),
        };
        let taxon = Taxon::from_record(TaxId::new("131567"), record);
        assert_eq!(taxon.lineage_taxa_id, vec![TaxId::new("131567")]);
        assert_eq!(taxon.lineage_taxa_name, vec!["cellular organisms"]);
    }
}
