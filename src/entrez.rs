use std::time::Duration;

use regex::Regex;
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use serde_json::Value;

use crate::domain::TaxId;
use crate::error::TaxoError;

/// Raw lineage payload the taxonomy directory returns for one node, before
/// the resolved identifier is appended to the chains.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaxonRecord {
    pub scientific_name: String,
    /// Ancestor names root-first, self excluded.
    pub lineage_names: Vec<String>,
    /// Extended ancestor identifier chain root-first, self excluded. Empty
    /// when the directory provides none (true for some top-level nodes).
    pub lineage_ids: Vec<TaxId>,
    pub parent_taxid: TaxId,
}

pub trait TaxonomyClient: Send + Sync {
    /// Resolve a scientific name to an identifier via the search endpoint.
    fn search(&self, name: &str) -> Result<Option<TaxId>, TaxoError>;
    /// Fetch the lineage record for an identifier. `Ok(None)` means the
    /// directory has no such node.
    fn fetch(&self, taxid: &TaxId) -> Result<Option<TaxonRecord>, TaxoError>;
}

#[derive(Clone)]
pub struct EntrezHttpClient {
    client: Client,
    base_url: String,
    contact_email: String,
    api_key: Option<String>,
}

impl EntrezHttpClient {
    /// Entrez etiquette requires identifying the operator; `contact_email`
    /// is sent on every request along with `tool=taxodist`.
    pub fn new(contact_email: &str) -> Result<Self, TaxoError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("taxodist/{}", env!("CARGO_PKG_VERSION")))
                .map_err(|err| TaxoError::EntrezHttp(err.to_string()))?,
        );
        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|err| TaxoError::EntrezHttp(err.to_string()))?;

        let api_key = std::env::var("NCBI_API_KEY")
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty());

        Ok(Self {
            client,
            base_url: "https://eutils.ncbi.nlm.nih.gov/entrez/eutils".to_string(),
            contact_email: contact_email.to_string(),
            api_key,
        })
    }

    fn get(
        &self,
        endpoint: &str,
        params: &[(&str, &str)],
    ) -> Result<reqwest::blocking::Response, TaxoError> {
        let url = format!("{}/{endpoint}", self.base_url);
        let mut request = self
            .client
            .get(&url)
            .query(params)
            .query(&[("tool", "taxodist"), ("email", self.contact_email.as_str())]);
        if let Some(key) = &self.api_key {
            request = request.query(&[("api_key", key.as_str())]);
        }
        let response = request
            .send()
            .map_err(|err| TaxoError::EntrezHttp(err.to_string()))?;
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response
                .text()
                .unwrap_or_else(|_| "Entrez request failed".to_string());
            return Err(TaxoError::EntrezStatus { status, message });
        }
        Ok(response)
    }
}

impl TaxonomyClient for EntrezHttpClient {
    fn search(&self, name: &str) -> Result<Option<TaxId>, TaxoError> {
        let response = self.get(
            "esearch.fcgi",
            &[("db", "taxonomy"), ("term", name), ("retmode", "json")],
        )?;
        let payload: Value = response
            .json()
            .map_err(|err| TaxoError::EntrezHttp(err.to_string()))?;
        Ok(first_search_hit(&payload))
    }

    fn fetch(&self, taxid: &TaxId) -> Result<Option<TaxonRecord>, TaxoError> {
        let response = self.get(
            "efetch.fcgi",
            &[("db", "taxonomy"), ("id", taxid.as_str()), ("retmode", "xml")],
        )?;
        let body = response
            .text()
            .map_err(|err| TaxoError::EntrezHttp(err.to_string()))?;
        Ok(parse_taxon_xml(&body))
    }
}

/// First identifier in an esearch JSON response, if any.
pub fn first_search_hit(payload: &Value) -> Option<TaxId> {
    payload
        .get("esearchresult")
        .and_then(|v| v.get("idlist"))
        .and_then(|v| v.as_array())
        .and_then(|ids| ids.first())
        .and_then(|v| v.as_str())
        .map(TaxId::new)
}

/// Extract a lineage record from a taxonomy efetch XML payload.
///
/// The taxonomy efetch endpoint has no JSON rendering, so the handful of
/// fields we need are pulled out positionally: the document-order first
/// `ScientificName`/`ParentTaxId` belong to the queried node, everything
/// inside `LineageEx` to its ancestors. Returns `None` for an empty result
/// set (unknown identifier).
pub fn parse_taxon_xml(xml: &str) -> Option<TaxonRecord> {
    let name_re = Regex::new(r"<ScientificName>([^<]*)</ScientificName>").unwrap();
    let parent_re = Regex::new(r"<ParentTaxId>([^<]*)</ParentTaxId>").unwrap();
    let lineage_re = Regex::new(r"<Lineage>([^<]*)</Lineage>").unwrap();
    let lineage_ex_re = Regex::new(r"(?s)<LineageEx>(.*?)</LineageEx>").unwrap();
    let taxid_re = Regex::new(r"<TaxId>([^<]*)</TaxId>").unwrap();

    let scientific_name = name_re.captures(xml)?.get(1)?.as_str().to_string();
    let parent_taxid = TaxId::new(parent_re.captures(xml)?.get(1)?.as_str());

    let lineage_names = lineage_re
        .captures(xml)
        .and_then(|cap| cap.get(1))
        .map(|m| {
            m.as_str()
                .split("; ")
                .filter(|part| !part.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    let lineage_ids = lineage_ex_re
        .captures(xml)
        .and_then(|cap| cap.get(1))
        .map(|block| {
            taxid_re
                .captures_iter(block.as_str())
                .filter_map(|cap| cap.get(1))
                .map(|m| TaxId::new(m.as_str()))
                .collect()
        })
        .unwrap_or_default();

    Some(TaxonRecord {
        scientific_name,
        lineage_names,
        lineage_ids,
        parent_taxid,
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn search_hit_from_esearch_payload() {
        let payload = json!({
            "esearchresult": { "count": "1", "idlist": ["2880"] }
        });
        assert_eq!(first_search_hit(&payload), Some(TaxId::new("2880")));
    }

    #[test]
    fn search_miss_from_empty_idlist() {
        let payload = json!({
            "esearchresult": { "count": "0", "idlist": [] }
        });
        assert_eq!(first_search_hit(&payload), None);
    }

    #[test]
    fn empty_taxa_set_yields_no_record() {
        assert_eq!(parse_taxon_xml("<TaxaSet></TaxaSet>"), None);
    }
}
