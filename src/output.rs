use std::collections::BTreeMap;
use std::io::{self, Write};

use camino::Utf8Path;

use crate::error::TaxoError;

pub struct JsonOutput;

impl JsonOutput {
    /// Pretty-print the reaction → distance mapping to stdout.
    pub fn print_reaction_distances(distances: &BTreeMap<String, u32>) -> Result<(), TaxoError> {
        let json = serde_json::to_string_pretty(distances)
            .map_err(|err| TaxoError::Filesystem(err.to_string()))?;
        let mut stdout = io::stdout();
        stdout
            .write_all(json.as_bytes())
            .and_then(|()| stdout.write_all(b"\n"))
            .map_err(|err| TaxoError::Filesystem(err.to_string()))
    }

    /// Persist the reaction → distance mapping as a JSON document.
    pub fn write_reaction_distances(
        distances: &BTreeMap<String, u32>,
        path: &Utf8Path,
    ) -> Result<(), TaxoError> {
        let json = serde_json::to_vec_pretty(distances)
            .map_err(|err| TaxoError::Filesystem(err.to_string()))?;
        std::fs::write(path.as_std_path(), json)
            .map_err(|err| TaxoError::Filesystem(err.to_string()))
    }
}
