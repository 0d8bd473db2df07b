use camino::Utf8PathBuf;
use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum TaxoError {
    #[error("taxonomic information for {0} not found in NCBI")]
    NotFound(String),

    #[error("Entrez request failed: {0}")]
    EntrezHttp(String),

    #[error("Entrez returned status {status}: {message}")]
    EntrezStatus { status: u16, message: String },

    #[error("failed to read taxon cache at {0}")]
    CacheRead(Utf8PathBuf),

    #[error("malformed taxon cache entry: {0}")]
    CacheSchema(String),

    #[error("failed to read reaction input at {0}")]
    InputRead(Utf8PathBuf),

    #[error("failed to parse reaction input: {0}")]
    InputParse(String),

    #[error("filesystem error: {0}")]
    Filesystem(String),
}
