pub mod aggregate;
pub mod app;
pub mod cache;
pub mod distance;
pub mod domain;
pub mod entrez;
pub mod error;
pub mod output;
pub mod reactions;
