//! Compliance analysis — retrieval over indexed content plus LLM review.

pub mod retrieval;
pub mod service;
pub mod types;

pub use retrieval::{RetrievalService, SearchIndexClient};
pub use service::{ComplianceAnalyzer, RetrievalAnalyzer};
pub use types::{ComplianceRequest, ComplianceResult, RetrievedContent};
