//! Compliance analyzer — retrieves the governing rules and the target file,
//! then asks the LLM for a compliance review of the file against the rules.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tracing::{info, warn};

use crate::analysis::retrieval::RetrievalService;
use crate::analysis::types::{ComplianceRequest, ComplianceResult, RetrievedContent};
use crate::error::AnalysisError;
use crate::llm::{ChatMessage, CompletionRequest, LlmProvider};

/// Max tokens for the analysis completion.
const ANALYSIS_MAX_TOKENS: u32 = 2048;

/// Temperature for the analysis (deterministic-ish).
const ANALYSIS_TEMPERATURE: f32 = 0.2;

/// Query and filter selecting the governing compliance rules.
const RULES_QUERY: &str = "compliance policy rules";
const RULES_FILTER: &str = "source eq 'rules'";

/// Analysis seam consumed by the orchestrator.
#[async_trait]
pub trait ComplianceAnalyzer: Send + Sync {
    /// Analyze the named file. May raise `AnalysisError::ConsentRequired`
    /// when delegated access to the content needs an interactive grant.
    async fn analyze(
        &self,
        request: &ComplianceRequest,
    ) -> Result<ComplianceResult, AnalysisError>;
}

/// Analyzer composing the retrieval collaborator with the LLM.
pub struct RetrievalAnalyzer {
    retrieval: Arc<dyn RetrievalService>,
    llm: Arc<dyn LlmProvider>,
}

impl RetrievalAnalyzer {
    pub fn new(retrieval: Arc<dyn RetrievalService>, llm: Arc<dyn LlmProvider>) -> Self {
        Self { retrieval, llm }
    }
}

#[async_trait]
impl ComplianceAnalyzer for RetrievalAnalyzer {
    async fn analyze(
        &self,
        request: &ComplianceRequest,
    ) -> Result<ComplianceResult, AnalysisError> {
        info!(file = %request.file_name, "Running compliance analysis");

        // Rules and file retrieval are independent reads.
        let file_query_filter = file_filter(&request.file_name);
        let (rules, file_rows) = futures::try_join!(
            self.retrieval.search(RULES_QUERY, RULES_FILTER),
            self.retrieval
                .search(&request.file_name, &file_query_filter),
        )?;

        let file = file_rows.into_iter().next().unwrap_or_else(|| {
            warn!(file = %request.file_name, "File not found in index, analyzing empty context");
            RetrievedContent::default()
        });
        let file_author = file.file_author.clone();

        let completion = CompletionRequest::new(vec![
            ChatMessage::system(build_system_prompt()),
            ChatMessage::user(build_user_prompt(&rules, &file)),
        ])
        .with_temperature(ANALYSIS_TEMPERATURE)
        .with_max_tokens(ANALYSIS_MAX_TOKENS);

        let response = self.llm.complete(completion).await?;

        info!(
            file = %request.file_name,
            author = %file_author,
            "Compliance analysis complete"
        );

        Ok(ComplianceResult {
            analysis_text: response.content,
            file_author,
            timestamp: Utc::now(),
        })
    }
}

/// OData filter selecting the named file by title. Single quotes double as
/// the OData escape.
fn file_filter(file_name: &str) -> String {
    format!("title eq '{}'", file_name.replace('\'', "''"))
}

fn build_system_prompt() -> String {
    "You are a compliance reviewer. Assess the provided file against the \
     provided compliance rules. Report each rule as satisfied or violated, \
     with a short justification, then give an overall verdict."
        .to_string()
}

fn build_user_prompt(rules: &[RetrievedContent], file: &RetrievedContent) -> String {
    let mut prompt = String::from("## Compliance rules\n");
    if rules.is_empty() {
        prompt.push_str("(no rules found in the index)\n");
    }
    for rule in rules {
        prompt.push_str(&format!("### {}\n{}\n", rule.title, rule.content));
    }

    prompt.push_str(&format!(
        "\n## File under review: {}\n{}\n",
        file.title, file.content
    ));
    prompt
}
