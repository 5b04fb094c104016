//! Compliance-check orchestrator.
//!
//! Drives one run end to end: authentication check → delegated-scope check →
//! retrieval + LLM analysis → notification dispatch → presentation view.
//!
//! Error policy: the consent challenge is the only thing allowed to escape
//! (the request layer answers it with a redirect into the interactive grant);
//! every other fault folds into the returned view. A failed notification
//! never spoils a successful analysis.

use std::sync::Arc;

use tracing::{error, info};
use uuid::Uuid;

use crate::analysis::{ComplianceAnalyzer, ComplianceRequest};
use crate::auth::{AuthGate, ConsentChallenge, REQUIRED_SCOPES};
use crate::compliance::view::ComplianceView;
use crate::error::{AnalysisError, AuthError};
use crate::mail::NotificationDispatcher;

/// User-facing message for any analysis fault; internal detail goes to logs only.
pub const GENERIC_FAILURE_MESSAGE: &str =
    "An error occurred while processing the compliance check. Please try again.";

/// Reported when the analysis produced no author to notify.
const NO_AUTHOR_MESSAGE: &str = "No file author found - unable to send email notification";

/// Orchestrates one compliance run per call. Holds no per-run state:
/// everything request-scoped travels through arguments and return values,
/// so concurrent runs are fully independent.
pub struct ComplianceOrchestrator {
    analyzer: Arc<dyn ComplianceAnalyzer>,
    dispatcher: NotificationDispatcher,
}

impl ComplianceOrchestrator {
    pub fn new(analyzer: Arc<dyn ComplianceAnalyzer>, dispatcher: NotificationDispatcher) -> Self {
        Self {
            analyzer,
            dispatcher,
        }
    }

    /// Run the compliance check for the request's file.
    ///
    /// Both entry points (the interactive trigger and the consent-redirect
    /// return leg) converge here. The run never detaches work, so dropping
    /// the returned future cancels it at the next await point.
    pub async fn run(
        &self,
        gate: &dyn AuthGate,
        request: ComplianceRequest,
    ) -> Result<ComplianceView, ConsentChallenge> {
        if !gate.is_authenticated() {
            info!("User not authenticated, showing sign-in interface");
            return Ok(ComplianceView::sign_in_required());
        }

        let run_id = Uuid::new_v4();
        let user_name = gate.user_name().map(str::to_string);
        info!(
            %run_id,
            user = user_name.as_deref().unwrap_or("unknown"),
            file = %request.file_name,
            "Processing compliance check"
        );

        if let Err(err) = gate.ensure_scopes(&REQUIRED_SCOPES) {
            return match err {
                AuthError::ConsentRequired(challenge) => Err(challenge),
                other => {
                    error!(%run_id, error = %other, "Scope check failed");
                    let mut view = ComplianceView::ready(user_name);
                    view.error = Some(GENERIC_FAILURE_MESSAGE.to_string());
                    Ok(view)
                }
            };
        }

        let mut view = ComplianceView::ready(user_name);

        let result = match self.analyzer.analyze(&request).await {
            Ok(result) => result,
            // The consent signal must escape unchanged so the caller can
            // redirect into the interactive grant; matched before the broad
            // failure arm.
            Err(AnalysisError::ConsentRequired(challenge)) => return Err(challenge),
            Err(err) => {
                error!(%run_id, error = %err, "Error processing compliance check");
                view.error = Some(GENERIC_FAILURE_MESSAGE.to_string());
                return Ok(view);
            }
        };

        view.compliance_result = Some(result.analysis_text.clone());
        view.file_author = Some(result.file_author.clone());
        view.timestamp = Some(result.timestamp);

        if result.file_author.is_empty() {
            info!(%run_id, "No file author found, skipping email notification");
            view.email_sent = Some(false);
            view.email_error = Some(NO_AUTHOR_MESSAGE.to_string());
            return Ok(view);
        }

        let outcome = self
            .dispatcher
            .dispatch(&result.file_author, &result.analysis_text, &request.file_name)
            .await;

        if outcome.success {
            view.email_sent = Some(true);
            view.email_message = Some(outcome.message);
        } else {
            view.email_sent = Some(false);
            view.email_error = Some(outcome.message);
        }

        Ok(view)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use chrono::Utc;

    use super::*;
    use crate::analysis::ComplianceResult;
    use crate::auth::{Principal, PrincipalAuthGate};
    use crate::directory::RecipientResolver;
    use crate::directory::client::{DirectoryEntry, DirectorySearch};
    use crate::error::{DirectoryError, MailError};
    use crate::mail::{MailTransport, OutgoingMail};

    // ── Mock collaborators ──────────────────────────────────────────

    struct FixedAnalyzer {
        result: Result<ComplianceResult, AnalysisError>,
    }

    #[async_trait]
    impl ComplianceAnalyzer for FixedAnalyzer {
        async fn analyze(
            &self,
            _request: &ComplianceRequest,
        ) -> Result<ComplianceResult, AnalysisError> {
            match &self.result {
                Ok(result) => Ok(result.clone()),
                Err(AnalysisError::ConsentRequired(c)) => {
                    Err(AnalysisError::ConsentRequired(c.clone()))
                }
                Err(AnalysisError::Retrieval(msg)) => Err(AnalysisError::Retrieval(msg.clone())),
                Err(_) => Err(AnalysisError::Retrieval("other".into())),
            }
        }
    }

    struct FixedDirectory {
        entry: Option<DirectoryEntry>,
        searches: AtomicUsize,
    }

    #[async_trait]
    impl DirectorySearch for FixedDirectory {
        async fn search(
            &self,
            _query: &str,
            _fields: &[&str],
            _max_results: usize,
        ) -> Result<Vec<DirectoryEntry>, DirectoryError> {
            self.searches.fetch_add(1, Ordering::SeqCst);
            Ok(self.entry.clone().into_iter().collect())
        }
    }

    struct RecordingTransport {
        sends: AtomicUsize,
        sent: Mutex<Vec<OutgoingMail>>,
        fail: bool,
    }

    #[async_trait]
    impl MailTransport for RecordingTransport {
        async fn send(&self, mail: &OutgoingMail) -> Result<(), MailError> {
            self.sends.fetch_add(1, Ordering::SeqCst);
            self.sent.lock().unwrap().push(mail.clone());
            if self.fail {
                Err(MailError::Transport("smtp down".into()))
            } else {
                Ok(())
            }
        }
    }

    fn directory_with(entry: Option<DirectoryEntry>) -> Arc<FixedDirectory> {
        Arc::new(FixedDirectory {
            entry,
            searches: AtomicUsize::new(0),
        })
    }

    fn transport_with(fail: bool) -> Arc<RecordingTransport> {
        Arc::new(RecordingTransport {
            sends: AtomicUsize::new(0),
            sent: Mutex::new(Vec::new()),
            fail,
        })
    }

    fn orchestrator(
        analysis: Result<ComplianceResult, AnalysisError>,
        directory: Arc<FixedDirectory>,
        transport: Arc<RecordingTransport>,
    ) -> ComplianceOrchestrator {
        let resolver = RecipientResolver::new(directory);
        let dispatcher = NotificationDispatcher::new(resolver, transport);
        ComplianceOrchestrator::new(Arc::new(FixedAnalyzer { result: analysis }), dispatcher)
    }

    fn analysis_ok(author: &str) -> Result<ComplianceResult, AnalysisError> {
        Ok(ComplianceResult {
            analysis_text: "OK".to_string(),
            file_author: author.to_string(),
            timestamp: Utc::now(),
        })
    }

    fn consented_gate() -> PrincipalAuthGate {
        PrincipalAuthGate::new(Some(Principal::new("jdoe").with_scopes(REQUIRED_SCOPES)))
    }

    fn mail_entry(address: &str) -> DirectoryEntry {
        DirectoryEntry {
            mail: Some(address.to_string()),
            user_principal_name: None,
            display_name: None,
        }
    }

    // ── State machine ───────────────────────────────────────────────

    #[tokio::test]
    async fn unauthenticated_request_gets_sign_in_view() {
        let orchestrator = orchestrator(
            analysis_ok("jdoe"),
            directory_with(None),
            transport_with(false),
        );
        let gate = PrincipalAuthGate::anonymous();

        let view = orchestrator
            .run(&gate, ComplianceRequest::new("policy.docx"))
            .await
            .unwrap();

        assert!(view.requires_authentication);
        assert!(view.compliance_result.is_none());
    }

    #[tokio::test]
    async fn missing_scopes_raise_consent_challenge() {
        let orchestrator = orchestrator(
            analysis_ok("jdoe"),
            directory_with(None),
            transport_with(false),
        );
        let gate = PrincipalAuthGate::new(Some(Principal::new("jdoe")));

        let challenge = orchestrator
            .run(&gate, ComplianceRequest::new("policy.docx"))
            .await
            .unwrap_err();

        assert_eq!(challenge, ConsentChallenge::required());
    }

    #[tokio::test]
    async fn analyzer_consent_challenge_escapes_unchanged() {
        let orchestrator = orchestrator(
            Err(AnalysisError::ConsentRequired(ConsentChallenge::required())),
            directory_with(None),
            transport_with(false),
        );

        let challenge = orchestrator
            .run(&consented_gate(), ComplianceRequest::new("policy.docx"))
            .await
            .unwrap_err();

        assert_eq!(challenge, ConsentChallenge::required());
    }

    #[tokio::test]
    async fn analysis_fault_yields_generic_error_and_no_partial_result() {
        let directory = directory_with(None);
        let transport = transport_with(false);
        let orchestrator = orchestrator(
            Err(AnalysisError::Retrieval("index exploded".into())),
            directory,
            transport.clone(),
        );

        let view = orchestrator
            .run(&consented_gate(), ComplianceRequest::new("policy.docx"))
            .await
            .unwrap();

        assert_eq!(view.error.as_deref(), Some(GENERIC_FAILURE_MESSAGE));
        // Internal detail stays in the logs.
        assert!(!view.error.unwrap().contains("index exploded"));
        assert!(view.compliance_result.is_none());
        assert!(view.file_author.is_none());
        assert!(view.timestamp.is_none());
        assert!(view.email_sent.is_none());
        assert_eq!(transport.sends.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn successful_run_sends_notification() {
        let directory = directory_with(Some(mail_entry("jdoe@corp.com")));
        let transport = transport_with(false);
        let orchestrator = orchestrator(analysis_ok("jdoe"), directory.clone(), transport.clone());

        let view = orchestrator
            .run(&consented_gate(), ComplianceRequest::new("policy.docx"))
            .await
            .unwrap();

        assert_eq!(view.user_name.as_deref(), Some("jdoe"));
        assert!(view.ready_for_compliance);
        assert_eq!(view.compliance_result.as_deref(), Some("OK"));
        assert_eq!(view.file_author.as_deref(), Some("jdoe"));
        assert!(view.timestamp.is_some());
        assert_eq!(view.email_sent, Some(true));
        assert!(view.email_message.unwrap().contains("jdoe@corp.com"));
        assert!(view.error.is_none());
        assert_eq!(transport.sends.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn empty_author_skips_dispatch_but_run_succeeds() {
        let directory = directory_with(Some(mail_entry("jdoe@corp.com")));
        let transport = transport_with(false);
        let orchestrator = orchestrator(analysis_ok(""), directory.clone(), transport.clone());

        let view = orchestrator
            .run(&consented_gate(), ComplianceRequest::new("policy.docx"))
            .await
            .unwrap();

        assert_eq!(view.compliance_result.as_deref(), Some("OK"));
        assert_eq!(view.email_sent, Some(false));
        assert_eq!(view.email_error.as_deref(), Some(NO_AUTHOR_MESSAGE));
        assert!(view.error.is_none());
        assert_eq!(directory.searches.load(Ordering::SeqCst), 0);
        assert_eq!(transport.sends.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn unresolved_recipient_still_yields_successful_analysis() {
        let directory = directory_with(None);
        let transport = transport_with(false);
        let orchestrator = orchestrator(analysis_ok("jdoe"), directory.clone(), transport.clone());

        let view = orchestrator
            .run(&consented_gate(), ComplianceRequest::new("policy.docx"))
            .await
            .unwrap();

        assert_eq!(view.compliance_result.as_deref(), Some("OK"));
        assert_eq!(view.email_sent, Some(false));
        assert!(
            view.email_error
                .unwrap()
                .contains("Could not resolve email address")
        );
        // All four strategies were tried, none delivered.
        assert_eq!(directory.searches.load(Ordering::SeqCst), 4);
        assert_eq!(transport.sends.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn failed_notification_does_not_spoil_successful_analysis() {
        let directory = directory_with(Some(mail_entry("jdoe@corp.com")));
        let transport = transport_with(true);
        let orchestrator = orchestrator(analysis_ok("jdoe"), directory.clone(), transport.clone());

        let view = orchestrator
            .run(&consented_gate(), ComplianceRequest::new("policy.docx"))
            .await
            .unwrap();

        assert_eq!(view.compliance_result.as_deref(), Some("OK"));
        assert_eq!(view.email_sent, Some(false));
        assert!(view.email_error.unwrap().contains("Failed to send email"));
        assert!(view.error.is_none());
    }

    #[tokio::test]
    async fn empty_file_name_does_not_crash() {
        let directory = directory_with(Some(mail_entry("jdoe@corp.com")));
        let transport = transport_with(false);
        let orchestrator = orchestrator(analysis_ok("jdoe"), directory.clone(), transport.clone());

        let view = orchestrator
            .run(&consented_gate(), ComplianceRequest::new(""))
            .await
            .unwrap();

        assert_eq!(view.email_sent, Some(true));
        let sent = transport.sent.lock().unwrap();
        assert_eq!(sent[0].subject, "Compliance report for file ");
    }
}
