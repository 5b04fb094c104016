//! Recipient resolution — prioritized search cascade with graceful degradation.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::directory::client::{DirectorySearch, SELECT_FIELDS};

/// Entries requested per strategy; only the first returned entry is consulted.
const MAX_CANDIDATES: usize = 5;

/// The candidate search expressions for one identifier, in priority order:
/// display name, mail, principal name, then an unstructured token search.
/// A hit on strategy k suppresses strategies k+1..n.
fn candidate_queries(identifier: &str) -> [String; 4] {
    [
        format!("\"displayName:{identifier}\""),
        format!("\"mail:{identifier}\""),
        format!("\"userPrincipalName:{identifier}\""),
        identifier.to_string(),
    ]
}

/// Resolves a human-readable identifier to a deliverable mail address.
pub struct RecipientResolver {
    directory: Arc<dyn DirectorySearch>,
}

impl RecipientResolver {
    pub fn new(directory: Arc<dyn DirectorySearch>) -> Self {
        Self { directory }
    }

    /// Try each search strategy in order and return the first deliverable
    /// address found: the entry's `mail` if set, else its principal name.
    ///
    /// A strategy whose lookup fails outright is logged and skipped; only
    /// full exhaustion yields `None`, which callers treat as a reportable
    /// condition, never a fault.
    pub async fn resolve(&self, identifier: &str) -> Option<String> {
        info!(recipient = identifier, "Attempting to resolve email address");

        for query in candidate_queries(identifier) {
            debug!(%query, "Searching directory");

            let entries = match self
                .directory
                .search(&query, &SELECT_FIELDS, MAX_CANDIDATES)
                .await
            {
                Ok(entries) => entries,
                Err(e) => {
                    warn!(%query, error = %e, "Search strategy failed, trying next");
                    continue;
                }
            };

            // At most one entry per strategy is ever relevant; remote search
            // ranking decides which when matches are ambiguous.
            let Some(entry) = entries.into_iter().next() else {
                continue;
            };

            if let Some(mail) = entry.mail.filter(|m| !m.is_empty()) {
                info!(recipient = identifier, email = %mail, "Resolved via mail field");
                return Some(mail);
            }

            if let Some(upn) = entry.user_principal_name.filter(|u| !u.is_empty()) {
                info!(recipient = identifier, email = %upn, "Using principal name as email");
                return Some(upn);
            }
        }

        warn!(recipient = identifier, "Could not resolve email address");
        None
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::directory::client::DirectoryEntry;
    use crate::error::DirectoryError;

    /// Scripted directory: one canned response per strategy, with every
    /// issued query recorded.
    struct ScriptedDirectory {
        responses: Mutex<Vec<Result<Vec<DirectoryEntry>, DirectoryError>>>,
        queries: Mutex<Vec<String>>,
    }

    impl ScriptedDirectory {
        fn new(responses: Vec<Result<Vec<DirectoryEntry>, DirectoryError>>) -> Self {
            Self {
                responses: Mutex::new(responses),
                queries: Mutex::new(Vec::new()),
            }
        }

        fn queries(&self) -> Vec<String> {
            self.queries.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl DirectorySearch for ScriptedDirectory {
        async fn search(
            &self,
            query: &str,
            _fields: &[&str],
            _max_results: usize,
        ) -> Result<Vec<DirectoryEntry>, DirectoryError> {
            self.queries.lock().unwrap().push(query.to_string());
            let mut responses = self.responses.lock().unwrap();
            if responses.is_empty() {
                Ok(Vec::new())
            } else {
                responses.remove(0)
            }
        }
    }

    fn entry(mail: Option<&str>, upn: Option<&str>) -> DirectoryEntry {
        DirectoryEntry {
            mail: mail.map(String::from),
            user_principal_name: upn.map(String::from),
            display_name: None,
        }
    }

    #[test]
    fn queries_built_in_priority_order() {
        let queries = candidate_queries("jdoe");
        assert_eq!(
            queries,
            [
                "\"displayName:jdoe\"".to_string(),
                "\"mail:jdoe\"".to_string(),
                "\"userPrincipalName:jdoe\"".to_string(),
                "jdoe".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn first_strategy_hit_short_circuits() {
        let directory = Arc::new(ScriptedDirectory::new(vec![Ok(vec![entry(
            Some("jdoe@corp.com"),
            None,
        )])]));
        let resolver = RecipientResolver::new(directory.clone());

        let resolved = resolver.resolve("jdoe").await;
        assert_eq!(resolved.as_deref(), Some("jdoe@corp.com"));
        assert_eq!(directory.queries().len(), 1);
    }

    #[tokio::test]
    async fn second_strategy_hit_stops_cascade() {
        let directory = Arc::new(ScriptedDirectory::new(vec![
            Ok(vec![]),
            Ok(vec![entry(Some("jdoe@corp.com"), None)]),
        ]));
        let resolver = RecipientResolver::new(directory.clone());

        let resolved = resolver.resolve("jdoe").await;
        assert_eq!(resolved.as_deref(), Some("jdoe@corp.com"));
        assert_eq!(directory.queries().len(), 2);
        assert_eq!(directory.queries()[1], "\"mail:jdoe\"");
    }

    #[tokio::test]
    async fn principal_name_used_when_mail_missing() {
        let directory = Arc::new(ScriptedDirectory::new(vec![Ok(vec![entry(
            None,
            Some("jdoe@corp.onmicrosoft.com"),
        )])]));
        let resolver = RecipientResolver::new(directory);

        let resolved = resolver.resolve("jdoe").await;
        assert_eq!(resolved.as_deref(), Some("jdoe@corp.onmicrosoft.com"));
    }

    #[tokio::test]
    async fn empty_mail_falls_through_to_principal_name() {
        let directory = Arc::new(ScriptedDirectory::new(vec![Ok(vec![entry(
            Some(""),
            Some("jdoe@corp.com"),
        )])]));
        let resolver = RecipientResolver::new(directory);

        let resolved = resolver.resolve("jdoe").await;
        assert_eq!(resolved.as_deref(), Some("jdoe@corp.com"));
    }

    #[tokio::test]
    async fn strategy_errors_are_not_fatal() {
        let directory = Arc::new(ScriptedDirectory::new(vec![
            Err(DirectoryError::Request("boom".into())),
            Err(DirectoryError::Request("boom".into())),
            Err(DirectoryError::Request("boom".into())),
            Ok(vec![entry(None, Some("jdoe@corp.com"))]),
        ]));
        let resolver = RecipientResolver::new(directory.clone());

        let resolved = resolver.resolve("jdoe").await;
        assert_eq!(resolved.as_deref(), Some("jdoe@corp.com"));
        assert_eq!(directory.queries().len(), 4);
        assert_eq!(directory.queries()[3], "jdoe");
    }

    #[tokio::test]
    async fn exhausted_strategies_yield_none() {
        let directory = Arc::new(ScriptedDirectory::new(vec![
            Ok(vec![]),
            Ok(vec![]),
            Ok(vec![]),
            Ok(vec![]),
        ]));
        let resolver = RecipientResolver::new(directory.clone());

        assert!(resolver.resolve("nobody").await.is_none());
        assert_eq!(directory.queries().len(), 4);
    }

    #[tokio::test]
    async fn entry_with_no_usable_field_continues_cascade() {
        let directory = Arc::new(ScriptedDirectory::new(vec![
            Ok(vec![entry(None, None)]),
            Ok(vec![entry(Some("jdoe@corp.com"), None)]),
        ]));
        let resolver = RecipientResolver::new(directory.clone());

        let resolved = resolver.resolve("jdoe").await;
        assert_eq!(resolved.as_deref(), Some("jdoe@corp.com"));
        assert_eq!(directory.queries().len(), 2);
    }

    #[tokio::test]
    async fn only_first_entry_per_strategy_is_consulted() {
        let directory = Arc::new(ScriptedDirectory::new(vec![Ok(vec![
            entry(None, None),
            entry(Some("second@corp.com"), None),
        ])]));
        let resolver = RecipientResolver::new(directory);

        // First entry has no address; the second is never consulted, so the
        // cascade moves on and ultimately resolves nothing.
        assert!(resolver.resolve("jdoe").await.is_none());
    }

    #[tokio::test]
    async fn resolution_is_idempotent_for_stable_directory() {
        let entries = vec![entry(Some("jdoe@corp.com"), None)];
        let directory = Arc::new(ScriptedDirectory::new(vec![
            Ok(entries.clone()),
            Ok(entries),
        ]));
        let resolver = RecipientResolver::new(directory);

        let first = resolver.resolve("jdoe").await;
        let second = resolver.resolve("jdoe").await;
        assert_eq!(first, second);
    }
}
