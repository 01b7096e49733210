//! Classification scheduling
//!
//! Pulls scraped-but-unclassified profiles, gates out bodies too short to be
//! worth a collaborator call, and drives each call with bounded retry and a
//! fixed delay. A profile whose retries exhaust stays unclassified for a
//! future pass; nothing here is fatal to the batch.

use crate::classify::{validate_classification, Classification, Classifier};
use crate::config::AnalyzerConfig;
use crate::storage::Store;
use crate::{AtlasError, Result};
use std::time::Duration;

/// Outcome counts for a classification pass
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ClassificationSummary {
    pub classified: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Schedules classification collaborator calls over unclassified profiles
pub struct ClassificationOrchestrator<'a> {
    classifier: &'a dyn Classifier,
    config: &'a AnalyzerConfig,
}

impl<'a> ClassificationOrchestrator<'a> {
    pub fn new(classifier: &'a dyn Classifier, config: &'a AnalyzerConfig) -> Self {
        Self { classifier, config }
    }

    /// Runs one classification pass
    ///
    /// Each profile is handled independently; validation failures and
    /// collaborator errors feed the bounded retry, and exhaustion leaves the
    /// profile unclassified.
    pub async fn run(
        &self,
        store: &mut dyn Store,
        limit: Option<usize>,
    ) -> Result<ClassificationSummary> {
        let profiles = store.unclassified_profiles(limit)?;
        tracing::info!(count = profiles.len(), "classifying profiles");

        let mut summary = ClassificationSummary::default();
        let retry_delay = Duration::from_millis(self.config.retry_delay_ms);

        for profile in profiles {
            let body = profile.body_text.clone().unwrap_or_default();

            if body.trim().len() < self.config.min_body_chars {
                tracing::warn!(
                    name = %profile.name,
                    "skipping classification: insufficient body text"
                );
                summary.skipped += 1;
                continue;
            }

            let mut attempt: u32 = 0;
            loop {
                attempt += 1;

                let outcome = match self.classify_once(&profile.name, &body).await {
                    Ok(classification) => store
                        .store_classification(profile.id, &classification)
                        .map_err(AtlasError::from),
                    Err(e) => Err(e),
                };

                match outcome {
                    Ok(()) => {
                        tracing::info!(name = %profile.name, "stored classification");
                        summary.classified += 1;
                        break;
                    }
                    Err(e) if attempt <= self.config.max_retries => {
                        tracing::warn!(
                            name = %profile.name,
                            attempt,
                            error = %e,
                            "classification attempt failed"
                        );
                        tokio::time::sleep(retry_delay).await;
                    }
                    Err(e) => {
                        tracing::error!(
                            name = %profile.name,
                            attempts = attempt,
                            error = %e,
                            "classification failed, leaving unclassified"
                        );
                        summary.failed += 1;
                        break;
                    }
                }
            }
        }

        tracing::info!(
            classified = summary.classified,
            skipped = summary.skipped,
            failed = summary.failed,
            "classification pass finished"
        );

        Ok(summary)
    }

    async fn classify_once(&self, name: &str, body: &str) -> Result<Classification> {
        let value = self
            .classifier
            .classify(name, body)
            .await
            .map_err(|e| AtlasError::Classifier(e.to_string()))?;

        validate_classification(&value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawler::CompanyProfile;
    use crate::storage::SqliteStore;
    use async_trait::async_trait;
    use chrono::Utc;
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn analyzer_config(max_retries: u32) -> AnalyzerConfig {
        AnalyzerConfig {
            model: "o4-mini".to_string(),
            min_body_chars: 10,
            max_retries,
            retry_delay_ms: 1,
            classification_prompt: "Analyze: {{body}}".to_string(),
        }
    }

    /// Collaborator stub returning a fixed sequence of responses
    struct StubClassifier {
        responses: Vec<anyhow::Result<Value>>,
        calls: AtomicUsize,
    }

    impl StubClassifier {
        fn new(responses: Vec<anyhow::Result<Value>>) -> Self {
            Self {
                responses,
                calls: AtomicUsize::new(0),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Classifier for StubClassifier {
        async fn classify(&self, _name: &str, _body: &str) -> anyhow::Result<Value> {
            let index = self.calls.fetch_add(1, Ordering::SeqCst);
            match self.responses.get(index) {
                Some(Ok(value)) => Ok(value.clone()),
                Some(Err(e)) => Err(anyhow::anyhow!(e.to_string())),
                None => Err(anyhow::anyhow!("stub exhausted")),
            }
        }
    }

    fn profile(body: &str) -> CompanyProfile {
        CompanyProfile {
            name: "Acme Robotics".to_string(),
            description: None,
            location: None,
            directory_url: "https://www.ycombinator.com/companies/acme".to_string(),
            website: None,
            company_profile_links: vec![],
            founder_profile_links: vec![],
            founder_names: vec![],
            batch: "W25".to_string(),
            body_text: body.to_string(),
        }
    }

    fn store_with_profile(body: &str) -> (SqliteStore, i64) {
        let mut store = SqliteStore::new_in_memory().unwrap();
        store
            .insert_url_if_absent("https://www.ycombinator.com/companies/acme", "W25")
            .unwrap();
        let url_id = store
            .get_url("https://www.ycombinator.com/companies/acme")
            .unwrap()
            .unwrap()
            .id;
        let profile_id = store
            .upsert_profile(url_id, &profile(body), Utc::now())
            .unwrap();
        (store, profile_id)
    }

    fn good_response() -> Value {
        json!({
            "theme": "AI Agents",
            "tags": ["Agentic Workflow"],
            "rationale": "Builds autonomous agents."
        })
    }

    #[tokio::test]
    async fn test_classification_round_trip() {
        let (mut store, _profile_id) = store_with_profile("Acme builds autonomous agents.");
        let classifier = StubClassifier::new(vec![Ok(good_response())]);
        let config = analyzer_config(3);

        let orchestrator = ClassificationOrchestrator::new(&classifier, &config);
        let summary = orchestrator.run(&mut store, None).await.unwrap();

        assert_eq!(summary.classified, 1);
        assert_eq!(classifier.calls(), 1);

        let stored = store.get_profile_by_url_id(1).unwrap().unwrap();
        assert_eq!(stored.theme, Some("AI Agents".to_string()));
        assert_eq!(stored.tags, vec!["Agentic Workflow"]);
        assert_eq!(stored.rationale, Some("Builds autonomous agents.".to_string()));

        // Second pass finds nothing left to do
        let summary = orchestrator.run(&mut store, None).await.unwrap();
        assert_eq!(summary.classified, 0);
        assert_eq!(classifier.calls(), 1);
    }

    #[tokio::test]
    async fn test_short_body_skipped_without_collaborator_call() {
        let (mut store, _) = store_with_profile("tiny");
        let classifier = StubClassifier::new(vec![Ok(good_response())]);
        let config = analyzer_config(3);

        let orchestrator = ClassificationOrchestrator::new(&classifier, &config);
        let summary = orchestrator.run(&mut store, None).await.unwrap();

        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.classified, 0);
        assert_eq!(classifier.calls(), 0);
    }

    #[tokio::test]
    async fn test_validation_failure_retries_then_succeeds() {
        let (mut store, _) = store_with_profile("Acme builds autonomous agents.");
        // First response is missing `tags`, second is valid
        let classifier = StubClassifier::new(vec![
            Ok(json!({"theme": "AI Agents", "rationale": "r"})),
            Ok(good_response()),
        ]);
        let config = analyzer_config(3);

        let orchestrator = ClassificationOrchestrator::new(&classifier, &config);
        let summary = orchestrator.run(&mut store, None).await.unwrap();

        assert_eq!(summary.classified, 1);
        assert_eq!(classifier.calls(), 2);
    }

    #[tokio::test]
    async fn test_exhausted_retries_leave_profile_unclassified() {
        let (mut store, _) = store_with_profile("Acme builds autonomous agents.");
        let classifier = StubClassifier::new(vec![
            Err(anyhow::anyhow!("boom")),
            Err(anyhow::anyhow!("boom")),
            Err(anyhow::anyhow!("boom")),
        ]);
        let config = analyzer_config(2);

        let orchestrator = ClassificationOrchestrator::new(&classifier, &config);
        let summary = orchestrator.run(&mut store, None).await.unwrap();

        // max_retries = 2 means exactly three attempts
        assert_eq!(classifier.calls(), 3);
        assert_eq!(summary.failed, 1);

        let stored = store.get_profile_by_url_id(1).unwrap().unwrap();
        assert_eq!(stored.theme, None);
        // Still eligible for a future pass
        assert_eq!(store.unclassified_profiles(None).unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_failure_does_not_abort_the_pass() {
        let mut store = SqliteStore::new_in_memory().unwrap();
        for (i, name) in ["acme", "beta"].iter().enumerate() {
            let url = format!("https://www.ycombinator.com/companies/{}", name);
            store.insert_url_if_absent(&url, "W25").unwrap();
            let url_id = store.get_url(&url).unwrap().unwrap().id;
            let mut p = profile("A body long enough to classify.");
            p.name = format!("Company {}", i);
            store.upsert_profile(url_id, &p, Utc::now()).unwrap();
        }

        // Every attempt for the first profile fails, the second succeeds
        let classifier = StubClassifier::new(vec![
            Err(anyhow::anyhow!("boom")),
            Ok(good_response()),
        ]);
        let config = analyzer_config(0);

        let orchestrator = ClassificationOrchestrator::new(&classifier, &config);
        let summary = orchestrator.run(&mut store, None).await.unwrap();

        assert_eq!(summary.failed, 1);
        assert_eq!(summary.classified, 1);
    }

    #[tokio::test]
    async fn test_limit_restricts_pass_size() {
        let mut store = SqliteStore::new_in_memory().unwrap();
        for name in ["acme", "beta", "gamma"] {
            let url = format!("https://www.ycombinator.com/companies/{}", name);
            store.insert_url_if_absent(&url, "W25").unwrap();
            let url_id = store.get_url(&url).unwrap().unwrap().id;
            store
                .upsert_profile(url_id, &profile("A body long enough to classify."), Utc::now())
                .unwrap();
        }

        let classifier = StubClassifier::new(vec![Ok(good_response()), Ok(good_response())]);
        let config = analyzer_config(0);

        let orchestrator = ClassificationOrchestrator::new(&classifier, &config);
        let summary = orchestrator.run(&mut store, Some(2)).await.unwrap();

        assert_eq!(summary.classified, 2);
        assert_eq!(store.unclassified_profiles(None).unwrap().len(), 1);
    }
}
