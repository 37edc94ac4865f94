//! Ties the trigger call to the store's optimistic lifecycle.

use std::sync::{Arc, Mutex};

use storyreel_core::target::GenerationTarget;

use crate::store::EditorStore;
use crate::trigger::{GenerationTrigger, TriggerError, TriggerOptions, TriggeredJob};

/// Starts generations on behalf of the editor.
///
/// The spinner appears the moment the user clicks, independent of server
/// confirmation latency; the marker is confirmed with the provider
/// request id on success and dropped on failure so the change feed can
/// flow again.
pub struct GenerationRequester<T: GenerationTrigger> {
    trigger: T,
    store: Arc<Mutex<EditorStore>>,
}

impl<T: GenerationTrigger> GenerationRequester<T> {
    pub fn new(trigger: T, store: Arc<Mutex<EditorStore>>) -> Self {
        Self { trigger, store }
    }

    /// Trigger a generation and manage the optimistic marker around it.
    pub async fn request_generation(
        &self,
        target: GenerationTarget,
        options: &TriggerOptions,
    ) -> Result<TriggeredJob, TriggerError> {
        if let Ok(mut store) = self.store.lock() {
            store.begin_generation(target);
        }

        match self.trigger.trigger(target, options).await {
            Ok(job) => {
                if let Ok(mut store) = self.store.lock() {
                    match job.external_request_id.as_deref() {
                        Some(request_id) => store.confirm_submission(target, request_id),
                        // Accepted but not yet submitted; keep the
                        // spinner, the feed will carry the id.
                        None => {}
                    }
                }
                Ok(job)
            }
            Err(err) => {
                if let Ok(mut store) = self.store.lock() {
                    store.abandon_generation(target);
                }
                tracing::warn!(error = %err, "generation trigger failed");
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use storyreel_db::models::status::GenerationStatus;

    struct FakeTrigger {
        response: Mutex<Option<Result<TriggeredJob, TriggerError>>>,
    }

    impl FakeTrigger {
        fn accepting(request_id: &str) -> Self {
            Self {
                response: Mutex::new(Some(Ok(TriggeredJob {
                    id: 1,
                    external_request_id: Some(request_id.to_string()),
                    status_id: GenerationStatus::Submitted.id(),
                }))),
            }
        }

        fn refusing(status: u16, message: &str) -> Self {
            Self {
                response: Mutex::new(Some(Err(TriggerError::Refused {
                    status,
                    message: message.to_string(),
                }))),
            }
        }
    }

    #[async_trait]
    impl GenerationTrigger for FakeTrigger {
        async fn trigger(
            &self,
            _: GenerationTarget,
            _: &TriggerOptions,
        ) -> Result<TriggeredJob, TriggerError> {
            self.response
                .lock()
                .unwrap()
                .take()
                .expect("trigger called more than once")
        }
    }

    #[tokio::test]
    async fn accepted_trigger_confirms_the_optimistic_marker() {
        let store = Arc::new(Mutex::new(EditorStore::new()));
        let requester =
            GenerationRequester::new(FakeTrigger::accepting("abc123"), store.clone());
        let target = GenerationTarget::ShotImage(1);

        let job = requester
            .request_generation(target, &TriggerOptions::default())
            .await
            .unwrap();
        assert_eq!(job.external_request_id.as_deref(), Some("abc123"));
        assert!(store.lock().unwrap().is_generating(target));
    }

    #[tokio::test]
    async fn refused_trigger_drops_the_marker() {
        let store = Arc::new(Mutex::new(EditorStore::new()));
        let requester = GenerationRequester::new(
            FakeTrigger::refusing(400, "image_prompt must be set"),
            store.clone(),
        );
        let target = GenerationTarget::ShotImage(1);

        let err = requester
            .request_generation(target, &TriggerOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, TriggerError::Refused { status: 400, .. }));
        assert!(!store.lock().unwrap().is_generating(target));
    }
}
