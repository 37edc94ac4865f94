//! End-to-end pipeline tests against an in-memory store and scripted
//! provider fakes: trigger, optimistic updates, polling, reconciliation,
//! timeout upgrade, and supersession.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use assert_matches::assert_matches;
use async_trait::async_trait;
use chrono::Utc;
use storyreel_core::error::CoreError;
use storyreel_core::generation::{invariant_holds, TerminalOutcome, TIMEOUT_REASON};
use storyreel_core::types::DbId;
use storyreel_db::models::character::Character;
use storyreel_db::models::generation::Generation;
use storyreel_db::models::scene::Scene;
use storyreel_db::models::shot::Shot;
use storyreel_db::models::status::GenerationStatus;
use storyreel_events::{EventBus, RowChangeEvent};
use storyreel_pipeline::{
    Applied, EntityGenerationState, GenerationOptions, GenerationOrchestrator, GenerationTarget,
    JobStore, PipelineError, PollConfig, StoreError, TargetSnapshot,
};
use storyreel_providers::{
    GenerationRequest, Provider, ProviderError, ProviderId, ProviderJobState, ProviderJobStatus,
    ProviderSet, Submission,
};
use tokio::sync::broadcast;

// ---------------------------------------------------------------------------
// In-memory store
// ---------------------------------------------------------------------------

#[derive(Default)]
struct MemoryInner {
    next_job_id: DbId,
    jobs: Vec<Generation>,
    shots: HashMap<DbId, Shot>,
    scenes: HashMap<DbId, Scene>,
    characters: HashMap<DbId, Character>,
}

/// Mirrors the Postgres store's write semantics on plain maps.
#[derive(Default)]
struct MemoryStore {
    inner: Mutex<MemoryInner>,
}

impl MemoryStore {
    fn insert_shot(&self, shot: Shot) {
        self.inner.lock().unwrap().shots.insert(shot.id, shot);
    }

    fn insert_scene(&self, scene: Scene) {
        self.inner.lock().unwrap().scenes.insert(scene.id, scene);
    }

    fn insert_job(&self, job: Generation) {
        let mut inner = self.inner.lock().unwrap();
        inner.next_job_id = inner.next_job_id.max(job.id);
        inner.jobs.push(job);
    }

    fn shot(&self, id: DbId) -> Shot {
        self.inner.lock().unwrap().shots[&id].clone()
    }

    fn scene(&self, id: DbId) -> Scene {
        self.inner.lock().unwrap().scenes[&id].clone()
    }

    fn job(&self, id: DbId) -> Generation {
        self.inner
            .lock()
            .unwrap()
            .jobs
            .iter()
            .find(|j| j.id == id)
            .cloned()
            .unwrap()
    }

    fn job_count(&self) -> usize {
        self.inner.lock().unwrap().jobs.len()
    }

    fn with_job<R>(&self, id: DbId, f: impl FnOnce(&mut Generation) -> R) -> Result<R, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        let job = inner
            .jobs
            .iter_mut()
            .find(|j| j.id == id)
            .ok_or(StoreError::EntityNotFound {
                entity: "Generation",
                id,
            })?;
        Ok(f(job))
    }
}

#[async_trait]
impl JobStore for MemoryStore {
    async fn load_target(&self, target: &GenerationTarget) -> Result<TargetSnapshot, StoreError> {
        let inner = self.inner.lock().unwrap();
        match *target {
            GenerationTarget::ShotImage(id) => {
                let shot = inner
                    .shots
                    .get(&id)
                    .ok_or(StoreError::EntityNotFound { entity: "Shot", id })?;
                Ok(TargetSnapshot {
                    prompt: shot.image_prompt.clone(),
                    reference_url: None,
                    upstream_image_completed: false,
                    tracked_request_id: shot.image_request_id.clone(),
                })
            }
            GenerationTarget::ShotVideo(id) => {
                let shot = inner
                    .shots
                    .get(&id)
                    .ok_or(StoreError::EntityNotFound { entity: "Shot", id })?;
                Ok(TargetSnapshot {
                    prompt: shot.video_prompt.clone(),
                    reference_url: shot.image_url.clone(),
                    upstream_image_completed: shot.has_completed_image(),
                    tracked_request_id: shot.video_request_id.clone(),
                })
            }
            GenerationTarget::CharacterPortrait(id) => {
                let character =
                    inner
                        .characters
                        .get(&id)
                        .ok_or(StoreError::EntityNotFound {
                            entity: "Character",
                            id,
                        })?;
                Ok(TargetSnapshot {
                    prompt: character.appearance_prompt.clone(),
                    reference_url: None,
                    upstream_image_completed: false,
                    tracked_request_id: character.portrait_request_id.clone(),
                })
            }
            GenerationTarget::SceneDescription(id) => {
                let scene = inner
                    .scenes
                    .get(&id)
                    .ok_or(StoreError::EntityNotFound { entity: "Scene", id })?;
                Ok(TargetSnapshot {
                    prompt: scene.summary.clone(),
                    reference_url: None,
                    upstream_image_completed: false,
                    tracked_request_id: scene.description_request_id.clone(),
                })
            }
        }
    }

    async fn create_job(
        &self,
        target: &GenerationTarget,
        provider: &str,
    ) -> Result<Generation, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        inner.next_job_id += 1;
        let now = Utc::now();
        let job = Generation {
            id: inner.next_job_id,
            owner_entity_type: target.entity_type().as_str().to_string(),
            owner_entity_id: target.entity_id(),
            kind: target.kind().as_str().to_string(),
            provider: provider.to_string(),
            external_request_id: None,
            status_id: GenerationStatus::Pending.id(),
            result_ref: None,
            failure_reason: None,
            created_at: now,
            updated_at: now,
        };
        inner.jobs.push(job.clone());
        Ok(job)
    }

    async fn job_submitted(
        &self,
        job_id: DbId,
        external_request_id: &str,
    ) -> Result<(), StoreError> {
        self.with_job(job_id, |job| {
            job.status_id = GenerationStatus::Submitted.id();
            job.external_request_id = Some(external_request_id.to_string());
        })
    }

    async fn job_generating(&self, job_id: DbId) -> Result<(), StoreError> {
        self.with_job(job_id, |job| {
            let terminal = GenerationStatus::from_id(job.status_id)
                .is_some_and(GenerationStatus::is_terminal);
            if !terminal {
                job.status_id = GenerationStatus::Generating.id();
            }
        })
    }

    async fn job_completed(&self, job_id: DbId, result_ref: &str) -> Result<(), StoreError> {
        self.with_job(job_id, |job| {
            job.status_id = GenerationStatus::Completed.id();
            job.result_ref = Some(result_ref.to_string());
            job.failure_reason = None;
        })
    }

    async fn job_failed(&self, job_id: DbId, reason: &str) -> Result<(), StoreError> {
        self.with_job(job_id, |job| {
            job.status_id = GenerationStatus::Failed.id();
            job.failure_reason = Some(reason.to_string());
            job.result_ref = None;
        })
    }

    async fn find_job_by_request_id(
        &self,
        external_request_id: &str,
    ) -> Result<Option<Generation>, StoreError> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .jobs
            .iter()
            .find(|j| j.external_request_id.as_deref() == Some(external_request_id))
            .cloned())
    }

    async fn write_entity_state(
        &self,
        target: &GenerationTarget,
        state: EntityGenerationState,
    ) -> Result<serde_json::Value, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        match *target {
            GenerationTarget::ShotImage(id) => {
                let shot = inner
                    .shots
                    .get_mut(&id)
                    .ok_or(StoreError::EntityNotFound { entity: "Shot", id })?;
                shot.image_status_id = Some(state.status.id());
                shot.image_request_id = state.request_id;
                shot.image_url = state.result_ref;
                serde_json::to_value(&*shot).map_err(|e| StoreError::Serialize(e.to_string()))
            }
            GenerationTarget::ShotVideo(id) => {
                let shot = inner
                    .shots
                    .get_mut(&id)
                    .ok_or(StoreError::EntityNotFound { entity: "Shot", id })?;
                shot.video_status_id = Some(state.status.id());
                shot.video_request_id = state.request_id;
                shot.video_url = state.result_ref;
                serde_json::to_value(&*shot).map_err(|e| StoreError::Serialize(e.to_string()))
            }
            GenerationTarget::CharacterPortrait(id) => {
                let character =
                    inner
                        .characters
                        .get_mut(&id)
                        .ok_or(StoreError::EntityNotFound {
                            entity: "Character",
                            id,
                        })?;
                character.portrait_status_id = Some(state.status.id());
                character.portrait_request_id = state.request_id;
                character.portrait_url = state.result_ref;
                serde_json::to_value(&*character).map_err(|e| StoreError::Serialize(e.to_string()))
            }
            GenerationTarget::SceneDescription(id) => {
                let scene = inner
                    .scenes
                    .get_mut(&id)
                    .ok_or(StoreError::EntityNotFound { entity: "Scene", id })?;
                scene.description_status_id = Some(state.status.id());
                scene.description_request_id = state.request_id;
                scene.description = state.result_ref;
                serde_json::to_value(&*scene).map_err(|e| StoreError::Serialize(e.to_string()))
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Scripted provider fake
// ---------------------------------------------------------------------------

struct FakeProvider {
    id: ProviderId,
    submit_response: Mutex<Option<Result<Submission, ProviderError>>>,
    statuses: Mutex<VecDeque<Result<ProviderJobStatus, ProviderError>>>,
    submitted: Mutex<Vec<GenerationRequest>>,
}

impl FakeProvider {
    fn new(id: ProviderId) -> Arc<Self> {
        Arc::new(Self {
            id,
            submit_response: Mutex::new(None),
            statuses: Mutex::new(VecDeque::new()),
            submitted: Mutex::new(Vec::new()),
        })
    }

    fn accept_with(&self, external_request_id: &str) {
        *self.submit_response.lock().unwrap() = Some(Ok(Submission {
            external_request_id: external_request_id.to_string(),
        }));
    }

    fn reject_with(&self, status: u16, message: &str) {
        *self.submit_response.lock().unwrap() = Some(Err(ProviderError::Rejected {
            status,
            message: message.to_string(),
        }));
    }

    fn push_status(&self, status: Result<ProviderJobStatus, ProviderError>) {
        self.statuses.lock().unwrap().push_back(status);
    }

    fn push_state(&self, state: ProviderJobState, result_ref: Option<&str>) {
        self.push_status(Ok(ProviderJobStatus {
            state,
            result_ref: result_ref.map(str::to_string),
            failure_reason: None,
        }));
    }

    fn submitted_requests(&self) -> Vec<GenerationRequest> {
        self.submitted.lock().unwrap().clone()
    }
}

#[async_trait]
impl Provider for FakeProvider {
    fn id(&self) -> ProviderId {
        self.id
    }

    async fn submit(&self, request: &GenerationRequest) -> Result<Submission, ProviderError> {
        self.submitted.lock().unwrap().push(request.clone());
        self.submit_response
            .lock()
            .unwrap()
            .take()
            .unwrap_or_else(|| {
                Ok(Submission {
                    external_request_id: "req-default".to_string(),
                })
            })
    }

    async fn fetch_status(&self, _: &str) -> Result<ProviderJobStatus, ProviderError> {
        // An exhausted script means the provider never finishes.
        self.statuses.lock().unwrap().pop_front().unwrap_or_else(|| {
            Ok(ProviderJobStatus {
                state: ProviderJobState::Queued,
                result_ref: None,
                failure_reason: None,
            })
        })
    }
}

// ---------------------------------------------------------------------------
// Test environment
// ---------------------------------------------------------------------------

struct Env {
    store: Arc<MemoryStore>,
    image: Arc<FakeProvider>,
    video: Arc<FakeProvider>,
    text: Arc<FakeProvider>,
    events: broadcast::Receiver<RowChangeEvent>,
    orchestrator: Arc<GenerationOrchestrator>,
}

fn env() -> Env {
    env_with_attempts(5)
}

fn env_with_attempts(max_attempts: u32) -> Env {
    let store = Arc::new(MemoryStore::default());
    let bus = Arc::new(EventBus::default());
    let events = bus.subscribe();
    let image = FakeProvider::new(ProviderId::Flux);
    let video = FakeProvider::new(ProviderId::Luma);
    let text = FakeProvider::new(ProviderId::Scribe);
    let providers = Arc::new(ProviderSet::new(
        image.clone(),
        video.clone(),
        text.clone(),
    ));
    let orchestrator = Arc::new(
        GenerationOrchestrator::new(store.clone(), providers, bus).with_poll_config(PollConfig {
            interval: Duration::ZERO,
            max_attempts,
        }),
    );
    Env {
        store,
        image,
        video,
        text,
        events,
        orchestrator,
    }
}

fn shot(id: DbId, image_prompt: Option<&str>) -> Shot {
    let now = Utc::now();
    Shot {
        id,
        scene_id: 1,
        position: 0,
        image_prompt: image_prompt.map(str::to_string),
        image_status_id: None,
        image_url: None,
        image_request_id: None,
        video_prompt: None,
        video_status_id: None,
        video_url: None,
        video_request_id: None,
        created_at: now,
        updated_at: now,
    }
}

fn scene(id: DbId, summary: Option<&str>) -> Scene {
    let now = Utc::now();
    Scene {
        id,
        project_id: 1,
        title: "Opening".to_string(),
        summary: summary.map(str::to_string),
        position: 0,
        description: None,
        description_status_id: None,
        description_request_id: None,
        created_at: now,
        updated_at: now,
    }
}

/// Drain the pending change events and return the image status id each
/// carried.
fn drain_image_statuses(rx: &mut broadcast::Receiver<RowChangeEvent>) -> Vec<i64> {
    let mut statuses = Vec::new();
    while let Ok(event) = rx.try_recv() {
        statuses.push(event.row["image_status_id"].as_i64().unwrap_or(-1));
    }
    statuses
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[tokio::test]
async fn image_generation_completes_end_to_end() {
    let mut env = env();
    env.store.insert_shot(shot(1, Some("red bicycle on a beach")));
    env.image.accept_with("abc123");
    env.image.push_state(ProviderJobState::Generating, None);
    env.image.push_state(ProviderJobState::Generating, None);
    env.image
        .push_state(ProviderJobState::Completed, Some("https://cdn/x.png"));

    let job = env
        .orchestrator
        .start_generation(GenerationTarget::ShotImage(1), GenerationOptions::default())
        .await
        .unwrap();
    assert_eq!(job.external_request_id.as_deref(), Some("abc123"));

    let applied = env
        .orchestrator
        .poll_until_terminal(GenerationTarget::ShotImage(1), "abc123")
        .await
        .unwrap();
    assert_eq!(applied, Applied::JobAndEntity);

    let shot = env.store.shot(1);
    assert_eq!(shot.image_status_id, Some(GenerationStatus::Completed.id()));
    assert_eq!(shot.image_url.as_deref(), Some("https://cdn/x.png"));
    assert_eq!(shot.image_request_id.as_deref(), Some("abc123"));

    let job = env.store.job(job.id);
    assert_eq!(job.status_id, GenerationStatus::Completed.id());
    assert!(invariant_holds(
        true,
        false,
        job.result_ref.as_deref(),
        job.failure_reason.as_deref(),
    ));

    // Submitted (optimistic), Submitted (with request id), Generating
    // (first observation only), Completed.
    let statuses = drain_image_statuses(&mut env.events);
    assert_eq!(
        statuses,
        vec![
            GenerationStatus::Submitted.id() as i64,
            GenerationStatus::Submitted.id() as i64,
            GenerationStatus::Generating.id() as i64,
            GenerationStatus::Completed.id() as i64,
        ],
    );

    let requests = env.image.submitted_requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].prompt, "red bicycle on a beach");
}

#[tokio::test]
async fn missing_prompt_blocks_the_trigger() {
    let mut env = env();
    env.store.insert_shot(shot(1, None));

    let err = env
        .orchestrator
        .start_generation(GenerationTarget::ShotImage(1), GenerationOptions::default())
        .await
        .unwrap_err();
    assert_matches!(err, PipelineError::Core(CoreError::Precondition(_)));

    // Nothing was written or published.
    assert_eq!(env.store.job_count(), 0);
    assert!(env.events.try_recv().is_err());
    assert!(env.image.submitted_requests().is_empty());
}

#[tokio::test]
async fn video_requires_a_completed_image() {
    let env = env();
    let mut s = shot(1, Some("red bicycle"));
    s.video_prompt = Some("slow pan left".to_string());
    env.store.insert_shot(s);

    let err = env
        .orchestrator
        .start_generation(GenerationTarget::ShotVideo(1), GenerationOptions::default())
        .await
        .unwrap_err();
    assert_matches!(err, PipelineError::Core(CoreError::Precondition(_)));
    assert!(env.video.submitted_requests().is_empty());
}

#[tokio::test]
async fn video_submission_carries_the_completed_image() {
    let env = env();
    let mut s = shot(1, Some("red bicycle"));
    s.image_status_id = Some(GenerationStatus::Completed.id());
    s.image_url = Some("https://cdn/x.png".to_string());
    s.video_prompt = Some("slow pan left".to_string());
    env.store.insert_shot(s);
    env.video.accept_with("luma-1");

    env.orchestrator
        .start_generation(GenerationTarget::ShotVideo(1), GenerationOptions::default())
        .await
        .unwrap();

    let requests = env.video.submitted_requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].prompt, "slow pan left");
    assert_eq!(requests[0].reference_url.as_deref(), Some("https://cdn/x.png"));
}

#[tokio::test]
async fn rejected_submission_fails_the_job_and_entity() {
    let env = env();
    env.store.insert_shot(shot(1, Some("red bicycle")));
    env.image.reject_with(422, "prompt violates content policy");

    let err = env
        .orchestrator
        .start_generation(GenerationTarget::ShotImage(1), GenerationOptions::default())
        .await
        .unwrap_err();
    assert_matches!(
        err,
        PipelineError::Provider(ProviderError::Rejected { status: 422, .. })
    );

    let shot = env.store.shot(1);
    assert_eq!(shot.image_status_id, Some(GenerationStatus::Failed.id()));
    assert!(shot.image_request_id.is_none());

    let job = env.store.job(1);
    assert_eq!(job.status_id, GenerationStatus::Failed.id());
    assert!(job
        .failure_reason
        .as_deref()
        .unwrap()
        .contains("content policy"));
}

#[tokio::test]
async fn duplicate_terminal_delivery_is_ignored() {
    let mut env = env();
    env.store.insert_shot(shot(1, Some("red bicycle")));
    env.image.accept_with("abc123");
    env.image
        .push_state(ProviderJobState::Completed, Some("https://cdn/x.png"));

    env.orchestrator
        .start_generation(GenerationTarget::ShotImage(1), GenerationOptions::default())
        .await
        .unwrap();
    env.orchestrator
        .poll_until_terminal(GenerationTarget::ShotImage(1), "abc123")
        .await
        .unwrap();
    let before = drain_image_statuses(&mut env.events).len();

    // The webhook delivers the same completion again.
    let applied = env
        .orchestrator
        .apply_terminal("abc123", TerminalOutcome::completed("https://cdn/x.png"))
        .await
        .unwrap();
    assert_eq!(applied, Applied::Ignored);
    assert!(env.events.try_recv().is_err());
    assert!(before > 0);
}

#[tokio::test]
async fn superseded_job_updates_history_only() {
    let mut env = env();
    // The entity has moved on to a newer request.
    let mut s = shot(1, Some("red bicycle"));
    s.image_status_id = Some(GenerationStatus::Submitted.id());
    s.image_request_id = Some("req-2".to_string());
    env.store.insert_shot(s);

    let now = Utc::now();
    env.store.insert_job(Generation {
        id: 10,
        owner_entity_type: "shot".to_string(),
        owner_entity_id: 1,
        kind: "image".to_string(),
        provider: "flux".to_string(),
        external_request_id: Some("req-1".to_string()),
        status_id: GenerationStatus::Submitted.id(),
        result_ref: None,
        failure_reason: None,
        created_at: now,
        updated_at: now,
    });

    let applied = env
        .orchestrator
        .apply_terminal("req-1", TerminalOutcome::completed("https://cdn/old.png"))
        .await
        .unwrap();
    assert_eq!(applied, Applied::JobOnly);

    // The job row keeps its history; the entity still tracks req-2.
    let job = env.store.job(10);
    assert_eq!(job.status_id, GenerationStatus::Completed.id());
    assert_eq!(job.result_ref.as_deref(), Some("https://cdn/old.png"));

    let shot = env.store.shot(1);
    assert_eq!(shot.image_request_id.as_deref(), Some("req-2"));
    assert!(shot.image_url.is_none());
    assert!(env.events.try_recv().is_err());
}

#[tokio::test]
async fn timeout_is_upgraded_by_a_late_webhook_completion() {
    let env = env_with_attempts(3);
    env.store.insert_shot(shot(1, Some("red bicycle")));
    env.image.accept_with("slow-1");
    // No scripted statuses: every poll sees Queued until the budget runs
    // out.

    let job = env
        .orchestrator
        .start_generation(GenerationTarget::ShotImage(1), GenerationOptions::default())
        .await
        .unwrap();
    let applied = env
        .orchestrator
        .poll_until_terminal(GenerationTarget::ShotImage(1), "slow-1")
        .await
        .unwrap();
    assert_eq!(applied, Applied::JobAndEntity);

    let timed_out = env.store.job(job.id);
    assert_eq!(timed_out.status_id, GenerationStatus::Failed.id());
    assert_eq!(timed_out.failure_reason.as_deref(), Some(TIMEOUT_REASON));
    assert_eq!(
        env.store.shot(1).image_status_id,
        Some(GenerationStatus::Failed.id()),
    );

    // The provider finished after we gave up; the webhook wins.
    let applied = env
        .orchestrator
        .apply_terminal("slow-1", TerminalOutcome::completed("https://cdn/late.png"))
        .await
        .unwrap();
    assert_eq!(applied, Applied::JobAndEntity);

    let upgraded = env.store.job(job.id);
    assert_eq!(upgraded.status_id, GenerationStatus::Completed.id());
    assert_eq!(upgraded.result_ref.as_deref(), Some("https://cdn/late.png"));
    assert!(upgraded.failure_reason.is_none());

    let shot = env.store.shot(1);
    assert_eq!(shot.image_status_id, Some(GenerationStatus::Completed.id()));
    assert_eq!(shot.image_url.as_deref(), Some("https://cdn/late.png"));
}

#[tokio::test]
async fn provider_failure_is_not_upgraded() {
    let env = env();
    env.store.insert_shot(shot(1, Some("red bicycle")));
    env.image.accept_with("abc123");
    env.image
        .push_status(Ok(ProviderJobStatus {
            state: ProviderJobState::Failed,
            result_ref: None,
            failure_reason: Some("nsfw content detected".to_string()),
        }));

    let job = env
        .orchestrator
        .start_generation(GenerationTarget::ShotImage(1), GenerationOptions::default())
        .await
        .unwrap();
    env.orchestrator
        .poll_until_terminal(GenerationTarget::ShotImage(1), "abc123")
        .await
        .unwrap();

    let applied = env
        .orchestrator
        .apply_terminal("abc123", TerminalOutcome::completed("https://cdn/x.png"))
        .await
        .unwrap();
    assert_eq!(applied, Applied::Ignored);

    let job = env.store.job(job.id);
    assert_eq!(job.status_id, GenerationStatus::Failed.id());
    assert_eq!(job.failure_reason.as_deref(), Some("nsfw content detected"));
}

#[tokio::test]
async fn transient_poll_failures_consume_attempts_then_recover() {
    let env = env();
    env.store.insert_shot(shot(1, Some("red bicycle")));
    env.image.accept_with("abc123");
    env.image
        .push_status(Err(ProviderError::Unavailable("connection reset".to_string())));
    env.image
        .push_state(ProviderJobState::Completed, Some("https://cdn/x.png"));

    env.orchestrator
        .start_generation(GenerationTarget::ShotImage(1), GenerationOptions::default())
        .await
        .unwrap();
    let applied = env
        .orchestrator
        .poll_until_terminal(GenerationTarget::ShotImage(1), "abc123")
        .await
        .unwrap();
    assert_eq!(applied, Applied::JobAndEntity);
    assert_eq!(
        env.store.shot(1).image_url.as_deref(),
        Some("https://cdn/x.png"),
    );
}

#[tokio::test]
async fn rejection_during_polling_settles_the_job_as_a_provider_failure() {
    let env = env_with_attempts(3);
    env.store.insert_shot(shot(1, Some("red bicycle")));
    env.image.accept_with("abc123");
    env.image.push_status(Err(ProviderError::Rejected {
        status: 404,
        message: "request id not found".to_string(),
    }));

    let job = env
        .orchestrator
        .start_generation(GenerationTarget::ShotImage(1), GenerationOptions::default())
        .await
        .unwrap();
    let applied = env
        .orchestrator
        .poll_until_terminal(GenerationTarget::ShotImage(1), "abc123")
        .await
        .unwrap();
    assert_eq!(applied, Applied::JobAndEntity);

    // Settled on the first poll, not ground down to a timeout.
    let job = env.store.job(job.id);
    assert_eq!(job.status_id, GenerationStatus::Failed.id());
    let reason = job.failure_reason.as_deref().unwrap();
    assert_ne!(reason, TIMEOUT_REASON);
    assert!(reason.contains("request id not found"));
    assert_eq!(
        env.store.shot(1).image_status_id,
        Some(GenerationStatus::Failed.id()),
    );

    // Unlike a timeout, a provider failure is never upgraded later.
    let applied = env
        .orchestrator
        .apply_terminal("abc123", TerminalOutcome::completed("https://cdn/x.png"))
        .await
        .unwrap();
    assert_eq!(applied, Applied::Ignored);
}

#[tokio::test]
async fn unknown_request_id_is_rejected() {
    let env = env();
    let err = env
        .orchestrator
        .apply_terminal("ghost-1", TerminalOutcome::completed("https://cdn/x.png"))
        .await
        .unwrap_err();
    assert_matches!(err, PipelineError::UnknownJob(id) if id == "ghost-1");
}

#[tokio::test]
async fn scene_description_lands_in_the_description_column() {
    let env = env();
    env.store
        .insert_scene(scene(3, Some("The heist goes wrong at the docks")));
    env.text.accept_with("scribe-9");
    env.text.push_state(
        ProviderJobState::Completed,
        Some("Under sodium lights, the crew scatters as the alarm sounds."),
    );

    env.orchestrator
        .start_generation(
            GenerationTarget::SceneDescription(3),
            GenerationOptions::default(),
        )
        .await
        .unwrap();
    env.orchestrator
        .poll_until_terminal(GenerationTarget::SceneDescription(3), "scribe-9")
        .await
        .unwrap();

    let scene = env.store.scene(3);
    assert_eq!(
        scene.description_status_id,
        Some(GenerationStatus::Completed.id()),
    );
    assert_eq!(
        scene.description.as_deref(),
        Some("Under sodium lights, the crew scatters as the alarm sounds."),
    );
    // The user's summary is untouched.
    assert_eq!(
        scene.summary.as_deref(),
        Some("The heist goes wrong at the docks"),
    );
}

#[tokio::test]
async fn completion_without_a_result_is_recorded_as_failure() {
    let env = env();
    env.store.insert_shot(shot(1, Some("red bicycle")));
    env.image.accept_with("abc123");
    env.image.push_state(ProviderJobState::Completed, None);

    let job = env
        .orchestrator
        .start_generation(GenerationTarget::ShotImage(1), GenerationOptions::default())
        .await
        .unwrap();
    env.orchestrator
        .poll_until_terminal(GenerationTarget::ShotImage(1), "abc123")
        .await
        .unwrap();

    let job = env.store.job(job.id);
    assert_eq!(job.status_id, GenerationStatus::Failed.id());
    assert!(job.result_ref.is_none());
    assert!(job.failure_reason.is_some());
}
