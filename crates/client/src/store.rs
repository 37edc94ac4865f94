//! Editor-side state container.
//!
//! [`EditorStore`] holds the rows the active view renders plus the
//! optimistic markers for generations this client triggered itself. It is
//! explicitly constructed and owned by the view, with a [`reset`](EditorStore::reset)
//! teardown on navigation, never a process-wide singleton.
//!
//! The convergence rule: a remote row image is applied verbatim unless
//! this client has an unconfirmed or still-running generation on that
//! row whose request id the incoming image does not carry. Such images
//! are stale relative to our own optimistic edit and are dropped; once
//! the server row catches up to our request id, updates flow again and
//! the marker is cleared on the terminal one.

use std::collections::HashMap;

use storyreel_core::generation::OwnerEntityType;
use storyreel_core::target::GenerationTarget;
use storyreel_core::types::DbId;
use storyreel_db::models::status::GenerationStatus;
use storyreel_events::RowChangeEvent;

/// What [`EditorStore::apply_remote`] did with an incoming row image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Convergence {
    /// The row image was applied to local state.
    Applied,
    /// The image predates this client's own in-flight edit and was
    /// dropped.
    StaleDropped,
}

/// One in-flight generation this client triggered.
#[derive(Debug, Clone, Default)]
struct OptimisticMark {
    /// Set once the trigger response confirms the provider-assigned id.
    confirmed_request_id: Option<String>,
}

/// Explicitly-constructed local state for one editor view.
#[derive(Default)]
pub struct EditorStore {
    rows: HashMap<(OwnerEntityType, DbId), serde_json::Value>,
    pending: HashMap<GenerationTarget, OptimisticMark>,
}

impl EditorStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a row from the initial fetch.
    pub fn load_row(&mut self, entity_type: OwnerEntityType, id: DbId, row: serde_json::Value) {
        self.rows.insert((entity_type, id), row);
    }

    /// The locally-held row image, if any.
    pub fn row(&self, entity_type: OwnerEntityType, id: DbId) -> Option<&serde_json::Value> {
        self.rows.get(&(entity_type, id))
    }

    /// Record an optimistic "generating" marker the moment the user
    /// triggers a generation, before the server has confirmed anything.
    pub fn begin_generation(&mut self, target: GenerationTarget) {
        self.pending.insert(target, OptimisticMark::default());
    }

    /// Record the provider-assigned request id from the trigger response.
    /// Remote updates carrying this id are ours and converge normally.
    pub fn confirm_submission(&mut self, target: GenerationTarget, external_request_id: &str) {
        if let Some(mark) = self.pending.get_mut(&target) {
            mark.confirmed_request_id = Some(external_request_id.to_string());
        }
    }

    /// The trigger failed; drop the optimistic marker so remote state
    /// flows freely again.
    pub fn abandon_generation(&mut self, target: GenerationTarget) {
        self.pending.remove(&target);
    }

    /// Whether this client is showing a spinner for the target.
    pub fn is_generating(&self, target: GenerationTarget) -> bool {
        self.pending.contains_key(&target)
    }

    /// Converge local state with a server row image.
    pub fn apply_remote(&mut self, event: &RowChangeEvent) -> Convergence {
        let pending_on_row: Vec<GenerationTarget> = self
            .pending
            .keys()
            .filter(|t| t.entity_type() == event.entity_type && t.entity_id() == event.entity_id)
            .copied()
            .collect();

        for target in &pending_on_row {
            let prefix = state_prefix(*target);
            let remote_request_id = event.row[format!("{prefix}_request_id")].as_str();
            let ours = self.pending[target]
                .confirmed_request_id
                .as_deref()
                .is_some_and(|id| remote_request_id == Some(id));
            if !ours {
                tracing::debug!(
                    entity_type = event.entity_type.as_str(),
                    entity_id = event.entity_id,
                    "dropped row image predating local optimistic edit"
                );
                return Convergence::StaleDropped;
            }
        }

        // The image reflects our own request(s); clear markers that have
        // reached a terminal state.
        for target in pending_on_row {
            let prefix = state_prefix(target);
            let status = event.row[format!("{prefix}_status_id")]
                .as_i64()
                .and_then(|id| GenerationStatus::from_id(id as i16));
            if status.is_some_and(GenerationStatus::is_terminal) {
                self.pending.remove(&target);
            }
        }

        self.rows
            .insert((event.entity_type, event.entity_id), event.row.clone());
        Convergence::Applied
    }

    /// Teardown on navigation away: forget all rows and markers. No
    /// server-side job is cancelled.
    pub fn reset(&mut self) {
        self.rows.clear();
        self.pending.clear();
    }
}

/// The column-group prefix a target's state lives under on its row.
fn state_prefix(target: GenerationTarget) -> &'static str {
    match target {
        GenerationTarget::ShotImage(_) => "image",
        GenerationTarget::ShotVideo(_) => "video",
        GenerationTarget::CharacterPortrait(_) => "portrait",
        GenerationTarget::SceneDescription(_) => "description",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn shot_row(status_id: i16, request_id: Option<&str>, url: Option<&str>) -> serde_json::Value {
        json!({
            "id": 1,
            "image_status_id": status_id,
            "image_request_id": request_id,
            "image_url": url,
        })
    }

    fn event(row: serde_json::Value) -> RowChangeEvent {
        RowChangeEvent::new(OwnerEntityType::Shot, 1, row)
    }

    #[test]
    fn remote_updates_apply_when_nothing_is_pending() {
        let mut store = EditorStore::new();
        let row = shot_row(GenerationStatus::Completed.id(), Some("r9"), Some("https://cdn/a.png"));
        assert_eq!(store.apply_remote(&event(row.clone())), Convergence::Applied);
        assert_eq!(store.row(OwnerEntityType::Shot, 1), Some(&row));
    }

    #[test]
    fn stale_updates_are_dropped_while_an_edit_is_in_flight() {
        let mut store = EditorStore::new();
        let target = GenerationTarget::ShotImage(1);
        store.begin_generation(target);

        // A notification from before our trigger arrives out of order.
        let stale = shot_row(GenerationStatus::Completed.id(), Some("old-1"), Some("https://cdn/old.png"));
        assert_eq!(store.apply_remote(&event(stale)), Convergence::StaleDropped);
        assert!(store.row(OwnerEntityType::Shot, 1).is_none());
        assert!(store.is_generating(target));
    }

    #[test]
    fn own_terminal_update_applies_and_clears_the_spinner() {
        let mut store = EditorStore::new();
        let target = GenerationTarget::ShotImage(1);
        store.begin_generation(target);
        store.confirm_submission(target, "abc123");

        let progress = shot_row(GenerationStatus::Generating.id(), Some("abc123"), None);
        assert_eq!(store.apply_remote(&event(progress)), Convergence::Applied);
        assert!(store.is_generating(target));

        let done = shot_row(GenerationStatus::Completed.id(), Some("abc123"), Some("https://cdn/x.png"));
        assert_eq!(store.apply_remote(&event(done)), Convergence::Applied);
        assert!(!store.is_generating(target));
        let row = store.row(OwnerEntityType::Shot, 1).unwrap();
        assert_eq!(row["image_url"], "https://cdn/x.png");
    }

    #[test]
    fn abandoned_trigger_stops_guarding() {
        let mut store = EditorStore::new();
        let target = GenerationTarget::ShotImage(1);
        store.begin_generation(target);
        store.abandon_generation(target);

        let row = shot_row(GenerationStatus::Failed.id(), Some("other"), None);
        assert_eq!(store.apply_remote(&event(row)), Convergence::Applied);
    }

    #[test]
    fn updates_for_other_rows_are_untouched_by_the_guard() {
        let mut store = EditorStore::new();
        store.begin_generation(GenerationTarget::ShotImage(1));

        let other = RowChangeEvent::new(OwnerEntityType::Shot, 2, shot_row(2, None, None));
        assert_eq!(store.apply_remote(&other), Convergence::Applied);
    }

    #[test]
    fn reset_clears_rows_and_markers() {
        let mut store = EditorStore::new();
        store.load_row(OwnerEntityType::Shot, 1, json!({"id": 1}));
        store.begin_generation(GenerationTarget::ShotImage(1));

        store.reset();
        assert!(store.row(OwnerEntityType::Shot, 1).is_none());
        assert!(!store.is_generating(GenerationTarget::ShotImage(1)));
    }
}
