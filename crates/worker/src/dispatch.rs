//! Synchronous acceptance of invitation requests.

use std::sync::Arc;

use invite_core::config_store::ConfigStore;
use invite_core::form::{validate_form, InvitationForm};
use invite_core::preset::validate_preset;
use serde::Serialize;

use crate::error::DispatchError;
use crate::job::JobState;
use crate::queue::JobQueue;

/// Response body of an accepted request. It is fixed: later job failures
/// never reach the submitter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Accepted {
    pub result: &'static str,
}

impl Accepted {
    pub const SUCCESS: Accepted = Accepted { result: "success" };
}

/// Checks a request against the current config and queues it.
pub struct Dispatcher {
    store: Arc<ConfigStore>,
    queue: Arc<dyn JobQueue>,
}

impl Dispatcher {
    pub fn new(store: Arc<ConfigStore>, queue: Arc<dyn JobQueue>) -> Self {
        Self { store, queue }
    }

    pub fn queue(&self) -> &Arc<dyn JobQueue> {
        &self.queue
    }

    /// Validate the form and its preset, then enqueue.
    ///
    /// Errors here are the only ones the submitter ever sees. The job is
    /// queued only after every check passes.
    pub async fn submit(&self, form: InvitationForm) -> Result<Accepted, DispatchError> {
        validate_form(&form)?;

        let snapshot = self.store.snapshot().await?;
        let preset = snapshot.preset(&form.preset)?;
        validate_preset(preset)?;

        let state = JobState::Submitted;
        tracing::debug!(preset = %form.preset, state = %state, "Invitation request validated");

        let payload = serde_json::to_value(&form)?;
        self.queue.push(payload).await?;
        let state = state.advance(JobState::Queued);

        tracing::info!(
            preset = %form.preset,
            email = %form.email,
            state = %state,
            "Invitation job queued",
        );
        Ok(Accepted::SUCCESS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use invite_core::error::CoreError;
    use serde_json::json;

    use crate::queue::MemoryQueue;

    const CONFIG: &str = r##"{
        "city2phone": {"Moscow": "+7 000"},
        "city2email": {"Moscow": "m@example.com"},
        "city2vk": {"Moscow": "vk.com/m"},
        "presets": [
            {"name": "wedding", "template": "wedding.png", "texts": [
                {"type": "date", "x": 10, "y": 10, "font": "a.ttf", "size": 20, "color": "#000"},
                {"type": "time", "x": 10, "y": 40, "font": "a.ttf", "size": 20, "color": "#000"},
                {"type": "address", "x": 10, "y": 70, "font": "a.ttf", "size": 20, "color": "#000"}
            ]},
            {"name": "broken", "template": "b.png", "texts": [
                {"type": "date", "x": 10, "y": 10, "font": "a.ttf", "size": 20, "color": "#000"}
            ]}
        ]
    }"##;

    fn setup() -> (tempfile::TempDir, Dispatcher, Arc<MemoryQueue>) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, CONFIG).unwrap();
        let queue = Arc::new(MemoryQueue::new());
        let dispatcher = Dispatcher::new(Arc::new(ConfigStore::new(path)), queue.clone());
        (dir, dispatcher, queue)
    }

    fn form(preset: &str) -> InvitationForm {
        serde_json::from_value(json!({
            "type": preset,
            "date": "12.06",
            "time": "18:00",
            "address": "Main st. 1",
            "email": "guest@example.com",
            "city": "Moscow"
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn accepted_request_is_queued() {
        let (_dir, dispatcher, queue) = setup();

        let accepted = dispatcher.submit(form("wedding")).await.unwrap();
        assert_eq!(serde_json::to_value(&accepted).unwrap(), json!({"result": "success"}));

        let payload = queue.pop().await.unwrap().expect("job queued");
        assert_eq!(payload["type"], "wedding");
        assert_eq!(payload["city"], "Moscow");
    }

    #[tokio::test]
    async fn unknown_preset_is_rejected_and_not_queued() {
        let (_dir, dispatcher, queue) = setup();

        let err = dispatcher.submit(form("birthday")).await.unwrap_err();
        assert_matches!(
            err,
            DispatchError::Core(CoreError::NotFound { entity: "Preset", ref name }) if name == "birthday"
        );
        assert!(queue.pop().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn invalid_preset_is_rejected_synchronously() {
        let (_dir, dispatcher, queue) = setup();

        let err = dispatcher.submit(form("broken")).await.unwrap_err();
        assert_matches!(err, DispatchError::Core(CoreError::Validation(ref msg)) if msg.contains("missing text types"));
        assert!(queue.pop().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn empty_fields_are_rejected() {
        let (_dir, dispatcher, queue) = setup();
        let mut f = form("wedding");
        f.address = "  ".into();

        let err = dispatcher.submit(f).await.unwrap_err();
        assert_matches!(err, DispatchError::Core(CoreError::Validation(ref msg)) if msg.contains("address"));
        assert!(queue.pop().await.unwrap().is_none());
    }
}
