/// Asynchronous actions
///
/// Long-running operations (creating a server, attaching a volume, ...) are
/// accepted by the API immediately and tracked through an action. The action
/// can be polled until it reaches a target status.
use chrono::{DateTime, Utc};
use reqwest::{Method, StatusCode};
use tracing::{debug, warn};

use super::models::{ActionErrorDetail, ActionResource, ActionStatus, ActionWire, Hydrate, ResourceIter};
use super::transport::Transport;
use crate::error::{Error, Result};
use crate::utils::polling::Poller;

/// Handle to a provider-side asynchronous operation
#[derive(Debug, Clone)]
pub struct Action {
    transport: Transport,
    pub id: u64,
    pub command: String,
    pub status: ActionStatus,
    pub progress: u32,
    pub started: DateTime<Utc>,
    pub finished: Option<DateTime<Utc>>,
    pub error: Option<ActionErrorDetail>,
    pub resources: Vec<ActionResource>,
}

impl Hydrate for Action {
    type Wire = ActionWire;

    fn hydrate(transport: &Transport, wire: ActionWire) -> Self {
        if wire.status == ActionStatus::Unknown {
            warn!("Action {} has an unrecognised status", wire.id);
        }
        Self {
            transport: transport.clone(),
            id: wire.id,
            command: wire.command,
            status: wire.status,
            progress: wire.progress,
            started: wire.started,
            finished: wire.finished,
            error: wire.error,
            resources: wire.resources,
        }
    }
}

impl Action {
    /// Hydrate the action embedded under `key` in a mutation response
    pub(crate) fn from_response(
        transport: &Transport,
        body: &mut serde_json::Value,
        key: &str,
    ) -> Result<Self> {
        let value = body.get_mut(key).map(serde_json::Value::take).unwrap_or_default();
        if value.is_null() {
            return Err(Error::action(None, body.clone()));
        }
        let wire: ActionWire = serde_json::from_value(value)?;
        Ok(Self::hydrate(transport, wire))
    }

    /// Wait until the action reaches `status`, with the default poller
    pub async fn wait_until_status_is(&mut self, status: ActionStatus) -> Result<()> {
        self.wait_until_status_is_with(status, &Poller::default())
            .await
    }

    /// Wait until the action reaches `status`.
    ///
    /// Fails immediately with [`Error::Action`] if the action ends in an error
    /// state that is not the target.
    pub async fn wait_until_status_is_with(
        &mut self,
        status: ActionStatus,
        poller: &Poller,
    ) -> Result<()> {
        if self.status == status {
            return Ok(());
        }

        let transport = self.transport.clone();
        let id = self.id;
        let target = &status;
        let wire = poller
            .poll(|| {
                let transport = transport.clone();
                async move {
                    let wire = fetch_action(&transport, id).await?;
                    debug!("Action {} is {} ({}%)", id, wire.status, wire.progress);
                    if wire.status == *target || wire.status == ActionStatus::Error {
                        Ok::<_, Error>(Some(wire))
                    } else {
                        Ok(None)
                    }
                }
            })
            .await?;

        self.status = wire.status;
        self.progress = wire.progress;
        self.finished = wire.finished;
        self.error = wire.error;

        if self.status != status {
            let payload = serde_json::to_value(&self.error)?;
            return Err(Error::action(None, payload));
        }

        Ok(())
    }
}

/// POST to an `…/actions/<command>` endpoint and hydrate the returned action.
///
/// The full response body is handed back as well, for endpoints that return
/// more than the action (root passwords, images).
pub(crate) async fn perform(
    transport: &Transport,
    endpoint: &str,
    body: Option<&serde_json::Value>,
) -> Result<(serde_json::Value, Action)> {
    let mut response = transport
        .expect(Method::POST, endpoint, body, StatusCode::CREATED)
        .await?;
    let action = Action::from_response(transport, &mut response, "action")?;
    Ok((response, action))
}

async fn fetch_action(transport: &Transport, id: u64) -> Result<ActionWire> {
    let value = transport
        .fetch_json(&format!("actions/{}", id), "action", "action", id)
        .await?;
    Ok(serde_json::from_value(value)?)
}

/// Action manager for looking up Hetzner Cloud actions
#[derive(Debug, Clone)]
pub struct ActionManager {
    transport: Transport,
}

impl ActionManager {
    pub(crate) fn new(transport: Transport) -> Self {
        Self { transport }
    }

    /// Get an action by ID
    pub async fn get(&self, id: u64) -> Result<Action> {
        self.transport
            .fetch_one(&format!("actions/{}", id), "action", "action", id)
            .await
    }

    /// List all actions, optionally filtered by status
    pub async fn get_all(&self, status: Option<ActionStatus>) -> Result<ResourceIter<Action>> {
        let query: Vec<(&str, String)> = status
            .map(|s| vec![("status", s.as_str().to_string())])
            .unwrap_or_default();
        self.transport.list("actions", "actions", &query).await
    }
}
