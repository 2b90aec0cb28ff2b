// src/controller.rs
use chrono::{DateTime, Utc};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::{watch, Mutex};
use uuid::Uuid;

use crate::client::NeuronClient;
use crate::errors::Result;
use crate::models::{EndpointPath, ExecutionResponse, NeuronCall, NeuronOutput};
use crate::store::{KeyValueStore, AUTH_TOKEN_KEY, NEURON_PATH_KEY};

pub const LOADING_MESSAGE: &str = "Loading...";
pub const STOPPED_MESSAGE: &str = "Execution was stopped before any output was produced.";
pub const IDLE_MESSAGE: &str = "Output will appear here after running the prompt.";

/// What the output pane shows.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum OutputView {
    Loading { message: &'static str },
    Output { text: String, cached: bool },
    Stopped { message: &'static str },
    Idle { message: &'static str },
}

/// Snapshot of the sandbox session, as served to the page.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct SandboxView {
    pub neuron_path: String,
    pub auth_token: String,
    pub input: String,
    pub bypass_cache: bool,
    pub is_loading: bool,
    pub answer_is_cached: bool,
    pub execution_stopped: bool,
    pub output: OutputView,
    /// Bookmarkable page URL carrying the neuron path.
    pub share_url: Option<String>,
    pub last_run_id: Option<Uuid>,
    pub settled_at: Option<DateTime<Utc>>,
}

/// Form fields to change; `None` leaves a field alone.
#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
pub struct FormUpdate {
    pub neuron_path: Option<String>,
    pub auth_token: Option<String>,
    pub input: Option<String>,
    pub bypass_cache: Option<bool>,
}

/// Result of a Run request.
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    /// The run finished (successfully or not); the view is the settled state.
    Settled(SandboxView),
    /// Another run was in flight; nothing was started.
    AlreadyRunning(SandboxView),
}

impl RunOutcome {
    pub fn view(&self) -> &SandboxView {
        match self {
            RunOutcome::Settled(view) | RunOutcome::AlreadyRunning(view) => view,
        }
    }
}

#[derive(Debug, Default)]
struct SessionState {
    neuron_path: String,
    auth_token: String,
    input: String,
    bypass_cache: bool,
    is_loading: bool,
    output: Option<NeuronOutput>,
    answer_is_cached: bool,
    execution_stopped: bool,
    last_run_id: Option<Uuid>,
    settled_at: Option<DateTime<Utc>>,
}

/// Owns the sandbox form state and runs neurons on request.
///
/// State is only touched under `state`'s lock. Store writes happen under it,
/// the network call does not. At most one run is in flight at a time.
pub struct SandboxController<C> {
    store: Arc<dyn KeyValueStore>,
    client: C,
    public_url: Url,
    state: Mutex<SessionState>,
    updates: watch::Sender<SandboxView>,
}

impl<C: NeuronClient> SandboxController<C> {
    /// `public_url` is the page address used to build share links.
    pub fn new(store: Arc<dyn KeyValueStore>, client: C, public_url: Url) -> Self {
        let state = SessionState::default();
        let initial = render(&state, &public_url);
        let (updates, _) = watch::channel(initial);
        Self {
            store,
            client,
            public_url,
            state: Mutex::new(state),
            updates,
        }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    /// Receives every view published after a state change.
    pub fn subscribe(&self) -> watch::Receiver<SandboxView> {
        self.updates.subscribe()
    }

    pub async fn view(&self) -> SandboxView {
        let state = self.state.lock().await;
        render(&state, &self.public_url)
    }

    /// Page-load initialization: rehydrates the persisted fields.
    ///
    /// A non-empty `neuron_param` wins over the stored path and is written back.
    pub async fn load_session(&self, neuron_param: Option<&str>) -> Result<SandboxView> {
        let mut state = self.state.lock().await;
        let neuron_path = match neuron_param.filter(|p| !p.is_empty()) {
            Some(param) => {
                self.store.set(NEURON_PATH_KEY, param).await?;
                Some(param.to_string())
            }
            None => self.store.get(NEURON_PATH_KEY).await?,
        };
        let auth_token = self.store.get(AUTH_TOKEN_KEY).await?;

        state.neuron_path = neuron_path.unwrap_or_default();
        state.auth_token = auth_token.unwrap_or_default();
        log::debug!("Session loaded for neuron path '{}'", state.neuron_path);
        Ok(self.publish(&state))
    }

    /// Applies a partial form update under one lock.
    pub async fn update(&self, update: &FormUpdate) -> Result<SandboxView> {
        let mut state = self.state.lock().await;
        let applied = self.apply(&mut state, update).await;
        let view = self.publish(&state);
        applied.map(|_| view)
    }

    pub async fn set_endpoint_path(&self, path: &str) -> Result<SandboxView> {
        self.update(&FormUpdate {
            neuron_path: Some(path.to_string()),
            ..Default::default()
        })
        .await
    }

    pub async fn set_credential(&self, token: &str) -> Result<SandboxView> {
        self.update(&FormUpdate {
            auth_token: Some(token.to_string()),
            ..Default::default()
        })
        .await
    }

    pub async fn set_input(&self, input: &str) -> SandboxView {
        let mut state = self.state.lock().await;
        state.input = input.to_string();
        self.publish(&state)
    }

    pub async fn set_bypass_cache(&self, bypass_cache: bool) -> SandboxView {
        let mut state = self.state.lock().await;
        state.bypass_cache = bypass_cache;
        self.publish(&state)
    }

    /// Runs the current neuron with the current input.
    ///
    /// Every failure ends up as text in the output; nothing is returned as an error.
    pub async fn run(&self) -> RunOutcome {
        self.run_with(&FormUpdate::default()).await
    }

    /// Applies `update` and runs, unless a run is already in flight, in which
    /// case neither happens.
    pub async fn run_with(&self, update: &FormUpdate) -> RunOutcome {
        let (run_id, neuron_path, call_input, bypass_cache, auth_token) = {
            let mut state = self.state.lock().await;
            if state.is_loading {
                log::debug!("Run ignored: a run is already in flight");
                return RunOutcome::AlreadyRunning(render(&state, &self.public_url));
            }
            if let Err(e) = self.apply(&mut state, update).await {
                log::warn!("❌ Run not started, form update failed: {}", e);
                state.output = Some(NeuronOutput::Text(e.display_error()));
                state.answer_is_cached = false;
                state.execution_stopped = false;
                state.settled_at = Some(Utc::now());
                return RunOutcome::Settled(self.publish(&state));
            }
            let run_id = Uuid::new_v4();
            state.is_loading = true;
            state.output = None;
            state.answer_is_cached = false;
            state.execution_stopped = false;
            state.last_run_id = Some(run_id);
            self.publish(&state);
            (
                run_id,
                state.neuron_path.clone(),
                state.input.clone(),
                state.bypass_cache,
                state.auth_token.clone(),
            )
        };

        log::info!("🎯 Run {} started for '{}'", run_id, neuron_path);

        let result = self
            .execute(&neuron_path, call_input, bypass_cache, auth_token)
            .await;

        let mut state = self.state.lock().await;
        match result {
            Ok(response) => {
                log::info!(
                    "✅ Run {} succeeded (cached={}, stopped={})",
                    run_id,
                    response.from_cache,
                    response.execution_stopped
                );
                state.output = Some(response.output.unwrap_or_default());
                state.answer_is_cached = response.from_cache;
                state.execution_stopped = response.execution_stopped;
            }
            Err(e) => {
                log::warn!("❌ Run {} failed: {}", run_id, e);
                state.output = Some(NeuronOutput::Text(e.display_error()));
            }
        }
        state.is_loading = false;
        state.settled_at = Some(Utc::now());
        RunOutcome::Settled(self.publish(&state))
    }

    async fn execute(
        &self,
        neuron_path: &str,
        input: String,
        bypass_cache: bool,
        auth_token: String,
    ) -> Result<ExecutionResponse> {
        let path = EndpointPath::parse(neuron_path)?;
        let call = NeuronCall {
            path,
            input,
            bypass_cache,
            credential: Some(auth_token).filter(|token| !token.is_empty()),
        };
        self.client.execute(&call).await
    }

    /// Persisted fields are written to the store before they change in memory,
    /// and the caller holds the state lock throughout.
    async fn apply(&self, state: &mut SessionState, update: &FormUpdate) -> Result<()> {
        if let Some(path) = &update.neuron_path {
            self.store.set(NEURON_PATH_KEY, path).await?;
            state.neuron_path = path.clone();
        }
        if let Some(token) = &update.auth_token {
            self.store.set(AUTH_TOKEN_KEY, token).await?;
            state.auth_token = token.clone();
        }
        if let Some(input) = &update.input {
            state.input = input.clone();
        }
        if let Some(bypass_cache) = update.bypass_cache {
            state.bypass_cache = bypass_cache;
        }
        Ok(())
    }

    fn publish(&self, state: &SessionState) -> SandboxView {
        let view = render(state, &self.public_url);
        self.updates.send_replace(view.clone());
        view
    }
}

fn render(state: &SessionState, public_url: &Url) -> SandboxView {
    let output = match &state.output {
        _ if state.is_loading => OutputView::Loading {
            message: LOADING_MESSAGE,
        },
        Some(output) if !output.is_empty() => OutputView::Output {
            text: output.render(),
            cached: state.answer_is_cached,
        },
        _ if state.execution_stopped => OutputView::Stopped {
            message: STOPPED_MESSAGE,
        },
        _ => OutputView::Idle {
            message: IDLE_MESSAGE,
        },
    };

    SandboxView {
        neuron_path: state.neuron_path.clone(),
        auth_token: state.auth_token.clone(),
        input: state.input.clone(),
        bypass_cache: state.bypass_cache,
        is_loading: state.is_loading,
        answer_is_cached: state.answer_is_cached,
        execution_stopped: state.execution_stopped,
        output,
        share_url: share_url(public_url, &state.neuron_path),
        last_run_id: state.last_run_id,
        settled_at: state.settled_at,
    }
}

fn share_url(public_url: &Url, neuron_path: &str) -> Option<String> {
    if neuron_path.is_empty() {
        return None;
    }
    let mut url = public_url.clone();
    url.query_pairs_mut().clear().append_pair("neuron", neuron_path);
    Some(url.to_string())
}
