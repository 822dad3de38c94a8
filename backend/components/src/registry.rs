//! Interactive component callbacks (buttons, selects, modals).
//!
//! Components are keyed by a generated opaque id and expire after a period
//! of inactivity. Every successful dispatch pushes the deadline back.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use patto_core::{Responder, Snowflake, UserRef};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::Mutex;
use tokio::time::{Instant, sleep_until};
use tracing::{debug, info};
use uuid::Uuid;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(20);

const ID_SUFFIX_LEN: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentKind {
    Button,
    Select,
    Modal,
}

impl ComponentKind {
    pub fn id_prefix(&self) -> &'static str {
        match self {
            ComponentKind::Button => "btn_",
            ComponentKind::Select => "sel_",
            ComponentKind::Modal => "mdl_",
        }
    }

    pub fn from_custom_id(custom_id: &str) -> Option<Self> {
        [ComponentKind::Button, ComponentKind::Select, ComponentKind::Modal]
            .into_iter()
            .find(|kind| custom_id.starts_with(kind.id_prefix()))
    }
}

/// A user's interaction with a registered component.
#[derive(Debug, Clone, PartialEq)]
pub struct ComponentInteraction {
    pub custom_id: String,
    pub user: UserRef,
    pub channel_id: Snowflake,
    /// Selected options for selects.
    pub values: Vec<String>,
    /// Submitted field values for modals, keyed by field id.
    pub fields: HashMap<String, String>,
}

impl ComponentInteraction {
    pub fn new(custom_id: impl Into<String>, user: UserRef, channel_id: Snowflake) -> Self {
        Self {
            custom_id: custom_id.into(),
            user,
            channel_id,
            values: Vec::new(),
            fields: HashMap::new(),
        }
    }

    pub fn values<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.values = values.into_iter().map(Into::into).collect();
        self
    }

    pub fn field(mut self, id: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(id.into(), value.into());
        self
    }
}

#[async_trait]
pub trait ComponentHandler: Send + Sync {
    async fn handle(
        &self,
        interaction: &ComponentInteraction,
        responder: &dyn Responder,
    ) -> anyhow::Result<()>;
}

#[derive(Debug, Error)]
pub enum ComponentError {
    #[error("component `{0}` is not registered or has expired")]
    Unknown(String),
    #[error("component `{custom_id}` is a {registered:?}, not a {requested:?}")]
    KindMismatch {
        custom_id: String,
        registered: ComponentKind,
        requested: ComponentKind,
    },
    #[error("component `{custom_id}` callback failed: {source}")]
    Callback {
        custom_id: String,
        #[source]
        source: anyhow::Error,
    },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ComponentStats {
    pub buttons: usize,
    pub selects: usize,
    pub modals: usize,
    pub total: usize,
}

struct ComponentEntry {
    kind: ComponentKind,
    handler: Arc<dyn ComponentHandler>,
    timeout: Duration,
    deadline: Instant,
}

type Entries = Arc<Mutex<HashMap<String, ComponentEntry>>>;

/// Registry of live components. Cheap to clone; clones share state.
#[derive(Clone, Default)]
pub struct ComponentRegistry {
    entries: Entries,
}

impl ComponentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn register_button(&self, handler: impl ComponentHandler + 'static, timeout: Duration) -> String {
        self.register(ComponentKind::Button, Arc::new(handler), timeout).await
    }

    pub async fn register_select(&self, handler: impl ComponentHandler + 'static, timeout: Duration) -> String {
        self.register(ComponentKind::Select, Arc::new(handler), timeout).await
    }

    pub async fn register_modal(&self, handler: impl ComponentHandler + 'static, timeout: Duration) -> String {
        self.register(ComponentKind::Modal, Arc::new(handler), timeout).await
    }

    /// Register a callback and return its generated custom id.
    pub async fn register(
        &self,
        kind: ComponentKind,
        handler: Arc<dyn ComponentHandler>,
        timeout: Duration,
    ) -> String {
        let custom_id = generate_id(kind);
        let deadline = Instant::now() + timeout;
        self.entries.lock().await.insert(
            custom_id.clone(),
            ComponentEntry { kind, handler, timeout, deadline },
        );
        debug!(custom_id = %custom_id, ?kind, timeout_ms = timeout.as_millis() as u64, "[Components] Registered");

        tokio::spawn(expire_when_idle(Arc::clone(&self.entries), custom_id.clone(), deadline));
        custom_id
    }

    pub async fn contains(&self, custom_id: &str) -> bool {
        self.entries.lock().await.contains_key(custom_id)
    }

    pub async fn kind_of(&self, custom_id: &str) -> Option<ComponentKind> {
        self.entries.lock().await.get(custom_id).map(|e| e.kind)
    }

    /// Run the callback registered for `interaction.custom_id`.
    ///
    /// The lock is released before the callback runs so callbacks may
    /// register or unregister components themselves.
    pub async fn dispatch(
        &self,
        kind: ComponentKind,
        interaction: &ComponentInteraction,
        responder: &dyn Responder,
    ) -> Result<(), ComponentError> {
        let handler = {
            let mut entries = self.entries.lock().await;
            let entry = entries
                .get_mut(&interaction.custom_id)
                .ok_or_else(|| ComponentError::Unknown(interaction.custom_id.clone()))?;
            if entry.kind != kind {
                return Err(ComponentError::KindMismatch {
                    custom_id: interaction.custom_id.clone(),
                    registered: entry.kind,
                    requested: kind,
                });
            }
            Arc::clone(&entry.handler)
        };

        handler
            .handle(interaction, responder)
            .await
            .map_err(|source| ComponentError::Callback {
                custom_id: interaction.custom_id.clone(),
                source,
            })?;

        if let Some(entry) = self.entries.lock().await.get_mut(&interaction.custom_id) {
            entry.deadline = Instant::now() + entry.timeout;
        }
        Ok(())
    }

    pub async fn unregister(&self, custom_id: &str) -> bool {
        let removed = self.entries.lock().await.remove(custom_id).is_some();
        if removed {
            debug!(custom_id = %custom_id, "[Components] Unregistered");
        }
        removed
    }

    pub async fn clear(&self) {
        let mut entries = self.entries.lock().await;
        let count = entries.len();
        entries.clear();
        info!(count, "[Components] Cleared registry");
    }

    pub async fn stats(&self) -> ComponentStats {
        let entries = self.entries.lock().await;
        let mut stats = ComponentStats::default();
        for entry in entries.values() {
            match entry.kind {
                ComponentKind::Button => stats.buttons += 1,
                ComponentKind::Select => stats.selects += 1,
                ComponentKind::Modal => stats.modals += 1,
            }
        }
        stats.total = entries.len();
        stats
    }
}

fn generate_id(kind: ComponentKind) -> String {
    let simple = Uuid::new_v4().simple().to_string();
    format!("{}{}", kind.id_prefix(), &simple[..ID_SUFFIX_LEN])
}

/// Sleeps until the entry's deadline; reschedules while dispatches keep
/// pushing it back, removes the entry once it has been idle for its timeout.
async fn expire_when_idle(entries: Entries, custom_id: String, mut deadline: Instant) {
    loop {
        sleep_until(deadline).await;
        let mut guard = entries.lock().await;
        let Some(entry) = guard.get(&custom_id) else {
            return;
        };
        if entry.deadline <= Instant::now() {
            guard.remove(&custom_id);
            debug!(custom_id = %custom_id, "[Components] Expired after inactivity");
            return;
        }
        deadline = entry.deadline;
    }
}

impl std::fmt::Debug for ComponentRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.entries.try_lock() {
            Ok(entries) => f.debug_struct("ComponentRegistry").field("live", &entries.len()).finish(),
            Err(_) => f.debug_struct("ComponentRegistry").finish_non_exhaustive(),
        }
    }
}
