//! Label source backed by the Docker API.
//!
//! Every container or service event triggers a full rescan: all engine state is
//! replaced by the labels of whatever is running at that moment, so containers
//! that went away take their entries with them.
use bollard::Docker;
use bollard::models::{EventMessage, EventMessageTypeEnum};
use bollard::query_parameters::{EventsOptions, ListContainersOptions, ListServicesOptions};
use engine::{Engine, EngineError, Summary};
use futures_util::StreamExt;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

/// Labels of one container or service, in name order.
pub type LabelSet = BTreeMap<String, String>;

#[derive(thiserror::Error, Debug)]
pub enum WatchError {
    #[error("docker error: {0}")]
    Docker(#[from] bollard::errors::Error),
    #[error("engine error: {0}")]
    Engine(#[from] EngineError),
    #[error("docker event stream ended")]
    StreamClosed,
}

pub struct DockerWatcher {
    client: Docker,
    include_services: bool,
}

impl DockerWatcher {
    /// Connects using `DOCKER_HOST` or the platform's default socket.
    pub fn connect(include_services: bool) -> Result<Self, WatchError> {
        Ok(DockerWatcher {
            client: Docker::connect_with_defaults()?,
            include_services,
        })
    }

    /// Collects the labels of all running containers and, if enabled, swarm
    /// services. A node that is not part of a swarm only contributes
    /// container labels.
    pub async fn scan(&self) -> Result<Vec<LabelSet>, WatchError> {
        let containers = self
            .client
            .list_containers(Some(ListContainersOptions::default()))
            .await?;
        tracing::info!(count = containers.len(), "Containers found");

        let mut label_sets: Vec<LabelSet> = containers
            .into_iter()
            .filter_map(|container| container.labels)
            .map(to_label_set)
            .collect();

        if self.include_services {
            match self
                .client
                .list_services(Some(ListServicesOptions::default()))
                .await
            {
                Ok(services) => {
                    tracing::info!(count = services.len(), "Services found");
                    label_sets.extend(
                        services
                            .into_iter()
                            .filter_map(|service| service.spec.and_then(|spec| spec.labels))
                            .map(to_label_set),
                    );
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Could not list services, using container labels only");
                }
            }
        }

        Ok(label_sets)
    }

    pub async fn rescan(&self, engine: &Engine) -> Result<Summary, WatchError> {
        let label_sets = self.scan().await?;
        let summary = engine.rescan(label_sets.into_iter().flatten())?;
        Ok(summary)
    }

    /// Performs an initial rescan, then rescans on every container or service
    /// event until ctrl-c is received.
    pub async fn run(&self, engine: Arc<Engine>) -> Result<(), WatchError> {
        // Events are replayed from before the first scan, so nothing started
        // while it runs is missed
        let mut events = std::pin::pin!(self.client.events(Some(events_since(SystemTime::now()))));
        let mut shutdown = std::pin::pin!(tokio::signal::ctrl_c());

        let mut rescan = true;
        loop {
            if rescan {
                tokio::select! {
                    result = self.rescan_logged(&engine) => result?,
                    _ = &mut shutdown => break,
                }
            }

            rescan = tokio::select! {
                event = events.next() => match event {
                    Some(Ok(message)) if is_relevant(&message) => {
                        tracing::info!(
                            kind = ?message.typ,
                            action = message.action.as_deref().unwrap_or_default(),
                            name = event_name(&message).unwrap_or_default(),
                            "Docker event received"
                        );
                        true
                    }
                    Some(Ok(_)) => false,
                    Some(Err(e)) => {
                        tracing::error!(error = %e, "Error receiving events");
                        false
                    }
                    None => return Err(WatchError::StreamClosed),
                },
                _ = &mut shutdown => break,
            };
        }

        tracing::info!("Shutting down");
        Ok(())
    }

    // Sink failures are logged and retried on the next event. Docker errors end
    // the watcher.
    async fn rescan_logged(&self, engine: &Engine) -> Result<(), WatchError> {
        match self.rescan(engine).await {
            Ok(_) => Ok(()),
            Err(WatchError::Engine(e)) => {
                tracing::error!(error = %e, "Rescan could not be stored");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }
}

fn events_since(time: SystemTime) -> EventsOptions {
    let seconds = time
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or_default();
    EventsOptions {
        since: Some(seconds.to_string()),
        ..Default::default()
    }
}

fn to_label_set(labels: HashMap<String, String>) -> LabelSet {
    labels.into_iter().collect()
}

fn is_relevant(message: &EventMessage) -> bool {
    matches!(
        message.typ,
        Some(EventMessageTypeEnum::CONTAINER | EventMessageTypeEnum::SERVICE)
    )
}

/// The actor's name attribute, falling back to the short ID.
fn event_name(message: &EventMessage) -> Option<&str> {
    let actor = message.actor.as_ref()?;
    actor
        .attributes
        .as_ref()
        .and_then(|attributes| attributes.get("name"))
        .map(String::as_str)
        .filter(|name| !name.is_empty())
        .or_else(|| {
            actor
                .id
                .as_deref()
                .map(|id| id.get(..12).unwrap_or(id))
        })
}
