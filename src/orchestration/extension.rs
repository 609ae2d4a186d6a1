//! # Notification Service Extension
//!
//! Entry point the host calls for every incoming notification.
//!
//! ## Flow
//!
//! ```text
//! did_receive(request, handler)
//!   ├── decode payload ── failure ──> handler(original content), NotHandled
//!   ├── seed draft with payload title/body
//!   ├── build graph
//!   │     download_global_configuration ─┐
//!   │     download_tenant_configuration ─┴─> merge_configuration ─> report_delivery
//!   │     extract_deeplink
//!   │     download_media_attachment
//!   ├── schedule graph ── all settled ──> gate.fire(Completion)
//!   └── Handled(session) ── time_will_expire() ──> gate.fire(Deadline)
//! ```
//!
//! The handler runs exactly once per notification, whichever path wins.

use crate::client::{
    DeeplinkResolver, MediaFetcher, PayloadDeeplinkResolver, RemoteConfigurationNetworking,
    TelemetrySink,
};
use crate::config::ExtensionConfig;
use crate::constants::operations;
use crate::error::{ExtensionResult, GraphError};
use crate::events::EventPublisher;
use crate::logging::log_error;
use crate::models::{ConfigScope, DraftContent, DraftResult, NotificationPayload, NotificationRequest};
use crate::operations::{
    ConfigDownloader, ConfigMerger, DeeplinkExtractor, DeliveryReporter, MediaAttachmentDownloader,
};
use crate::orchestration::completion_gate::{CompletionGate, ContentHandler, FiredBy};
use crate::orchestration::graph::{DependencyGraph, GraphBuilder};
use crate::orchestration::scheduler::{ScheduleReport, TaskScheduler};
use crate::storage::{ConfigurationRepository, InMemoryConfigurationRepository};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{info, instrument, warn};
use uuid::Uuid;

/// Host-provided implementations the operations run against
#[derive(Clone)]
pub struct Collaborators {
    pub networking: Arc<dyn RemoteConfigurationNetworking>,
    pub repository: Arc<dyn ConfigurationRepository>,
    pub media_fetcher: Arc<dyn MediaFetcher>,
    pub deeplink_resolver: Arc<dyn DeeplinkResolver>,
    /// `None` routes delivery records onto the extension's own event bus
    pub telemetry: Option<Arc<dyn TelemetrySink>>,
}

impl Collaborators {
    /// Transport-only setup: in-memory repository, payload-driven deep links,
    /// and delivery records published on the extension's event bus.
    pub fn new(
        networking: Arc<dyn RemoteConfigurationNetworking>,
        media_fetcher: Arc<dyn MediaFetcher>,
    ) -> Self {
        Self {
            networking,
            repository: Arc::new(InMemoryConfigurationRepository::new()),
            media_fetcher,
            deeplink_resolver: Arc::new(PayloadDeeplinkResolver),
            telemetry: None,
        }
    }

    pub fn with_repository(mut self, repository: Arc<dyn ConfigurationRepository>) -> Self {
        self.repository = repository;
        self
    }

    pub fn with_deeplink_resolver(mut self, resolver: Arc<dyn DeeplinkResolver>) -> Self {
        self.deeplink_resolver = resolver;
        self
    }

    pub fn with_telemetry(mut self, telemetry: Arc<dyn TelemetrySink>) -> Self {
        self.telemetry = Some(telemetry);
        self
    }
}

impl std::fmt::Debug for Collaborators {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collaborators")
            .field("repository", &self.repository.provider_name())
            .finish_non_exhaustive()
    }
}

/// Result of [`NotificationServiceExtension::did_receive`]
#[derive(Debug)]
pub enum ReceiveOutcome {
    /// The payload decoded and the operations are running
    Handled(NotificationSession),
    /// The payload could not be decoded; the handler already received the
    /// original content
    NotHandled,
}

impl ReceiveOutcome {
    pub fn is_handled(&self) -> bool {
        matches!(self, Self::Handled(_))
    }

    pub fn into_session(self) -> Option<NotificationSession> {
        match self {
            Self::Handled(session) => Some(session),
            Self::NotHandled => None,
        }
    }
}

/// One notification being processed
#[derive(Debug)]
pub struct NotificationSession {
    session_id: Uuid,
    gate: Arc<CompletionGate>,
    completion: JoinHandle<Option<ScheduleReport>>,
}

impl NotificationSession {
    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    /// The host's deadline signal. Returns `true` when this call delivered
    /// the content, `false` when the operations already had.
    pub fn time_will_expire(&self) -> bool {
        let fired = self.gate.fire(FiredBy::Deadline);
        if fired {
            warn!(session_id = %self.session_id, "Deadline reached before operations settled, delivering best attempt");
        }
        fired
    }

    /// Fire the deadline path automatically after `deadline`.
    pub fn arm_deadline(&self, deadline: Duration) {
        let gate = self.gate.clone();
        let session_id = self.session_id;
        tokio::spawn(async move {
            tokio::time::sleep(deadline).await;
            if gate.fire(FiredBy::Deadline) {
                warn!(session_id = %session_id, deadline_ms = deadline.as_millis() as u64, "Deadline timer fired");
            }
        });
    }

    /// Wait until the content has been delivered.
    pub async fn delivered(&self) -> FiredBy {
        self.gate.wait().await
    }

    pub fn fired_by(&self) -> Option<FiredBy> {
        self.gate.fired_by()
    }

    /// Wait for every operation to settle, which may be well after delivery.
    /// `None` when the scheduler stopped without reporting.
    pub async fn settled(self) -> Option<ScheduleReport> {
        self.completion.await.ok().flatten()
    }
}

pub struct NotificationServiceExtension {
    config: ExtensionConfig,
    collaborators: Collaborators,
    telemetry: Arc<dyn TelemetrySink>,
    scheduler: TaskScheduler,
    events: Option<EventPublisher>,
}

impl std::fmt::Debug for NotificationServiceExtension {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationServiceExtension")
            .field("config", &self.config)
            .field("collaborators", &self.collaborators)
            .field("scheduler", &self.scheduler)
            .finish()
    }
}

impl NotificationServiceExtension {
    pub fn new(config: ExtensionConfig, collaborators: Collaborators) -> Self {
        let bus = EventPublisher::new(config.telemetry.channel_capacity);
        let telemetry = collaborators
            .telemetry
            .clone()
            .unwrap_or_else(|| Arc::new(bus.clone()) as Arc<dyn TelemetrySink>);
        let events = config.telemetry.enabled.then_some(bus);
        let mut scheduler = TaskScheduler::new(&config.scheduler);
        if let Some(publisher) = &events {
            scheduler = scheduler.with_event_publisher(publisher.clone());
        }

        Self {
            config,
            collaborators,
            telemetry,
            scheduler,
            events,
        }
    }

    pub fn config(&self) -> &ExtensionConfig {
        &self.config
    }

    /// Event bus carrying lifecycle events, and delivery records when no
    /// telemetry sink was supplied. `None` when telemetry is disabled.
    pub fn events(&self) -> Option<&EventPublisher> {
        self.events.as_ref()
    }

    /// Build the per-notification operation graph.
    pub fn build_graph(
        &self,
        payload: Arc<NotificationPayload>,
        draft: Arc<DraftContent>,
    ) -> Result<DependencyGraph, GraphError> {
        let c = &self.collaborators;
        let bundle = self.config.app_bundle_id.as_str();

        let mut builder = GraphBuilder::new();
        builder
            .add_operation(
                operations::DOWNLOAD_GLOBAL_CONFIGURATION,
                Arc::new(ConfigDownloader::new(
                    ConfigScope::Global,
                    c.networking.clone(),
                    c.repository.clone(),
                )),
            )
            .add_operation(
                operations::DOWNLOAD_TENANT_CONFIGURATION,
                Arc::new(ConfigDownloader::new(
                    ConfigScope::Tenant,
                    c.networking.clone(),
                    c.repository.clone(),
                )),
            )
            .add_operation(
                operations::MERGE_CONFIGURATION,
                Arc::new(ConfigMerger::new(c.repository.clone())),
            )
            .add_operation(
                operations::REPORT_DELIVERY,
                Arc::new(DeliveryReporter::new(
                    c.repository.clone(),
                    self.telemetry.clone(),
                    payload.clone(),
                    bundle,
                )),
            )
            .add_operation(
                operations::EXTRACT_DEEPLINK,
                Arc::new(DeeplinkExtractor::new(
                    payload.clone(),
                    draft.clone(),
                    c.deeplink_resolver.clone(),
                    bundle,
                )),
            )
            .add_operation(
                operations::DOWNLOAD_MEDIA_ATTACHMENT,
                Arc::new(MediaAttachmentDownloader::new(
                    payload,
                    draft,
                    c.media_fetcher.clone(),
                )),
            )
            .add_dependency(
                operations::MERGE_CONFIGURATION,
                operations::DOWNLOAD_GLOBAL_CONFIGURATION,
            )
            .add_dependency(
                operations::MERGE_CONFIGURATION,
                operations::DOWNLOAD_TENANT_CONFIGURATION,
            )
            .add_dependency(operations::REPORT_DELIVERY, operations::MERGE_CONFIGURATION);

        builder.build()
    }

    /// Start processing a notification. Must be called from within a tokio
    /// runtime. `handler` runs exactly once, possibly before this returns.
    ///
    /// Only a malformed graph is returned as an error, and the handler has
    /// already received the seeded draft by then.
    #[instrument(skip_all, fields(request = %request.identifier))]
    pub fn did_receive(
        &self,
        request: &NotificationRequest,
        handler: ContentHandler,
    ) -> ExtensionResult<ReceiveOutcome> {
        let payload = match NotificationPayload::from_request(request) {
            Ok(payload) => Arc::new(payload),
            Err(e) => {
                warn!(error = %e, "Payload could not be decoded, delivering original content");
                handler(DraftResult::from_request(request));
                return Ok(ReceiveOutcome::NotHandled);
            }
        };

        let draft = Arc::new(DraftContent::new(request, &payload));
        let graph = match self.build_graph(payload.clone(), draft.clone()) {
            Ok(graph) => graph,
            Err(e) => {
                handler(draft.snapshot());
                return Err(e.into());
            }
        };

        let gate = Arc::new(CompletionGate::new(draft, handler));
        let schedule = self.scheduler.schedule(graph);
        let session_id = schedule.run_id();

        info!(
            session_id = %session_id,
            tenant_id = %payload.tenant_id,
            "Notification session started"
        );

        let completion = {
            let gate = gate.clone();
            tokio::spawn(async move {
                let report = match schedule.settled().await {
                    Ok(report) => Some(report),
                    Err(e) => {
                        log_error(
                            "notification_service_extension",
                            "settled",
                            &e.to_string(),
                            Some(&session_id.to_string()),
                        );
                        None
                    }
                };
                gate.fire(FiredBy::Completion);
                report
            })
        };

        Ok(ReceiveOutcome::Handled(NotificationSession {
            session_id,
            gate,
            completion,
        }))
    }

    /// Process a notification and return the delivered content. The deadline
    /// falls back to the configured default.
    pub async fn handle(&self, request: &NotificationRequest, deadline: Option<Duration>) -> DraftResult {
        let (sender, receiver) = oneshot::channel();
        let handler: ContentHandler = Box::new(move |result| {
            let _ = sender.send(result);
        });

        match self.did_receive(request, handler) {
            Ok(ReceiveOutcome::Handled(session)) => {
                session.arm_deadline(deadline.unwrap_or_else(|| self.config.deadline()));
            }
            Ok(ReceiveOutcome::NotHandled) => {}
            Err(e) => log_error(
                "notification_service_extension",
                "did_receive",
                &e.to_string(),
                Some(&request.identifier),
            ),
        }

        receiver
            .await
            .unwrap_or_else(|_| DraftResult::from_request(request))
    }
}
