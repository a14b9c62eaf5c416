use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use inkubator::config::WorkflowConfig;
use inkubator::workflows::judging::JudgingService;
use inkubator::workflows::memory::MemoryStore;
use inkubator::workflows::mentoring::MentoringService;
use inkubator::workflows::participation::ParticipationService;
use inkubator::workflows::{Notification, NotificationError, NotificationPublisher};
use tracing::info;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Writes every notification to the log until a mail or chat transport is wired in.
#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct TracingNotificationPublisher;

impl NotificationPublisher for TracingNotificationPublisher {
    fn publish(&self, notification: Notification) -> Result<(), NotificationError> {
        info!(
            template = %notification.template,
            recipient = %notification.recipient,
            subject = %notification.subject_id,
            details = ?notification.details,
            "notification queued"
        );
        Ok(())
    }
}

/// The three workflow services sharing one store and one notification sink.
pub(crate) struct WorkflowServices<N> {
    pub(crate) participation: Arc<ParticipationService<MemoryStore, N>>,
    pub(crate) judging: Arc<JudgingService<MemoryStore, MemoryStore, N>>,
    pub(crate) mentoring: Arc<MentoringService<MemoryStore, N>>,
}

impl<N> WorkflowServices<N>
where
    N: NotificationPublisher + 'static,
{
    pub(crate) fn in_memory(notifications: Arc<N>, policy: WorkflowConfig) -> Self {
        let store = Arc::new(MemoryStore::new());
        Self {
            participation: Arc::new(ParticipationService::new(
                store.clone(),
                notifications.clone(),
                policy,
            )),
            judging: Arc::new(JudgingService::new(
                store.clone(),
                store.clone(),
                notifications.clone(),
            )),
            mentoring: Arc::new(MentoringService::new(store, notifications)),
        }
    }
}
