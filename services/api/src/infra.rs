use finance_qualify::workflows::qualification::{
    QualificationId, QualificationPayload, SinkError, SinkReceipt, SubmissionSink,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Storage backend stand-in that keeps delivered payloads in memory.
#[derive(Default)]
pub(crate) struct InMemorySubmissionSink {
    delivered: Mutex<Vec<QualificationPayload>>,
    sequence: AtomicU64,
}

impl SubmissionSink for InMemorySubmissionSink {
    fn deliver(&self, payload: &QualificationPayload) -> Result<SinkReceipt, SinkError> {
        let mut guard = self
            .delivered
            .lock()
            .map_err(|_| SinkError::Unavailable("submission store lock poisoned".to_string()))?;
        guard.push(payload.clone());
        let next = self.sequence.fetch_add(1, Ordering::Relaxed) + 1;
        Ok(SinkReceipt {
            qualification_id: QualificationId(format!("qual-{next:06}")),
        })
    }
}

impl InMemorySubmissionSink {
    pub(crate) fn delivered(&self) -> Vec<QualificationPayload> {
        self.delivered
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }
}
