use crate::core::filter::filter_birthdays;
use crate::domain::model::{
    ContactRecord, DeliveryReceipt, Direction, NotificationRequest, QueryFailurePolicy, RawContact,
    RunParameters, RunSummary, SendFailurePolicy, SendOutcome, UserId,
};
use crate::domain::ports::{Clock, ConfigProvider, MessageTransport, RecordQuery, RecordStore};
use crate::utils::error::{NotifierError, Result};
use crate::utils::validation::validate_non_empty_string;
use std::time::Duration;
use tracing::Instrument;

/// Everything the host hands to a single run.
pub struct ExecutionContext<'a> {
    pub initiating_user: UserId,
    pub store: &'a dyn RecordStore,
    pub transport: &'a dyn MessageTransport,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotifierSettings {
    pub query_timeout: Duration,
    pub send_timeout: Duration,
    pub on_query_failure: QueryFailurePolicy,
    pub on_send_failure: SendFailurePolicy,
}

impl Default for NotifierSettings {
    fn default() -> Self {
        Self {
            query_timeout: Duration::from_secs(30),
            send_timeout: Duration::from_secs(30),
            on_query_failure: QueryFailurePolicy::default(),
            on_send_failure: SendFailurePolicy::default(),
        }
    }
}

impl NotifierSettings {
    pub fn from_config<C: ConfigProvider + ?Sized>(config: &C) -> Self {
        Self {
            query_timeout: Duration::from_secs(config.query_timeout_seconds()),
            send_timeout: Duration::from_secs(config.send_timeout_seconds()),
            on_query_failure: config.on_query_failure(),
            on_send_failure: config.on_send_failure(),
        }
    }
}

/// Builds the outbound greeting for one matched contact.
///
/// Subject and body are copied verbatim; there is no per-contact templating.
pub fn build_request(
    sender: &UserId,
    contact: &ContactRecord,
    params: &RunParameters,
) -> NotificationRequest {
    NotificationRequest {
        from: sender.clone(),
        to: contact.id.clone(),
        subject: params.subject.clone(),
        body: params.body.clone(),
        direction: Direction::Outgoing,
        regarding: contact.id.clone(),
    }
}

pub struct BirthdayNotifier<K: Clock> {
    clock: K,
    settings: NotifierSettings,
}

impl<K: Clock> BirthdayNotifier<K> {
    pub fn new(clock: K, settings: NotifierSettings) -> Self {
        Self { clock, settings }
    }

    /// One end-to-end run: fetch, filter by today's month/day, send.
    pub async fn run(
        &self,
        ctx: &ExecutionContext<'_>,
        params: &RunParameters,
    ) -> Result<RunSummary> {
        let span = tracing::info_span!("run", user = %ctx.initiating_user);
        self.run_inner(ctx, params).instrument(span).await
    }

    async fn run_inner(
        &self,
        ctx: &ExecutionContext<'_>,
        params: &RunParameters,
    ) -> Result<RunSummary> {
        validate_non_empty_string("subject", &params.subject)?;
        validate_non_empty_string("body", &params.body)?;

        tracing::info!("🚀 Execution start");

        // 整次掃描只讀一次「今天」
        let today = self.clock.today();
        tracing::debug!("Matching birthdays against {}", today);

        // Fetch
        let candidates = match self.fetch_candidates(ctx).await {
            Ok(candidates) => candidates,
            Err(e) => match self.settings.on_query_failure {
                QueryFailurePolicy::Fail => {
                    tracing::error!("❌ {}", e);
                    return Err(e);
                }
                QueryFailurePolicy::Degrade => {
                    tracing::error!("❌ {} (continuing with no matches)", e);
                    tracing::info!("Execution end: nothing sent");
                    return Ok(RunSummary::empty(today));
                }
            },
        };
        tracing::info!("Fetched {} contacts with a birthdate", candidates.len());

        // Filter
        let candidate_count = candidates.len();
        let filtered = filter_birthdays(candidates, today);
        tracing::info!(
            "{} contacts have a birthday today ({} skipped)",
            filtered.matches.len(),
            filtered.skipped
        );

        let mut summary = RunSummary {
            today,
            candidates: candidate_count,
            matched: filtered.matches.len(),
            skipped: filtered.skipped,
            outcomes: Vec::with_capacity(filtered.matches.len()),
        };

        // Send
        for contact in &filtered.matches {
            let request = build_request(&ctx.initiating_user, contact, params);

            match self.dispatch(ctx, &request).await {
                Ok(receipt) => {
                    tracing::info!("📧 Sent greeting to {} ({})", contact.fullname, contact.id);
                    summary.outcomes.push(SendOutcome::Sent {
                        contact: contact.id.clone(),
                        receipt,
                    });
                }
                Err(e) => match self.settings.on_send_failure {
                    SendFailurePolicy::Abort => {
                        tracing::error!("❌ {} (aborting remaining sends)", e);
                        return Err(e);
                    }
                    SendFailurePolicy::Continue => {
                        tracing::error!("❌ {}", e);
                        summary.outcomes.push(SendOutcome::Failed {
                            contact: contact.id.clone(),
                            reason: e.to_string(),
                        });
                    }
                },
            }
        }

        tracing::info!(
            "✅ Execution end: {} sent, {} failed, {} skipped",
            summary.sent(),
            summary.failed(),
            summary.skipped
        );

        Ok(summary)
    }

    async fn fetch_candidates(&self, ctx: &ExecutionContext<'_>) -> Result<Vec<RawContact>> {
        let query = RecordQuery::contacts_with_birthdate();
        let limit = self.settings.query_timeout;

        match tokio::time::timeout(limit, ctx.store.query_records(&query)).await {
            Ok(Ok(records)) => Ok(records),
            Ok(Err(e)) => Err(as_query_failure(e)),
            Err(_) => Err(as_query_failure(NotifierError::Timeout {
                operation: "record query".to_string(),
                seconds: limit.as_secs(),
            })),
        }
    }

    async fn dispatch(
        &self,
        ctx: &ExecutionContext<'_>,
        request: &NotificationRequest,
    ) -> Result<DeliveryReceipt> {
        let limit = self.settings.send_timeout;

        match tokio::time::timeout(limit, ctx.transport.create_and_send(request)).await {
            Ok(Ok(receipt)) => Ok(receipt),
            Ok(Err(e)) => Err(as_send_failure(request, e)),
            Err(_) => Err(as_send_failure(
                request,
                NotifierError::Timeout {
                    operation: "send".to_string(),
                    seconds: limit.as_secs(),
                },
            )),
        }
    }
}

fn as_query_failure(e: NotifierError) -> NotifierError {
    match e {
        e @ NotifierError::QueryFailure { .. } => e,
        other => NotifierError::QueryFailure {
            message: other.to_string(),
        },
    }
}

fn as_send_failure(request: &NotificationRequest, e: NotifierError) -> NotifierError {
    match e {
        e @ NotifierError::SendFailure { .. } => e,
        other => NotifierError::SendFailure {
            contact_id: request.to.0.clone(),
            message: other.to_string(),
        },
    }
}
