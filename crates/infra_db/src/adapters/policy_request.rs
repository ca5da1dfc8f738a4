//! PostgreSQL Policy Request Adapter
//!
//! Implements `PolicyRequestRepository` on top of [`PolicyRequestStore`],
//! converting between database rows and the `PolicyRequest` aggregate.
//!
//! # Example
//!
//! ```rust,ignore
//! use infra_db::adapters::PostgresPolicyRequestRepository;
//! use domain_policy::PolicyRequestRepository;
//! use std::sync::Arc;
//!
//! let repository: Arc<dyn PolicyRequestRepository> =
//!     Arc::new(PostgresPolicyRequestRepository::new(pool));
//! let request = repository.find_by_id(id).await?;
//! ```

use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::PgPool;
use std::collections::HashMap;
use std::time::Instant;
use tracing::{debug, instrument};
use uuid::Uuid;

use core_kernel::{
    AdapterHealth, CustomerId, DomainPort, HealthCheckResult, HealthCheckable, PolicyRequestId,
    PortError,
};
use domain_policy::{
    PolicyRequest, PolicyRequestRecord, PolicyRequestRepository, RequestStatus,
    StatusHistoryEntry,
};

use crate::error::DatabaseError;
use crate::repositories::policy_request::{PolicyRequestRow, PolicyRequestStore, StatusHistoryRow};

const ADAPTER_ID: &str = "postgres-policy-request-repository";

/// PostgreSQL-backed implementation of `PolicyRequestRepository`
///
/// Each save runs in one transaction: the request row is inserted or
/// version-checked and updated, then the history entries the table does not
/// hold yet are appended.
#[derive(Debug, Clone)]
pub struct PostgresPolicyRequestRepository {
    store: PolicyRequestStore,
}

impl PostgresPolicyRequestRepository {
    pub fn new(pool: PgPool) -> Self {
        Self {
            store: PolicyRequestStore::new(pool),
        }
    }

    pub fn store(&self) -> &PolicyRequestStore {
        &self.store
    }
}

impl DomainPort for PostgresPolicyRequestRepository {}

#[async_trait]
impl HealthCheckable for PostgresPolicyRequestRepository {
    async fn health_check(&self) -> HealthCheckResult {
        let start = Instant::now();

        let result = sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(self.store.pool())
            .await;

        let latency_ms = start.elapsed().as_millis() as u64;

        match result {
            Ok(_) => HealthCheckResult::new(ADAPTER_ID, AdapterHealth::Healthy, latency_ms),
            Err(e) => HealthCheckResult::new(ADAPTER_ID, AdapterHealth::Unhealthy, latency_ms)
                .with_message(format!("Database error: {}", e)),
        }
    }
}

#[async_trait]
impl PolicyRequestRepository for PostgresPolicyRequestRepository {
    #[instrument(skip(self), fields(policy_id = %id))]
    async fn find_by_id(&self, id: PolicyRequestId) -> Result<Option<PolicyRequest>, PortError> {
        debug!("Fetching policy request by ID");

        let Some(row) = self.store.find(*id.as_uuid()).await? else {
            return Ok(None);
        };
        let history = self.store.history_for(&[row.id]).await?;

        restore(row, history).map(Some)
    }

    #[instrument(skip(self, customer_id), fields(customer_id = %customer_id))]
    async fn find_by_customer(
        &self,
        customer_id: CustomerId,
    ) -> Result<Vec<PolicyRequest>, PortError> {
        debug!("Fetching policy requests by customer");

        let rows = self.store.find_by_customer(*customer_id.as_uuid()).await?;
        let ids: Vec<Uuid> = rows.iter().map(|row| row.id).collect();

        let mut histories: HashMap<Uuid, Vec<StatusHistoryRow>> = HashMap::new();
        for entry in self.store.history_for(&ids).await? {
            histories.entry(entry.policy_request_id).or_default().push(entry);
        }

        rows.into_iter()
            .map(|row| {
                let history = histories.remove(&row.id).unwrap_or_default();
                restore(row, history)
            })
            .collect()
    }

    #[instrument(skip(self, request), fields(policy_id = %request.id(), version = request.version()))]
    async fn save(&self, mut request: PolicyRequest) -> Result<PolicyRequest, PortError> {
        let expected = to_db_version(request.version())?;
        let row = to_row(&request, expected + 1);
        let history = to_history_rows(&request)?;

        if request.is_new() {
            debug!("Inserting policy request");
            self.store.insert(&row, &history).await?;
        } else {
            debug!("Updating policy request");
            self.store.update(&row, expected, &history).await?;
        }

        request.mark_persisted();
        Ok(request)
    }
}

fn to_db_version(version: u64) -> Result<i64, PortError> {
    i64::try_from(version)
        .map_err(|_| PortError::transformation(format!("version {} out of range", version)))
}

fn to_row(request: &PolicyRequest, version: i64) -> PolicyRequestRow {
    PolicyRequestRow {
        id: *request.id().as_uuid(),
        customer_id: *request.customer_id().as_uuid(),
        product_id: *request.product_id().as_uuid(),
        category: request.category().to_string(),
        sales_channel: request.sales_channel().to_string(),
        payment_method: request.payment_method().to_string(),
        total_monthly_premium_amount: request.total_monthly_premium_amount(),
        insured_amount: request.insured_amount(),
        coverages: Json(request.coverages().clone()),
        assistances: Json(request.assistances().clone()),
        status: request.status().as_str().to_string(),
        created_at: request.created_at(),
        finished_at: request.finished_at(),
        version,
    }
}

fn to_history_rows(request: &PolicyRequest) -> Result<Vec<StatusHistoryRow>, PortError> {
    let policy_request_id = *request.id().as_uuid();
    request
        .history()
        .iter()
        .enumerate()
        .map(|(position, entry)| {
            Ok(StatusHistoryRow {
                policy_request_id,
                position: to_db_position(position)?,
                status: entry.status().as_str().to_string(),
                recorded_at: entry.timestamp(),
            })
        })
        .collect()
}

fn to_db_position(position: usize) -> Result<i32, PortError> {
    i32::try_from(position)
        .map_err(|_| PortError::transformation(format!("history position {} out of range", position)))
}

fn parse_status(value: &str) -> Result<RequestStatus, DatabaseError> {
    value
        .parse()
        .map_err(|_| DatabaseError::SerializationError(format!("unknown status '{}'", value)))
}

fn to_record(
    row: PolicyRequestRow,
    history: Vec<StatusHistoryRow>,
) -> Result<PolicyRequestRecord, DatabaseError> {
    let history = history
        .into_iter()
        .map(|entry| Ok(StatusHistoryEntry::new(parse_status(&entry.status)?, entry.recorded_at)))
        .collect::<Result<Vec<_>, DatabaseError>>()?;

    let version = u64::try_from(row.version).map_err(|_| {
        DatabaseError::SerializationError(format!("negative version {}", row.version))
    })?;

    Ok(PolicyRequestRecord {
        id: row.id.into(),
        customer_id: row.customer_id.into(),
        product_id: row.product_id.into(),
        category: row.category,
        sales_channel: row.sales_channel,
        payment_method: row.payment_method,
        total_monthly_premium_amount: row.total_monthly_premium_amount,
        insured_amount: row.insured_amount,
        coverages: row.coverages.0,
        assistances: row.assistances.0,
        status: parse_status(&row.status)?,
        created_at: row.created_at,
        finished_at: row.finished_at,
        history,
        version,
    })
}

fn restore(row: PolicyRequestRow, history: Vec<StatusHistoryRow>) -> Result<PolicyRequest, PortError> {
    let record = to_record(row, history)?;
    PolicyRequest::restore(record).map_err(|e| PortError::transformation(e.to_string()))
}
