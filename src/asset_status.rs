//! # Asset Status Synchronizer
//!
//! An asset's `status` is derived from the work orders that still reference
//! it. Any work-order mutation that can change that set calls [`sync`] on the
//! same transaction, so the work-order write and the derived status commit
//! together.

use metrics::counter;
use sea_orm::{ConnectionTrait, DatabaseConnection, TransactionTrait};
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::error::DomainError;
use crate::models::{AssetStatus, Priority};
use crate::repositories::{AssetRepository, WorkOrderRepository};

/// What a synchronisation pass did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// No asset id was supplied
    Skipped,
    /// The asset does not exist in the tenant
    AssetMissing,
    /// Stored status already matched the derived one
    Unchanged(AssetStatus),
    /// Stored status was rewritten
    Updated { from: String, to: AssetStatus },
}

impl SyncOutcome {
    /// Derived status, when an asset was found.
    pub fn status(&self) -> Option<AssetStatus> {
        match self {
            SyncOutcome::Unchanged(status) => Some(*status),
            SyncOutcome::Updated { to, .. } => Some(*to),
            SyncOutcome::Skipped | SyncOutcome::AssetMissing => None,
        }
    }
}

/// Health implied by the priorities of an asset's active work orders.
///
/// Priorities that do not parse still count as open work.
pub fn derive_status<I, S>(active_priorities: I) -> AssetStatus
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut any_active = false;
    for priority in active_priorities {
        if matches!(priority.as_ref().parse::<Priority>(), Ok(Priority::Critical)) {
            return AssetStatus::Breakdown;
        }
        any_active = true;
    }

    if any_active {
        AssetStatus::RunningWithIssues
    } else {
        AssetStatus::Healthy
    }
}

/// Re-derive and conditionally persist the status of one asset.
///
/// Runs on whatever connection it is handed, usually the transaction of the
/// triggering work-order mutation. A stored value is rewritten only when it
/// differs from the canonical derived text.
#[instrument(skip_all, fields(tenant_id = %tenant_id, asset_id = ?asset_id))]
pub async fn sync<C: ConnectionTrait>(
    conn: &C,
    tenant_id: Uuid,
    asset_id: Option<Uuid>,
) -> Result<SyncOutcome, DomainError> {
    let Some(asset_id) = asset_id else {
        return Ok(SyncOutcome::Skipped);
    };

    let assets = AssetRepository::new(conn);
    let Some(asset) = assets.find(tenant_id, asset_id).await? else {
        debug!("Asset not found, nothing to synchronise");
        return Ok(SyncOutcome::AssetMissing);
    };

    let priorities = WorkOrderRepository::new(conn)
        .active_priorities_for_asset(tenant_id, asset_id)
        .await?;
    let derived = derive_status(&priorities);

    if asset.status == derived.as_str() {
        debug!(status = %derived, active_work_orders = priorities.len(), "Asset status unchanged");
        return Ok(SyncOutcome::Unchanged(derived));
    }

    assets.set_status(tenant_id, asset_id, derived.as_str()).await?;
    counter!("asset_status_updates_total", "status" => derived.as_str()).increment(1);
    info!(
        from = %asset.status,
        to = %derived,
        active_work_orders = priorities.len(),
        "Asset status updated"
    );

    Ok(SyncOutcome::Updated {
        from: asset.status,
        to: derived,
    })
}

/// Standalone synchronisation in its own transaction.
pub async fn sync_standalone(
    db: &DatabaseConnection,
    tenant_id: Uuid,
    asset_id: Uuid,
) -> Result<SyncOutcome, DomainError> {
    let txn = db.begin().await?;
    let outcome = sync(&txn, tenant_id, Some(asset_id)).await?;
    txn.commit().await?;
    Ok(outcome)
}
