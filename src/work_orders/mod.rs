//! # Work Order Lifecycle Engine
//!
//! Creates, updates and deletes work orders inside a single database
//! transaction together with the asset status synchronisation they trigger.
//! Also tracks collaborative presence (join/leave sessions) and computes the
//! per-tenant dashboard counters.

pub mod number;
pub mod state;

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, NaiveTime, Utc};
use metrics::counter;
use sea_orm::{
    ConnectionTrait, DatabaseConnection, DatabaseTransaction, Set, TransactionTrait,
};
use serde::Serialize;
use tracing::{debug, info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{asset_status, assets};
use crate::auth::ActorContext;
use crate::config::WorkOrderConfig;
use crate::error::{DomainError, is_unique_violation};
use crate::models::work_order::{ActiveModel, Model};
use crate::models::{Priority, WorkOrderStatus, work_order_session};
use crate::repositories::{WorkOrderFilter, WorkOrderRepository, WorkOrderSessionRepository};

use self::state::{StatusChange, TransitionContext, plan_transition};

const ENTITY: &str = "work order";

/// A work order together with the users currently working on it.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkOrderDetails {
    pub work_order: Model,
    pub active_sessions: Vec<work_order_session::Model>,
}

/// Input for [`WorkOrderService::create`].
#[derive(Debug, Clone, Default)]
pub struct NewWorkOrder {
    pub title: String,
    pub description: Option<String>,
    pub priority: Option<Priority>,
    pub asset_id: Option<Uuid>,
}

/// Partial update. `None` leaves a field untouched, `Some(None)` clears it.
#[derive(Debug, Clone, Default)]
pub struct WorkOrderUpdate {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub status: Option<WorkOrderStatus>,
    pub priority: Option<Priority>,
    pub asset_id: Option<Option<Uuid>>,
    pub completion_notes: Option<Option<String>>,
    pub signed_by_name: Option<Option<String>>,
    pub completed_at: Option<Option<DateTime<Utc>>>,
}

/// Dashboard counters for one tenant.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct WorkOrderStats {
    /// Work orders not completed or cancelled
    pub active_total: u64,
    /// All work orders ever created
    pub total: u64,
    /// Active counts per status plus `completed` for today (UTC)
    pub by_status: BTreeMap<String, u64>,
    /// Active counts per priority
    pub by_priority: BTreeMap<String, u64>,
}

/// Work order operations for one request.
pub struct WorkOrderService<'a> {
    db: &'a DatabaseConnection,
    policy: &'a WorkOrderConfig,
    number_fn: fn(DateTime<Utc>) -> String,
}

impl<'a> WorkOrderService<'a> {
    pub fn new(db: &'a DatabaseConnection, policy: &'a WorkOrderConfig) -> Self {
        Self {
            db,
            policy,
            number_fn: number::generate_random,
        }
    }

    /// Replace the work order number generator.
    pub fn with_number_generator(mut self, number_fn: fn(DateTime<Utc>) -> String) -> Self {
        self.number_fn = number_fn;
        self
    }

    #[instrument(skip_all, fields(tenant_id = %actor.tenant_id, user_id = %actor.user_id))]
    pub async fn create(
        &self,
        actor: &ActorContext,
        input: NewWorkOrder,
    ) -> Result<WorkOrderDetails, DomainError> {
        let title = required_title(&input.title)?;
        let now = Utc::now().fixed_offset();
        let priority = input.priority.unwrap_or_default();

        let txn = self.db.begin().await?;

        if let Some(asset_id) = input.asset_id {
            assets::ensure_exists(&txn, actor.tenant_id, asset_id).await?;
        }

        let work_order = ActiveModel {
            id: Set(Uuid::new_v4()),
            tenant_id: Set(actor.tenant_id),
            asset_id: Set(input.asset_id),
            title: Set(title),
            work_order_number: Set(String::new()),
            description: Set(input.description),
            status: Set(WorkOrderStatus::New.as_str().to_string()),
            priority: Set(priority.as_str().to_string()),
            reported_by_user_id: Set(Some(actor.user_id)),
            assigned_to_user_id: Set(None),
            completed_by_user_id: Set(None),
            completion_notes: Set(None),
            signed_by_name: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
            started_at: Set(None),
            completed_at: Set(None),
        };

        let created = self.insert_numbered(&txn, work_order).await?;
        asset_status::sync(&txn, actor.tenant_id, created.asset_id).await?;
        txn.commit().await?;

        counter!("work_orders_created_total").increment(1);
        info!(
            work_order_id = %created.id,
            work_order_number = %created.work_order_number,
            priority = %priority,
            asset_id = ?created.asset_id,
            "Created work order"
        );

        Ok(WorkOrderDetails {
            work_order: created,
            active_sessions: Vec::new(),
        })
    }

    #[instrument(skip_all, fields(tenant_id = %actor.tenant_id, work_order_id = %id))]
    pub async fn update(
        &self,
        actor: &ActorContext,
        id: Uuid,
        changes: WorkOrderUpdate,
    ) -> Result<WorkOrderDetails, DomainError> {
        let title = changes.title.as_deref().map(required_title).transpose()?;
        let now = Utc::now();

        let txn = self.db.begin().await?;
        let repo = WorkOrderRepository::new(&txn);

        let current = repo
            .find(actor.tenant_id, id)
            .await?
            .ok_or_else(|| DomainError::not_found(ENTITY))?;

        if let Some(Some(asset_id)) = changes.asset_id {
            assets::ensure_exists(&txn, actor.tenant_id, asset_id).await?;
        }

        let old_asset_id = current.asset_id;
        let mut work_order: ActiveModel = current.clone().into();
        let mut transition: Option<StatusChange> = None;

        if let Some(to) = changes.status {
            let context = TransitionContext {
                actor: actor.user_id,
                current_assignee: current.assigned_to_user_id,
                now,
                completed_at_override: changes.completed_at.flatten(),
                reassign_on_start: self.policy.reassign_on_start,
            };

            match plan_transition(stored_status(&current), to, &context)? {
                Some(change) => {
                    apply_status_change(&mut work_order, &change);
                    transition = Some(change);
                }
                None if current.status != to.as_str() => {
                    work_order.status = Set(to.as_str().to_string());
                }
                None => {}
            }
        }

        let completing = matches!(
            transition,
            Some(StatusChange {
                to: WorkOrderStatus::Completed,
                ..
            })
        );
        if let Some(completed_at) = changes.completed_at
            && !completing
        {
            work_order.completed_at = Set(completed_at.map(|at| at.fixed_offset()));
        }

        if let Some(title) = title {
            work_order.title = Set(title);
        }
        if let Some(description) = changes.description {
            work_order.description = Set(description);
        }
        if let Some(priority) = changes.priority {
            work_order.priority = Set(priority.as_str().to_string());
        }
        if let Some(asset_id) = changes.asset_id {
            work_order.asset_id = Set(asset_id);
        }
        if let Some(notes) = changes.completion_notes {
            work_order.completion_notes = Set(notes);
        }
        if let Some(signed_by_name) = changes.signed_by_name {
            work_order.signed_by_name = Set(signed_by_name);
        }
        work_order.updated_at = Set(now.fixed_offset());

        let updated = repo.update(work_order).await?;

        asset_status::sync(&txn, actor.tenant_id, old_asset_id).await?;
        if updated.asset_id != old_asset_id {
            asset_status::sync(&txn, actor.tenant_id, updated.asset_id).await?;
        }

        txn.commit().await?;

        if let Some(change) = &transition {
            counter!(
                "work_order_transitions_total",
                "from" => change.from.as_str(),
                "to" => change.to.as_str()
            )
            .increment(1);
            info!(from = %change.from, to = %change.to, "Work order status changed");
        } else {
            debug!("Updated work order");
        }

        load_details(self.db, actor.tenant_id, updated).await
    }

    /// Remove a work order, its sessions and its influence on the asset.
    #[instrument(skip_all, fields(tenant_id = %actor.tenant_id, work_order_id = %id))]
    pub async fn delete(&self, actor: &ActorContext, id: Uuid) -> Result<(), DomainError> {
        if !actor.role.can_delete_work_orders() {
            warn!(role = %actor.role, "Rejected work order delete");
            return Err(DomainError::PermissionDenied(
                "only admins, managers and owners can delete work orders".to_string(),
            ));
        }

        let txn = self.db.begin().await?;
        let repo = WorkOrderRepository::new(&txn);

        let work_order = repo
            .find(actor.tenant_id, id)
            .await?
            .ok_or_else(|| DomainError::not_found(ENTITY))?;

        let sessions = WorkOrderSessionRepository::new(&txn)
            .delete_for_work_order(actor.tenant_id, id)
            .await?;
        repo.delete(actor.tenant_id, id).await?;
        asset_status::sync(&txn, actor.tenant_id, work_order.asset_id).await?;

        txn.commit().await?;

        info!(
            work_order_number = %work_order.work_order_number,
            sessions_removed = sessions,
            "Deleted work order"
        );
        Ok(())
    }

    pub async fn get(&self, tenant_id: Uuid, id: Uuid) -> Result<WorkOrderDetails, DomainError> {
        let work_order = WorkOrderRepository::new(self.db)
            .find(tenant_id, id)
            .await?
            .ok_or_else(|| DomainError::not_found(ENTITY))?;

        load_details(self.db, tenant_id, work_order).await
    }

    pub async fn list(
        &self,
        tenant_id: Uuid,
        filter: &WorkOrderFilter,
    ) -> Result<Vec<WorkOrderDetails>, DomainError> {
        let work_orders = WorkOrderRepository::new(self.db)
            .list(tenant_id, filter)
            .await?;

        let ids: Vec<Uuid> = work_orders.iter().map(|wo| wo.id).collect();
        let mut sessions_by_work_order: HashMap<Uuid, Vec<work_order_session::Model>> =
            HashMap::new();
        for session in WorkOrderSessionRepository::new(self.db)
            .active_for(tenant_id, &ids)
            .await?
        {
            sessions_by_work_order
                .entry(session.work_order_id)
                .or_default()
                .push(session);
        }

        Ok(work_orders
            .into_iter()
            .map(|work_order| WorkOrderDetails {
                active_sessions: sessions_by_work_order
                    .remove(&work_order.id)
                    .unwrap_or_default(),
                work_order,
            })
            .collect())
    }

    /// Open a presence session for the actor. Joining twice is a no-op.
    #[instrument(skip_all, fields(tenant_id = %actor.tenant_id, work_order_id = %id, user_id = %actor.user_id))]
    pub async fn join(&self, actor: &ActorContext, id: Uuid) -> Result<WorkOrderDetails, DomainError> {
        let txn = self.db.begin().await?;

        let work_order = WorkOrderRepository::new(&txn)
            .find(actor.tenant_id, id)
            .await?
            .ok_or_else(|| DomainError::not_found(ENTITY))?;

        let sessions = WorkOrderSessionRepository::new(&txn);
        if sessions
            .find_active(actor.tenant_id, id, actor.user_id)
            .await?
            .is_none()
        {
            match sessions
                .open(actor.tenant_id, id, actor.user_id, Utc::now())
                .await
            {
                Ok(session) => debug!(session_id = %session.id, "Joined work order"),
                Err(err) if is_unique_violation(&err) => {
                    debug!("Concurrent join already opened a session");
                    txn.rollback().await?;
                    return load_details(self.db, actor.tenant_id, work_order).await;
                }
                Err(err) => return Err(err.into()),
            }
        }

        txn.commit().await?;
        load_details(self.db, actor.tenant_id, work_order).await
    }

    /// Close the actor's open sessions. Leaving without joining is a no-op.
    #[instrument(skip_all, fields(tenant_id = %actor.tenant_id, work_order_id = %id, user_id = %actor.user_id))]
    pub async fn leave(&self, actor: &ActorContext, id: Uuid) -> Result<WorkOrderDetails, DomainError> {
        let work_order = WorkOrderRepository::new(self.db)
            .find(actor.tenant_id, id)
            .await?
            .ok_or_else(|| DomainError::not_found(ENTITY))?;

        let closed = WorkOrderSessionRepository::new(self.db)
            .close_active(actor.tenant_id, id, actor.user_id, Utc::now())
            .await?;
        debug!(closed, "Left work order");

        load_details(self.db, actor.tenant_id, work_order).await
    }

    #[instrument(skip_all, fields(tenant_id = %tenant_id))]
    pub async fn stats(&self, tenant_id: Uuid) -> Result<WorkOrderStats, DomainError> {
        let repo = WorkOrderRepository::new(self.db);
        let start_of_today = Utc::now().date_naive().and_time(NaiveTime::MIN).and_utc();

        let by_status = to_counts(repo.count_active_by_status(tenant_id).await?);
        let by_priority = to_counts(repo.count_active_by_priority(tenant_id).await?);
        let active_total = by_status.values().sum();
        let completed_today = repo.count_completed_since(tenant_id, start_of_today).await?;
        let total = repo.count_all(tenant_id).await?;

        let mut stats = WorkOrderStats {
            active_total,
            total,
            by_status,
            by_priority,
        };
        stats.by_status.insert(
            WorkOrderStatus::Completed.as_str().to_string(),
            completed_today,
        );

        Ok(stats)
    }

    /// Insert with a fresh number per attempt, each attempt in its own savepoint.
    async fn insert_numbered(
        &self,
        txn: &DatabaseTransaction,
        mut work_order: ActiveModel,
    ) -> Result<Model, DomainError> {
        let attempts = self.policy.number_attempts.max(1);

        for attempt in 1..=attempts {
            let number = (self.number_fn)(Utc::now());
            work_order.work_order_number = Set(number.clone());

            let savepoint = txn.begin().await?;
            match WorkOrderRepository::new(&savepoint)
                .insert(work_order.clone())
                .await
            {
                Ok(created) => {
                    savepoint.commit().await?;
                    return Ok(created);
                }
                Err(err) if is_unique_violation(&err) => {
                    savepoint.rollback().await?;
                    warn!(attempt, work_order_number = %number, "Work order number already taken");
                }
                Err(err) => return Err(err.into()),
            }
        }

        Err(DomainError::Conflict(format!(
            "could not allocate a unique work order number after {attempts} attempts"
        )))
    }
}

fn required_title(raw: &str) -> Result<String, DomainError> {
    let title = raw.trim();
    if title.is_empty() {
        return Err(DomainError::validation("title", "title must not be empty"));
    }
    Ok(title.to_string())
}

fn stored_status(work_order: &Model) -> WorkOrderStatus {
    work_order.status.parse().unwrap_or_else(|err| {
        warn!(
            work_order_id = %work_order.id,
            error = %err,
            "Unrecognised stored status, treating as new"
        );
        WorkOrderStatus::New
    })
}

fn apply_status_change(work_order: &mut ActiveModel, change: &StatusChange) {
    work_order.status = Set(change.to.as_str().to_string());
    if let Some(assignee) = change.assigned_to {
        work_order.assigned_to_user_id = Set(Some(assignee));
    }
    if let Some(started_at) = change.started_at {
        work_order.started_at = Set(Some(started_at.fixed_offset()));
    }
    if let Some(completed_by) = change.completed_by {
        work_order.completed_by_user_id = Set(Some(completed_by));
    }
    if let Some(completed_at) = change.completed_at {
        work_order.completed_at = Set(Some(completed_at.fixed_offset()));
    }
}

fn to_counts(rows: Vec<(String, i64)>) -> BTreeMap<String, u64> {
    rows.into_iter()
        .map(|(key, count)| (key, count.max(0) as u64))
        .collect()
}

async fn load_details<C: ConnectionTrait>(
    conn: &C,
    tenant_id: Uuid,
    work_order: Model,
) -> Result<WorkOrderDetails, DomainError> {
    let active_sessions = WorkOrderSessionRepository::new(conn)
        .active_for(tenant_id, &[work_order.id])
        .await?;

    Ok(WorkOrderDetails {
        work_order,
        active_sessions,
    })
}
