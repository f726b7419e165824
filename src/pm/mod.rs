//! # PM Scheduling Engine
//!
//! Preventive-maintenance schedules recur on a fixed cadence. Signing one off
//! appends a log row and moves `next_due` forward by one period, both in the
//! same transaction.

pub mod cadence;

use chrono::{DateTime, Utc};
use metrics::counter;
use sea_orm::{ConnectionTrait, DatabaseConnection, Set, TransactionTrait};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::assets;
use crate::auth::ActorContext;
use crate::error::DomainError;
use crate::models::pm_log::{ActiveModel as PmLogActiveModel, Model as PmLogModel};
use crate::models::pm_schedule::{ActiveModel, Model};
use crate::repositories::{PmScheduleFilter, PmScheduleRepository, UserRepository};

use self::cadence::Cadence;

const ENTITY: &str = "pm schedule";

/// Input for [`PmService::create`]. Unset fields take the schedule defaults.
#[derive(Debug, Clone, Default)]
pub struct NewPmSchedule {
    pub title: String,
    pub description: Option<String>,
    pub asset_id: Option<Uuid>,
    pub frequency_type: Option<String>,
    pub frequency_interval: Option<i32>,
    pub next_due: Option<DateTime<Utc>>,
    pub assigned_to_user_id: Option<Uuid>,
    pub is_active: Option<bool>,
}

/// Partial update. `None` leaves a field untouched, `Some(None)` clears it.
#[derive(Debug, Clone, Default)]
pub struct PmScheduleUpdate {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub asset_id: Option<Option<Uuid>>,
    pub frequency_type: Option<String>,
    pub frequency_interval: Option<i32>,
    pub next_due: Option<Option<DateTime<Utc>>>,
    pub assigned_to_user_id: Option<Option<Uuid>>,
    pub is_active: Option<bool>,
}

/// Result of a sign-off.
#[derive(Debug, Clone, PartialEq)]
pub struct SignOff {
    pub schedule: Model,
    pub log: PmLogModel,
    pub next_due: DateTime<Utc>,
}

pub struct PmService<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> PmService<'a> {
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    #[instrument(skip_all, fields(tenant_id = %actor.tenant_id))]
    pub async fn create(
        &self,
        actor: &ActorContext,
        input: NewPmSchedule,
    ) -> Result<Model, DomainError> {
        let title = required_title(&input.title)?;
        let frequency_type = match input.frequency_type.as_deref() {
            Some(raw) => parse_frequency(raw)?,
            None => Cadence::Days,
        };
        let frequency_interval =
            validate_interval(frequency_type, input.frequency_interval.unwrap_or(1))?;

        if let Some(asset_id) = input.asset_id {
            assets::ensure_exists(self.db, actor.tenant_id, asset_id).await?;
        }
        if let Some(user_id) = input.assigned_to_user_id {
            ensure_user(self.db, actor.tenant_id, user_id).await?;
        }

        let now = Utc::now();
        let schedule = ActiveModel {
            id: Set(Uuid::new_v4()),
            tenant_id: Set(actor.tenant_id),
            asset_id: Set(input.asset_id),
            title: Set(title),
            description: Set(input.description),
            frequency_type: Set(frequency_type.as_str().to_string()),
            frequency_interval: Set(frequency_interval),
            last_performed: Set(None),
            next_due: Set(Some(input.next_due.unwrap_or(now).fixed_offset())),
            assigned_to_user_id: Set(input.assigned_to_user_id),
            is_active: Set(input.is_active.unwrap_or(true)),
            created_at: Set(now.fixed_offset()),
            updated_at: Set(now.fixed_offset()),
        };

        let created = PmScheduleRepository::new(self.db).insert(schedule).await?;
        info!(
            pm_schedule_id = %created.id,
            frequency_type = %created.frequency_type,
            frequency_interval = created.frequency_interval,
            "Created PM schedule"
        );
        Ok(created)
    }

    pub async fn get(&self, tenant_id: Uuid, id: Uuid) -> Result<Model, DomainError> {
        PmScheduleRepository::new(self.db)
            .find(tenant_id, id)
            .await?
            .ok_or_else(|| DomainError::not_found(ENTITY))
    }

    pub async fn list(
        &self,
        tenant_id: Uuid,
        filter: &PmScheduleFilter,
    ) -> Result<Vec<Model>, DomainError> {
        Ok(PmScheduleRepository::new(self.db)
            .list(tenant_id, filter)
            .await?)
    }

    #[instrument(skip_all, fields(tenant_id = %actor.tenant_id, pm_schedule_id = %id))]
    pub async fn update(
        &self,
        actor: &ActorContext,
        id: Uuid,
        changes: PmScheduleUpdate,
    ) -> Result<Model, DomainError> {
        let repo = PmScheduleRepository::new(self.db);
        let current = repo
            .find(actor.tenant_id, id)
            .await?
            .ok_or_else(|| DomainError::not_found(ENTITY))?;

        let frequency_type = changes
            .frequency_type
            .as_deref()
            .map(parse_frequency)
            .transpose()?;
        if frequency_type.is_some() || changes.frequency_interval.is_some() {
            let frequency = match frequency_type {
                Some(frequency) => frequency,
                None => Cadence::parse(&current.frequency_type).unwrap_or(Cadence::Days),
            };
            validate_interval(
                frequency,
                changes.frequency_interval.unwrap_or(current.frequency_interval),
            )?;
        }

        let mut schedule: ActiveModel = current.into();

        if let Some(title) = changes.title.as_deref() {
            schedule.title = Set(required_title(title)?);
        }
        if let Some(description) = changes.description {
            schedule.description = Set(description);
        }
        if let Some(frequency_type) = frequency_type {
            schedule.frequency_type = Set(frequency_type.as_str().to_string());
        }
        if let Some(interval) = changes.frequency_interval {
            schedule.frequency_interval = Set(interval);
        }
        if let Some(asset_id) = changes.asset_id {
            if let Some(asset_id) = asset_id {
                assets::ensure_exists(self.db, actor.tenant_id, asset_id).await?;
            }
            schedule.asset_id = Set(asset_id);
        }
        if let Some(user_id) = changes.assigned_to_user_id {
            if let Some(user_id) = user_id {
                ensure_user(self.db, actor.tenant_id, user_id).await?;
            }
            schedule.assigned_to_user_id = Set(user_id);
        }
        if let Some(next_due) = changes.next_due {
            schedule.next_due = Set(next_due.map(|at| at.fixed_offset()));
        }
        if let Some(is_active) = changes.is_active {
            schedule.is_active = Set(is_active);
        }
        schedule.updated_at = Set(Utc::now().fixed_offset());

        let updated = repo.update(schedule).await?;
        info!("Updated PM schedule");
        Ok(updated)
    }

    /// Delete a schedule together with its sign-off history.
    #[instrument(skip_all, fields(tenant_id = %actor.tenant_id, pm_schedule_id = %id))]
    pub async fn delete(&self, actor: &ActorContext, id: Uuid) -> Result<(), DomainError> {
        let txn = self.db.begin().await?;
        let repo = PmScheduleRepository::new(&txn);

        if repo.find(actor.tenant_id, id).await?.is_none() {
            return Err(DomainError::not_found(ENTITY));
        }

        let logs = repo.delete_logs(actor.tenant_id, id).await?;
        repo.delete(actor.tenant_id, id).await?;
        txn.commit().await?;

        info!(logs_removed = logs, "Deleted PM schedule");
        Ok(())
    }

    /// Record that the maintenance was performed and roll `next_due` forward.
    #[instrument(skip_all, fields(tenant_id = %actor.tenant_id, pm_schedule_id = %id, user_id = %actor.user_id))]
    pub async fn sign_off(
        &self,
        actor: &ActorContext,
        id: Uuid,
        notes: Option<String>,
    ) -> Result<SignOff, DomainError> {
        let now = Utc::now();
        let txn = self.db.begin().await?;
        let repo = PmScheduleRepository::new(&txn);

        let schedule = repo
            .find(actor.tenant_id, id)
            .await?
            .ok_or_else(|| DomainError::not_found(ENTITY))?;

        let log = repo
            .insert_log(PmLogActiveModel {
                id: Set(Uuid::new_v4()),
                tenant_id: Set(actor.tenant_id),
                pm_schedule_id: Set(schedule.id),
                completed_at: Set(now.fixed_offset()),
                completed_by_user_id: Set(Some(actor.user_id)),
                notes: Set(notes),
            })
            .await?;

        if Cadence::parse(&schedule.frequency_type).is_err() {
            warn!(
                frequency_type = %schedule.frequency_type,
                frequency_interval = schedule.frequency_interval,
                "Unrecognised frequency type, advancing by interval days"
            );
        }
        let current_due = schedule
            .next_due
            .map(|due| due.with_timezone(&Utc))
            .unwrap_or(now);
        let Some(next_due) = cadence::advance(
            current_due,
            &schedule.frequency_type,
            schedule.frequency_interval,
        ) else {
            warn!(
                frequency_type = %schedule.frequency_type,
                frequency_interval = schedule.frequency_interval,
                "Next due date out of range, rolling back sign-off"
            );
            txn.rollback().await?;
            return Err(DomainError::validation(
                "frequency_interval",
                "next due date is out of range",
            ));
        };

        let mut active: ActiveModel = schedule.into();
        active.next_due = Set(Some(next_due.fixed_offset()));
        active.last_performed = Set(Some(now.fixed_offset()));
        active.updated_at = Set(now.fixed_offset());
        let schedule = repo.update(active).await?;

        txn.commit().await?;

        counter!("pm_sign_offs_total").increment(1);
        info!(
            pm_log_id = %log.id,
            next_due = %next_due,
            "Signed off PM schedule"
        );

        Ok(SignOff {
            schedule,
            log,
            next_due,
        })
    }

    /// Sign-off history, newest first.
    pub async fn list_logs(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        skip: u64,
        limit: u64,
    ) -> Result<Vec<PmLogModel>, DomainError> {
        let repo = PmScheduleRepository::new(self.db);
        if repo.find(tenant_id, id).await?.is_none() {
            return Err(DomainError::not_found(ENTITY));
        }

        Ok(repo.list_logs(tenant_id, id, skip, limit).await?)
    }
}

fn required_title(raw: &str) -> Result<String, DomainError> {
    let title = raw.trim();
    if title.is_empty() {
        return Err(DomainError::validation("title", "title must not be empty"));
    }
    Ok(title.to_string())
}

fn parse_frequency(raw: &str) -> Result<Cadence, DomainError> {
    Cadence::parse(raw).map_err(|err| DomainError::validation("frequency_type", err.to_string()))
}

fn validate_interval(frequency: Cadence, interval: i32) -> Result<i32, DomainError> {
    if interval < 1 {
        return Err(DomainError::validation(
            "frequency_interval",
            "frequency_interval must be at least 1",
        ));
    }
    if frequency.period_days(interval) > cadence::MAX_PERIOD_DAYS {
        return Err(DomainError::validation(
            "frequency_interval",
            format!(
                "a {} schedule may span at most {} days",
                frequency.as_str(),
                cadence::MAX_PERIOD_DAYS
            ),
        ));
    }
    Ok(interval)
}

async fn ensure_user<C: ConnectionTrait>(
    conn: &C,
    tenant_id: Uuid,
    user_id: Uuid,
) -> Result<(), DomainError> {
    match UserRepository::new(conn)
        .find_in_tenant(tenant_id, user_id)
        .await?
    {
        Some(_) => Ok(()),
        None => Err(DomainError::validation(
            "assigned_to_user_id",
            "user not found",
        )),
    }
}
