//! Preventive-maintenance scheduling tests.

#[path = "test_utils/mod.rs"]
mod test_utils;

use chrono::{DateTime, Duration, TimeZone, Utc};
use maintenance_api::error::DomainError;
use maintenance_api::models::Role;
use maintenance_api::pm::{NewPmSchedule, PmScheduleUpdate, PmService};
use maintenance_api::models::pm_schedule::ActiveModel as PmScheduleActiveModel;
use maintenance_api::repositories::{PmScheduleFilter, PmScheduleRepository};
use sea_orm::Set;
use test_utils::*;
use uuid::Uuid;

fn utc(y: i32, m: u32, d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, 8, 0, 0).unwrap()
}

fn schedule(title: &str, frequency: &str, next_due: DateTime<Utc>) -> NewPmSchedule {
    NewPmSchedule {
        title: title.to_string(),
        frequency_type: Some(frequency.to_string()),
        next_due: Some(next_due),
        ..NewPmSchedule::default()
    }
}

#[tokio::test]
async fn weekly_sign_off_advances_seven_days() -> anyhow::Result<()> {
    let db = setup_test_db().await?;
    let actor = admin_fixture(&db).await?;
    let pm = PmService::new(&db);
    let due = utc(2024, 1, 15);

    let created = pm
        .create(&actor, schedule("Inspect belts", "weekly", due))
        .await?;
    let signed = pm
        .sign_off(&actor, created.id, Some("All good".to_string()))
        .await?;

    assert_eq!(signed.next_due, due + Duration::days(7));
    assert_eq!(
        signed.schedule.next_due.map(|at| at.with_timezone(&Utc)),
        Some(due + Duration::days(7))
    );
    assert!(signed.schedule.last_performed.is_some());
    assert_eq!(signed.log.pm_schedule_id, created.id);
    assert_eq!(signed.log.completed_by_user_id, Some(actor.user_id));
    assert_eq!(signed.log.notes.as_deref(), Some("All good"));

    let logs = pm.list_logs(actor.tenant_id, created.id, 0, 10).await?;
    assert_eq!(logs.len(), 1);

    Ok(())
}

#[tokio::test]
async fn monthly_uses_thirty_day_period() -> anyhow::Result<()> {
    let db = setup_test_db().await?;
    let actor = admin_fixture(&db).await?;
    let pm = PmService::new(&db);

    let created = pm
        .create(&actor, schedule("Change oil", "monthly", utc(2024, 1, 1)))
        .await?;
    let signed = pm.sign_off(&actor, created.id, None).await?;
    assert_eq!(signed.next_due, utc(2024, 1, 31));

    let signed = pm.sign_off(&actor, created.id, None).await?;
    assert_eq!(signed.next_due, utc(2024, 3, 1));

    Ok(())
}

#[tokio::test]
async fn legacy_units_multiply_interval() -> anyhow::Result<()> {
    let db = setup_test_db().await?;
    let actor = admin_fixture(&db).await?;
    let pm = PmService::new(&db);

    let created = pm
        .create(
            &actor,
            NewPmSchedule {
                frequency_interval: Some(3),
                ..schedule("Filter swap", "weeks", utc(2024, 2, 1))
            },
        )
        .await?;
    let signed = pm.sign_off(&actor, created.id, None).await?;
    assert_eq!(signed.next_due, utc(2024, 2, 22));

    Ok(())
}

#[tokio::test]
async fn create_applies_defaults() -> anyhow::Result<()> {
    let db = setup_test_db().await?;
    let actor = admin_fixture(&db).await?;
    let before = Utc::now() - Duration::seconds(1);

    let created = PmService::new(&db)
        .create(
            &actor,
            NewPmSchedule {
                title: "Daily walkround".to_string(),
                ..NewPmSchedule::default()
            },
        )
        .await?;

    assert_eq!(created.frequency_type, "days");
    assert_eq!(created.frequency_interval, 1);
    assert!(created.is_active);
    assert!(created.last_performed.is_none());
    let next_due = created.next_due.expect("next_due defaults to now");
    assert!(next_due.with_timezone(&Utc) >= before);

    Ok(())
}

#[tokio::test]
async fn invalid_input_is_rejected() -> anyhow::Result<()> {
    let db = setup_test_db().await?;
    let actor = admin_fixture(&db).await?;
    let other = admin_fixture(&db).await?;
    let pm = PmService::new(&db);

    let err = pm
        .create(&actor, schedule("Odd", "fortnightlyish", Utc::now()))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        DomainError::Validation {
            field: "frequency_type",
            ..
        }
    ));

    let err = pm
        .create(
            &actor,
            NewPmSchedule {
                frequency_interval: Some(0),
                ..schedule("Zero", "days", Utc::now())
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        DomainError::Validation {
            field: "frequency_interval",
            ..
        }
    ));

    let err = pm
        .create(
            &actor,
            NewPmSchedule {
                assigned_to_user_id: Some(other.user_id),
                ..schedule("Foreign user", "daily", Utc::now())
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        DomainError::Validation {
            field: "assigned_to_user_id",
            ..
        }
    ));

    let err = pm
        .create(
            &actor,
            NewPmSchedule {
                asset_id: Some(Uuid::new_v4()),
                ..schedule("Missing asset", "daily", Utc::now())
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        DomainError::Validation {
            field: "asset_id",
            ..
        }
    ));

    Ok(())
}

#[tokio::test]
async fn update_changes_cadence_and_assignment() -> anyhow::Result<()> {
    let db = setup_test_db().await?;
    let actor = admin_fixture(&db).await?;
    let technician = create_actor(&db, actor.tenant_id, Role::Technician).await?;
    let pm = PmService::new(&db);

    let created = pm
        .create(&actor, schedule("Grease", "weekly", utc(2024, 5, 1)))
        .await?;

    let updated = pm
        .update(
            &actor,
            created.id,
            PmScheduleUpdate {
                frequency_type: Some("Six Monthly".to_string()),
                assigned_to_user_id: Some(Some(technician.user_id)),
                description: Some(Some("Both bearings".to_string())),
                ..PmScheduleUpdate::default()
            },
        )
        .await?;
    assert_eq!(updated.frequency_type, "6 monthly");
    assert_eq!(updated.assigned_to_user_id, Some(technician.user_id));
    assert_eq!(updated.description.as_deref(), Some("Both bearings"));

    let cleared = pm
        .update(
            &actor,
            created.id,
            PmScheduleUpdate {
                assigned_to_user_id: Some(None),
                is_active: Some(false),
                ..PmScheduleUpdate::default()
            },
        )
        .await?;
    assert_eq!(cleared.assigned_to_user_id, None);
    assert!(!cleared.is_active);
    assert_eq!(cleared.description.as_deref(), Some("Both bearings"));

    let signed = pm.sign_off(&actor, created.id, None).await?;
    assert_eq!(signed.next_due, utc(2024, 5, 1) + Duration::days(182));

    Ok(())
}

#[tokio::test]
async fn list_filters_by_asset_and_activity() -> anyhow::Result<()> {
    let db = setup_test_db().await?;
    let actor = admin_fixture(&db).await?;
    let compressor = create_asset(&db, &actor, "COMP-01").await?;
    let pm = PmService::new(&db);

    pm.create(
        &actor,
        NewPmSchedule {
            asset_id: Some(compressor.id),
            ..schedule("Drain tank", "daily", utc(2024, 1, 2))
        },
    )
    .await?;
    pm.create(&actor, schedule("Fire drill", "yearly", utc(2024, 1, 1)))
        .await?;
    pm.create(
        &actor,
        NewPmSchedule {
            is_active: Some(false),
            ..schedule("Retired", "monthly", utc(2024, 1, 3))
        },
    )
    .await?;

    let all = pm
        .list(
            actor.tenant_id,
            &PmScheduleFilter {
                limit: 10,
                ..PmScheduleFilter::default()
            },
        )
        .await?;
    assert_eq!(all.len(), 3);
    assert_eq!(all[0].title, "Fire drill");

    let for_asset = pm
        .list(
            actor.tenant_id,
            &PmScheduleFilter {
                asset_id: Some(compressor.id),
                limit: 10,
                ..PmScheduleFilter::default()
            },
        )
        .await?;
    assert_eq!(for_asset.len(), 1);
    assert_eq!(for_asset[0].title, "Drain tank");

    let active = pm
        .list(
            actor.tenant_id,
            &PmScheduleFilter {
                is_active: Some(true),
                limit: 10,
                ..PmScheduleFilter::default()
            },
        )
        .await?;
    assert_eq!(active.len(), 2);

    Ok(())
}

#[tokio::test]
async fn delete_removes_schedule_and_history() -> anyhow::Result<()> {
    let db = setup_test_db().await?;
    let actor = admin_fixture(&db).await?;
    let pm = PmService::new(&db);

    let created = pm
        .create(&actor, schedule("Test alarms", "quarterly", utc(2024, 4, 1)))
        .await?;
    pm.sign_off(&actor, created.id, None).await?;
    pm.sign_off(&actor, created.id, Some("second".to_string()))
        .await?;

    let logs = pm.list_logs(actor.tenant_id, created.id, 0, 10).await?;
    assert_eq!(logs.len(), 2);
    assert!(logs[0].completed_at >= logs[1].completed_at);

    pm.delete(&actor, created.id).await?;

    assert!(matches!(
        pm.get(actor.tenant_id, created.id).await,
        Err(DomainError::NotFound { .. })
    ));
    assert!(matches!(
        pm.list_logs(actor.tenant_id, created.id, 0, 10).await,
        Err(DomainError::NotFound { .. })
    ));
    let orphaned = PmScheduleRepository::new(&db)
        .list_logs(actor.tenant_id, created.id, 0, 10)
        .await?;
    assert!(orphaned.is_empty());

    Ok(())
}

#[tokio::test]
async fn schedules_are_tenant_isolated() -> anyhow::Result<()> {
    let db = setup_test_db().await?;
    let actor = admin_fixture(&db).await?;
    let intruder = admin_fixture(&db).await?;
    let pm = PmService::new(&db);

    let created = pm
        .create(&actor, schedule("Private", "daily", utc(2024, 1, 1)))
        .await?;

    assert!(matches!(
        pm.get(intruder.tenant_id, created.id).await,
        Err(DomainError::NotFound { .. })
    ));
    assert!(matches!(
        pm.sign_off(&intruder, created.id, None).await,
        Err(DomainError::NotFound { .. })
    ));
    assert!(matches!(
        pm.delete(&intruder, created.id).await,
        Err(DomainError::NotFound { .. })
    ));

    let untouched = pm.get(actor.tenant_id, created.id).await?;
    assert!(untouched.last_performed.is_none());

    Ok(())
}

#[tokio::test]
async fn intervals_beyond_a_century_are_rejected() -> anyhow::Result<()> {
    let db = setup_test_db().await?;
    let actor = admin_fixture(&db).await?;
    let pm = PmService::new(&db);

    let err = pm
        .create(
            &actor,
            NewPmSchedule {
                frequency_interval: Some(1_000_000),
                ..schedule("Forever", "years", utc(2024, 1, 1))
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        DomainError::Validation {
            field: "frequency_interval",
            ..
        }
    ));

    let created = pm
        .create(
            &actor,
            NewPmSchedule {
                frequency_interval: Some(100),
                ..schedule("Centennial", "years", utc(2024, 1, 1))
            },
        )
        .await?;

    let err = pm
        .update(
            &actor,
            created.id,
            PmScheduleUpdate {
                frequency_interval: Some(101),
                ..PmScheduleUpdate::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        DomainError::Validation {
            field: "frequency_interval",
            ..
        }
    ));

    let err = pm
        .update(
            &actor,
            created.id,
            PmScheduleUpdate {
                frequency_type: Some("months".to_string()),
                ..PmScheduleUpdate::default()
            },
        )
        .await;
    assert!(err.is_ok(), "100 months fits within the bound");

    Ok(())
}

#[tokio::test]
async fn sign_off_with_out_of_range_due_date_fails_cleanly() -> anyhow::Result<()> {
    let db = setup_test_db().await?;
    let actor = admin_fixture(&db).await?;
    let pm = PmService::new(&db);
    let due = utc(2024, 1, 1);

    let created = pm
        .create(&actor, schedule("Legacy import", "years", due))
        .await?;

    // Rows written outside the API can carry any interval.
    let repo = PmScheduleRepository::new(&db);
    let mut legacy: PmScheduleActiveModel = created.clone().into();
    legacy.frequency_interval = Set(1_000_000);
    repo.update(legacy).await?;

    let err = pm.sign_off(&actor, created.id, None).await.unwrap_err();
    assert!(matches!(
        err,
        DomainError::Validation {
            field: "frequency_interval",
            ..
        }
    ));

    let untouched = pm.get(actor.tenant_id, created.id).await?;
    assert_eq!(
        untouched.next_due.map(|at| at.with_timezone(&Utc)),
        Some(due)
    );
    assert!(untouched.last_performed.is_none());
    assert!(pm.list_logs(actor.tenant_id, created.id, 0, 10).await?.is_empty());

    Ok(())
}
