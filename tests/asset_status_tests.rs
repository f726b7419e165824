//! Asset status synchronizer and asset management tests.

#[path = "test_utils/mod.rs"]
mod test_utils;

use maintenance_api::asset_status::{self, SyncOutcome};
use maintenance_api::assets::{AssetService, AssetUpdate, NewAsset};
use maintenance_api::error::DomainError;
use maintenance_api::models::{AssetStatus, Priority, WorkOrderStatus};
use maintenance_api::pm::{NewPmSchedule, PmService};
use maintenance_api::repositories::AssetRepository;
use maintenance_api::work_orders::{NewWorkOrder, WorkOrderService, WorkOrderUpdate};
use test_utils::*;
use uuid::Uuid;

#[tokio::test]
async fn critical_work_order_breaks_down_asset_until_removed() -> anyhow::Result<()> {
    let db = setup_test_db().await?;
    let actor = admin_fixture(&db).await?;
    let pump = create_asset(&db, &actor, "PUMP-001").await?;
    assert_eq!(pump.status, "Healthy");
    let policy = policy();
    let work_orders = WorkOrderService::new(&db, &policy);
    let assets = AssetService::new(&db);

    let id = work_orders
        .create(
            &actor,
            NewWorkOrder {
                title: "Fix Pump".to_string(),
                priority: Some(Priority::Critical),
                asset_id: Some(pump.id),
                ..NewWorkOrder::default()
            },
        )
        .await?
        .work_order
        .id;
    assert_eq!(assets.get(actor.tenant_id, pump.id).await?.status, "Breakdown");

    work_orders.delete(&actor, id).await?;
    assert_eq!(assets.get(actor.tenant_id, pump.id).await?.status, "Healthy");

    Ok(())
}

#[tokio::test]
async fn only_active_work_orders_count() -> anyhow::Result<()> {
    let db = setup_test_db().await?;
    let actor = admin_fixture(&db).await?;
    let press = create_asset(&db, &actor, "PRESS-01").await?;
    let policy = policy();
    let work_orders = WorkOrderService::new(&db, &policy);
    let assets = AssetService::new(&db);

    work_orders
        .create(
            &actor,
            NewWorkOrder {
                title: "Squeak".to_string(),
                priority: Some(Priority::Low),
                asset_id: Some(press.id),
                ..NewWorkOrder::default()
            },
        )
        .await?;
    let high = work_orders
        .create(
            &actor,
            NewWorkOrder {
                title: "Hydraulic leak".to_string(),
                priority: Some(Priority::Critical),
                asset_id: Some(press.id),
                ..NewWorkOrder::default()
            },
        )
        .await?
        .work_order
        .id;
    assert_eq!(assets.get(actor.tenant_id, press.id).await?.status, "Breakdown");

    for status in [WorkOrderStatus::InProgress, WorkOrderStatus::Completed] {
        work_orders
            .update(
                &actor,
                high,
                WorkOrderUpdate {
                    status: Some(status),
                    ..WorkOrderUpdate::default()
                },
            )
            .await?;
    }

    assert_eq!(
        assets.get(actor.tenant_id, press.id).await?.status,
        "Running with issues"
    );
    Ok(())
}

#[tokio::test]
async fn priority_change_is_reflected() -> anyhow::Result<()> {
    let db = setup_test_db().await?;
    let actor = admin_fixture(&db).await?;
    let fan = create_asset(&db, &actor, "FAN-01").await?;
    let policy = policy();
    let work_orders = WorkOrderService::new(&db, &policy);

    let id = work_orders
        .create(
            &actor,
            NewWorkOrder {
                title: "Rattle".to_string(),
                priority: Some(Priority::Medium),
                asset_id: Some(fan.id),
                ..NewWorkOrder::default()
            },
        )
        .await?
        .work_order
        .id;

    work_orders
        .update(
            &actor,
            id,
            WorkOrderUpdate {
                priority: Some(Priority::Critical),
                ..WorkOrderUpdate::default()
            },
        )
        .await?;

    let stored = AssetService::new(&db).get(actor.tenant_id, fan.id).await?;
    assert_eq!(stored.status, "Breakdown");
    Ok(())
}

#[tokio::test]
async fn sync_is_idempotent_and_repairs_manual_edits() -> anyhow::Result<()> {
    let db = setup_test_db().await?;
    let actor = admin_fixture(&db).await?;
    let conveyor = create_asset(&db, &actor, "CONV-01").await?;

    let outcome = asset_status::sync_standalone(&db, actor.tenant_id, conveyor.id).await?;
    assert_eq!(outcome, SyncOutcome::Unchanged(AssetStatus::Healthy));

    AssetService::new(&db)
        .update(
            &actor,
            conveyor.id,
            AssetUpdate {
                status: Some(AssetStatus::Breakdown),
                ..AssetUpdate::default()
            },
        )
        .await?;

    let outcome = asset_status::sync_standalone(&db, actor.tenant_id, conveyor.id).await?;
    assert_eq!(
        outcome,
        SyncOutcome::Updated {
            from: "Breakdown".to_string(),
            to: AssetStatus::Healthy,
        }
    );

    let again = asset_status::sync_standalone(&db, actor.tenant_id, conveyor.id).await?;
    assert_eq!(again, SyncOutcome::Unchanged(AssetStatus::Healthy));
    assert_eq!(again.status(), Some(AssetStatus::Healthy));

    Ok(())
}

#[tokio::test]
async fn legacy_status_text_is_canonicalised() -> anyhow::Result<()> {
    let db = setup_test_db().await?;
    let actor = admin_fixture(&db).await?;
    let boiler = create_asset(&db, &actor, "BOIL-01").await?;

    AssetRepository::new(&db)
        .set_status(actor.tenant_id, boiler.id, "healthy")
        .await?;

    let outcome = asset_status::sync(&db, actor.tenant_id, Some(boiler.id)).await?;
    assert!(matches!(outcome, SyncOutcome::Updated { ref from, .. } if from == "healthy"));
    assert_eq!(
        AssetService::new(&db).get(actor.tenant_id, boiler.id).await?.status,
        "Healthy"
    );
    Ok(())
}

#[tokio::test]
async fn missing_or_absent_asset_is_not_an_error() -> anyhow::Result<()> {
    let db = setup_test_db().await?;
    let actor = admin_fixture(&db).await?;
    let other = admin_fixture(&db).await?;
    let foreign = create_asset(&db, &other, "FOREIGN").await?;

    assert_eq!(
        asset_status::sync(&db, actor.tenant_id, None).await?,
        SyncOutcome::Skipped
    );
    assert_eq!(
        asset_status::sync(&db, actor.tenant_id, Some(Uuid::new_v4())).await?,
        SyncOutcome::AssetMissing
    );
    assert_eq!(
        asset_status::sync(&db, actor.tenant_id, Some(foreign.id)).await?,
        SyncOutcome::AssetMissing
    );
    assert_eq!(SyncOutcome::Skipped.status(), None);

    Ok(())
}

#[tokio::test]
async fn asset_codes_are_unique_per_tenant() -> anyhow::Result<()> {
    let db = setup_test_db().await?;
    let actor = admin_fixture(&db).await?;
    let other = admin_fixture(&db).await?;
    let assets = AssetService::new(&db);

    create_asset(&db, &actor, "DUP-01").await?;
    let err = assets
        .create(
            &actor,
            NewAsset {
                name: "Second".to_string(),
                code: "DUP-01".to_string(),
                ..NewAsset::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Conflict(_)));

    // Another tenant may reuse the code.
    create_asset(&db, &other, "DUP-01").await?;

    let err = assets
        .create(
            &actor,
            NewAsset {
                name: " ".to_string(),
                code: "X".to_string(),
                ..NewAsset::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Validation { field: "name", .. }));

    Ok(())
}

#[tokio::test]
async fn deleting_asset_unlinks_work_orders_and_schedules() -> anyhow::Result<()> {
    let db = setup_test_db().await?;
    let actor = admin_fixture(&db).await?;
    let mixer = create_asset(&db, &actor, "MIX-01").await?;
    let policy = policy();
    let work_orders = WorkOrderService::new(&db, &policy);
    let pm = PmService::new(&db);
    let assets = AssetService::new(&db);

    let work_order = work_orders
        .create(
            &actor,
            NewWorkOrder {
                title: "Blade wear".to_string(),
                priority: Some(Priority::High),
                asset_id: Some(mixer.id),
                ..NewWorkOrder::default()
            },
        )
        .await?
        .work_order;
    let schedule = pm
        .create(
            &actor,
            NewPmSchedule {
                title: "Lubricate gearbox".to_string(),
                asset_id: Some(mixer.id),
                frequency_type: Some("monthly".to_string()),
                ..NewPmSchedule::default()
            },
        )
        .await?;

    assets.delete(&actor, mixer.id).await?;

    assert!(matches!(
        assets.get(actor.tenant_id, mixer.id).await,
        Err(DomainError::NotFound { .. })
    ));
    let work_order = work_orders.get(actor.tenant_id, work_order.id).await?;
    assert_eq!(work_order.work_order.asset_id, None);
    assert_eq!(pm.get(actor.tenant_id, schedule.id).await?.asset_id, None);

    let err = assets.delete(&actor, mixer.id).await.unwrap_err();
    assert!(matches!(err, DomainError::NotFound { .. }));

    Ok(())
}

#[tokio::test]
async fn assets_list_is_tenant_scoped() -> anyhow::Result<()> {
    let db = setup_test_db().await?;
    let actor = admin_fixture(&db).await?;
    let other = admin_fixture(&db).await?;

    create_asset(&db, &actor, "B-02").await?;
    create_asset(&db, &actor, "A-01").await?;
    create_asset(&db, &other, "C-03").await?;

    let listed = AssetService::new(&db).list(actor.tenant_id, 0, 10).await?;
    let codes: Vec<&str> = listed.iter().map(|asset| asset.code.as_str()).collect();
    assert_eq!(codes, vec!["A-01", "B-02"]);

    let err = AssetService::new(&db)
        .get(other.tenant_id, listed[0].id)
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::NotFound { .. }));

    Ok(())
}
