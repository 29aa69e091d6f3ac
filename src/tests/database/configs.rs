//! Design Config Database Tests
//!
//! Tests for owner-scoped config metadata and the approval snapshot table.

use serde_json::json;

use crate::database::{
    ApprovedConfigOps, ConfigType, Database, DesignConfigOps, DesignConfigRecord,
    NewDesignConfig, UserOps, UserRole,
};
use crate::tests::common::{create_test_db, create_test_user};

fn new_config(name: &str, config_type: ConfigType, owner_id: i64) -> NewDesignConfig {
    NewDesignConfig {
        name: name.to_string(),
        config_type,
        owner_id,
        github_path: format!("src/configs/{}s/{name}.yaml", config_type.as_str()),
        github_sha: "a".repeat(40),
        description: Some("A test config".to_string()),
        tags: Some("test,fixture".to_string()),
    }
}

async fn seed(db: &Database, name: &str, config_type: ConfigType, owner_id: i64) -> DesignConfigRecord {
    db.create_design_config(&new_config(name, config_type, owner_id))
        .await
        .expect("Failed to create config")
}

// =============================================================================
// Design Config Tests
// =============================================================================

#[tokio::test]
async fn test_create_design_config_starts_unapproved() {
    let (db, _temp) = create_test_db().await;
    let owner = create_test_user(&db, "designer", UserRole::Designer).await;

    let config = seed(&db, "Sword", ConfigType::Item, owner.id).await;

    assert_eq!(config.name, "Sword");
    assert_eq!(config.config_type, "item");
    assert_eq!(config.owner_id, owner.id);
    assert!(!config.is_approved);
    assert!(config.approved_at.is_none());
    assert!(config.approved_by_id.is_none());
}

#[tokio::test]
async fn test_lookups_are_owner_and_type_scoped() {
    let (db, _temp) = create_test_db().await;
    let owner = create_test_user(&db, "owner", UserRole::Designer).await;
    let other = create_test_user(&db, "other", UserRole::Designer).await;

    let config = seed(&db, "Fireball", ConfigType::Skill, owner.id).await;

    assert!(db
        .get_owned_config(config.id, ConfigType::Skill, owner.id)
        .await
        .unwrap()
        .is_some());
    assert!(db
        .get_owned_config(config.id, ConfigType::Skill, other.id)
        .await
        .unwrap()
        .is_none());
    assert!(db
        .get_owned_config(config.id, ConfigType::Item, owner.id)
        .await
        .unwrap()
        .is_none());

    assert!(db
        .get_config_by_type(config.id, ConfigType::Skill)
        .await
        .unwrap()
        .is_some());
    assert!(db
        .get_config_by_type(config.id, ConfigType::Character)
        .await
        .unwrap()
        .is_none());

    assert!(db
        .find_owned_config_by_name("Fireball", ConfigType::Skill, owner.id)
        .await
        .unwrap()
        .is_some());
    assert!(db
        .find_owned_config_by_name("Fireball", ConfigType::Skill, other.id)
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_list_owned_configs() {
    let (db, _temp) = create_test_db().await;
    let owner = create_test_user(&db, "owner", UserRole::Designer).await;
    let other = create_test_user(&db, "other", UserRole::Designer).await;

    for name in ["a", "b", "c"] {
        seed(&db, name, ConfigType::Item, owner.id).await;
    }
    seed(&db, "d", ConfigType::Item, other.id).await;
    seed(&db, "e", ConfigType::Skill, owner.id).await;

    let items = db
        .list_owned_configs(ConfigType::Item, owner.id, 0, 100)
        .await
        .unwrap();
    let names: Vec<&str> = items.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["a", "b", "c"]);

    let page = db
        .list_owned_configs(ConfigType::Item, owner.id, 1, 1)
        .await
        .unwrap();
    assert_eq!(page.len(), 1);
    assert_eq!(page[0].name, "b");
}

#[tokio::test]
async fn test_update_and_delete_design_config() {
    let (db, _temp) = create_test_db().await;
    let owner = create_test_user(&db, "owner", UserRole::Designer).await;
    let mut config = seed(&db, "Old", ConfigType::Character, owner.id).await;

    config.name = "New".to_string();
    config.github_path = Some("src/configs/characters/New.yaml".to_string());
    config.tags = None;
    let updated = db.update_design_config(&config).await.unwrap();

    assert_eq!(updated.name, "New");
    assert_eq!(updated.github_path.as_deref(), Some("src/configs/characters/New.yaml"));
    assert!(updated.tags.is_none());
    assert!(updated.updated_at.is_some());

    db.delete_design_config(config.id).await.unwrap();
    assert!(db
        .get_config_by_type(config.id, ConfigType::Character)
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_deleting_owner_cascades_to_configs() {
    let (db, _temp) = create_test_db().await;
    let owner = create_test_user(&db, "owner", UserRole::Designer).await;
    let config = seed(&db, "Orphan", ConfigType::Item, owner.id).await;

    db.delete_user(owner.id).await.unwrap();

    assert!(db
        .get_config_by_type(config.id, ConfigType::Item)
        .await
        .unwrap()
        .is_none());
}

// =============================================================================
// Approval Tests
// =============================================================================

#[tokio::test]
async fn test_approve_config_snapshots_and_flags_source() {
    let (db, _temp) = create_test_db().await;
    let owner = create_test_user(&db, "owner", UserRole::Designer).await;
    let approver = create_test_user(&db, "lead", UserRole::Admin).await;
    let config = seed(&db, "Sword", ConfigType::Item, owner.id).await;

    let content = json!({"name": "Sword", "damage": 7});
    let approved = db.approve_config(&config, &content, approver.id).await.unwrap();

    assert_eq!(approved.name, "Sword");
    assert_eq!(approved.config_type, "item");
    assert_eq!(approved.content().unwrap(), content);
    assert_eq!(approved.source_config_id, Some(config.id));
    assert_eq!(approved.approved_by_id, Some(approver.id));
    assert!(approved.updated_at.is_none());

    let source = db
        .get_config_by_type(config.id, ConfigType::Item)
        .await
        .unwrap()
        .unwrap();
    assert!(source.is_approved);
    assert_eq!(source.approved_by_id, Some(approver.id));
    assert_eq!(source.approved_at.as_deref(), Some(approved.approved_at.as_str()));
}

#[tokio::test]
async fn test_reapproval_upserts_single_row() {
    let (db, _temp) = create_test_db().await;
    let owner = create_test_user(&db, "owner", UserRole::Designer).await;
    let config = seed(&db, "Sword", ConfigType::Item, owner.id).await;

    let first = db.approve_config(&config, &json!({"v": 1}), owner.id).await.unwrap();
    let second = db.approve_config(&config, &json!({"v": 2}), owner.id).await.unwrap();

    assert_eq!(first.id, second.id);
    assert_eq!(second.approved_at, first.approved_at);
    assert!(second.updated_at.is_some());
    assert_eq!(second.content().unwrap(), json!({"v": 2}));

    let all = db.list_approved_configs(ConfigType::Item, 0, 100).await.unwrap();
    assert_eq!(all.len(), 1);
}

#[tokio::test]
async fn test_approved_lookup_is_type_scoped() {
    let (db, _temp) = create_test_db().await;
    let owner = create_test_user(&db, "owner", UserRole::Designer).await;
    let item = seed(&db, "Shared", ConfigType::Item, owner.id).await;
    let skill = seed(&db, "Shared", ConfigType::Skill, owner.id).await;

    db.approve_config(&item, &json!({"kind": "item"}), owner.id).await.unwrap();
    db.approve_config(&skill, &json!({"kind": "skill"}), owner.id).await.unwrap();

    let found = db
        .get_approved_config(ConfigType::Skill, "Shared")
        .await
        .unwrap()
        .expect("Approved skill not found");
    assert_eq!(found.content().unwrap(), json!({"kind": "skill"}));

    assert!(db
        .get_approved_config(ConfigType::Character, "Shared")
        .await
        .unwrap()
        .is_none());
    assert_eq!(
        db.list_approved_configs(ConfigType::Item, 0, 100).await.unwrap().len(),
        1
    );
}

#[tokio::test]
async fn test_approved_snapshot_survives_source_deletion() {
    let (db, _temp) = create_test_db().await;
    let owner = create_test_user(&db, "owner", UserRole::Designer).await;
    let config = seed(&db, "Keep", ConfigType::Item, owner.id).await;

    db.approve_config(&config, &json!({}), owner.id).await.unwrap();
    db.delete_design_config(config.id).await.unwrap();

    let snapshot = db
        .get_approved_config(ConfigType::Item, "Keep")
        .await
        .unwrap()
        .expect("Snapshot was removed");
    assert!(snapshot.source_config_id.is_none());
}
