mod common;

use common::model::{Post, User};
use common::repo::{SqlitePostRepository, SqliteUserRepository};
use common::{repo_namespace, setup_db};
use sqlrepo_core::{
    FieldValue, RepoError, Repository, RepositoryCatalog, RepositoryConfig, RepositoryManager,
    ReturnDataType,
};
use std::any::type_name;
use std::fs;

fn catalog() -> RepositoryCatalog {
    RepositoryCatalog::new()
        .with::<SqliteUserRepository>()
        .with::<SqlitePostRepository>()
}

#[test]
fn register_and_lookup_by_model_identity() {
    let db = setup_db();
    let mut manager = RepositoryManager::new();
    manager.register(Repository::<User>::for_type::<SqliteUserRepository>(db));

    assert!(manager.has_repository(type_name::<User>()));
    let repository = manager.lookup(type_name::<User>()).unwrap();
    assert_eq!(repository.table_name(), "users");
    assert_eq!(
        manager.lookup_by_table("users").unwrap().model_name(),
        type_name::<User>()
    );

    let typed = manager.repository::<User>().unwrap();
    assert_eq!(typed.table_name(), "users");
}

#[test]
fn lookup_misses_are_reported_not_defaulted() {
    let manager = RepositoryManager::new();

    let err = manager.lookup("app::model::Ghost").err().unwrap();
    assert!(matches!(
        err,
        RepoError::RepositoryNotRegistered(ref name) if name == "app::model::Ghost"
    ));
    assert!(matches!(
        manager.lookup_by_table("ghosts"),
        Err(RepoError::RepositoryNotRegistered(_))
    ));
    assert!(matches!(
        manager.repository::<Post>(),
        Err(RepoError::RepositoryNotRegistered(_))
    ));
}

#[test]
fn later_registration_replaces_earlier() {
    let db = setup_db();
    let mut manager = RepositoryManager::new();
    manager.register(Repository::<User>::for_type::<SqliteUserRepository>(db.clone()));

    let mut replacement = Repository::<User>::for_type::<SqliteUserRepository>(db);
    replacement.set_return_data_type(ReturnDataType::Array);
    manager.register(replacement);

    assert_eq!(manager.len(), 1);
    assert_eq!(
        manager.repository::<User>().unwrap().return_data_type(),
        ReturnDataType::Array
    );
}

#[test]
fn shared_table_lookup_returns_earliest_registration() {
    let db = setup_db();
    let mut manager = RepositoryManager::new();
    manager.register(Repository::<User>::for_type::<SqliteUserRepository>(db.clone()));
    let legacy = RepositoryConfig::new("users", "archive::model::LegacyUser");
    manager.register(Repository::<User>::with_config(db, legacy));

    assert_eq!(
        manager.lookup_by_table("users").unwrap().model_name(),
        type_name::<User>()
    );
    let order = manager
        .repositories()
        .map(|repository| repository.model_name().to_string())
        .collect::<Vec<_>>();
    assert_eq!(
        order,
        vec![
            type_name::<User>().to_string(),
            "archive::model::LegacyUser".to_string()
        ]
    );
}

#[test]
fn register_catalog_builds_every_entry() {
    let db = setup_db();
    let mut manager = RepositoryManager::new();

    let registered = manager.register_catalog(&catalog(), &db);

    assert_eq!(registered, 2);
    let tables = manager
        .repositories()
        .map(|repository| repository.table_name().to_string())
        .collect::<Vec<_>>();
    assert!(tables.contains(&"users".to_string()));
    assert!(tables.contains(&"posts".to_string()));
    assert!(manager.repository::<Post>().unwrap().supports_soft_delete());
}

#[test]
fn discover_registers_matching_files_known_to_catalog() {
    let dir = tempfile::tempdir().unwrap();
    for file in [
        "sqlite_user_repository.rs",
        "sqlite_post_repository.rs",
        "sqlite_ghost_repository.rs",
        "readme.md",
    ] {
        fs::write(dir.path().join(file), "").unwrap();
    }

    let db = setup_db();
    let mut manager = RepositoryManager::new();
    let registered = manager
        .discover(dir.path(), &repo_namespace(), &db, &catalog())
        .unwrap();

    assert_eq!(registered, 2);
    assert!(manager.has_repository(type_name::<User>()));
    assert!(manager.has_repository(type_name::<Post>()));
}

#[test]
fn discover_missing_directory_registers_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let db = setup_db();
    let mut manager = RepositoryManager::new();

    let registered = manager
        .discover(dir.path().join("absent"), &repo_namespace(), &db, &catalog())
        .unwrap();

    assert_eq!(registered, 0);
    assert!(manager.is_empty());
}

#[test]
fn type_erased_lookup_fetches_rows_by_ids() {
    let db = setup_db();
    let mut manager = RepositoryManager::new();
    manager.register_catalog(&catalog(), &db);

    let mut ids = Vec::new();
    {
        let users = manager.repository::<User>().unwrap();
        for name in ["a", "b"] {
            let mut user = User::named(name);
            users.persist(&mut user).unwrap();
            ids.push(user.id.unwrap());
        }
    }

    let rows = manager
        .lookup_by_table("users")
        .unwrap()
        .find_rows_by_ids(&ids)
        .unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].get("name"), Some(&FieldValue::from("b")));
}

#[test]
fn repository_mut_changes_registered_instance() {
    let db = setup_db();
    let mut manager = RepositoryManager::new();
    manager.register_catalog(&catalog(), &db);

    manager
        .repository_mut::<User>()
        .unwrap()
        .set_return_data_type(ReturnDataType::Array);

    let users = manager.repository::<User>().unwrap();
    let mut user = User::named("raw");
    users.persist(&mut user).unwrap();
    assert!(users.find(user.id.unwrap()).unwrap().as_row().is_some());
}
