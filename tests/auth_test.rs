use axum::http::StatusCode;
use fintrack_server::auth::{
    create_user, get_user_by_username, validate_registration, verify_password,
};
use fintrack_server::database::init_main_db;
use fintrack_server::models::RegisterPayload;

mod common;
use common::*;

fn registration(username: &str, password: &str) -> RegisterPayload {
    RegisterPayload {
        username: username.to_string(),
        password: password.to_string(),
    }
}

#[test]
fn registration_validation() {
    assert!(validate_registration(&registration("alice_01", "secret123")).is_ok());

    let (status, message) = validate_registration(&registration("  ", "secret123")).unwrap_err();
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(message.contains("cannot be empty"));

    assert!(validate_registration(&registration("abc", "secret123")).is_err());
    assert!(validate_registration(&registration(&"a".repeat(51), "secret123")).is_err());
    assert!(validate_registration(&registration("alice", "short")).is_err());

    let (_, message) = validate_registration(&registration("al ice", "secret123")).unwrap_err();
    assert!(message.contains("alphanumeric"));
}

#[tokio::test]
async fn created_user_can_be_found_and_verified() {
    let (data_path, _user_id, _temp_dir) = setup_test_environment().await;
    let main_db = init_main_db(&data_path).await.unwrap();

    let created = create_user(&main_db, "alice", "correct horse").await.unwrap();
    assert_eq!(created.username, "alice");

    let stored = get_user_by_username(&main_db, "alice")
        .await
        .unwrap()
        .expect("user should be stored");
    assert_eq!(stored.id, created.id);
    assert_ne!(stored.password_hash, "correct horse");

    assert!(verify_password("correct horse", &stored.password_hash).unwrap());
    assert!(!verify_password("wrong horse", &stored.password_hash).unwrap());
    assert!(verify_password("anything", "not-a-hash").is_err());

    assert!(get_user_by_username(&main_db, "bob").await.unwrap().is_none());
}

#[tokio::test]
async fn duplicate_username_is_rejected_by_the_registry() {
    let (data_path, _user_id, _temp_dir) = setup_test_environment().await;
    let main_db = init_main_db(&data_path).await.unwrap();

    create_user(&main_db, "alice", "password1").await.unwrap();
    let err = create_user(&main_db, "alice", "password2").await.unwrap_err();
    assert!(err.to_string().contains("UNIQUE constraint failed"));
}
