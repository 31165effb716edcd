//! Account creation and token resolution below the HTTP layer.

mod common;

use pantry::db::{NewUser, Store};
use pantry::entities::users;
use pantry::services::{AuthError, AuthService, Registration, SeaOrmAuthService};
use sea_orm::{ActiveModelTrait, EntityTrait, Set};

async fn spawn_service() -> (Store, SeaOrmAuthService, pantry::config::SecurityConfig) {
    let config = common::test_config();
    let store = Store::new(&config.general.database_path)
        .await
        .expect("failed to open store");
    let service = SeaOrmAuthService::new(store.clone(), config.security.clone());
    (store, service, config.security)
}

#[tokio::test]
async fn create_user_with_email_successful() {
    let (store, _, security) = spawn_service().await;

    let user = store
        .create_user(
            NewUser {
                email: "test@example.com".to_string(),
                password: "Testpass123".to_string(),
                ..NewUser::default()
            },
            &security,
        )
        .await
        .unwrap();

    assert_eq!(user.email, "test@example.com");
    assert!(user.is_active);
    assert!(!user.is_staff);

    let model = users::Entity::find_by_id(user.id.value())
        .one(&store.conn)
        .await
        .unwrap()
        .unwrap();
    assert_ne!(model.password_hash, "Testpass123");
    assert!(store.check_user_password(user.id, "Testpass123").await.unwrap());
}

#[tokio::test]
async fn new_user_email_domain_is_normalized() {
    let (store, _, security) = spawn_service().await;

    let user = store
        .create_user(
            NewUser {
                email: "test@LONDONAPPDEV.COM".to_string(),
                password: "test123".to_string(),
                ..NewUser::default()
            },
            &security,
        )
        .await
        .unwrap();

    assert_eq!(user.email, "test@londonappdev.com");
    assert!(store.email_taken("TEST@londonappdev.com", None).await.unwrap());
}

#[tokio::test]
async fn new_user_invalid_email_fails() {
    let (_, service, _) = spawn_service().await;

    let result = service.create_superuser("", "test123", "").await;
    assert!(matches!(result, Err(AuthError::Validation(_))));
}

#[tokio::test]
async fn superuser_email_must_look_like_an_email() {
    let (store, service, _) = spawn_service().await;

    let result = service.create_superuser("foo", "secret", "Admin").await;
    assert!(matches!(result, Err(AuthError::Validation(_))));
    assert!(store.get_user_by_email("foo").await.unwrap().is_none());
}

#[tokio::test]
async fn create_new_superuser() {
    let (_, service, _) = spawn_service().await;

    let user = service
        .create_superuser("admin@example.com", "test123", "Admin")
        .await
        .unwrap();

    assert!(user.is_superuser);
    assert!(user.is_staff);
}

#[tokio::test]
async fn register_rejects_duplicates_and_short_passwords() {
    let (_, service, _) = spawn_service().await;

    let registration = |email: &str, password: &str| Registration {
        email: email.to_string(),
        password: password.to_string(),
        name: "Test".to_string(),
    };

    service
        .register(registration("test@example.com", "testpass"))
        .await
        .unwrap();

    let duplicate = service
        .register(registration("test@EXAMPLE.com", "testpass"))
        .await;
    assert!(matches!(duplicate, Err(AuthError::Validation(_))));

    let short = service.register(registration("new@example.com", "test")).await;
    assert!(matches!(short, Err(AuthError::Validation(_))));
}

#[tokio::test]
async fn inactive_user_gets_no_token_and_token_stops_working() {
    let (store, service, _) = spawn_service().await;

    service
        .register(Registration {
            email: "test@example.com".to_string(),
            password: "testpass".to_string(),
            name: "Test".to_string(),
        })
        .await
        .unwrap();

    let token = service
        .issue_token("test@example.com", "testpass")
        .await
        .unwrap();
    let user = service.authenticate_token(&token).await.unwrap();

    let model = users::Entity::find_by_id(user.id.value())
        .one(&store.conn)
        .await
        .unwrap()
        .unwrap();
    let mut active: users::ActiveModel = model.into();
    active.is_active = Set(false);
    active.update(&store.conn).await.unwrap();

    assert!(matches!(
        service.issue_token("test@example.com", "testpass").await,
        Err(AuthError::InvalidCredentials)
    ));
    assert!(matches!(
        service.authenticate_token(&token).await,
        Err(AuthError::Unauthorized)
    ));
}

#[tokio::test]
async fn unknown_token_is_unauthorized() {
    let (_, service, _) = spawn_service().await;

    assert!(matches!(
        service.authenticate_token("not-a-token").await,
        Err(AuthError::Unauthorized)
    ));
}
