//! Use case tests against the in-memory repository

use std::sync::Arc;

use argon2::password_hash::{PasswordHasher, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};
use chrono::{NaiveDate, Utc};
use platform::crypto::hmac_sha256_hex;
use platform::token::TokenKind;

use crate::application::config::AuthConfig;
use crate::application::{
    ChangePasswordInput, ChangePasswordUseCase, LoginIdentifier, LoginInput, LoginUseCase,
    RefreshUseCase, RegisterUserInput, RegisterUserUseCase,
};
use crate::domain::repository::UserRepository;
use crate::domain::value_object::{UserId, user_password::UserPassword, user_role::UserRole};
use crate::error::AuthError;
use crate::infra::InMemoryUserRepository;

const RESIDENT_PASSWORD: &str = "Kettle#Orchid2024";
const OFFICER_PASSWORD: &str = "Lantern&Fjord77";

struct Fixture {
    repo: Arc<InMemoryUserRepository>,
    config: Arc<AuthConfig>,
    resident: UserId,
    officer: UserId,
}

async fn fixture() -> Fixture {
    let repo = Arc::new(InMemoryUserRepository::new());
    let config = Arc::new(AuthConfig::for_tests());
    let register = RegisterUserUseCase::new(repo.clone(), config.clone());

    let officer = register
        .execute(
            UserRole::Developer,
            officer_input("officer@example.com", OFFICER_PASSWORD),
        )
        .await
        .unwrap();
    let resident = register
        .execute(UserRole::Officer, resident_input(RESIDENT_PASSWORD))
        .await
        .unwrap();

    Fixture {
        repo,
        config,
        resident,
        officer,
    }
}

fn resident_input(password: &str) -> RegisterUserInput {
    RegisterUserInput {
        user_name: "Resident One".into(),
        role: UserRole::Resident,
        password: password.into(),
        profile_picture: None,
        officer_email: None,
        batch_number: Some(4),
        date_of_admission: NaiveDate::from_ymd_opt(2025, 3, 1),
        date_of_birth: NaiveDate::from_ymd_opt(2010, 7, 15),
    }
}

fn officer_input(email: &str, password: &str) -> RegisterUserInput {
    RegisterUserInput {
        user_name: "Officer Lim".into(),
        role: UserRole::Officer,
        password: password.into(),
        profile_picture: None,
        officer_email: Some(email.into()),
        batch_number: None,
        date_of_admission: None,
        date_of_birth: None,
    }
}

fn resident_login(user_id: UserId, password: &str) -> LoginInput {
    LoginInput {
        identifier: LoginIdentifier::Resident(user_id),
        password: password.into(),
    }
}

fn officer_login(email: &str, password: &str) -> LoginInput {
    LoginInput {
        identifier: LoginIdentifier::Officer(email.into()),
        password: password.into(),
    }
}

// ============================================================================
// Login
// ============================================================================

#[tokio::test]
async fn test_resident_login_issues_tokens_for_user() {
    let f = fixture().await;
    let login = LoginUseCase::new(f.repo.clone(), f.config.clone());

    let output = login
        .execute(resident_login(f.resident, RESIDENT_PASSWORD))
        .await
        .unwrap();

    let claims = f
        .config
        .tokens
        .verify_access_token(&output.tokens.access_token)
        .unwrap();
    assert_eq!(claims.user_id, f.resident.get());
    assert_eq!(
        f.config
            .tokens
            .verify_refresh_token(&output.tokens.refresh_token)
            .unwrap()
            .user_id,
        f.resident.get()
    );
    assert!(output.user.last_login_at.is_some());

    let stored = f.repo.find_by_id(f.resident).await.unwrap().unwrap();
    assert!(stored.last_login_at.is_some());
}

#[tokio::test]
async fn test_officer_login_is_case_insensitive() {
    let f = fixture().await;
    let login = LoginUseCase::new(f.repo.clone(), f.config.clone());

    let output = login
        .execute(officer_login("Officer@Example.com", OFFICER_PASSWORD))
        .await
        .unwrap();
    assert_eq!(output.user.user_id, f.officer);
}

#[tokio::test]
async fn test_wrong_password_is_invalid_credentials() {
    let f = fixture().await;
    let login = LoginUseCase::new(f.repo.clone(), f.config.clone());

    let err = login
        .execute(resident_login(f.resident, "Kettle#Orchid2025"))
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::InvalidCredentials));
}

#[tokio::test]
async fn test_unknown_and_wrong_flow_look_identical() {
    let f = fixture().await;
    let login = LoginUseCase::new(f.repo.clone(), f.config.clone());

    let unknown = login
        .execute(resident_login(UserId::new(999), RESIDENT_PASSWORD))
        .await
        .unwrap_err();
    // Officer id through the resident flow
    let wrong_flow = login
        .execute(resident_login(f.officer, OFFICER_PASSWORD))
        .await
        .unwrap_err();
    let unknown_email = login
        .execute(officer_login("nobody@example.com", OFFICER_PASSWORD))
        .await
        .unwrap_err();

    for err in [&unknown, &wrong_flow, &unknown_email] {
        assert!(matches!(err, AuthError::UserNotFound));
    }
    assert_eq!(unknown.to_string(), wrong_flow.to_string());
    assert_eq!(unknown.to_app_error().message(), unknown_email.to_app_error().message());
}

#[tokio::test]
async fn test_empty_password_is_validation_error() {
    let f = fixture().await;
    let login = LoginUseCase::new(f.repo.clone(), f.config.clone());

    let err = login.execute(resident_login(f.resident, "")).await.unwrap_err();
    assert!(matches!(err, AuthError::Validation(_)));
}

#[tokio::test]
async fn test_login_upgrades_legacy_argon2i_hash() {
    let f = fixture().await;

    // Same peppering as production, hashed with the older Argon2i variant
    let peppered =
        hmac_sha256_hex(b"unit-test-pepper-0123456789", RESIDENT_PASSWORD.as_bytes()).unwrap();
    let salt = SaltString::from_b64("bGVnYWN5c2FsdDEyMzQ1Ng").unwrap();
    let legacy = Argon2::new(Algorithm::Argon2i, Version::V0x13, Params::default())
        .hash_password(peppered.as_bytes(), &salt)
        .unwrap()
        .to_string();
    let legacy = UserPassword::from_phc_string(legacy).unwrap();
    assert!(legacy.needs_rehash());
    f.repo.update_password(f.resident, &legacy).await.unwrap();

    let login = LoginUseCase::new(f.repo.clone(), f.config.clone());
    let output = login
        .execute(resident_login(f.resident, RESIDENT_PASSWORD))
        .await
        .unwrap();
    assert!(!output.user.password.needs_rehash());

    let stored = f.repo.find_by_id(f.resident).await.unwrap().unwrap();
    assert!(stored.password.as_phc_string().starts_with("$argon2id$"));
    assert!(!stored.password.needs_rehash());

    // The upgraded hash still accepts the same password
    assert!(
        login
            .execute(resident_login(f.resident, RESIDENT_PASSWORD))
            .await
            .is_ok()
    );
}

#[tokio::test]
async fn test_current_hash_is_left_alone_on_login() {
    let f = fixture().await;
    let before = f.repo.find_by_id(f.resident).await.unwrap().unwrap().password;

    LoginUseCase::new(f.repo.clone(), f.config.clone())
        .execute(resident_login(f.resident, RESIDENT_PASSWORD))
        .await
        .unwrap();

    let after = f.repo.find_by_id(f.resident).await.unwrap().unwrap().password;
    assert_eq!(before, after);
}

// ============================================================================
// Refresh
// ============================================================================

#[tokio::test]
async fn test_refresh_mints_access_token() {
    let f = fixture().await;
    let refresh = RefreshUseCase::new(f.repo.clone(), f.config.clone());

    let refresh_token = f.config.tokens.issue_refresh_token(f.resident.get()).unwrap();
    let access = refresh.execute(&refresh_token).await.unwrap();

    let claims = f.config.tokens.verify_access_token(&access).unwrap();
    assert_eq!(claims.user_id, f.resident.get());
}

#[tokio::test]
async fn test_refresh_rejects_access_token_and_expired_token() {
    let f = fixture().await;
    let refresh = RefreshUseCase::new(f.repo.clone(), f.config.clone());

    let access = f.config.tokens.issue_access_token(f.resident.get()).unwrap();
    assert!(matches!(
        refresh.execute(&access).await,
        Err(AuthError::InvalidToken)
    ));

    let stale = f
        .config
        .tokens
        .issue_at(
            TokenKind::Refresh,
            f.resident.get(),
            Utc::now() - chrono::Duration::days(8),
        )
        .unwrap();
    assert!(matches!(
        refresh.execute(&stale).await,
        Err(AuthError::ExpiredToken)
    ));
}

#[tokio::test]
async fn test_refresh_for_unknown_user_is_invalid() {
    let f = fixture().await;
    let refresh = RefreshUseCase::new(f.repo.clone(), f.config.clone());

    let orphan = f.config.tokens.issue_refresh_token(4242).unwrap();
    assert!(matches!(
        refresh.execute(&orphan).await,
        Err(AuthError::InvalidToken)
    ));
}

// ============================================================================
// Registration
// ============================================================================

#[tokio::test]
async fn test_resident_cannot_register_users() {
    let f = fixture().await;
    let register = RegisterUserUseCase::new(f.repo.clone(), f.config.clone());

    let err = register
        .execute(UserRole::Resident, resident_input(RESIDENT_PASSWORD))
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::Forbidden));
}

#[tokio::test]
async fn test_duplicate_officer_email_conflicts() {
    let f = fixture().await;
    let register = RegisterUserUseCase::new(f.repo.clone(), f.config.clone());

    let err = register
        .execute(
            UserRole::Officer,
            officer_input("OFFICER@example.com", OFFICER_PASSWORD),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::EmailTaken));
}

#[tokio::test]
async fn test_registration_applies_password_policy() {
    let f = fixture().await;
    let register = RegisterUserUseCase::new(f.repo.clone(), f.config.clone());

    let err = register
        .execute(UserRole::Officer, resident_input("password123"))
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::Validation(_)));
}

#[tokio::test]
async fn test_resident_requires_profile_fields() {
    let f = fixture().await;
    let register = RegisterUserUseCase::new(f.repo.clone(), f.config.clone());

    let mut input = resident_input(RESIDENT_PASSWORD);
    input.batch_number = None;
    assert!(matches!(
        register.execute(UserRole::Officer, input).await,
        Err(AuthError::Validation(_))
    ));

    let mut input = officer_input("second@example.com", OFFICER_PASSWORD);
    input.officer_email = None;
    assert!(matches!(
        register.execute(UserRole::Officer, input).await,
        Err(AuthError::Validation(_))
    ));
}

#[tokio::test]
async fn test_stored_hash_is_argon2id_phc() {
    let f = fixture().await;
    let user = f.repo.find_by_id(f.resident).await.unwrap().unwrap();

    assert!(user.password.as_phc_string().starts_with("$argon2id$"));
    assert!(!user.password.as_phc_string().contains(RESIDENT_PASSWORD));
    assert!(!user.password.needs_rehash());
}

// ============================================================================
// Change password
// ============================================================================

#[tokio::test]
async fn test_change_password_round_trip() {
    let f = fixture().await;
    let change = ChangePasswordUseCase::new(f.repo.clone(), f.config.clone());
    let login = LoginUseCase::new(f.repo.clone(), f.config.clone());

    let wrong = change
        .execute(
            f.resident,
            ChangePasswordInput {
                current_password: "not-it".into(),
                new_password: "Harbour!Sparrow9".into(),
            },
        )
        .await;
    assert!(matches!(wrong, Err(AuthError::InvalidCredentials)));

    change
        .execute(
            f.resident,
            ChangePasswordInput {
                current_password: RESIDENT_PASSWORD.into(),
                new_password: "Harbour!Sparrow9".into(),
            },
        )
        .await
        .unwrap();

    assert!(login
        .execute(resident_login(f.resident, "Harbour!Sparrow9"))
        .await
        .is_ok());
    assert!(matches!(
        login.execute(resident_login(f.resident, RESIDENT_PASSWORD)).await,
        Err(AuthError::InvalidCredentials)
    ));
}
