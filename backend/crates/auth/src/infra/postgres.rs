//! PostgreSQL Repository Implementations

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::PgPool;

use crate::domain::entity::{NewUser, ResidentProfile, User, UserProfile};
use crate::domain::repository::UserRepository;
use crate::domain::value_object::{
    UserId, email::Email, user_name::UserName, user_password::UserPassword, user_role::UserRole,
};
use crate::error::{AuthError, AuthResult};

const SELECT_USER: &str = r#"
    SELECT
        u.user_id,
        u.user_name,
        u.role,
        u.profile_picture,
        u.password_hash,
        u.last_login_at,
        u.created_at,
        u.updated_at,
        r.batch_number,
        r.date_of_admission,
        r.date_of_birth,
        o.officer_email
    FROM users u
    LEFT JOIN residents r ON r.user_id = u.user_id
    LEFT JOIN officers o ON o.user_id = u.user_id
"#;

/// PostgreSQL-backed user repository
#[derive(Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl UserRepository for PgUserRepository {
    async fn create(&self, user: &NewUser) -> AuthResult<UserId> {
        let mut tx = self.pool.begin().await?;

        let user_id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO users (user_name, role, profile_picture, password_hash)
            VALUES ($1, $2, $3, $4)
            RETURNING user_id
            "#,
        )
        .bind(user.user_name.as_str())
        .bind(user.role().code())
        .bind(user.profile_picture.as_deref())
        .bind(user.password.as_phc_string())
        .fetch_one(&mut *tx)
        .await?;

        match &user.profile {
            UserProfile::Resident(profile) => {
                sqlx::query(
                    r#"
                    INSERT INTO residents (user_id, batch_number, date_of_admission, date_of_birth)
                    VALUES ($1, $2, $3, $4)
                    "#,
                )
                .bind(user_id)
                .bind(profile.batch_number)
                .bind(profile.date_of_admission)
                .bind(profile.date_of_birth)
                .execute(&mut *tx)
                .await?;
            }
            UserProfile::Officer { email } => {
                sqlx::query("INSERT INTO officers (user_id, officer_email) VALUES ($1, $2)")
                    .bind(user_id)
                    .bind(email.as_str())
                    .execute(&mut *tx)
                    .await
                    .map_err(map_unique_email)?;
            }
        }

        tx.commit().await?;

        Ok(UserId::new(user_id))
    }

    async fn find_by_id(&self, user_id: UserId) -> AuthResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!("{SELECT_USER} WHERE u.user_id = $1"))
            .bind(user_id.get())
            .fetch_optional(&self.pool)
            .await?;

        row.map(UserRow::into_user).transpose()
    }

    async fn find_by_officer_email(&self, email: &Email) -> AuthResult<Option<User>> {
        let row =
            sqlx::query_as::<_, UserRow>(&format!("{SELECT_USER} WHERE o.officer_email = $1"))
                .bind(email.as_str())
                .fetch_optional(&self.pool)
                .await?;

        row.map(UserRow::into_user).transpose()
    }

    async fn exists_by_officer_email(&self, email: &Email) -> AuthResult<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM officers WHERE officer_email = $1)",
        )
        .bind(email.as_str())
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn record_login(&self, user_id: UserId, at: DateTime<Utc>) -> AuthResult<()> {
        sqlx::query("UPDATE users SET last_login_at = $2, updated_at = $2 WHERE user_id = $1")
            .bind(user_id.get())
            .bind(at)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn update_password(&self, user_id: UserId, password: &UserPassword) -> AuthResult<()> {
        let updated = sqlx::query(
            "UPDATE users SET password_hash = $2, updated_at = now() WHERE user_id = $1",
        )
        .bind(user_id.get())
        .bind(password.as_phc_string())
        .execute(&self.pool)
        .await?
        .rows_affected();

        if updated == 0 {
            return Err(AuthError::UserNotFound);
        }
        Ok(())
    }
}

/// A concurrent registration can win the race past `exists_by_officer_email`
fn map_unique_email(err: sqlx::Error) -> AuthError {
    match &err {
        sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some("23505") => {
            AuthError::EmailTaken
        }
        _ => AuthError::Database(err),
    }
}

// ============================================================================
// Row Types
// ============================================================================

#[derive(sqlx::FromRow)]
struct UserRow {
    user_id: i64,
    user_name: String,
    role: String,
    profile_picture: Option<String>,
    password_hash: String,
    last_login_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    batch_number: Option<i32>,
    date_of_admission: Option<NaiveDate>,
    date_of_birth: Option<NaiveDate>,
    officer_email: Option<String>,
}

impl UserRow {
    fn into_user(self) -> AuthResult<User> {
        let role: UserRole = self.role.parse().map_err(AuthError::Internal)?;

        let profile = match (
            self.officer_email,
            self.batch_number,
            self.date_of_admission,
            self.date_of_birth,
        ) {
            (Some(email), None, _, _) => UserProfile::Officer {
                email: Email::from_db(email),
            },
            (None, Some(batch_number), Some(date_of_admission), Some(date_of_birth)) => {
                UserProfile::Resident(ResidentProfile {
                    batch_number,
                    date_of_admission,
                    date_of_birth,
                })
            }
            _ => {
                return Err(AuthError::Internal(format!(
                    "user {} must have exactly one profile",
                    self.user_id
                )));
            }
        };

        User::restore(
            UserId::new(self.user_id),
            UserName::from_db(self.user_name),
            role,
            profile,
            self.profile_picture,
            UserPassword::from_db(self.password_hash),
            self.last_login_at,
            self.created_at,
            self.updated_at,
        )
    }
}
