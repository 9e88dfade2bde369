//! User Entity
//!
//! A user carries exactly one profile: residents a [`ResidentProfile`],
//! officers and developers an officer email. The role is fixed at creation.

use chrono::{DateTime, NaiveDate, Utc};

use crate::domain::value_object::{
    UserId, email::Email, user_name::UserName, user_password::UserPassword, user_role::UserRole,
};
use crate::error::{AuthError, AuthResult};

/// Resident-only registration details
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResidentProfile {
    pub batch_number: i32,
    pub date_of_admission: NaiveDate,
    pub date_of_birth: NaiveDate,
}

/// Role-specific half of a user record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserProfile {
    Resident(ResidentProfile),
    Officer { email: Email },
}

impl UserProfile {
    fn accepts(&self, role: UserRole) -> bool {
        match self {
            UserProfile::Resident(_) => role.is_resident(),
            UserProfile::Officer { .. } => role.is_staff(),
        }
    }

    pub fn officer_email(&self) -> Option<&Email> {
        match self {
            UserProfile::Officer { email } => Some(email),
            UserProfile::Resident(_) => None,
        }
    }

    pub fn resident(&self) -> Option<&ResidentProfile> {
        match self {
            UserProfile::Resident(profile) => Some(profile),
            UserProfile::Officer { .. } => None,
        }
    }
}

/// Persisted user
#[derive(Debug, Clone)]
pub struct User {
    pub user_id: UserId,
    pub user_name: UserName,
    role: UserRole,
    pub profile: UserProfile,
    pub profile_picture: Option<String>,
    pub password: UserPassword,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Rebuild a user from storage, checking that role and profile agree
    #[allow(clippy::too_many_arguments)]
    pub fn restore(
        user_id: UserId,
        user_name: UserName,
        role: UserRole,
        profile: UserProfile,
        profile_picture: Option<String>,
        password: UserPassword,
        last_login_at: Option<DateTime<Utc>>,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> AuthResult<Self> {
        if !profile.accepts(role) {
            return Err(AuthError::Internal(format!(
                "user {user_id} has role {role} but a mismatched profile"
            )));
        }
        Ok(Self {
            user_id,
            user_name,
            role,
            profile,
            profile_picture,
            password,
            last_login_at,
            created_at,
            updated_at,
        })
    }

    pub fn role(&self) -> UserRole {
        self.role
    }

    pub fn is_staff(&self) -> bool {
        self.role.is_staff()
    }
}

/// A user about to be inserted (ids come from the database sequence)
#[derive(Debug, Clone)]
pub struct NewUser {
    pub user_name: UserName,
    role: UserRole,
    pub profile: UserProfile,
    pub profile_picture: Option<String>,
    pub password: UserPassword,
}

impl NewUser {
    pub fn new(
        user_name: UserName,
        role: UserRole,
        profile: UserProfile,
        profile_picture: Option<String>,
        password: UserPassword,
    ) -> AuthResult<Self> {
        if !profile.accepts(role) {
            let expected = if role.is_resident() {
                "resident details"
            } else {
                "an officer email"
            };
            return Err(AuthError::Validation(format!(
                "Role {role} must be registered with {expected}"
            )));
        }
        Ok(Self {
            user_name,
            role,
            profile,
            profile_picture,
            password,
        })
    }

    pub fn role(&self) -> UserRole {
        self.role
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resident_profile() -> UserProfile {
        UserProfile::Resident(ResidentProfile {
            batch_number: 3,
            date_of_admission: NaiveDate::from_ymd_opt(2025, 1, 6).unwrap(),
            date_of_birth: NaiveDate::from_ymd_opt(2009, 4, 2).unwrap(),
        })
    }

    fn officer_profile() -> UserProfile {
        UserProfile::Officer {
            email: Email::new("officer@example.com").unwrap(),
        }
    }

    fn password() -> UserPassword {
        UserPassword::from_db("$argon2id$v=19$m=19456,t=2,p=1$c2FsdA$aGFzaA")
    }

    #[test]
    fn test_new_user_role_profile_must_agree() {
        let name = UserName::new("Tan").unwrap();

        assert!(
            NewUser::new(name.clone(), UserRole::Resident, resident_profile(), None, password())
                .is_ok()
        );
        assert!(
            NewUser::new(name.clone(), UserRole::Developer, officer_profile(), None, password())
                .is_ok()
        );
        assert!(matches!(
            NewUser::new(name.clone(), UserRole::Resident, officer_profile(), None, password()),
            Err(AuthError::Validation(_))
        ));
        assert!(matches!(
            NewUser::new(name, UserRole::Officer, resident_profile(), None, password()),
            Err(AuthError::Validation(_))
        ));
    }

    #[test]
    fn test_restore_rejects_mismatch() {
        let now = Utc::now();
        let result = User::restore(
            UserId::new(1),
            UserName::new("Tan").unwrap(),
            UserRole::Officer,
            resident_profile(),
            None,
            password(),
            None,
            now,
            now,
        );
        assert!(matches!(result, Err(AuthError::Internal(_))));
    }

    #[test]
    fn test_profile_accessors() {
        assert!(resident_profile().resident().is_some());
        assert!(resident_profile().officer_email().is_none());
        assert_eq!(
            officer_profile().officer_email().map(Email::as_str),
            Some("officer@example.com")
        );
    }
}
