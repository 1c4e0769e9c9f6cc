//! Authentication service.
//!
//! Password registration and login, plus account edits. Passwords are hashed
//! with Argon2id and never leave this module in plain form.

mod error;

pub use error::AuthError;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use serde::Deserialize;
use sqlx::PgPool;

use delicious_core::{Email, UserId};

use crate::db::RepositoryError;
use crate::db::users::UserRepository;
use crate::models::User;

/// Minimum password length.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Registration form data.
#[derive(Debug, Default, Deserialize)]
pub struct Registration {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default, rename = "password-confirm")]
    pub password_confirm: String,
}

/// A registration that passed validation.
struct ValidRegistration {
    name: String,
    email: Email,
    password: String,
}

/// Authentication service.
///
/// Handles user registration, login and account updates.
pub struct AuthService<'a> {
    users: UserRepository<'a>,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            users: UserRepository::new(pool),
        }
    }

    /// Register a new user.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Invalid` with every problem found in the form.
    /// Returns `AuthError::UserAlreadyExists` if the email is already registered.
    pub async fn register(&self, form: Registration) -> Result<User, AuthError> {
        let valid = validate_registration(form).map_err(AuthError::Invalid)?;
        let password_hash = hash_password(&valid.password)?;

        let user = self
            .users
            .create_with_password(&valid.email, &valid.name, &password_hash)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::UserAlreadyExists,
                other => AuthError::Repository(other),
            })?;

        tracing::info!(user_id = %user.id, "user registered");
        Ok(user)
    }

    /// Login with email and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the email/password is wrong.
    pub async fn login(&self, email: &str, password: &str) -> Result<User, AuthError> {
        let email = Email::parse(email).map_err(|_| AuthError::InvalidCredentials)?;

        let (user, password_hash) = self
            .users
            .get_password_hash(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        verify_password(password, &password_hash)?;

        Ok(user)
    }

    /// Change a user's display name and email.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Invalid` if the name is blank or the email malformed.
    /// Returns `AuthError::UserAlreadyExists` if another account has the email.
    /// Returns `AuthError::UserNotFound` if the user no longer exists.
    pub async fn update_account(
        &self,
        id: UserId,
        name: &str,
        email: &str,
    ) -> Result<User, AuthError> {
        let (name, email) = validate_account(name, email).map_err(AuthError::Invalid)?;

        self.users
            .update_account(id, &name, &email)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::UserAlreadyExists,
                RepositoryError::NotFound => AuthError::UserNotFound,
                other => AuthError::Repository(other),
            })
    }
}

/// Check a registration form, collecting every message rather than stopping at the first.
fn validate_registration(form: Registration) -> Result<ValidRegistration, Vec<String>> {
    let mut errors = Vec::new();

    let name = form.name.trim().to_owned();
    if name.is_empty() {
        errors.push("You must supply a name!".to_owned());
    }

    let email = Email::parse(&form.email)
        .map_err(|_| errors.push("That Email is not valid!".to_owned()))
        .ok();

    if form.password.is_empty() {
        errors.push("Password Cannot be Blank!".to_owned());
    } else if form.password.chars().count() < MIN_PASSWORD_LENGTH {
        errors.push(format!(
            "Password must be at least {MIN_PASSWORD_LENGTH} characters"
        ));
    }
    if form.password_confirm.is_empty() {
        errors.push("Confirmed Password cannot be blank!".to_owned());
    } else if form.password_confirm != form.password {
        errors.push("Oops! Your passwords do not match".to_owned());
    }

    match email {
        Some(email) if errors.is_empty() => Ok(ValidRegistration {
            name,
            email,
            password: form.password,
        }),
        _ => Err(errors),
    }
}

fn validate_account(name: &str, email: &str) -> Result<(String, Email), Vec<String>> {
    let mut errors = Vec::new();

    let name = name.trim();
    if name.is_empty() {
        errors.push("You must supply a name!".to_owned());
    }
    let email = Email::parse(email)
        .map_err(|_| errors.push("That Email is not valid!".to_owned()))
        .ok();

    match email {
        Some(email) if errors.is_empty() => Ok((name.to_owned(), email)),
        _ => Err(errors),
    }
}

/// Hash a password using Argon2id.
fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn form(name: &str, email: &str, password: &str, confirm: &str) -> Registration {
        Registration {
            name: name.to_owned(),
            email: email.to_owned(),
            password: password.to_owned(),
            password_confirm: confirm.to_owned(),
        }
    }

    #[test]
    fn test_valid_registration_normalizes() {
        let valid =
            validate_registration(form(" Wes ", "WES@Example.com", "hunter22!", "hunter22!"))
                .unwrap();
        assert_eq!(valid.name, "Wes");
        assert_eq!(valid.email.as_str(), "wes@example.com");
    }

    #[test]
    fn test_registration_collects_every_error() {
        let Err(errors) = validate_registration(form("", "nope", "", "")) else {
            panic!("expected errors");
        };
        assert_eq!(
            errors,
            vec![
                "You must supply a name!",
                "That Email is not valid!",
                "Password Cannot be Blank!",
                "Confirmed Password cannot be blank!",
            ]
        );
    }

    #[test]
    fn test_registration_password_mismatch() {
        let Err(errors) = validate_registration(form("Wes", "wes@example.com", "hunter22!", "hunter23!"))
        else {
            panic!("expected errors");
        };
        assert_eq!(errors, vec!["Oops! Your passwords do not match"]);
    }

    #[test]
    fn test_registration_short_password() {
        let Err(errors) = validate_registration(form("Wes", "wes@example.com", "abc", "abc")) else {
            panic!("expected errors");
        };
        assert_eq!(errors, vec!["Password must be at least 8 characters"]);
    }

    #[test]
    fn test_validate_account() {
        let (name, email) = validate_account("  Wes Bos ", "wes@example.com").unwrap();
        assert_eq!(name, "Wes Bos");
        assert_eq!(email.as_str(), "wes@example.com");
        assert_eq!(validate_account(" ", "x").unwrap_err().len(), 2);
    }

    #[test]
    fn test_password_hash_round_trip() {
        let hash = hash_password("correct horse battery").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("correct horse battery", &hash).is_ok());
        assert!(matches!(
            verify_password("wrong", &hash),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_verify_against_garbage_hash() {
        assert!(matches!(
            verify_password("anything", "not-a-hash"),
            Err(AuthError::InvalidCredentials)
        ));
    }
}
