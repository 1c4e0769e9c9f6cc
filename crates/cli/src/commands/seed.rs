//! Seed the database with users, stores and reviews from a YAML file.
//!
//! # Usage
//!
//! ```bash
//! dl-cli seed crates/cli/data/sample.yaml
//! dl-cli seed crates/cli/data/sample.yaml --clear
//! ```
//!
//! Users are registered through the normal auth service and stores go through
//! the store service, so seeded stores get slugs exactly as the site would
//! assign them. Reviews refer to stores by name and to users by email.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use serde::Deserialize;
use sqlx::PgPool;
use thiserror::Error;
use tracing::{info, warn};

use delicious_core::catalog::{CatalogError, StoreService};
use delicious_core::{Email, Rating, RatingError, StoreId, StoreInput, UserId};
use delicious_web::db::{RepositoryError, ReviewRepository, StoreRepository, UserRepository};
use delicious_web::services::{AuthError, AuthService, Registration};

use super::CommandError;

/// Errors that can occur while seeding.
#[derive(Debug, Error)]
pub enum SeedError {
    #[error(transparent)]
    Connect(#[from] CommandError),

    #[error("failed to read seed file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse seed file: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("{} validation errors found", .0.len())]
    Invalid(Vec<String>),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("repository error: {0}")]
    Repository(#[from] RepositoryError),

    #[error("user error: {0}")]
    Auth(#[from] AuthError),

    #[error("store error: {0}")]
    Catalog(#[from] CatalogError<RepositoryError>),

    #[error("review error: {0}")]
    Rating(#[from] RatingError),
}

/// Contents of a seed file.
#[derive(Debug, Default, Deserialize)]
pub struct SeedFile {
    #[serde(default)]
    pub users: Vec<SeedUser>,
    #[serde(default)]
    pub stores: Vec<SeedStore>,
    #[serde(default)]
    pub reviews: Vec<SeedReview>,
}

/// A user to register.
#[derive(Debug, Deserialize)]
pub struct SeedUser {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// A store to create, owned by the user with `author` as email.
#[derive(Debug, Deserialize)]
pub struct SeedStore {
    pub author: String,
    #[serde(flatten)]
    pub input: StoreInput,
}

/// A review of the store named `store`, written by the user with `author` as email.
#[derive(Debug, Deserialize)]
pub struct SeedReview {
    pub store: String,
    pub author: String,
    pub rating: i64,
    pub text: String,
}

/// Counts of what was inserted.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct SeedSummary {
    pub users: usize,
    pub stores: usize,
    pub reviews: usize,
}

fn email_key(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Check cross references and ratings before touching the database.
#[must_use]
pub fn validate_seed(seed: &SeedFile) -> Vec<String> {
    let mut errors = Vec::new();

    let mut emails = HashSet::new();
    for user in &seed.users {
        if Email::parse(&user.email).is_err() {
            errors.push(format!("user {:?}: invalid email", user.email));
        }
        if !emails.insert(email_key(&user.email)) {
            errors.push(format!("user {:?}: listed twice", user.email));
        }
    }

    let mut store_names = HashSet::new();
    for store in &seed.stores {
        if !emails.contains(&email_key(&store.author)) {
            errors.push(format!("store {:?}: unknown author {:?}", store.input.name, store.author));
        }
        if !store_names.insert(store.input.name.trim()) {
            errors.push(format!("store {:?}: listed twice", store.input.name));
        }
    }

    for review in &seed.reviews {
        if !store_names.contains(review.store.trim()) {
            errors.push(format!("review of {:?}: unknown store", review.store));
        }
        if !emails.contains(&email_key(&review.author)) {
            errors.push(format!("review of {:?}: unknown author {:?}", review.store, review.author));
        }
        if let Err(e) = Rating::new(review.rating) {
            errors.push(format!("review of {:?}: {e}", review.store));
        }
    }

    errors
}

/// Seed from `file_path`, optionally wiping existing data first.
///
/// # Errors
///
/// Returns an error if the file is unreadable or invalid, the connection
/// fails, or any insert fails.
pub async fn run(file_path: &Path, clear_existing: bool) -> Result<SeedSummary, SeedError> {
    info!(path = %file_path.display(), "Loading seed data from file");
    let content = tokio::fs::read_to_string(file_path).await?;
    let seed: SeedFile = serde_yaml::from_str(&content)?;

    let errors = validate_seed(&seed);
    if !errors.is_empty() {
        for err in &errors {
            warn!("  - {err}");
        }
        return Err(SeedError::Invalid(errors));
    }

    let pool = super::connect().await?;
    if clear_existing {
        clear(&pool).await?;
    }

    let summary = insert(&pool, seed).await?;
    info!(
        users = summary.users,
        stores = summary.stores,
        reviews = summary.reviews,
        "Seeding complete!"
    );
    Ok(summary)
}

/// Delete every store, review, heart and user.
async fn clear(pool: &PgPool) -> Result<(), sqlx::Error> {
    warn!("Clearing existing data");
    sqlx::query("TRUNCATE review, user_heart, store, app_user RESTART IDENTITY CASCADE")
        .execute(pool)
        .await?;
    Ok(())
}

async fn insert(pool: &PgPool, seed: SeedFile) -> Result<SeedSummary, SeedError> {
    let mut summary = SeedSummary::default();

    let auth = AuthService::new(pool);
    let users = UserRepository::new(pool);
    let mut user_ids: HashMap<String, UserId> = HashMap::new();
    for user in seed.users {
        let key = email_key(&user.email);
        let registration = Registration {
            name: user.name,
            email: user.email,
            password_confirm: user.password.clone(),
            password: user.password,
        };
        let id = match auth.register(registration).await {
            Ok(created) => {
                summary.users += 1;
                created.id
            }
            Err(AuthError::UserAlreadyExists) => {
                let email = Email::parse(&key).map_err(AuthError::from)?;
                let (existing, _) = users
                    .get_password_hash(&email)
                    .await?
                    .ok_or(AuthError::UserNotFound)?;
                info!(email = %key, "user already exists, reusing");
                existing.id
            }
            Err(e) => return Err(e.into()),
        };
        user_ids.insert(key, id);
    }

    let repo = StoreRepository::new(pool);
    let service = StoreService::new(&repo);
    let mut store_ids: HashMap<String, StoreId> = HashMap::new();
    for store in seed.stores {
        let author = author_id(&user_ids, &store.author)?;
        let name = store.input.name.trim().to_owned();
        let created = service.create(store.input, author).await?;
        info!(slug = %created.slug, "store created");
        store_ids.insert(name, created.id);
        summary.stores += 1;
    }

    let reviews = ReviewRepository::new(pool);
    for review in seed.reviews {
        let author = author_id(&user_ids, &review.author)?;
        let store = *store_ids
            .get(review.store.trim())
            .ok_or_else(|| SeedError::Invalid(vec![format!("unknown store {:?}", review.store)]))?;
        reviews
            .create(store, author, Rating::new(review.rating)?, review.text.trim())
            .await?;
        summary.reviews += 1;
    }

    Ok(summary)
}

fn author_id(user_ids: &HashMap<String, UserId>, email: &str) -> Result<UserId, SeedError> {
    user_ids
        .get(&email_key(email))
        .copied()
        .ok_or_else(|| SeedError::Invalid(vec![format!("unknown author {email:?}")]))
}
