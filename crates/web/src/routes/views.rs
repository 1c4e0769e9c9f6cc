//! View models shared by the page templates.
//!
//! Templates only print prepared strings and booleans; formatting happens here.

use delicious_core::{Store, UserId};

use super::MessageQuery;
use crate::models::{CurrentUser, User};

/// Tags offered on the store form.
pub const TAG_CHOICES: [&str; 5] = ["Wifi", "Open Late", "Family Friendly", "Vegetarian", "Licensed"];

/// Words of the description shown on a store card.
const CARD_DESCRIPTION_WORDS: usize = 25;

/// Data every page's layout needs.
#[derive(Debug, Clone)]
pub struct PageContext {
    /// Document title.
    pub title: String,
    /// Logged-in user, if any.
    pub user: Option<CurrentUser>,
    /// Flash error from the query string.
    pub error: Option<String>,
    /// Flash success from the query string.
    pub success: Option<String>,
}

impl PageContext {
    #[must_use]
    pub fn new(title: impl Into<String>, user: Option<CurrentUser>, flash: MessageQuery) -> Self {
        Self {
            title: title.into(),
            user,
            error: flash.error.filter(|m| !m.is_empty()),
            success: flash.success.filter(|m| !m.is_empty()),
        }
    }
}

/// Public URL of a stored photo.
#[must_use]
pub fn photo_url(photo: Option<&str>) -> Option<String> {
    photo.map(|p| format!("/uploads/{p}"))
}

/// First `words` words of `text`, with an ellipsis when cut.
#[must_use]
pub fn truncate_words(text: &str, words: usize) -> String {
    let mut iter = text.split_whitespace();
    let head: Vec<&str> = iter.by_ref().take(words).collect();
    let mut out = head.join(" ");
    if iter.next().is_some() {
        out.push('…');
    }
    out
}

/// A store as shown in listings.
#[derive(Debug, Clone)]
pub struct StoreCard {
    pub id: i32,
    pub name: String,
    pub slug: String,
    pub summary: String,
    pub photo_url: Option<String>,
    /// The viewer owns this store and may edit it.
    pub editable: bool,
    /// The viewer has hearted this store.
    pub hearted: bool,
}

impl StoreCard {
    /// Build a card for `store` as seen by `viewer`.
    #[must_use]
    pub fn new(store: &Store, viewer: Option<&User>) -> Self {
        Self {
            id: store.id.as_i32(),
            name: store.name.clone(),
            slug: store.slug.clone(),
            summary: store
                .description
                .as_deref()
                .map(|d| truncate_words(d, CARD_DESCRIPTION_WORDS))
                .unwrap_or_default(),
            photo_url: photo_url(store.photo.as_deref()),
            editable: viewer.is_some_and(|u| store.is_owned_by(u.id)),
            hearted: viewer.is_some_and(|u| u.has_hearted(store.id)),
        }
    }

    /// Cards for `stores` as seen by `viewer`.
    #[must_use]
    pub fn many(stores: &[Store], viewer: Option<&User>) -> Vec<Self> {
        stores.iter().map(|s| Self::new(s, viewer)).collect()
    }
}

/// One checkbox on the store form.
#[derive(Debug, Clone)]
pub struct TagChoice {
    pub name: &'static str,
    pub checked: bool,
}

/// Values pre-filled in the add/edit form.
#[derive(Debug, Clone)]
pub struct StoreFormView {
    /// Form target: `/add` or `/add/{id}`.
    pub action: String,
    pub name: String,
    pub description: String,
    pub address: String,
    pub lng: String,
    pub lat: String,
    pub photo_url: Option<String>,
    pub tags: Vec<TagChoice>,
}

impl StoreFormView {
    /// Empty form for a new store.
    #[must_use]
    pub fn blank() -> Self {
        Self {
            action: "/add".to_string(),
            name: String::new(),
            description: String::new(),
            address: String::new(),
            lng: String::new(),
            lat: String::new(),
            photo_url: None,
            tags: tag_choices(&[]),
        }
    }

    /// Form pre-filled with an existing store.
    #[must_use]
    pub fn for_store(store: &Store) -> Self {
        Self {
            action: format!("/add/{}", store.id),
            name: store.name.clone(),
            description: store.description.clone().unwrap_or_default(),
            address: store.location.address.clone(),
            lng: store.location.coordinates.lng.to_string(),
            lat: store.location.coordinates.lat.to_string(),
            photo_url: photo_url(store.photo.as_deref()),
            tags: tag_choices(&store.tags),
        }
    }
}

/// The fixed tag choices, checked where `selected` contains them.
#[must_use]
pub fn tag_choices(selected: &[String]) -> Vec<TagChoice> {
    TAG_CHOICES
        .iter()
        .map(|&name| TagChoice {
            name,
            checked: selected.iter().any(|t| t == name),
        })
        .collect()
}

/// Whether `viewer` may edit a store authored by `author`.
#[must_use]
pub fn can_edit(author: UserId, viewer: Option<&CurrentUser>) -> bool {
    viewer.is_some_and(|u| u.id == author)
}
