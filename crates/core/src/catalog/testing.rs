//! Builders for unit tests.

#![allow(clippy::unwrap_used)]

use chrono::{TimeZone, Utc};

use super::slug::slugify;
use crate::types::{GeoPoint, Location, Rating, Review, ReviewId, Store, StoreId, UserId};

pub fn store_named(id: i32, name: &str) -> Store {
    Store {
        id: StoreId::new(id),
        name: name.to_owned(),
        slug: slugify(name),
        description: None,
        tags: Vec::new(),
        created: Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap(),
        location: Location::point(GeoPoint::new(-79.8, 43.2).unwrap(), "1 Main St".into()),
        photo: None,
        author: UserId::new(1),
    }
}

pub fn store_with_tags(id: i32, tags: &[&str]) -> Store {
    let mut store = store_named(id, &format!("Store {id}"));
    store.tags = tags.iter().map(|t| (*t).to_owned()).collect();
    store
}

pub fn review(id: i32, store: i32, rating: i64) -> Review {
    Review {
        id: ReviewId::new(id),
        store: StoreId::new(store),
        author: UserId::new(1),
        rating: Rating::new(rating).unwrap(),
        text: String::new(),
        created: Utc.with_ymd_and_hms(2024, 2, 1, 12, 0, 0).unwrap(),
    }
}
