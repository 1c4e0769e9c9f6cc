//! Catalog behavior against an in-memory backend.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use chrono::Utc;
use delicious_core::catalog::{
    CatalogError, SlugPattern, StoreCatalog, StoreService, TOP_STORES_LIMIT, tag_list, top_stores,
};
use delicious_core::{
    Rating, Review, ReviewId, Store, StoreDraft, StoreId, StoreInput, StoreValidationError, UserId,
};

#[derive(Debug, thiserror::Error)]
#[error("backend unavailable")]
struct Unavailable;

#[derive(Default)]
struct MemoryCatalog {
    stores: Mutex<Vec<Store>>,
    reviews: Mutex<Vec<Review>>,
    slug_queries: AtomicUsize,
    saves: AtomicUsize,
    broken: bool,
}

impl MemoryCatalog {
    fn broken() -> Self {
        Self {
            broken: true,
            ..Self::default()
        }
    }

    fn add_review(&self, store: StoreId, rating: i64) {
        let mut reviews = self.reviews.lock().unwrap();
        let id = i32::try_from(reviews.len()).unwrap() + 1;
        reviews.push(Review {
            id: ReviewId::new(id),
            store,
            author: UserId::new(1),
            rating: Rating::new(rating).unwrap(),
            text: "review".to_owned(),
            created: Utc::now(),
        });
    }

    fn check(&self) -> Result<(), Unavailable> {
        if self.broken { Err(Unavailable) } else { Ok(()) }
    }
}

impl StoreCatalog for MemoryCatalog {
    type Error = Unavailable;

    async fn find_stores_by_slug_pattern(
        &self,
        pattern: &SlugPattern,
    ) -> Result<Vec<Store>, Unavailable> {
        self.slug_queries.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        Ok(self
            .stores
            .lock()
            .unwrap()
            .iter()
            .filter(|s| pattern.is_match(&s.slug))
            .cloned()
            .collect())
    }

    async fn find_all_stores(&self) -> Result<Vec<Store>, Unavailable> {
        self.check()?;
        Ok(self.stores.lock().unwrap().clone())
    }

    async fn find_reviews_by_store(&self, store: StoreId) -> Result<Vec<Review>, Unavailable> {
        self.check()?;
        Ok(self
            .reviews
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.store == store)
            .cloned()
            .collect())
    }

    async fn save_store(&self, draft: StoreDraft) -> Result<Store, Unavailable> {
        self.saves.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        let mut stores = self.stores.lock().unwrap();
        let id = match draft.id {
            Some(id) => id,
            None => StoreId::new(i32::try_from(stores.len()).unwrap() + 1),
        };
        let store = Store {
            id,
            name: draft.name,
            slug: draft.slug,
            description: draft.description,
            tags: draft.tags,
            created: draft.created,
            location: draft.location,
            photo: draft.photo,
            author: draft.author,
        };
        match stores.iter_mut().find(|s| s.id == id) {
            Some(existing) => *existing = store.clone(),
            None => stores.push(store.clone()),
        }
        Ok(store)
    }
}

fn input(name: &str, tags: &[&str]) -> StoreInput {
    StoreInput {
        name: name.to_owned(),
        description: Some("A place".to_owned()),
        tags: tags.iter().map(|t| (*t).to_owned()).collect(),
        address: Some("12 King St W, Hamilton".to_owned()),
        lng: Some(-79.87),
        lat: Some(43.25),
        photo: None,
    }
}

const AUTHOR: UserId = UserId::new(7);

#[tokio::test]
async fn test_same_name_twice_gets_numbered_slug() {
    let catalog = MemoryCatalog::default();
    let service = StoreService::new(&catalog);

    let a = service.create(input("Coffee House", &[]), AUTHOR).await.unwrap();
    let b = service.create(input("Coffee House", &[]), AUTHOR).await.unwrap();
    let c = service.create(input("coffee house", &[]), AUTHOR).await.unwrap();

    assert_eq!(a.slug, "coffee-house");
    assert_eq!(b.slug, "coffee-house-2");
    assert_eq!(c.slug, "coffee-house-3");
}

#[tokio::test]
async fn test_distinct_names_get_distinct_slugs() {
    let catalog = MemoryCatalog::default();
    let service = StoreService::new(&catalog);

    let names = [
        "Cafe", "Cafe Nero", "CAFE", "Nero", "Cafe-Nero Two", "cafe nero", "Bakery", "Café",
    ];
    for name in names {
        service.create(input(name, &[]), AUTHOR).await.unwrap();
    }

    let mut slugs: Vec<String> = catalog
        .find_all_stores()
        .await
        .unwrap()
        .into_iter()
        .map(|s| s.slug.to_lowercase())
        .collect();
    slugs.sort();
    let before = slugs.len();
    slugs.dedup();
    assert_eq!(slugs.len(), before);
}

#[tokio::test]
async fn test_slug_match_ignores_case_of_existing_slug() {
    let catalog = MemoryCatalog::default();
    let service = StoreService::new(&catalog);

    let mut legacy = service.create(input("Bistro", &[]), AUTHOR).await.unwrap();
    legacy.slug = "BISTRO".to_owned();
    catalog.stores.lock().unwrap()[0] = legacy;

    let fresh = service.create(input("Bistro", &[]), AUTHOR).await.unwrap();
    assert_eq!(fresh.slug, "bistro-2");
}

#[tokio::test]
async fn test_update_with_same_name_keeps_slug_without_query() {
    let catalog = MemoryCatalog::default();
    let service = StoreService::new(&catalog);

    service.create(input("Coffee House", &[]), AUTHOR).await.unwrap();
    let second = service.create(input("Coffee House", &[]), AUTHOR).await.unwrap();
    assert_eq!(second.slug, "coffee-house-2");
    let queries = catalog.slug_queries.load(Ordering::SeqCst);

    let updated = service
        .update(&second, input("  Coffee House ", &["Wifi"]))
        .await
        .unwrap();

    assert_eq!(updated.slug, "coffee-house-2");
    assert_eq!(updated.tags, vec!["Wifi"]);
    assert_eq!(catalog.slug_queries.load(Ordering::SeqCst), queries);
}

#[tokio::test]
async fn test_rename_recomputes_slug() {
    let catalog = MemoryCatalog::default();
    let service = StoreService::new(&catalog);

    service.create(input("Tea Room", &[]), AUTHOR).await.unwrap();
    let store = service.create(input("Old Name", &[]), AUTHOR).await.unwrap();

    let renamed = service.update(&store, input("Tea Room", &[])).await.unwrap();
    assert_eq!(renamed.slug, "tea-room-2");
    assert_eq!(renamed.id, store.id);
    assert_eq!(renamed.created, store.created);
    assert_eq!(renamed.author, AUTHOR);
}

#[tokio::test]
async fn test_update_keeps_photo_unless_replaced() {
    let catalog = MemoryCatalog::default();
    let service = StoreService::new(&catalog);

    let mut with_photo = input("Deli", &[]);
    with_photo.photo = Some("a.jpeg".to_owned());
    let store = service.create(with_photo, AUTHOR).await.unwrap();

    let kept = service.update(&store, input("Deli", &[])).await.unwrap();
    assert_eq!(kept.photo.as_deref(), Some("a.jpeg"));

    let mut replacement = input("Deli", &[]);
    replacement.photo = Some("b.png".to_owned());
    let replaced = service.update(&kept, replacement).await.unwrap();
    assert_eq!(replaced.photo.as_deref(), Some("b.png"));
}

#[tokio::test]
async fn test_invalid_input_touches_nothing() {
    let catalog = MemoryCatalog::default();
    let service = StoreService::new(&catalog);

    let mut no_address = input("Diner", &[]);
    no_address.address = Some("   ".to_owned());

    let err = service.create(no_address, AUTHOR).await.unwrap_err();
    assert!(matches!(
        err,
        CatalogError::Validation(StoreValidationError::MissingAddress)
    ));
    assert_eq!(catalog.slug_queries.load(Ordering::SeqCst), 0);
    assert_eq!(catalog.saves.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_slug_lookup_failure_aborts_save() {
    let catalog = MemoryCatalog::broken();
    let service = StoreService::new(&catalog);

    let err = service.create(input("Diner", &[]), AUTHOR).await.unwrap_err();
    assert!(matches!(err, CatalogError::Repository(Unavailable)));
    assert_eq!(catalog.saves.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_tag_list_counts_and_orders() {
    let catalog = MemoryCatalog::default();
    let service = StoreService::new(&catalog);
    service.create(input("One", &["a", "b"]), AUTHOR).await.unwrap();
    service.create(input("Two", &["a"]), AUTHOR).await.unwrap();
    service.create(input("Three", &["c"]), AUTHOR).await.unwrap();

    let tags = tag_list(&catalog).await.unwrap();
    let pairs: Vec<(&str, usize)> = tags.iter().map(|t| (t.tag.as_str(), t.count)).collect();
    assert_eq!(pairs, vec![("a", 2), ("b", 1), ("c", 1)]);

    assert_eq!(tag_list(&catalog).await.unwrap(), tags);
}

#[tokio::test]
async fn test_top_stores_requires_two_reviews() {
    let catalog = MemoryCatalog::default();
    let service = StoreService::new(&catalog);
    let x = service.create(input("X", &[]), AUTHOR).await.unwrap();
    let y = service.create(input("Y", &[]), AUTHOR).await.unwrap();
    catalog.add_review(x.id, 4);
    catalog.add_review(x.id, 5);
    catalog.add_review(y.id, 5);

    let top = top_stores(&catalog).await.unwrap();
    assert_eq!(top.len(), 1);
    assert_eq!(top[0].slug, "x");
    assert!((top[0].average_rating - 4.5).abs() < f64::EPSILON);
}

#[tokio::test]
async fn test_top_stores_bounded_and_sorted() {
    let catalog = MemoryCatalog::default();
    let service = StoreService::new(&catalog);
    for i in 0..1000_i64 {
        let store = service
            .create(input(&format!("Store {i}"), &[]), AUTHOR)
            .await
            .unwrap();
        catalog.add_review(store.id, i % 5 + 1);
        catalog.add_review(store.id, (i / 5) % 5 + 1);
    }

    let top = top_stores(&catalog).await.unwrap();
    assert_eq!(top.len(), TOP_STORES_LIMIT);
    assert!(top.windows(2).all(|w| w[0].average_rating >= w[1].average_rating));
    assert!(top.iter().all(|t| t.reviews.len() >= 2));

    let again = top_stores(&catalog).await.unwrap();
    let slugs = |v: &[delicious_core::catalog::TopStore]| {
        v.iter().map(|t| t.slug.clone()).collect::<Vec<_>>()
    };
    assert_eq!(slugs(&top), slugs(&again));
}

#[tokio::test]
async fn test_reporting_propagates_backend_errors() {
    let catalog = MemoryCatalog::broken();
    assert!(tag_list(&catalog).await.is_err());
    assert!(top_stores(&catalog).await.is_err());
}
