//! Tag usage counts.

use std::collections::HashMap;

use serde::Serialize;

use super::repository::StoreCatalog;
use crate::types::Store;

/// A tag and how many stores use it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagCount {
    /// The tag value.
    pub tag: String,
    /// Number of stores carrying it.
    pub count: usize,
}

/// Count tag usage across `stores`, most used first.
///
/// Tags are grouped in order of first appearance and the final sort is
/// stable, so equal counts keep that order. Callers should still treat tie
/// order as unspecified.
#[must_use]
pub fn count_tags<'a, I>(stores: I) -> Vec<TagCount>
where
    I: IntoIterator<Item = &'a Store>,
{
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut counts: Vec<TagCount> = Vec::new();

    for tag in stores.into_iter().flat_map(|store| store.tags.iter()) {
        match index.get(tag.as_str()) {
            Some(&i) => {
                if let Some(entry) = counts.get_mut(i) {
                    entry.count += 1;
                }
            }
            None => {
                index.insert(tag.as_str(), counts.len());
                counts.push(TagCount {
                    tag: tag.clone(),
                    count: 1,
                });
            }
        }
    }

    counts.sort_by(|a, b| b.count.cmp(&a.count));
    counts
}

/// Every tag in use with its count, most used first.
///
/// # Errors
///
/// Propagates the catalog's error if loading stores fails.
pub async fn tag_list<C: StoreCatalog>(catalog: &C) -> Result<Vec<TagCount>, C::Error> {
    let stores = catalog.find_all_stores().await?;
    let tags = count_tags(&stores);
    tracing::debug!(stores = stores.len(), tags = tags.len(), "counted tags");
    Ok(tags)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::testing::store_with_tags;

    fn counts(tags: &[TagCount]) -> Vec<(&str, usize)> {
        tags.iter().map(|t| (t.tag.as_str(), t.count)).collect()
    }

    #[test]
    fn test_counts_and_orders_by_usage() {
        let stores = vec![
            store_with_tags(1, &["a", "b"]),
            store_with_tags(2, &["a"]),
            store_with_tags(3, &["c"]),
        ];
        let tags = count_tags(&stores);
        assert_eq!(counts(&tags), vec![("a", 2), ("b", 1), ("c", 1)]);
    }

    #[test]
    fn test_most_used_first_even_when_seen_last() {
        let stores = vec![
            store_with_tags(1, &["Wifi"]),
            store_with_tags(2, &["Licensed"]),
            store_with_tags(3, &["Licensed"]),
            store_with_tags(4, &["Licensed", "Wifi"]),
            store_with_tags(5, &["Licensed"]),
        ];
        let tags = count_tags(&stores);
        assert_eq!(counts(&tags), vec![("Licensed", 4), ("Wifi", 2)]);
    }

    #[test]
    fn test_stores_without_tags_contribute_nothing() {
        let stores = vec![store_with_tags(1, &[]), store_with_tags(2, &[])];
        assert!(count_tags(&stores).is_empty());
    }

    #[test]
    fn test_tags_are_case_sensitive() {
        let stores = vec![store_with_tags(1, &["wifi"]), store_with_tags(2, &["Wifi"])];
        assert_eq!(count_tags(&stores).len(), 2);
    }
}
