//! Slug assignment.
//!
//! A store's slug is derived from its name: lower-cased, with every run of
//! non-alphanumeric characters collapsed into one hyphen. When other stores
//! already use that base (exactly, or with a `-N` suffix), the new slug becomes
//! `{base}-{count + 1}`.
//!
//! The uniqueness check is a plain read followed later by a write. Two stores
//! created concurrently with the same name can both see the same count and end
//! up with the same slug.

use regex::{Regex, RegexBuilder};

use super::CatalogError;
use super::repository::StoreCatalog;
use crate::types::StoreDraft;

/// Base used when a name has no letters or digits at all.
pub const FALLBACK_SLUG: &str = "store";

/// Turn a display name into a URL-safe base slug.
///
/// ```
/// use delicious_core::catalog::slugify;
///
/// assert_eq!(slugify("Coffee House"), "coffee-house");
/// assert_eq!(slugify("  Joe's   Diner!! "), "joe-s-diner");
/// assert_eq!(slugify("???"), "store");
/// ```
#[must_use]
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_hyphen = false;

    for c in name.chars() {
        if c.is_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.extend(c.to_lowercase());
        } else {
            pending_hyphen = true;
        }
    }

    if slug.is_empty() {
        FALLBACK_SLUG.to_owned()
    } else {
        slug
    }
}

/// Case-insensitive pattern matching a base slug and its `-N` variants.
///
/// The same source string is used for the in-process [`Regex`] and handed to
/// the database (Postgres `~*`), so both sides agree on what counts as taken.
#[derive(Debug, Clone)]
pub struct SlugPattern {
    base: String,
    source: String,
    regex: Regex,
}

impl SlugPattern {
    /// Build the pattern `^(base)((-[0-9]*)?)$`.
    ///
    /// `base` is escaped, so it only ever matches itself literally.
    ///
    /// # Errors
    ///
    /// Returns `regex::Error` if the compiled pattern exceeds the regex size
    /// limit.
    pub fn for_base(base: &str) -> Result<Self, regex::Error> {
        let source = format!("^({})((-[0-9]*)?)$", regex::escape(base));
        let regex = RegexBuilder::new(&source).case_insensitive(true).build()?;
        Ok(Self {
            base: base.to_owned(),
            source,
            regex,
        })
    }

    /// The base slug this pattern was built for.
    #[must_use]
    pub fn base(&self) -> &str {
        &self.base
    }

    /// The pattern source, for database-side matching.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Whether `slug` is the base or one of its numbered variants.
    #[must_use]
    pub fn is_match(&self, slug: &str) -> bool {
        self.regex.is_match(slug)
    }

    /// The slug to use given how many existing stores matched.
    #[must_use]
    pub fn disambiguate(&self, taken: usize) -> String {
        if taken == 0 {
            self.base.clone()
        } else {
            format!("{}-{}", self.base, taken + 1)
        }
    }
}

/// Computes unique slugs against a [`StoreCatalog`].
pub struct SlugAssigner<'a, C> {
    catalog: &'a C,
}

impl<'a, C: StoreCatalog> SlugAssigner<'a, C> {
    /// Create an assigner reading from `catalog`.
    #[must_use]
    pub const fn new(catalog: &'a C) -> Self {
        Self { catalog }
    }

    /// Compute a fresh slug for `name`.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Repository` when the catalog query fails.
    pub async fn unique_slug(&self, name: &str) -> Result<String, CatalogError<C::Error>> {
        let pattern = SlugPattern::for_base(&slugify(name))?;
        let taken = self
            .catalog
            .find_stores_by_slug_pattern(&pattern)
            .await
            .map_err(CatalogError::Repository)?;

        let slug = pattern.disambiguate(taken.len());
        tracing::debug!(base = pattern.base(), taken = taken.len(), %slug, "assigned slug");
        Ok(slug)
    }

    /// Set `draft.slug` if the name changed.
    ///
    /// `previous_name` is `None` for a new store, which always gets a slug.
    /// When the name is unchanged the draft is left untouched and no query is
    /// made. Returns whether the slug was recomputed.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Repository` when the catalog query fails.
    pub async fn assign(
        &self,
        draft: &mut StoreDraft,
        previous_name: Option<&str>,
    ) -> Result<bool, CatalogError<C::Error>> {
        if previous_name == Some(draft.name.as_str()) {
            return Ok(false);
        }
        draft.slug = self.unique_slug(&draft.name).await?;
        Ok(true)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify_basic() {
        assert_eq!(slugify("Coffee House"), "coffee-house");
        assert_eq!(slugify("COFFEE house"), "coffee-house");
    }

    #[test]
    fn test_slugify_collapses_separators() {
        assert_eq!(slugify("--Tim  Hortons -- #42--"), "tim-hortons-42");
        assert_eq!(slugify("A&W"), "a-w");
    }

    #[test]
    fn test_slugify_keeps_unicode_letters() {
        assert_eq!(slugify("Café Olé"), "café-olé");
    }

    #[test]
    fn test_slugify_empty_falls_back() {
        assert_eq!(slugify(""), FALLBACK_SLUG);
        assert_eq!(slugify(" !!! "), FALLBACK_SLUG);
    }

    #[test]
    fn test_pattern_source() {
        let pattern = SlugPattern::for_base("coffee-house").unwrap();
        assert_eq!(pattern.as_str(), r"^(coffee\-house)((-[0-9]*)?)$");
    }

    #[test]
    fn test_pattern_treats_base_literally() {
        let pattern = SlugPattern::for_base("a.b(c").unwrap();
        assert!(pattern.is_match("a.b(c"));
        assert!(pattern.is_match("A.B(C-2"));
        assert!(!pattern.is_match("axb(c"));
        assert_eq!(pattern.disambiguate(1), "a.b(c-2");
    }

    #[test]
    fn test_pattern_matches_base_and_numbered_variants() {
        let pattern = SlugPattern::for_base("coffee-house").unwrap();
        assert!(pattern.is_match("coffee-house"));
        assert!(pattern.is_match("Coffee-House"));
        assert!(pattern.is_match("coffee-house-2"));
        assert!(pattern.is_match("coffee-house-17"));
        assert!(!pattern.is_match("coffee-house-bar"));
        assert!(!pattern.is_match("coffee-houses"));
        assert!(!pattern.is_match("the-coffee-house"));
    }

    #[test]
    fn test_disambiguate() {
        let pattern = SlugPattern::for_base("cafe").unwrap();
        assert_eq!(pattern.disambiguate(0), "cafe");
        assert_eq!(pattern.disambiguate(1), "cafe-2");
        assert_eq!(pattern.disambiguate(4), "cafe-5");
    }
}
