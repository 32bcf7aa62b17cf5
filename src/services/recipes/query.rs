//! Normalized search parameters and the cache fingerprint derived from them.
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Results requested per upstream page.
pub const PAGE_SIZE: u32 = 10;
/// Deepest offset the upstream search accepts.
pub const MAX_OFFSET: u32 = 900;

/// Dietary filter understood by the upstream API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Diet {
    Vegetarian,
    Vegan,
    GlutenFree,
    Ketogenic,
    Paleo,
    DairyFree,
}

impl Diet {
    pub const ALL: [Diet; 6] = [
        Diet::Vegetarian,
        Diet::Vegan,
        Diet::GlutenFree,
        Diet::Ketogenic,
        Diet::Paleo,
        Diet::DairyFree,
    ];

    /// Form value and fingerprint component.
    pub fn as_str(self) -> &'static str {
        match self {
            Diet::Vegetarian => "vegetarian",
            Diet::Vegan => "vegan",
            Diet::GlutenFree => "gluten-free",
            Diet::Ketogenic => "ketogenic",
            Diet::Paleo => "paleo",
            Diet::DairyFree => "dairy-free",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Diet::Vegetarian => "Vegetarian",
            Diet::Vegan => "Vegan",
            Diet::GlutenFree => "Gluten free",
            Diet::Ketogenic => "Ketogenic",
            Diet::Paleo => "Paleo",
            Diet::DairyFree => "Dairy free",
        }
    }

    /// Query parameter (name, value) used upstream.
    ///
    /// Dairy-free is an intolerance upstream, not a diet.
    pub fn upstream_param(self) -> (&'static str, &'static str) {
        match self {
            Diet::Vegetarian => ("diet", "vegetarian"),
            Diet::Vegan => ("diet", "vegan"),
            Diet::GlutenFree => ("diet", "gluten free"),
            Diet::Ketogenic => ("diet", "ketogenic"),
            Diet::Paleo => ("diet", "paleo"),
            Diet::DairyFree => ("intolerances", "dairy"),
        }
    }
}

impl fmt::Display for Diet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown diet: {0}")]
pub struct UnknownDiet(pub String);

impl FromStr for Diet {
    type Err = UnknownDiet;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace(['_', ' '], "-");
        Diet::ALL
            .into_iter()
            .find(|d| d.as_str() == normalized)
            .ok_or_else(|| UnknownDiet(s.trim().to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    #[error("no ingredients given")]
    NoIngredients,
    #[error("offset {0} is beyond {max}", max = MAX_OFFSET)]
    OffsetOutOfRange(u32),
}

/// A search after normalization.
///
/// Ingredients are trimmed, lower-cased, deduplicated and kept sorted, so two
/// queries that differ only in order or case compare equal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    ingredients: BTreeSet<String>,
    diet: Option<Diet>,
    offset: u32,
}

impl SearchQuery {
    pub fn new<I, S>(ingredients: I, diet: Option<Diet>, offset: u32) -> Result<Self, QueryError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let ingredients: BTreeSet<String> = ingredients
            .into_iter()
            .map(|s| s.as_ref().trim().to_lowercase())
            .filter(|s| !s.is_empty())
            .collect();

        if ingredients.is_empty() {
            return Err(QueryError::NoIngredients);
        }
        if offset > MAX_OFFSET {
            return Err(QueryError::OffsetOutOfRange(offset));
        }

        Ok(Self {
            ingredients,
            diet,
            offset,
        })
    }

    pub fn ingredients(&self) -> impl Iterator<Item = &str> {
        self.ingredients.iter().map(String::as_str)
    }

    pub fn ingredient_count(&self) -> usize {
        self.ingredients.len()
    }

    pub fn diet(&self) -> Option<Diet> {
        self.diet
    }

    pub fn offset(&self) -> u32 {
        self.offset
    }

    /// Comma-joined ingredient list, as sent upstream and echoed in forms.
    pub fn joined_ingredients(&self) -> String {
        self.ingredients().collect::<Vec<_>>().join(",")
    }

    /// Hex SHA-256 over the canonical form of the query.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        for ingredient in &self.ingredients {
            hasher.update(ingredient.as_bytes());
            hasher.update([0u8]);
        }
        hasher.update(b"diet=");
        hasher.update(self.diet.map_or("none", Diet::as_str).as_bytes());
        hasher.update(b";offset=");
        hasher.update(self.offset.to_string().as_bytes());
        format!("{:x}", hasher.finalize())
    }

    pub fn cache_key(&self) -> CacheKey {
        CacheKey(format!("recipes:search:{}", self.fingerprint()))
    }
}

/// Key under which a pipeline result is cached.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn detail(id: u64) -> Self {
        Self(format!("recipes:detail:{id}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_case_duplicates_and_whitespace() {
        let q = SearchQuery::new(["Egg", "egg", " Flour "], Some(Diet::Vegetarian), 0).unwrap();
        assert_eq!(q.ingredients().collect::<Vec<_>>(), vec!["egg", "flour"]);
        assert_eq!(q.joined_ingredients(), "egg,flour");
    }

    #[test]
    fn ordering_and_case_do_not_change_the_key() {
        let a = SearchQuery::new(["flour", "EGG"], Some(Diet::Vegetarian), 0).unwrap();
        let b = SearchQuery::new(["Egg", "Flour"], Some(Diet::Vegetarian), 0).unwrap();
        assert_eq!(a.cache_key(), b.cache_key());
        assert_eq!(a, b);
    }

    #[test]
    fn diet_and_offset_are_part_of_the_key() {
        let base = SearchQuery::new(["egg"], None, 0).unwrap();
        let vegan = SearchQuery::new(["egg"], Some(Diet::Vegan), 0).unwrap();
        let paged = SearchQuery::new(["egg"], None, 10).unwrap();
        assert_ne!(base.cache_key(), vegan.cache_key());
        assert_ne!(base.cache_key(), paged.cache_key());
    }

    #[test]
    fn ingredient_boundaries_are_part_of_the_key() {
        let split = SearchQuery::new(["ab", "c"], None, 0).unwrap();
        let joined = SearchQuery::new(["a", "bc"], None, 0).unwrap();
        assert_ne!(split.fingerprint(), joined.fingerprint());
    }

    #[test]
    fn rejects_blank_ingredient_lists() {
        assert_eq!(
            SearchQuery::new(["", "  "], None, 0),
            Err(QueryError::NoIngredients)
        );
        assert_eq!(
            SearchQuery::new(Vec::<String>::new(), None, 0),
            Err(QueryError::NoIngredients)
        );
    }

    #[test]
    fn rejects_offsets_past_the_upstream_limit() {
        assert_eq!(
            SearchQuery::new(["egg"], None, MAX_OFFSET + 1),
            Err(QueryError::OffsetOutOfRange(MAX_OFFSET + 1))
        );
    }

    #[test]
    fn parses_diet_spellings() {
        assert_eq!("Gluten Free".parse::<Diet>(), Ok(Diet::GlutenFree));
        assert_eq!("dairy_free".parse::<Diet>(), Ok(Diet::DairyFree));
        assert_eq!("KETOGENIC".parse::<Diet>(), Ok(Diet::Ketogenic));
        assert!("carnivore".parse::<Diet>().is_err());
    }

    #[test]
    fn dairy_free_maps_to_an_intolerance() {
        assert_eq!(Diet::DairyFree.upstream_param(), ("intolerances", "dairy"));
        assert_eq!(Diet::GlutenFree.upstream_param(), ("diet", "gluten free"));
    }
}
