/*
 * Responsibility
 * - Recipe types handed to the views and stored in the cache
 * - Optional upstream fields stay Option / empty; absence is a valid state
 */
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::query::{MAX_OFFSET, PAGE_SIZE};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeSummary {
    pub id: u64,
    pub title: String,
    pub image_url: Option<String>,
    pub used_ingredients: Vec<String>,
    pub missed_ingredients: Vec<String>,
    pub likes: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeCollection {
    pub recipes: Vec<RecipeSummary>,
    pub total_results: u32,
    pub offset: u32,
    pub fetched_at: DateTime<Utc>,
}

impl RecipeCollection {
    pub fn is_empty(&self) -> bool {
        self.recipes.is_empty()
    }

    /// Offset of the next page, if there is one the search form will accept.
    pub fn next_offset(&self) -> Option<u32> {
        let next = self.offset.saturating_add(PAGE_SIZE);
        (next < self.total_results && next <= MAX_OFFSET).then_some(next)
    }

    pub fn previous_offset(&self) -> Option<u32> {
        (self.offset > 0).then(|| self.offset.saturating_sub(PAGE_SIZE))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngredientLine {
    pub name: String,
    /// Measured line as written in the recipe, e.g. "2 cups flour".
    pub original: Option<String>,
    pub aisle: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstructionStep {
    pub number: u32,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Instructions {
    Steps(Vec<InstructionStep>),
    Text(String),
    Missing,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NutritionFact {
    pub name: String,
    pub amount: f64,
    pub unit: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeDetail {
    pub id: u64,
    pub title: String,
    pub image_url: Option<String>,
    pub source_url: Option<String>,
    pub servings: Option<u32>,
    pub ready_in_minutes: Option<u32>,
    pub ingredients: Vec<IngredientLine>,
    pub instructions: Instructions,
    pub nutrition: Vec<NutritionFact>,
}
