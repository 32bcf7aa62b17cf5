/*
 * Responsibility
 * - Raw form DTOs for /generate and /calories
 * - validate(): raw strings → normalized values, or ValidationError
 */
use serde::Deserialize;

use crate::error::ValidationError;
use crate::services::recipes::{Diet, SearchQuery};

pub const MAX_INGREDIENTS_LEN: usize = 500;
pub const MAX_INGREDIENTS: usize = 20;

fn split_ingredients(raw: &str) -> Vec<&str> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

/// Common checks on the free-text ingredient field.
fn ingredient_field(raw: Option<&str>) -> Result<Vec<&str>, ValidationError> {
    let raw = raw.unwrap_or_default().trim();
    if raw.chars().count() > MAX_INGREDIENTS_LEN {
        return Err(ValidationError::IngredientsTooLong {
            max: MAX_INGREDIENTS_LEN,
        });
    }

    let items = split_ingredients(raw);
    if items.is_empty() {
        return Err(ValidationError::MissingIngredients);
    }
    Ok(items)
}

// Every field is optional so a missing field becomes a ValidationError page
// rather than an extractor rejection.
#[derive(Debug, Default, Deserialize)]
pub struct GenerateForm {
    pub ingredients: Option<String>,
    pub diet: Option<String>,
    pub offset: Option<String>,
}

impl GenerateForm {
    pub fn validate(&self, enabled_diets: &[Diet]) -> Result<SearchQuery, ValidationError> {
        let items = ingredient_field(self.ingredients.as_deref())?;

        let diet = match self.diet.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(d) if d.eq_ignore_ascii_case("none") => None,
            Some(d) => {
                let diet = d
                    .parse::<Diet>()
                    .map_err(|e| ValidationError::UnknownDiet(e.0))?;
                if !enabled_diets.contains(&diet) {
                    return Err(ValidationError::DietNotEnabled(diet));
                }
                Some(diet)
            }
        };

        let offset = match self.offset.as_deref().map(str::trim) {
            None | Some("") => 0,
            Some(o) => o.parse::<u32>().map_err(|_| ValidationError::InvalidOffset)?,
        };

        let query = SearchQuery::new(items, diet, offset)?;
        if query.ingredient_count() > MAX_INGREDIENTS {
            return Err(ValidationError::TooManyIngredients {
                max: MAX_INGREDIENTS,
            });
        }

        Ok(query)
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct CaloriesForm {
    pub ingredients: Option<String>,
}

impl CaloriesForm {
    pub fn validate(&self) -> Result<Vec<String>, ValidationError> {
        let items = ingredient_field(self.ingredients.as_deref())?;
        if items.len() > MAX_INGREDIENTS {
            return Err(ValidationError::TooManyIngredients {
                max: MAX_INGREDIENTS,
            });
        }
        Ok(items.into_iter().map(str::to_string).collect())
    }
}
