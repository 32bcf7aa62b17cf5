//! Upstream JSON payloads and their mapping into display models.
//!
//! Every field the upstream may omit or send as `null` is optional here. The
//! mapping fills in defaults instead of failing the whole response.
use chrono::{DateTime, Utc};
use serde::Deserialize;
use url::Url;

use super::models::{
    IngredientLine, InstructionStep, Instructions, NutritionFact, RecipeCollection, RecipeDetail,
    RecipeSummary,
};

const UNTITLED: &str = "Untitled recipe";

/// Nutrients shown on the detail page, in display order.
pub const HEADLINE_NUTRIENTS: [&str; 9] = [
    "Calories",
    "Fat",
    "Saturated Fat",
    "Carbohydrates",
    "Sugar",
    "Protein",
    "Fiber",
    "Sodium",
    "Cholesterol",
];

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawSearchResponse {
    pub results: Option<Vec<RawSearchRecipe>>,
    pub total_results: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawSearchRecipe {
    pub id: u64,
    pub title: Option<String>,
    pub image: Option<String>,
    pub used_ingredients: Option<Vec<RawIngredient>>,
    pub missed_ingredients: Option<Vec<RawIngredient>>,
    pub aggregate_likes: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawIngredient {
    pub name: Option<String>,
    pub original: Option<String>,
    pub aisle: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawRecipeInformation {
    pub id: u64,
    pub title: Option<String>,
    pub image: Option<String>,
    pub source_url: Option<String>,
    pub servings: Option<u32>,
    pub ready_in_minutes: Option<u32>,
    pub extended_ingredients: Option<Vec<RawIngredient>>,
    pub analyzed_instructions: Option<Vec<RawInstructionBlock>>,
    pub instructions: Option<String>,
    pub nutrition: Option<RawNutrition>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawInstructionBlock {
    pub steps: Option<Vec<RawStep>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawStep {
    pub step: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawNutrition {
    pub nutrients: Option<Vec<RawNutrient>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawNutrient {
    pub name: Option<String>,
    pub amount: Option<f64>,
    pub unit: Option<String>,
}

fn non_blank(s: Option<String>) -> Option<String> {
    s.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

/// Upstream links end up in `href`/`src`; anything but http(s) is dropped.
fn web_url(s: Option<String>) -> Option<String> {
    let url = Url::parse(&non_blank(s)?).ok()?;
    matches!(url.scheme(), "http" | "https").then(|| url.into())
}

fn ingredient_names(raw: Option<Vec<RawIngredient>>) -> Vec<String> {
    raw.unwrap_or_default()
        .into_iter()
        .filter_map(|i| non_blank(i.name).or_else(|| non_blank(i.original)))
        .collect()
}

pub fn summary_from_raw(raw: RawSearchRecipe) -> RecipeSummary {
    RecipeSummary {
        id: raw.id,
        title: non_blank(raw.title).unwrap_or_else(|| UNTITLED.to_string()),
        image_url: web_url(raw.image),
        used_ingredients: ingredient_names(raw.used_ingredients),
        missed_ingredients: ingredient_names(raw.missed_ingredients),
        likes: raw.aggregate_likes.unwrap_or(0),
    }
}

pub fn collection_from_search(
    raw: RawSearchResponse,
    offset: u32,
    fetched_at: DateTime<Utc>,
) -> RecipeCollection {
    let recipes: Vec<RecipeSummary> = raw
        .results
        .unwrap_or_default()
        .into_iter()
        .map(summary_from_raw)
        .collect();

    // Without a total we can only vouch for what this page returned.
    let total_results = raw
        .total_results
        .unwrap_or_else(|| offset + recipes.len() as u32);

    RecipeCollection {
        recipes,
        total_results,
        offset,
        fetched_at,
    }
}

/// Strip markup from free-text instructions and decode entities.
fn plain_text(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut in_tag = false;
    for c in html.chars() {
        match c {
            '<' => {
                in_tag = true;
                out.push(' ');
            }
            '>' if in_tag => in_tag = false,
            _ if !in_tag => out.push(c),
            _ => {}
        }
    }
    let decoded = html_escape::decode_html_entities(&out);
    decoded.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn instructions_from_raw(
    blocks: Option<Vec<RawInstructionBlock>>,
    text: Option<String>,
) -> Instructions {
    let steps: Vec<InstructionStep> = blocks
        .unwrap_or_default()
        .into_iter()
        .flat_map(|b| b.steps.unwrap_or_default())
        .filter_map(|s| non_blank(s.step))
        .enumerate()
        // Numbering restarts per block upstream; number across blocks instead.
        .map(|(i, text)| InstructionStep {
            number: i as u32 + 1,
            text,
        })
        .collect();

    if !steps.is_empty() {
        return Instructions::Steps(steps);
    }

    match text.map(|t| plain_text(&t)).filter(|t| !t.is_empty()) {
        Some(t) => Instructions::Text(t),
        None => Instructions::Missing,
    }
}

fn nutrition_from_raw(raw: Option<RawNutrition>) -> Vec<NutritionFact> {
    let nutrients: Vec<NutritionFact> = raw
        .and_then(|n| n.nutrients)
        .unwrap_or_default()
        .into_iter()
        .filter_map(|n| {
            Some(NutritionFact {
                name: non_blank(n.name)?,
                amount: n.amount?,
                unit: n.unit.unwrap_or_default(),
            })
        })
        .collect();

    HEADLINE_NUTRIENTS
        .iter()
        .filter_map(|wanted| {
            nutrients
                .iter()
                .find(|n| n.name.eq_ignore_ascii_case(wanted))
                .cloned()
        })
        .collect()
}

pub fn detail_from_information(raw: RawRecipeInformation) -> RecipeDetail {
    let ingredients = raw
        .extended_ingredients
        .unwrap_or_default()
        .into_iter()
        .filter_map(|i| {
            let original = non_blank(i.original);
            let name = non_blank(i.name).or_else(|| original.clone())?;
            Some(IngredientLine {
                name,
                original,
                aisle: non_blank(i.aisle),
            })
        })
        .collect();

    RecipeDetail {
        id: raw.id,
        title: non_blank(raw.title).unwrap_or_else(|| UNTITLED.to_string()),
        image_url: web_url(raw.image),
        source_url: web_url(raw.source_url),
        servings: raw.servings.filter(|s| *s > 0),
        ready_in_minutes: raw.ready_in_minutes.filter(|m| *m > 0),
        ingredients,
        instructions: instructions_from_raw(raw.analyzed_instructions, raw.instructions),
        nutrition: nutrition_from_raw(raw.nutrition),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn search_payload(value: serde_json::Value) -> RawSearchResponse {
        serde_json::from_value(value).unwrap()
    }

    fn information_payload(value: serde_json::Value) -> RawRecipeInformation {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn maps_search_results() {
        let raw = search_payload(json!({
            "results": [{
                "id": 715415,
                "title": "Red Lentil Soup",
                "image": "https://img.spoonacular.com/recipes/715415-312x231.jpg",
                "usedIngredients": [{"name": "egg"}, {"name": "flour"}],
                "missedIngredients": [{"name": "lentils", "aisle": "Pasta and Rice"}],
                "aggregateLikes": 12
            }],
            "offset": 0,
            "number": 10,
            "totalResults": 31
        }));

        let collection = collection_from_search(raw, 0, Utc::now());
        assert_eq!(collection.total_results, 31);
        assert_eq!(collection.recipes.len(), 1);

        let r = &collection.recipes[0];
        assert_eq!(r.id, 715415);
        assert_eq!(r.title, "Red Lentil Soup");
        assert_eq!(r.used_ingredients, vec!["egg", "flour"]);
        assert_eq!(r.missed_ingredients, vec!["lentils"]);
        assert_eq!(r.likes, 12);
    }

    #[test]
    fn sparse_search_results_get_defaults() {
        let raw = search_payload(json!({
            "results": [{"id": 1, "title": null, "usedIngredients": null}]
        }));

        let collection = collection_from_search(raw, 20, Utc::now());
        assert_eq!(collection.total_results, 21);

        let r = &collection.recipes[0];
        assert_eq!(r.title, UNTITLED);
        assert_eq!(r.image_url, None);
        assert!(r.used_ingredients.is_empty());
        assert_eq!(r.likes, 0);
    }

    #[test]
    fn empty_search_body_is_an_empty_collection() {
        let collection = collection_from_search(search_payload(json!({})), 0, Utc::now());
        assert!(collection.is_empty());
        assert_eq!(collection.total_results, 0);
    }

    #[test]
    fn maps_full_recipe_information() {
        let raw = information_payload(json!({
            "id": 42,
            "title": "Pancakes",
            "servings": 4,
            "readyInMinutes": 20,
            "sourceUrl": "https://example.org/pancakes",
            "extendedIngredients": [
                {"name": "flour", "original": "2 cups flour", "aisle": "Baking"},
                {"name": "egg", "original": "1 egg", "aisle": "Milk, Eggs, Other Dairy"}
            ],
            "analyzedInstructions": [
                {"name": "", "steps": [
                    {"number": 1, "step": "Whisk the egg."},
                    {"number": 2, "step": "Fold in the flour."}
                ]},
                {"name": "Cook", "steps": [{"number": 1, "step": "Fry."}]}
            ],
            "nutrition": {"nutrients": [
                {"name": "Protein", "amount": 8.5, "unit": "g"},
                {"name": "Calories", "amount": 227.0, "unit": "kcal"},
                {"name": "Vitamin K", "amount": 1.0, "unit": "µg"}
            ]}
        }));

        let detail = detail_from_information(raw);
        assert_eq!(detail.servings, Some(4));
        assert_eq!(detail.ready_in_minutes, Some(20));
        assert_eq!(detail.ingredients.len(), 2);
        assert_eq!(detail.ingredients[0].aisle.as_deref(), Some("Baking"));

        let Instructions::Steps(steps) = &detail.instructions else {
            panic!("expected steps, got {:?}", detail.instructions);
        };
        assert_eq!(
            steps.iter().map(|s| s.number).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );
        assert_eq!(steps[2].text, "Fry.");

        // Headline order, unknown nutrients dropped.
        let names: Vec<_> = detail.nutrition.iter().map(|n| n.name.as_str()).collect();
        assert_eq!(names, vec!["Calories", "Protein"]);
    }

    #[test]
    fn falls_back_to_free_text_instructions() {
        let raw = information_payload(json!({
            "id": 7,
            "title": "Toast",
            "analyzedInstructions": [],
            "instructions": "<ol><li>Toast the bread.</li><li>Butter &amp; serve.</li></ol>"
        }));

        let detail = detail_from_information(raw);
        assert_eq!(
            detail.instructions,
            Instructions::Text("Toast the bread. Butter & serve.".to_string())
        );
    }

    #[test]
    fn missing_blocks_are_not_errors() {
        let raw = information_payload(json!({"id": 9, "servings": 0, "nutrition": null}));

        let detail = detail_from_information(raw);
        assert_eq!(detail.title, UNTITLED);
        assert_eq!(detail.servings, None);
        assert!(detail.ingredients.is_empty());
        assert!(detail.nutrition.is_empty());
        assert_eq!(detail.instructions, Instructions::Missing);
    }

    #[test]
    fn only_web_links_survive() {
        let raw = information_payload(json!({
            "id": 3,
            "image": "data:image/png;base64,AAAA",
            "sourceUrl": "javascript:alert(1)"
        }));
        let d = detail_from_information(raw);
        assert_eq!(d.source_url, None);
        assert_eq!(d.image_url, None);

        let raw = information_payload(json!({
            "id": 4,
            "sourceUrl": " https://example.com/soup ",
            "image": "not a url"
        }));
        let d = detail_from_information(raw);
        assert_eq!(d.source_url.as_deref(), Some("https://example.com/soup"));
        assert_eq!(d.image_url, None);
    }
}
