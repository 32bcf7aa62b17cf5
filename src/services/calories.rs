/*
 * Responsibility
 * - Per-100g energy table loaded once at startup from CSV
 * - Lookup of a user's ingredient list → per-item breakdown + totals
 */
use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Energy {
    pub kcal: u32,
    pub kj: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalorieLine {
    /// The item as the user typed it (trimmed).
    pub item: String,
    /// `None` when the item is not in the table.
    pub energy: Option<Energy>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalorieReport {
    pub lines: Vec<CalorieLine>,
    pub total: Energy,
}

#[derive(Debug, Clone, Default)]
pub struct CalorieTable {
    entries: HashMap<String, Energy>,
}

#[derive(Debug, thiserror::Error)]
pub enum CalorieTableError {
    #[error("failed to read calorie table: {0}")]
    Io(#[from] std::io::Error),
    #[error("calorie table is missing column {0}")]
    MissingColumn(&'static str),
    #[error("calorie table is not valid CSV: {0}")]
    Csv(#[from] csv::Error),
}

const FOOD_COLUMN: &str = "FoodItem";
const KCAL_COLUMN: &str = "Cals_per100grams";
const KJ_COLUMN: &str = "KJ_per100grams";

#[derive(Debug, Deserialize)]
struct CalorieRow {
    #[serde(rename = "FoodItem")]
    food_item: String,
    #[serde(rename = "Cals_per100grams", default)]
    kcal: String,
    #[serde(rename = "KJ_per100grams", default)]
    kj: String,
}

/// "52 cal" / "218 kJ" → number; anything unparseable is 0.
fn leading_number(raw: &str) -> u32 {
    raw.trim()
        .split_whitespace()
        .next()
        .and_then(|n| n.parse().ok())
        .unwrap_or(0)
}

impl CalorieTable {
    pub fn from_csv_str(data: &str) -> Result<Self, CalorieTableError> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(data.as_bytes());

        let headers = reader.headers()?.clone();
        for column in [FOOD_COLUMN, KCAL_COLUMN, KJ_COLUMN] {
            if !headers.iter().any(|h| h == column) {
                return Err(CalorieTableError::MissingColumn(column));
            }
        }

        let mut entries = HashMap::new();
        for row in reader.deserialize::<CalorieRow>() {
            let row = match row {
                Ok(row) => row,
                Err(e) => {
                    tracing::debug!(error = %e, "skipping malformed calorie row");
                    continue;
                }
            };
            let name = row.food_item.to_lowercase();
            if name.is_empty() {
                continue;
            }
            let energy = Energy {
                kcal: leading_number(&row.kcal),
                kj: leading_number(&row.kj),
            };
            entries.insert(name, energy);
        }

        Ok(Self { entries })
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, CalorieTableError> {
        let data = std::fs::read_to_string(path)?;
        Self::from_csv_str(&data)
    }

    /// Load the table, falling back to an empty one (every item reads "N/A").
    pub fn load_or_empty(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match Self::load(path) {
            Ok(table) => {
                tracing::info!(path = %path.display(), items = table.len(), "calorie table loaded");
                table
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "calorie table unavailable");
                Self::default()
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, item: &str) -> Option<Energy> {
        self.entries.get(&item.trim().to_lowercase()).copied()
    }

    pub fn report<I, S>(&self, items: I) -> CalorieReport
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut total = Energy::default();
        let lines = items
            .into_iter()
            .map(|item| {
                let item = item.as_ref().trim().to_string();
                let energy = self.get(&item);
                if let Some(e) = energy {
                    total.kcal += e.kcal;
                    total.kj += e.kj;
                }
                CalorieLine { item, energy }
            })
            .collect();

        CalorieReport { lines, total }
    }
}
