pub mod models;
pub mod pipeline;
pub mod query;
pub mod spoonacular;
pub mod transform;
pub mod upstream;

pub use models::{RecipeCollection, RecipeDetail, RecipeSummary};
pub use pipeline::{PipelineError, PipelineSettings, RecipePipeline};
pub use query::{Diet, SearchQuery};
pub use spoonacular::SpoonacularClient;
pub use upstream::{RecipeApi, UpstreamError};
