pub mod enrichment;
pub mod providers;
pub mod questionnaire;
pub mod recommendations;
pub mod session;
pub mod structured;

pub use enrichment::EnrichmentPipeline;
pub use questionnaire::{QuestionSource, QuestionnaireGenerator};
pub use recommendations::RecommendationEngine;
pub use session::{RetryPolicy, SessionStateMachine};
