// Reporting around the refinement core — exports, terminal summary, survey batches

pub mod export;
pub mod summary;
pub mod survey;

pub use export::{save_csv, save_json, write_csv, TraceReport};
pub use summary::{render_summary, similarity_bar};
pub use survey::{result_path, run_survey, BatchOptions, ItemOutcome, QuestionId, Survey, SurveyItem};
