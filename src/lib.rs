// Backtranslate - round-trip translation refinement over local LLMs
// Library exports

pub mod agent;
pub mod backend;
pub mod cli;
pub mod config;
pub mod errors;
pub mod logging;
pub mod refinement;
pub mod report;

pub use agent::{Agent, AgentProfile, Evaluation, Role, RoleAgent};
pub use backend::{Backend, OllamaBackend};
pub use errors::{AgentError, AgentResult};
pub use refinement::{refine, IterationRecord, LoopFailure, RefinementRequest, RoleModels, Trace};
