// Round-trip refinement — the loop and its single entry point
//
// `refine` builds three fresh role agents over one backend and runs the loop
// to convergence or budget exhaustion. Each call owns its agents and its
// trace, so concurrent calls never share guidance.

pub mod loop_runner;
pub mod types;

pub use loop_runner::{check_preconditions, RefinementLoop};
pub use types::{IterationRecord, LoopFailure, RefinementRequest, RoleModels, Trace};

use std::collections::HashSet;
use std::sync::Arc;

use crate::agent::{Agent, AgentProfile, ReasoningFilter, Role, RoleAgent};
use crate::backend::Backend;
use crate::errors::AgentError;

/// Run one text through the refinement loop.
///
/// Preconditions are checked before any backend call, including the model
/// readiness checks. On failure the partial trace is returned inside the
/// [`LoopFailure`].
pub async fn refine(
    backend: Arc<dyn Backend>,
    request: &RefinementRequest,
) -> Result<Trace, LoopFailure> {
    let filter = ReasoningFilter::new(&request.reasoning)
        .map_err(|e| LoopFailure::before_start(AgentError::precondition(e.to_string())))?;

    let shared = |role: Role, model: &str, src: &str, dst: &str| {
        let profile = AgentProfile::new(role, model, src, dst)
            .with_expertise(request.expertise.clone())
            .with_guidance(request.guidance.clone());
        RoleAgent::new(backend.clone(), profile)
            .with_sampling(request.sampling)
            .with_reasoning_filter(filter.clone())
            .with_epsilon(request.epsilon)
    };

    let forward = shared(
        Role::Forward,
        &request.models.forward,
        &request.source_lang,
        &request.target_lang,
    );
    let backward = shared(
        Role::Backward,
        &request.models.backward,
        &request.target_lang,
        &request.source_lang,
    );
    let judge = shared(
        Role::Judge,
        &request.models.judge,
        &request.source_lang,
        &request.target_lang,
    );

    check_preconditions(
        forward.profile(),
        backward.profile(),
        judge.profile(),
        &request.text,
        request.max_iterations,
        request.epsilon,
    )
    .map_err(LoopFailure::before_start)?;

    let mut ready = HashSet::new();
    let forward = prepare_once(forward, &mut ready).await;
    let backward = prepare_once(backward, &mut ready).await;
    let judge = prepare_once(judge, &mut ready).await;

    tracing::info!(
        backend = backend.name(),
        forward = %request.models.forward,
        backward = %request.models.backward,
        judge = %request.models.judge,
        source = %request.source_lang,
        target = %request.target_lang,
        max_iterations = request.max_iterations,
        "Starting refinement"
    );

    RefinementLoop::new(Arc::new(forward), Arc::new(backward), Arc::new(judge))
        .with_epsilon(request.epsilon)
        .run(&request.text, &request.guidance, request.max_iterations)
        .await
}

/// Readiness-check each distinct model once per run.
async fn prepare_once(agent: RoleAgent, ready: &mut HashSet<String>) -> RoleAgent {
    if ready.insert(agent.profile().model_id.clone()) {
        agent.prepare().await
    } else {
        agent
    }
}
