// ============================================================================
// Visibility overrides
// ============================================================================
//
// Overrides live in a task-local map from model name to visibility. Entering
// a scope clones the surrounding map, inserts one entry, and runs the body
// with the new map. The previous map comes back when the body finishes,
// returns an error, or unwinds, because the override is owned by the scope
// future rather than written to shared state.
//
// Spawned tasks start with no overrides.
//
// ============================================================================

use crate::query::Visibility;
use std::collections::HashMap;
use std::future::Future;

type ScopeOverrides = HashMap<String, Visibility>;

tokio::task_local! {
    static VISIBILITY_OVERRIDES: ScopeOverrides;
}

/// The innermost override for `model` in the current task, if any.
pub fn current_override(model: &str) -> Option<Visibility> {
    VISIBILITY_OVERRIDES
        .try_with(|overrides| overrides.get(model).copied())
        .ok()
        .flatten()
}

fn overrides_with(model: &str, visibility: Visibility) -> ScopeOverrides {
    let mut overrides = VISIBILITY_OVERRIDES
        .try_with(Clone::clone)
        .unwrap_or_default();
    overrides.insert(model.to_string(), visibility);
    overrides
}

/// Runs `body` with `model` queries resolved under `visibility`.
pub async fn with_visibility<F>(model: &str, visibility: Visibility, body: F) -> F::Output
where
    F: Future,
{
    VISIBILITY_OVERRIDES
        .scope(overrides_with(model, visibility), body)
        .await
}

/// Runs `body` seeing only the deactivated rows of `model`.
pub async fn with_deactivated_objects_scope<F>(model: &str, body: F) -> F::Output
where
    F: Future,
{
    with_visibility(model, Visibility::InactiveOnly, body).await
}

/// Runs `body` seeing every row of `model`, active or not.
pub async fn remove_deactivated_objects_scope<F>(model: &str, body: F) -> F::Output
where
    F: Future,
{
    with_visibility(model, Visibility::All, body).await
}
