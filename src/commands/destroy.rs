//! Implementation of the `gitops-provider destroy` command.

use super::{Session, check, emit, report, resource_jobs, run_all};
use crate::error::Result;
use crate::plan::State;
use crate::provider::Diagnostic;
use std::path::Path;
use tracing::info;

/// Execute the `destroy` command.
///
/// Resources that were deleted are removed from the state; failed ones stay.
pub fn cmd_destroy(session: &Session, state_path: Option<&Path>) -> Result<()> {
    let prior = match state_path {
        Some(path) => State::load(path)?,
        None => None,
    };

    let (state, diagnostics) = destroy(session, prior.as_ref());

    report(&diagnostics);
    emit(&state, state_path)?;
    check(&diagnostics, session.plan.resources.len())
}

/// Delete every resource of the plan.
///
/// Without prior state each resource is deleted from its configuration
/// alone, and a warning says so.
pub fn destroy(session: &Session, prior: Option<&State>) -> (State, Vec<Diagnostic>) {
    let mut diagnostics = Vec::new();
    if prior.is_none() {
        diagnostics.push(Diagnostic::warning(
            "No prior state",
            "resources are deleted from their configuration only",
        ));
    }

    let outcomes = run_all("destroy", resource_jobs(&session.plan), |name| {
        let previous = prior.and_then(|state| state.resources.get(name));
        session.plan.resources[name]
            .as_resource()
            .delete(&session.provider, previous)
    });

    let mut state = prior.cloned().unwrap_or_default();
    state.data.clear();

    for outcome in outcomes {
        match outcome.result {
            Ok(()) => {
                info!("{}: destroyed", outcome.address);
                state.resources.remove(&outcome.name);
            }
            Err(err) => diagnostics.push(Diagnostic::from(&err).at(&outcome.address)),
        }
    }

    state.touch();
    (state, diagnostics)
}
