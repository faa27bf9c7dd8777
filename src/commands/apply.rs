//! Implementation of the `gitops-provider apply` command.

use super::{Session, check, emit, read_data, report, resource_jobs, run_all};
use crate::error::Result;
use crate::plan::State;
use crate::provider::{Diagnostic, Provider};
use std::path::Path;
use tracing::{info, warn};

/// Execute the `apply` command.
///
/// Prior state is read from `state_path` when it exists; the new state is
/// written back to it (or printed) even when some operations failed.
pub fn cmd_apply(session: &Session, state_path: Option<&Path>) -> Result<()> {
    let prior = match state_path {
        Some(path) => State::load(path)?,
        None => None,
    }
    .unwrap_or_default();

    let (state, diagnostics) = apply(session, &prior);

    report(&diagnostics);
    emit(&state, state_path)?;
    check(
        &diagnostics,
        session.plan.data.len() + session.plan.resources.len(),
    )
}

/// Read data sources, then create (or update) every resource.
///
/// Resources are skipped when a data source fails. A failed resource keeps
/// its prior state.
pub fn apply(session: &Session, prior: &State) -> (State, Vec<Diagnostic>) {
    let provider: &Provider = &session.provider;
    let mut state = State::default();
    let mut diagnostics = Vec::new();

    for outcome in read_data(session) {
        match outcome.result {
            Ok(data) => {
                state.data.insert(outcome.name, data);
            }
            Err(err) => diagnostics.push(Diagnostic::from(&err).at(&outcome.address)),
        }
    }

    if !diagnostics.is_empty() {
        warn!("Skipping resources because data sources failed");
        state.resources = prior.resources.clone();
        state.touch();
        return (state, diagnostics);
    }

    let outcomes = run_all("apply", resource_jobs(&session.plan), |name| {
        let resource = session.plan.resources[name].as_resource();
        match prior.resources.get(name) {
            Some(previous) => resource.update(provider, previous),
            None => resource.create(provider),
        }
    });

    for outcome in outcomes {
        match outcome.result {
            Ok(resource) => {
                info!("{}: id={}", outcome.address, resource.id);
                state.resources.insert(outcome.name, resource);
            }
            Err(err) => {
                diagnostics.push(Diagnostic::from(&err).at(&outcome.address));
                if let Some(previous) = prior.resources.get(&outcome.name) {
                    state.resources.insert(outcome.name, previous.clone());
                }
            }
        }
    }

    state.touch();
    (state, diagnostics)
}
