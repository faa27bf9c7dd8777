//! Implementation of the `gitops-provider read` command.

use super::{Session, check, emit, read_data, report};
use crate::error::Result;
use crate::plan::State;
use crate::provider::Diagnostic;

/// Execute the `read` command: print the state of every data source.
pub fn cmd_read(session: &Session) -> Result<()> {
    let (state, diagnostics) = read(session);

    report(&diagnostics);
    emit(&state, None)?;
    check(&diagnostics, session.plan.data.len())
}

pub fn read(session: &Session) -> (State, Vec<Diagnostic>) {
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

    state.touch();
    (state, diagnostics)
}
