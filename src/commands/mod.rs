//! Command implementations for gitops-provider.
//!
//! This module provides the dispatcher that routes CLI commands to their
//! implementations, plus the pieces they share: loading a plan into a
//! [`Session`], fanning operations out to threads and reporting diagnostics.

mod apply;
mod destroy;
mod read;


use crate::cli::{Cli, Command, GlobalArgs};
use crate::error::{ProviderError, Result};
use crate::logging;
use crate::mutex::MutexKv;
use crate::plan::{Plan, State};
use crate::provider::{Diagnostic, Provider};
use std::path::Path;
use std::sync::Arc;
use std::thread;
use tracing::{Dispatch, info_span};

/// Dispatch a command to its implementation.
///
/// This is the main entry point for command execution. The plan is loaded
/// and logging installed before the command runs.
pub fn dispatch(cli: Cli) -> Result<()> {
    let Cli { global, command } = cli;

    match command {
        Command::Apply(args) => {
            let session = Session::load(&global, &args.plan)?;
            logging::init(session.provider.config().debug);
            apply::cmd_apply(&session, args.state.as_deref())
        }
        Command::Destroy(args) => {
            let session = Session::load(&global, &args.plan)?;
            logging::init(session.provider.config().debug);
            destroy::cmd_destroy(&session, args.state.as_deref())
        }
        Command::Read(args) => {
            let session = Session::load(&global, &args.plan)?;
            logging::init(session.provider.config().debug);
            read::cmd_read(&session)
        }
    }
}

/// A loaded plan and the provider configured from it.
pub struct Session {
    pub plan: Plan,
    pub provider: Provider,
}

impl Session {
    /// Load `plan_path`, apply command-line overrides and prepare the CA
    /// certificate in the working directory.
    pub fn load(global: &GlobalArgs, plan_path: &Path) -> Result<Self> {
        let plan = Plan::load(plan_path)?;
        Self::from_plan(global, plan)
    }

    pub fn from_plan(global: &GlobalArgs, plan: Plan) -> Result<Self> {
        let mut config = plan.provider.clone();
        config.apply_overrides(&global.overrides());
        config.validate()?;

        let cwd = std::env::current_dir().map_err(|e| {
            ProviderError::IoError(format!("failed to determine working directory: {}", e))
        })?;
        config.materialize_ca_cert(&cwd)?;

        Ok(Self {
            plan,
            provider: Provider::new(config, Arc::new(MutexKv::new())),
        })
    }
}

/// Result of one operation on a named plan entry.
pub(crate) struct Outcome<T> {
    pub name: String,
    pub address: String,
    pub result: Result<T>,
}

/// Run `f` for every `(name, address)` job on its own thread and wait for
/// all of them.
///
/// Each thread runs inside an `operation` span carrying the address and
/// logs to the caller's subscriber. A panicking operation is reported as a
/// failure of that operation only.
pub(crate) fn run_all<T, F>(operation: &'static str, jobs: Vec<(String, String)>, f: F) -> Vec<Outcome<T>>
where
    T: Send,
    F: Fn(&str) -> Result<T> + Sync,
{
    let dispatch = tracing::dispatcher::get_default(Dispatch::clone);

    thread::scope(|scope| {
        let handles: Vec<_> = jobs
            .into_iter()
            .map(|(name, address)| {
                let dispatch = dispatch.clone();
                let f = &f;
                let job = name.clone();
                let span_address = address.clone();
                let handle = scope.spawn(move || {
                    tracing::dispatcher::with_default(&dispatch, || {
                        let span = info_span!("operation", address = %span_address, operation);
                        let _enter = span.enter();
                        f(&job)
                    })
                });
                (name, address, handle)
            })
            .collect();

        handles
            .into_iter()
            .map(|(name, address, handle)| {
                let result = handle.join().unwrap_or_else(|_| {
                    Err(ProviderError::ExecutionError(format!(
                        "{} of {} panicked",
                        operation, address
                    )))
                });
                Outcome {
                    name,
                    address,
                    result,
                }
            })
            .collect()
    })
}

/// Read every data source of the plan concurrently.
pub(crate) fn read_data(session: &Session) -> Vec<Outcome<crate::resources::ResourceState>> {
    let jobs = session
        .plan
        .data
        .keys()
        .filter_map(|name| Some((name.clone(), session.plan.data_address(name)?)))
        .collect();

    run_all("read", jobs, |name| match session.plan.data.get(name) {
        Some(spec) => spec.as_data_source().read(&session.provider),
        None => Err(ProviderError::UserError(format!("unknown data source '{}'", name))),
    })
}

/// `(name, address)` for every resource of the plan.
pub(crate) fn resource_jobs(plan: &Plan) -> Vec<(String, String)> {
    plan.resources
        .keys()
        .filter_map(|name| Some((name.clone(), plan.resource_address(name)?)))
        .collect()
}

/// Print diagnostics to stderr.
pub(crate) fn report(diagnostics: &[Diagnostic]) {
    for diagnostic in diagnostics {
        eprintln!("{}", diagnostic);
    }
}

/// Write `state` to `path`, or print it to stdout without one.
pub(crate) fn emit(state: &State, path: Option<&Path>) -> Result<()> {
    match path {
        Some(path) => state.save(path),
        None => {
            println!("{}", state.to_json()?);
            Ok(())
        }
    }
}

/// Fail when any diagnostic is an error.
pub(crate) fn check(diagnostics: &[Diagnostic], total: usize) -> Result<()> {
    let failed = diagnostics.iter().filter(|d| d.is_error()).count();
    if failed > 0 {
        return Err(ProviderError::OperationsFailed(format!(
            "{} of {} operations failed",
            failed, total
        )));
    }
    Ok(())
}
