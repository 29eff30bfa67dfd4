use log::info;
use std::collections::HashMap;

use crate::bitbucket::{generate_payload, BuildStatus, NotificationClient};
use crate::branch::{BranchReference, UB_BRANCH_REGEX};
use crate::classify::classify;
use crate::credentials::{credentials_or_fail, CredentialResolver, Credentials};
use crate::env::RunEnvironment;
use crate::error::{Result, UbuildError};
use crate::guard;
use crate::run::{RunRecord, RunResult};
use crate::run_console::Console;

pub const VERB_BANNER: &str = "\n ----- UNBREAKABLE BUILD VERB CALLED ----- \n";

/// Pipeline actions that report to Bitbucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verb {
    Validate,
    Fail,
}

impl Verb {
    pub fn name(self) -> &'static str {
        match self {
            Verb::Validate => "ubValidate",
            Verb::Fail => "ubFail",
        }
    }

    pub fn status(self) -> BuildStatus {
        match self {
            Verb::Validate => BuildStatus::Success,
            Verb::Fail => BuildStatus::Failure,
        }
    }

    /// Verb matching a finished run's result: anything but SUCCESS fails.
    pub fn for_result(result: Option<RunResult>) -> Self {
        match result {
            Some(RunResult::Success) => Verb::Validate,
            _ => Verb::Fail,
        }
    }
}

/// Everything the notification chain borrows from its caller.
pub struct Context<'a, 'c> {
    pub env: &'a HashMap<String, String>,
    pub credentials: &'a dyn CredentialResolver,
    pub client: &'a NotificationClient,
    pub console: &'a mut Console<'c>,
}

/// Explicit `ubValidate` / `ubFail` step.
///
/// The run is marked as notified before Bitbucket is contacted, so the
/// completion observer never sends a second notification for it, whatever
/// this attempt's outcome.
///
/// # Errors
///
/// Returns the terminal error of the attempt; the run result is already
/// FAILURE when it does.
pub async fn run_verb(verb: Verb, run: &mut RunRecord, ctx: Context<'_, '_>) -> Result<()> {
    let credentials = credentials_or_fail(run, ctx.credentials, ctx.console)?;

    guard::set(run, verb.name());

    collect_env_and_notify(verb, run, &credentials, ctx).await
}

/// Shared chain of both verbs and the completion observer: resolve the
/// environment, notify Bitbucket, and turn the answer into the run result.
pub(crate) async fn collect_env_and_notify(
    verb: Verb,
    run: &mut RunRecord,
    credentials: &Credentials,
    ctx: Context<'_, '_>,
) -> Result<()> {
    info!("{} - Collecting environment variables", verb.name());

    let env = match RunEnvironment::resolve(ctx.env) {
        Ok(env) => env,
        Err(e) => return Err(fail_run(run, ctx.console, e)),
    };

    notify_bitbucket(verb.status(), &env, run, credentials, ctx.client, ctx.console).await?;

    info!("{} - execution finished", verb.name());
    Ok(())
}

async fn notify_bitbucket(
    status: BuildStatus,
    env: &RunEnvironment,
    run: &mut RunRecord,
    credentials: &Credentials,
    client: &NotificationClient,
    console: &mut Console<'_>,
) -> Result<()> {
    console.log(VERB_BANNER);

    let Some(branch) = BranchReference::parse(&env.refspec) else {
        let err = UbuildError::InvalidRefspec {
            pattern: UB_BRANCH_REGEX.to_string(),
            actual: env.refspec.clone(),
        };
        return Err(fail_run(run, console, err));
    };

    let url = env.notification_url();
    console.log(&format!("calling URL: {url}"));

    let payload = match generate_payload(
        &env.job_url,
        env.isolation_zone.as_deref(),
        branch.merge_request_id(),
        status,
    ) {
        Ok(payload) => payload,
        Err(e) => return Err(fail_run(run, console, e.into())),
    };
    console.log(&format!("With Payload: \n{payload}"));

    let outcome = client.notify(&url, &payload, credentials).await;

    classify(&outcome, status, console).enforce(run)
}

fn fail_run(run: &mut RunRecord, console: &mut Console<'_>, err: UbuildError) -> UbuildError {
    run.set_result(RunResult::Failure);
    console.log(&err.to_string());
    err
}
