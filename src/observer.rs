use log::{debug, info};

use crate::credentials::credentials_or_fail;
use crate::env::is_unbreakable_build;
use crate::error::Result;
use crate::guard;
use crate::run::RunRecord;
use crate::verbs::{collect_env_and_notify, Context, Verb};

/// What the completion observer did with a finished run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// Not a multi-branch run, or not an unbreakable build.
    NotEligible,
    /// A verb already notified Bitbucket for this run.
    AlreadyNotified,
    /// The observer notified on the run's behalf and Bitbucket accepted it.
    Notified(Verb),
}

/// Called once when a run finishes. Makes sure an unbreakable build reports
/// its outcome even when the pipeline never called `ubValidate` or `ubFail`.
///
/// The notified status is inferred from the run's result: SUCCESS validates,
/// anything else (including no result) fails.
///
/// # Errors
///
/// Returns the terminal error of the notification; the run result is already
/// FAILURE when it does.
pub async fn on_completed(run: &mut RunRecord, ctx: Context<'_, '_>) -> Result<Completion> {
    if run.scm_revision.is_none() {
        debug!("No SCM revision on the run, not a multi-branch pipeline");
        return Ok(Completion::NotEligible);
    }

    if !is_unbreakable_build(ctx.env) {
        debug!("No unbreakable refspec in the environment");
        return Ok(Completion::NotEligible);
    }

    if guard::is_set(run) {
        debug!("An unbreakable build verb was already called");
        return Ok(Completion::AlreadyNotified);
    }

    let credentials = credentials_or_fail(run, ctx.credentials, ctx.console)?;

    let result = run.result();
    let verb = Verb::for_result(result);
    let result_name = result.map_or_else(|| "null".to_string(), |r| r.to_string());
    info!("No unbreakable build verb called, inferring {} from {result_name}", verb.name());
    ctx.console.log(&format!(
        "\n Unbreakable build: unbreakable verb hasn't been called. \
         We will call it with current build status: {result_name}\n"
    ));

    guard::set(run, verb.name());

    collect_env_and_notify(verb, run, &credentials, ctx).await?;

    Ok(Completion::Notified(verb))
}
