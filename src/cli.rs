use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand};
use log::{debug, info};
use std::collections::HashMap;
use std::ffi::OsString;
use std::path::PathBuf;

use crate::config::Config;
use crate::observer::{on_completed, Completion};
use crate::output::{print_outcome, print_verdict};
use crate::run::{RunRecord, RunResult};
use crate::run_console::Console;
use crate::verbs::{run_verb, Context, Verb};

#[derive(Parser)]
#[command(name = "ubuild")]
#[command(author, version, about = "Unbreakable build notifier for Bitbucket", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Persisted record of the current run
    #[arg(
        short,
        long,
        global = true,
        env = "UBUILD_RUN_FILE",
        default_value = "ubuild-run.json"
    )]
    run_file: PathBuf,

    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Do not write the run console
    #[arg(short, long, global = true, default_value_t = false)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the record of a new run
    Start {
        /// SCM revision; only multi-branch runs have one
        #[arg(short = 'R', long)]
        revision: Option<String>,

        /// Credentials id of the SCM source
        #[arg(long)]
        credentials_id: Option<String>,

        #[arg(short, long, env = "JOB_NAME")]
        job_name: Option<String>,
    },
    /// Notify Bitbucket that the unbreakable build succeeded (ubValidate)
    Validate,
    /// Notify Bitbucket that the unbreakable build failed (ubFail)
    Fail,
    /// Record the run's result and notify Bitbucket if no verb did
    Complete {
        #[arg(long, value_enum)]
        result: RunResult,
    },
    /// Print the run record
    Status {
        #[arg(short, long, default_value_t = false)]
        pretty: bool,
    },
}

impl Cli {
    fn execute_start(
        &self,
        revision: Option<&str>,
        credentials_id: Option<&str>,
        job_name: Option<&str>,
    ) -> Result<()> {
        let run = RunRecord::new(
            job_name.map(str::to_owned),
            revision.map(str::to_owned),
            credentials_id.map(str::to_owned),
        );
        run.save(&self.run_file)?;
        info!("Run record written to: {}", self.run_file.display());

        Ok(())
    }

    async fn execute_verb(&self, verb: Verb, env: &HashMap<String, String>) -> Result<()> {
        let config = Config::load(self.config.as_deref())?;
        let mut run = RunRecord::load(&self.run_file)?;

        let client = config.notification_client();
        let credentials = config.credential_store();
        let mut stderr = std::io::stderr();
        let mut console = if self.quiet {
            Console::silent()
        } else {
            Console::new(&mut stderr)
        };

        let outcome = run_verb(
            verb,
            &mut run,
            Context {
                env,
                credentials: &credentials,
                client: &client,
                console: &mut console,
            },
        )
        .await;

        run.save(&self.run_file)?;
        print_verdict(verb.name(), &outcome);
        outcome.with_context(|| format!("{} failed", verb.name()))
    }

    async fn execute_complete(
        &self,
        result: RunResult,
        env: &HashMap<String, String>,
    ) -> Result<()> {
        let config = Config::load(self.config.as_deref())?;
        let mut run = RunRecord::load(&self.run_file)?;
        run.set_result(result);

        let client = config.notification_client();
        let credentials = config.credential_store();
        let mut stderr = std::io::stderr();
        let mut console = if self.quiet {
            Console::silent()
        } else {
            Console::new(&mut stderr)
        };

        let outcome = on_completed(
            &mut run,
            Context {
                env,
                credentials: &credentials,
                client: &client,
                console: &mut console,
            },
        )
        .await;

        run.save(&self.run_file)?;
        print_outcome(&outcome);
        outcome
            .map(|completion: Completion| info!("Completion: {completion:?}"))
            .context("Unbreakable build completion failed")
    }

    fn execute_status(&self, pretty: bool) -> Result<()> {
        let run = RunRecord::load(&self.run_file)?;

        let json_output = if pretty {
            serde_json::to_string_pretty(&run)?
        } else {
            serde_json::to_string(&run)?
        };
        println!("{}", json_output);

        Ok(())
    }

    pub async fn execute(&self) -> Result<()> {
        self.execute_in(&environment_snapshot(std::env::vars_os())).await
    }

    async fn execute_in(&self, env: &HashMap<String, String>) -> Result<()> {
        match &self.command {
            Commands::Start {
                revision,
                credentials_id,
                job_name,
            } => self.execute_start(
                revision.as_deref(),
                credentials_id.as_deref(),
                job_name.as_deref(),
            ),
            Commands::Validate => self.execute_verb(Verb::Validate, env).await,
            Commands::Fail => self.execute_verb(Verb::Fail, env).await,
            Commands::Complete { result } => self.execute_complete(*result, env).await,
            Commands::Status { pretty } => self.execute_status(*pretty),
        }
    }
}

/// Process environment as UTF-8 pairs. Variables whose name or value is not
/// valid UTF-8 are skipped; none of the keys the notification reads can be one.
fn environment_snapshot(
    vars: impl IntoIterator<Item = (OsString, OsString)>,
) -> HashMap<String, String> {
    vars.into_iter()
        .filter_map(|(key, value)| match (key.into_string(), value.into_string()) {
            (Ok(key), Ok(value)) => Some((key, value)),
            (key, _) => {
                debug!("Skipping non UTF-8 environment variable {key:?}");
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::run::RunMarker;
    use crate::test_support::{environment, NOTIFY_PATH};
    use std::io::Write;
    use std::path::Path;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_complete() {
        let cli = Cli::try_parse_from([
            "ubuild",
            "--run-file",
            "run.json",
            "complete",
            "--result",
            "not-built",
        ])
        .unwrap();
        assert_eq!(cli.run_file, PathBuf::from("run.json"));
        assert!(matches!(
            cli.command,
            Commands::Complete {
                result: RunResult::NotBuilt
            }
        ));
    }

    #[test]
    fn test_parse_verbs() {
        let cli = Cli::try_parse_from(["ubuild", "validate", "--quiet"]).unwrap();
        assert!(matches!(cli.command, Commands::Validate));
        assert!(cli.quiet);

        let cli = Cli::try_parse_from(["ubuild", "fail"]).unwrap();
        assert!(matches!(cli.command, Commands::Fail));
    }

    #[test]
    fn test_parse_rejects_unknown_result() {
        assert!(Cli::try_parse_from(["ubuild", "complete", "--result", "green"]).is_err());
    }

    #[tokio::test]
    async fn test_start_then_status() {
        let temp_dir = tempfile::tempdir().unwrap();
        let run_file = temp_dir.path().join("run.json");
        let run_file_arg = run_file.to_str().unwrap();

        let cli = Cli::try_parse_from([
            "ubuild",
            "--run-file",
            run_file_arg,
            "start",
            "--revision",
            "cafebabe",
            "--credentials-id",
            "IZ_USER",
            "--job-name",
            "SWB2/repo/UB",
        ])
        .unwrap();
        cli.execute().await.unwrap();

        let run = RunRecord::load(&run_file).unwrap();
        assert_eq!(run.scm_revision.as_deref(), Some("cafebabe"));
        assert_eq!(run.credentials_id(), Some("IZ_USER"));
        assert_eq!(run.job_name.as_deref(), Some("SWB2/repo/UB"));

        let cli = Cli::try_parse_from(["ubuild", "--run-file", run_file_arg, "status"]).unwrap();
        cli.execute().await.unwrap();
    }

    #[cfg(unix)]
    #[test]
    fn test_environment_snapshot_skips_non_utf8() {
        use std::os::unix::ffi::OsStringExt;

        let env = environment_snapshot([
            (OsString::from("COMMIT"), OsString::from("cafebabe")),
            (OsString::from("BAD_VAR"), OsString::from_vec(vec![0xff, 0xfe])),
            (OsString::from_vec(vec![0xff]), OsString::from("value")),
        ]);

        assert_eq!(env.len(), 1);
        assert_eq!(env["COMMIT"], "cafebabe");
    }

    fn config_file() -> NamedTempFile {
        let mut temp_file = NamedTempFile::with_suffix(".toml").unwrap();
        write!(
            temp_file,
            "[credentials.IZ_USER]\nusername = \"git-user\"\npassword = \"git-secret\"\n"
        )
        .unwrap();
        temp_file
    }

    fn parse(run_file: &Path, config: &Path, args: &[&str]) -> Cli {
        let mut argv = vec![
            "ubuild",
            "--quiet",
            "--run-file",
            run_file.to_str().unwrap(),
            "--config",
            config.to_str().unwrap(),
        ];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap()
    }

    #[tokio::test]
    async fn test_fail_saves_run_then_completion_does_not_notify_again() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", NOTIFY_PATH)
            .with_status(200)
            .with_body(r#"{"message":"OK"}"#)
            .expect(1)
            .create_async()
            .await;
        let env = environment(&server.url());

        let temp_dir = tempfile::tempdir().unwrap();
        let run_file = temp_dir.path().join("run.json");
        let config = config_file();

        let start = ["start", "-R", "cafebabe", "--credentials-id", "IZ_USER"];
        parse(&run_file, config.path(), &start)
            .execute_in(&env)
            .await
            .unwrap();

        let err = parse(&run_file, config.path(), &["fail"])
            .execute_in(&env)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("ubFail failed"));

        let run = RunRecord::load(&run_file).unwrap();
        assert_eq!(run.result(), Some(RunResult::Failure));
        assert!(matches!(
            run.markers(),
            [RunMarker::UbuildNotified { verb, .. }] if verb == "ubFail"
        ));

        parse(&run_file, config.path(), &["complete", "--result", "success"])
            .execute_in(&env)
            .await
            .unwrap();

        mock.assert_async().await;
        let run = RunRecord::load(&run_file).unwrap();
        assert_eq!(run.result(), Some(RunResult::Failure));
        assert_eq!(run.markers().len(), 1);
    }

    #[tokio::test]
    async fn test_rejected_validate_still_saves_failed_run() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", NOTIFY_PATH)
            .with_status(500)
            .with_body(r#"{"message":"boom"}"#)
            .expect(1)
            .create_async()
            .await;
        let env = environment(&server.url());

        let temp_dir = tempfile::tempdir().unwrap();
        let run_file = temp_dir.path().join("run.json");
        let config = config_file();

        let start = ["start", "-R", "cafebabe", "--credentials-id", "IZ_USER"];
        parse(&run_file, config.path(), &start)
            .execute_in(&env)
            .await
            .unwrap();

        let result = parse(&run_file, config.path(), &["validate"])
            .execute_in(&env)
            .await;

        mock.assert_async().await;
        assert!(result.is_err());
        let run = RunRecord::load(&run_file).unwrap();
        assert_eq!(run.result(), Some(RunResult::Failure));
        assert!(crate::guard::is_set(&run));
    }

    #[tokio::test]
    async fn test_completion_with_unknown_credentials_records_failure() {
        let temp_dir = tempfile::tempdir().unwrap();
        let run_file = temp_dir.path().join("run.json");
        let config = config_file();
        let env = environment("http://unused");

        let start = ["start", "-R", "cafebabe", "--credentials-id", "NOPE"];
        parse(&run_file, config.path(), &start)
            .execute_in(&env)
            .await
            .unwrap();

        let result = parse(&run_file, config.path(), &["complete", "--result", "success"])
            .execute_in(&env)
            .await;

        assert!(result.is_err());
        let run = RunRecord::load(&run_file).unwrap();
        assert_eq!(run.result(), Some(RunResult::Failure));
        assert!(run.markers().is_empty());
    }
}
