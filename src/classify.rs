use log::error;

use crate::bitbucket::{BuildStatus, NotificationOutcome};
use crate::error::{Result, UbuildError};
use crate::run::{RunRecord, RunResult};
use crate::run_console::Console;

const HTTP_CODE_LOWER_RANGE_OK: i32 = 200;
const HTTP_CODE_UPPER_RANGE_KO: i32 = 300;

pub const FINISHED_BANNER: &str = "\n ----- UNBREAKABLE BUILD FINISHED ----- \n";

/// What a notification attempt means for the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Accepted,
    /// Accepted status code but the answer could not be read.
    AcceptedWithWarning,
    /// Carries the full rejection message.
    Rejected(String),
    /// Bitbucket was notified of a FAILURE, which always fails the run.
    PolicyFailure,
}

impl Verdict {
    /// Applies the single run-result side effect of this verdict.
    ///
    /// # Errors
    ///
    /// Rejected and policy-failure verdicts mark the run as failed and return
    /// the terminal error.
    pub fn enforce(self, run: &mut RunRecord) -> Result<()> {
        match self {
            Verdict::Accepted | Verdict::AcceptedWithWarning => Ok(()),
            Verdict::Rejected(message) => {
                run.set_result(RunResult::Failure);
                Err(UbuildError::NotificationRejected(message))
            }
            Verdict::PolicyFailure => {
                run.set_result(RunResult::Failure);
                Err(UbuildError::PolicyFailure)
            }
        }
    }
}

/// Maps one notification outcome and the notified status to a verdict,
/// logging the result to the console.
///
/// The HTTP answer is judged first; only an accepted notification of a
/// FAILURE becomes a policy failure.
pub fn classify(
    outcome: &NotificationOutcome,
    status: BuildStatus,
    console: &mut Console<'_>,
) -> Verdict {
    let status_code = outcome.status_code;
    let in_range = (HTTP_CODE_LOWER_RANGE_OK..HTTP_CODE_UPPER_RANGE_KO).contains(&status_code);

    if !in_range {
        let message = format!(
            "The notification to bitbucket went wrong, build marked as failed. \
             Status code: {}, message: {}, exception: {}",
            status_code,
            outcome.message,
            outcome.error_description()
        );
        error!("{message}");
        console.log(&format!("\n{message}\n"));
        return Verdict::Rejected(message);
    }

    let verdict = if outcome.error.is_none() {
        console.log(&format!(
            "Notification of UB buildStatus: '{}' sent successfully to bitbucket, status code: {}, message: '{}'",
            status, status_code, outcome.message
        ));
        Verdict::Accepted
    } else {
        console.log(&format!(
            "Notification of UB buildStatus: '{}' sent successfully to bitbucket but with Exception. \
             Status code: {}, message: '{}', exception: {}",
            status,
            status_code,
            outcome.message,
            outcome.error_description()
        ));
        Verdict::AcceptedWithWarning
    };
    console.log(FINISHED_BANNER);

    match status {
        BuildStatus::Success => verdict,
        BuildStatus::Failure => Verdict::PolicyFailure,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bitbucket::NotifyError;

    fn payload_error() -> NotifyError {
        NotifyError::Payload(serde_json::from_str::<serde_json::Value>("").unwrap_err())
    }

    fn classify_silently(outcome: &NotificationOutcome, status: BuildStatus) -> Verdict {
        classify(outcome, status, &mut Console::silent())
    }

    #[test]
    fn test_accepted() {
        let outcome = NotificationOutcome::new(200, "OK", None);
        assert_eq!(classify_silently(&outcome, BuildStatus::Success), Verdict::Accepted);

        let outcome = NotificationOutcome::new(299, "OK", None);
        assert_eq!(classify_silently(&outcome, BuildStatus::Success), Verdict::Accepted);
    }

    #[test]
    fn test_accepted_with_warning() {
        let outcome = NotificationOutcome::new(204, "", Some(payload_error()));
        assert_eq!(
            classify_silently(&outcome, BuildStatus::Success),
            Verdict::AcceptedWithWarning
        );
    }

    #[test]
    fn test_rejected_boundaries() {
        for code in [-1, 199, 300, 400, 500] {
            let outcome = NotificationOutcome::new(code, "nope", None);
            assert!(
                matches!(classify_silently(&outcome, BuildStatus::Success), Verdict::Rejected(_)),
                "status {code} should be rejected"
            );
        }
    }

    #[test]
    fn test_rejected_message() {
        let outcome = NotificationOutcome::new(500, "boom", None);
        let Verdict::Rejected(message) = classify_silently(&outcome, BuildStatus::Success) else {
            panic!("expected rejection");
        };
        assert_eq!(
            message,
            "The notification to bitbucket went wrong, build marked as failed. \
             Status code: 500, message: boom, exception: null"
        );
    }

    #[test]
    fn test_rejection_wins_over_policy_failure() {
        let outcome = NotificationOutcome::new(400, "", Some(payload_error()));
        let verdict = classify_silently(&outcome, BuildStatus::Failure);
        let Verdict::Rejected(message) = verdict else {
            panic!("expected rejection, got {verdict:?}");
        };
        assert!(message.contains("Status code: 400"));
        assert!(message.contains("EOF while parsing a value"));
    }

    #[test]
    fn test_failure_status_is_policy_failure() {
        let outcome = NotificationOutcome::new(200, "OK", None);
        assert_eq!(
            classify_silently(&outcome, BuildStatus::Failure),
            Verdict::PolicyFailure
        );
    }

    #[test]
    fn test_console_lines() {
        let mut buffer = Vec::new();
        let mut console = Console::new(&mut buffer);
        let outcome = NotificationOutcome::new(200, "Everything is OK", None);
        classify(&outcome, BuildStatus::Success, &mut console);
        drop(console);

        let log = String::from_utf8(buffer).unwrap();
        assert!(log.contains(
            "Notification of UB buildStatus: 'SUCCESS' sent successfully to bitbucket, status code: 200, message: 'Everything is OK'"
        ));
        assert!(log.contains("UNBREAKABLE BUILD FINISHED"));
    }

    #[test]
    fn test_enforce() {
        let mut run = RunRecord::new(None, Some("abc".to_string()), None);
        assert!(Verdict::Accepted.enforce(&mut run).is_ok());
        assert!(Verdict::AcceptedWithWarning.enforce(&mut run).is_ok());
        assert_eq!(run.result(), None);

        let err = Verdict::PolicyFailure.enforce(&mut run).unwrap_err();
        assert_eq!(err.to_string(), "Unbreakable build marks the build as failed");
        assert_eq!(run.result(), Some(RunResult::Failure));

        let mut run = RunRecord::new(None, Some("abc".to_string()), None);
        let err = Verdict::Rejected("went wrong".to_string())
            .enforce(&mut run)
            .unwrap_err();
        assert_eq!(err.to_string(), "went wrong");
        assert_eq!(run.result(), Some(RunResult::Failure));
    }
}
