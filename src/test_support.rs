//! Fixtures shared by the notification chain tests.

use std::collections::HashMap;

use crate::credentials::{CredentialStore, Credentials};
use crate::run::RunRecord;

pub const NOTIFY_PATH: &str = "/rest/ubuild/1.0/projects/PRJ/repos/repo/commits/cafebabe/notify";

/// Basic auth header of `git-user:git-secret`.
pub const BASIC_AUTH: &str = "Basic Z2l0LXVzZXI6Z2l0LXNlY3JldA==";

pub fn environment(scm_url: &str) -> HashMap<String, String> {
    [
        ("SCM_URL", scm_url),
        ("BITBUCKET_PROJECT", "PRJ"),
        ("BITBUCKET_REPOSITORY", "repo"),
        ("UNBREAKABLE_REFSPEC", "refs/ubuilds/12"),
        ("COMMIT", "cafebabe"),
        ("JOB_DISPLAY_URL", "https://jenkins.example.com/job/1/display"),
        ("JOB_NAME", "SWB2/repo/UB%2Ftarget%2FPR%2F12"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

pub fn store() -> CredentialStore {
    CredentialStore::new(HashMap::from([(
        "IZ_USER".to_string(),
        Credentials::new("git-user", "git-secret"),
    )]))
}

pub fn multibranch_run() -> RunRecord {
    RunRecord::new(
        Some("SWB2/repo/UB".to_string()),
        Some("cafebabe".to_string()),
        Some("IZ_USER".to_string()),
    )
}
