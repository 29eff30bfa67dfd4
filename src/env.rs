use std::collections::HashMap;
use std::fmt;

use crate::error::{Result, UbuildError};

pub const BITBUCKET_API_VERSION: &str = "1.0";

/// Environment variables the unbreakable build cannot work without.
///
/// Declaration order is the order in which missing names are reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvVarName {
    ScmUrl,
    BitbucketProject,
    BitbucketRepository,
    UnbreakableRefspec,
    Commit,
    JobDisplayUrl,
    JobName,
}

impl EnvVarName {
    pub const ALL: [EnvVarName; 7] = [
        EnvVarName::ScmUrl,
        EnvVarName::BitbucketProject,
        EnvVarName::BitbucketRepository,
        EnvVarName::UnbreakableRefspec,
        EnvVarName::Commit,
        EnvVarName::JobDisplayUrl,
        EnvVarName::JobName,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            EnvVarName::ScmUrl => "SCM_URL",
            EnvVarName::BitbucketProject => "BITBUCKET_PROJECT",
            EnvVarName::BitbucketRepository => "BITBUCKET_REPOSITORY",
            EnvVarName::UnbreakableRefspec => "UNBREAKABLE_REFSPEC",
            EnvVarName::Commit => "COMMIT",
            EnvVarName::JobDisplayUrl => "JOB_DISPLAY_URL",
            EnvVarName::JobName => "JOB_NAME",
        }
    }
}

impl fmt::Display for EnvVarName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything needed to address the review server for one notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunEnvironment {
    pub bitbucket_url: String,
    pub project_key: String,
    pub repository_slug: String,
    /// Looks like `refs/ubuilds/9999`.
    pub refspec: String,
    /// Commit produced by the fast-forward merge of the unbreakable branch.
    pub commit_id: String,
    pub job_url: String,
    pub isolation_zone: Option<String>,
}

impl RunEnvironment {
    /// Builds the environment from a run's variables.
    ///
    /// # Errors
    ///
    /// Returns [`UbuildError::MissingEnvironment`] naming every absent variable,
    /// in declaration order.
    pub fn resolve(env: &HashMap<String, String>) -> Result<Self> {
        let missing: Vec<String> = EnvVarName::ALL
            .iter()
            .filter(|name| !env.contains_key(name.as_str()))
            .map(ToString::to_string)
            .collect();

        if !missing.is_empty() {
            return Err(UbuildError::MissingEnvironment(missing));
        }

        let get = |name: EnvVarName| env[name.as_str()].clone();

        Ok(Self {
            bitbucket_url: get(EnvVarName::ScmUrl),
            project_key: get(EnvVarName::BitbucketProject),
            repository_slug: get(EnvVarName::BitbucketRepository),
            refspec: get(EnvVarName::UnbreakableRefspec),
            commit_id: get(EnvVarName::Commit),
            job_url: get(EnvVarName::JobDisplayUrl),
            isolation_zone: isolation_zone_name(&get(EnvVarName::JobName)),
        })
    }

    /// `POST` target of the notification.
    pub fn notification_url(&self) -> String {
        format!(
            "{}/rest/ubuild/{}/projects/{}/repos/{}/commits/{}/notify",
            self.bitbucket_url.trim_end_matches('/'),
            BITBUCKET_API_VERSION,
            self.project_key,
            self.repository_slug,
            self.commit_id
        )
    }
}

/// Only the presence of the refspec makes a run an unbreakable build.
pub fn is_unbreakable_build(env: &HashMap<String, String>) -> bool {
    env.contains_key(EnvVarName::UnbreakableRefspec.as_str())
}

/// First segment of a hierarchical job name such as
/// `SWB2/pipeline-unbreakable-build-plugin/UB%2Ftarget%2FPR%2F12`.
///
/// Returns `None` when there is no `/` followed by a segment, or nothing but
/// blanks before the first `/`. Trailing empty segments do not count.
pub fn isolation_zone_name(job_name: &str) -> Option<String> {
    let parts: Vec<&str> = job_name.split('/').collect();
    let significant = parts.iter().rposition(|part| !part.is_empty()).map_or(0, |i| i + 1);

    let first = parts[0];
    if significant > 1 && !first.trim().is_empty() {
        Some(first.to_owned())
    } else {
        None
    }
}
