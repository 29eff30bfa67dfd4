use log::error;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::error::{Result, UbuildError};
use crate::run::{RunRecord, RunResult};
use crate::run_console::Console;

/// Username/password pair sent as pre-emptive basic authentication.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

#[cfg(test)]
impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"********")
            .finish()
    }
}

/// Looks credentials up by id.
pub trait CredentialResolver {
    fn resolve(&self, credentials_id: &str) -> Option<Credentials>;
}

/// Credentials declared in the configuration file, keyed by id.
#[derive(Debug, Clone, Default)]
pub struct CredentialStore {
    entries: HashMap<String, Credentials>,
}

impl CredentialStore {
    pub fn new(entries: HashMap<String, Credentials>) -> Self {
        Self { entries }
    }
}

impl CredentialResolver for CredentialStore {
    fn resolve(&self, credentials_id: &str) -> Option<Credentials> {
        self.entries.get(credentials_id).cloned()
    }
}

/// Finds the credentials used to check out the run.
///
/// # Errors
///
/// Marks the run as failed and returns an error when the run carries no
/// credentials id or when the id cannot be resolved.
pub fn credentials_or_fail(
    run: &mut RunRecord,
    resolver: &dyn CredentialResolver,
    console: &mut Console<'_>,
) -> Result<Credentials> {
    let Some(credentials_id) = run.credentials_id().map(str::to_owned) else {
        run.set_result(RunResult::Failure);
        let err = UbuildError::MissingCredentialsId;
        error!("{err}");
        console.log(&err.to_string());
        return Err(err);
    };

    match resolver.resolve(&credentials_id) {
        Some(credentials) => Ok(credentials),
        None => {
            run.set_result(RunResult::Failure);
            let err = UbuildError::CredentialsNotFound(credentials_id);
            error!("{err}");
            console.log(&err.to_string());
            Err(err)
        }
    }
}
