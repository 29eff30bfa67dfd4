use thiserror::Error;

#[derive(Error, Debug)]
pub enum UbuildError {
    #[error(
        "These environment variables are missing {} and are needed for the unbreakable build feature. \
         Please, make sure that your project-repository is registered as an Unbreakable build in Bitbucket, \
         and make sure that your instance of the SWB pipeline is correctly configured, \
         the build has been marked has failed.",
        .0.join(", ")
    )]
    MissingEnvironment(Vec<String>),

    #[error(
        "Unbreakable build actions should only be called from Unbreakable Build branches \
         (name should match: '{pattern}'). Current branch refSpec is '{actual}'"
    )]
    InvalidRefspec { pattern: String, actual: String },

    #[error(
        "UbreakableBuild - ABORTING - We were not able to determine the CredentialsId from the Run. \
         Are you sure this run comes from a MultiBranchPipelineJob ?"
    )]
    MissingCredentialsId,

    #[error(
        "Unbreakable Build Error - Either the credential {0} cannot be found or the user triggering the run \
         is not permitted to use the credential in the context of the run, the build has been marked has failed."
    )]
    CredentialsNotFound(String),

    #[error("{0}")]
    NotificationRejected(String),

    #[error("Unbreakable build marks the build as failed")]
    PolicyFailure,

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, UbuildError>;
