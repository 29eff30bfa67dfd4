use regex::Regex;
use std::sync::LazyLock;

/// Shape of an unbreakable build branch: `refs/ubuilds/{mergeRequestId}`.
pub const UB_BRANCH_REGEX: &str = r"refs/ubuilds/(?<mergeRequestId>[0-9]+)";

static UB_BRANCH_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!("^{UB_BRANCH_REGEX}$")).expect("unbreakable branch pattern is valid")
});

/// An unbreakable build branch and the merge request it was created for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchReference {
    merge_request_id: String,
}

impl BranchReference {
    /// Parses a refspec such as `refs/ubuilds/42`.
    ///
    /// Returns `None` when the name does not follow the convention; that only
    /// means the branch is not an unbreakable build branch. The match is exact
    /// and case-sensitive, nothing is trimmed.
    pub fn parse(raw_name: &str) -> Option<Self> {
        let captures = UB_BRANCH_PATTERN.captures(raw_name)?;
        let merge_request_id = captures.name("mergeRequestId")?.as_str().to_owned();

        Some(Self { merge_request_id })
    }

    pub fn merge_request_id(&self) -> &str {
        &self.merge_request_id
    }
}
