use serde::{Deserialize, Serialize};

use super::types::BuildStatus;

/// JSON body of the notify call.
///
/// ```json
/// {
///   "jobUrl": "http://...",
///   "isolationZone": "adas-dfd",
///   "mergeRequestId": "1",
///   "result": "FAILURE|SUCCESS"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationPayload {
    pub job_url: String,
    pub isolation_zone: Option<String>,
    pub merge_request_id: String,
    pub result: BuildStatus,
}

/// Serializes the notify body.
pub fn generate_payload(
    job_url: &str,
    isolation_zone: Option<&str>,
    merge_request_id: &str,
    status: BuildStatus,
) -> serde_json::Result<String> {
    serde_json::to_string(&NotificationPayload {
        job_url: job_url.to_owned(),
        isolation_zone: isolation_zone.map(str::to_owned),
        merge_request_id: merge_request_id.to_owned(),
        result: status,
    })
}
