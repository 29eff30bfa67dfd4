use chrono::Utc;

use crate::run::{RunMarker, RunRecord};

/// Whether an unbreakable build verb already notified for this run.
pub fn is_set(run: &RunRecord) -> bool {
    run.markers()
        .iter()
        .any(|marker| matches!(marker, RunMarker::UbuildNotified { .. }))
}

/// Marks the run as notified. The first verb to call this wins; later calls
/// leave the existing marker untouched.
pub fn set(run: &mut RunRecord, verb: &str) {
    if is_set(run) {
        return;
    }

    run.add_marker(RunMarker::UbuildNotified {
        verb: verb.to_owned(),
        recorded_at: Utc::now(),
    });
}
