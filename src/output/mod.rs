mod styling;

use std::fmt::Display;

use styling::{bright_green, bright_red, dim, magenta_bold};

use crate::observer::Completion;

/// Prints the `ubuild` banner to stderr.
///
/// Displays the tool name, version, and description at the start of execution.
pub fn print_banner() {
    eprintln!(
        r"
{} {}
  {}
",
        magenta_bold("🔒 ubuild"),
        dim(env!("CARGO_PKG_VERSION")),
        dim("Unbreakable Build Notifier")
    );
}

/// Prints the final line of an explicit verb.
pub fn print_verdict<E: Display>(verb: &str, outcome: &Result<(), E>) {
    match outcome {
        Ok(()) => eprintln!("{}", bright_green(format!("{verb}: Bitbucket notified ✓"))),
        Err(e) => eprintln!("{}", bright_red(format!("{verb}: {e} ✗"))),
    }
}

/// Prints the final line of the completion observer.
pub fn print_outcome<E: Display>(outcome: &Result<Completion, E>) {
    match outcome {
        Ok(Completion::NotEligible) => {
            eprintln!("{}", dim("Not an unbreakable build, nothing to notify"));
        }
        Ok(Completion::AlreadyNotified) => {
            eprintln!("{}", dim("Unbreakable build verb already called, nothing to notify"));
        }
        Ok(Completion::Notified(verb)) => {
            eprintln!(
                "{}",
                bright_green(format!("{}: Bitbucket notified on completion ✓", verb.name()))
            );
        }
        Err(e) => eprintln!("{}", bright_red(format!("Completion: {e} ✗"))),
    }
}
