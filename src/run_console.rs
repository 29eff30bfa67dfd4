use std::io::Write;

/// Run console the notification chain reports to.
///
/// The sink is optional: without one every line is dropped.
pub struct Console<'a> {
    out: Option<&'a mut dyn Write>,
}

impl<'a> Console<'a> {
    pub fn new(out: &'a mut dyn Write) -> Self {
        Self { out: Some(out) }
    }

    pub fn silent() -> Self {
        Self { out: None }
    }

    pub fn log(&mut self, message: &str) {
        if let Some(out) = self.out.as_mut() {
            // best effort, a broken console must not fail the run
            let _ = writeln!(out, "{message}");
        }
    }
}
