use std::path::Path;

use tracing::debug;

use super::{Diagnostic, DiagnosticSink};
use crate::engine::{Problem, ProblemHandler};
use crate::resource::Text;

/// Translates engine problems into diagnostics on one resource
pub struct MarkerHandler<'a> {
    sink: &'a dyn DiagnosticSink,
    resource: &'a Path,
    text: &'a Text,
    recorded: usize,
}

impl<'a> MarkerHandler<'a> {
    pub fn new(sink: &'a dyn DiagnosticSink, resource: &'a Path, text: &'a Text) -> Self {
        Self {
            sink,
            resource,
            text,
            recorded: 0,
        }
    }

    /// Number of diagnostics recorded so far
    pub fn recorded(&self) -> usize {
        self.recorded
    }
}

impl ProblemHandler for MarkerHandler<'_> {
    fn handle_problem(&mut self, problem: Problem) {
        // Engines may report past the end of the file (e.g. "unexpected end of input").
        let line = problem.line.clamp(1, self.text.line_count());
        if line != problem.line {
            debug!(
                "Problem on line {} of {} is out of range, recording it on line {}",
                problem.line,
                self.resource.display(),
                line
            );
        }

        self.sink.add(
            self.resource,
            Diagnostic {
                line,
                column: problem.character.max(1),
                severity: problem.severity,
                message: problem.message,
                rule: problem.code,
            },
        );
        self.recorded += 1;
    }
}
