use std::fmt::Display;

use tracing::{error, info, warn};

use crate::{
    errors::errors::{Error, ErrorTip, Severity},
    Position,
};

/// Sink for everything the analysis reports. Reporting never fails.
pub trait Logger {
    fn report(&mut self, position: &Position, severity: Severity, message: &str);

    fn report_error(&mut self, error: &Error) {
        self.report(error.get_position(), error.severity(), &error.to_string());
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub position: Position,
    pub severity: Severity,
    /// The error variant name, `None` for free-form reports.
    pub name: Option<&'static str>,
    pub message: String,
    pub tip: Option<String>,
}

impl Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}:{}: {}: {}",
            self.position.1, self.position.0, self.severity, self.message
        )
    }
}

/// Collects diagnostics in report order, dropping exact duplicates and
/// anything below `min_severity`.
#[derive(Debug, Clone)]
pub struct DiagnosticLog {
    diagnostics: Vec<Diagnostic>,
    min_severity: Severity,
}

impl Default for DiagnosticLog {
    fn default() -> Self {
        DiagnosticLog::new(Severity::Notice)
    }
}

impl DiagnosticLog {
    pub fn new(min_severity: Severity) -> Self {
        DiagnosticLog {
            diagnostics: vec![],
            min_severity,
        }
    }

    fn push(&mut self, diagnostic: Diagnostic) {
        if diagnostic.severity < self.min_severity || self.diagnostics.contains(&diagnostic) {
            return;
        }

        match diagnostic.severity {
            Severity::Error => error!(position = diagnostic.position.0, file = %diagnostic.position.1, "{}", diagnostic.message),
            Severity::Warning => warn!(position = diagnostic.position.0, file = %diagnostic.position.1, "{}", diagnostic.message),
            Severity::Notice => info!(position = diagnostic.position.0, file = %diagnostic.position.1, "{}", diagnostic.message),
        }
        self.diagnostics.push(diagnostic);
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.diagnostics.iter().filter(|d| d.severity == severity).count()
    }

    pub fn has_errors(&self) -> bool {
        self.count(Severity::Error) > 0
    }

    /// Names of the reported error variants, in report order.
    pub fn names(&self) -> Vec<&'static str> {
        self.diagnostics.iter().filter_map(|d| d.name).collect()
    }
}

impl Logger for DiagnosticLog {
    fn report(&mut self, position: &Position, severity: Severity, message: &str) {
        self.push(Diagnostic {
            position: position.clone(),
            severity,
            name: None,
            message: message.to_string(),
            tip: None,
        });
    }

    fn report_error(&mut self, error: &Error) {
        let tip = match error.get_tip() {
            ErrorTip::None => None,
            ErrorTip::Suggestion(tip) => Some(tip),
        };
        self.push(Diagnostic {
            position: error.get_position().clone(),
            severity: error.severity(),
            name: Some(error.get_error_name()),
            message: error.to_string(),
            tip,
        });
    }
}

/// Line number (from 1), line text and column (from 0) of a byte offset.
pub fn get_line_at_position(source: &str, position: u32) -> Option<(usize, String, usize)> {
    let pos = position as usize;
    let mut start = 0;

    for (index, line) in source.split_inclusive('\n').enumerate() {
        let end = start + line.len();
        if (start..end).contains(&pos) {
            return Some((index + 1, line.to_string(), pos - start));
        }
        start = end;
    }

    // The end-of-file position points just past the last line.
    if pos == source.len() {
        let line = source.split_inclusive('\n').last().unwrap_or("");
        let line_number = source.split_inclusive('\n').count().max(1);
        return Some((line_number, line.to_string(), line.trim_end_matches('\n').len()));
    }

    None
}

fn remove_starting_whitespace(string: &str) -> (&str, usize) {
    let trimmed = string.trim_start_matches([' ', '\t']);
    (trimmed, string.len() - trimmed.len())
}

/// Formats a diagnostic with the offending source line:
///
/// ```text
/// error: TypeMatchError (Expected type `int`, received `string`)
/// -> test.php
///    |
/// 20 | $a = "x";
///    | -----^
/// ```
pub fn render_diagnostic(diagnostic: &Diagnostic, source: &str) -> String {
    let title = diagnostic.name.map_or(diagnostic.message.as_str(), |name| name);
    let mut out = match &diagnostic.tip {
        Some(tip) => format!("{}: {} ({})\n", diagnostic.severity, title, tip),
        None => format!("{}: {}\n", diagnostic.severity, title),
    };
    out.push_str(&format!("-> {}\n", diagnostic.position.1));

    let Some((line, line_text, line_pos)) = get_line_at_position(source, diagnostic.position.0) else {
        return out;
    };

    let line_string = line.to_string();
    let padding = line_string.len() + 2;
    let (line_text_removed, removed_whitespace) = remove_starting_whitespace(&line_text);
    let arrows = line_pos.saturating_sub(removed_whitespace) + 1;

    out.push_str(&format!("{:>padding$}\n", "|"));
    out.push_str(&format!("{} | {}\n", line_string, line_text_removed.trim_end()));
    out.push_str(&format!("{:>padding$} {:->arrows$}\n", "|", "^"));
    out
}
