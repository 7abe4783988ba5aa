use crate::errors::errors::Severity;

/// Options of one analysis session.
#[derive(Debug, Clone)]
pub struct Config {
    /// Diagnostics below this severity are dropped.
    pub min_severity: Severity,
    /// Reject `mixed` values where a more specific type is expected.
    pub strict_mixed: bool,
    /// Report checked exceptions missing from a `throws` list.
    pub check_throws: bool,
    pub report_unreachable: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            min_severity: Severity::Notice,
            strict_mixed: false,
            check_throws: true,
            report_unreachable: true,
        }
    }
}
