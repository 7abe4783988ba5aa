//! Diagnostic collection and rendering.
//!
//! The analysis reports through the [`Logger`](diagnostics::Logger) trait.
//! [`DiagnosticLog`](diagnostics::DiagnosticLog) is the collecting
//! implementation; every stored diagnostic is mirrored as a `tracing` event.

pub mod diagnostics;
