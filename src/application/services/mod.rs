//! Application services
//!
//! Concrete service implementations that orchestrate domain logic.
//! Services depend on I/O boundary traits (FileSystem) but are themselves
//! concrete structs, not traits.

mod expression;
mod formatter;

pub use expression::ExpressionService;
pub use formatter::{parse_diagnostic, DiagnosticFormatter, FormatSummary};
