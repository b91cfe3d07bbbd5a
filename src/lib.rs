//! Friendlier patsopt diagnostics.
//!
//! Reads the ATS compiler's output, shows each located diagnostic with a
//! highlighted excerpt of the source it points at, and rewrites the
//! compiler's internal constraint notation into readable expressions.

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
pub mod util;
