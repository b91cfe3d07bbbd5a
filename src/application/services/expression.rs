//! Expression prettifying service
//!
//! Turns patsopt's internal constraint notation into readable math:
//! parse, rewrite names and wrapper nodes, print.

use tracing::{debug, instrument};

use crate::application::ApplicationResult;
use crate::config::Settings;
use crate::domain::{parse, DomainResult, ExprTree, Printer, Rewriter, SubstitutionRule};

/// Parse → rewrite → print pipeline configured from settings.
#[derive(Debug, Clone)]
pub struct ExpressionService {
    rewriter: Rewriter,
    printer: Printer,
}

impl ExpressionService {
    /// Compile the configured cleanup pattern and substitution table.
    pub fn new(settings: &Settings) -> ApplicationResult<Self> {
        let rules = settings
            .substitutions
            .iter()
            .map(|rule| SubstitutionRule::new(&rule.pattern, rule.replacement.clone()))
            .collect::<DomainResult<Vec<_>>>()?;

        Ok(Self {
            rewriter: Rewriter::new(&settings.clean_pattern, rules)?,
            printer: Printer::new(settings.hide_types),
        })
    }

    /// Parse and rewrite, returning the simplified tree.
    pub fn tree(&self, notation: &str) -> DomainResult<ExprTree> {
        let mut tree = parse(notation)?;
        self.rewriter.rewrite(&mut tree)?;
        Ok(tree)
    }

    /// Readable rendering of one expression.
    #[instrument(level = "debug", skip(self))]
    pub fn prettify(&self, notation: &str) -> DomainResult<String> {
        let tree = self.tree(notation)?;
        let rendered = self.printer.print(&tree);
        debug!(%rendered, "prettified expression");
        Ok(rendered)
    }
}
