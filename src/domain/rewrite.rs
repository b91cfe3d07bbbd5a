//! Name cleanup and structural simplification of parsed expressions.

use generational_arena::Index;
use regex::{NoExpand, Regex};
use tracing::{instrument, trace};

use crate::domain::arena::ExprTree;
use crate::domain::error::{DomainError, DomainResult};

/// Extracts the user-facing part of compiler-prefixed names.
pub const DEFAULT_CLEAN_PATTERN: &str = r"(?:C3NSTR|S2E)(.+)";

/// Ordered (pattern, replacement) pairs applied after cleanup.
pub const DEFAULT_SUBSTITUTIONS: &[(&str, &str)] = &[
    ("intinf", "int"),
    ("eqeq", "=="),
    ("mul_.+", "*"),
    ("add_.+", "+"),
    ("sub_.+", "-"),
    ("prop", ""),
];

/// Compiler-injected entry point marker, never displayed.
const MAIN_MARKER: &str = "main";
const APPLICATION: &str = "app";
const VARIABLE: &str = "var";
/// Delimiter of generated uniqueness suffixes on variable names.
const STAMP_DELIMITER: char = '$';

/// A compiled substitution rule.
#[derive(Debug, Clone)]
pub struct SubstitutionRule {
    pattern: Regex,
    replacement: String,
}

impl SubstitutionRule {
    pub fn new(pattern: &str, replacement: impl Into<String>) -> DomainResult<Self> {
        Ok(Self {
            pattern: compile(pattern)?,
            replacement: replacement.into(),
        })
    }

    /// Replace every match in `name`; None when the rule does not fire.
    ///
    /// The replacement is literal text, `$` included.
    pub fn apply(&self, name: &str) -> Option<String> {
        if self.pattern.is_match(name) {
            Some(
                self.pattern
                    .replace_all(name, NoExpand(&self.replacement))
                    .into_owned(),
            )
        } else {
            None
        }
    }
}

fn compile(pattern: &str) -> DomainResult<Regex> {
    Regex::new(pattern).map_err(|source| DomainError::InvalidPattern {
        pattern: pattern.to_string(),
        source,
    })
}

/// Two-pass expression rewriter.
///
/// Pass one normalizes every node name independently. Pass two removes the
/// compiler's wrapper nodes bottom-up.
#[derive(Debug, Clone)]
pub struct Rewriter {
    clean_pattern: Regex,
    rules: Vec<SubstitutionRule>,
}

impl Rewriter {
    pub fn new(clean_pattern: &str, rules: Vec<SubstitutionRule>) -> DomainResult<Self> {
        Ok(Self {
            clean_pattern: compile(clean_pattern)?,
            rules,
        })
    }

    /// Rewriter with the built-in cleanup pattern and substitution table.
    pub fn with_defaults() -> DomainResult<Self> {
        let rules = DEFAULT_SUBSTITUTIONS
            .iter()
            .map(|(pattern, replacement)| SubstitutionRule::new(pattern, *replacement))
            .collect::<DomainResult<Vec<_>>>()?;
        Self::new(DEFAULT_CLEAN_PATTERN, rules)
    }

    pub fn rewrite(&self, tree: &mut ExprTree) -> DomainResult<()> {
        self.rename(tree);
        simplify(tree)
    }

    /// Pass one: cleanup pattern, then each substitution rule in order.
    #[instrument(level = "debug", skip_all)]
    pub fn rename(&self, tree: &mut ExprTree) {
        let indices: Vec<Index> = tree.iter().map(|(idx, _)| idx).collect();
        for idx in indices {
            let renamed = self.clean_name(tree.name(idx));
            tree.set_name(idx, renamed);
        }
    }

    pub fn clean_name(&self, name: &str) -> String {
        let mut name = match self.clean_pattern.captures(name).and_then(|c| c.get(1)) {
            Some(inner) => inner.as_str().to_string(),
            None => name.to_string(),
        };
        for rule in &self.rules {
            if let Some(replaced) = rule.apply(&name) {
                name = replaced;
            }
        }
        name
    }
}

/// Pass two: drop `main` markers, unwrap applications, strip variable stamps.
#[instrument(level = "debug", skip_all)]
pub fn simplify(tree: &mut ExprTree) -> DomainResult<()> {
    let root = tree.root();
    simplify_node(tree, root)
}

fn simplify_node(tree: &mut ExprTree, idx: Index) -> DomainResult<()> {
    let kept: Vec<Index> = tree
        .children(idx)
        .iter()
        .copied()
        .filter(|&child| tree.name(child) != MAIN_MARKER)
        .collect();
    tree.set_children(idx, kept.clone());
    for child in kept {
        simplify_node(tree, child)?;
    }

    if tree.name(idx) == APPLICATION {
        unwrap_application(tree, idx)?;
    }
    if tree.name(idx) == VARIABLE {
        strip_variable(tree, idx)?;
    }
    Ok(())
}

/// `app(wrapper(callee), args...)` becomes `callee(args...)`.
fn unwrap_application(tree: &mut ExprTree, idx: Index) -> DomainResult<()> {
    let children = tree.children(idx).to_vec();
    let wrapper = children
        .first()
        .copied()
        .ok_or_else(|| DomainError::MalformedApplication {
            reason: "missing callee wrapper".to_string(),
        })?;
    let callee = tree
        .children(wrapper)
        .first()
        .copied()
        .ok_or_else(|| DomainError::MalformedApplication {
            reason: format!("callee wrapper '{}' is empty", tree.name(wrapper)),
        })?;

    let callee_name = tree.name(callee).to_string();
    trace!(callee = %callee_name, args = children.len() - 1, "unwrapping application");
    tree.set_name(idx, callee_name);
    tree.set_children(idx, children[1..].to_vec());
    Ok(())
}

/// `var(name$stamp(...))` keeps only `var(name)`.
fn strip_variable(tree: &mut ExprTree, idx: Index) -> DomainResult<()> {
    let child = tree
        .children(idx)
        .first()
        .copied()
        .ok_or_else(|| DomainError::MalformedVariable {
            reason: "missing identifier".to_string(),
        })?;

    let name = tree.name(child);
    if let Some(pos) = name.find(STAMP_DELIMITER) {
        let stripped = name[..pos].to_string();
        tree.set_name(child, stripped);
    }
    tree.set_children(child, Vec::new());
    Ok(())
}
