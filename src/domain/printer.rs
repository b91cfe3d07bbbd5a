//! Shape-driven rendering of expression trees.

use generational_arena::Index;
use itertools::Itertools;

use crate::domain::arena::ExprTree;

/// Characters that make up an infix operator name.
const OPERATOR_CHARS: &str = "!@#$%^&*=><+-";

/// Renders expression trees as readable, math-like text.
///
/// Purely structural: decisions depend on the node's name and child count,
/// never on types or symbols.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Printer {
    /// Render single-child wrappers (type annotations) as just their child.
    pub hide_types: bool,
}

impl Default for Printer {
    fn default() -> Self {
        Self { hide_types: true }
    }
}

impl Printer {
    pub fn new(hide_types: bool) -> Self {
        Self { hide_types }
    }

    pub fn print(&self, tree: &ExprTree) -> String {
        self.print_node(tree, tree.root())
    }

    pub fn print_node(&self, tree: &ExprTree, idx: Index) -> String {
        let name = tree.name(idx);
        let children = tree.children(idx);

        if name.is_empty() {
            return self.print_list(tree, children);
        }
        match children {
            [left, right] if is_operator(name) => format!(
                "({} {} {})",
                self.print_node(tree, *left),
                name,
                self.print_node(tree, *right)
            ),
            [] => name.to_string(),
            [only] if self.hide_types => self.print_node(tree, *only),
            _ => format!("{}({})", name, self.print_list(tree, children)),
        }
    }

    fn print_list(&self, tree: &ExprTree, children: &[Index]) -> String {
        children
            .iter()
            .map(|&child| self.print_node(tree, child))
            .join(", ")
    }
}

/// True when every character of `name` is an operator character.
pub fn is_operator(name: &str) -> bool {
    name.chars().all(|c| OPERATOR_CHARS.contains(c))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::parser::parse;
    use crate::domain::rewrite::Rewriter;
    use rstest::rstest;

    fn pretty(notation: &str, hide_types: bool) -> String {
        let mut tree = parse(notation).unwrap();
        Rewriter::with_defaults().unwrap().rewrite(&mut tree).unwrap();
        Printer::new(hide_types).print(&tree)
    }

    #[rstest]
    #[case("==", true)]
    #[case("<=", true)]
    #[case("+", true)]
    #[case("g1int_lt_int", false)]
    #[case("a+b", false)]
    fn test_is_operator(#[case] name: &str, #[case] expected: bool) {
        assert_eq!(is_operator(name), expected);
    }

    #[test]
    fn test_operator_renders_infix() {
        assert_eq!(pretty("eqeq(x, y)", true), "(x == y)");
    }

    #[test]
    fn test_nested_operators_parenthesize() {
        assert_eq!(
            pretty("eqeq(add_int_int(a, b), mul_int_int(c, d))", true),
            "((a + b) == (c * d))"
        );
    }

    #[test]
    fn test_operator_with_wrong_arity_renders_as_call() {
        assert_eq!(pretty("+(a, b, c)", true), "+(a, b, c)");
    }

    #[rstest]
    #[case(true, "x")]
    #[case(false, "int(x)")]
    fn test_wrapper_hiding(#[case] hide_types: bool, #[case] expected: &str) {
        assert_eq!(pretty("S2Eprop(intinf(x))", hide_types), expected);
    }

    #[test]
    fn test_application_renders_as_call() {
        assert_eq!(pretty("app(foo(bar), x, y)", true), "bar(x, y)");
    }

    #[test]
    fn test_variable_stamp_is_hidden() {
        assert_eq!(pretty("var(tmp$42)", true), "tmp");
        assert_eq!(pretty("var(tmp$42)", false), "var(tmp)");
    }

    #[test]
    fn test_group_renders_bare_list() {
        let mut tree = parse("f(a, b)").unwrap();
        tree.set_name(tree.root(), "");
        assert_eq!(Printer::default().print(&tree), "a, b");
    }

    #[test]
    fn test_plain_structure_keeps_leaves() {
        let tree = parse("f(g(a, b), c; d)").unwrap();
        let printed = Printer::new(false).print(&tree);
        assert_eq!(printed, "f(g(a, b), c, d)");
    }
}
