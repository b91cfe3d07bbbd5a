//! Tokenizer and stack-based parser for patsopt's flat expression notation.
//!
//! The notation knows four structural characters: `(` and `)` open and close
//! a group, `,` and `;` separate siblings. Everything else up to whitespace
//! or a structural character is a name.

use tracing::{instrument, trace};

use crate::domain::arena::ExprTree;
use crate::domain::error::{DomainError, DomainResult};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Open,
    Close,
    Separator,
    Name(String),
}

/// Split notation into tokens.
///
/// Whitespace ends a name and is dropped; structural characters end a name
/// and become tokens of their own.
pub fn tokenize(input: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut name = String::new();

    for ch in input.chars() {
        let structural = match ch {
            '(' => Some(Token::Open),
            ')' => Some(Token::Close),
            ',' | ';' => Some(Token::Separator),
            c if c.is_whitespace() => None,
            c => {
                name.push(c);
                continue;
            }
        };
        if !name.is_empty() {
            tokens.push(Token::Name(std::mem::take(&mut name)));
        }
        tokens.extend(structural);
    }
    if !name.is_empty() {
        tokens.push(Token::Name(name));
    }

    tokens
}

/// Deepest nesting accepted; rewriting and printing recurse once per level.
pub const MAX_DEPTH: usize = 256;

/// Parse notation into an expression tree rooted at a synthetic node.
///
/// A name token names the current node (a later name overwrites an earlier
/// one). A separator opens a new sibling under the enclosing group, i.e. the
/// frame on top of the stack. Closing the root frame is rejected, and so is
/// nesting beyond [`MAX_DEPTH`].
#[instrument(level = "debug")]
pub fn parse(input: &str) -> DomainResult<ExprTree> {
    let mut tree = ExprTree::new();
    let mut stack = vec![tree.root()];
    let mut current = tree.root();

    for (position, token) in tokenize(input).into_iter().enumerate() {
        match token {
            Token::Open => {
                if stack.len() > MAX_DEPTH {
                    return Err(DomainError::TooDeep { depth: MAX_DEPTH });
                }
                let child = tree.add_child(current);
                stack.push(current);
                current = child;
            }
            Token::Close => {
                if stack.len() <= 1 {
                    return Err(DomainError::UnbalancedGroup { position });
                }
                if let Some(parent) = stack.pop() {
                    current = parent;
                }
            }
            Token::Separator => {
                let enclosing = *stack.last().unwrap_or(&tree.root());
                current = tree.add_child(enclosing);
            }
            Token::Name(name) => tree.set_name(current, name),
        }
    }
    trace!(nodes = tree.len(), depth = tree.depth(), "parsed expression");

    Ok(tree)
}
