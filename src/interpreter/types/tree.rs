//! Published statement tree
//!
//! The parser owns the mutable side of every program. What it hands to the
//! evaluator is this read-only tree: each program is a [`ProgramView`] onto a
//! `watch` channel that the parser appends to, and each statement is an
//! immutable [`StatementNode`] that exists only once it is executable.

use std::fmt;
use std::sync::Arc;
use tokio::sync::watch;

/* ===================== Statements ===================== */

/// One executable MiniSpec statement
#[derive(Debug)]
pub enum StatementNode {
    /// Function call, assignment, or `->` return
    Action { text: String },
    /// `?condition{...}` with no else branch
    If { condition: String, body: ProgramView },
    /// `N{...}`, body evaluated N times
    Loop { count: u64, body: ProgramView },
}

impl StatementNode {
    pub fn action(text: impl Into<String>) -> Self {
        StatementNode::Action { text: text.into() }
    }

    /// Nested program of an `if` or `loop`
    pub fn body(&self) -> Option<&ProgramView> {
        match self {
            StatementNode::Action { .. } => None,
            StatementNode::If { body, .. } | StatementNode::Loop { body, .. } => Some(body),
        }
    }

    /// Source text identifying this statement in diagnostics
    pub fn source(&self) -> String {
        match self {
            StatementNode::Action { text } => text.trim().to_string(),
            StatementNode::If { condition, .. } => format!("?{}", condition.trim()),
            StatementNode::Loop { count, .. } => count.to_string(),
        }
    }
}

impl fmt::Display for StatementNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatementNode::Action { text } => write!(f, "{}", text.trim()),
            StatementNode::If { condition, body } => {
                write!(f, "if {} {{{}}}", condition.trim(), body)
            }
            StatementNode::Loop { count, body } => write!(f, "[{}] {{{}}}", count, body),
        }
    }
}

/* ===================== Programs ===================== */

/// State shared from a parsing program to its readers
#[derive(Debug, Default)]
pub(crate) struct Published {
    pub statements: Vec<Arc<StatementNode>>,
    pub finished: bool,
}

/// Read side of a program that may still be streaming in
///
/// Cloning a view is cheap; every clone sees the same statements.
#[derive(Debug, Clone)]
pub struct ProgramView {
    rx: watch::Receiver<Published>,
}

impl ProgramView {
    pub(crate) fn new(rx: watch::Receiver<Published>) -> Self {
        Self { rx }
    }

    /// Wait for the statement at `idx`
    ///
    /// Resolves as soon as the statement is published. Resolves to `None`
    /// once the program is finished (or its parser is gone) without ever
    /// reaching `idx`.
    pub async fn statement(&mut self, idx: usize) -> Option<Arc<StatementNode>> {
        match self
            .rx
            .wait_for(|p| p.statements.len() > idx || p.finished)
            .await
        {
            Ok(published) => published.statements.get(idx).cloned(),
            // Parser dropped: nothing more will ever be published
            Err(_) => None,
        }
    }

    /// Statements published so far
    pub fn statements(&self) -> Vec<Arc<StatementNode>> {
        self.rx.borrow().statements.clone()
    }

    pub fn len(&self) -> usize {
        self.rx.borrow().statements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether the closing brace of this program has been parsed
    pub fn is_finished(&self) -> bool {
        self.rx.borrow().finished
    }
}

impl fmt::Display for ProgramView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for statement in self.statements() {
            write!(f, "{}; ", statement)?;
        }
        Ok(())
    }
}
