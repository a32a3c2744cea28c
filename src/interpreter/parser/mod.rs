//! Streaming MiniSpec parser
//!
//! Source text arrives in arbitrary fragments and is consumed one character
//! at a time. A [`Program`] tracks brace depth and hands every character to
//! the [`Statement`] being parsed; the statement's [`ParsingState`] decides
//! what the character means. Statements are published to the program's
//! [`ProgramView`] the moment they become executable:
//!
//! - an action at its terminator (`;`, `}`, or the `)` closing its call)
//! - an `if` / `loop` at the `{` opening its body, before the body is parsed
//!
//! A program parsed in live mode also submits each of its own statements to
//! the execution queue at that moment. Nested programs never do; their
//! statements are reached through the enclosing statement's body.

use std::sync::Arc;
use tokio::sync::watch;
use tokio_stream::{Stream, StreamExt};
use tracing::debug;

use super::errors::{InterpreterError, Result};
use super::types::tree::{ProgramView, Published, StatementNode};
use crate::worker::Submitter;

#[cfg(test)]
mod tests;

/* ===================== Fragments ===================== */

/// A piece of streamed source text
///
/// Absent (`None`) and empty fragments are skipped.
pub trait Fragment {
    fn text(&self) -> Option<&str>;
}

impl Fragment for str {
    fn text(&self) -> Option<&str> {
        Some(self)
    }
}

impl Fragment for String {
    fn text(&self) -> Option<&str> {
        Some(self.as_str())
    }
}

impl<T: Fragment> Fragment for Option<T> {
    fn text(&self) -> Option<&str> {
        self.as_ref().and_then(|t| t.text())
    }
}

impl<T: Fragment + ?Sized> Fragment for &T {
    fn text(&self) -> Option<&str> {
        (**self).text()
    }
}

/* ===================== Statement ===================== */

/// How the next character of a statement is classified
#[derive(Debug)]
pub enum ParsingState {
    /// Action text, or the first characters of an `if` / `loop`
    Code,
    /// Reserved; the parser never enters it and treats it like `Code`
    Arguments,
    /// Between `?` and `{`
    Condition,
    /// Between the leading digit and `{`
    LoopCount,
    /// Inside the body; every character goes to the nested program
    SubStatements(Box<Program>),
}

/// What a statement reports back to its program after one character
#[derive(Debug)]
enum Feed {
    Buffered,
    /// Header of an `if` / `loop` is complete, body still to come
    Executable(Arc<StatementNode>),
    /// Statement is over; `Some` when it still has to be published
    Complete(Option<Arc<StatementNode>>),
}

/// A statement being parsed
#[derive(Debug)]
pub struct Statement {
    buffer: String,
    state: ParsingState,
    /// Cleared by the first non-digit, non-whitespace character
    loop_possible: bool,
    paren_depth: usize,
    /// Open quote character; terminators and braces inside are plain text
    quote: Option<char>,
}

impl Statement {
    pub fn new() -> Self {
        Self {
            buffer: String::new(),
            state: ParsingState::Code,
            loop_possible: true,
            paren_depth: 0,
            quote: None,
        }
    }

    pub fn parsing_state(&self) -> &ParsingState {
        &self.state
    }

    /// Text buffered for the part currently being parsed
    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    /// Whether the innermost statement being parsed is inside a quote
    fn in_quote(&self) -> bool {
        match &self.state {
            ParsingState::SubStatements(body) => body.current.in_quote(),
            _ => self.quote.is_some(),
        }
    }

    /// Buffer quote characters and everything between them
    fn feed_quoted(&mut self, c: char) -> bool {
        match self.quote {
            Some(open) => {
                if c == open {
                    self.quote = None;
                }
            }
            None if c == '\'' || c == '"' => {
                self.quote = Some(c);
                self.loop_possible = false;
            }
            None => return false,
        }
        self.buffer.push(c);
        true
    }

    fn feed(&mut self, c: char) -> Result<Feed> {
        if matches!(
            self.state,
            ParsingState::Code | ParsingState::Arguments | ParsingState::Condition
        ) && self.feed_quoted(c)
        {
            return Ok(Feed::Buffered);
        }

        match &mut self.state {
            ParsingState::Code | ParsingState::Arguments => Ok(self.feed_code(c)),

            ParsingState::Condition => {
                if c != '{' {
                    self.buffer.push(c);
                    return Ok(Feed::Buffered);
                }
                let condition = std::mem::take(&mut self.buffer).trim().to_string();
                let body = Program::new();
                let node = Arc::new(StatementNode::If {
                    condition,
                    body: body.view(),
                });
                self.state = ParsingState::SubStatements(Box::new(body));
                Ok(Feed::Executable(node))
            }

            ParsingState::LoopCount => {
                if c != '{' {
                    self.buffer.push(c);
                    return Ok(Feed::Buffered);
                }
                let text = std::mem::take(&mut self.buffer);
                let text = text.trim();
                let count = text.parse::<u64>().map_err(|_| {
                    InterpreterError::malformed(
                        format!("loop count `{}` is not a non-negative integer", text),
                        text,
                    )
                })?;
                let body = Program::new();
                let node = Arc::new(StatementNode::Loop {
                    count,
                    body: body.view(),
                });
                self.state = ParsingState::SubStatements(Box::new(body));
                Ok(Feed::Executable(node))
            }

            ParsingState::SubStatements(body) => {
                if body.feed_char(c)? {
                    Ok(Feed::Complete(None))
                } else {
                    Ok(Feed::Buffered)
                }
            }
        }
    }

    fn feed_code(&mut self, c: char) -> Feed {
        match c {
            '?' if self.paren_depth == 0 => {
                self.state = ParsingState::Condition;
                Feed::Buffered
            }
            ';' | '}' => self.finish_action(),
            ')' => {
                self.buffer.push(c);
                if self.paren_depth > 1 {
                    self.paren_depth -= 1;
                    Feed::Buffered
                } else {
                    self.paren_depth = 0;
                    self.finish_action()
                }
            }
            _ => {
                if c == '(' {
                    self.paren_depth += 1;
                }
                self.buffer.push(c);
                if c.is_ascii_digit() {
                    if self.loop_possible {
                        self.state = ParsingState::LoopCount;
                    }
                } else if !c.is_whitespace() {
                    self.loop_possible = false;
                }
                Feed::Buffered
            }
        }
    }

    fn finish_action(&mut self) -> Feed {
        let text = std::mem::take(&mut self.buffer);
        let text = text.trim();
        if text.is_empty() {
            Feed::Complete(None)
        } else {
            Feed::Complete(Some(Arc::new(StatementNode::action(text))))
        }
    }
}

impl Default for Statement {
    fn default() -> Self {
        Self::new()
    }
}

/* ===================== Program ===================== */

/// Parse side of a MiniSpec program
///
/// Owns its statements while they are being parsed and publishes each one
/// through a `watch` channel. Once the closing `}` at depth 0 is consumed the
/// program is finished and ignores any further input.
#[derive(Debug)]
pub struct Program {
    tx: watch::Sender<Published>,
    current: Statement,
    depth: usize,
    finished: bool,
    submitter: Option<Submitter>,
}

impl Program {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(Published::default());
        Self {
            tx,
            current: Statement::new(),
            depth: 0,
            finished: false,
            submitter: None,
        }
    }

    /// Program whose statements are also pushed onto the execution queue
    pub(crate) fn live(submitter: Submitter) -> Self {
        Self {
            submitter: Some(submitter),
            ..Self::new()
        }
    }

    /// Read side of this program, for evaluation
    pub fn view(&self) -> ProgramView {
        ProgramView::new(self.tx.subscribe())
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Braces opened and not yet closed
    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn statement_count(&self) -> usize {
        self.tx.borrow().statements.len()
    }

    /// Statement currently being parsed
    pub fn current(&self) -> &Statement {
        &self.current
    }

    /// Consume one character; returns whether the program is finished
    pub fn feed_char(&mut self, c: char) -> Result<bool> {
        if self.finished {
            return Ok(true);
        }

        if self.current.in_quote() {
            return self.feed_current(c);
        }

        match c {
            '{' => self.depth += 1,
            '}' if self.depth == 0 => {
                // Closing brace also terminates a pending action
                if let Feed::Complete(Some(node)) = self.current.feed(c)? {
                    self.publish(node);
                }
                self.current = Statement::new();
                self.finish();
                return Ok(true);
            }
            '}' => self.depth -= 1,
            _ => {}
        }

        self.feed_current(c)
    }

    fn feed_current(&mut self, c: char) -> Result<bool> {
        match self.current.feed(c)? {
            Feed::Buffered => {}
            Feed::Executable(node) => self.publish(node),
            Feed::Complete(node) => {
                if let Some(node) = node {
                    self.publish(node);
                }
                self.current = Statement::new();
            }
        }

        Ok(false)
    }

    /// Consume a fragment; stops at the closing brace
    pub fn feed(&mut self, fragment: &str) -> Result<bool> {
        for c in fragment.chars() {
            if self.feed_char(c)? {
                return Ok(true);
            }
        }
        Ok(self.finished)
    }

    /// Consume fragments until the closing brace or the end of input
    pub fn parse<I>(&mut self, fragments: I) -> Result<bool>
    where
        I: IntoIterator,
        I::Item: Fragment,
    {
        for fragment in fragments {
            let Some(text) = fragment.text() else {
                continue;
            };
            if !text.is_empty() && self.feed(text)? {
                return Ok(true);
            }
        }
        Ok(self.finished)
    }

    /// Streaming version of [`Program::parse`]
    pub async fn parse_stream<S>(&mut self, stream: S) -> Result<bool>
    where
        S: Stream,
        S::Item: Fragment,
    {
        tokio::pin!(stream);
        while let Some(fragment) = stream.next().await {
            let Some(text) = fragment.text() else {
                continue;
            };
            if !text.is_empty() && self.feed(text)? {
                return Ok(true);
            }
        }
        Ok(self.finished)
    }

    fn publish(&mut self, node: Arc<StatementNode>) {
        debug!(statement = %node, "statement executable");
        if let Some(submitter) = &self.submitter {
            submitter.submit(Arc::clone(&node));
        }
        self.tx.send_modify(|p| p.statements.push(node));
    }

    fn finish(&mut self) {
        self.finished = true;
        self.tx.send_modify(|p| p.finished = true);
    }
}

impl Default for Program {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse a complete source text
///
/// The parse side is dropped before returning, so the view is final even
/// when the text has no closing brace.
pub fn parse_program(source: &str) -> Result<ProgramView> {
    let mut program = Program::new();
    program.feed(source)?;
    Ok(program.view())
}
