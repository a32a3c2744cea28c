//! Program evaluation loop
//!
//! Walks a [`ProgramView`] by index, waiting for statements that have not
//! streamed in yet, until the program is finished or a statement stops it.

use std::future::Future;
use std::pin::Pin;
use tracing::debug;

use super::context::EvalContext;
use super::statements::eval_statement;
use crate::interpreter::errors::{InterpreterError, Result};
use crate::interpreter::types::{Control, ProgramView};

/// Boxed evaluation future, so programs can nest inside statements
pub type EvalFuture<'a> = Pin<Box<dyn Future<Output = Result<Control>> + Send + 'a>>;

/* ===================== Public API ===================== */

/// Evaluate a program to completion
///
/// Returns the control value of the last statement evaluated, or of the
/// first one that stops the walk (replan or `->` return). An empty program
/// yields the default `Next`.
pub fn eval_program<'a>(view: &'a ProgramView, ctx: &'a mut EvalContext) -> EvalFuture<'a> {
    Box::pin(async move {
        let mut view = view.clone();
        let mut last = Control::default();
        let mut idx = 0;

        loop {
            let cancel = ctx.cancel_token().clone();
            let next = tokio::select! {
                _ = cancel.cancelled() => return Err(InterpreterError::Cancelled),
                node = view.statement(idx) => node,
            };
            let Some(node) = next else {
                break;
            };

            last = eval_statement(&node, ctx).await?;
            if last.stops() {
                debug!(statement = %node, result = %last.return_value(), "program stopped");
                break;
            }
            idx += 1;
        }

        Ok(last)
    })
}
