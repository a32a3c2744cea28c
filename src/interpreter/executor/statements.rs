//! Statement evaluation
//!
//! One function per statement kind. `if` has no else branch; `loop` runs its
//! body a fixed number of times.

use tracing::debug;

use super::context::EvalContext;
use super::exec_loop::eval_program;
use super::expressions::{eval_action, eval_condition};
use crate::interpreter::errors::Result;
use crate::interpreter::types::{Control, ProgramView, StatementNode};

/// Evaluate one published statement
pub async fn eval_statement(node: &StatementNode, ctx: &mut EvalContext) -> Result<Control> {
    match node {
        StatementNode::Action { text } => eval_action(text, ctx, text).await,
        StatementNode::If { condition, body } => {
            execute_if(condition, body, ctx, &node.source()).await
        }
        StatementNode::Loop { count, body } => execute_loop(*count, body, ctx).await,
    }
}

async fn execute_if(
    condition: &str,
    body: &ProgramView,
    ctx: &mut EvalContext,
    statement: &str,
) -> Result<Control> {
    let rv = eval_condition(condition, ctx, statement).await?;
    if rv.replan {
        return Ok(Control::Next(rv));
    }

    if rv.value.is_true() {
        eval_program(body, ctx).await
    } else {
        debug!(condition, "condition false, body skipped");
        Ok(Control::default())
    }
}

async fn execute_loop(count: u64, body: &ProgramView, ctx: &mut EvalContext) -> Result<Control> {
    let mut last = Control::default();
    for iteration in 0..count {
        last = eval_program(body, ctx).await?;
        if last.stops() {
            debug!(iteration, count, "loop stopped early");
            break;
        }
    }
    Ok(last)
}
