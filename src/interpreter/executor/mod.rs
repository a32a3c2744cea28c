//! # Executor
//!
//! Evaluates published MiniSpec programs.
//!
//! ## Core Principles
//!
//! 1. **Streaming-aware**: a program is walked by index and evaluation waits
//!    for statements the parser has not published yet
//! 2. **Replan is data**: every level checks `ReturnValue::replan` and stops;
//!    `Control::Return` unwinds the same way for `->` statements
//! 3. **Exclusive Environment**: the [`EvalContext`] owning the Environment is
//!    passed by `&mut`; only one evaluation touches it at a time
//! 4. **Injected skills**: skills come from the context, never from globals

pub mod context;
pub mod exec_loop;
pub mod expressions;
pub mod statements;

#[cfg(test)]
mod tests;

pub use context::EvalContext;
pub use exec_loop::{eval_program, EvalFuture};
pub use expressions::{eval_action, eval_condition, eval_function, eval_operand, split_args};
pub use statements::eval_statement;
