//! MiniSpec interpreter
//!
//! [`Interpreter`] ties the pieces together: the streaming parser runs in the
//! caller's task and pushes statements onto the execution queue, a single
//! background worker evaluates them against the run's Environment.
//!
//! ```no_run
//! # async fn demo() -> minispec::interpreter::errors::Result<()> {
//! use minispec::interpreter::Interpreter;
//! use minispec::skills::{console::console_skills, HighLevelSkills, Skills};
//!
//! let interpreter = Interpreter::new(Skills::new(console_skills(), HighLevelSkills::new()));
//! let outcome = interpreter.execute_str("log('hello');3{log('tick');}").await?;
//! assert!(!outcome.result.replan);
//! # Ok(())
//! # }
//! ```

pub mod environment;
pub mod errors;
pub mod executor;
pub mod parser;
pub mod types;

pub use environment::Environment;
pub use errors::{InterpreterError, Result};
pub use parser::{parse_program, Fragment, Program};
pub use types::{Control, ProgramView, ReturnValue, StatementNode, Value};

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_stream::Stream;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::skills::Skills;
use crate::worker::{self, ExecutionOutcome, JobSender, RunGuard};
use executor::{eval_program, EvalContext};

/* ===================== Options ===================== */

/// Behaviour switches shared by an interpreter and its nested expansions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InterpreterOptions {
    /// Value a high-level skill expansion evaluates to when it failed
    pub failure_sentinel: String,
    /// Return a high-level expansion's result instead of the default value
    pub forward_high_level_results: bool,
}

impl Default for InterpreterOptions {
    fn default() -> Self {
        Self {
            failure_sentinel: "rp".to_string(),
            forward_high_level_results: false,
        }
    }
}

/* ===================== Interpreter ===================== */

/// Live MiniSpec interpreter with one execution worker
///
/// Must be created inside a Tokio runtime. Dropping it cancels the worker
/// and any evaluation waiting on it.
pub struct Interpreter {
    queue: JobSender,
    skills: Skills,
    options: Arc<InterpreterOptions>,
    cancel: CancellationToken,
    worker: Option<JoinHandle<()>>,
}

impl Interpreter {
    pub fn new(skills: Skills) -> Self {
        Self::with_options(skills, InterpreterOptions::default())
    }

    pub fn with_options(skills: Skills, options: InterpreterOptions) -> Self {
        let options = Arc::new(options);
        let cancel = CancellationToken::new();
        let (queue, rx) = worker::queue();

        let worker = tokio::spawn(worker::run_worker(
            rx,
            skills.clone(),
            Arc::clone(&options),
            cancel.clone(),
        ));

        Self {
            queue,
            skills,
            options,
            cancel,
            worker: Some(worker),
        }
    }

    pub fn options(&self) -> &InterpreterOptions {
        &self.options
    }

    /// Execute a streamed program with an empty Environment
    pub async fn execute<S>(&self, stream: S) -> Result<ExecutionOutcome>
    where
        S: Stream,
        S::Item: Fragment,
    {
        self.execute_with_env(stream, Environment::new()).await
    }

    /// Execute a streamed program
    ///
    /// Statements start executing as soon as they are parsed. Returns once
    /// the stream has ended (or the program's closing `}` was read) and every
    /// queued statement has been evaluated. A run that halts on a replan, a
    /// return or an error returns at once without reading the rest of the
    /// stream. Cancelling the interpreter interrupts a stalled stream.
    pub async fn execute_with_env<S>(&self, stream: S, env: Environment) -> Result<ExecutionOutcome>
    where
        S: Stream,
        S::Item: Fragment,
    {
        if self.cancel.is_cancelled() {
            return Err(InterpreterError::WorkerStopped);
        }
        let (guard, mut outcome) = RunGuard::begin(&self.queue, env)?;
        let run = guard.run();
        debug!(%run, "live execution started");

        let mut program = Program::live(guard.submitter());
        let parsed = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => return Err(InterpreterError::Cancelled),
            halted = &mut outcome => {
                debug!(%run, "run halted before the stream ended");
                let _ = guard.end(None);
                return halted.map_err(|_| InterpreterError::WorkerStopped)?;
            }
            parsed = program.parse_stream(stream) => parsed,
        };

        // The program must be gone before waiting, so bodies left open by a
        // truncated stream read as finished
        drop(program);
        guard.end(parsed.err())?;

        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(InterpreterError::Cancelled),
            done = outcome => done.map_err(|_| InterpreterError::WorkerStopped)?,
        }
    }

    /// Execute a complete source text through the live path
    pub async fn execute_str(&self, source: &str) -> Result<ExecutionOutcome> {
        self.execute(tokio_stream::once(source)).await
    }

    /// Parse a complete text and evaluate it inline, bypassing the worker
    pub async fn evaluate(&self, source: &str, env: Environment) -> Result<ExecutionOutcome> {
        let view = parse_program(source)?;
        let mut ctx = EvalContext::new(
            env,
            self.skills.clone(),
            Arc::clone(&self.options),
            self.cancel.clone(),
        );
        let result = eval_program(&view, &mut ctx).await?.into_return_value();
        Ok(ExecutionOutcome {
            result,
            env: ctx.into_env(),
        })
    }

    /// Cancel the worker and every pending wait
    ///
    /// Open runs end with `Cancelled`; later executions fail with
    /// `WorkerStopped`.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Stop the worker and wait for it to exit
    pub async fn shutdown(mut self) {
        self.cancel.cancel();
        if let Some(worker) = self.worker.take() {
            let _ = worker.await;
        }
    }
}

impl Drop for Interpreter {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
