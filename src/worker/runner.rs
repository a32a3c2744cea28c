//! Execution worker
//!
//! Owns the receiving end of the queue and the state of every open run.
//! Statements are evaluated one at a time. A run that hits a replan, a `->`
//! return or a fatal error is answered at once; its remaining statements are
//! skipped until its `End` job arrives.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

use super::{ExecutionOutcome, Job, JobReceiver, RunId};
use crate::interpreter::errors::{InterpreterError, Result};
use crate::interpreter::executor::{eval_statement, EvalContext};
use crate::interpreter::types::{ReturnValue, StatementNode};
use crate::interpreter::InterpreterOptions;
use crate::skills::Skills;

/// State of one open run
struct Run {
    id: RunId,
    ctx: EvalContext,
    last: ReturnValue,
    halted: bool,
    /// Taken once the outcome is sent
    reply: Option<oneshot::Sender<Result<ExecutionOutcome>>>,
}

impl Run {
    async fn execute(&mut self, node: &StatementNode) {
        if self.halted {
            debug!(run = %self.id, statement = %node, "run halted, statement skipped");
            return;
        }

        debug!(run = %self.id, statement = %node, "statement dequeued");
        match eval_statement(node, &mut self.ctx).await {
            Ok(control) if control.stops() => {
                let rv = control.into_return_value();
                debug!(run = %self.id, result = %rv, "run halted");
                self.halt(Ok(rv));
            }
            Ok(control) => self.last = control.into_return_value(),
            Err(e) => {
                error!(run = %self.id, error = %e, "run halted on error");
                self.halt(Err(e));
            }
        }
    }

    /// Answer the caller now; later statements of the run are skipped
    fn halt(&mut self, result: Result<ReturnValue>) {
        self.halted = true;
        let env = self.ctx.env().clone();
        self.reply(result.map(|result| ExecutionOutcome { result, env }));
    }

    fn finish(mut self, parse_error: Option<InterpreterError>) {
        if self.halted {
            return;
        }
        let result = match parse_error {
            Some(e) => Err(e),
            None => Ok(std::mem::take(&mut self.last)),
        };
        let env = std::mem::take(self.ctx.env_mut());
        self.reply(result.map(|result| ExecutionOutcome { result, env }));
    }

    fn reply(&mut self, outcome: Result<ExecutionOutcome>) {
        if let Some(reply) = self.reply.take() {
            if reply.send(outcome).is_err() {
                debug!(run = %self.id, "caller gone before run finished");
            }
        }
    }
}

/// Per-run state owned by the worker task
struct Worker {
    runs: HashMap<RunId, Run>,
    skills: Skills,
    options: Arc<InterpreterOptions>,
    cancel: CancellationToken,
}

impl Worker {
    fn new(skills: Skills, options: Arc<InterpreterOptions>, cancel: CancellationToken) -> Self {
        Self {
            runs: HashMap::new(),
            skills,
            options,
            cancel,
        }
    }

    async fn handle(&mut self, job: Job) {
        match job {
            Job::Begin { run, env, reply } => {
                debug!(%run, "run started");
                let ctx = EvalContext::new(
                    env,
                    self.skills.clone(),
                    Arc::clone(&self.options),
                    self.cancel.clone(),
                );
                self.runs.insert(
                    run,
                    Run {
                        id: run,
                        ctx,
                        last: ReturnValue::default(),
                        halted: false,
                        reply: Some(reply),
                    },
                );
            }
            Job::Statement { run, node } => match self.runs.get_mut(&run) {
                Some(state) => state.execute(&node).await,
                None => warn!(%run, statement = %node, "statement for unknown run"),
            },
            Job::End { run, error } => match self.runs.remove(&run) {
                Some(state) => {
                    debug!(%run, "run finished");
                    state.finish(error);
                }
                None => warn!(%run, "end of unknown run"),
            },
        }
    }

    #[cfg(test)]
    fn open_runs(&self) -> usize {
        self.runs.len()
    }

    /// Answer every open run with `Cancelled`
    fn stop(mut self) {
        for (_, mut run) in self.runs.drain() {
            run.reply(Err(InterpreterError::Cancelled));
        }
        debug!("worker stopped");
    }
}

/// Worker loop
///
/// Runs until the token is cancelled or every queue sender is gone. Runs
/// still open at that point are answered with `Cancelled`.
pub(crate) async fn run_worker(
    mut rx: JobReceiver,
    skills: Skills,
    options: Arc<InterpreterOptions>,
    cancel: CancellationToken,
) {
    let mut worker = Worker::new(skills, options, cancel.clone());

    loop {
        let job = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            job = rx.recv() => match job {
                Some(job) => job,
                None => break,
            },
        };
        worker.handle(job).await;
    }

    worker.stop();
}

#[cfg(test)]
#[path = "tests/runner_tests.rs"]
mod tests;
