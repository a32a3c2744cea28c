//! Execution queue
//!
//! The parser produces statements, a single worker task consumes them. Jobs
//! are tagged with a run id so several live executions can share one
//! interpreter; the worker keeps one Environment per run and evaluates every
//! job strictly in arrival order.

pub mod runner;

use serde::Serialize;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::interpreter::environment::Environment;
use crate::interpreter::errors::{InterpreterError, Result};
use crate::interpreter::types::{ReturnValue, StatementNode};

pub(crate) use runner::run_worker;

/// Identifies one live execution
pub type RunId = Uuid;

/// Final state of an execution
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExecutionOutcome {
    /// Result of the last statement, or of the one that halted the run
    pub result: ReturnValue,
    /// Environment after the run
    pub env: Environment,
}

/// Work item on the execution queue
#[derive(Debug)]
pub(crate) enum Job {
    /// A new run starts with this Environment
    Begin {
        run: RunId,
        env: Environment,
        reply: oneshot::Sender<Result<ExecutionOutcome>>,
    },
    /// A top-level statement of a run became executable
    Statement {
        run: RunId,
        node: Arc<StatementNode>,
    },
    /// Parsing of a run is over; `error` is set when it failed
    End {
        run: RunId,
        error: Option<InterpreterError>,
    },
}

pub(crate) type JobSender = mpsc::UnboundedSender<Job>;
pub(crate) type JobReceiver = mpsc::UnboundedReceiver<Job>;

pub(crate) fn queue() -> (JobSender, JobReceiver) {
    mpsc::unbounded_channel()
}

/// Producer handle given to a live top-level program
#[derive(Debug, Clone)]
pub struct Submitter {
    run: RunId,
    tx: JobSender,
}

impl Submitter {
    /// Push an executable statement; never blocks
    pub(crate) fn submit(&self, node: Arc<StatementNode>) {
        let job = Job::Statement {
            run: self.run,
            node,
        };
        if self.tx.send(job).is_err() {
            warn!(run = %self.run, "execution queue closed, statement dropped");
        }
    }
}

/// Caller side of one open run
///
/// Dropping the guard without [`RunGuard::end`] still closes the run, so an
/// abandoned execution never stays in the worker.
#[derive(Debug)]
pub(crate) struct RunGuard {
    run: RunId,
    tx: JobSender,
    ended: bool,
}

impl RunGuard {
    /// Open a run on the worker; the receiver gets the run's outcome
    pub(crate) fn begin(
        tx: &JobSender,
        env: Environment,
    ) -> Result<(Self, oneshot::Receiver<Result<ExecutionOutcome>>)> {
        let run = Uuid::new_v4();
        let (reply, outcome) = oneshot::channel();
        tx.send(Job::Begin { run, env, reply })
            .map_err(|_| InterpreterError::WorkerStopped)?;

        let guard = Self {
            run,
            tx: tx.clone(),
            ended: false,
        };
        Ok((guard, outcome))
    }

    pub(crate) fn run(&self) -> RunId {
        self.run
    }

    pub(crate) fn submitter(&self) -> Submitter {
        Submitter {
            run: self.run,
            tx: self.tx.clone(),
        }
    }

    /// Parsing is over; `error` is set when it failed
    pub(crate) fn end(mut self, error: Option<InterpreterError>) -> Result<()> {
        self.ended = true;
        self.tx
            .send(Job::End {
                run: self.run,
                error,
            })
            .map_err(|_| InterpreterError::WorkerStopped)
    }
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        if self.ended {
            return;
        }
        debug!(run = %self.run, "execution abandoned, closing run");
        let _ = self.tx.send(Job::End {
            run: self.run,
            error: None,
        });
    }
}
