//! Evaluation context
//!
//! Everything one invocation tree needs while it runs: its Environment, the
//! injected skills, interpreter options and the teardown token.

use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::interpreter::environment::Environment;
use crate::interpreter::InterpreterOptions;
use crate::skills::Skills;

pub struct EvalContext {
    env: Environment,
    skills: Skills,
    options: Arc<InterpreterOptions>,
    cancel: CancellationToken,
}

impl EvalContext {
    pub fn new(
        env: Environment,
        skills: Skills,
        options: Arc<InterpreterOptions>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            env,
            skills,
            options,
            cancel,
        }
    }

    pub fn env(&self) -> &Environment {
        &self.env
    }

    pub fn env_mut(&mut self) -> &mut Environment {
        &mut self.env
    }

    pub fn into_env(self) -> Environment {
        self.env
    }

    pub fn skills(&self) -> &Skills {
        &self.skills
    }

    pub fn options(&self) -> &InterpreterOptions {
        &self.options
    }

    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Context for a high-level skill expansion: same skills, empty Environment
    pub fn nested(&self) -> Self {
        Self {
            env: Environment::new(),
            skills: self.skills.clone(),
            options: Arc::clone(&self.options),
            cancel: self.cancel.clone(),
        }
    }
}
