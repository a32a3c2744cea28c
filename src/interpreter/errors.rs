//! Interpreter errors
//!
//! Fatal conditions only. A replan is never an error; it travels as
//! [`ReturnValue::replan`](super::types::ReturnValue).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum InterpreterError {
    #[error("variable `{name}` is not defined (in `{statement}`)")]
    UndefinedVariable { name: String, statement: String },

    #[error("skill `{name}` is not defined (in `{statement}`)")]
    UndefinedSkill { name: String, statement: String },

    #[error("malformed statement `{statement}`: {message}")]
    MalformedStatement { message: String, statement: String },

    #[error("cannot compare {left} with {right} using `{op}` (in `{statement}`)")]
    TypeMismatch {
        left: String,
        right: String,
        op: String,
        statement: String,
    },

    #[error("skill `{name}` panicked while executing")]
    SkillPanicked { name: String },

    #[error("execution was cancelled")]
    Cancelled,

    #[error("interpreter worker has stopped")]
    WorkerStopped,
}

pub type Result<T> = std::result::Result<T, InterpreterError>;

impl InterpreterError {
    pub(crate) fn malformed(message: impl Into<String>, statement: impl Into<String>) -> Self {
        InterpreterError::MalformedStatement {
            message: message.into(),
            statement: statement.into(),
        }
    }

    pub(crate) fn undefined_variable(name: impl Into<String>, statement: impl Into<String>) -> Self {
        InterpreterError::UndefinedVariable {
            name: name.into(),
            statement: statement.into(),
        }
    }

    /// Statement text the error was raised in, if it carries one
    pub fn statement(&self) -> Option<&str> {
        match self {
            InterpreterError::UndefinedVariable { statement, .. }
            | InterpreterError::UndefinedSkill { statement, .. }
            | InterpreterError::MalformedStatement { statement, .. }
            | InterpreterError::TypeMismatch { statement, .. } => Some(statement),
            _ => None,
        }
    }
}
