pub mod cli;
pub mod config;
pub mod interpreter;
pub mod skills;
pub mod worker;

// Re-export main types
pub use config::Config;
pub use interpreter::{
    parse_program, Environment, Interpreter, InterpreterError, InterpreterOptions, ReturnValue,
    Value,
};
pub use skills::{HighLevelSkill, LowLevelSkill, Skills};
pub use worker::ExecutionOutcome;
