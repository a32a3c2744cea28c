//! Type definitions for the interpreter
//!
//! - Runtime values (Value, ReturnValue)
//! - Control flow (Control)
//! - The published statement tree (StatementNode, ProgramView)

pub mod control;
pub mod tree;
pub mod values;

pub use control::Control;
pub use tree::{ProgramView, StatementNode};
pub use values::{ReturnValue, Value};
