//! Control flow between nested evaluations

use super::values::ReturnValue;

/// How evaluation continues after a statement or program
///
/// A replan travels inside [`ReturnValue`] as `Next` with `replan == true`;
/// every level checks it and stops. `Return` comes from a `->` statement and
/// unwinds to the top of the current invocation without being a failure.
#[derive(Debug, Clone, PartialEq)]
pub enum Control {
    Next(ReturnValue),
    Return(ReturnValue),
}

impl Control {
    /// Whether the enclosing program must stop walking its statements
    pub fn stops(&self) -> bool {
        match self {
            Control::Next(rv) => rv.replan,
            Control::Return(_) => true,
        }
    }

    pub fn into_return_value(self) -> ReturnValue {
        match self {
            Control::Next(rv) | Control::Return(rv) => rv,
        }
    }

    pub fn return_value(&self) -> &ReturnValue {
        match self {
            Control::Next(rv) | Control::Return(rv) => rv,
        }
    }
}

impl Default for Control {
    fn default() -> Self {
        Control::Next(ReturnValue::default())
    }
}
