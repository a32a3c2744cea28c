//! Console skills
//!
//! Low-level skills with no hardware behind them, for running programs from
//! the command line and for demos.

use std::time::Duration;
use tracing::info;

use super::{FnSkill, LowLevelSkills};
use crate::interpreter::types::Value;

/// `log`, `delay`, `echo` and `replan`
pub fn console_skills() -> LowLevelSkills {
    LowLevelSkills::new()
        .with(FnSkill::new("log", log).describe("log(args...): print the arguments"))
        .with(FnSkill::new("delay", delay).describe("delay(seconds): sleep"))
        .with(FnSkill::new("echo", echo).describe("echo(x): return x as a literal"))
        .with(FnSkill::new("replan", replan).describe("replan(message): request a new plan"))
}

fn log(args: &[String]) -> (Value, bool) {
    info!(target: "minispec::console", "{}", args.join(" "));
    (Value::Absent, false)
}

fn delay(args: &[String]) -> (Value, bool) {
    let raw = args.first().map(String::as_str).unwrap_or("0");
    match raw.trim().parse::<f64>() {
        Ok(secs) if secs.is_finite() && secs >= 0.0 => {
            std::thread::sleep(Duration::from_secs_f64(secs));
            (Value::Absent, false)
        }
        _ => (Value::Str(format!("delay: invalid duration `{}`", raw)), true),
    }
}

fn echo(args: &[String]) -> (Value, bool) {
    let raw = args.first().map(String::as_str).unwrap_or("");
    (Value::parse_literal(raw), false)
}

fn replan(args: &[String]) -> (Value, bool) {
    let message = if args.is_empty() {
        "replan requested".to_string()
    } else {
        args.join(" ")
    };
    (Value::Str(message), true)
}
