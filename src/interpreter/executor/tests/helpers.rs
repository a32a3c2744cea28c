//! Test helpers for executor tests
//!
//! Recording skills and a one-call way to parse and evaluate a program

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio_util::sync::CancellationToken;

use crate::interpreter::executor::{eval_program, EvalContext};
use crate::interpreter::{parse_program, Control, Environment, InterpreterOptions, Result, Value};
use crate::skills::{FnSkill, HighLevelSkills, LowLevelSkills, Skills};

/// Every recorded call as `(skill, args)`
pub type Calls = Arc<Mutex<Vec<(String, Vec<String>)>>>;

/// Low-level skills that record each call and return `(None, false)`
pub fn recording_skills(names: &[&str]) -> (LowLevelSkills, Calls) {
    let calls: Calls = Arc::default();
    let mut skills = LowLevelSkills::new();

    for name in names {
        let calls = Arc::clone(&calls);
        let owned = name.to_string();
        skills.register(FnSkill::new(*name, move |args: &[String]| {
            calls.lock().unwrap().push((owned.clone(), args.to_vec()));
            (Value::Absent, false)
        }));
    }

    (skills, calls)
}

/// Recorded calls rendered as `name(a,b)`
pub fn recorded(calls: &Calls) -> Vec<String> {
    calls
        .lock()
        .unwrap()
        .iter()
        .map(|(name, args)| format!("{}({})", name, args.join(",")))
        .collect()
}

pub fn low_level_only(skills: LowLevelSkills) -> Skills {
    Skills::new(skills, HighLevelSkills::new())
}

pub fn context(skills: Skills, env: HashMap<String, Value>) -> EvalContext {
    context_with_options(skills, env, InterpreterOptions::default())
}

pub fn context_with_options(
    skills: Skills,
    env: HashMap<String, Value>,
    options: InterpreterOptions,
) -> EvalContext {
    EvalContext::new(
        Environment::from(env),
        skills,
        Arc::new(options),
        CancellationToken::new(),
    )
}

/// Parse a complete source text and evaluate it
pub async fn run(source: &str, ctx: &mut EvalContext) -> Result<Control> {
    let view = parse_program(source)?;
    eval_program(&view, ctx).await
}
