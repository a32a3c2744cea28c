//! Action, function and condition evaluation
//!
//! MiniSpec expressions are never tokenized ahead of time. Each evaluation
//! scans the statement text directly; separators (`=`, `,`, `&`, `|` and
//! comparators) only count at parenthesis depth 0 and outside quotes.

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::context::EvalContext;
use super::exec_loop::eval_program;
use crate::interpreter::environment::{is_variable, Environment};
use crate::interpreter::errors::{InterpreterError, Result};
use crate::interpreter::parser::parse_program;
use crate::interpreter::types::values::unquote;
use crate::interpreter::types::{Control, ReturnValue, Value};
use crate::skills::{HighLevelSkill, Skill};

/// Prefix that turns an action into a return statement
pub const RETURN_PREFIX: &str = "->";

/* ===================== Actions ===================== */

/// Evaluate an action statement: a call, an assignment, or a `->` return
pub async fn eval_action(text: &str, ctx: &mut EvalContext, statement: &str) -> Result<Control> {
    let text = text.trim();

    if let Some(operand) = text.strip_prefix(RETURN_PREFIX) {
        let rv = eval_operand(operand, ctx, statement).await?;
        return Ok(if rv.replan {
            Control::Next(rv)
        } else {
            Control::Return(rv)
        });
    }

    eval_call(text, ctx, statement).await.map(Control::Next)
}

/// Evaluate `name(args)` or `var = name(args)`
async fn eval_call(text: &str, ctx: &mut EvalContext, statement: &str) -> Result<ReturnValue> {
    let assignments: Vec<usize> = top_level(text)
        .into_iter()
        .filter(|&(_, c)| c == '=')
        .map(|(i, _)| i)
        .collect();

    match assignments.as_slice() {
        [] => eval_function(text, ctx, statement).await,
        [pos] => {
            let var = text[..*pos].trim();
            if var.is_empty() {
                return Err(InterpreterError::malformed(
                    "assignment has no variable name",
                    statement,
                ));
            }

            let rv = eval_function(&text[pos + 1..], ctx, statement).await?;
            if !rv.replan {
                debug!(var, value = %rv.value, "assign");
                ctx.env_mut().set(var, rv.value.clone());
            }
            Ok(rv)
        }
        _ => Err(InterpreterError::malformed(
            "more than one `=` in action",
            statement,
        )),
    }
}

/* ===================== Functions ===================== */

/// Evaluate a function call: a builtin conversion or a skill
pub async fn eval_function(text: &str, ctx: &mut EvalContext, statement: &str) -> Result<ReturnValue> {
    let text = text.trim();

    let (name, raw_args) = match text.split_once('(') {
        Some((name, rest)) => {
            let inner = rest.trim_end().strip_suffix(')').ok_or_else(|| {
                InterpreterError::malformed(format!("call `{}` is missing `)`", text), statement)
            })?;
            (name.trim(), split_args(inner))
        }
        None => (text, Vec::new()),
    };

    if name.is_empty() {
        return Err(InterpreterError::malformed("missing function name", statement));
    }

    let args = resolve_args(&raw_args, ctx.env(), statement)?;

    match name {
        "int" => to_int(first_arg(name, &args, statement)?, statement),
        "float" => to_float(first_arg(name, &args, statement)?, statement),
        "str" => Ok(ReturnValue::value(first_arg(name, &args, statement)?)),
        _ => call_skill(name, args, ctx, statement).await,
    }
}

/// Split call arguments on top-level commas
///
/// `f(g(1,2),3)` has two arguments. Blank argument text has none.
pub fn split_args(args: &str) -> Vec<&str> {
    if args.trim().is_empty() {
        return Vec::new();
    }
    split_top_level(args, ',')
}

/// Trim and unquote each argument, resolving variables to their text
fn resolve_args(raw: &[&str], env: &Environment, statement: &str) -> Result<Vec<String>> {
    raw.iter()
        .map(|arg| {
            let arg = unquote(arg.trim());
            if is_variable(arg) {
                env.get(arg)
                    .map(ToString::to_string)
                    .ok_or_else(|| InterpreterError::undefined_variable(arg, statement))
            } else {
                Ok(arg.to_string())
            }
        })
        .collect()
}

fn first_arg<'a>(name: &str, args: &'a [String], statement: &str) -> Result<&'a str> {
    args.first().map(String::as_str).ok_or_else(|| {
        InterpreterError::malformed(format!("`{}` needs an argument", name), statement)
    })
}

fn to_int(arg: &str, statement: &str) -> Result<ReturnValue> {
    let arg = arg.trim();
    if let Ok(i) = arg.parse::<i64>() {
        return Ok(ReturnValue::value(i));
    }
    match arg.parse::<f64>() {
        Ok(f) if f.is_finite() => Ok(ReturnValue::value(f.trunc() as i64)),
        _ => Err(InterpreterError::malformed(
            format!("cannot convert `{}` to int", arg),
            statement,
        )),
    }
}

fn to_float(arg: &str, statement: &str) -> Result<ReturnValue> {
    let arg = arg.trim();
    arg.parse::<f64>().map(ReturnValue::value).map_err(|_| {
        InterpreterError::malformed(format!("cannot convert `{}` to float", arg), statement)
    })
}

async fn call_skill(
    name: &str,
    args: Vec<String>,
    ctx: &mut EvalContext,
    statement: &str,
) -> Result<ReturnValue> {
    match ctx.skills().resolve(name) {
        Some(Skill::LowLevel(skill)) => {
            info!(skill = name, ?args, "executing low-level skill");
            let (value, replan) = tokio::task::spawn_blocking(move || skill.execute(&args))
                .await
                .map_err(|_| InterpreterError::SkillPanicked {
                    name: name.to_string(),
                })?;
            Ok(ReturnValue { value, replan })
        }
        Some(Skill::HighLevel(skill)) => expand_high_level(skill, &args, ctx).await,
        None => Err(InterpreterError::UndefinedSkill {
            name: name.to_string(),
            statement: statement.to_string(),
        }),
    }
}

/// Parse and evaluate a high-level skill's expansion in a fresh Environment
async fn expand_high_level(
    skill: Arc<dyn HighLevelSkill>,
    args: &[String],
    ctx: &mut EvalContext,
) -> Result<ReturnValue> {
    let source = skill.execute(args);
    info!(skill = skill.name(), ?args, %source, "expanding high-level skill");

    let view = parse_program(&source)?;
    let mut nested = ctx.nested();
    let rv = eval_program(&view, &mut nested).await?.into_return_value();

    if matches!(&rv.value, Value::Str(s) if *s == ctx.options().failure_sentinel) {
        return Ok(ReturnValue::replan(format!(
            "High-level skill {} failed",
            skill.name()
        )));
    }
    if rv.replan || ctx.options().forward_high_level_results {
        return Ok(rv);
    }

    if rv.value != Value::Absent {
        warn!(skill = skill.name(), value = %rv.value, "high-level skill result discarded");
    }
    Ok(ReturnValue::default())
}

/* ===================== Conditions ===================== */

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Comparator {
    Gt,
    Lt,
    Eq,
    Ne,
}

impl Comparator {
    fn symbol(self) -> &'static str {
        match self {
            Comparator::Gt => ">",
            Comparator::Lt => "<",
            Comparator::Eq => "==",
            Comparator::Ne => "!=",
        }
    }
}

impl fmt::Display for Comparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Evaluate condition text to a `Bool` result
///
/// Terms joined by `&` are evaluated left to right and stop at the first
/// false or replan; each term may itself join comparisons with `|`, which
/// stop at the first true or replan.
pub async fn eval_condition(
    condition: &str,
    ctx: &mut EvalContext,
    statement: &str,
) -> Result<ReturnValue> {
    if condition.trim().is_empty() {
        return Err(InterpreterError::malformed("empty condition", statement));
    }

    for term in split_top_level(condition, '&') {
        let rv = eval_disjunction(term, ctx, statement).await?;
        if rv.replan {
            return Ok(rv);
        }
        if !rv.value.is_true() {
            return Ok(ReturnValue::value(false));
        }
    }
    Ok(ReturnValue::value(true))
}

async fn eval_disjunction(term: &str, ctx: &mut EvalContext, statement: &str) -> Result<ReturnValue> {
    for comparison in split_top_level(term, '|') {
        let rv = eval_comparison(comparison, ctx, statement).await?;
        if rv.replan || rv.value.is_true() {
            return Ok(rv);
        }
    }
    Ok(ReturnValue::value(false))
}

async fn eval_comparison(text: &str, ctx: &mut EvalContext, statement: &str) -> Result<ReturnValue> {
    let comparators = find_comparators(text);
    let &[(pos, op)] = comparators.as_slice() else {
        return Err(InterpreterError::malformed(
            format!("`{}` must contain exactly one of >, <, ==, !=", text.trim()),
            statement,
        ));
    };

    let left = eval_operand(&text[..pos], ctx, statement).await?;
    if left.replan {
        return Ok(left);
    }
    let right = eval_operand(&text[pos + op.symbol().len()..], ctx, statement).await?;
    if right.replan {
        return Ok(right);
    }

    compare(&left.value, &right.value, op, statement).map(ReturnValue::value)
}

/// Resolve a condition or return operand
///
/// Variables come from the Environment, `True`/`False`/`None` are literals,
/// a token starting with a letter is a function call, anything else is a
/// numeric or string literal.
pub async fn eval_operand(text: &str, ctx: &mut EvalContext, statement: &str) -> Result<ReturnValue> {
    let token = text.trim();
    if token.is_empty() {
        return Err(InterpreterError::malformed("empty operand", statement));
    }

    if is_variable(token) {
        return ctx
            .env()
            .get(token)
            .cloned()
            .map(ReturnValue::value)
            .ok_or_else(|| InterpreterError::undefined_variable(token, statement));
    }

    match token {
        "True" | "False" | "None" => Ok(ReturnValue::value(Value::parse_literal(token))),
        _ if token.starts_with(|c: char| c.is_alphabetic()) => {
            eval_call(token, ctx, statement).await
        }
        _ => Ok(ReturnValue::value(Value::parse_literal(token))),
    }
}

/// Apply a comparator
///
/// Values of different kinds are unequal and have no order.
fn compare(left: &Value, right: &Value, op: Comparator, statement: &str) -> Result<bool> {
    let mismatch = || InterpreterError::TypeMismatch {
        left: format!("{} `{}`", left.kind(), left),
        right: format!("{} `{}`", right.kind(), right),
        op: op.to_string(),
        statement: statement.to_string(),
    };

    if !left.same_kind(right) {
        return match op {
            Comparator::Eq => Ok(false),
            Comparator::Ne => Ok(true),
            Comparator::Gt | Comparator::Lt => Err(mismatch()),
        };
    }

    match op {
        Comparator::Eq => Ok(left.loose_eq(right)),
        Comparator::Ne => Ok(!left.loose_eq(right)),
        Comparator::Gt => Ok(left.ordering(right).ok_or_else(mismatch)? == Ordering::Greater),
        Comparator::Lt => Ok(left.ordering(right).ok_or_else(mismatch)? == Ordering::Less),
    }
}

/* ===================== Scanning ===================== */

/// Characters at parenthesis depth 0 and outside quotes, with byte offsets
fn top_level(text: &str) -> Vec<(usize, char)> {
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut out = Vec::new();

    for (i, c) in text.char_indices() {
        if let Some(q) = quote {
            if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '\'' | '"' => quote = Some(c),
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            _ if depth == 0 => out.push((i, c)),
            _ => {}
        }
    }
    out
}

fn split_top_level(text: &str, sep: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0;
    for (i, c) in top_level(text) {
        if c == sep {
            parts.push(&text[start..i]);
            start = i + c.len_utf8();
        }
    }
    parts.push(&text[start..]);
    parts
}

fn find_comparators(text: &str) -> Vec<(usize, Comparator)> {
    let chars = top_level(text);
    let mut found = Vec::new();
    let mut iter = chars.iter().peekable();

    while let Some(&(i, c)) = iter.next() {
        let equals_next = matches!(iter.peek(), Some(&&(j, '=')) if j == i + 1);
        match c {
            '>' => found.push((i, Comparator::Gt)),
            '<' => found.push((i, Comparator::Lt)),
            '=' if equals_next => {
                iter.next();
                found.push((i, Comparator::Eq));
            }
            '!' if equals_next => {
                iter.next();
                found.push((i, Comparator::Ne));
            }
            _ => {}
        }
    }
    found
}
