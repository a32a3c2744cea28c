//! Tests for actions: calls, assignments, builtins and returns

use maplit::hashmap;
use tokio_test::{assert_err, assert_ok};

use super::helpers::*;
use crate::interpreter::executor::split_args;
use crate::interpreter::{Control, InterpreterError, ReturnValue, Value};
use crate::skills::{FnSkill, LowLevelSkills};

#[tokio::test]
async fn test_assignment_binds_result() {
    let low = LowLevelSkills::new().with(FnSkill::new("scan", |_: &[String]| (Value::Int(3), false)));
    let mut ctx = context(low_level_only(low), hashmap! {});

    assert_ok!(run("_n = scan();", &mut ctx).await);
    assert_eq!(ctx.env().get("_n"), Some(&Value::Int(3)));
}

#[tokio::test]
async fn test_replan_result_is_not_bound() {
    let low = LowLevelSkills::new()
        .with(FnSkill::new("scan", |_: &[String]| (Value::Str("lost".into()), true)));
    let mut ctx = context(low_level_only(low), hashmap! { "_n".to_string() => Value::Int(1) });

    let result = assert_ok!(run("_n = scan();", &mut ctx).await);

    assert_eq!(result, Control::Next(ReturnValue::replan("lost")));
    assert_eq!(ctx.env().get("_n"), Some(&Value::Int(1)));
}

#[tokio::test]
async fn test_builtin_conversions() {
    let (low, _) = recording_skills(&[]);
    let mut ctx = context(low_level_only(low), hashmap! { "_f".to_string() => Value::Float(7.9) });

    assert_ok!(run("_a = int(_f); _b = float('2'); _c = str(12); _d = int(-3);", &mut ctx).await);

    let env = ctx.env();
    assert_eq!(env.get("_a"), Some(&Value::Int(7)));
    assert_eq!(env.get("_b"), Some(&Value::Float(2.0)));
    assert_eq!(env.get("_c"), Some(&Value::Str("12".into())));
    assert_eq!(env.get("_d"), Some(&Value::Int(-3)));
}

#[tokio::test]
async fn test_bad_conversion_is_malformed() {
    let (low, _) = recording_skills(&[]);
    let mut ctx = context(low_level_only(low), hashmap! {});

    let err = assert_err!(run("_a = int(abc);", &mut ctx).await);
    assert!(matches!(err, InterpreterError::MalformedStatement { .. }));

    let err = assert_err!(run("_a = float();", &mut ctx).await);
    assert!(matches!(err, InterpreterError::MalformedStatement { .. }));
}

#[tokio::test]
async fn test_variables_resolve_in_arguments() {
    let (low, calls) = recording_skills(&["move"]);
    let env = hashmap! {
        "_d".to_string() => Value::Float(1.5),
        "_ok".to_string() => Value::Bool(true),
    };
    let mut ctx = context(low_level_only(low), env);

    assert_ok!(run("move(_d, '_ok', \"text\");", &mut ctx).await);
    assert_eq!(recorded(&calls), vec!["move(1.5,True,text)"]);
}

#[tokio::test]
async fn test_undefined_variable_names_variable_and_statement() {
    let (low, calls) = recording_skills(&["move"]);
    let mut ctx = context(low_level_only(low), hashmap! {});

    let err = assert_err!(run("move(_nowhere);", &mut ctx).await);

    assert!(recorded(&calls).is_empty());
    assert_eq!(err.statement(), Some("move(_nowhere)"));
    let message = err.to_string();
    assert!(message.contains("_nowhere"), "{}", message);
}

#[tokio::test]
async fn test_several_assignments_are_malformed() {
    let (low, _) = recording_skills(&["scan"]);
    let mut ctx = context(low_level_only(low), hashmap! {});

    let err = assert_err!(run("_a = _b = scan();", &mut ctx).await);
    assert!(matches!(err, InterpreterError::MalformedStatement { .. }));

    let err = assert_err!(run(" = scan();", &mut ctx).await);
    assert!(matches!(err, InterpreterError::MalformedStatement { .. }));
}

#[tokio::test]
async fn test_equals_inside_arguments_is_not_assignment() {
    let (low, calls) = recording_skills(&["log"]);
    let mut ctx = context(low_level_only(low), hashmap! {});

    assert_ok!(run("log('a=b');", &mut ctx).await);
    assert_eq!(recorded(&calls), vec!["log(a=b)"]);
}

#[tokio::test]
async fn test_return_ends_program() {
    let (low, calls) = recording_skills(&["log"]);
    let mut ctx = context(low_level_only(low), hashmap! { "_x".to_string() => Value::Int(5) });

    let result = assert_ok!(run("log(1);->_x;log(2);", &mut ctx).await);

    assert_eq!(result, Control::Return(ReturnValue::value(Value::Int(5))));
    assert_eq!(recorded(&calls), vec!["log(1)"]);
}

#[tokio::test]
async fn test_program_result_is_last_statement() {
    let low = LowLevelSkills::new()
        .with(FnSkill::new("one", |_: &[String]| (Value::Int(1), false)))
        .with(FnSkill::new("two", |_: &[String]| (Value::Int(2), false)));
    let mut ctx = context(low_level_only(low), hashmap! {});

    let result = assert_ok!(run("one();two();", &mut ctx).await);
    assert_eq!(result, Control::Next(ReturnValue::value(Value::Int(2))));

    let result = assert_ok!(run("", &mut ctx).await);
    assert_eq!(result, Control::default());
}

#[test]
fn test_split_args_top_level_only() {
    assert_eq!(split_args("g(1,2),3"), vec!["g(1,2)", "3"]);
    assert_eq!(split_args("a, (b, c), 'd,e'").len(), 3);
    assert!(split_args("").is_empty());
}
