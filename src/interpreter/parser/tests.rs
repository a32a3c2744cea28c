//! Tests for the streaming parser

use super::*;

fn actions(view: &ProgramView) -> Vec<String> {
    view.statements().iter().map(|s| s.to_string()).collect()
}

/// Feed `source` in chunks of `size` characters
fn parse_chunked(source: &str, size: usize) -> ProgramView {
    let chars: Vec<char> = source.chars().collect();
    let chunks: Vec<String> = chars.chunks(size).map(|c| c.iter().collect()).collect();

    let mut program = Program::new();
    program.parse(&chunks).unwrap();
    program.view()
}

#[test]
fn test_actions_split_on_terminators() {
    let view = parse_program("move(10); turn(90);log('x')}").unwrap();

    assert_eq!(actions(&view), vec!["move(10)", "turn(90)", "log('x')"]);
    assert!(view.is_finished());
}

#[test]
fn test_closing_paren_terminates_and_keeps_paren() {
    let view = parse_program("move(10)turn(90)").unwrap();
    assert_eq!(actions(&view), vec!["move(10)", "turn(90)"]);
}

#[test]
fn test_nested_call_is_one_statement() {
    let view = parse_program("move(int(_x));").unwrap();
    assert_eq!(actions(&view), vec!["move(int(_x))"]);
}

#[test]
fn test_quoted_terminators_are_text() {
    let view = parse_program("log(':)');move(1);log(\"a;b\")").unwrap();
    assert_eq!(actions(&view), vec!["log(':)')", "move(1)", "log(\"a;b\")"]);
}

#[test]
fn test_quoted_braces_do_not_change_depth() {
    let view = parse_program("?_s=='}'{log('{;}');}log(b);").unwrap();
    let statements = view.statements();
    assert_eq!(statements.len(), 2);

    let StatementNode::If { condition, body } = statements[0].as_ref() else {
        panic!("expected if, got {}", statements[0]);
    };
    assert_eq!(condition, "_s=='}'");
    assert_eq!(actions(body), vec!["log('{;}')"]);
    assert_eq!(statements[1].to_string(), "log(b)");
    assert!(!view.is_finished());
}

#[test]
fn test_empty_statements_are_dropped() {
    let view = parse_program(";;  ;move(1);;").unwrap();
    assert_eq!(view.len(), 1);
}

#[test]
fn test_if_statement() {
    let view = parse_program("?_x>5{move(10);}").unwrap();
    let statements = view.statements();
    assert_eq!(statements.len(), 1);

    let StatementNode::If { condition, body } = statements[0].as_ref() else {
        panic!("expected if, got {}", statements[0]);
    };
    assert_eq!(condition, "_x>5");
    assert_eq!(actions(body), vec!["move(10)"]);
    assert!(body.is_finished());
}

#[test]
fn test_loop_statement() {
    let view = parse_program("3{turn(90);}").unwrap();
    let statements = view.statements();
    assert_eq!(statements.len(), 1);

    let StatementNode::Loop { count, body } = statements[0].as_ref() else {
        panic!("expected loop, got {}", statements[0]);
    };
    assert_eq!(*count, 3);
    assert_eq!(actions(body), vec!["turn(90)"]);
}

#[test]
fn test_closing_brace_terminates_pending_action() {
    let view = parse_program("?_a>1{->'rp'}log(1);").unwrap();
    let body = view.statements()[0].body().cloned().unwrap();

    assert_eq!(actions(&body), vec!["->'rp'"]);
    assert_eq!(view.len(), 2);
}

#[test]
fn test_leading_letter_disables_loop() {
    let view = parse_program("a1 = echo(2);").unwrap();
    assert_eq!(actions(&view), vec!["a1 = echo(2)"]);

    let view = parse_program("->5;").unwrap();
    assert_eq!(actions(&view), vec!["->5"]);
}

#[test]
fn test_nested_blocks() {
    let source = "2{?_a==1{log(a);3{log(b);}}log(c);}log(d);";
    let view = parse_program(source).unwrap();

    assert_eq!(
        actions(&view),
        vec!["[2] {if _a==1 {log(a); [3] {log(b); }; }; log(c); }", "log(d)"]
    );
}

#[test]
fn test_chunking_invariance() {
    let source = "_x = echo(7); ?_x>5&_x<10{move(10);2{turn(90);}} log('done');}";
    let whole = actions(&parse_program(source).unwrap());
    assert_eq!(whole.len(), 3);

    for size in 1..=7 {
        assert_eq!(actions(&parse_chunked(source, size)), whole, "chunk size {}", size);
    }
}

#[test]
fn test_absent_and_empty_fragments_skipped() {
    let mut program = Program::new();
    let fragments = vec![Some("mo"), None, Some(""), Some("ve(1);"), None, Some("}")];

    assert!(program.parse(fragments).unwrap());
    assert_eq!(actions(&program.view()), vec!["move(1)"]);
}

#[test]
fn test_input_after_finish_is_ignored() {
    let mut program = Program::new();
    assert!(program.feed("log(1);}log(2);").unwrap());
    assert!(program.is_finished());
    assert_eq!(program.statement_count(), 1);
}

#[test]
fn test_if_published_before_body_complete() {
    let mut program = Program::new();
    program.feed("?_x>1{move(1);").unwrap();

    let view = program.view();
    assert_eq!(view.len(), 1);
    let body = view.statements()[0].body().cloned().unwrap();
    assert_eq!(body.len(), 1);
    assert!(!body.is_finished());

    program.feed("move(2);}").unwrap();
    assert_eq!(body.len(), 2);
    assert!(body.is_finished());
    assert!(!view.is_finished());
}

#[test]
fn test_parsing_state_tracks_input() {
    let mut program = Program::new();

    program.feed("?_x").unwrap();
    assert!(matches!(program.current().parsing_state(), ParsingState::Condition));
    assert_eq!(program.current().buffer(), "_x");

    program.feed(">1{").unwrap();
    assert!(matches!(
        program.current().parsing_state(),
        ParsingState::SubStatements(_)
    ));
    assert_eq!(program.depth(), 1);

    program.feed("}").unwrap();
    assert!(matches!(program.current().parsing_state(), ParsingState::Code));
    assert_eq!(program.depth(), 0);
}

#[test]
fn test_bad_loop_count_is_malformed() {
    let err = parse_program("3x{log(1);}").unwrap_err();
    assert!(matches!(err, InterpreterError::MalformedStatement { .. }));
}

#[test]
fn test_missing_closing_brace_still_final() {
    let view = parse_program("2{log(1);").unwrap();
    let body = view.statements()[0].body().cloned().unwrap();

    assert!(!view.is_finished());
    assert_eq!(body.len(), 1);
}

#[tokio::test]
async fn test_parse_stream() {
    let fragments = tokio_stream::iter(vec!["?_a", ">1{lo", "g(1);}", "log(2);", "}"]);

    let mut program = Program::new();
    assert!(program.parse_stream(fragments).await.unwrap());
    assert_eq!(actions(&program.view()), vec!["if _a>1 {log(1); }", "log(2)"]);
}

#[tokio::test]
async fn test_view_waits_for_statements() {
    let mut program = Program::new();
    let mut view = program.view();

    let waiter = tokio::spawn(async move { view.statement(0).await.map(|s| s.to_string()) });
    tokio::task::yield_now().await;

    program.feed("move(5);").unwrap();
    assert_eq!(waiter.await.unwrap().as_deref(), Some("move(5)"));
}

#[tokio::test]
async fn test_view_ends_when_parser_dropped() {
    let program = Program::new();
    let mut view = program.view();
    drop(program);

    assert!(view.statement(0).await.is_none());
}
