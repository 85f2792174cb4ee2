use rlox::interpreter::Interpreter;
use rlox::parser::Parser;
use rlox::reporter::Reporter;
use rlox::resolver::Resolver;

/// Parse (which must succeed) and resolve, returning the reporter so tests
/// can inspect the static diagnostics.
fn resolve(source: &str) -> Reporter {
    let mut reporter = Reporter::new();

    let tokens = rlox::scan(source, &mut reporter);
    let statements = Parser::new(tokens).parse(&mut reporter);
    assert!(
        !reporter.had_error(),
        "parse failed: {:?}",
        reporter.diagnostics()
    );

    let mut sink = Vec::new();
    let mut interpreter = Interpreter::new(&mut sink);

    let mut resolver = Resolver::new(&mut interpreter, &mut reporter);
    resolver.resolve(&statements);

    reporter
}

fn assert_static_error(source: &str, message: &str) {
    let reporter = resolve(source);

    assert!(reporter.had_error(), "expected an error for {:?}", source);
    assert!(
        reporter.diagnostics().iter().any(|d| d.contains(message)),
        "no diagnostic containing {:?} in {:?}",
        message,
        reporter.diagnostics()
    );
}

fn assert_clean(source: &str) {
    let reporter = resolve(source);

    assert!(
        !reporter.had_error(),
        "unexpected diagnostics: {:?}",
        reporter.diagnostics()
    );
}

#[test]
fn return_outside_function() {
    assert_static_error("return 1;", "Can't return from top-level code.");
}

#[test]
fn return_inside_function_ok() {
    assert_clean("fun f() { return 1; }");
}

#[test]
fn this_outside_class() {
    assert_static_error("print this;", "Can't use 'this' outside of a class.");
    assert_static_error(
        "fun f() { return this; }",
        "Can't use 'this' outside of a class.",
    );
}

#[test]
fn this_inside_method_ok() {
    assert_clean("class A { m() { return this; } }");
}

#[test]
fn duplicate_local_declaration() {
    assert_static_error(
        "{ var a = 1; var a = 2; }",
        "Already a variable with this name in this scope.",
    );
    assert_static_error(
        "fun f(a) { var a = 1; }",
        "Already a variable with this name in this scope.",
    );
}

#[test]
fn global_redeclaration_allowed() {
    assert_clean("var a = 1; var a = 2;");
}

#[test]
fn shadowing_in_nested_scope_allowed() {
    assert_clean("{ var a = 1; { var a = 2; } }");
}

#[test]
fn self_reference_in_initializer() {
    assert_static_error(
        "{ var a = a; }",
        "Can't read local variable in its own initializer.",
    );
}

#[test]
fn global_self_reference_is_not_static_error() {
    // at global scope this is a runtime concern, not a resolution error
    assert_clean("var a = a;");
}

#[test]
fn return_value_from_initializer() {
    assert_static_error(
        "class A { init() { return 1; } }",
        "Can't return a value from an initializer.",
    );
}

#[test]
fn bare_return_from_initializer_ok() {
    assert_clean("class A { init() { return; } }");
}

#[test]
fn resolution_continues_past_errors() {
    // both problems in one program are reported
    let reporter = resolve("return 1;\nprint this;");

    assert_eq!(reporter.diagnostics().len(), 2);
}

#[test]
fn functions_may_recurse() {
    assert_clean("fun f(n) { if (n > 0) f(n - 1); }");
}

#[test]
fn class_name_visible_inside_methods() {
    assert_clean("class A { clone() { return A(); } }");
}
