use rlox::interpreter::Interpreter;
use rlox::reporter::Reporter;

/// Run a program with a fresh interpreter and return everything it printed.
/// Compile errors fail the test; a runtime error comes back as `Err` with
/// the rendered diagnostics.
fn run(code: &str) -> Result<String, String> {
    let mut buffer = Vec::new();
    let mut runtime_error = None;

    {
        let mut interpreter = Interpreter::new(&mut buffer);
        let mut reporter = Reporter::new();

        rlox::run(code, &mut interpreter, &mut reporter);

        assert!(
            !reporter.had_error(),
            "compile error: {:?}",
            reporter.diagnostics()
        );

        if reporter.had_runtime_error() {
            runtime_error = Some(reporter.diagnostics().join("\n"));
        }
    }

    match runtime_error {
        Some(err) => Err(err),
        None => Ok(String::from_utf8(buffer).expect("program output is UTF-8")),
    }
}

fn assert_prints(code: &str, expected: &str) {
    assert_eq!(run(code).expect("program should succeed"), expected);
}

fn assert_runtime_error(code: &str, fragment: &str) {
    let err = run(code).expect_err("program should fail at runtime");
    assert!(
        err.contains(fragment),
        "expected {:?} in {:?}",
        fragment,
        err
    );
}

// ─── arithmetic, printing, operators ─────────────────────────────────────

#[test]
fn arithmetic_precedence() {
    assert_prints("print 1 + 2 * 3;", "7\n");
}

#[test]
fn number_formatting() {
    assert_prints("print 3.0; print 3.14; print -0.5; print 10 / 4;", "3\n3.14\n-0.5\n2.5\n");
}

#[test]
fn string_concatenation() {
    assert_prints("print \"foo\" + \"bar\";", "foobar\n");
}

#[test]
fn plus_type_error() {
    assert_runtime_error(
        "print 1 + \"a\";",
        "Operands must be two numbers or two strings.",
    );
}

#[test]
fn comparison_needs_numbers() {
    assert_runtime_error("print \"a\" < \"b\";", "Operands must be numbers.");
}

#[test]
fn negation_needs_a_number() {
    assert_runtime_error("print -\"a\";", "Operand must be a number.");
}

#[test]
fn division_follows_ieee() {
    assert_prints("print 1 / 0;", "inf\n");
}

#[test]
fn equality_laws() {
    assert_prints(
        "print nil == nil; print nil == 0; print (0 / 0) == (0 / 0);",
        "true\nfalse\ntrue\n",
    );
}

#[test]
fn truthiness() {
    assert_prints(
        "print !0; print !\"\"; print !nil; print !false;",
        "false\nfalse\ntrue\ntrue\n",
    );
}

#[test]
fn comma_yields_its_right_operand() {
    assert_prints("var a = (1, 2); print a;", "2\n");
}

#[test]
fn ternary_chains() {
    assert_prints("print true ? \"y\" : false ? \"n\" : \"m\";", "y\n");
    assert_prints("print false ? \"y\" : false ? \"n\" : \"m\";", "m\n");
    assert_prints("print false ? \"y\" : true ? \"n\" : \"m\";", "n\n");
}

#[test]
fn logical_operators_return_operands() {
    assert_prints(
        "print \"hi\" or 2; print nil or \"yes\"; print nil and \"no\";",
        "hi\nyes\nnil\n",
    );
}

#[test]
fn short_circuit_skips_side_effects() {
    assert_prints(
        "var a = 0;\n\
         true or (a = 1);\n\
         print a;\n\
         false and (a = 2);\n\
         print a;\n\
         false or (a = 3);\n\
         print a;",
        "0\n0\n3\n",
    );
}

// ─── variables, scoping, closures ────────────────────────────────────────

#[test]
fn variable_scoping() {
    assert_prints(
        "var a = \"outer\";\n\
         {\n\
             var a = \"inner\";\n\
             print a;\n\
         }\n\
         print a;",
        "inner\nouter\n",
    );
}

#[test]
fn global_redefinition_overwrites() {
    assert_prints("var a = 1; var a = 2; print a;", "2\n");
}

#[test]
fn uninitialized_global_read() {
    assert_runtime_error("var x; print x;", "not initialized");
}

#[test]
fn uninitialized_local_read() {
    assert_runtime_error("{ var x; print x; }", "not initialized");
}

#[test]
fn undefined_variable_read() {
    assert_runtime_error("print q;", "Undefined variable 'q'.");
}

#[test]
fn assignment_to_undefined_global() {
    assert_runtime_error("q = 1;", "Undefined variable 'q'.");
}

#[test]
fn assignment_is_an_expression() {
    assert_prints("var a = 1; print a = 2; print a;", "2\n2\n");
}

#[test]
fn resolver_pins_lookups_to_declaration_order() {
    // the later shadowing `var a` must not affect the resolved function
    assert_prints(
        "var a = \"global\";\n\
         {\n\
             fun show() { print a; }\n\
             show();\n\
             var a = \"local\";\n\
             show();\n\
         }",
        "global\nglobal\n",
    );
}

#[test]
fn closures_capture_declaration_environment() {
    assert_prints(
        "var f;\n\
         {\n\
             var x = \"captured\";\n\
             fun g() { print x; }\n\
             f = g;\n\
         }\n\
         f();",
        "captured\n",
    );
}

#[test]
fn counter_closure_shares_state() {
    assert_prints(
        "fun mk() {\n\
             var i = 0;\n\
             fun inc() { i = i + 1; return i; }\n\
             return inc;\n\
         }\n\
         var c = mk();\n\
         print c(); print c(); print c();",
        "1\n2\n3\n",
    );
}

// ─── control flow and functions ──────────────────────────────────────────

#[test]
fn while_loop() {
    assert_prints(
        "var a = 0; while (a < 5) { print a; a = a + 1; }",
        "0\n1\n2\n3\n4\n",
    );
}

#[test]
fn for_loop_variants() {
    assert_prints(
        "for (var a = 0; a < 5; a = a + 1) { print a; }\n\
         var b = 20;\n\
         for (; b < 23;) { print b; b = b + 1; }",
        "0\n1\n2\n3\n4\n20\n21\n22\n",
    );
}

#[test]
fn recursion() {
    assert_prints(
        "fun fib(n) {\n\
             if (n <= 1) return n;\n\
             return fib(n - 2) + fib(n - 1);\n\
         }\n\
         for (var i = 0; i < 10; i = i + 1) {\n\
             print fib(i);\n\
         }",
        "0\n1\n1\n2\n3\n5\n8\n13\n21\n34\n",
    );
}

#[test]
fn return_unwinds_nested_blocks_and_loops() {
    assert_prints(
        "fun find() {\n\
             for (var i = 0; i < 10; i = i + 1) {\n\
                 if (i == 3) { return i; }\n\
             }\n\
         }\n\
         print find();",
        "3\n",
    );
}

#[test]
fn function_without_return_yields_nil() {
    assert_prints("fun f() {} print f();", "nil\n");
}

#[test]
fn first_class_functions() {
    assert_prints(
        "fun say(n) { print n; }\n\
         var alias = say;\n\
         alias(\"test string\");",
        "test string\n",
    );
}

#[test]
fn evaluation_order_is_left_to_right() {
    assert_prints(
        "fun side(tag, value) { print tag; return value; }\n\
         print side(\"left\", 1) + side(\"right\", 2);",
        "left\nright\n3\n",
    );
}

#[test]
fn arity_is_checked() {
    assert_runtime_error("fun f(a) {} f();", "Expected 1 arguments but got 0.");
    assert_runtime_error("fun f() {} f(1);", "Expected 0 arguments but got 1.");
}

#[test]
fn only_callables_can_be_called() {
    assert_runtime_error("\"str\"();", "Can only call functions and classes.");
}

#[test]
fn callable_display() {
    assert_prints("fun f() {} print f;", "<fn f>\n");
    assert_prints("print clock;", "<native fn clock>\n");
}

#[test]
fn clock_returns_a_number() {
    assert_prints("print clock() > 0;", "true\n");
}

// ─── classes, instances, methods ─────────────────────────────────────────

#[test]
fn init_binds_and_methods_read_fields() {
    assert_prints(
        "class B {\n\
             init(x) { this.x = x; }\n\
             get() { return this.x; }\n\
         }\n\
         var b = B(42);\n\
         print b.get();",
        "42\n",
    );
}

#[test]
fn fields_are_created_on_first_assignment() {
    assert_prints("class P {} var p = P(); p.x = 3; print p.x;", "3\n");
}

#[test]
fn undefined_property() {
    assert_runtime_error("class P {} var p = P(); print p.y;", "Undefined property 'y'.");
}

#[test]
fn only_instances_have_properties() {
    assert_runtime_error("print 1 .x;", "Only instances have properties.");
    assert_runtime_error("1 .x = 2;", "Only instances have fields.");
}

#[test]
fn class_display() {
    assert_prints("class A {} print A; print A();", "A\nA instance\n");
}

#[test]
fn init_always_returns_the_instance() {
    assert_prints(
        "class A { init() { this.x = 1; return; } }\n\
         var a = A();\n\
         print a.x;",
        "1\n",
    );

    // calling init directly also yields the bound instance
    assert_prints(
        "class A { init() {} }\n\
         var a = A();\n\
         print a.init() == a;",
        "true\n",
    );
}

#[test]
fn bound_methods_keep_their_instance() {
    assert_prints(
        "class Counter {\n\
             init() { this.n = 0; }\n\
             inc() { this.n = this.n + 1; return this.n; }\n\
         }\n\
         var c = Counter();\n\
         var inc = c.inc;\n\
         print inc();\n\
         print inc();",
        "1\n2\n",
    );
}

#[test]
fn class_name_is_visible_inside_methods() {
    assert_prints(
        "class A { make() { return A(); } }\n\
         var a = A();\n\
         print a.make();",
        "A instance\n",
    );
}

#[test]
fn instances_compare_by_identity() {
    assert_prints(
        "class A {}\n\
         var a = A();\n\
         var b = A();\n\
         print a == a;\n\
         print a == b;",
        "true\nfalse\n",
    );
}

#[test]
fn runtime_error_carries_line_number() {
    let err = run("var a = 1;\nprint -\"x\";").expect_err("should fail");
    assert!(err.contains("[line 2]"), "missing line info: {:?}", err);
}
