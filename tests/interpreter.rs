mod common;

use common::{output_of, run, Capture};
use rox::ast::NodeIds;
use rox::interpreter::Interpreter;
use rox::parser::Parser;
use rox::resolver::Resolver;
use rox::scanner::scan_tokens;
use rox::session::RunStatus;

/// Run `source` expecting exactly one runtime error; returns it and the
/// output printed before it.
fn runtime_error(source: &str) -> (String, String) {
    let outcome = run(source);

    assert_eq!(outcome.status, RunStatus::RuntimeError);
    assert_eq!(outcome.errors.len(), 1, "errors: {:?}", outcome.errors);

    (outcome.errors[0].clone(), outcome.output)
}

// ─────────────────────────── expressions ───────────────────────────

#[test]
fn arithmetic() {
    assert_eq!(output_of("print 1 + 2;"), "3\n");
    assert_eq!(output_of("print (1 + 2) * 3 - 4 / 8;"), "8.5\n");
    assert_eq!(output_of("print -(3);"), "-3\n");
}

#[test]
fn string_concatenation() {
    assert_eq!(output_of("print \"foo\" + \"bar\";"), "foobar\n");
}

#[test]
fn division_by_zero_is_ieee() {
    assert_eq!(output_of("print 1 / 0; print -1 / 0;"), "inf\n-inf\n");
    assert_eq!(output_of("print 0 / 0 == 0 / 0;"), "true\n");
}

#[test]
fn equality_and_truthiness() {
    assert_eq!(
        output_of("print nil == false; print 1 == 1; print \"a\" != \"a\"; print !0; print !nil;"),
        "false\ntrue\nfalse\nfalse\ntrue\n"
    );
}

#[test]
fn logical_operators_return_operands() {
    assert_eq!(
        output_of("print nil or \"yes\"; print 0 and 2; print false and missing;"),
        "yes\n2\nfalse\n"
    );
}

#[test]
fn value_display() {
    assert_eq!(
        output_of(
            "fun f() {} class K {}
             print nil; print true; print 1.5; print \"s\";
             print f; print clock; print K; print K();"
        ),
        "nil\ntrue\n1.5\ns\n<fn f>\n<native fn clock>\n<class K>\n<K instance>\n"
    );
}

#[test]
fn clock_returns_seconds() {
    assert_eq!(output_of("print clock() > 1000000000;"), "true\n");
}

// ─────────────────────────── statements ───────────────────────────

#[test]
fn shadowing_in_blocks() {
    assert_eq!(
        output_of("var a = 1; { var a = 2; print a; } print a;"),
        "2\n1\n"
    );
}

#[test]
fn assignment_reaches_outer_scope() {
    assert_eq!(
        output_of("var a = 1; { a = 2; } print a; var b; print b;"),
        "2\nnil\n"
    );
}

#[test]
fn control_flow() {
    assert_eq!(
        output_of("for (var i = 0; i < 3; i = i + 1) print i;"),
        "0\n1\n2\n"
    );
    assert_eq!(
        output_of("var n = 0; while (n < 2) n = n + 1; print n;"),
        "2\n"
    );
    assert_eq!(
        output_of("if (nil) print \"then\"; else print \"else\";"),
        "else\n"
    );
}

#[test]
fn block_environment_is_restored_after_return() {
    assert_eq!(
        output_of(
            "var x = \"outer\";
             fun f() { { { return 1; } } }
             { var x = \"inner\"; f(); print x; }
             print x;"
        ),
        "inner\nouter\n"
    );
}

// ─────────────────────────── functions ───────────────────────────

#[test]
fn recursion() {
    assert_eq!(
        output_of("fun fib(n) { if (n < 2) return n; return fib(n - 1) + fib(n - 2); } print fib(10);"),
        "55\n"
    );
}

#[test]
fn return_unwinds_loops() {
    assert_eq!(
        output_of("fun f() { while (true) { return 7; } } print f(); fun g() {} print g();"),
        "7\nnil\n"
    );
}

#[test]
fn counter_closure() {
    assert_eq!(
        output_of(
            "fun makeCounter() {
               var i = 0;
               fun count() { i = i + 1; print i; }
               return count;
             }
             var counter = makeCounter();
             counter();
             counter();"
        ),
        "1\n2\n"
    );
}

#[test]
fn closures_bind_lexically() {
    assert_eq!(
        output_of(
            "var a = \"global\";
             {
               fun showA() { print a; }
               showA();
               var a = \"block\";
               showA();
             }"
        ),
        "global\nglobal\n"
    );
}

// ─────────────────────────── classes ───────────────────────────

#[test]
fn inherited_initializer() {
    assert_eq!(
        output_of("class A { init() { this.x = 1; } } class B < A {} print B().x;"),
        "1\n"
    );
}

#[test]
fn super_calls_the_superclass_method() {
    assert_eq!(
        output_of(
            "class A { method() { print \"A method\"; } }
             class B < A {
               method() { print \"B method\"; }
               test() { super.method(); }
             }
             class C < B {}
             C().test();"
        ),
        "A method\n"
    );
}

#[test]
fn initializer_returns_this() {
    assert_eq!(
        output_of(
            "class P { init() { this.v = 1; return; } }
             var p = P();
             print p.init();
             print p.v;"
        ),
        "<P instance>\n1\n"
    );
}

#[test]
fn inherited_init_is_a_readable_property() {
    assert_eq!(
        output_of(
            "class A { init() { this.x = 1; } }
             class B < A {}
             var b = B();
             print b.init;
             print b.init() == b;"
        ),
        "<fn init>\ntrue\n"
    );
}

#[test]
fn super_with_missing_method() {
    let (error, output) = runtime_error(
        "class A {}
         class B < A { m() { print \"before\"; return super.nope(); } }
         B().m();",
    );

    assert_eq!(error, "Superclass doesn't implement method 'nope'.\n[line 2]");
    assert_eq!(output, "before\n");
}

#[test]
fn bound_methods_keep_their_instance() {
    assert_eq!(
        output_of(
            "class A { init(n) { this.n = n; } get() { return this.n; } }
             var g = A(3).get;
             print g();"
        ),
        "3\n"
    );
}

#[test]
fn fields_shadow_methods() {
    assert_eq!(
        output_of("class A { m() { return 1; } } var a = A(); a.m = 2; print a.m;"),
        "2\n"
    );
}

// ─────────────────────────── runtime errors ───────────────────────────

#[test]
fn arity_mismatch() {
    let (error, _) = runtime_error("fun f(a, b) {}\nf(1);");
    assert_eq!(error, "Expected 2 arguments but got 1.\n[line 2]");

    let (error, _) = runtime_error("fun g(a) {} g();");
    assert_eq!(error, "Expected 1 arguments but got 0.\n[line 1]");

    let (error, output) = runtime_error("fun g(a) { print a; } g(1, 2);");
    assert_eq!(error, "Expected 1 arguments but got 2.\n[line 1]");
    assert_eq!(output, "", "the body must not run");

    let (error, _) = runtime_error("class A { init(x) {} } A();");
    assert_eq!(error, "Expected 1 arguments but got 0.\n[line 1]");
}

#[test]
fn calling_a_non_callable() {
    let (error, _) = runtime_error("nil();");
    assert_eq!(error, "'nil' is not callable.\n[line 1]");

    let (error, _) = runtime_error("\"str\"();");
    assert_eq!(error, "'str' is not callable.\n[line 1]");
}

#[test]
fn operand_type_errors() {
    let cases = [
        ("print -\"a\";", "Operand of '-' must be a number."),
        ("print 1 + \"a\";", "Operands must be two numbers or two strings."),
        ("print 1 < \"a\";", "Operands of '<' must be numbers."),
        ("print nil * 2;", "Operands of '*' must be numbers."),
    ];

    for (source, message) in cases {
        let (error, _) = runtime_error(source);
        assert_eq!(error, format!("{}\n[line 1]", message), "source: {}", source);
    }
}

#[test]
fn undefined_variables() {
    let (error, _) = runtime_error("print x;");
    assert_eq!(error, "Undefined variable 'x'.\n[line 1]");

    let (error, _) = runtime_error("x = 1;");
    assert_eq!(error, "Undefined variable 'x'.\n[line 1]");
}

#[test]
fn property_errors() {
    let (error, _) = runtime_error("var a = 1; a.b;");
    assert_eq!(error, "Only instances have properties.\n[line 1]");

    let (error, _) = runtime_error("var a = 1; a.b = 2;");
    assert_eq!(error, "Only instances have fields.\n[line 1]");

    let (error, _) = runtime_error("class A {} A().nope;");
    assert_eq!(error, "Undefined property 'nope'.\n[line 1]");
}

#[test]
fn superclass_must_be_a_class() {
    let (error, _) = runtime_error("var NotClass = 1;\nclass B < NotClass {}");
    assert_eq!(error, "Superclass must be a class.\n[line 2]");
}

#[test]
fn runtime_error_stops_the_rest_of_the_run() {
    let (error, output) = runtime_error("print 1; print x; print 2;");

    assert_eq!(error, "Undefined variable 'x'.\n[line 1]");
    assert_eq!(output, "1\n");
}

// ─────────────────────────── sessions ───────────────────────────

#[test]
fn repl_state_persists_between_runs() {
    let capture = Capture::new();
    let mut lox = capture.session();

    assert_eq!(lox.run("var a = 1;").unwrap(), RunStatus::Ok);
    assert_eq!(lox.run("fun f() { return a + 1; }").unwrap(), RunStatus::Ok);
    assert_eq!(lox.run("print f();").unwrap(), RunStatus::Ok);

    // Errors leave the session usable.
    assert_eq!(lox.run("print missing;").unwrap(), RunStatus::RuntimeError);
    assert_eq!(lox.run("print ;").unwrap(), RunStatus::StaticError);
    assert!(lox.had_error());
    assert!(lox.had_runtime_error());

    lox.reset_error();
    assert!(!lox.had_error());

    assert_eq!(lox.run("a = a + 10; print f();").unwrap(), RunStatus::Ok);

    assert_eq!(capture.output(), "2\n12\n");
    assert_eq!(capture.errors().len(), 2);
}

#[test]
fn closures_survive_across_runs() {
    let capture = Capture::new();
    let mut lox = capture.session();

    lox.run("fun make() { var n = 0; fun inc() { n = n + 1; return n; } return inc; }")
        .unwrap();
    lox.run("var inc = make();").unwrap();
    lox.run("inc();").unwrap();
    lox.run("print inc();").unwrap();

    assert_eq!(capture.output(), "2\n");
}

#[test]
fn resolved_program_runs_identically_in_fresh_interpreters() {
    let source = "
        class Greeter {
          init(name) { this.name = name; }
          greet() { print \"hi \" + this.name; }
        }
        fun twice(f) { f(); f(); }
        { var g = Greeter(\"lox\"); twice(g.greet); }
    ";

    let (tokens, _) = scan_tokens(source);
    let mut ids = NodeIds::new();
    let (statements, errors) = Parser::new(&tokens, &mut ids).parse();
    assert!(errors.is_empty());

    let outputs: Vec<String> = (0..2)
        .map(|_| {
            let capture = Capture::new();
            let mut interpreter = Interpreter::with_output(Box::new(capture.clone()));

            Resolver::new(&mut interpreter)
                .resolve(&statements)
                .expect("program resolves");
            interpreter.interpret(&statements).expect("program runs");

            capture.output()
        })
        .collect();

    assert_eq!(outputs[0], "hi lox\nhi lox\n");
    assert_eq!(outputs[0], outputs[1]);
}
