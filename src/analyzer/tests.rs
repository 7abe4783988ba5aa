//! Unit tests for the statement handlers and the semantic checks.

use std::rc::Rc;

use crate::{
    analyzer::analyzer::{analyze_source, Analyzer},
    config::Config,
    diagnostics::diagnostics::DiagnosticLog,
    errors::errors::Severity,
    flow::status::{ControlFlow, FlowStatus},
    lexer::lexer::tokenize,
};

fn run_with(source: &str, config: Config) -> (FlowStatus, DiagnosticLog) {
    let symbols = tokenize(source.to_string(), Some("test.php".to_string())).unwrap();
    let mut analyzer = Analyzer::new(symbols, Rc::new(String::from("test.php")), config);
    let status = analyzer.analyze();
    (status, analyzer.into_log())
}

fn run(source: &str) -> (FlowStatus, DiagnosticLog) {
    run_with(source, Config::default())
}

fn names(source: &str) -> Vec<&'static str> {
    run(source).1.names()
}

#[test]
fn test_static_if_makes_following_code_unreachable() {
    let (status, log) = run("<?php if (true) return 1; echo 2;");

    assert_eq!(status.flow, ControlFlow::TERMINATES);
    assert_eq!(log.names(), vec!["UnreachableCode"]);
    assert_eq!(log.count(Severity::Warning), 1);
}

#[test]
fn test_unreachable_reported_once_per_block() {
    let (_, log) = run("<?php return; echo 1; echo 2; echo 3;");

    assert_eq!(log.names(), vec!["UnreachableCode"]);
}

#[test]
fn test_switch_with_returning_groups_terminates() {
    let (status, log) = run("<?php $x = 1; switch ($x) { case 1: return; default: return; }");

    assert_eq!(status.flow, ControlFlow::TERMINATES);
    assert!(log.is_empty());
}

#[test]
fn test_switch_without_default_falls_through() {
    let (status, _) = run("<?php $x = 1; switch ($x) { case 1: return; }");

    assert_eq!(status.flow, ControlFlow::FALLS_THROUGH | ControlFlow::TERMINATES);
}

#[test]
fn test_infinite_loop_with_break_falls_through() {
    let (status, log) = run("<?php $c = false; while (true) { if ($c) break; }");

    assert_eq!(status.flow, ControlFlow::FALLS_THROUGH);
    assert!(log.is_empty());
}

#[test]
fn test_infinite_loop_without_break_never_completes() {
    let (status, log) = run("<?php for (;;) { } echo 1;");

    assert_eq!(status.flow, ControlFlow::TERMINATES);
    assert_eq!(log.names(), vec!["UnreachableCode"]);
}

#[test]
fn test_while_false_body_is_unreachable() {
    let (status, log) = run("<?php while (false) { echo 1; }");

    assert_eq!(status.flow, ControlFlow::FALLS_THROUGH);
    assert_eq!(log.names(), vec!["UnreachableCode"]);
}

#[test]
fn test_caught_exception_does_not_escape() {
    let source = "<?php
        class A extends Exception {}
        function throwsA() /*. throws A .*/ { throw new A(); }
        try { throwsA(); } catch (A $e) {}
    ";
    let (status, log) = run(source);

    assert!(status.raises.is_empty());
    assert!(status.can_fall_through());
    assert!(log.is_empty(), "{:?}", log.diagnostics());
}

#[test]
fn test_uncaught_exception_escapes_file() {
    let source = "<?php
        class A extends Exception {}
        class B extends Exception {}
        function throwsA() /*. throws A .*/ { throw new A(); }
        try { throwsA(); } catch (B $e) {}
    ";
    let (status, _) = run(source);

    assert_eq!(status.raises.len(), 1);
}

#[test]
fn test_missing_return() {
    let source = "<?php function f($flag): int { if ($flag) return 1; }";

    assert_eq!(names(source), vec!["MissingReturn"]);
}

#[test]
fn test_mixed_and_void_functions_need_no_return() {
    let source = "<?php
        function a($flag) { if ($flag) return 1; }
        function b() /*. void .*/ { echo 1; }
    ";

    assert!(names(source).is_empty());
}

#[test]
fn test_return_checks() {
    let source = "<?php
        function f() /*. void .*/ { return 1; }
        function g(): int { return; }
        function h(): int { return \"text\"; }
    ";

    assert_eq!(
        names(source),
        vec!["ReturnValueInVoid", "MissingReturnValue", "TypeMatchError"]
    );
}

#[test]
fn test_first_assignment_declares_variable_type() {
    assert_eq!(names("<?php $a = 1; $a = \"x\";"), vec!["TypeMatchError"]);
    assert!(names("<?php $a = 1; $a = 2;").is_empty());
}

#[test]
fn test_variable_first_assigned_null_is_mixed() {
    assert!(names("<?php $a = null; $a = 1; $a = \"x\";").is_empty());
}

#[test]
fn test_annotated_variables() {
    assert_eq!(names("<?php /*. string .*/ $s = 5;"), vec!["TypeMatchError"]);
    assert!(names("<?php /*. int[] .*/ $list = [1, 2];").is_empty());
    assert!(names("<?php /*. array[int]string .*/ $list = [\"a\"];").is_empty());
}

#[test]
fn test_invalid_annotation_falls_back_to_mixed() {
    assert_eq!(names("<?php /*. int[float] .*/ $x = 1;"), vec!["InvalidAnnotation"]);
}

#[test]
fn test_call_arity_and_argument_types() {
    let source = "<?php
        function add(int $a, int $b): int { return $a + $b; }
        add(1);
        add(1, 2, 3);
        add(\"x\", 2);
        add(1, 2);
    ";

    assert_eq!(
        names(source),
        vec!["MissingArguments", "UnexpectedArguments", "ArgumentTypeMatchError"]
    );
}

#[test]
fn test_variadic_builtins_accept_extra_arguments() {
    assert!(names("<?php printf(\"%d %d\", 1, 2);").is_empty());
}

#[test]
fn test_unknown_names() {
    assert_eq!(names("<?php nope();"), vec!["FunctionNotDeclared"]);
    assert_eq!(names("<?php $x = new Missing();"), vec!["UnknownClass"]);
}

#[test]
fn test_undeclared_variable_is_a_warning() {
    let (_, log) = run("<?php echo $missing;");

    assert_eq!(log.names(), vec!["VariableNotDeclared"]);
    assert_eq!(log.count(Severity::Warning), 1);
    assert!(!log.has_errors());
}

#[test]
fn test_jump_outside_loop() {
    assert_eq!(names("<?php break;"), vec!["OutsideLoop"]);
    assert!(names("<?php while (true) { break; }").is_empty());
}

#[test]
fn test_leveled_break_leaves_switch_and_loop() {
    let (status, log) = run("<?php $x = 1; while (true) { switch ($x) { case 1: break 2; } } echo 1;");

    assert_eq!(status.flow, ControlFlow::FALLS_THROUGH);
    assert!(log.is_empty(), "{:?}", log.names());
}

#[test]
fn test_leveled_continue_skips_rest_of_outer_body() {
    let (status, log) = run("<?php while (true) { while (true) { continue 2; } echo 1; }");

    assert_eq!(status.flow, ControlFlow::TERMINATES);
    assert_eq!(log.names(), vec!["UnreachableCode"]);
}

#[test]
fn test_jump_level_beyond_enclosing_loops() {
    let (status, log) = run("<?php while (true) { break 2; }");

    assert_eq!(log.names(), vec!["OutsideLoop"]);
    assert_eq!(status.flow, ControlFlow::FALLS_THROUGH);

    assert_eq!(names("<?php for (;;) { break 0; }"), vec!["UnexpectedTokenDetailed"]);
}

#[test]
fn test_undeclared_exception() {
    let source = "<?php
        class E extends Exception {}
        function f() { throw new E(); }
    ";

    assert_eq!(names(source), vec!["UndeclaredException"]);

    let config = Config {
        check_throws: false,
        ..Config::default()
    };
    assert!(run_with(source, config).1.is_empty());
}

#[test]
fn test_unchecked_exceptions_need_no_throws() {
    let source = "<?php
        /*. unchecked .*/ class Fatal extends Exception {}
        function f() { throw new Fatal(); }
        function g() { throw new TypeError(); }
    ";

    assert!(names(source).is_empty());
}

#[test]
fn test_throws_supertype_covers_subclass() {
    let source = "<?php
        class IOException extends Exception {}
        function f() /*. throws Exception .*/ { throw new IOException(); }
    ";

    assert!(names(source).is_empty());
}

#[test]
fn test_throw_non_exception() {
    let (status, log) = run("<?php throw 5;");

    assert_eq!(status.flow, ControlFlow::TERMINATES);
    assert_eq!(log.names(), vec!["NotThrowable"]);
}

#[test]
fn test_abstract_classes() {
    let source = "<?php
        abstract class Shape { abstract function area(); }
        class Square extends Shape {}
        $s = new Shape();
    ";

    assert_eq!(
        names(source),
        vec!["AbstractMethodNotImplemented", "AbstractInstantiation"]
    );
}

#[test]
fn test_interface_implementation() {
    let source = "<?php
        interface Shape { function area(): float; }
        class Circle implements Shape { function area(): float { return 3.14; } }
        class Broken implements Shape {}
        $c = new Circle();
        $area = $c->area();
    ";

    assert_eq!(names(source), vec!["AbstractMethodNotImplemented"]);
}

#[test]
fn test_inheritance_errors() {
    assert_eq!(
        names("<?php final class Base {} class Child extends Base {}"),
        vec!["FinalClassExtended"]
    );
    assert_eq!(
        names("<?php interface I {} class A extends I {}"),
        vec!["InvalidParent"]
    );
    assert_eq!(
        names("<?php class A extends B {} class B extends A {}"),
        vec!["CyclicInheritance", "CyclicInheritance"]
    );
}

#[test]
fn test_member_visibility() {
    let source = "<?php
        class Account {
            private $balance = 0;
            public function deposit(int $amount) /*. void .*/ {
                $this->balance = $this->balance + $amount;
            }
        }
        $a = new Account();
        $a->deposit(5);
        echo $a->balance;
        $a->withdraw(1);
    ";

    assert_eq!(names(source), vec!["InaccessibleMember", "UnknownMember"]);
}

#[test]
fn test_property_types_are_checked() {
    let source = "<?php
        class Point { public /*. int .*/ $x = 0; }
        $p = new Point();
        $p->x = \"left\";
    ";

    assert_eq!(names(source), vec!["TypeMatchError"]);
}

#[test]
fn test_static_members() {
    let source = "<?php
        class Settings {
            const VERSION = 2;
            public static function name(): string { return \"cfg\"; }
        }
        $v = Settings::VERSION + 1;
        $n = Settings::name();
        echo Settings::MISSING;
    ";

    assert_eq!(names(source), vec!["UnknownMember"]);
}

#[test]
fn test_parent_constructor() {
    let source = "<?php
        class AppException extends Exception {
            public function __construct(string $message) { parent::__construct($message, 1); }
        }
        throw new AppException();
    ";

    assert_eq!(names(source), vec!["MissingArguments"]);
}

#[test]
fn test_not_an_object() {
    assert_eq!(names("<?php $n = 1; $n->foo();"), vec!["NotAnObject"]);
}

#[test]
fn test_container_key_type() {
    let source = "<?php /*. int[string] .*/ $ages = [\"bob\" => 3]; echo $ages[0];";

    assert_eq!(names(source), vec!["InvalidKeyType"]);
}

#[test]
fn test_foreach_declares_typed_variables() {
    let source = "<?php
        /*. string[int] .*/ $names = [\"a\"];
        foreach ($names as $i => $name) { $len = strlen($name); }
    ";

    assert!(names(source).is_empty());
}

#[test]
fn test_duplicate_declarations() {
    assert_eq!(names("<?php function f() {} function f() {}"), vec!["FunctionAlreadyDeclared"]);
    assert_eq!(names("<?php class A {} class A {}"), vec!["ClassAlreadyDeclared"]);
    assert_eq!(
        names("<?php class A { function m() {} function M() {} }"),
        vec!["MemberAlreadyDeclared"]
    );
}

#[test]
fn test_forward_references() {
    let source = "<?php
        echo twice(2);
        /*. Later .*/ $x = null;
        function twice(int $n): int { return $n * 2; }
        class Later {}
    ";

    assert!(names(source).is_empty());
}

#[test]
fn test_nested_function_declared_when_reached() {
    let source = "<?php
        function outer() { function inner(): int { return 1; } }
        outer();
        echo inner();
    ";

    assert!(names(source).is_empty());
}

#[test]
fn test_declarations_after_return_are_reachable() {
    assert!(names("<?php return; function late() {}").is_empty());
}

#[test]
fn test_recovery_after_parse_error() {
    let (status, log) = run("<?php $a = ; $b = 2; echo $b;");

    assert_eq!(log.names(), vec!["UnexpectedToken"]);
    assert!(status.can_fall_through());
}

#[test]
fn test_stray_keyword_is_reported() {
    assert_eq!(names("<?php else { echo 1; } echo 2;"), vec!["UnexpectedToken"]);
}

#[test]
fn test_try_needs_catch_or_finally() {
    assert_eq!(names("<?php try { echo 1; } echo 2;"), vec!["UnexpectedTokenDetailed"]);
}

#[test]
fn test_finally_without_fall_through_wins() {
    let (status, _) = run("<?php try { echo 1; } finally { return; }");

    assert_eq!(status.flow, ControlFlow::TERMINATES);
}

#[test]
fn test_config_filters() {
    let config = Config {
        min_severity: Severity::Error,
        ..Config::default()
    };
    assert!(analyze_source("<?php echo $missing;", None, config).is_empty());

    let config = Config {
        report_unreachable: false,
        ..Config::default()
    };
    assert!(analyze_source("<?php return; echo 1;", None, config).is_empty());
}

#[test]
fn test_lexer_errors_are_reported() {
    let log = analyze_source("<?php $a = `x`;", None, Config::default());

    assert_eq!(log.names(), vec!["UnrecognisedToken"]);
}

#[test]
fn test_catch_self_is_typed_by_resolved_class() {
    let source = "<?php
        class Failure extends Exception {
            public static function attempt(): int {
                try {
                    throw new Failure();
                } catch (self $e) {
                    return $e->missing();
                }
            }
        }
    ";

    assert_eq!(names(source), vec!["UnknownMember"]);
}

#[test]
fn test_integer_literal_beyond_int_range_is_float() {
    assert_eq!(
        names("<?php function f(): int { return 9223372036854775808; }"),
        vec!["TypeMatchError"]
    );
    assert!(names("<?php function g(): float { return 9223372036854775808; }").is_empty());
    assert!(names("<?php function h(): int { return 9223372036854775807; }").is_empty());
}

#[test]
fn test_new_session_has_builtins() {
    let symbols = tokenize("<?php".to_string(), None).unwrap();
    let analyzer = Analyzer::new(symbols, Rc::new(String::from("test.php")), Config::default());

    assert!(analyzer.globals.classes.resolve("InvalidArgumentException").is_some());
    assert!(analyzer.globals.classes.resolve("TypeError").is_some());
    assert!(analyzer.globals.function("strlen").is_some());
}
