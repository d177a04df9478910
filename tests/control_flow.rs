// Control flow: if/else, loops, switch, functions, flow-control rules

use template_lang::{ErrorKind, SliceHost, TemplateEngine};

fn run<'a>(source: &'a str, data: &'a [u8]) -> SliceHost<'a> {
    let engine = TemplateEngine::new();
    let mut host = SliceHost::new(data);
    engine
        .run("test.bt", source, &mut host)
        .expect("engine.run failed");
    host
}

fn run_err(source: &str, data: &[u8]) -> template_lang::TemplateError {
    let engine = TemplateEngine::new();
    let mut host = SliceHost::new(data);
    engine.run("test.bt", source, &mut host).unwrap_err()
}

// ========== If / else ==========

#[test]
fn test_else_if_chain() {
    let host = run(
        r#"
        local int x = 2;
        if (x == 1) { Printf("one"); }
        else if (x == 2) { Printf("two"); }
        else { Printf("other"); }
        "#,
        &[0u8; 1],
    );
    assert_eq!(host.printed, vec!["two"]);
}

#[test]
fn test_else_branch() {
    let host = run(
        r#"
        if (0) { Printf("then"); } else { Printf("else"); }
        "#,
        &[0u8; 1],
    );
    assert_eq!(host.printed, vec!["else"]);
}

#[test]
fn test_condition_must_be_numeric() {
    let err = run_err("if (\"s\") { Printf(\"x\"); }", &[0u8; 1]);
    assert_eq!(err.kind, ErrorKind::TypeMismatch);
}

// ========== For / while ==========

#[test]
fn test_for_loop_counts() {
    let host = run(
        r#"
        for (local int i = 0; i < 4; i = i + 1) {
            Printf("%d", i);
        }
        "#,
        &[0u8; 1],
    );
    assert_eq!(host.printed, vec!["0", "1", "2", "3"]);
}

#[test]
fn test_loop_redeclaration_fails() {
    let err = run_err(
        "for (local int i = 0; i < 2; i = i + 1) { uchar b; }",
        &[0u8; 8],
    );
    assert_eq!(err.kind, ErrorKind::RedefinedVariable);
}

#[test]
fn test_while_loop() {
    let host = run(
        r#"
        local int n = 3;
        while (n > 0) {
            Printf("%d", n);
            n = n - 1;
        }
        "#,
        &[0u8; 1],
    );
    assert_eq!(host.printed, vec!["3", "2", "1"]);
}

#[test]
fn test_break_exits_loop() {
    let host = run(
        r#"
        for (local int i = 0; i < 10; i = i + 1) {
            if (i == 2) { break; }
            Printf("%d", i);
        }
        Printf("done");
        "#,
        &[0u8; 1],
    );
    assert_eq!(host.printed, vec!["0", "1", "done"]);
}

#[test]
fn test_continue_skips_iteration() {
    let host = run(
        r#"
        for (local int i = 0; i < 4; i = i + 1) {
            if (i == 1) { continue; }
            Printf("%d", i);
        }
        "#,
        &[0u8; 1],
    );
    assert_eq!(host.printed, vec!["0", "2", "3"]);
}

#[test]
fn test_nested_loop_break_inner_only() {
    let host = run(
        r#"
        for (local int i = 0; i < 2; i = i + 1) {
            for (local int j = 0; j < 5; j = j + 1) {
                if (j == 1) { break; }
                Printf("%d%d", i, j);
            }
        }
        "#,
        &[0u8; 1],
    );
    assert_eq!(host.printed, vec!["00", "10"]);
}

#[test]
fn test_loop_iterator_scope() {
    // The loop induction variable is scoped to the loop
    let err = run_err(
        "for (local int i = 0; i < 1; i = i + 1) { } Printf(\"%d\", i);",
        &[0u8; 1],
    );
    assert_eq!(err.kind, ErrorKind::UndefinedVariable);
}

// ========== Switch ==========

#[test]
fn test_switch_matches_case() {
    let host = run(
        r#"
        local int x = 2;
        switch (x) {
            case 1: Printf("one"); break;
            case 2: Printf("two"); break;
            default: Printf("other");
        }
        "#,
        &[0u8; 1],
    );
    assert_eq!(host.printed, vec!["two"]);
}

#[test]
fn test_switch_fallthrough() {
    let host = run(
        r#"
        local int x = 1;
        switch (x) {
            case 1: Printf("one");
            case 2: Printf("two"); break;
            case 3: Printf("three");
        }
        "#,
        &[0u8; 1],
    );
    assert_eq!(host.printed, vec!["one", "two"]);
}

#[test]
fn test_switch_default_when_no_match() {
    let host = run(
        r#"
        local int x = 9;
        switch (x) {
            case 1: Printf("one"); break;
            default: Printf("other");
        }
        "#,
        &[0u8; 1],
    );
    assert_eq!(host.printed, vec!["other"]);
}

#[test]
fn test_switch_no_match_no_default() {
    let host = run(
        r#"
        local int x = 9;
        switch (x) { case 1: Printf("one"); }
        Printf("after");
        "#,
        &[0u8; 1],
    );
    assert_eq!(host.printed, vec!["after"]);
}

#[test]
fn test_switch_on_decoded_value() {
    let data = [0x02, 0x00];
    let host = run(
        r#"
        uint16 tag;
        switch (tag) {
            case 1: Printf("a"); break;
            case 2: Printf("b"); break;
        }
        "#,
        &data,
    );
    assert_eq!(host.printed, vec!["b"]);
}

#[test]
fn test_switch_case_declares_variables() {
    let data = [0x01, 0xAA, 0xBB];
    let host = run(
        r#"
        uchar kind;
        switch (kind) {
            case 1: uint16 payload; break;
            default: uchar other;
        }
        "#,
        &data,
    );
    assert_eq!(host.data_types.len(), 2);
    assert_eq!(host.data_types[1], (1, 2, "u16le".to_string()));
}

// ========== Functions ==========

#[test]
fn test_function_call_and_return() {
    let host = run(
        r#"
        int add(int a, int b) { return a + b; }
        Printf("%d", add(2, 3));
        "#,
        &[0u8; 1],
    );
    assert_eq!(host.printed, vec!["5"]);
}

#[test]
fn test_void_function() {
    let host = run(
        r#"
        void announce(string msg) { Printf("%s", msg); }
        announce("hi");
        "#,
        &[0u8; 1],
    );
    assert_eq!(host.printed, vec!["hi"]);
}

#[test]
fn test_function_early_return() {
    let host = run(
        r#"
        int clamp(int v) {
            if (v > 10) { return 10; }
            return v;
        }
        Printf("%d %d", clamp(42), clamp(7));
        "#,
        &[0u8; 1],
    );
    assert_eq!(host.printed, vec!["10 7"]);
}

#[test]
fn test_function_return_in_loop() {
    let host = run(
        r#"
        int first_even(int start) {
            for (local int i = start; i < start + 10; i = i + 1) {
                if (i % 2 == 0) { return i; }
            }
            return 0 - 1;
        }
        Printf("%d", first_even(3));
        "#,
        &[0u8; 1],
    );
    assert_eq!(host.printed, vec!["4"]);
}

#[test]
fn test_function_sees_globals_not_enclosing_locals() {
    // Functions see their parameters and template-scope bindings only;
    // template-scope locals live in the globals table and are visible.
    let host = run(
        r#"
        local int base = 40;
        int plus(int v) { return base + v; }
        Printf("%d", plus(2));
        "#,
        &[0u8; 1],
    );
    assert_eq!(host.printed, vec!["42"]);
}

#[test]
fn test_function_reads_file_variable() {
    let data = [0x05, 0x00, 0x00, 0x00];
    let host = run(
        r#"
        uint32 count;
        int doubled() { return count * 2; }
        Printf("%d", doubled());
        "#,
        &data,
    );
    assert_eq!(host.printed, vec!["10"]);
}

#[test]
fn test_missing_return() {
    let err = run_err("int f() { local int x = 1; } f();", &[0u8; 1]);
    assert_eq!(err.kind, ErrorKind::MissingReturn);
}

#[test]
fn test_bare_return_in_void_function() {
    let host = run(
        r#"
        void f(int x) {
            if (x == 0) { return; }
            Printf("nonzero");
        }
        f(0);
        f(1);
        "#,
        &[0u8; 1],
    );
    assert_eq!(host.printed, vec!["nonzero"]);
}

#[test]
fn test_return_type_checked() {
    let err = run_err("int f() { return \"s\"; } f();", &[0u8; 1]);
    assert_eq!(err.kind, ErrorKind::TypeMismatch);
}

#[test]
fn test_global_declaration_in_function_rejected() {
    let err = run_err("void f() { int x; } f();", &[0u8; 4]);
    assert_eq!(err.kind, ErrorKind::GlobalInFunctionBody);
}

// ========== Flow-control legality ==========

#[test]
fn test_break_outside_loop() {
    let err = run_err("break;", &[0u8; 1]);
    assert_eq!(err.kind, ErrorKind::BreakOutsideLoop);
}

#[test]
fn test_continue_outside_loop() {
    let err = run_err("continue;", &[0u8; 1]);
    assert_eq!(err.kind, ErrorKind::ContinueOutsideLoop);
}

#[test]
fn test_break_in_if_without_loop() {
    let err = run_err("if (1) { break; }", &[0u8; 1]);
    assert_eq!(err.kind, ErrorKind::BreakOutsideLoop);
}

#[test]
fn test_continue_in_switch_without_loop() {
    let err = run_err(
        "local int x = 1; switch (x) { case 1: continue; }",
        &[0u8; 1],
    );
    assert_eq!(err.kind, ErrorKind::ContinueOutsideLoop);
}

#[test]
fn test_break_in_function_body_outside_loop() {
    let err = run_err("void f() { break; } f();", &[0u8; 1]);
    assert_eq!(err.kind, ErrorKind::BreakOutsideLoop);
}

#[test]
fn test_return_inside_struct_body_rejected() {
    let err = run_err("struct S { return; } s;", &[0u8; 1]);
    assert_eq!(err.kind, ErrorKind::ReturnOutsideFunction);
}

#[test]
fn test_continue_in_loop_inside_switch() {
    // A loop nested in a switch case still handles continue
    let host = run(
        r#"
        local int x = 1;
        switch (x) {
            case 1:
                for (local int i = 0; i < 3; i = i + 1) {
                    if (i == 1) { continue; }
                    Printf("%d", i);
                }
                break;
        }
        "#,
        &[0u8; 1],
    );
    assert_eq!(host.printed, vec!["0", "2"]);
}

// ========== Short-circuit evaluation ==========

#[test]
fn test_logical_and_short_circuits() {
    // The right operand would divide by zero; short-circuit avoids it
    let host = run(
        r#"
        local int z = 0;
        if (0 && 1 / z) { Printf("no"); }
        Printf("ok");
        "#,
        &[0u8; 1],
    );
    assert_eq!(host.printed, vec!["ok"]);
}

#[test]
fn test_logical_or_short_circuits() {
    let host = run(
        r#"
        local int z = 0;
        if (1 || 1 / z) { Printf("yes"); }
        "#,
        &[0u8; 1],
    );
    assert_eq!(host.printed, vec!["yes"]);
}

#[test]
fn test_division_by_zero() {
    let err = run_err("local int z = 0; local int x = 1 / z;", &[0u8; 1]);
    assert_eq!(err.kind, ErrorKind::DivisionByZero);
}

#[test]
fn test_modulo_by_zero() {
    let err = run_err("local int z = 0; local int x = 1 % z;", &[0u8; 1]);
    assert_eq!(err.kind, ErrorKind::DivisionByZero);
}
