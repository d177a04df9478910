// Host-call scenarios: templates against buffers, expected calls in order

use template_lang::{ErrorKind, ExecOptions, SliceHost, TemplateEngine};

fn run<'a>(source: &'a str, data: &'a [u8]) -> SliceHost<'a> {
    let engine = TemplateEngine::new();
    let mut host = SliceHost::new(data);
    engine
        .run("test.bt", source, &mut host)
        .expect("engine.run failed");
    host
}

// ========== Scenario 1: single int ==========

#[test]
fn test_single_int_annotations() {
    let data = [0u8; 8];
    let host = run("int x;", &data);
    assert_eq!(host.data_types, vec![(0, 4, "s32le".to_string())]);
    assert_eq!(host.comments, vec![(0, 4, "x".to_string())]);
}

// ========== Scenario 2: endian switching ==========

#[test]
fn test_endian_switching() {
    let data = [0u8; 8];
    let host = run(
        "BigEndian(); uint16 y; LittleEndian(); uint16 z;",
        &data,
    );
    assert_eq!(
        host.data_types,
        vec![(0, 2, "u16be".to_string()), (2, 2, "u16le".to_string())]
    );
    assert_eq!(
        host.comments,
        vec![(0, 2, "y".to_string()), (2, 2, "z".to_string())]
    );
}

#[test]
fn test_endian_fixed_at_bind_time() {
    // Reading y after switching back to little-endian still decodes
    // big-endian: the format is fixed when the variable binds.
    let data = [0x01, 0x02, 0, 0, 0, 0, 0, 0];
    let host = run(
        r#"
        BigEndian();
        uint16 y;
        LittleEndian();
        if (y == 0x0102) { Printf("be"); }
        "#,
        &data,
    );
    assert_eq!(host.printed, vec!["be".to_string()]);
}

// ========== Scenario 3: struct members only ==========

#[test]
fn test_struct_annotations_leaf_only() {
    let data = [0u8; 8];
    let host = run("struct { int a; int b; } s;", &data);
    assert_eq!(
        host.data_types,
        vec![(0, 4, "s32le".to_string()), (4, 4, "s32le".to_string())]
    );
    // No data-type or comment call for the struct itself
    assert_eq!(
        host.comments,
        vec![(0, 4, "a".to_string()), (4, 4, "b".to_string())]
    );
}

// ========== Scenario 4: length-prefixed array ==========

#[test]
fn test_length_prefixed_array() {
    let data = [0x03, 0x00, 0x00, 0x00, 0xAA, 0xBB, 0xCC, 0xDD];
    let host = run("uint32 n; uchar data[n];", &data);
    assert_eq!(
        host.data_types,
        vec![
            (0, 4, "u32le".to_string()),
            (4, 1, "u8".to_string()),
            (5, 1, "u8".to_string()),
            (6, 1, "u8".to_string()),
        ]
    );
    assert_eq!(host.comments[1..].to_vec(), vec![
        (4, 1, "data[0]".to_string()),
        (5, 1, "data[1]".to_string()),
        (6, 1, "data[2]".to_string()),
    ]);
}

// ========== Scenario 5: conditional on decoded value ==========

#[test]
fn test_condition_on_file_value() {
    let data = [0u8; 4];
    let host = run("int x; if (x == 0) { Printf(\"z\"); }", &data);
    assert_eq!(host.printed, vec!["z".to_string()]);
}

#[test]
fn test_condition_false_branch_not_taken() {
    let data = [0x01, 0, 0, 0];
    let host = run("int x; if (x == 0) { Printf(\"z\"); }", &data);
    assert!(host.printed.is_empty());
}

// ========== Scenario 6: return at template scope ==========

#[test]
fn test_return_at_template_scope() {
    let engine = TemplateEngine::new();
    let data = [0u8; 4];
    let mut host = SliceHost::new(&data);
    let err = engine
        .run("test.bt", "int x;\nreturn;", &mut host)
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::ReturnOutsideFunction);
    assert_eq!(err.file.as_deref(), Some("test.bt"));
    assert_eq!(err.line, Some(2));
}

// ========== Boundary behaviors ==========

#[test]
fn test_index_at_length_is_out_of_range() {
    let engine = TemplateEngine::new();
    let data = [0u8; 8];
    let mut host = SliceHost::new(&data);
    let err = engine
        .run("test.bt", "uchar a[4]; local int v = a[4];", &mut host)
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::OutOfRangeIndex);
}

#[test]
fn test_negative_index_is_out_of_range() {
    let engine = TemplateEngine::new();
    let data = [0u8; 8];
    let mut host = SliceHost::new(&data);
    let err = engine
        .run(
            "test.bt",
            "uchar a[4]; local int z = 0; local int v = a[z - 1];",
            &mut host,
        )
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::OutOfRangeIndex);
}

#[test]
fn test_short_file_read_surfaces_type_mismatch() {
    // Binding past the end succeeds; consuming the missing value fails.
    let engine = TemplateEngine::new();
    let data = [0x01, 0x02];
    let mut host = SliceHost::new(&data);
    let err = engine
        .run("test.bt", "uint32 x; if (x == 0) { Printf(\"n\"); }", &mut host)
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::TypeMismatch);
    assert!(err.message.contains("file too short"));
}

#[test]
fn test_short_file_binding_alone_succeeds() {
    let data = [0x01, 0x02];
    let host = run("uint32 x;", &data);
    assert_eq!(host.data_types, vec![(0, 4, "u32le".to_string())]);
}

#[test]
fn test_recursive_struct_is_cancelable() {
    let engine = TemplateEngine::new();
    let data = [0u8; 16];
    let mut host = SliceHost::new(&data).abort_after_yields(64);
    let err = engine
        .run_with_options(
            "test.bt",
            "struct R { uchar head; struct R tail; } r;",
            &mut host,
            ExecOptions { yield_interval: 1 },
        )
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::TemplateAborted);
}

// ========== Stats ==========

#[test]
fn test_stats_count_bindings() {
    let engine = TemplateEngine::new();
    let data = [0u8; 16];
    let mut host = SliceHost::new(&data);
    let stats = engine
        .run("test.bt", "int a; uint16 b; uchar c[3];", &mut host)
        .unwrap();
    assert_eq!(stats.variables_bound, 5);
    assert_eq!(stats.bytes_bound, 4 + 2 + 3);
    assert!(stats.stmt_count >= 3);
}
