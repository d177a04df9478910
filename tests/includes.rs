// Include expansion and cross-file source mapping through the engine

use template_lang::{ErrorKind, MapResolver, SliceHost, TemplateEngine};

fn engine_with(files: &[(&str, &str)]) -> TemplateEngine {
    let mut resolver = MapResolver::new();
    for (path, content) in files {
        resolver.add(*path, *content);
    }
    TemplateEngine::with_resolver(resolver)
}

#[test]
fn test_included_types_visible() {
    let engine = engine_with(&[(
        "common.bt",
        "typedef uint32 MAGIC;\ntypedef uint16 VERSION;",
    )]);
    let data = [0u8; 8];
    let mut host = SliceHost::new(&data);
    engine
        .run(
            "root.bt",
            "#include \"common.bt\"\nMAGIC m;\nVERSION v;",
            &mut host,
        )
        .unwrap();
    assert_eq!(
        host.data_types,
        vec![(0, 4, "u32le".to_string()), (4, 2, "u16le".to_string())]
    );
}

#[test]
fn test_included_struct_and_function() {
    let engine = engine_with(&[(
        "lib.bt",
        r#"
struct Pair { uint16 a; uint16 b; };
int sum(int x, int y) { return x + y; }
"#,
    )]);
    let data = [0x01, 0x00, 0x02, 0x00];
    let mut host = SliceHost::new(&data);
    engine
        .run(
            "root.bt",
            "#include \"lib.bt\"\nstruct Pair p;\nPrintf(\"%d\", sum(p.a, p.b));",
            &mut host,
        )
        .unwrap();
    assert_eq!(host.printed, vec!["3"]);
}

#[test]
fn test_nested_includes_execute_in_order() {
    let engine = engine_with(&[
        ("inner.bt", "uchar first;"),
        ("outer.bt", "#include \"inner.bt\"\nuchar second;"),
    ]);
    let data = [0u8; 4];
    let mut host = SliceHost::new(&data);
    engine
        .run("root.bt", "#include \"outer.bt\"\nuchar third;", &mut host)
        .unwrap();
    let names: Vec<&str> = host.comments.iter().map(|(_, _, n)| n.as_str()).collect();
    assert_eq!(names, vec!["first", "second", "third"]);
}

#[test]
fn test_missing_include_reports_including_file() {
    let engine = engine_with(&[("present.bt", "uchar a;")]);
    let data = [0u8; 4];
    let mut host = SliceHost::new(&data);
    let err = engine
        .run(
            "root.bt",
            "#include \"present.bt\"\n#include \"absent.bt\"",
            &mut host,
        )
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Preprocessor);
    assert_eq!(err.file.as_deref(), Some("root.bt"));
    assert_eq!(err.line, Some(2));
}

#[test]
fn test_runtime_error_after_include_maps_to_root() {
    let engine = engine_with(&[("lib.bt", "uchar libvar;")]);
    let data = [0u8; 4];
    let mut host = SliceHost::new(&data);
    let err = engine
        .run(
            "root.bt",
            "#include \"lib.bt\"\nuchar ok;\nUnknownType u;",
            &mut host,
        )
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::UndefinedType);
    assert_eq!(err.file.as_deref(), Some("root.bt"));
    assert_eq!(err.line, Some(3));
}

#[test]
fn test_parse_file_entry_point() {
    let engine = engine_with(&[
        ("main.bt", "#include \"dep.bt\"\nCOUNTER c;"),
        ("dep.bt", "typedef uint16 COUNTER;"),
    ]);
    let template = engine.parse_file("main.bt").unwrap();
    let data = [0u8; 4];
    let mut host = SliceHost::new(&data);
    engine.execute(&template, &mut host).unwrap();
    assert_eq!(host.data_types, vec![(0, 2, "u16le".to_string())]);
}

#[test]
fn test_parse_once_execute_twice() {
    let engine = TemplateEngine::new();
    let template = engine.parse("t.bt", "uint16 x;").unwrap();
    let data = [0u8; 4];

    let mut first = SliceHost::new(&data);
    engine.execute(&template, &mut first).unwrap();
    let mut second = SliceHost::new(&data);
    engine.execute(&template, &mut second).unwrap();

    assert_eq!(first.data_types, second.data_types);
    assert_eq!(first.comments, second.comments);
}
