use dev_overlay::diagnostics::parser::{parse_compile_error, CompilerDiagnostic, DiagnosticLocation};

fn diagnostic(module_name: &str, loc: Option<&str>, message: &str) -> CompilerDiagnostic {
    CompilerDiagnostic {
        module_name: module_name.to_string(),
        loc: loc.map(|s| s.to_string()),
        message: message.to_string(),
    }
}

#[test]
fn compiler_location_family_shifts_both_axes_by_one() {
    let locations = parse_compile_error(&diagnostic(
        "./loader!./app/Foo.js",
        None,
        "Module build failed: SyntaxError: app/Foo.js: Unexpected token (3:5)",
    ));
    assert_eq!(
        locations,
        vec![DiagnosticLocation {
            file_uri: "./app/Foo.js".to_string(),
            line: 4,
            column: 6,
        }]
    );
}

#[test]
fn style_loader_family_discounts_two_header_lines() {
    let locations = parse_compile_error(&diagnostic(
        "./css-loader!./app/styles.css",
        None,
        "Module build failed:\napp/styles.css: missing semicolon (line 12, column 3)",
    ));
    assert_eq!(
        locations,
        vec![DiagnosticLocation {
            file_uri: "./app/styles.css".to_string(),
            line: 10,
            column: 4,
        }]
    );
}

#[test]
fn explicit_loc_wins_over_message_scanning() {
    let locations = parse_compile_error(&diagnostic(
        "./app/Bar.js",
        Some("3:5"),
        "something entirely unrelated",
    ));
    assert_eq!(
        locations,
        vec![DiagnosticLocation {
            file_uri: "./app/Bar.js".to_string(),
            line: 4,
            column: 6,
        }]
    );
}

#[test]
fn explicit_loc_column_ranges_take_the_first_column() {
    let locations = parse_compile_error(&diagnostic("./app/Bar.js", Some("7:0-12"), ""));
    assert_eq!(locations[0].line, 8);
    assert_eq!(locations[0].column, 1);
}

#[test]
fn ansi_color_codes_are_stripped_before_matching() {
    let locations = parse_compile_error(&diagnostic(
        "./app/Foo.js",
        None,
        "\u{1b}[31mapp/Foo.js: Unexpected token (3:5)\u{1b}[0m",
    ));
    assert_eq!(locations.len(), 1);
    assert_eq!(locations[0].line, 4);
}

#[test]
fn empty_module_name_fails_parsing() {
    assert!(parse_compile_error(&diagnostic("", None, "anything (1:1)")).is_empty());
}

#[test]
fn message_without_the_module_name_yields_nothing() {
    assert!(parse_compile_error(&diagnostic(
        "./app/Foo.js",
        None,
        "some other file: problem (3:5)",
    ))
    .is_empty());
}

#[test]
fn unmatched_location_shapes_yield_nothing() {
    assert!(parse_compile_error(&diagnostic(
        "./app/Foo.js",
        None,
        "app/Foo.js: something went wrong, no location here",
    ))
    .is_empty());
}
