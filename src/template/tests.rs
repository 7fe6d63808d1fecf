use serde_json::json;

use super::*;

fn render(source: &str, context: serde_json::Value) -> String {
    Template::parse(source).unwrap().render(&context).unwrap()
}

// ============================================================================
// Substitution
// ============================================================================

#[test]
fn test_substitutes_fields() {
    assert_eq!(
        render("crit [[ crit ]] on [[app]]", json!({"crit": 1000, "app": "svc"})),
        "crit 1000 on svc"
    );
}

#[test]
fn test_engine_expressions_pass_through() {
    let source = "'{{ index .Fields \"app\" }} [[ app ]] {{ .Level }}'";
    assert_eq!(
        render(source, json!({"app": "svc"})),
        "'{{ index .Fields \"app\" }} svc {{ .Level }}'"
    );
}

#[test]
fn test_values_are_not_html_escaped() {
    assert_eq!(
        render("[[ filter ]]", json!({"filter": "=~ /<web>.*/"})),
        "=~ /<web>.*/"
    );
}

#[test]
fn test_missing_field_is_an_error() {
    let template = Template::parse("[[ nope ]]").unwrap();
    assert!(matches!(
        template.render(&json!({})),
        Err(TemplateError::Render(_))
    ));
}

// ============================================================================
// Blocks
// ============================================================================

#[test]
fn test_if_emits_block_only_for_non_empty_values() {
    let source = "a[% if slack %]<[[ slack ]]>[% endif %]b";
    assert_eq!(render(source, json!({"slack": "#ops"})), "a<#ops>b");
    assert_eq!(render(source, json!({"slack": ""})), "ab");
    assert_eq!(render(source, json!({"slack": null})), "ab");
}

#[test]
fn test_else_branch() {
    let source = "[% if on %]yes[% else %]no[% endif %]";
    assert_eq!(render(source, json!({"on": true})), "yes");
    assert_eq!(render(source, json!({"on": false})), "no");
}

#[test]
fn test_for_repeats_block_per_element() {
    let source = "[% for email in emails %](.email('[[ email ]]'))[% endfor %]";
    assert_eq!(
        render(source, json!({"emails": ["a@x.io", "b@x.io"]})),
        "(.email('a@x.io'))(.email('b@x.io'))"
    );
    assert_eq!(render(source, json!({"emails": []})), "");
}

#[test]
fn test_standalone_block_lines_are_removed() {
    let source = "start\n    [% if post %]\n    .post('[[ post ]]')\n    [% endif %]\nend\n";
    assert_eq!(
        render(source, json!({"post": "http://hook"})),
        "start\n    .post('http://hook')\nend\n"
    );
    assert_eq!(render(source, json!({"post": ""})), "start\nend\n");
}

#[test]
fn test_inline_blocks_keep_surrounding_text() {
    let source = "x [% if a %]A[% endif %] y\n";
    assert_eq!(render(source, json!({"a": "1"})), "x A y\n");
}

// ============================================================================
// Parse errors
// ============================================================================

#[test]
fn test_unclosed_field_is_rejected() {
    assert!(matches!(
        Template::parse("line\n[[ app"),
        Err(TemplateError::Parse { .. })
    ));
}

#[test]
fn test_unbalanced_blocks_are_rejected() {
    assert!(Template::parse("[% if a %]x").is_err());
    assert!(Template::parse("x[% endif %]").is_err());
    assert!(Template::parse("[% for a in b %]x[% endif %]").is_err());
}

#[test]
fn test_unknown_block_is_rejected() {
    assert!(Template::parse("[% frobnicate a %]x").is_err());
}

#[test]
fn test_bundled_scripts_parse() {
    for source in [
        scripts::MEMORY_USAGE,
        scripts::RATE_ANOMALY,
        scripts::CRASH_EVENT,
        scripts::RELEASE_EVENT,
    ] {
        Template::parse(source).unwrap();
    }
}
