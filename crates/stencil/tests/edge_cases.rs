//! Edge case tests for stencil
//!
//! Rejected input, missing regions, odd markup and error logging.

use stencil::{Config, MarkupSource, NodeId, ParseError, Producible, RenderState, Template};

// ============================================================================
// LOADING
// ============================================================================

#[test]
fn test_non_markup_rejected() {
    assert!(matches!(Template::load("hello"), Err(ParseError::NotMarkup { .. })));
    assert!(matches!(Template::load(""), Err(ParseError::NotMarkup { .. })));
}

#[test]
fn test_comment_only_rejected() {
    let err = Template::load("<!-- only a comment -->").unwrap_err();
    assert!(matches!(err, ParseError::Malformed { .. }));
    assert!(err.to_string().contains("   1: <!-- only a comment -->"));
}

#[test]
fn test_missing_file() {
    let err = Template::load_file("/nonexistent/stencil/view.html").unwrap_err();
    assert!(matches!(err, ParseError::Io { .. }));
}

#[test]
fn test_producer_propagates_errors() {
    let source = MarkupSource::new("not markup");
    assert!(source.make_template().is_err());
}

// ============================================================================
// MISSING REGIONS
// ============================================================================

#[test]
fn test_unknown_names_are_noops() {
    let mut tpl = Template::load("<p>x</p>").unwrap();
    tpl.set_text("a", "1")
        .append_text("a", "1")
        .prepend_text("a", "1")
        .set_attribute("a", "k", "v")
        .remove_attribute("a", "k")
        .hide("a")
        .replace_html("a", "<i></i>")
        .insert_html("a", "<i></i>")
        .set_title("t");
    assert!(tpl.append_repeat("nope", None).is_none());
    assert!(tpl.prepend_repeat("nope", None).is_none());
    assert!(tpl.append_repeat_into("nope", "v", "other").is_none());
    assert_eq!(tpl.attribute("a", "k"), None);
    assert_eq!(tpl.text("a"), None);
    assert!(tpl.errors().is_empty());
    assert_eq!(tpl.render(), "<p>x</p>");
}

#[test]
fn test_unknown_target_var_for_repeat() {
    let mut tpl = Template::load(r#"<ul><li repeat="r">x</li></ul>"#).unwrap();
    assert!(tpl.append_repeat("r", Some("missing")).is_none());
    assert!(tpl.has_repeat("r"));
    assert_eq!(tpl.render(), "<ul></ul>");
}

#[test]
fn test_stale_node_target() {
    let mut tpl = Template::load("<p>x</p>").unwrap();
    tpl.set_text(NodeId::NONE, "y");
    assert_eq!(tpl.render(), "<p>x</p>");
}

#[test]
fn test_destination_without_var_falls_back() {
    let mut tpl = Template::load(r#"<div var="box"></div><ul><li repeat="row"></li></ul><b repeat="cell">c</b>"#).unwrap();
    // `row` has no var named `box`, so the cell lands in the page's own `box`
    assert!(tpl.append_repeat_into("cell", "box", "row").is_some());
    assert_eq!(tpl.render(), "<div><b>c</b></div><ul></ul>");
}

// ============================================================================
// MARKUP ODDITIES
// ============================================================================

#[test]
fn test_empty_repeat_name_ignored() {
    let mut tpl = Template::load(r#"<p repeat="  ">x</p><p>y</p>"#).unwrap();
    assert!(tpl.repeat_names().is_empty());
    assert_eq!(tpl.render(), "<p>y</p>");
}

#[test]
fn test_duplicate_repeat_name_first_wins() {
    let mut tpl = Template::load(r#"<p repeat="r">1</p><p repeat="r">2</p>"#).unwrap();
    assert_eq!(tpl.repeat_names(), vec!["r"]);
    tpl.append_repeat("r", None);
    assert_eq!(tpl.render(), "<p>1</p>");
}

#[test]
fn test_repeat_with_own_var() {
    let mut tpl = Template::load(r#"<ul><li repeat="row" var="line">x</li></ul>"#).unwrap();
    let row = tpl.repeat_mut("row").unwrap();
    assert!(row.has_var("row"));
    assert!(row.has_var("line"));
    row.set_attribute("line", "class", "odd");
    tpl.append_repeat("row", None);
    assert_eq!(tpl.render(), r#"<ul><li class="odd">x</li></ul>"#);
}

#[test]
fn test_choice_inside_repeat() {
    let mut tpl = Template::load(r#"<ul><li repeat="row"><b choice="new">!</b>item</li></ul>"#).unwrap();
    tpl.append_repeat("row", None);
    tpl.repeat_mut("row").unwrap().show("new");
    tpl.append_repeat("row", None);
    assert_eq!(tpl.render(), "<ul><li>item</li><li><b>!</b>item</li></ul>");
}

#[test]
fn test_ignored_head_tag_stays_in_place() {
    let mut tpl = Template::load(r#"<div></div><script data-stencil-ignore>x()</script>"#).unwrap();
    assert!(tpl.header_queue().is_empty());
    assert_eq!(tpl.render(), "<div></div><script>x()</script>");
}

#[test]
fn test_header_anchor_missing_falls_back() {
    let mut tpl = Template::load("<html><head><title>T</title></head><body></body></html>").unwrap();
    tpl.append_header_before("meta", &[("name", "a")], "", "gone");
    assert_eq!(
        tpl.render(),
        r#"<html><head><meta name="a" /><title>T</title></head><body></body></html>"#
    );
}

#[test]
fn test_custom_hidden_marker() {
    let config = Config {
        hidden_attribute: "data-off".to_string(),
        ..Config::default()
    };
    let mut tpl = Template::load_with(r#"<p choice="c">x</p>"#, config).unwrap();
    assert_eq!(tpl.to_html(false), r#"<p data-off>x</p>"#);
    assert_eq!(tpl.render(), "");
}

#[test]
fn test_html5_fragment_without_structure() {
    let mut tpl = Template::load("<!DOCTYPE html><p var=\"p\"></p>").unwrap();
    tpl.set_text("p", "x");
    let html = tpl.render();
    assert!(html.starts_with("<!DOCTYPE html><html>"));
    assert!(html.contains("<body><p>x</p></body>"));
}

#[test]
fn test_noscript_and_template_survive_render() {
    let mut tpl = Template::load(
        r#"<div var="d"><noscript><img src="x.gif"></noscript><template id="t"><p>inside</p></template></div>"#,
    )
    .unwrap();
    assert_eq!(
        tpl.render(),
        r#"<div><noscript><img src="x.gif" /></noscript><template id="t"><p>inside</p></template></div>"#
    );
}

#[test]
fn test_rows_appended_to_tbody() {
    let mut tpl = Template::load(r#"<table><tbody var="rows"></tbody></table>"#).unwrap();
    tpl.append_html("rows", "<tr><td>A</td></tr>")
        .append_html("rows", "<tr><td>B</td></tr>");
    assert!(tpl.errors().is_empty());
    assert_eq!(
        tpl.render(),
        "<table><tbody><tr><td>A</td></tr><tr><td>B</td></tr></tbody></table>"
    );
}

#[test]
fn test_row_replaced_in_table_context() {
    let mut tpl = Template::load(r#"<table><tbody><tr var="row"><td>old</td></tr></tbody></table>"#).unwrap();
    tpl.replace_html("row", r#"<tr class="x"><td>new</td></tr>"#);
    assert!(tpl.errors().is_empty());
    assert_eq!(
        tpl.render(),
        r#"<table><tbody><tr class="x"><td>new</td></tr></tbody></table>"#
    );
}

#[test]
fn test_options_inserted_into_select() {
    let mut tpl = Template::load(r#"<select var="pick"><option>old</option></select>"#).unwrap();
    tpl.insert_html("pick", r#"<option value="1">One</option><option value="2">Two</option>"#);
    assert_eq!(
        tpl.render(),
        r#"<select><option value="1">One</option><option value="2">Two</option></select>"#
    );
}

#[test]
fn test_script_in_repeat_stays_in_body() {
    let mut tpl = Template::load(
        "<html><head></head><body><ul><li repeat=\"i\"><script>x()</script>i</li></ul></body></html>",
    )
    .unwrap();
    tpl.append_repeat("i", None);
    assert_eq!(
        tpl.render(),
        "<html><head></head><body><ul><li><script>x()</script>i</li></ul></body></html>"
    );
}

#[test]
fn test_script_in_repeat_of_fragment_is_hoisted() {
    let mut tpl = Template::load(r#"<ul><li repeat="i"><script>x()</script>i</li></ul>"#).unwrap();
    tpl.append_repeat("i", None);
    tpl.append_repeat("i", None);
    assert_eq!(tpl.render(), "<script>x()</script><ul><li>i</li><li>i</li></ul>");
}

// ============================================================================
// FRAGMENT ERRORS
// ============================================================================

#[test]
fn test_replace_with_two_roots_logged() {
    let mut tpl = Template::load(r#"<div><p var="p">a</p></div>"#).unwrap();
    tpl.replace_html("p", "<i>1</i><i>2</i>").replace_html("p", "text only");
    assert_eq!(tpl.errors().len(), 2);
    let message = tpl.errors()[0].to_string();
    assert!(message.starts_with(r#"replace_html on var "p" skipped"#));
    assert!(matches!(tpl.errors()[1].source, ParseError::NoSingleRoot { found: 0 }));
    assert_eq!(tpl.render(), "<div><p>a</p></div>");
}

#[test]
fn test_replace_template_with_two_roots_logged() {
    let mut tpl = Template::load(r#"<div var="d"></div>"#).unwrap();
    let other = Template::load("<a></a><b></b>").unwrap();
    tpl.replace_template("d", other);
    assert_eq!(tpl.errors()[0].operation, "replace_template");
    assert_eq!(tpl.render(), "<div></div>");
}

#[test]
fn test_append_empty_markup() {
    let mut tpl = Template::load(r#"<div var="d">a</div>"#).unwrap();
    tpl.append_html("d", "");
    assert!(tpl.errors().is_empty());
    assert_eq!(tpl.render(), "<div>a</div>");
}

// ============================================================================
// STATE
// ============================================================================

#[test]
fn test_state_transitions() {
    let mut tpl = Template::load("<p></p>").unwrap();
    assert_eq!(tpl.state(), RenderState::Editable);
    tpl.to_html(false);
    assert_eq!(tpl.state(), RenderState::Editable);
    tpl.finalize();
    assert_eq!(tpl.state(), RenderState::Frozen);
}

#[test]
fn test_hook_runs_once() {
    use std::cell::Cell;
    use std::rc::Rc;

    let calls = Rc::new(Cell::new(0));
    let counter = Rc::clone(&calls);
    let mut tpl = Template::load("<p></p>").unwrap();
    tpl.on_before_freeze(move |_| counter.set(counter.get() + 1));
    tpl.render();
    tpl.render();
    assert_eq!(calls.get(), 1);
}

#[test]
fn test_into_document_is_frozen() {
    let tpl = Template::load(r#"<p choice="c">x</p><i></i>"#).unwrap();
    let doc = tpl.into_document();
    assert_eq!(doc.root_elements().len(), 1);
}

#[cfg(feature = "serde")]
#[test]
fn test_config_defaults_fill_missing_fields() {
    let config: Config = serde_json::from_str(r#"{"pretty_print": true}"#).unwrap();
    assert!(config.pretty_print);
    assert!(config.strip_cdata);
}
