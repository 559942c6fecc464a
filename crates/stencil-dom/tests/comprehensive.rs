//! Comprehensive tests for stencil-dom
//!
//! Tree building, cross-tree import and normalization.

use stencil_dom::{Attributes, Document, DomTree, NodeData, NodeId};

fn element(tree: &mut DomTree, parent: NodeId, tag: &str) -> NodeId {
    let id = tree.create_element(tag);
    tree.append_child(parent, id);
    id
}

fn tags(tree: &DomTree, parent: NodeId) -> Vec<String> {
    tree.child_ids(parent)
        .into_iter()
        .filter_map(|id| tree.tag_name(id).map(str::to_string))
        .collect()
}

// ============================================================================
// TREE BUILDING
// ============================================================================

#[test]
fn test_append_prepend_insert() {
    let mut tree = DomTree::new();
    let root = tree.root();
    let b = element(&mut tree, root, "b");

    let a = tree.create_element("a");
    tree.prepend_child(root, a);
    let d = element(&mut tree, root, "d");
    let c = tree.create_element("c");
    tree.insert_before(root, c, d);

    assert_eq!(tags(&tree, root), vec!["a", "b", "c", "d"]);
    assert_eq!(tree.parent(b), Some(root));
    assert!(tree.is_attached(c));
}

#[test]
fn test_append_moves_attached_node() {
    let mut tree = DomTree::new();
    let root = tree.root();
    let ul = element(&mut tree, root, "ul");
    let ol = element(&mut tree, root, "ol");
    let li = element(&mut tree, ul, "li");

    tree.append_child(ol, li);

    assert!(tree.child_ids(ul).is_empty());
    assert_eq!(tree.child_ids(ol), vec![li]);
}

#[test]
fn test_replace_detaches_old() {
    let mut tree = DomTree::new();
    let root = tree.root();
    let old = element(&mut tree, root, "p");
    let new = tree.create_element("div");

    tree.replace(old, new);

    assert_eq!(tags(&tree, root), vec!["div"]);
    assert!(!tree.is_attached(old));
    assert!(tree.contains(old));
}

#[test]
fn test_descendants_are_preorder() {
    let mut tree = DomTree::new();
    let root = tree.root();
    let div = element(&mut tree, root, "div");
    let p = element(&mut tree, div, "p");
    let span = element(&mut tree, p, "span");
    let em = element(&mut tree, div, "em");

    assert_eq!(tree.descendants(root), vec![div, p, span, em]);
    assert_eq!(tree.descendants(p), vec![span]);
}

// ============================================================================
// IMPORT AND CLONE
// ============================================================================

#[test]
fn test_import_node_deep_copies() {
    let mut source = DomTree::new();
    let root = source.root();
    let li = element(&mut source, root, "li");
    source.set_attr(li, "class", "row");
    let text = source.create_text("one");
    source.append_child(li, text);

    let mut target = DomTree::new();
    let copy = target.import_node(&source, li);
    assert!(!target.is_attached(copy));
    let target_root = target.root();
    target.append_child(target_root, copy);

    // Editing the source never reaches the copy
    source.set_attr(li, "class", "changed");
    assert_eq!(target.attr(copy, "class"), Some("row"));
    assert_eq!(target.text_content(copy), "one");
}

#[test]
fn test_clone_node_shallow_and_deep() {
    let mut tree = DomTree::new();
    let root = tree.root();
    let div = element(&mut tree, root, "div");
    element(&mut tree, div, "p");

    let shallow = tree.clone_node(div, false);
    let deep = tree.clone_node(div, true);
    assert!(tree.child_ids(shallow).is_empty());
    assert_eq!(tags(&tree, deep), vec!["p"]);
}

// ============================================================================
// TEXT
// ============================================================================

#[test]
fn test_normalize_merges_text() {
    let mut tree = DomTree::new();
    let root = tree.root();
    let p = element(&mut tree, root, "p");
    for part in ["a", "", "b"] {
        let t = tree.create_text(part);
        tree.append_child(p, t);
    }
    let b = element(&mut tree, p, "b");
    let t = tree.create_text("c");
    tree.append_child(p, t);

    tree.normalize(root);

    let children = tree.child_ids(p);
    assert_eq!(children.len(), 3);
    assert_eq!(tree.get(children[0]).and_then(|n| n.as_text()), Some("ab"));
    assert_eq!(children[1], b);
    assert_eq!(tree.text_content(p), "abc");
}

// ============================================================================
// DOCUMENT
// ============================================================================

#[test]
fn test_document_lookups() {
    let mut doc = Document::empty("page.html");
    let tree = doc.tree_mut();
    let root = tree.root();
    let html = element(tree, root, "html");
    let head = element(tree, html, "head");
    let title = element(tree, head, "title");
    let text = tree.create_text("Hello");
    tree.append_child(title, text);
    let body = element(tree, html, "body");
    let p = element(tree, body, "p");
    tree.set_attr(p, "id", "intro");

    assert_eq!(doc.url(), "page.html");
    assert_eq!(doc.title(), "Hello");
    assert_eq!(doc.head(), Some(head));
    assert_eq!(doc.body(), Some(body));
    assert_eq!(doc.get_element_by_id("intro"), Some(p));
    assert_eq!(doc.root_elements(), vec![html]);
}

#[test]
fn test_attributes_keep_order() {
    let mut attrs: Attributes = [("b", "1"), ("a", "2")].into_iter().collect();
    attrs.set("c", "3");
    attrs.set("b", "4");
    attrs.remove("a");

    let pairs: Vec<(&str, &str)> = attrs.iter().map(|a| (a.name.as_str(), a.value.as_str())).collect();
    assert_eq!(pairs, vec![("b", "4"), ("c", "3")]);
}

#[test]
fn test_doctype_node() {
    let mut tree = DomTree::new();
    let id = tree.create_doctype("html", "", "");
    assert!(matches!(tree.get(id).map(|n| &n.data), Some(NodeData::Doctype { name, .. }) if name == "html"));
}
