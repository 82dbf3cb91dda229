mod common;

use common::{PROCESSOR_PATHS, pom, source};
use graft::rewrite::{and, gate, not, or};
use graft::tree::{VisitContext, visit_document};
use graft::{Document, DocumentKind, ExecutionContext, Node, Precondition, Visitor};

/// Tags the root element so tests can tell whether the visitor ran.
struct Tag;

impl Visitor for Tag {
    fn visit_element(&mut self, node: &Node, cx: &mut VisitContext<'_>) -> Option<Node> {
        if cx.cursor().depth() == 1 {
            return Some(node.with_attribute("tagged", "yes"));
        }
        Some(node.clone())
    }
}

fn tagged(p: &Precondition, document: &Document) -> bool {
    let out = visit_document(document.clone(), &mut gate(p.clone(), Tag), &ExecutionContext::new());
    !Document::ptr_eq(document, &out)
}

#[test]
fn test_gate_truth_table() {
    let document = pom("pom.xml", "");
    let t = Precondition::check(true);
    let f = Precondition::check(false);
    for (a, b) in [(&t, &t), (&t, &f), (&f, &t), (&f, &f)] {
        let (x, y) = (a.evaluate(&document), b.evaluate(&document));
        assert_eq!(tagged(&and([a.clone(), b.clone()]), &document), x && y);
        assert_eq!(tagged(&or([a.clone(), b.clone()]), &document), x || y);
        assert_eq!(tagged(&not(a.clone()), &document), !x);
    }
}

#[test]
fn test_build_file_with_processor_list() {
    let is_build_file = and([
        Precondition::kind(DocumentKind::Markup),
        Precondition::source_path("**/pom.xml").unwrap(),
        Precondition::has_path(PROCESSOR_PATHS).unwrap(),
    ]);
    assert!(tagged(&is_build_file, &pom("service/pom.xml", "")));
    assert!(!tagged(&is_build_file, &pom("service/build.xml", "")));
    assert!(!tagged(&is_build_file, &source("service/pom.xml")));
    assert!(!tagged(&!is_build_file.clone(), &pom("pom.xml", "")));
}

#[test]
fn test_malformed_patterns_fail_at_construction() {
    let glob = Precondition::source_path("**/{a,b").unwrap_err();
    assert!(glob.is_fatal());
    let path = Precondition::has_path("project/build").unwrap_err();
    assert!(path.is_fatal());
}
