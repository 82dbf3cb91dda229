//! Common fixtures for integration tests.

use graft::rewrite::{CompoundKey, Fragment, FragmentSchema};
use graft::tree::markup::parse_element;
use graft::{Document, DocumentKind};

/// A build file whose annotation processor list holds `paths` verbatim.
#[allow(dead_code)]
pub fn pom(path: &str, paths: &str) -> Document {
    let root = parse_element(&format!(
        "<project>\
           <modelVersion>4.0.0</modelVersion>\
           <build><plugins><plugin>\
             <artifactId>maven-compiler-plugin</artifactId>\
             <configuration><annotationProcessorPaths>{paths}</annotationProcessorPaths></configuration>\
           </plugin></plugins></build>\
         </project>"
    ))
    .expect("fixture must parse");
    Document::new(path, DocumentKind::Markup, root)
}

/// A source file; its contents never matter to the recipes under test.
#[allow(dead_code)]
pub fn source(path: &str) -> Document {
    let root = parse_element("<unit/>").expect("fixture must parse");
    Document::new(path, DocumentKind::Source, root)
}

#[allow(dead_code)]
pub fn gav_key(group: &str, artifact: &str) -> CompoundKey {
    CompoundKey::new()
        .with("groupId", group)
        .with("artifactId", artifact)
}

#[allow(dead_code)]
pub fn processor(group: &str, artifact: &str, version: &str) -> Fragment {
    Fragment::new(gav_key(group, artifact)).with_value("version", version)
}

#[allow(dead_code)]
pub fn path_schema() -> FragmentSchema {
    FragmentSchema::new("path")
}

#[allow(dead_code)]
pub const PROCESSOR_PATHS: &str =
    "/project/build/plugins/plugin/configuration/annotationProcessorPaths";
