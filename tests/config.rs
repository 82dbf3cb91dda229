mod common;

use common::{PROCESSOR_PATHS, path_schema, pom};
use graft::rewrite::recipes::MergeFragment;
use graft::rewrite::{FragmentSpec, RewriteErrorKind};
use graft::{RunConfig, run};

const LOMBOK: &str = r#"{
    "key": [
        { "name": "groupId", "value": "org.projectlombok" },
        { "name": "artifactId", "value": "lombok" }
    ],
    "values": [{ "name": "version", "value": "1.18.24" }],
    "exclusions": ["org.slf4j:slf4j-api"]
}"#;

#[test]
fn test_fragment_from_json() {
    let spec: FragmentSpec = serde_json::from_str(LOMBOK).unwrap();
    let recipe = MergeFragment::new(PROCESSOR_PATHS, spec.build().unwrap(), path_schema()).unwrap();
    let config = RunConfig::from_json(r#"{ "workers": 2, "max_iterations": 3 }"#).unwrap();
    let result = run(&recipe, vec![pom("pom.xml", "")], &config).unwrap();
    let document = &result.results[0];
    assert!(document.is_changed());
    assert!(document.warnings().is_empty());
}

#[test]
fn test_unknown_fragment_fields_are_rejected() {
    let err = serde_json::from_str::<FragmentSpec>(r#"{ "key": [], "scope": "test" }"#);
    assert!(err.is_err());
}

#[test]
fn test_bad_run_config_is_fatal() {
    let err = RunConfig::from_json(r#"{ "workers": "many" }"#).unwrap_err();
    assert!(err.is_fatal());
    assert!(matches!(err.kind(), RewriteErrorKind::InvalidConfig(_)));
}
