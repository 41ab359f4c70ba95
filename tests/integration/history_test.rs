//! Group operations end to end: catalog, loopback agents, history.

use std::sync::Arc;

use agent_fanout::config::CatalogConfig;
use agent_fanout::history::InMemoryHistory;
use agent_fanout::interfaces::ResolutionError;
use agent_fanout::resolver::CatalogResolver;
use agent_fanout::{CoordinatorError, GroupOperations, Target};

use crate::common::{loopback_coordinator, WAIT_LIMIT};

const CATALOG: &str = r#"
consumers:
  - id: web-1
    errata:
      - id: RHSA-2024:1
        type: security
        packages:
          - { name: openssl, arch: x86_64 }
          - { name: openssl, arch: src }
      - id: RHBA-2024:7
        type: bugfix
        packages:
          - { name: bash, arch: x86_64 }
  - id: web-2
    errata:
      - id: RHSA-2024:1
        type: security
        packages:
          - { name: openssl, arch: x86_64 }
  - id: web-3
groups:
  web: [web-1, web-2, web-3]
  exposed: [web-1, web-2]
"#;

fn operations(unreachable: &[&str], history: Arc<InMemoryHistory>) -> GroupOperations {
    let catalog: CatalogConfig = serde_yaml::from_str(CATALOG).unwrap();
    GroupOperations::new(
        Arc::new(CatalogResolver::from_config(&catalog)),
        Arc::new(loopback_coordinator(unreachable, history)),
    )
}

#[tokio::test]
async fn test_install_records_history_for_successes_only() {
    let history = Arc::new(InMemoryHistory::new());
    let ops = operations(&["web-3"], history.clone());

    let handle = ops
        .install_packages("web", vec!["httpd".to_string()])
        .await
        .unwrap();
    let report = tokio::time::timeout(WAIT_LIMIT, handle.wait()).await.unwrap();

    assert_eq!(report.succeeded().len(), 2);
    assert_eq!(
        report.failure_for(&Target::new("web-3")).unwrap().message,
        "agent unreachable"
    );
    assert!(history.entries_for(&Target::new("web-3")).await.is_empty());
    let entry = &history.entries_for(&Target::new("web-1")).await[0];
    assert_eq!(entry.result["installed"], serde_json::json!(["httpd"]));
    assert!(entry.errata_titles.is_empty());
}

#[tokio::test]
async fn test_security_filter_selects_pending_errata() {
    let history = Arc::new(InMemoryHistory::new());
    let ops = operations(&[], history.clone());

    let handle = ops
        .install_errata("web", Vec::new(), vec!["security".to_string()])
        .await
        .unwrap();
    let report = tokio::time::timeout(WAIT_LIMIT, handle.wait()).await.unwrap();

    assert!(report.all_succeeded());
    let web1 = report.result_for(&Target::new("web-1")).unwrap();
    assert_eq!(web1["installed"], serde_json::json!(["openssl"]));
    let web3 = report.result_for(&Target::new("web-3")).unwrap();
    assert_eq!(web3["installed"], serde_json::json!([]));
}

#[tokio::test]
async fn test_named_errata_carry_titles_into_history() {
    let history = Arc::new(InMemoryHistory::new());
    let ops = operations(&[], history.clone());

    let handle = ops
        .install_errata("exposed", vec!["RHSA-2024:1".to_string()], Vec::new())
        .await
        .unwrap();
    tokio::time::timeout(WAIT_LIMIT, handle.wait()).await.unwrap();

    let entries = history.entries_for(&Target::new("web-2")).await;
    assert_eq!(entries[0].errata_titles, vec!["RHSA-2024:1".to_string()]);
    assert_eq!(history.entries().await.len(), 2);
}

#[tokio::test]
async fn test_inapplicable_erratum_rejects_whole_group() {
    let history = Arc::new(InMemoryHistory::new());
    let ops = operations(&[], history.clone());

    let result = ops
        .install_errata("web", vec!["RHSA-2024:1".to_string()], Vec::new())
        .await;

    assert!(matches!(
        result,
        Err(CoordinatorError::Resolution(ResolutionError::ErratumNotApplicable { consumer, .. }))
            if consumer == "web-3"
    ));
    assert_eq!(history.attempts().await, 0);
}

#[tokio::test]
async fn test_history_failure_does_not_block_other_entries() {
    let history = Arc::new(InMemoryHistory::new());
    history.fail_for(Target::new("web-2")).await;
    let ops = operations(&[], history.clone());

    let handle = ops
        .install_packages("web", vec!["httpd".to_string()])
        .await
        .unwrap();
    let report = tokio::time::timeout(WAIT_LIMIT, handle.wait()).await.unwrap();

    assert!(report.all_succeeded());
    assert_eq!(history.attempts().await, 3);
    assert_eq!(history.entries().await.len(), 2);
    assert!(handle.is_complete());
}
