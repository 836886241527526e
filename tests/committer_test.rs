mod common;

use common::{fast_commit_config, new_page, paragraphs};
use sn2n::commit::{CommitError, Committer, Container};
use sn2n::host::{CallKind, HostCall, HostError, MemoryHost};

#[tokio::test]
async fn new_page_with_250_blocks_takes_three_calls() {
    let host = MemoryHost::new();
    let config = fast_commit_config();

    let report = Committer::new(&host, &config)
        .commit(&new_page("parent-1", "Guide"), &paragraphs(250))
        .await
        .unwrap();

    assert_eq!(report.appended, 250);
    assert_eq!(report.calls, 3);
    assert_eq!(
        host.calls(),
        vec![
            HostCall::CreatePage {
                parent: "parent-1".to_string(),
                blocks: 100
            },
            HostCall::Append {
                block_id: report.container_id.clone(),
                blocks: 100
            },
            HostCall::Append {
                block_id: report.container_id.clone(),
                blocks: 50
            },
        ]
    );
    assert_eq!(host.tree(&report.container_id).len(), 250);
}

#[tokio::test]
async fn order_is_preserved_across_batches() {
    let host = MemoryHost::new();
    let page = host.seed_page();
    let config = fast_commit_config();

    Committer::new(&host, &config)
        .commit(&Container::Existing(page.clone()), &paragraphs(205))
        .await
        .unwrap();

    let texts: Vec<String> = host.tree(&page).iter().map(common::text_of).collect();
    let expected: Vec<String> = (0..205).map(|i| format!("Paragraph {i}")).collect();
    assert_eq!(texts, expected);
}

#[tokio::test]
async fn permanent_failure_reports_the_failed_batch() {
    let host = MemoryHost::new();
    host.fail_calls(CallKind::Append, 1, 1, false);
    let config = fast_commit_config();

    let err = Committer::new(&host, &config)
        .commit(&new_page("parent-1", "Guide"), &paragraphs(250))
        .await
        .unwrap_err();

    let CommitError::BatchFailed {
        batch_index,
        committed,
        source,
    } = &err
    else {
        panic!("expected BatchFailed, got {err:?}");
    };
    assert_eq!(*batch_index, 2);
    assert_eq!(*committed, 200);
    assert!(matches!(source, HostError::Rejected { status: 400, .. }));
    // non-transient errors are not retried
    assert_eq!(host.count(CallKind::Append), 2);
}

#[tokio::test]
async fn transient_failures_are_retried() {
    let host = MemoryHost::new();
    host.fail_calls(CallKind::CreatePage, 0, 2, true);
    let config = fast_commit_config();

    let report = Committer::new(&host, &config)
        .commit(&new_page("parent-1", "Guide"), &paragraphs(10))
        .await
        .unwrap();

    assert_eq!(report.calls, 3);
    assert_eq!(host.tree(&report.container_id).len(), 10);
}

#[tokio::test]
async fn retries_give_up_after_max_attempts() {
    let host = MemoryHost::new();
    let page = host.seed_page();
    host.fail_calls(CallKind::Append, 0, 10, true);
    let config = fast_commit_config();

    let err = Committer::new(&host, &config)
        .commit(&Container::Existing(page), &paragraphs(5))
        .await
        .unwrap_err();

    assert_eq!(err.committed(), 0);
    assert_eq!(host.count(CallKind::Append), 3);
}

#[tokio::test]
async fn empty_document_creates_an_empty_page() {
    let host = MemoryHost::new();
    let config = fast_commit_config();

    let report = Committer::new(&host, &config)
        .commit(&new_page("parent-1", "Empty"), &[])
        .await
        .unwrap();

    assert_eq!(report.calls, 1);
    assert!(host.tree(&report.container_id).is_empty());
}
