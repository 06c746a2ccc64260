//! End-to-end behavior of every provider adapter through the factory,
//! against canned API responses.

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::assertion_helpers::error_kind;
use common::test_fixtures::{self, GUIDE_TEXT};
use pretty_assertions::assert_eq;
use scm_bridge::testing::FakeTransport;
use scm_bridge::{EntryType, ErrorKind, ProviderKind, RequestContext, ScmClientError, ScmFactory};

#[tokio::test]
async fn test_merged_pull_request_lists_changed_files() {
    for kind in ProviderKind::ALL {
        let (transport, _) = test_fixtures::provider(kind);
        let client = test_fixtures::connect(kind, transport).await;

        let changed = client
            .changed_files_in_pull_request(&RequestContext::default(), 42)
            .await
            .unwrap_or_else(|e| panic!("{}: {}", kind, e));

        assert_eq!(changed.len(), 2, "{}", kind);
        assert!(changed.contains("src/a.go"), "{}", kind);
        assert!(changed.contains("README.md"), "{}", kind);
    }
}

#[tokio::test]
async fn test_open_pull_request_is_unresolved() {
    for kind in ProviderKind::ALL {
        let (transport, _) = test_fixtures::provider(kind);
        let client = test_fixtures::connect(kind, transport).await;

        let result = client
            .changed_files_in_pull_request(&RequestContext::default(), 7)
            .await;
        assert_eq!(error_kind(result), ErrorKind::UnresolvedMergeState, "{}", kind);
    }
}

#[tokio::test]
async fn test_unknown_pull_request_is_not_found() {
    let (transport, _) = test_fixtures::provider(ProviderKind::GitHub);
    let client = test_fixtures::connect(ProviderKind::GitHub, transport).await;

    let result = client
        .changed_files_in_pull_request(&RequestContext::default(), 999)
        .await;
    assert_error_kind!(result, ErrorKind::NotFound);
}

#[tokio::test]
async fn test_diff_between_refs() {
    for kind in ProviderKind::ALL {
        let (transport, _) = test_fixtures::provider(kind);
        let client = test_fixtures::connect(kind, transport).await;

        let result = client
            .changed_files_in_diff(&RequestContext::default(), "main", "feature")
            .await;

        if kind.supports_ref_diff() {
            let changed = result.unwrap_or_else(|e| panic!("{}: {}", kind, e));
            assert_eq!(changed.paths(), &["src/a.go"], "{}", kind);
        } else {
            assert_eq!(error_kind(result), ErrorKind::Unsupported, "{}", kind);
        }
    }
}

#[tokio::test]
async fn test_file_contents_at_ref() {
    for kind in ProviderKind::ALL {
        let (transport, _) = test_fixtures::provider(kind);
        let client = test_fixtures::connect(kind, transport).await;

        let content = client
            .get_file_contents(&RequestContext::default(), "docs/guide.md", "main")
            .await
            .unwrap_or_else(|e| panic!("{}: {}", kind, e));
        assert_eq!(content, GUIDE_TEXT, "{}", kind);
    }
}

#[tokio::test]
async fn test_missing_file_is_not_found() {
    for kind in ProviderKind::ALL {
        let (transport, _) = test_fixtures::provider(kind);
        let client = test_fixtures::connect(kind, transport).await;

        let result = client
            .get_file_contents(&RequestContext::default(), "docs/missing.md", "main")
            .await;
        match result {
            Err(ScmClientError::NotFound { resource }) => {
                assert!(resource.contains("docs/missing.md"), "{}: {}", kind, resource)
            }
            other => panic!("{}: expected NotFound, got {:?}", kind, other),
        }
    }
}

#[tokio::test]
async fn test_directory_listing() {
    for kind in ProviderKind::ALL {
        let (transport, _) = test_fixtures::provider(kind);
        let client = test_fixtures::connect(kind, transport).await;

        let mut entries = client
            .get_file_listing(&RequestContext::default(), "docs", "main")
            .await
            .unwrap_or_else(|e| panic!("{}: {}", kind, e));
        entries.sort_by(|a, b| a.path.cmp(&b.path));

        let summary: Vec<_> = entries
            .iter()
            .map(|entry| (entry.path.as_str(), entry.name.as_str(), entry.entry_type))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("docs/guide.md", "guide.md", EntryType::File),
                ("docs/img", "img", EntryType::Directory),
            ],
            "{}",
            kind
        );
    }
}

#[tokio::test]
async fn test_rejected_token_fails_with_correlation_id() {
    let transport = FakeTransport::new()
        .with_json("/api/v1/version", serde_json::json!({ "version": "1.21.4" }))
        .with_status("/api/v1/user", 401);
    let (_, server) = test_fixtures::provider(ProviderKind::Gitea);
    let ctx = RequestContext::default();

    let err = ScmFactory::create_client_with_transport(
        ProviderKind::Gitea,
        &ctx,
        &server,
        Arc::new(transport),
        test_fixtures::repository(),
        true,
    )
    .await
    .err()
    .unwrap();

    assert_eq!(err.kind(), ErrorKind::Connection);
    let message = err.to_string();
    assert!(message.starts_with(&format!("[{}]", ctx.correlation_id())), "{}", message);
    assert!(message.contains("Unable to connect to gitea"), "{}", message);
}

#[tokio::test]
async fn test_missing_repository_fails_to_connect() {
    for kind in ProviderKind::ALL {
        let (_, server) = test_fixtures::provider(kind);
        let result = ScmFactory::create_client_with_transport(
            kind,
            &RequestContext::default(),
            &server,
            Arc::new(FakeTransport::new().with_json(
                "/api/v1/version",
                serde_json::json!({ "version": "1.21.4" }),
            )),
            test_fixtures::repository(),
            false,
        )
        .await;
        assert_eq!(error_kind(result), ErrorKind::Connection, "{}", kind);
    }
}

#[tokio::test]
async fn test_deadline_aborts_slow_request() {
    let transport = test_fixtures::github().with_delay(Duration::from_millis(50));
    let client = test_fixtures::connect(ProviderKind::GitHub, transport).await;

    let ctx = RequestContext::default().with_timeout(Duration::from_millis(5));
    let result = client.get_file_contents(&ctx, "docs/guide.md", "main").await;
    assert_error_kind!(result, ErrorKind::DeadlineExceeded);
}

#[tokio::test]
async fn test_cancellation_aborts_in_flight_request() {
    let transport = test_fixtures::gitlab().with_delay(Duration::from_millis(50));
    let client = test_fixtures::connect(ProviderKind::GitLab, transport).await;

    let ctx = RequestContext::default();
    let canceller = ctx.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(10)).await;
        canceller.cancel();
    });

    let result = client.changed_files_in_pull_request(&ctx, 42).await;
    assert_error_kind!(result, ErrorKind::Canceled);
}

#[tokio::test]
async fn test_client_is_shared_across_tasks() {
    let transport = test_fixtures::bitbucket();
    let client = test_fixtures::connect(ProviderKind::Bitbucket, transport.clone()).await;
    let before = transport.request_count();

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let client = Arc::clone(&client);
            tokio::spawn(async move {
                client
                    .get_file_contents(&RequestContext::default(), "docs/guide.md", "main")
                    .await
            })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.await.unwrap().unwrap(), GUIDE_TEXT);
    }
    // Meta lookup plus raw download per call.
    assert_eq!(transport.request_count() - before, 16);
}
