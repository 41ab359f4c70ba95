//! Concurrent reply handling.
//!
//! Replies race each other from many tasks; the task must still complete
//! exactly once with every target accounted for.

use std::sync::Arc;

use futures::future::join_all;
use serde_json::json;
use tokio::sync::Barrier;

use agent_fanout::channel::QueuedChannel;
use agent_fanout::fanout::TaskOptions;
use agent_fanout::history::InMemoryHistory;
use agent_fanout::{Coordinator, RemoteFailure, Target, TaskKind};

use crate::common::{loopback_coordinator, targets, TallyFinalizer, WAIT_LIMIT};

/// Racing replies finalize once with a complete report.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_racing_replies_finalize_once() {
    let (channel, mut calls) = QueuedChannel::new();
    let finalizer = Arc::new(TallyFinalizer::default());
    let coordinator = Coordinator::new(
        Arc::new(channel),
        finalizer.clone(),
        TaskOptions::default(),
    );

    let ids: Vec<String> = (0..50).map(|i| format!("c{}", i)).collect();
    let id_refs: Vec<&str> = ids.iter().map(String::as_str).collect();
    let handle = coordinator
        .submit(TaskKind::InstallPackages, targets(&id_refs, "pkgX"))
        .await
        .unwrap();

    let barrier = Arc::new(Barrier::new(ids.len()));
    let mut replies = Vec::new();
    for i in 0..ids.len() {
        let call = calls.recv().await.unwrap();
        let barrier = Arc::clone(&barrier);
        replies.push(tokio::spawn(async move {
            barrier.wait().await;
            if i % 5 == 0 {
                call.reply.fail(RemoteFailure::new("disk full")).await;
            } else {
                call.reply.succeed(json!(i)).await;
            }
        }));
    }

    for joined in join_all(replies).await {
        joined.unwrap();
    }

    let report = tokio::time::timeout(WAIT_LIMIT, handle.wait()).await.unwrap();
    assert_eq!(report.succeeded().len(), 40);
    assert_eq!(report.failed().len(), 10);
    assert_eq!(finalizer.calls(), 1);
    assert_eq!(handle.status().await.pending, 0);
}

/// Independent tasks on one coordinator do not share replies.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_parallel_tasks_are_isolated() {
    let history = Arc::new(InMemoryHistory::new());
    let coordinator = Arc::new(loopback_coordinator(&["b2"], history.clone()));

    let submissions = [("a", &["a1", "a2"][..]), ("b", &["b1", "b2", "b3"][..])]
        .into_iter()
        .map(|(package, ids)| {
            let coordinator = Arc::clone(&coordinator);
            let pairs = targets(ids, package);
            async move {
                let handle = coordinator
                    .submit(TaskKind::InstallPackages, pairs)
                    .await
                    .unwrap();
                tokio::time::timeout(WAIT_LIMIT, handle.wait()).await.unwrap()
            }
        });
    let reports = join_all(submissions).await;

    assert_eq!(reports[0].total(), 2);
    assert!(reports[0].all_succeeded());
    assert_eq!(reports[1].total(), 3);
    assert_eq!(reports[1].failed()[0].target, Target::new("b2"));
    assert_eq!(history.entries().await.len(), 4);
}
