#![allow(clippy::disallowed_methods)]

mod common;

use std::sync::Arc;

use queue_core::Message;
use queue_worker::{
    DrainReport, HandlerDeclaration, InMemoryQueue, MemoryLogger, Queue, WorkerConfig,
    WorkerMessage, spawn_worker,
};
use ractor::rpc::{CallResult, call};
use serde_json::json;

use common::{FakeHandler, create_worker, fake_container};

#[tokio::test]
async fn drains_queue_and_marks_messages_done() -> Result<(), Box<dyn std::error::Error>> {
    let handler = Arc::new(FakeHandler::default());
    let worker = create_worker(
        vec![
            ("simple", HandlerDeclaration::service::<FakeHandler>()),
            (
                "broken",
                HandlerDeclaration::service_method::<FakeHandler>("execute_with_exception"),
            ),
        ],
        Arc::new(MemoryLogger::new()),
        fake_container(handler.clone()),
    )
    .with_config(WorkerConfig::default().with_worker_id("drain-test"));

    let queue = Arc::new(InMemoryQueue::new("default"));
    let first = queue.push(Message::new("simple", json!(1))).await?;
    queue.push(Message::new("broken", json!(2))).await?;
    queue.push(Message::new("simple", json!(3))).await?;

    let (actor, handle) = spawn_worker(Arc::new(worker), queue.clone()).await?;

    let report = match call(&actor, |reply| WorkerMessage::Drain { reply }, None).await? {
        CallResult::Success(report) => report,
        _ => return Err("drain call did not complete".into()),
    };
    assert_eq!(
        report,
        DrainReport {
            succeeded: 2,
            failed: 1
        }
    );
    assert_eq!(report.processed(), 3);
    assert!(queue.is_empty().await);
    assert_eq!(handler.processed().len(), 2);

    let id = first.id.expect("push assigns an id");
    assert!(queue.status(&id).await?.is_done());

    actor.send_message(WorkerMessage::Shutdown)?;
    handle.await?;
    Ok(())
}

#[tokio::test]
async fn replies_with_job_failure() -> Result<(), Box<dyn std::error::Error>> {
    let worker = create_worker(
        vec![(
            "simple",
            HandlerDeclaration::service_method::<FakeHandler>("execute_with_exception"),
        )],
        Arc::new(MemoryLogger::new()),
        fake_container(Arc::default()),
    )
    .with_config(WorkerConfig::default().with_worker_id("reply-test"));

    let queue = Arc::new(InMemoryQueue::new("default"));
    let (actor, handle) = spawn_worker(Arc::new(worker), queue).await?;

    let message = Box::new(Message::new("simple", json!(["test-data"])));
    let outcome = match call(&actor, |reply| WorkerMessage::Process { message, reply }, None).await? {
        CallResult::Success(outcome) => outcome,
        _ => return Err("process call did not complete".into()),
    };
    let failure = outcome.expect_err("handler always fails");
    assert_eq!(failure.queue_message().data, json!(["test-data"]));

    let stats = match call(&actor, |reply| WorkerMessage::GetStats { reply }, None).await? {
        CallResult::Success(stats) => stats,
        _ => return Err("stats call did not complete".into()),
    };
    assert_eq!(stats.failed, 1);

    actor.send_message(WorkerMessage::Shutdown)?;
    handle.await?;
    Ok(())
}

#[tokio::test]
async fn direct_processing_leaves_queue_status_alone() -> Result<(), Box<dyn std::error::Error>> {
    let worker = create_worker(
        vec![("simple", HandlerDeclaration::service::<FakeHandler>())],
        Arc::new(MemoryLogger::new()),
        fake_container(Arc::default()),
    )
    .with_config(WorkerConfig::default().with_worker_id("direct-test"));

    let queue = Arc::new(InMemoryQueue::new("default"));
    let pushed = queue.push(Message::new("simple", json!(1))).await?;
    let id = pushed.id.clone().expect("push assigns an id");

    let (actor, handle) = spawn_worker(Arc::new(worker), queue.clone()).await?;
    let message = Box::new(pushed);
    let outcome = match call(&actor, |reply| WorkerMessage::Process { message, reply }, None).await? {
        CallResult::Success(outcome) => outcome,
        _ => return Err("process call did not complete".into()),
    };
    assert!(outcome.is_ok());

    assert!(queue.status(&id).await?.is_waiting());
    assert_eq!(queue.len().await, 1);

    actor.send_message(WorkerMessage::Shutdown)?;
    handle.await?;
    Ok(())
}
