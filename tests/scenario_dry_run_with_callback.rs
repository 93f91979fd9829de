mod common;

use common::{arc, repo, seed_namespace_with_service, test_db, FakeBlob, FakeCallback, FakeQueue, FakeResolver};
use eve_deploy::deployment_queue::DeploymentQueue;
use eve_deploy::plan::options::PlanType;
use eve_deploy::plan::NamespacePlanOptions;
use eve_deploy::queue::{Message, CMD_SCHEDULE_DEPLOYMENT};
use std::time::Duration;

#[tokio::test]
async fn dry_run_posts_callback_and_skips_blob_and_scheduler() {
    let db = test_db();
    seed_namespace_with_service(&db, Some("1.2.3"), "1");
    let repo = repo(&db);

    let options = NamespacePlanOptions {
        namespace_requests: vec![],
        artifacts: vec![],
        plan_type: PlanType::Application,
        force_deploy: true,
        dry_run: true,
        callback_url: Some("http://callback.example/plan".to_string()),
    };
    let deployment = repo.create_deployment(1, &serde_json::to_value(&options).unwrap()).unwrap();

    let resolver = arc(FakeResolver::new(&[("checkout-api", "1.2.3")]));
    let queue = arc(FakeQueue::default());
    let blob = arc(FakeBlob::default());
    let callback = arc(FakeCallback::default());

    let worker = DeploymentQueue::new(
        repo,
        resolver,
        queue.clone(),
        blob.clone(),
        callback.clone(),
        "https://sqs.example/inbound".to_string(),
        10,
        20,
        300,
        Duration::from_secs(30),
    );

    let mut message = Message::new(deployment.id, "deploy-checkout".to_string(), CMD_SCHEDULE_DEPLOYMENT, serde_json::Value::Null);
    message.receipt_handle = Some("rh-1".to_string());

    worker.handle_message(message).await.expect("dry run should succeed");

    let received = callback.received.lock().unwrap();
    assert_eq!(received.len(), 1, "callback should receive the fully-populated plan");
    assert_eq!(received[0].0, "http://callback.example/plan");
    assert_eq!(received[0].1.services.len(), 1, "dry run still materializes the full plan");
    assert_eq!(received[0].1.status, eve_deploy::plan::model::PlanStatus::Dryrun);

    assert!(blob.uploads.lock().unwrap().is_empty(), "dry run must not upload a blob");
    assert!(queue.sent.lock().unwrap().is_empty(), "dry run must not forward to the scheduler");

    let deleted = queue.deleted.lock().unwrap();
    assert_eq!(deleted.len(), 1, "the inbound message must be deleted on dry run");
    assert_eq!(deleted[0].1.id, deployment.id);
}
