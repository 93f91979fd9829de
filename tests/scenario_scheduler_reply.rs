mod common;

use common::{arc, repo, seed_namespace_with_service, test_db, FakeBlob, FakeCallback, FakeQueue, FakeResolver};
use eve_deploy::db::deployment::DeploymentState;
use eve_deploy::deployment_queue::DeploymentQueue;
use eve_deploy::plan::options::PlanType;
use eve_deploy::plan::NamespacePlanOptions;
use eve_deploy::queue::{Message, CMD_UPDATE_DEPLOYMENT};
use std::time::Duration;

#[tokio::test]
async fn scheduler_reply_completes_deployment_and_releases_both_handles() {
    let db = test_db();
    seed_namespace_with_service(&db, Some("1.0.0"), "1");
    let repo = repo(&db);

    let options = NamespacePlanOptions {
        namespace_requests: vec![],
        artifacts: vec![],
        plan_type: PlanType::Application,
        force_deploy: false,
        dry_run: false,
        callback_url: None,
    };
    let deployment = repo.create_deployment(1, &serde_json::to_value(&options).unwrap()).unwrap();
    repo.update_deployment_receipt_handle(deployment.id, "original-receipt").unwrap();

    let resolver = arc(FakeResolver::new(&[]));
    let queue = arc(FakeQueue::default());
    let blob = arc(FakeBlob::default());
    let callback = arc(FakeCallback::default());

    let worker = DeploymentQueue::new(
        repo.clone(),
        resolver,
        queue.clone(),
        blob,
        callback,
        "https://sqs.example/inbound".to_string(),
        10,
        20,
        300,
        Duration::from_secs(30),
    );

    let mut update_message = Message::new(
        deployment.id,
        "deploy-checkout".to_string(),
        CMD_UPDATE_DEPLOYMENT,
        serde_json::json!({ "status": "ok" }),
    );
    update_message.receipt_handle = Some("update-receipt".to_string());

    worker.handle_message(update_message).await.expect("scheduler reply should succeed");

    let updated = repo.get_deployment(deployment.id).unwrap();
    assert_eq!(updated.state, DeploymentState::Completed);

    let deleted = queue.deleted.lock().unwrap();
    assert_eq!(deleted.len(), 2, "both the original schedule message and the reply must be deleted");
    assert!(deleted.iter().any(|(_, m)| m.receipt_handle.as_deref() == Some("original-receipt")));
    assert!(deleted.iter().any(|(_, m)| m.receipt_handle.as_deref() == Some("update-receipt")));
}

#[tokio::test]
async fn scheduler_error_reply_marks_deployment_errored() {
    let db = test_db();
    seed_namespace_with_service(&db, Some("1.0.0"), "1");
    let repo = repo(&db);

    let options = NamespacePlanOptions {
        namespace_requests: vec![],
        artifacts: vec![],
        plan_type: PlanType::Application,
        force_deploy: false,
        dry_run: false,
        callback_url: None,
    };
    let deployment = repo.create_deployment(1, &serde_json::to_value(&options).unwrap()).unwrap();
    repo.update_deployment_receipt_handle(deployment.id, "original-receipt").unwrap();

    let resolver = arc(FakeResolver::new(&[]));
    let queue = arc(FakeQueue::default());
    let blob = arc(FakeBlob::default());
    let callback = arc(FakeCallback::default());

    let worker = DeploymentQueue::new(
        repo.clone(),
        resolver,
        queue,
        blob,
        callback,
        "https://sqs.example/inbound".to_string(),
        10,
        20,
        300,
        Duration::from_secs(30),
    );

    let mut update_message = Message::new(
        deployment.id,
        "deploy-checkout".to_string(),
        CMD_UPDATE_DEPLOYMENT,
        serde_json::json!({ "status": "error", "reason": "timed out" }),
    );
    update_message.receipt_handle = Some("update-receipt".to_string());

    worker.handle_message(update_message).await.expect("scheduler error reply should still succeed");

    let updated = repo.get_deployment(deployment.id).unwrap();
    assert_eq!(updated.state, DeploymentState::Errored);
}
