mod common;

use common::{arc, repo, seed_namespace_with_service, test_db, FakeBlob, FakeCallback, FakeQueue, FakeResolver};
use eve_deploy::deployment_queue::DeploymentQueue;
use eve_deploy::plan::options::PlanType;
use eve_deploy::plan::{NSDeploymentPlan, NamespacePlanOptions};
use eve_deploy::queue::{Message, CMD_SCHEDULE_DEPLOYMENT};
use std::time::Duration;

#[tokio::test]
async fn force_deploy_includes_an_already_current_service() {
    let db = test_db();
    seed_namespace_with_service(&db, Some("1.2.3"), "1");
    let repo = repo(&db);

    let options = NamespacePlanOptions {
        namespace_requests: vec![],
        artifacts: vec![],
        plan_type: PlanType::Application,
        force_deploy: true,
        dry_run: false,
        callback_url: None,
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
        callback,
        "https://sqs.example/inbound".to_string(),
        10,
        20,
        300,
        Duration::from_secs(30),
    );

    let mut message = Message::new(deployment.id, "deploy-checkout".to_string(), CMD_SCHEDULE_DEPLOYMENT, serde_json::Value::Null);
    message.receipt_handle = Some("rh-1".to_string());

    worker.handle_message(message).await.expect("schedule should succeed");

    let uploads = blob.uploads.lock().unwrap();
    let plan: NSDeploymentPlan = serde_json::from_slice(&uploads[0].1).unwrap();
    assert_eq!(plan.services.len(), 1);
    let entry = &plan.services[0];
    assert_eq!(entry.available_version, "1.2.3");
    assert_eq!(entry.deployed_version, "1.2.3");
    assert_eq!(entry.artifact_name, "checkout-api");
}
