mod common;

use common::{repo, seed_namespace_with_service, test_db, FakeResolver};
use eve_deploy::plan::build_plan;
use eve_deploy::plan::options::{ArtifactOverride, PlanType};
use eve_deploy::plan::NamespacePlanOptions;

#[tokio::test]
async fn unmatched_override_surfaces_a_message_and_no_services() {
    let db = test_db();
    let fixture = seed_namespace_with_service(&db, Some("1.2.3"), "1");
    let repo = repo(&db);
    let namespace = repo.namespace_by_id(fixture.namespace_id).unwrap();

    let resolver = FakeResolver::new(&[("checkout-api", "1.2.3")]);
    let options = NamespacePlanOptions {
        namespace_requests: vec![],
        artifacts: vec![ArtifactOverride {
            name: "ghost".to_string(),
            requested_version: "1".to_string(),
        }],
        plan_type: PlanType::Application,
        force_deploy: false,
        dry_run: false,
        callback_url: None,
    };

    let plan = build_plan(&repo, &resolver, &namespace, &options).await.unwrap();

    assert!(plan.services.is_empty());
    assert!(
        plan.messages.iter().any(|m| m == "unmatched service: ghost"),
        "expected unmatched-service message, got {:?}",
        plan.messages
    );
}
