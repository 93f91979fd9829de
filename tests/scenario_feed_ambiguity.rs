mod common;

use common::{repo, test_db, FakeResolver};
use eve_deploy::plan::build_plan;
use eve_deploy::plan::options::PlanType;
use eve_deploy::plan::NamespacePlanOptions;
use rusqlite::params;

#[tokio::test]
async fn artifact_with_no_matching_feed_is_omitted_without_error() {
    let db = test_db();
    let conn = db.pool.get().unwrap();

    conn.execute(
        "INSERT INTO environment (id, name, alias, description, metadata) VALUES (1, 'prod', NULL, '', '{}')",
        params![],
    )
    .unwrap();
    conn.execute(
        "INSERT INTO cluster (id, name, provider_group, sch_queue_url) VALUES (1, 'main', 'acme', 'https://sqs.example/scheduler')",
        params![],
    )
    .unwrap();
    conn.execute(
        "INSERT INTO namespace (id, name, alias, environment_id, cluster_id, requested_version, explicit_deploy_only, metadata)
         VALUES (1, 'checkout', NULL, 1, 1, '1', FALSE, '{}')",
        params![],
    )
    .unwrap();
    // Only a `docker` feed is mapped to the environment.
    conn.execute(
        "INSERT INTO feed (id, name, feed_type) VALUES (1, 'stable', 'docker')",
        params![],
    )
    .unwrap();
    conn.execute(
        "INSERT INTO environment_feed_map (environment_id, feed_id) VALUES (1, 1)",
        params![],
    )
    .unwrap();
    // The artifact is `npm`, so no feed in this environment matches its type.
    conn.execute(
        "INSERT INTO artifact (id, name, provider_group, feed_type, function_pointer, metadata)
         VALUES (1, 'checkout-lib', 'team-platform', 'npm', NULL, '{}')",
        params![],
    )
    .unwrap();
    conn.execute(
        "INSERT INTO service (id, namespace_id, artifact_id, name, override_version, deployed_version, metadata, sticky_sessions, node_group, count)
         VALUES (1, 1, 1, 'checkout-lib', '', NULL, '{}', FALSE, '', 1)",
        params![],
    )
    .unwrap();
    drop(conn);

    let repo = repo(&db);
    let namespace = repo.namespace_by_id(1).unwrap();
    let resolver = FakeResolver::new(&[("checkout-lib", "2.0.0")]);
    let options = NamespacePlanOptions {
        namespace_requests: vec![],
        artifacts: vec![],
        plan_type: PlanType::Application,
        force_deploy: false,
        dry_run: false,
        callback_url: None,
    };

    let plan = build_plan(&repo, &resolver, &namespace, &options).await.expect("plan should build without error");

    assert!(plan.services.is_empty(), "artifact with no matching feed must be omitted");
    assert!(plan.messages.is_empty(), "omission is silent, not surfaced as a message");
}
