//! End-to-end tests of the provider against a mocked Vultr API.
//!
//! Every test configures a [`VultrProvider`] pointed at a wiremock server
//! with throttling disabled and short wait timings.

use std::time::Duration;

use serde_json::{json, Value};
use vultr_provider::resources::iso_private::MAX_DETACH_ATTEMPTS;
use vultr_provider::testing::{
    assert_error_contains, assert_plan_changes_attribute, assert_plan_no_changes,
    assert_plan_replaces, assert_plan_updates_in_place, ProviderTester, TestError,
};
use vultr_provider::{ProviderError, VultrProvider, WaitSettings};
use wiremock::matchers::{bearer_token, body_partial_json, method, path, path_regex, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn fast_wait() -> WaitSettings {
    WaitSettings {
        timeout: Duration::from_secs(5),
        delay: Duration::ZERO,
        min_interval: Duration::from_millis(10),
        not_found_checks: 3,
    }
}

async fn configured(server: &MockServer) -> ProviderTester<VultrProvider> {
    let tester = ProviderTester::new(VultrProvider::new().with_wait_settings(fast_wait()));
    tester
        .configure(json!({
            "api_key": "test-key",
            "base_url": format!("{}/v2", server.uri()),
            "rate_limit": 0,
            "retry_limit": 0
        }))
        .await
        .expect("configure should succeed");
    tester
}

fn meta(next: &str) -> Value {
    json!({"total": 2, "links": {"next": next, "prev": ""}})
}

fn label_filter(label: &str) -> Value {
    json!({"filter": [{"name": "label", "values": [label]}]})
}

mod data_source_tests {
    use super::*;

    async fn mount_block_pages(server: &MockServer, first_label: &str, second_label: &str) {
        Mock::given(method("GET"))
            .and(path("/v2/blocks"))
            .and(query_param("cursor", "page-2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "blocks": [{
                    "id": "b-2",
                    "label": second_label,
                    "size_gb": 10,
                    "region": "ewr",
                    "status": "active",
                    "cost": 1.0,
                    "mount_id": "ewr-2"
                }],
                "meta": meta("")
            })))
            .with_priority(1)
            .mount(server)
            .await;

        Mock::given(method("GET"))
            .and(path("/v2/blocks"))
            .and(bearer_token("test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "blocks": [{
                    "id": "b-1",
                    "label": first_label,
                    "size_gb": 50,
                    "region": "ewr",
                    "status": "active"
                }],
                "meta": meta("page-2")
            })))
            .mount(server)
            .await;
    }

    /// The only match sits on the second page
    #[tokio::test]
    async fn test_block_storage_lookup_spans_pages() {
        let server = MockServer::start().await;
        mount_block_pages(&server, "other", "tf-bs-rs-1234").await;
        let tester = configured(&server).await;

        let state = tester
            .read_data_source("vultr_block_storage", label_filter("tf-bs-rs-1234"))
            .await
            .unwrap();

        assert_eq!(state["id"], "b-2");
        assert_eq!(state["label"], "tf-bs-rs-1234");
        assert_eq!(state["size_gb"], 10);
        assert_eq!(state["mount_id"], "ewr-2");
        assert_eq!(state["filter"][0]["values"][0], "tf-bs-rs-1234");
    }

    /// One match on each page is ambiguous
    #[tokio::test]
    async fn test_block_storage_lookup_is_ambiguous() {
        let server = MockServer::start().await;
        mount_block_pages(&server, "db", "db").await;
        let tester = configured(&server).await;

        let err = tester
            .read_data_source("vultr_block_storage", label_filter("db"))
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::AmbiguousResult { count: 2 }));
    }

    #[tokio::test]
    async fn test_block_storage_lookup_not_found() {
        let server = MockServer::start().await;
        mount_block_pages(&server, "a", "b").await;
        let tester = configured(&server).await;

        let err = tester
            .read_data_source("vultr_block_storage", label_filter("c"))
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::NotFound(_)));
    }

    /// A failing page aborts the lookup without a partial result
    #[tokio::test]
    async fn test_lookup_page_failure_is_fetch_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2/iso"))
            .respond_with(
                ResponseTemplate::new(500)
                    .set_body_json(json!({"error": "internal error", "status": 500})),
            )
            .mount(&server)
            .await;
        let tester = configured(&server).await;

        let err = tester
            .read_data_source(
                "vultr_iso_private",
                json!({"filter": [{"name": "filename", "values": ["alpine.iso"]}]}),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::Fetch { .. }));
    }

    #[tokio::test]
    async fn test_instance_includes_backups_and_networks() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2/instances"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "instances": [
                    {"id": "inst-1", "label": "web", "main_ip": "192.0.2.10", "ram": 1024,
                     "features": ["ipv6"]},
                    {"id": "inst-2", "label": "db", "main_ip": "192.0.2.11", "ram": 2048}
                ],
                "meta": meta("")
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v2/instances/inst-1/backup-schedule"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "backup_schedule": {"enabled": true, "type": "daily", "hour": 3, "dow": 0, "dom": 0}
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v2/instances/inst-1/private-networks"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "private_networks": [{"network_id": "net-1", "mac_address": "", "ip_address": ""}],
                "meta": meta("")
            })))
            .mount(&server)
            .await;
        let tester = configured(&server).await;

        let state = tester
            .read_data_source("vultr_instance", label_filter("web"))
            .await
            .unwrap();

        assert_eq!(state["id"], "inst-1");
        assert_eq!(state["ram"], 1024);
        assert_eq!(state["features"], json!(["ipv6"]));
        assert_eq!(state["backups"], "enabled");
        assert_eq!(state["backups_schedule"]["type"], "daily");
        assert_eq!(state["backups_schedule"]["hour"], "3");
        assert_eq!(state["private_network_ids"], json!(["net-1"]));
    }

    /// An `instance_id` filter restricts which instances are scanned
    #[tokio::test]
    async fn test_reverse_ipv4_scans_named_instance() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2/instances/inst-1/ipv4"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "ipv4s": [
                    {"ip": "192.0.2.10", "netmask": "255.255.254.0", "gateway": "192.0.2.1",
                     "type": "main_ip", "reverse": "web.example.com"},
                    {"ip": "192.0.2.20", "netmask": "255.255.254.0", "gateway": "192.0.2.1",
                     "type": "secondary_ip", "reverse": "alt.example.com"}
                ],
                "meta": meta("")
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v2/instances"))
            .respond_with(ResponseTemplate::new(500))
            .expect(0)
            .mount(&server)
            .await;
        let tester = configured(&server).await;

        let state = tester
            .read_data_source(
                "vultr_reverse_ipv4",
                json!({"filter": [
                    {"name": "instance_id", "values": ["inst-1"]},
                    {"name": "reverse", "values": ["alt.example.com"]}
                ]}),
            )
            .await
            .unwrap();

        assert_eq!(state["id"], "192.0.2.20");
        assert_eq!(state["instance_id"], "inst-1");
        assert_eq!(state["gateway"], "192.0.2.1");
    }

    #[tokio::test]
    async fn test_dns_domain_by_name() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2/domains/example.com"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "domain": {"domain": "example.com", "date_created": "2020-10-10T01:56:20+00:00",
                           "dns_sec": "enabled"}
            })))
            .mount(&server)
            .await;
        let tester = configured(&server).await;

        let state = tester
            .read_data_source("vultr_dns_domain", json!({"domain": "example.com"}))
            .await
            .unwrap();
        assert_eq!(state["id"], "example.com");
        assert_eq!(state["dns_sec"], "enabled");
    }
}

mod iso_tests {
    use super::*;

    #[tokio::test]
    async fn test_create_waits_for_complete() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v2/iso"))
            .and(body_partial_json(json!({"url": "http://example.com/alpine.iso"})))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "iso": {"id": "iso-1", "status": "pending", "filename": "alpine.iso"}
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v2/iso/iso-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "iso": {"id": "iso-1", "status": "pending", "filename": "alpine.iso"}
            })))
            .up_to_n_times(2)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v2/iso/iso-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "iso": {"id": "iso-1", "status": "complete", "filename": "alpine.iso",
                        "size": 4096, "md5sum": "abc"}
            })))
            .mount(&server)
            .await;
        let tester = configured(&server).await;

        let state = tester
            .create("vultr_iso_private", json!({"url": "http://example.com/alpine.iso"}))
            .await
            .unwrap();

        assert_eq!(state["id"], "iso-1");
        assert_eq!(state["status"], "complete");
        assert_eq!(state["size"], 4096);
        assert_eq!(state["url"], "http://example.com/alpine.iso");
    }

    /// A failed download still reports the id of the created ISO
    #[tokio::test]
    async fn test_create_failure_reports_partial_id() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v2/iso"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "iso": {"id": "iso-9", "status": "pending"}
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v2/iso/iso-9"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "iso": {"id": "iso-9", "status": "failed"}
            })))
            .mount(&server)
            .await;
        let tester = configured(&server).await;

        let err = tester
            .create("vultr_iso_private", json!({"url": "http://example.com/broken.iso"}))
            .await
            .unwrap_err();

        assert_eq!(err.partial_id(), Some("iso-9"));
        match err {
            ProviderError::PartialCreate { source, .. } => {
                assert!(matches!(*source, ProviderError::UnexpectedState { .. }))
            },
            other => panic!("unexpected error: {other}"),
        }
    }

    /// Delete detaches the ISO from the blocking instance and retries
    #[tokio::test]
    async fn test_delete_resolves_attachment() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/v2/iso/iso-1"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "error": "ISO is still attached to 192.0.2.5",
                "status": 400
            })))
            .up_to_n_times(1)
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/v2/iso/iso-1"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/v2/instances"))
            .and(query_param("cursor", "page-2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "instances": [{"id": "inst-2", "main_ip": "192.0.2.5"}],
                "meta": meta("")
            })))
            .with_priority(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v2/instances"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "instances": [{"id": "inst-1", "main_ip": "192.0.2.4"}],
                "meta": meta("page-2")
            })))
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(path("/v2/instances/inst-2/iso/detach"))
            .respond_with(ResponseTemplate::new(202))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v2/instances/inst-2/iso"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "iso_status": {"iso_id": "iso-1", "state": "isomounted"}
            })))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v2/instances/inst-2/iso"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "iso_status": {"iso_id": "", "state": "ready"}
            })))
            .mount(&server)
            .await;
        let tester = configured(&server).await;

        tester
            .delete("vultr_iso_private", json!({"id": "iso-1"}))
            .await
            .unwrap();
    }

    /// An address no instance owns cannot be resolved
    #[tokio::test]
    async fn test_delete_with_unknown_address_is_conflict() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/v2/iso/iso-1"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "error": "ISO is still attached to 198.51.100.7",
                "status": 400
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v2/instances"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "instances": [{"id": "inst-1", "main_ip": "192.0.2.4"}],
                "meta": meta("")
            })))
            .mount(&server)
            .await;
        let tester = configured(&server).await;

        let err = tester
            .delete("vultr_iso_private", json!({"id": "iso-1"}))
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::DependencyConflict(_)));
    }

    /// The same blocking address twice stops after a single detach
    #[tokio::test]
    async fn test_delete_gives_up_when_detach_does_not_clear() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/v2/iso/iso-1"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "error": "ISO is still attached to 192.0.2.5",
                "status": 400
            })))
            .expect(2)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v2/instances"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "instances": [{"id": "inst-2", "main_ip": "192.0.2.5"}],
                "meta": meta("")
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/v2/instances/inst-2/iso/detach"))
            .respond_with(ResponseTemplate::new(202))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v2/instances/inst-2/iso"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "iso_status": {"iso_id": "", "state": "ready"}
            })))
            .mount(&server)
            .await;
        let tester = configured(&server).await;

        let err = tester
            .delete("vultr_iso_private", json!({"id": "iso-1"}))
            .await
            .unwrap_err();
        match err {
            ProviderError::DependencyConflict(message) => {
                assert!(message.contains("192.0.2.5"), "message: {message}")
            },
            other => panic!("unexpected error: {other}"),
        }
    }

    /// Each retry names a new address until the attempt cap is reached
    #[tokio::test]
    async fn test_delete_stops_at_detach_cap() {
        let server = MockServer::start().await;
        let blocking = MAX_DETACH_ATTEMPTS + 1;
        for n in 1..=blocking {
            Mock::given(method("DELETE"))
                .and(path("/v2/iso/iso-1"))
                .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                    "error": format!("ISO is still attached to 192.0.2.{n}"),
                    "status": 400
                })))
                .up_to_n_times(1)
                .expect(1)
                .mount(&server)
                .await;
        }
        let instances: Vec<Value> = (1..=blocking)
            .map(|n| json!({"id": format!("inst-{n}"), "main_ip": format!("192.0.2.{n}")}))
            .collect();
        Mock::given(method("GET"))
            .and(path("/v2/instances"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "instances": instances,
                "meta": meta("")
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path_regex(r"^/v2/instances/inst-\d+/iso/detach$"))
            .respond_with(ResponseTemplate::new(202))
            .expect(MAX_DETACH_ATTEMPTS as u64)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path_regex(r"^/v2/instances/inst-\d+/iso$"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "iso_status": {"iso_id": "", "state": "ready"}
            })))
            .mount(&server)
            .await;
        let tester = configured(&server).await;

        let err = tester
            .delete("vultr_iso_private", json!({"id": "iso-1"}))
            .await
            .unwrap_err();
        match err {
            ProviderError::DependencyConflict(message) => {
                assert!(message.contains("8 instances"), "message: {message}")
            },
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_read_gone_iso_returns_null() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2/iso/iso-1"))
            .respond_with(
                ResponseTemplate::new(404).set_body_json(json!({"error": "Invalid iso", "status": 404})),
            )
            .mount(&server)
            .await;
        let tester = configured(&server).await;

        let state = tester
            .read("vultr_iso_private", json!({"id": "iso-1", "url": "http://example.com/a.iso"}))
            .await
            .unwrap();
        assert!(state.is_null());
    }
}

mod block_storage_tests {
    use super::*;

    fn block(status: &str, attached: &str) -> Value {
        json!({"block": {
            "id": "b-1",
            "region": "ewr",
            "size_gb": 10,
            "label": "data",
            "status": status,
            "attached_to_instance": attached,
            "cost": 1.0,
            "mount_id": "ewr-1"
        }})
    }

    #[tokio::test]
    async fn test_create_waits_active_then_attaches() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v2/blocks"))
            .and(body_partial_json(json!({"region": "ewr", "size_gb": 10, "label": "data"})))
            .respond_with(ResponseTemplate::new(202).set_body_json(block("pending", "")))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v2/blocks/b-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(block("pending", "")))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v2/blocks/b-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(block("active", "")))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v2/blocks/b-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(block("active", "inst-1")))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/v2/blocks/b-1/attach"))
            .and(body_partial_json(json!({"instance_id": "inst-1", "live": true})))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;
        let tester = configured(&server).await;

        let plan = tester
            .plan_create(
                "vultr_block_storage",
                json!({"region": "ewr", "size_gb": 10, "label": "data",
                       "attached_to_instance": "inst-1", "live": true}),
            )
            .await
            .unwrap();
        let state = tester
            .create("vultr_block_storage", plan.planned_state)
            .await
            .unwrap();

        assert_eq!(state["id"], "b-1");
        assert_eq!(state["status"], "active");
        assert_eq!(state["attached_to_instance"], "inst-1");
        assert_eq!(state["live"], true);
    }

    #[tokio::test]
    async fn test_resize_patches_volume() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path("/v2/blocks/b-1"))
            .and(body_partial_json(json!({"size_gb": 20})))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v2/blocks/b-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"block": {
                "id": "b-1", "region": "ewr", "size_gb": 20, "label": "data", "status": "active"
            }})))
            .mount(&server)
            .await;
        let tester = configured(&server).await;

        let prior = json!({"id": "b-1", "region": "ewr", "size_gb": 10, "label": "data",
                           "live": false, "status": "active"});
        let plan = tester
            .plan_update(
                "vultr_block_storage",
                prior.clone(),
                json!({"region": "ewr", "size_gb": 20, "label": "data"}),
            )
            .await
            .unwrap();
        assert_plan_changes_attribute(&plan, "size_gb");
        assert_plan_updates_in_place(&plan);

        let state = tester
            .update("vultr_block_storage", prior, plan.planned_state)
            .await
            .unwrap();
        assert_eq!(state["size_gb"], 20);
    }

    /// A volume read back without label or attachment converges on its config
    #[tokio::test]
    async fn test_refreshed_volume_converges() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2/blocks/b-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"block": {
                "id": "b-1", "region": "ewr", "size_gb": 10, "label": "",
                "attached_to_instance": "", "status": "active", "cost": 1.0
            }})))
            .mount(&server)
            .await;
        let tester = configured(&server).await;

        let config = json!({"region": "ewr", "size_gb": 10});
        let mut known = config.clone();
        known["id"] = json!("b-1");
        let state = tester.read("vultr_block_storage", known).await.unwrap();
        assert_eq!(state["label"], "");

        let plan = tester
            .plan_update("vultr_block_storage", state.clone(), config)
            .await
            .unwrap();
        assert_plan_no_changes(&plan);

        let moved = tester
            .plan_update("vultr_block_storage", state, json!({"region": "ams", "size_gb": 10}))
            .await
            .unwrap();
        assert_plan_replaces(&moved);
    }

    #[tokio::test]
    async fn test_delete_detaches_first() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2/blocks/b-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(block("active", "inst-1")))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v2/blocks/b-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(block("active", "")))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/v2/blocks/b-1/detach"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/v2/blocks/b-1"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;
        let tester = configured(&server).await;

        tester
            .delete("vultr_block_storage", json!({"id": "b-1", "live": false}))
            .await
            .unwrap();
    }
}

mod dns_domain_tests {
    use super::*;

    fn domain(dns_sec: &str) -> Value {
        json!({"domain": {
            "domain": "example.com",
            "date_created": "2020-10-10T01:56:20+00:00",
            "dns_sec": dns_sec
        }})
    }

    #[tokio::test]
    async fn test_crud_lifecycle() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v2/domains"))
            .and(body_partial_json(json!({"domain": "example.com", "ip": "192.0.2.1"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(domain("disabled")))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v2/domains/example.com"))
            .respond_with(ResponseTemplate::new(200).set_body_json(domain("disabled")))
            .up_to_n_times(2)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v2/domains/example.com"))
            .respond_with(ResponseTemplate::new(200).set_body_json(domain("enabled")))
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .and(path("/v2/domains/example.com"))
            .and(body_partial_json(json!({"dns_sec": "enabled"})))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/v2/domains/example.com"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;
        let tester = configured(&server).await;

        let state = tester
            .lifecycle_crud(
                "vultr_dns_domain",
                json!({"domain": "example.com", "ip": "192.0.2.1"}),
                json!({"domain": "example.com", "ip": "192.0.2.1", "dns_sec": "enabled"}),
            )
            .await
            .unwrap();

        assert_eq!(state["id"], "example.com");
        assert_eq!(state["dns_sec"], "enabled");
        assert_eq!(state["ip"], "192.0.2.1");
    }

    #[tokio::test]
    async fn test_invalid_ip_is_rejected() {
        let tester = ProviderTester::new(VultrProvider::new());
        tester
            .validate_resource_config("vultr_dns_domain", json!({"domain": "example.com"}))
            .await
            .unwrap();

        let err = tester
            .validate_resource_config("vultr_dns_domain", json!({"domain": "example.com", "ip": "x"}))
            .await
            .unwrap_err();
        match err {
            TestError::Diagnostics(diagnostics) => assert_error_contains(&diagnostics, "valid IP"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_read_missing_domain_returns_null() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2/domains/example.com"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({"error": "", "status": 404})))
            .mount(&server)
            .await;
        let tester = configured(&server).await;

        let state = tester
            .read("vultr_dns_domain", json!({"id": "example.com"}))
            .await
            .unwrap();
        assert!(state.is_null());
    }

    #[tokio::test]
    async fn test_import_by_name() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2/domains/example.com"))
            .respond_with(ResponseTemplate::new(200).set_body_json(domain("enabled")))
            .mount(&server)
            .await;
        let tester = configured(&server).await;

        let imported = tester
            .import_resource("vultr_dns_domain", "example.com")
            .await
            .unwrap();
        assert_eq!(imported.len(), 1);
        assert_eq!(imported[0].state["id"], "example.com");
        assert_eq!(imported[0].state["dns_sec"], "enabled");
    }
}
