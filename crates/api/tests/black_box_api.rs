use policygate_api::ApiConfig;
use reqwest::StatusCode;
use serde_json::json;

const ADMIN: &str = "admin-token";
const OWNER: &str = "owner-token";
const CLERK: &str = "clerk-token";

struct TestServer {
    base_url: String,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        Self::spawn_with(ApiConfig::default()).await
    }

    async fn spawn_with(config: ApiConfig) -> Self {
        // Build app (same router as prod), but bind to an ephemeral port.
        let app = policygate_api::app::build_app(&config).expect("failed to build app");
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { base_url, handle }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn get(srv: &TestServer, token: &str, path: &str) -> reqwest::Response {
    reqwest::Client::new()
        .get(srv.url(path))
        .bearer_auth(token)
        .send()
        .await
        .unwrap()
}

async fn post(srv: &TestServer, token: &str, path: &str, body: serde_json::Value) -> reqwest::Response {
    reqwest::Client::new()
        .post(srv.url(path))
        .bearer_auth(token)
        .json(&body)
        .send()
        .await
        .unwrap()
}

#[tokio::test]
async fn auth_required_for_protected_endpoints() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client.get(srv.url("/health")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = client.get(srv.url("/invoices")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = get(&srv, "unknown-token", "/invoices").await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = get(&srv, OWNER, "/whoami").await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["principal_id"], "00000000-0000-0000-0000-000000000001");
}

#[tokio::test]
async fn resource_actions_use_the_conventional_ability_map() {
    let srv = TestServer::spawn().await;

    let res = get(&srv, CLERK, "/invoices").await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body.as_array().unwrap().len(), 2);

    let res = get(&srv, CLERK, "/invoices/42").await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["number"], "INV-42");

    // clerk lacks companies.view
    let res = get(&srv, CLERK, "/companies").await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "forbidden");
}

#[tokio::test]
async fn route_model_binding_misses_are_not_found() {
    let srv = TestServer::spawn().await;

    let res = get(&srv, ADMIN, "/invoices/999").await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = post(&srv, ADMIN, "/companies/99/invoices", json!({"number": "X", "amount": 1})).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn scoped_declaration_checks_the_related_company() {
    let srv = TestServer::spawn().await;

    let res = post(&srv, OWNER, "/companies/7/invoices", json!({"number": "INV-1000", "amount": 50})).await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["company_id"], "7");
    assert_eq!(body["status"], "draft");

    let res = post(&srv, OWNER, "/companies/8/invoices", json!({"number": "INV-1001", "amount": 50})).await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn request_sourced_declaration_loads_the_invoice_from_input() {
    let srv = TestServer::spawn().await;

    let res = post(&srv, CLERK, "/invoices/approve", json!({"invoice_id": 42})).await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["status"], "approved");

    // no longer a draft
    let res = post(&srv, CLERK, "/invoices/approve", json!({"invoice_id": 42})).await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    // owner lacks invoices.approve
    let res = post(&srv, OWNER, "/invoices/approve", json!({"invoice_id": 43})).await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn request_sourced_declaration_reads_form_bodies() {
    let srv = TestServer::spawn().await;

    let res = reqwest::Client::new()
        .post(srv.url("/invoices/approve"))
        .bearer_auth(CLERK)
        .form(&[("invoice_id", "42")])
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["status"], "approved");

    // an unknown id in a form body fails like the JSON one
    let res = reqwest::Client::new()
        .post(srv.url("/invoices/approve"))
        .bearer_auth(CLERK)
        .form(&[("invoice_id", "999")])
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "target_not_found");
}

#[tokio::test]
async fn missing_request_target_is_denied_with_diagnostic() {
    let srv = TestServer::spawn().await;

    let res = post(&srv, ADMIN, "/invoices/approve", json!({"invoice_id": 999})).await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "target_not_found");
    assert_eq!(body["diagnostic"], "Check the Policy attribute on approve in InvoiceController");
}

#[tokio::test]
async fn simple_declaration_is_checked_as_class_level_ability() {
    let srv = TestServer::spawn().await;

    let res = get(&srv, CLERK, "/invoices/export").await;
    assert_eq!(res.status(), StatusCode::OK);

    let res = get(&srv, OWNER, "/invoices/export").await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn uncovered_action_is_denied_even_for_admins() {
    let srv = TestServer::spawn().await;

    let res = post(&srv, ADMIN, "/invoices/42/archive", json!({})).await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "unauthorized_registration");
    assert_eq!(body["diagnostic"], "Check policy requirement on archive in InvoiceController");

    // exempt action passes without any ability
    let res = get(&srv, OWNER, "/invoices/ping").await;
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn company_update_is_limited_to_the_owner() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client
        .put(srv.url("/companies/7"))
        .bearer_auth(OWNER)
        .json(&json!({"name": "Acme Ltd"}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["name"], "Acme Ltd");

    let res = client
        .put(srv.url("/companies/8"))
        .bearer_auth(OWNER)
        .json(&json!({"name": "Mine now"}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn coverage_report_lists_denied_actions() {
    let srv = TestServer::spawn().await;

    let res = get(&srv, OWNER, "/_policies").await;
    assert_eq!(res.status(), StatusCode::OK);
    let reports: serde_json::Value = res.json().await.unwrap();

    let invoices = reports
        .as_array()
        .unwrap()
        .iter()
        .find(|r| r["controller"] == "InvoiceController")
        .unwrap();
    let denied: Vec<&str> = invoices["actions"]
        .as_array()
        .unwrap()
        .iter()
        .filter(|a| a["coverage"] == "denied")
        .map(|a| a["action"].as_str().unwrap())
        .collect();
    assert_eq!(denied, vec!["archive"]);
}

#[tokio::test]
async fn manifest_replaces_builtin_declarations() {
    let manifest = json!({
        "controllers": [{
            "name": "InvoiceController",
            "model": "App\\Models\\Invoice",
            "requirement_audit": false,
            "actions": [{ "name": "archive", "binds_model": true }]
        }]
    });
    let path = std::env::temp_dir().join(format!("policygate-{}.json", uuid::Uuid::now_v7()));
    std::fs::write(&path, manifest.to_string()).unwrap();

    let srv = TestServer::spawn_with(ApiConfig {
        manifest: Some(path.clone()),
        ..ApiConfig::default()
    })
    .await;

    let res = post(&srv, OWNER, "/invoices/42/archive", json!({})).await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["status"], "archived");

    std::fs::remove_file(path).ok();
}
