use axum::{
    body::Body,
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        Method, Request, StatusCode,
    },
    Router,
};
use http_body_util::BodyExt;
use rental_backend_runtime::BackendServices;
use rental_config::{AppConfig, MailBackend};
use rental_gateway::create_router;
use rental_users::CreateUserRequest;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

struct TestApp {
    router: Router,
    services: BackendServices,
    _db_dir: TempDir,
}

struct TestResponse {
    status: StatusCode,
    json: Value,
}

impl TestApp {
    async fn new() -> Self {
        let db_dir = TempDir::new().expect("create temp dir");
        let db_path = db_dir.path().join("rental-test.db");

        let mut config = AppConfig::default();
        config.database.url = format!("sqlite://{}", db_path.to_string_lossy());
        config.database.max_connections = 5;
        config.mail.backend = MailBackend::Memory;

        let services = BackendServices::initialise(&config)
            .await
            .expect("initialise backend services");
        let router = create_router(services.gateway.clone());

        Self {
            router,
            services,
            _db_dir: db_dir,
        }
    }

    async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(AUTHORIZATION, format!("Bearer {}", token));
        }

        let body = if let Some(json_body) = body {
            builder = builder.header(CONTENT_TYPE, "application/json");
            Body::from(serde_json::to_vec(&json_body).expect("serialize request body"))
        } else {
            Body::empty()
        };

        let response = self
            .router
            .clone()
            .oneshot(builder.body(body).expect("build request"))
            .await
            .expect("dispatch request");

        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("collect response body")
            .to_bytes();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

        TestResponse { status, json }
    }

    async fn login(&self, email: &str, password: &str) -> String {
        let response = self
            .request(
                Method::POST,
                "/api/auth/login",
                Some(json!({ "email": email, "password": password })),
                None,
            )
            .await;
        assert_eq!(response.status, StatusCode::OK, "{}", response.json);
        response.json["token"]
            .as_str()
            .expect("token in login response")
            .to_string()
    }
}

#[tokio::test]
async fn health_check_returns_ok() {
    let app = TestApp::new().await;

    let response = app.request(Method::GET, "/health", None, None).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json["status"], "ok");
}

#[tokio::test]
async fn openapi_document_is_served() {
    let app = TestApp::new().await;

    let response = app
        .request(Method::GET, "/api-docs/openapi.json", None, None)
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(response.json["paths"]["/api/admin/users"].is_object());
}

#[tokio::test]
async fn tenant_onboarding_flow() {
    let app = TestApp::new().await;

    let mut request = CreateUserRequest::new("ops@rental.om", "Rental Operations", "1000001")
        .with_password("AdminPass1");
    request.is_verified = true;
    app.services
        .gateway
        .user_service()
        .create_superuser(request)
        .await
        .expect("create superuser");
    let admin = app.login("ops@rental.om", "AdminPass1").await;

    let created = app
        .request(
            Method::POST,
            "/api/admin/users",
            Some(json!({
                "email": "tenant@x.com",
                "company_name": "Tenant Co",
                "commercial_registration": "5550001",
                "user_type": "TENANT",
                "phone": "+96891234567",
                "password1": "TenantPass1",
                "password2": "TenantPass1"
            })),
            Some(&admin),
        )
        .await;
    assert_eq!(created.status, StatusCode::CREATED, "{}", created.json);
    assert_eq!(created.json["user_type"], "TENANT");
    assert!(created.json["company"].is_null());
    let public_id = created.json["id"].as_str().expect("public id").to_string();

    let tenant = app
        .request(
            Method::PUT,
            &format!("/api/admin/users/{public_id}/tenant"),
            Some(json!({
                "company_activity": "Retail",
                "authorized_person": "Salim",
                "authorized_person_id": "12345678"
            })),
            Some(&admin),
        )
        .await;
    assert_eq!(tenant.status, StatusCode::OK, "{}", tenant.json);
    assert_eq!(tenant.json["has_valid_insurance"], false);

    let owner = app
        .request(
            Method::PUT,
            &format!("/api/admin/users/{public_id}/owner"),
            Some(json!({ "ownership_percentage": "10.00" })),
            Some(&admin),
        )
        .await;
    assert_eq!(owner.status, StatusCode::BAD_REQUEST);

    let deactivated = app
        .request(
            Method::POST,
            "/api/admin/users/actions/deactivate",
            Some(json!({ "user_ids": [public_id] })),
            Some(&admin),
        )
        .await;
    assert_eq!(deactivated.status, StatusCode::OK);
    assert_eq!(deactivated.json["message"], "Deactivated 1 user(s)");

    let login = app
        .request(
            Method::POST,
            "/api/auth/login",
            Some(json!({ "email": "tenant@x.com", "password": "TenantPass1" })),
            None,
        )
        .await;
    assert_eq!(login.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn admin_update_clears_company_details_on_role_change() {
    let app = TestApp::new().await;

    let mut request = CreateUserRequest::new("ops@rental.om", "Rental Operations", "1000001")
        .with_password("AdminPass1");
    request.is_verified = true;
    app.services
        .gateway
        .user_service()
        .create_superuser(request)
        .await
        .expect("create superuser");
    let admin = app.login("ops@rental.om", "AdminPass1").await;

    let company = app
        .services
        .gateway
        .user_service()
        .create_user(CreateUserRequest::new("co@x.com", "Acme", "777"))
        .await
        .expect("create company account");

    let updated = app
        .request(
            Method::PATCH,
            &format!("/api/admin/users/{}", company.public_id),
            Some(json!({ "user_type": "INVESTOR", "city": "Sohar" })),
            Some(&admin),
        )
        .await;
    assert_eq!(updated.status, StatusCode::OK, "{}", updated.json);
    assert_eq!(updated.json["user_type"], "INVESTOR");
    assert_eq!(updated.json["city"], "Sohar");
    assert!(updated.json["company"].is_null());
}
