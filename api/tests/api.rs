//! End-to-end API scenarios against an in-memory server

use axum::body::Bytes;
use axum::http::{header, HeaderValue, StatusCode};
use axum_test::{TestResponse, TestServer};
use campus_api::{build_router, ApiState, ServerConfig};
use serde_json::{json, Value};

const ADMIN_EMAIL: &str = "admin@campus.test";
const PASSWORD: &str = "correct-horse";

fn server() -> TestServer {
    let config = ServerConfig {
        jwt_secret: "integration-secret".into(),
        admin_email: Some(ADMIN_EMAIL.into()),
        admin_password: Some(PASSWORD.into()),
        ..Default::default()
    };
    let state = ApiState::new(config).unwrap();
    state.bootstrap_admin().unwrap();
    TestServer::new(build_router(state)).unwrap()
}

fn bearer(token: &str) -> HeaderValue {
    HeaderValue::from_str(&format!("Bearer {}", token)).unwrap()
}

fn data(response: &TestResponse) -> Value {
    response.json::<Value>()["data"].clone()
}

async fn register(server: &TestServer, email: &str, role: &str) -> String {
    let response = server
        .post("/api/accounts/users/register")
        .json(&json!({
            "email": email,
            "password": PASSWORD,
            "password_confirm": PASSWORD,
            "role": role,
            "first_name": "Test",
            "last_name": role,
        }))
        .await;
    response.assert_status(StatusCode::CREATED);
    data(&response)["tokens"]["access"].as_str().unwrap().to_string()
}

async fn login(server: &TestServer, email: &str) -> String {
    let response = server
        .post("/api/accounts/users/login")
        .json(&json!({ "email": email, "password": PASSWORD }))
        .await;
    response.assert_status_ok();
    data(&response)["tokens"]["access"].as_str().unwrap().to_string()
}

async fn get(server: &TestServer, path: &str, token: &str) -> TestResponse {
    server.get(path).add_header(header::AUTHORIZATION, bearer(token)).await
}

async fn post(server: &TestServer, path: &str, token: &str, body: Value) -> TestResponse {
    server
        .post(path)
        .add_header(header::AUTHORIZATION, bearer(token))
        .json(&body)
        .await
}

/// The first record the caller can see at `path`
async fn first_id(server: &TestServer, path: &str, token: &str) -> String {
    let response = get(server, path, token).await;
    response.assert_status_ok();
    data(&response)["items"][0]["id"].as_str().unwrap().to_string()
}

/// Admin token plus one published course
async fn catalog(server: &TestServer) -> (String, String) {
    let admin = login(server, ADMIN_EMAIL).await;
    let category = post(server, "/api/courses/categories", &admin, json!({ "name": "Trades" })).await;
    category.assert_status(StatusCode::CREATED);
    let course = post(
        server,
        "/api/courses/courses",
        &admin,
        json!({
            "code": "WELD101",
            "title": "Intro to Welding",
            "category": data(&category)["id"],
            "duration_weeks": 8,
            "tuition_fee": "1500.00",
        }),
    )
    .await;
    course.assert_status(StatusCode::CREATED);
    (admin, data(&course)["id"].as_str().unwrap().to_string())
}

#[tokio::test]
async fn test_register_then_login() {
    let server = server();
    let response = server
        .post("/api/accounts/users/register")
        .json(&json!({
            "email": "Ada@Campus.test",
            "password": PASSWORD,
            "password_confirm": PASSWORD,
            "role": "student",
            "first_name": "Ada",
            "last_name": "Lovelace",
        }))
        .await;
    response.assert_status(StatusCode::CREATED);
    let user = data(&response)["user"].clone();
    assert_eq!(user["username"], "ada@campus.test");
    assert_eq!(user["role"], "student");
    assert!(user.get("password_hash").is_none());

    let token = login(&server, "ada@campus.test").await;
    let me = get(&server, "/api/accounts/users/me", &token).await;
    me.assert_status_ok();
    assert_eq!(data(&me)["email"], "ada@campus.test");
}

#[tokio::test]
async fn test_registration_rejects_admin_and_mismatched_passwords() {
    let server = server();
    let response = server
        .post("/api/accounts/users/register")
        .json(&json!({
            "email": "mallory@campus.test",
            "password": PASSWORD,
            "password_confirm": "something-else",
            "role": "admin",
            "first_name": "Mallory",
            "last_name": "Smith",
        }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    let error = response.json::<Value>()["error"].clone();
    assert_eq!(error["code"], "validation_error");
    assert!(error["fields"]["role"].is_array());
    assert!(error["fields"]["password_confirm"].is_array());
}

#[tokio::test]
async fn test_duplicate_email_conflicts() {
    let server = server();
    register(&server, "sam@campus.test", "student").await;
    let response = server
        .post("/api/accounts/users/register")
        .json(&json!({
            "email": "sam@campus.test",
            "password": PASSWORD,
            "password_confirm": PASSWORD,
            "role": "employer",
            "first_name": "Sam",
            "last_name": "Again",
        }))
        .await;
    response.assert_status(StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_wrong_password_is_unauthorized() {
    let server = server();
    let response = server
        .post("/api/accounts/users/login")
        .json(&json!({ "email": ADMIN_EMAIL, "password": "not-the-password" }))
        .await;
    response.assert_status(StatusCode::UNAUTHORIZED);
    assert_eq!(response.header(header::WWW_AUTHENTICATE), "Bearer");
}

#[tokio::test]
async fn test_refresh_issues_new_pair_and_types_are_not_interchangeable() {
    let server = server();
    let response = server
        .post("/api/accounts/users/login")
        .json(&json!({ "email": ADMIN_EMAIL, "password": PASSWORD }))
        .await;
    let tokens = data(&response)["tokens"].clone();
    let access = tokens["access"].as_str().unwrap();
    let refresh = tokens["refresh"].as_str().unwrap();

    let renewed = server.post("/api/token/refresh").json(&json!({ "refresh": refresh })).await;
    renewed.assert_status_ok();
    let new_access = data(&renewed)["access"].as_str().unwrap().to_string();
    get(&server, "/api/dashboard/stats", &new_access).await.assert_status_ok();

    get(&server, "/api/dashboard/stats", refresh)
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
    server
        .post("/api/token/refresh")
        .json(&json!({ "refresh": access }))
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_protected_endpoints_need_a_token() {
    let server = server();
    server.get("/api/dashboard/stats").await.assert_status(StatusCode::UNAUTHORIZED);
    server
        .get("/api/students/enrollments")
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
    get(&server, "/api/students/enrollments", "not.a.token")
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_catalog_is_public_but_read_only() {
    let server = server();
    catalog(&server).await;

    let courses = server.get("/api/courses/courses").await;
    courses.assert_status_ok();
    assert_eq!(data(&courses)["total"], 1);
    assert_eq!(data(&courses)["items"][0]["code"], "WELD101");

    server
        .post("/api/courses/categories")
        .json(&json!({ "name": "Sneaky" }))
        .await
        .assert_status(StatusCode::UNAUTHORIZED);

    let student = register(&server, "stu@campus.test", "student").await;
    post(&server, "/api/courses/categories", &student, json!({ "name": "Sneaky" }))
        .await
        .assert_status(StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_duplicate_enrollment_conflicts_and_scoping_hides_others() {
    let server = server();
    let (admin, course) = catalog(&server).await;
    let student = register(&server, "ana@campus.test", "student").await;
    let other = register(&server, "ben@campus.test", "student").await;
    let profile = first_id(&server, "/api/students/students", &student).await;

    let body = json!({ "student": profile, "course": course });
    let created = post(&server, "/api/students/enrollments", &admin, body.clone()).await;
    created.assert_status(StatusCode::CREATED);
    assert_eq!(data(&created)["status"], "enrolled");
    let enrollment = data(&created)["id"].as_str().unwrap().to_string();

    post(&server, "/api/students/enrollments", &admin, body)
        .await
        .assert_status(StatusCode::CONFLICT);

    let own = get(&server, &format!("/api/students/students/{}/enrollments", profile), &student).await;
    own.assert_status_ok();
    assert_eq!(data(&own)["total"], 1);

    let mine = get(&server, "/api/students/enrollments", &other).await;
    assert_eq!(data(&mine)["total"], 0);
    get(&server, &format!("/api/students/enrollments/{}", enrollment), &other)
        .await
        .assert_status(StatusCode::NOT_FOUND);
    get(&server, &format!("/api/students/students/{}/progress", profile), &other)
        .await
        .assert_status(StatusCode::NOT_FOUND);

    let progress = get(&server, &format!("/api/students/students/{}/progress", profile), &student).await;
    progress.assert_status_ok();
    assert_eq!(data(&progress)["total_enrollments"], 1);
}

#[tokio::test]
async fn test_background_check_approval_verifies_account() {
    let server = server();
    let admin = login(&server, ADMIN_EMAIL).await;
    let student = register(&server, "cara@campus.test", "student").await;

    let check = post(&server, "/api/accounts/background-checks", &student, json!({})).await;
    check.assert_status(StatusCode::CREATED);
    assert_eq!(data(&check)["status"], "pending");
    let id = data(&check)["id"].as_str().unwrap().to_string();

    post(&server, &format!("/api/accounts/background-checks/{}/approve", id), &student, json!({}))
        .await
        .assert_status(StatusCode::FORBIDDEN);

    let approved = post(&server, &format!("/api/accounts/background-checks/{}/approve", id), &admin, json!({})).await;
    approved.assert_status_ok();
    assert_eq!(data(&approved)["status"], "passed");

    let me = get(&server, "/api/accounts/users/me", &student).await;
    assert_eq!(data(&me)["is_verified"], true);

    post(&server, &format!("/api/accounts/background-checks/{}/reject", id), &admin, json!({}))
        .await
        .assert_status(StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_employer_rejection_is_visible_to_applicant() {
    let server = server();
    let employer = register(&server, "hire@acme.test", "employer").await;
    let rival = register(&server, "hire@rival.test", "employer").await;
    let student = register(&server, "dev@campus.test", "student").await;

    let posting = post(
        &server,
        "/api/employers/job-postings",
        &employer,
        json!({ "title": "Apprentice welder", "location": "Leeds", "status": "active" }),
    )
    .await;
    posting.assert_status(StatusCode::CREATED);
    let posting = data(&posting)["id"].as_str().unwrap().to_string();

    let applied = post(
        &server,
        &format!("/api/employers/job-postings/{}/apply", posting),
        &student,
        json!({ "cover_letter": "I can weld." }),
    )
    .await;
    applied.assert_status(StatusCode::CREATED);
    assert_eq!(data(&applied)["status"], "applied");
    let application = data(&applied)["id"].as_str().unwrap().to_string();

    post(&server, &format!("/api/employers/job-postings/{}/apply", posting), &student, json!({}))
        .await
        .assert_status(StatusCode::CONFLICT);

    let other = register(&server, "ops@campus.test", "student").await;
    let apply = format!("/api/employers/job-postings/{}/apply", posting);
    let malformed = server
        .post(&apply)
        .add_header(header::AUTHORIZATION, bearer(&other))
        .add_header(header::CONTENT_TYPE, HeaderValue::from_static("application/json"))
        .bytes(Bytes::from_static(b"{\"cover_letter\": "))
        .await;
    malformed.assert_status(StatusCode::BAD_REQUEST);
    assert!(malformed.json::<Value>()["error"]["fields"]["body"].is_array());
    server
        .post(&apply)
        .add_header(header::AUTHORIZATION, bearer(&other))
        .await
        .assert_status(StatusCode::CREATED);

    post(&server, &format!("/api/employers/job-applications/{}/reject", application), &rival, json!({}))
        .await
        .assert_status(StatusCode::NOT_FOUND);

    let listed = get(&server, &format!("/api/employers/job-postings/{}/applications", posting), &employer).await;
    assert_eq!(data(&listed)["total"], 2);

    post(&server, &format!("/api/employers/job-applications/{}/reject", application), &employer, json!({}))
        .await
        .assert_status_ok();

    let seen = get(&server, &format!("/api/employers/job-applications/{}", application), &student).await;
    seen.assert_status_ok();
    assert_eq!(data(&seen)["status"], "rejected");
}

#[tokio::test]
async fn test_certificate_verification() {
    let server = server();
    server
        .get("/api/certifications/certificates/verify")
        .await
        .assert_status(StatusCode::BAD_REQUEST);
    server
        .get("/api/certifications/certificates/verify")
        .add_query_param("code", "NOPE")
        .await
        .assert_status(StatusCode::NOT_FOUND);

    let (admin, course) = catalog(&server).await;
    let student = register(&server, "eve@campus.test", "student").await;
    let profile = first_id(&server, "/api/students/students", &student).await;
    let issued = post(
        &server,
        "/api/certifications/certificates",
        &admin,
        json!({ "student": profile, "course": course }),
    )
    .await;
    issued.assert_status(StatusCode::CREATED);
    let code = data(&issued)["verification_code"].as_str().unwrap().to_string();

    let verified = server
        .get("/api/certifications/certificates/verify")
        .add_query_param("code", &code)
        .await;
    verified.assert_status_ok();
    assert_eq!(data(&verified)["course_title"], "Intro to Welding");
    assert_eq!(data(&verified)["is_valid"], true);
}

#[tokio::test]
async fn test_financial_reports_are_admin_only() {
    let server = server();
    let admin = login(&server, ADMIN_EMAIL).await;
    let student = register(&server, "fin@campus.test", "student").await;

    get(&server, "/api/financials/reports/summary", &student)
        .await
        .assert_status(StatusCode::FORBIDDEN);
    let summary = get(&server, "/api/financials/reports/summary", &admin).await;
    summary.assert_status_ok();
    assert_eq!(data(&summary)["overdue_invoices"], 0);

    let revenue = get(&server, "/api/financials/reports/monthly-revenue", &admin).await;
    assert_eq!(data(&revenue).as_array().unwrap().len(), 12);
    for months in [0, 61] {
        server
            .get("/api/financials/reports/monthly-revenue")
            .add_header(header::AUTHORIZATION, bearer(&admin))
            .add_query_param("months", months)
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }
    let quarter = server
        .get("/api/financials/reports/monthly-revenue")
        .add_header(header::AUTHORIZATION, bearer(&admin))
        .add_query_param("months", 3)
        .await;
    quarter.assert_status_ok();
    assert_eq!(data(&quarter).as_array().unwrap().len(), 3);
    let report = json!({
        "report_type": "monthly",
        "title": "This month",
        "period_start": "2026-01-01",
        "period_end": "2026-01-31",
    });
    post(&server, "/api/financials/financial-reports", &student, report.clone())
        .await
        .assert_status(StatusCode::FORBIDDEN);
    let saved = post(&server, "/api/financials/financial-reports", &admin, report).await;
    saved.assert_status(StatusCode::CREATED);
    assert_eq!(data(&saved)["net_profit"], "0");
    get(&server, "/api/financials/tuition-fees", &student).await.assert_status_ok();
}

#[tokio::test]
async fn test_health_and_index() {
    let server = server();
    let health = server.get("/health").await;
    health.assert_status_ok();
    assert_eq!(health.json::<Value>()["status"], "healthy");

    let index = server.get("/api").await;
    index.assert_status_ok();
    let areas = data(&index);
    assert_eq!(areas[0]["area"], "accounts");
    assert_eq!(areas.as_array().unwrap().len(), 6);
}

#[tokio::test]
async fn test_pages_login_flow() {
    let server = server();
    server.get("/login").await.assert_status_ok();

    let anonymous = server.get("/dashboard").await;
    anonymous.assert_status(StatusCode::SEE_OTHER);
    assert_eq!(anonymous.header(header::LOCATION), "/login");

    let failed = server
        .post("/login")
        .form(&[("email", ADMIN_EMAIL), ("password", "wrong-password")])
        .await;
    failed.assert_status(StatusCode::UNAUTHORIZED);

    let signed_in = server
        .post("/login")
        .form(&[("email", ADMIN_EMAIL), ("password", PASSWORD)])
        .await;
    signed_in.assert_status(StatusCode::SEE_OTHER);
    assert_eq!(signed_in.header(header::LOCATION), "/dashboard");
    let cookie = signed_in.header(header::SET_COOKIE);
    let cookie = cookie.to_str().unwrap();
    assert!(cookie.contains("HttpOnly"));
    let session = cookie.split(';').next().unwrap().to_string();

    let dashboard = server
        .get("/dashboard")
        .add_header(header::COOKIE, HeaderValue::from_str(&session).unwrap())
        .await;
    dashboard.assert_status_ok();
    assert!(dashboard.text().contains("Dashboard"));

    server
        .get("/pages/widgets")
        .add_header(header::COOKIE, HeaderValue::from_str(&session).unwrap())
        .await
        .assert_status(StatusCode::NOT_FOUND);
    let users = server
        .get("/pages/users")
        .add_header(header::COOKIE, HeaderValue::from_str(&session).unwrap())
        .await;
    users.assert_status_ok();
    assert!(users.text().contains(ADMIN_EMAIL));
}

/// Session cookie for a page login
async fn session(server: &TestServer, email: &str) -> HeaderValue {
    let signed_in = server
        .post("/login")
        .form(&[("email", email), ("password", PASSWORD)])
        .await;
    signed_in.assert_status(StatusCode::SEE_OTHER);
    let cookie = signed_in.header(header::SET_COOKIE);
    let pair = cookie.to_str().unwrap().split(';').next().unwrap().to_string();
    HeaderValue::from_str(&pair).unwrap()
}

#[tokio::test]
async fn test_pages_create_and_edit_records() {
    let server = server();
    let admin = session(&server, ADMIN_EMAIL).await;

    server.get("/pages/categories/new").await.assert_status(StatusCode::SEE_OTHER);
    let form = server.get("/pages/categories/new").add_header(header::COOKIE, admin.clone()).await;
    form.assert_status_ok();
    assert!(form.text().contains("New course category"));

    let invalid = server
        .post("/pages/categories/new")
        .add_header(header::COOKIE, admin.clone())
        .form(&[("body", r#"{"name": "  "}"#)])
        .await;
    invalid.assert_status(StatusCode::BAD_REQUEST);
    assert!(invalid.text().contains("this field is required"));

    let created = server
        .post("/pages/categories/new")
        .add_header(header::COOKIE, admin.clone())
        .form(&[("body", r#"{"name": "Trades"}"#)])
        .await;
    created.assert_status(StatusCode::SEE_OTHER);
    let location = created.header(header::LOCATION).to_str().unwrap().to_string();
    assert!(location.starts_with("/pages/categories/"));

    let edit = server
        .get(&format!("{}/edit", location))
        .add_header(header::COOKIE, admin.clone())
        .await;
    edit.assert_status_ok();
    assert!(edit.text().contains("Trades"));

    let updated = server
        .post(&format!("{}/edit", location))
        .add_header(header::COOKIE, admin.clone())
        .form(&[("body", r#"{"name": "Building Trades"}"#)])
        .await;
    updated.assert_status(StatusCode::SEE_OTHER);
    let detail = server.get(&location).add_header(header::COOKIE, admin.clone()).await;
    assert!(detail.text().contains("Building Trades"));

    register(&server, "learner@campus.test", "student").await;
    let student = session(&server, "learner@campus.test").await;
    server
        .post("/pages/categories/new")
        .add_header(header::COOKIE, student)
        .form(&[("body", r#"{"name": "Sneaky"}"#)])
        .await
        .assert_status(StatusCode::FORBIDDEN);
}
