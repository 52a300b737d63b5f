use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use super::common::*;
use crate::board::domain::Role;
use crate::board::{board_router, BoardService, InMemorySessions};

fn request(method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(&body).expect("encode body")))
            .expect("request"),
        None => builder.body(Body::empty()).expect("request"),
    }
}

async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router
        .clone()
        .oneshot(request)
        .await
        .expect("router dispatch");
    let status = response.status();
    (status, read_json_body(response).await)
}

fn job_body(title: &str) -> Value {
    json!({
        "title": title,
        "description": "Own the payments backend",
        "location": "Bengaluru",
        "job_type": "full-time",
        "salary_range": "10-14 LPA"
    })
}

#[tokio::test]
async fn signup_returns_created_profile_and_token() {
    let (service, _, _) = build_service();
    let router = router_with_service(service);

    let (status, payload) = send(
        &router,
        request(
            "POST",
            "/api/v1/auth/signup",
            None,
            Some(json!({
                "email": "kavya@example.com",
                "full_name": "Kavya",
                "role": "student"
            })),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert!(payload["error"].is_null());
    assert_eq!(payload["data"]["profile"]["role"], "student");
    let token = payload["data"]["token"].as_str().expect("token issued");

    let (status, payload) = send(&router, request("GET", "/api/v1/me", Some(token), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(payload["data"]["email"], "kavya@example.com");
}

#[tokio::test]
async fn unknown_token_and_missing_token_are_unauthorized() {
    let (service, _, _) = build_service();
    let router = router_with_service(service);

    for token in [None, Some("tok-unknown")] {
        let (status, payload) = send(&router, request("GET", "/api/v1/me", token, None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(payload["data"].is_null());
        assert_eq!(payload["error"]["code"], "unauthorized");
    }
}

#[tokio::test]
async fn job_posting_follows_verification_status() {
    let (service, _, _) = build_service();
    let (_, admin_token) = admin(&service);
    let (company, company_token) = register(&service, Role::Company, "route-co");
    let router = router_with_service(service);

    let (status, payload) = send(
        &router,
        request("POST", "/api/v1/jobs", Some(&company_token), Some(job_body("Payments"))),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(payload["error"]["code"], "forbidden");

    let verification_uri = format!("/api/v1/companies/{}/verification", company.user_id);
    let (status, _) = send(
        &router,
        request(
            "POST",
            &verification_uri,
            Some(&company_token),
            Some(json!({ "decision": "approve" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, payload) = send(
        &router,
        request(
            "POST",
            &verification_uri,
            Some(&admin_token),
            Some(json!({ "decision": "approve" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(payload["data"]["verification_status"], "approved");

    let (status, payload) = send(
        &router,
        request("POST", "/api/v1/jobs", Some(&company_token), Some(job_body("Payments"))),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(payload["data"]["status"], "active");
    assert_eq!(payload["data"]["job_type"], "full-time");

    let (status, payload) = send(
        &router,
        request(
            "POST",
            &verification_uri,
            Some(&admin_token),
            Some(json!({ "decision": "reject" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(payload["error"]["code"], "invalid_transition");
}

#[tokio::test]
async fn application_flow_over_http() {
    let (service, _, _) = build_service();
    let (admin_session, _) = admin(&service);
    let (company, company_token) = approved_company_with_token(&service, &admin_session, "http-co");
    let (student, student_token) = register(&service, Role::Student, "http-student");
    let job = posted_job(&service, &company, "Site Reliability");
    let router = router_with_service(service);

    let application = json!({
        "job_id": job.id,
        "student_id": student.user_id,
        "cover_letter": "On-call ready."
    });
    let (status, payload) = send(
        &router,
        request(
            "POST",
            "/api/v1/applications",
            Some(&student_token),
            Some(application.clone()),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(payload["data"]["status"], "pending");
    let application_id = payload["data"]["id"]
        .as_str()
        .expect("application id")
        .to_string();

    let (status, payload) = send(
        &router,
        request(
            "POST",
            "/api/v1/applications",
            Some(&student_token),
            Some(application),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(payload["error"]["code"], "duplicate_application");

    let applied_uri = format!("/api/v1/jobs/{}/applied", job.id);
    let (status, payload) =
        send(&router, request("GET", &applied_uri, Some(&student_token), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(payload["data"]["applied"], true);

    let status_uri = format!("/api/v1/applications/{application_id}/status");
    let (status, _) = send(
        &router,
        request(
            "POST",
            &status_uri,
            Some(&student_token),
            Some(json!({ "decision": "shortlist" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, payload) = send(
        &router,
        request(
            "POST",
            &status_uri,
            Some(&company_token),
            Some(json!({ "decision": "shortlist" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(payload["data"]["status"], "shortlisted");

    let applicants_uri = format!("/api/v1/jobs/{}/applications", job.id);
    let (status, payload) =
        send(&router, request("GET", &applicants_uri, Some(&company_token), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(payload["data"][0]["student"]["full_name"], "http-student");
}

#[tokio::test]
async fn deleted_job_reports_id_and_then_not_found() {
    let (service, _, _) = build_service();
    let (admin_session, _) = admin(&service);
    let (company, company_token) = approved_company_with_token(&service, &admin_session, "deleter");
    let job = posted_job(&service, &company, "Temporary");
    let router = router_with_service(service);

    let uri = format!("/api/v1/jobs/{}", job.id);
    let (status, payload) = send(&router, request("DELETE", &uri, Some(&company_token), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(payload["data"]["id"], job.id.as_str());

    let (status, payload) = send(&router, request("GET", &uri, None, None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(payload["error"]["code"], "not_found");
}

#[tokio::test]
async fn invalid_job_draft_is_unprocessable() {
    let (service, _, _) = build_service();
    let (admin_session, _) = admin(&service);
    let (_, company_token) = approved_company_with_token(&service, &admin_session, "sloppy");
    let router = router_with_service(service);

    let (status, payload) = send(
        &router,
        request(
            "POST",
            "/api/v1/jobs",
            Some(&company_token),
            Some(json!({ "title": "No location", "job_type": "part-time" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(payload["error"]["code"], "validation_error");
}

#[tokio::test]
async fn store_outage_maps_to_service_unavailable() {
    let service = BoardService::new(
        Arc::new(UnavailableStore),
        Arc::new(InMemorySessions::default()),
    );
    let router = board_router(Arc::new(service));

    let (status, payload) = send(&router, request("GET", "/api/v1/jobs", None, None)).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert!(payload["data"].is_null());
    assert_eq!(payload["error"]["code"], "store_error");
}

#[tokio::test]
async fn malformed_bodies_use_the_error_envelope() {
    let (service, _, _) = build_service();
    let (admin_session, _) = admin(&service);
    let (_, company_token) = approved_company_with_token(&service, &admin_session, "typo-co");
    let router = router_with_service(service);

    let unknown_variant = request(
        "POST",
        "/api/v1/jobs",
        Some(&company_token),
        Some(json!({ "title": "Contractor", "location": "Pune", "job_type": "contract" })),
    );
    let broken_syntax = Request::builder()
        .method("POST")
        .uri("/api/v1/auth/signup")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"email": "half@example.com", "#))
        .expect("request");
    let missing_content_type = Request::builder()
        .method("POST")
        .uri("/api/v1/auth/signup")
        .body(Body::from(r#"{"email": "plain@example.com"}"#))
        .expect("request");

    for malformed in [unknown_variant, broken_syntax, missing_content_type] {
        let (status, payload) = send(&router, malformed).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(payload["data"].is_null());
        assert_eq!(payload["error"]["code"], "validation_error");
        assert!(payload["error"]["message"]
            .as_str()
            .expect("message")
            .starts_with("invalid body"));
    }
}

#[tokio::test]
async fn signout_revokes_the_bearer_token() {
    let (service, _, _) = build_service();
    let (_, token) = register(&service, Role::Student, "logout");
    let router = router_with_service(service);

    let (status, payload) = send(
        &router,
        request("POST", "/api/v1/auth/signout", Some(&token), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(payload["data"]["signed_out"], true);

    let (status, payload) = send(&router, request("GET", "/api/v1/me", Some(&token), None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(payload["error"]["code"], "unauthorized");

    let (status, _) = send(
        &router,
        request("POST", "/api/v1/auth/signout", Some(&token), None),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
