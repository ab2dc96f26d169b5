use super::common::*;
use axum::body::Body;
use axum::http::{header, HeaderMap, HeaderValue, Request, StatusCode};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

use crate::accounts::{AccountService, InMemoryUserStore};
use crate::reviews::router::session_token;
use crate::reviews::{dealership_router, SESSION_COOKIE};

fn form_post(uri: &str, body: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::post(uri).header(
        header::CONTENT_TYPE,
        "application/x-www-form-urlencoded",
    );
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(body.to_string())).expect("request builds")
}

fn get(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::get(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).expect("request builds")
}

fn location(response: &axum::response::Response) -> &str {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|value| value.to_str().ok())
        .expect("location header")
}

/// Registers a user and returns the `name=value` cookie pair to replay.
async fn register(router: &axum::Router) -> String {
    let response = router
        .clone()
        .oneshot(form_post(
            "/djangoapp/registration",
            "username=ada&psw=s3cret&firstname=Ada&lastname=Lovelace",
            None,
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/djangoapp/");
    let cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|value| value.to_str().ok())
        .expect("session cookie issued");
    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("Max-Age=1209600"));
    cookie
        .split(';')
        .next()
        .expect("cookie pair present")
        .to_string()
}

#[tokio::test]
async fn index_lists_dealerships() {
    let router = router_with(Arc::new(MemoryDealers::seeded()));

    let response = router
        .oneshot(get("/djangoapp/?state=TX", None))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    let dealers = payload["dealerships"].as_array().expect("dealer array");
    assert_eq!(dealers.len(), 1);
    assert_eq!(dealers[0]["full_name"], "Dealer 15 Motors");
}

#[tokio::test]
async fn dealer_details_include_sentiment() {
    let router = router_with(Arc::new(MemoryDealers::seeded()));

    let response = router
        .oneshot(get("/djangoapp/dealer/15", None))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["dealer_id"], 15);
    assert_eq!(payload["reviews"][0]["sentiment"], "positive");
    assert_eq!(payload["reviews"][1]["sentiment"], "negative");
}

#[tokio::test]
async fn upstream_outage_maps_to_bad_gateway() {
    let reviews = Arc::new(build_service(Arc::new(OfflineDealers), KeywordSentiment));
    let accounts = Arc::new(AccountService::new(Arc::new(InMemoryUserStore::default())));
    let router = dealership_router(reviews, accounts);

    let response = router
        .oneshot(get("/djangoapp/", None))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let payload = read_json_body(response).await;
    assert!(payload["error"].as_str().expect("error text").contains("503"));
}

#[tokio::test]
async fn review_pages_redirect_anonymous_users_to_login() {
    let dealers = Arc::new(MemoryDealers::seeded());
    let router = router_with(dealers.clone());

    let response = router
        .clone()
        .oneshot(get("/djangoapp/dealer/15/review", None))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/djangoapp/login");

    let response = router
        .oneshot(form_post("/djangoapp/dealer/15/review", "content=Hi", None))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/djangoapp/login");
    assert!(dealers.submitted().is_empty());
}

#[tokio::test]
async fn expired_sessions_are_sent_back_to_login() {
    let reviews = Arc::new(build_service(
        Arc::new(MemoryDealers::seeded()),
        KeywordSentiment,
    ));
    let accounts = Arc::new(AccountService::new(Arc::new(
        InMemoryUserStore::with_session_ttl(Duration::ZERO),
    )));
    let router = dealership_router(reviews, accounts);

    let response = router
        .clone()
        .oneshot(form_post(
            "/djangoapp/registration",
            "username=ada&psw=s3cret&firstname=Ada&lastname=Lovelace",
            None,
        ))
        .await
        .expect("route executes");
    let cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|value| value.to_str().ok())
        .expect("session cookie issued")
        .to_string();
    assert!(cookie.contains("Max-Age=0"));
    let pair = cookie.split(';').next().expect("cookie pair present");

    let response = router
        .oneshot(get("/djangoapp/dealer/15/review", Some(pair)))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/djangoapp/login");
}

#[tokio::test]
async fn signed_in_user_can_post_a_review() {
    let dealers = Arc::new(MemoryDealers::seeded());
    let router = router_with(dealers.clone());
    let cookie = register(&router).await;

    let response = router
        .clone()
        .oneshot(get("/djangoapp/dealer/15/review", Some(&cookie)))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::OK);
    let form = read_json_body(response).await;
    assert_eq!(form["dealer"]["id"], 15);
    assert_eq!(form["cars"][0]["name"], "A6");

    let response = router
        .oneshot(form_post(
            "/djangoapp/dealer/15/review",
            "content=Loved+it&purchasecheck=on&purchasedate=01%2F02%2F2021&car=1",
            Some(&cookie),
        ))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/djangoapp/dealer/15");

    let submitted = dealers.submitted();
    assert_eq!(submitted.len(), 1);
    assert_eq!(submitted[0].name, "Ada Lovelace");
    assert_eq!(submitted[0].review, "Loved it");
    assert_eq!(submitted[0].purchase_date.as_deref(), Some("2021-01-02T00:00:00"));
}

#[tokio::test]
async fn invalid_review_form_is_unprocessable() {
    let router = router_with(Arc::new(MemoryDealers::seeded()));
    let cookie = register(&router).await;

    let response = router
        .oneshot(form_post(
            "/djangoapp/dealer/15/review",
            "content=Bought&purchasecheck=on&purchasedate=yesterday",
            Some(&cookie),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn duplicate_registration_conflicts() {
    let router = router_with(Arc::new(MemoryDealers::seeded()));
    register(&router).await;

    let response = router
        .oneshot(form_post(
            "/djangoapp/registration",
            "username=ada&psw=other&firstname=A&lastname=L",
            None,
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn login_and_logout_cycle_the_session() {
    let router = router_with(Arc::new(MemoryDealers::seeded()));
    register(&router).await;

    let response = router
        .clone()
        .oneshot(form_post("/djangoapp/login", "username=ada&psw=nope", None))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = router
        .clone()
        .oneshot(form_post("/djangoapp/login", "username=ada&psw=s3cret", None))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(';').next())
        .expect("session cookie")
        .to_string();

    let response = router
        .clone()
        .oneshot(get("/djangoapp/logout", Some(&cookie)))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let cleared = response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|value| value.to_str().ok())
        .expect("cookie cleared");
    assert!(cleared.contains("Max-Age=0"));

    let response = router
        .oneshot(get("/djangoapp/dealer/15/review", Some(&cookie)))
        .await
        .expect("route executes");
    assert_eq!(location(&response), "/djangoapp/login");
}

#[tokio::test]
async fn catalog_writes_require_a_session() {
    let router = router_with(Arc::new(MemoryDealers::seeded()));

    let anonymous = Request::post("/djangoapp/catalog/makes")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"name":"Toyota"}"#))
        .expect("request builds");
    let response = router
        .clone()
        .oneshot(anonymous)
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let cookie = register(&router).await;
    let signed_in = Request::post("/djangoapp/catalog/makes")
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::COOKIE, &cookie)
        .body(Body::from(r#"{"name":"Toyota","description":"Japanese"}"#))
        .expect("request builds");
    let response = router
        .clone()
        .oneshot(signed_in)
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::CREATED);
    let make = read_json_body(response).await;
    assert_eq!(make["id"], 2);

    let response = router
        .oneshot(get("/djangoapp/catalog/makes", None))
        .await
        .expect("route executes");
    let payload = read_json_body(response).await;
    assert_eq!(payload["makes"].as_array().expect("makes").len(), 2);
}

#[tokio::test]
async fn catalog_models_accept_car_type_labels() {
    let router = router_with(Arc::new(MemoryDealers::seeded()));
    let cookie = register(&router).await;

    let labelled = Request::post("/djangoapp/catalog/models")
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::COOKIE, &cookie)
        .body(Body::from(
            r#"{"make_id":1,"name":"A4 Avant","car_type":"Station wagon","year":"2019-01-01"}"#,
        ))
        .expect("request builds");
    let response = router
        .clone()
        .oneshot(labelled)
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::CREATED);
    let model = read_json_body(response).await;
    assert_eq!(model["car_type"], "Wagon");

    let unknown = Request::post("/djangoapp/catalog/models")
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::COOKIE, &cookie)
        .body(Body::from(r#"{"make_id":1,"name":"Hover","car_type":"hovercraft"}"#))
        .expect("request builds");
    let response = router.oneshot(unknown).await.expect("route executes");
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[test]
fn session_token_is_read_among_other_cookies() {
    let mut headers = HeaderMap::new();
    headers.insert(
        header::COOKIE,
        HeaderValue::from_static("csrftoken=abc; sessionid=tok123; theme=dark"),
    );
    let token = session_token(&headers).expect("token found");
    assert_eq!(token.0, "tok123");

    let mut empty = HeaderMap::new();
    empty.insert(
        header::COOKIE,
        HeaderValue::from_str(&format!("{SESSION_COOKIE}=")).expect("valid header"),
    );
    assert!(session_token(&empty).is_none());
}
