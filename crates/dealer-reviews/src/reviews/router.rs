use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
    Form, Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use tracing::error;

use super::service::{ReviewFormInput, ReviewService, ReviewServiceError};
use crate::accounts::{
    AccountError, AccountService, Credentials, Registration, Session, SessionToken, User,
    UserStore,
};
use crate::catalog::{CatalogError, NewCarMake, NewCarModel};
use crate::dealers::DealerApi;
use crate::sentiment::SentimentAnalyzer;

pub const SESSION_COOKIE: &str = "sessionid";

const HOME: &str = "/djangoapp/";
const LOGIN: &str = "/djangoapp/login";

/// Shared handles for the dealership routes.
pub struct DealershipState<D, S, U> {
    pub reviews: Arc<ReviewService<D, S>>,
    pub accounts: Arc<AccountService<U>>,
}

impl<D, S, U> Clone for DealershipState<D, S, U> {
    fn clone(&self) -> Self {
        Self {
            reviews: Arc::clone(&self.reviews),
            accounts: Arc::clone(&self.accounts),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct DealerQuery {
    #[serde(default)]
    pub(crate) state: Option<String>,
}

/// Router builder exposing the dealership site under `/djangoapp`.
pub fn dealership_router<D, S, U>(
    reviews: Arc<ReviewService<D, S>>,
    accounts: Arc<AccountService<U>>,
) -> Router
where
    D: DealerApi + 'static,
    S: SentimentAnalyzer + 'static,
    U: UserStore + 'static,
{
    Router::new()
        .route("/djangoapp/", get(index_handler::<D, S, U>))
        .route("/djangoapp/about", get(about_handler))
        .route("/djangoapp/contact", get(contact_handler))
        .route(
            "/djangoapp/registration",
            post(registration_handler::<D, S, U>),
        )
        .route("/djangoapp/login", post(login_handler::<D, S, U>))
        .route(
            "/djangoapp/logout",
            get(logout_handler::<D, S, U>).post(logout_handler::<D, S, U>),
        )
        .route(
            "/djangoapp/dealer/:dealer_id",
            get(dealer_details_handler::<D, S, U>),
        )
        .route(
            "/djangoapp/dealer/:dealer_id/review",
            get(review_form_handler::<D, S, U>).post(add_review_handler::<D, S, U>),
        )
        .route(
            "/djangoapp/catalog/makes",
            get(list_makes_handler::<D, S, U>).post(create_make_handler::<D, S, U>),
        )
        .route(
            "/djangoapp/catalog/models",
            get(list_models_handler::<D, S, U>).post(create_model_handler::<D, S, U>),
        )
        .with_state(DealershipState { reviews, accounts })
}

pub(crate) async fn index_handler<D, S, U>(
    State(state): State<DealershipState<D, S, U>>,
    Query(query): Query<DealerQuery>,
) -> Response
where
    D: DealerApi + 'static,
    S: SentimentAnalyzer + 'static,
    U: UserStore + 'static,
{
    match state.reviews.dealerships(query.state.as_deref()).await {
        Ok(dealerships) => {
            (StatusCode::OK, Json(json!({ "dealerships": dealerships }))).into_response()
        }
        Err(err) => review_error_response(err),
    }
}

pub(crate) async fn about_handler() -> Json<serde_json::Value> {
    Json(json!({
        "page": "about",
        "title": "About Us",
        "body": "Best Cars is a national dealership network sharing honest reviews from real buyers.",
    }))
}

pub(crate) async fn contact_handler() -> Json<serde_json::Value> {
    Json(json!({
        "page": "contact",
        "title": "Contact Us",
        "email": "support@bestcars.example",
        "phone": "+1-555-0100",
    }))
}

pub(crate) async fn registration_handler<D, S, U>(
    State(state): State<DealershipState<D, S, U>>,
    Form(registration): Form<Registration>,
) -> Response
where
    D: DealerApi + 'static,
    S: SentimentAnalyzer + 'static,
    U: UserStore + 'static,
{
    match state.accounts.register(registration) {
        Ok(session) => signed_in(session, state.accounts.session_ttl()),
        Err(err) => account_error_response(err),
    }
}

pub(crate) async fn login_handler<D, S, U>(
    State(state): State<DealershipState<D, S, U>>,
    Form(credentials): Form<Credentials>,
) -> Response
where
    D: DealerApi + 'static,
    S: SentimentAnalyzer + 'static,
    U: UserStore + 'static,
{
    match state.accounts.login(credentials) {
        Ok(session) => signed_in(session, state.accounts.session_ttl()),
        Err(err) => account_error_response(err),
    }
}

pub(crate) async fn logout_handler<D, S, U>(
    State(state): State<DealershipState<D, S, U>>,
    headers: HeaderMap,
) -> Response
where
    D: DealerApi + 'static,
    S: SentimentAnalyzer + 'static,
    U: UserStore + 'static,
{
    if let Some(token) = session_token(&headers) {
        if let Err(err) = state.accounts.logout(&token) {
            return account_error_response(err);
        }
    }

    let expired = format!("{SESSION_COOKIE}=; Max-Age=0; Path=/; HttpOnly; SameSite=Lax");
    ([(header::SET_COOKIE, expired)], Redirect::to(HOME)).into_response()
}

pub(crate) async fn dealer_details_handler<D, S, U>(
    State(state): State<DealershipState<D, S, U>>,
    Path(dealer_id): Path<i64>,
) -> Response
where
    D: DealerApi + 'static,
    S: SentimentAnalyzer + 'static,
    U: UserStore + 'static,
{
    match state.reviews.dealer_details(dealer_id).await {
        Ok(details) => (StatusCode::OK, Json(details)).into_response(),
        Err(err) => review_error_response(err),
    }
}

pub(crate) async fn review_form_handler<D, S, U>(
    State(state): State<DealershipState<D, S, U>>,
    Path(dealer_id): Path<i64>,
    headers: HeaderMap,
) -> Response
where
    D: DealerApi + 'static,
    S: SentimentAnalyzer + 'static,
    U: UserStore + 'static,
{
    match current_user(&state.accounts, &headers) {
        Ok(Some(_)) => {}
        Ok(None) => return Redirect::to(LOGIN).into_response(),
        Err(response) => return response,
    }

    match state.reviews.review_form(dealer_id).await {
        Ok(form) => (StatusCode::OK, Json(form)).into_response(),
        Err(err) => review_error_response(err),
    }
}

pub(crate) async fn add_review_handler<D, S, U>(
    State(state): State<DealershipState<D, S, U>>,
    Path(dealer_id): Path<i64>,
    headers: HeaderMap,
    Form(input): Form<ReviewFormInput>,
) -> Response
where
    D: DealerApi + 'static,
    S: SentimentAnalyzer + 'static,
    U: UserStore + 'static,
{
    let user = match current_user(&state.accounts, &headers) {
        Ok(Some(user)) => user,
        Ok(None) => return Redirect::to(LOGIN).into_response(),
        Err(response) => return response,
    };

    match state.reviews.post_review(&user, dealer_id, input).await {
        Ok(_) => Redirect::to(&format!("/djangoapp/dealer/{dealer_id}")).into_response(),
        Err(err) => review_error_response(err),
    }
}

pub(crate) async fn list_makes_handler<D, S, U>(
    State(state): State<DealershipState<D, S, U>>,
) -> Response
where
    D: DealerApi + 'static,
    S: SentimentAnalyzer + 'static,
    U: UserStore + 'static,
{
    match state.reviews.catalog().makes() {
        Ok(makes) => (StatusCode::OK, Json(json!({ "makes": makes }))).into_response(),
        Err(err) => review_error_response(err.into()),
    }
}

pub(crate) async fn list_models_handler<D, S, U>(
    State(state): State<DealershipState<D, S, U>>,
) -> Response
where
    D: DealerApi + 'static,
    S: SentimentAnalyzer + 'static,
    U: UserStore + 'static,
{
    match state.reviews.catalog().model_details() {
        Ok(models) => (StatusCode::OK, Json(json!({ "models": models }))).into_response(),
        Err(err) => review_error_response(err.into()),
    }
}

pub(crate) async fn create_make_handler<D, S, U>(
    State(state): State<DealershipState<D, S, U>>,
    headers: HeaderMap,
    Json(make): Json<NewCarMake>,
) -> Response
where
    D: DealerApi + 'static,
    S: SentimentAnalyzer + 'static,
    U: UserStore + 'static,
{
    if let Err(response) = require_user(&state.accounts, &headers) {
        return response;
    }

    match state.reviews.catalog().add_make(make) {
        Ok(make) => (StatusCode::CREATED, Json(make)).into_response(),
        Err(err) => review_error_response(err.into()),
    }
}

pub(crate) async fn create_model_handler<D, S, U>(
    State(state): State<DealershipState<D, S, U>>,
    headers: HeaderMap,
    Json(model): Json<NewCarModel>,
) -> Response
where
    D: DealerApi + 'static,
    S: SentimentAnalyzer + 'static,
    U: UserStore + 'static,
{
    if let Err(response) = require_user(&state.accounts, &headers) {
        return response;
    }

    match state.reviews.catalog().add_model(model) {
        Ok(model) => (StatusCode::CREATED, Json(model)).into_response(),
        Err(err) => review_error_response(err.into()),
    }
}

/// Reads the session token from the `Cookie` header(s).
pub(crate) fn session_token(headers: &HeaderMap) -> Option<SessionToken> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|raw| raw.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, value)| *name == SESSION_COOKIE && !value.is_empty())
        .map(|(_, value)| SessionToken(value.to_string()))
}

fn current_user<U>(accounts: &AccountService<U>, headers: &HeaderMap) -> Result<Option<User>, Response>
where
    U: UserStore + 'static,
{
    match session_token(headers) {
        Some(token) => accounts.authenticate(&token).map_err(account_error_response),
        None => Ok(None),
    }
}

fn require_user<U>(accounts: &AccountService<U>, headers: &HeaderMap) -> Result<User, Response>
where
    U: UserStore + 'static,
{
    current_user(accounts, headers)?.ok_or_else(|| {
        let payload = json!({ "error": "authentication required" });
        (StatusCode::UNAUTHORIZED, Json(payload)).into_response()
    })
}

fn signed_in(session: Session, max_age: Duration) -> Response {
    let cookie = format!(
        "{SESSION_COOKIE}={}; Max-Age={}; Path=/; HttpOnly; SameSite=Lax",
        session.token.0,
        max_age.as_secs()
    );
    ([(header::SET_COOKIE, cookie)], Redirect::to(HOME)).into_response()
}

fn account_error_response(err: AccountError) -> Response {
    let status = match &err {
        AccountError::UsernameTaken(_) => StatusCode::CONFLICT,
        AccountError::InvalidCredentials => StatusCode::UNAUTHORIZED,
        AccountError::InvalidInput(_) => StatusCode::UNPROCESSABLE_ENTITY,
        AccountError::Store(_) => {
            error!(error = %err, "account store failure");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    (status, Json(json!({ "error": err.to_string() }))).into_response()
}

fn review_error_response(err: ReviewServiceError) -> Response {
    let status = match &err {
        ReviewServiceError::Upstream(_) => {
            error!(error = %err, "dealer api request failed");
            StatusCode::BAD_GATEWAY
        }
        ReviewServiceError::DealerNotFound(_) => StatusCode::NOT_FOUND,
        ReviewServiceError::UnknownCar(_)
        | ReviewServiceError::InvalidForm(_)
        | ReviewServiceError::Catalog(CatalogError::InvalidLength { .. })
        | ReviewServiceError::Catalog(CatalogError::UnknownMake(_)) => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        ReviewServiceError::Catalog(_) => {
            error!(error = %err, "catalog failure");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    (status, Json(json!({ "error": err.to_string() }))).into_response()
}
