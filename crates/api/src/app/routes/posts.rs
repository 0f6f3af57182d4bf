use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Form, Json, Router,
};
use chrono::Utc;

use board_auth::RequestIdentity;
use board_posts::PostForm;

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_posts))
        .route("/add", post(add_post))
        .route("/:id", get(get_post))
        .route("/:id/edit", get(edit_post_form).post(update_post))
        .route("/:id/delete", post(delete_post))
}

pub async fn list_posts(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<dto::PageQuery>,
) -> Response {
    match services.list_posts(query.to_request()).await {
        Ok(page) => (StatusCode::OK, Json(dto::post_page_to_json(page))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn get_post(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> Response {
    match services.get_post(&id).await {
        Ok(post) => (StatusCode::OK, Json(dto::post_to_json(&post))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn add_post(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(identity): Extension<RequestIdentity>,
    Form(form): Form<PostForm>,
) -> Response {
    match services.create_post(&identity, form, Utc::now()).await {
        Ok(post) => (StatusCode::OK, Json(serde_json::json!({ "id": post.id }))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn edit_post_form(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(identity): Extension<RequestIdentity>,
    Path(id): Path<String>,
) -> Response {
    match services.post_for_edit(&id, &identity).await {
        Ok(post) => (StatusCode::OK, Json(dto::post_to_json(&post))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn update_post(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(identity): Extension<RequestIdentity>,
    Path(id): Path<String>,
    Form(form): Form<PostForm>,
) -> Response {
    match services.update_post(&id, &identity, form, Utc::now()).await {
        Ok(post) => (StatusCode::OK, Json(serde_json::json!({ "id": post.id }))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn delete_post(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(identity): Extension<RequestIdentity>,
    Path(id): Path<String>,
) -> Response {
    match services.delete_post(&id, &identity).await {
        Ok(id) => (StatusCode::OK, Json(serde_json::json!({ "id": id }))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}
