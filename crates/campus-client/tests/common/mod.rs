//! In-process fake of the REST backend, bound to an ephemeral port.

#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
    Json, Router,
};
use chrono::Utc;
use serde_json::{json, Value};

use campus_client::{AppState, ClientConfig};
use campus_shared::token::encode_unsigned;
use campus_store::Database;

pub const PASSWORD: &str = "correct horse";

#[derive(Debug, Default)]
pub struct Backend {
    pub posts: Vec<Value>,
    pub comments: Vec<Value>,
    pub events: Vec<Value>,
    /// Bodies received by `POST campus/events`.
    pub created_events: Vec<Value>,
    /// Whether created events show up in later listings.
    pub keep_created_events: bool,
    pub fail_event_creates: bool,
    pub news: Vec<Value>,
    pub resources: Vec<Value>,
    pub opportunities: Vec<Value>,
    /// Post ids the signed-in user already likes on the server.
    pub liked_posts: HashSet<String>,
    pub upvoted_resources: HashSet<String>,
    /// Bodies received by `PUT users/:id`.
    pub profile_updates: Vec<Value>,
    /// Answer profile updates with the stored user instead of an empty body.
    pub echo_profile: bool,
    pub fail_likes: bool,
    pub fail_comment_deletes: bool,
    /// Every news, resource, opportunity and profile write answers 500.
    pub fail_writes: bool,
    pub response_delay: Duration,
    pub role: String,
    next_id: u32,
}

impl Backend {
    pub fn with_role(role: &str) -> Self {
        Self {
            role: role.to_string(),
            ..Default::default()
        }
    }

    fn next_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{prefix}{}", self.next_id)
    }
}

pub type Shared = Arc<Mutex<Backend>>;

pub struct FakeBackend {
    pub url: String,
    pub state: Shared,
}

impl FakeBackend {
    pub async fn start() -> anyhow::Result<Self> {
        Self::start_with(Backend::with_role("student")).await
    }

    pub async fn start_with(backend: Backend) -> anyhow::Result<Self> {
        let state: Shared = Arc::new(Mutex::new(backend));
        let app = router(state.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });
        Ok(Self {
            url: format!("http://{addr}/api"),
            state,
        })
    }

    pub fn with<R>(&self, f: impl FnOnce(&mut Backend) -> R) -> R {
        f(&mut self.state.lock().unwrap())
    }

    pub fn config(&self) -> ClientConfig {
        config_for(&self.url)
    }
}

pub fn config_for(url: &str) -> ClientConfig {
    ClientConfig {
        api_url: url.to_string(),
        request_timeout: Duration::from_secs(5),
        search_debounce: Duration::from_millis(20),
        events_resync_delay: Duration::from_millis(20),
        ..Default::default()
    }
}

/// An address nothing listens on.
pub async fn dead_url() -> anyhow::Result<String> {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    drop(listener);
    Ok(format!("http://{addr}/api"))
}

pub fn app(config: ClientConfig) -> AppState {
    AppState::with_database(config, Database::open_in_memory().unwrap()).unwrap()
}

pub fn token_for(role: &str) -> String {
    let exp = (Utc::now() + chrono::Duration::hours(1)).timestamp();
    encode_unsigned(&json!({ "user_id": "u1", "role": role, "exp": exp }))
}

pub fn post_json(id: &str, content: &str, like_count: i64, comment_count: i64) -> Value {
    json!({
        "_id": id,
        "title": "Post",
        "content": content,
        "author": { "id": "u2", "username": "ravi", "name": "Ravi" },
        "created_at": "2025-05-01T10:00:00Z",
        "like_count": like_count,
        "is_liked": false,
        "comment_count": comment_count,
        "sentiment": "neutral"
    })
}

pub fn comment_json(id: &str, post_id: &str, content: &str) -> Value {
    json!({
        "_id": id,
        "post_id": post_id,
        "content": content,
        "author": { "id": "u2", "username": "ravi", "name": "Ravi" },
        "created_at": "2025-05-01T11:00:00Z",
        "like_count": 0,
        "is_liked": false
    })
}

pub fn resource_json(id: &str, title: &str, upvotes: i64) -> Value {
    json!({
        "_id": id,
        "title": title,
        "subject": "Mathematics",
        "semester": "4",
        "type": "notes",
        "filename": format!("{id}.pdf"),
        "upvotes": upvotes,
        "user_vote": "none"
    })
}

pub fn opportunity_json(id: &str, title: &str) -> Value {
    json!({
        "_id": id,
        "title": title,
        "description": "Summer role",
        "type": "internship",
        "domain": "software",
        "created_at": "2025-05-01T09:00:00Z"
    })
}

fn ok(data: Value) -> Response {
    Json(json!({ "status": "success", "data": data })).into_response()
}

fn error(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "status": "error", "message": message }))).into_response()
}

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("Bearer "))
}

fn router(state: Shared) -> Router {
    Router::new()
        .route("/api/users/login", post(login))
        .route("/api/social-feed/posts", get(list_posts).post(create_post))
        .route("/api/social-feed/posts/:id/like", post(like_post))
        .route(
            "/api/social-feed/posts/:id/comments",
            get(list_comments).post(create_comment),
        )
        .route("/api/social-feed/comments/:id", delete(delete_comment))
        .route("/api/social-feed/comments/:id/like", post(like_comment))
        .route("/api/campus/events", get(list_events).post(create_event))
        .route("/api/campus/news", get(list_news).post(create_news))
        .route("/api/campus/news/:id", delete(delete_news))
        .route("/api/resources", get(list_resources))
        .route("/api/resources/:id", delete(delete_resource))
        .route("/api/resources/:id/like", post(upvote_resource))
        .route("/api/opportunities", get(list_opportunities).post(create_opportunity))
        .route("/api/opportunities/:id", delete(delete_opportunity))
        .route("/api/users/:id", put(update_user))
        .with_state(state)
}

async fn login(State(state): State<Shared>, Json(body): Json<Value>) -> Response {
    if body["password"] != PASSWORD {
        return error(StatusCode::UNAUTHORIZED, "Invalid username or password");
    }
    let role = state.lock().unwrap().role.clone();
    ok(json!({
        "token": token_for(&role),
        "user": {
            "_id": "u1",
            "username": body["username"],
            "name": "Asha Rao",
            "email": "asha@college.edu",
            "role": role
        }
    }))
}

async fn list_posts(State(state): State<Shared>, headers: HeaderMap) -> Response {
    if !authorized(&headers) {
        return error(StatusCode::UNAUTHORIZED, "Not authorized");
    }
    let posts = state.lock().unwrap().posts.clone();
    ok(json!({ "posts": posts, "total_count": posts.len(), "has_more": false }))
}

async fn create_post(State(state): State<Shared>, Json(body): Json<Value>) -> Response {
    let delay = state.lock().unwrap().response_delay;
    tokio::time::sleep(delay).await;

    let mut backend = state.lock().unwrap();
    let id = backend.next_id("p");
    let mut post = post_json(&id, body["content"].as_str().unwrap_or_default(), 0, 0);
    post["title"] = body["title"].clone();
    backend.posts.insert(0, post.clone());
    ok(json!({ "post": post }))
}

async fn like_post(State(state): State<Shared>, Path(id): Path<String>) -> Response {
    let mut backend = state.lock().unwrap();
    if backend.fail_likes {
        return error(StatusCode::INTERNAL_SERVER_ERROR, "Could not update like");
    }
    let liked = !backend.liked_posts.remove(&id);
    if liked {
        backend.liked_posts.insert(id);
    }
    ok(json!({ "liked": liked }))
}

async fn like_comment(State(state): State<Shared>, Path(id): Path<String>) -> Response {
    let mut backend = state.lock().unwrap();
    if backend.fail_likes {
        return error(StatusCode::INTERNAL_SERVER_ERROR, "Could not update like");
    }
    let Some(comment) = backend.comments.iter_mut().find(|c| c["_id"] == id.as_str()) else {
        return error(StatusCode::NOT_FOUND, "Comment not found");
    };
    let liked = !comment["is_liked"].as_bool().unwrap_or(false);
    let count = comment["like_count"].as_i64().unwrap_or(0) + if liked { 1 } else { -1 };
    comment["is_liked"] = json!(liked);
    comment["like_count"] = json!(count.max(0));
    ok(json!({ "comment": comment.clone() }))
}

async fn list_comments(State(state): State<Shared>, Path(post_id): Path<String>) -> Response {
    let comments: Vec<Value> = state
        .lock()
        .unwrap()
        .comments
        .iter()
        .filter(|c| c["post_id"] == post_id.as_str())
        .cloned()
        .collect();
    ok(json!({ "comments": comments }))
}

async fn create_comment(
    State(state): State<Shared>,
    Path(post_id): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    let mut backend = state.lock().unwrap();
    let id = backend.next_id("reply");
    let comment = comment_json(&id, &post_id, body["content"].as_str().unwrap_or_default());
    backend.comments.push(comment.clone());
    ok(json!({ "comment": comment }))
}

async fn delete_comment(State(state): State<Shared>, Path(id): Path<String>) -> Response {
    let mut backend = state.lock().unwrap();
    if backend.fail_comment_deletes {
        return error(StatusCode::INTERNAL_SERVER_ERROR, "Could not delete comment");
    }
    backend.comments.retain(|c| c["_id"] != id.as_str());
    ok(json!({}))
}

async fn list_events(State(state): State<Shared>) -> Response {
    let events = state.lock().unwrap().events.clone();
    ok(json!({ "events": events }))
}

async fn create_event(State(state): State<Shared>, Json(body): Json<Value>) -> Response {
    let mut backend = state.lock().unwrap();
    if backend.fail_event_creates {
        return error(StatusCode::SERVICE_UNAVAILABLE, "Events are read-only right now");
    }
    let id = backend.next_id("e");
    let mut event = body.clone();
    event["_id"] = json!(id);
    backend.created_events.push(body);
    if backend.keep_created_events {
        backend.events.push(event.clone());
    }
    ok(json!({ "event": event }))
}

fn write_failure(backend: &Backend) -> Option<Response> {
    backend
        .fail_writes
        .then(|| error(StatusCode::INTERNAL_SERVER_ERROR, "Write failed"))
}

async fn list_news(State(state): State<Shared>) -> Response {
    let news = state.lock().unwrap().news.clone();
    ok(json!({ "news": news }))
}

/// Echoes the draft under a fresh id, without sentiment fields.
async fn create_news(State(state): State<Shared>, Json(body): Json<Value>) -> Response {
    let mut backend = state.lock().unwrap();
    if let Some(failed) = write_failure(&backend) {
        return failed;
    }
    let id = backend.next_id("n");
    let mut item = body;
    item["_id"] = json!(id);
    item["date"] = json!("2025-05-02T08:00:00Z");
    backend.news.insert(0, item.clone());
    ok(json!({ "news": item }))
}

async fn delete_news(State(state): State<Shared>, Path(id): Path<String>) -> Response {
    let mut backend = state.lock().unwrap();
    if let Some(failed) = write_failure(&backend) {
        return failed;
    }
    backend.news.retain(|n| n["_id"] != id.as_str());
    ok(json!({}))
}

async fn list_resources(State(state): State<Shared>) -> Response {
    let resources = state.lock().unwrap().resources.clone();
    ok(json!({ "resources": resources, "total_count": resources.len(), "has_more": false }))
}

/// Counts from the stored record, so other voters show up in the answer.
async fn upvote_resource(State(state): State<Shared>, Path(id): Path<String>) -> Response {
    let mut backend = state.lock().unwrap();
    if let Some(failed) = write_failure(&backend) {
        return failed;
    }
    let upvoted = !backend.upvoted_resources.remove(&id);
    if upvoted {
        backend.upvoted_resources.insert(id.clone());
    }
    let Some(resource) = backend.resources.iter_mut().find(|r| r["_id"] == id.as_str()) else {
        return error(StatusCode::NOT_FOUND, "Resource not found");
    };
    let upvotes = resource["upvotes"].as_i64().unwrap_or(0) + if upvoted { 1 } else { -1 };
    resource["upvotes"] = json!(upvotes);
    ok(json!({ "upvotes": upvotes, "is_upvoted": upvoted }))
}

async fn delete_resource(State(state): State<Shared>, Path(id): Path<String>) -> Response {
    let mut backend = state.lock().unwrap();
    if let Some(failed) = write_failure(&backend) {
        return failed;
    }
    backend.resources.retain(|r| r["_id"] != id.as_str());
    ok(json!({}))
}

async fn list_opportunities(State(state): State<Shared>) -> Response {
    let opportunities = state.lock().unwrap().opportunities.clone();
    ok(json!({ "opportunities": opportunities, "total_count": opportunities.len(), "has_more": false }))
}

/// Answers with the new id only.
async fn create_opportunity(State(state): State<Shared>, Json(body): Json<Value>) -> Response {
    let mut backend = state.lock().unwrap();
    if let Some(failed) = write_failure(&backend) {
        return failed;
    }
    let id = backend.next_id("o");
    let mut opportunity = body;
    opportunity["_id"] = json!(id);
    backend.opportunities.insert(0, opportunity);
    ok(json!({ "opportunity_id": id, "is_verified": false }))
}

async fn delete_opportunity(State(state): State<Shared>, Path(id): Path<String>) -> Response {
    let mut backend = state.lock().unwrap();
    if let Some(failed) = write_failure(&backend) {
        return failed;
    }
    backend.opportunities.retain(|o| o["_id"] != id.as_str());
    ok(json!({}))
}

async fn update_user(
    State(state): State<Shared>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    let mut backend = state.lock().unwrap();
    if let Some(failed) = write_failure(&backend) {
        return failed;
    }
    backend.profile_updates.push(body.clone());
    if !backend.echo_profile {
        return ok(json!({}));
    }
    let mut user = json!({
        "_id": id,
        "username": "asha",
        "name": "Asha Rao",
        "email": "asha@college.edu",
        "role": backend.role
    });
    if let (Some(user), Some(fields)) = (user.as_object_mut(), body.as_object()) {
        for (key, value) in fields {
            user.insert(key.clone(), value.clone());
        }
    }
    ok(user)
}
