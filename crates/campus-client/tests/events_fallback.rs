mod common;

use campus_client::screens::{DataSource, FallbackPolicy};
use campus_client::{AppState, Session};
use campus_shared::models::{Event, EventDraft, UserProfile};
use campus_shared::types::Role;
use campus_shared::EntityId;
use serde_json::json;

use common::FakeBackend;

fn sign_in(app: &AppState, role: Role) {
    let user = UserProfile {
        id: "u1".into(),
        username: "asha".into(),
        name: "Asha Rao".into(),
        role: Some(role),
        ..Default::default()
    };
    let token = common::token_for(if role == Role::Admin { "admin" } else { "student" });
    app.session.login(Session::from_login(&user, token)).unwrap();
}

fn draft(title: &str) -> EventDraft {
    EventDraft {
        title: title.into(),
        description: "Bring your laptop".into(),
        date: "2025-06-14".into(),
        location: "Hall B".into(),
        category: "tech".into(),
        ..Default::default()
    }
}

fn cached_event(title: &str) -> Event {
    draft(title).to_event(EntityId::provisional())
}

#[tokio::test]
async fn unreachable_server_shows_cache_without_error() -> anyhow::Result<()> {
    let app = common::app(common::config_for(&common::dead_url().await?));
    sign_in(&app, Role::Student);
    let events = app.events();
    let cached = vec![cached_event("Hackathon"), cached_event("Career fair")];
    assert!(events.write_cache(&cached));

    events.refresh().await?;

    let state = events.state()?;
    assert_eq!(state.items.items(), cached.as_slice());
    assert_eq!(state.error, None);
    assert_eq!(state.source, DataSource::LocalCache);
    assert!(!state.loading);
    Ok(())
}

#[tokio::test]
async fn server_list_is_mirrored_into_the_cache() -> anyhow::Result<()> {
    let backend = FakeBackend::start().await?;
    backend.with(|b| {
        b.events.push(json!({
            "_id": "e9",
            "title": "Orientation",
            "date": "2025-07-01",
            "location": "Main lawn",
            "category": "general"
        }))
    });
    let app = common::app(backend.config());
    sign_in(&app, Role::Student);
    let events = app.events();

    events.refresh().await?;

    let state = events.state()?;
    assert_eq!(state.source, DataSource::Server);
    assert_eq!(state.items.len(), 1);
    let cache = events.read_cache();
    assert_eq!(cache.len(), 1);
    assert_eq!(cache[0].id, EntityId::new("e9"));
    Ok(())
}

#[tokio::test]
async fn empty_server_list_falls_back_to_cache_for_students() -> anyhow::Result<()> {
    let backend = FakeBackend::start().await?;
    let app = common::app(backend.config());
    sign_in(&app, Role::Student);
    let events = app.events();
    events.write_cache(&[cached_event("Hackathon")]);

    events.refresh().await?;

    let state = events.state()?;
    assert_eq!(state.items.len(), 1);
    assert_eq!(state.source, DataSource::LocalCache);
    assert!(backend.with(|b| b.created_events.is_empty()));
    Ok(())
}

#[tokio::test]
async fn admin_pushes_each_cached_event_back_once() -> anyhow::Result<()> {
    let backend = FakeBackend::start().await?;
    let app = common::app(backend.config());
    sign_in(&app, Role::Admin);
    let events = app.events();
    events.write_cache(&[cached_event("Hackathon"), cached_event("Career fair")]);

    events.refresh().await?;
    assert_eq!(backend.with(|b| b.created_events.len()), 2);

    // The server still lists nothing; a second pass must not repost.
    events.refresh().await?;
    events.refresh().await?;
    let created = backend.with(|b| b.created_events.clone());
    assert_eq!(created.len(), 2);
    assert!(created.iter().all(|e| e.get("id").is_none()));
    assert_eq!(events.state()?.source, DataSource::LocalCache);
    Ok(())
}

#[tokio::test]
async fn failed_push_is_retried_on_the_next_pass() -> anyhow::Result<()> {
    let backend = FakeBackend::start().await?;
    backend.with(|b| b.fail_event_creates = true);
    let app = common::app(backend.config());
    sign_in(&app, Role::Admin);
    let events = app.events();
    let hackathon = cached_event("Hackathon");
    events.write_cache(&[hackathon.clone()]);

    events.refresh().await?;
    assert!(backend.with(|b| b.created_events.is_empty()));
    let hash = hackathon.content_hash();
    assert!(!app.database.lock().unwrap().was_sync_attempted(&hash)?);

    backend.with(|b| b.fail_event_creates = false);
    events.refresh().await?;
    events.refresh().await?;
    assert_eq!(backend.with(|b| b.created_events.len()), 1);
    assert!(app.database.lock().unwrap().was_sync_attempted(&hash)?);
    Ok(())
}

#[tokio::test]
async fn pushed_events_appear_after_the_resync() -> anyhow::Result<()> {
    let backend = FakeBackend::start().await?;
    backend.with(|b| b.keep_created_events = true);
    let app = common::app(backend.config());
    sign_in(&app, Role::Admin);
    let events = app.events();
    events.write_cache(&[cached_event("Hackathon")]);

    events.refresh().await?;

    let state = events.state()?;
    assert_eq!(state.source, DataSource::Server);
    assert_eq!(state.items.len(), 1);
    assert!(!state.items.items()[0].id.is_provisional());
    assert!(!events.read_cache()[0].id.is_provisional());
    Ok(())
}

#[tokio::test]
async fn create_while_offline_is_kept_locally() -> anyhow::Result<()> {
    let app = common::app(common::config_for(&common::dead_url().await?));
    sign_in(&app, Role::Admin);
    let events = app.events();

    events.create(draft("Hackathon")).await?;

    let state = events.state()?;
    assert_eq!(state.items.len(), 1);
    assert_eq!(state.source, DataSource::LocalCache);
    assert_eq!(events.read_cache(), state.items.items().to_vec());
    Ok(())
}

#[tokio::test]
async fn without_fallback_an_unreachable_server_is_an_error() -> anyhow::Result<()> {
    let app = common::app(common::config_for(&common::dead_url().await?));
    sign_in(&app, Role::Student);
    let events = app.events().with_policy(FallbackPolicy::None);
    events.write_cache(&[cached_event("Hackathon")]);

    assert!(events.refresh().await.is_err());
    let state = events.state()?;
    assert!(state.items.is_empty());
    assert!(state.error.is_some());
    Ok(())
}
