use super::*;
use axum::{
    body::{self, Body},
    http::{header, Request},
};
use shared::domain::Contact;
use std::sync::atomic::{AtomicUsize, Ordering};
use storage::ContactStore;
use tower::ServiceExt;

const FORM: &str = "application/x-www-form-urlencoded";

async fn test_app() -> (Router, Storage) {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    let state = AppState {
        api: ApiContext::new(Arc::new(storage.clone())),
    };
    (build_router(Arc::new(state), 64 * 1024), storage)
}

async fn add_named(storage: &Storage, first: &str, last: &str) -> Contact {
    let contact = storage.create_empty_contact().await.expect("create");
    storage
        .update_contact(
            &contact.id,
            ContactUpdate {
                first: Some(first.into()),
                last: Some(last.into()),
                ..ContactUpdate::default()
            },
        )
        .await
        .expect("update")
        .expect("exists")
}

async fn body_text(response: Response) -> String {
    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    String::from_utf8(bytes.to_vec()).expect("utf8")
}

fn location(response: &Response) -> String {
    response
        .headers()
        .get(header::LOCATION)
        .expect("location header")
        .to_str()
        .expect("ascii location")
        .to_string()
}

fn get(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).expect("request")
}

fn post_form(uri: &str, body: &str) -> Request<Body> {
    Request::post(uri)
        .header(header::CONTENT_TYPE, FORM)
        .body(Body::from(body.to_string()))
        .expect("request")
}

#[tokio::test]
async fn healthz_reports_ok_when_storage_is_ready() {
    let (app, _storage) = test_app().await;
    let response = app.oneshot(get("/healthz")).await.expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, "ok");
}

#[tokio::test]
async fn root_lists_all_contacts_without_query() {
    let (app, storage) = test_app().await;
    add_named(&storage, "Ana", "Smith").await;
    add_named(&storage, "Bob", "Jones").await;

    let response = app.oneshot(get("/")).await.expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains("Ana Smith"));
    assert!(html.contains("Bob Jones"));
    assert!(html.contains(r#"value="""#));
}

#[tokio::test]
async fn root_filters_by_query_and_echoes_it_into_the_search_box() {
    let (app, storage) = test_app().await;
    add_named(&storage, "Ana", "Smith").await;
    add_named(&storage, "Bob", "Jones").await;

    let response = app.oneshot(get("/?q=an")).await.expect("response");
    let html = body_text(response).await;
    assert!(html.contains("Ana Smith"));
    assert!(!html.contains("Bob Jones"));
    assert!(html.contains(r#"value="an""#));
}

#[tokio::test]
async fn root_renders_placeholders() {
    let (app, storage) = test_app().await;

    let empty = body_text(app.clone().oneshot(get("/")).await.expect("response")).await;
    assert!(empty.contains("<i>No contacts</i>"));

    let nameless = storage.create_empty_contact().await.expect("create");
    storage
        .set_favorite(&nameless.id, true)
        .await
        .expect("favorite");
    let html = body_text(app.oneshot(get("/")).await.expect("response")).await;
    assert!(html.contains("<i>No Name</i> <span>★</span>"));
}

#[tokio::test]
async fn root_escapes_contact_names() {
    let (app, storage) = test_app().await;
    add_named(&storage, "<script>", "Jones").await;
    let html = body_text(app.oneshot(get("/")).await.expect("response")).await;
    assert!(html.contains("&lt;script&gt; Jones"));
    assert!(!html.contains("<script>"));
}

#[tokio::test]
async fn root_data_returns_loader_json() {
    let (app, storage) = test_app().await;
    add_named(&storage, "Ana", "Smith").await;

    let response = app
        .clone()
        .oneshot(get("/?_data=root"))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let data: RootData = serde_json::from_str(&body_text(response).await).expect("json");
    assert_eq!(data.query, None);
    assert_eq!(data.contacts.len(), 1);

    let response = app
        .oneshot(get("/?_data=root&q="))
        .await
        .expect("response");
    let data: RootData = serde_json::from_str(&body_text(response).await).expect("json");
    assert_eq!(data.query, Some(String::new()));
    assert_eq!(data.contacts.len(), 1);
}

#[tokio::test]
async fn new_redirects_to_editor_of_empty_contact() {
    let (app, storage) = test_app().await;
    let response = app
        .oneshot(Request::post("/").body(Body::empty()).expect("request"))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let location = location(&response);
    let id = location
        .strip_prefix("/contacts/")
        .and_then(|rest| rest.strip_suffix("/edit"))
        .expect("edit location");
    let contact = storage
        .get_contact(&ContactId::from(id))
        .await
        .expect("get")
        .expect("created");
    assert!(contact.is_empty());
}

#[tokio::test]
async fn destroy_redirects_home_and_removes_contact() {
    let (app, storage) = test_app().await;
    let contact = add_named(&storage, "Ana", "Smith").await;

    let response = app
        .oneshot(post_form(&format!("/contacts/{}/destroy", contact.id), ""))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/");
    assert!(storage
        .get_contact(&contact.id)
        .await
        .expect("get")
        .is_none());
}

#[tokio::test]
async fn contact_page_shows_details_and_missing_contact_is_not_found() {
    let (app, storage) = test_app().await;
    let contact = add_named(&storage, "Ana", "Smith").await;
    storage
        .update_contact(
            &contact.id,
            ContactUpdate {
                first: Some("Ana".into()),
                last: Some("Smith".into()),
                twitter: Some("@anasmith".into()),
                notes: Some("Reading group".into()),
                ..ContactUpdate::default()
            },
        )
        .await
        .expect("update");

    let response = app
        .clone()
        .oneshot(get(&format!("/contacts/{}", contact.id)))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains(r#"href="https://twitter.com/anasmith""#));
    assert!(html.contains("Reading group"));
    assert!(html.contains(&format!(r#"action="/contacts/{}/destroy""#, contact.id)));

    let missing = app
        .oneshot(get("/contacts/ghost"))
        .await
        .expect("response");
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    assert!(body_text(missing).await.contains("no contact found for ghost"));
}

#[tokio::test]
async fn edit_form_saves_and_redirects_to_detail() {
    let (app, storage) = test_app().await;
    let contact = storage.create_empty_contact().await.expect("create");

    let edit = app
        .clone()
        .oneshot(get(&format!("/contacts/{}/edit", contact.id)))
        .await
        .expect("response");
    assert_eq!(edit.status(), StatusCode::OK);
    assert!(body_text(edit).await.contains(r#"id="contact-form""#));

    let response = app
        .oneshot(post_form(
            &format!("/contacts/{}/edit", contact.id),
            "first=Carla&last=Mendes&twitter=%40cmendes&avatar=&notes=Met+at+a+conference",
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), format!("/contacts/{}", contact.id));

    let saved = storage
        .get_contact(&contact.id)
        .await
        .expect("get")
        .expect("exists");
    assert_eq!(saved.display_name().as_deref(), Some("Carla Mendes"));
    assert_eq!(saved.twitter.as_deref(), Some("@cmendes"));
    assert_eq!(saved.avatar, None);
    assert_eq!(saved.notes.as_deref(), Some("Met at a conference"));
}

#[tokio::test]
async fn favorite_form_toggles_flag() {
    let (app, storage) = test_app().await;
    let contact = add_named(&storage, "Ana", "Smith").await;
    let uri = format!("/contacts/{}", contact.id);

    let response = app
        .clone()
        .oneshot(post_form(&uri, "favorite=true"))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert!(storage.get_contact(&contact.id).await.expect("get").expect("exists").favorite);

    app.oneshot(post_form(&uri, "favorite=false"))
        .await
        .expect("response");
    assert!(!storage.get_contact(&contact.id).await.expect("get").expect("exists").favorite);
}

#[tokio::test]
async fn favorite_form_rejects_missing_or_unknown_values() {
    let (app, storage) = test_app().await;
    let contact = add_named(&storage, "Ana", "Smith").await;
    let uri = format!("/contacts/{}", contact.id);

    for body in ["", "favorite=yes"] {
        let response = app
            .clone()
            .oneshot(post_form(&uri, body))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(body_text(response).await.contains("favorite"));
    }
    assert!(!storage.get_contact(&contact.id).await.expect("get").expect("exists").favorite);
}

#[tokio::test]
async fn padded_route_id_leaves_the_real_contact_alone() {
    let (app, storage) = test_app().await;
    let contact = add_named(&storage, "Ana", "Smith").await;

    let response = app
        .clone()
        .oneshot(post_form(&format!("/contacts/%20{}/destroy", contact.id), ""))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert!(storage.get_contact(&contact.id).await.expect("get").is_some());

    let page = app
        .oneshot(get(&format!("/contacts/%20{}", contact.id)))
        .await
        .expect("response");
    assert_eq!(page.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn blank_route_id_is_a_server_error_that_never_reaches_the_store() {
    let store = Arc::new(CountingStore::default());
    let state = AppState {
        api: ApiContext::new(store.clone()),
    };
    let app = build_router(Arc::new(state), 1024);

    let response = app
        .oneshot(post_form("/contacts/%20/destroy", ""))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let html = body_text(response).await;
    assert!(html.contains("Something went wrong while loading this page."));
    assert_eq!(store.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn oversized_form_body_is_rejected() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    let contact = storage.create_empty_contact().await.expect("create");
    let state = AppState {
        api: ApiContext::new(Arc::new(storage)),
    };
    let app = build_router(Arc::new(state), 16);

    let response = app
        .oneshot(post_form(
            &format!("/contacts/{}/edit", contact.id),
            &format!("notes={}", "x".repeat(256)),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
}

#[derive(Default)]
struct CountingStore {
    calls: AtomicUsize,
}

impl CountingStore {
    fn touch(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait::async_trait]
impl ContactStore for CountingStore {
    async fn list_contacts(&self, _query: Option<&str>) -> anyhow::Result<Vec<Contact>> {
        self.touch();
        Ok(Vec::new())
    }

    async fn create_empty_contact(&self) -> anyhow::Result<Contact> {
        self.touch();
        Err(anyhow::anyhow!("not expected"))
    }

    async fn get_contact(&self, _id: &ContactId) -> anyhow::Result<Option<Contact>> {
        self.touch();
        Ok(None)
    }

    async fn update_contact(
        &self,
        _id: &ContactId,
        _update: ContactUpdate,
    ) -> anyhow::Result<Option<Contact>> {
        self.touch();
        Ok(None)
    }

    async fn set_favorite(
        &self,
        _id: &ContactId,
        _favorite: bool,
    ) -> anyhow::Result<Option<Contact>> {
        self.touch();
        Ok(None)
    }

    async fn delete_contact(&self, _id: &ContactId) -> anyhow::Result<()> {
        self.touch();
        Ok(())
    }

    async fn health_check(&self) -> anyhow::Result<()> {
        Ok(())
    }
}

struct FailingStore;

#[async_trait::async_trait]
impl ContactStore for FailingStore {
    async fn list_contacts(&self, _query: Option<&str>) -> anyhow::Result<Vec<Contact>> {
        Err(anyhow::anyhow!("database is locked"))
    }

    async fn create_empty_contact(&self) -> anyhow::Result<Contact> {
        Err(anyhow::anyhow!("database is locked"))
    }

    async fn get_contact(&self, _id: &ContactId) -> anyhow::Result<Option<Contact>> {
        Err(anyhow::anyhow!("database is locked"))
    }

    async fn update_contact(
        &self,
        _id: &ContactId,
        _update: ContactUpdate,
    ) -> anyhow::Result<Option<Contact>> {
        Err(anyhow::anyhow!("database is locked"))
    }

    async fn set_favorite(
        &self,
        _id: &ContactId,
        _favorite: bool,
    ) -> anyhow::Result<Option<Contact>> {
        Err(anyhow::anyhow!("database is locked"))
    }

    async fn delete_contact(&self, _id: &ContactId) -> anyhow::Result<()> {
        Err(anyhow::anyhow!("database is locked"))
    }

    async fn health_check(&self) -> anyhow::Result<()> {
        Err(anyhow::anyhow!("database is locked"))
    }
}

#[tokio::test]
async fn store_failures_render_the_generic_error_page() {
    let state = AppState {
        api: ApiContext::new(Arc::new(FailingStore)),
    };
    let app = build_router(Arc::new(state), 1024);

    let page = app.clone().oneshot(get("/")).await.expect("response");
    assert_eq!(page.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let html = body_text(page).await;
    assert!(html.contains("Something went wrong while loading this page."));
    assert!(!html.contains("database is locked"));

    let data = app
        .clone()
        .oneshot(get("/?_data=root"))
        .await
        .expect("response");
    assert_eq!(data.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let err: shared::error::ApiError =
        serde_json::from_str(&body_text(data).await).expect("json");
    assert_eq!(err.code, shared::error::ErrorCode::Internal);

    let health = app.oneshot(get("/healthz")).await.expect("response");
    assert_eq!(health.status(), StatusCode::SERVICE_UNAVAILABLE);
}
