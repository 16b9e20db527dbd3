use std::{collections::HashMap, net::SocketAddr, sync::Arc};

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
    Form, Json, Router,
};
use serde::Deserialize;
use server_api::ApiContext;
use shared::{
    domain::{ContactId, ContactUpdate},
    protocol::{RootData, ROOT_DATA_KEY},
    search::SearchSync,
};
use storage::{demo_contacts, seed_contacts, Storage};
use tower_http::{limit::RequestBodyLimitLayer, trace::TraceLayer};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod app_state;
mod config;
mod error;
mod views;

use app_state::AppState;
use config::{load_settings, prepare_database_url};
use error::{json_error, PageError};
use views::Shell;

type RouteParams = Path<HashMap<String, String>>;

#[derive(Debug, Deserialize)]
struct RootQuery {
    q: Option<String>,
    #[serde(rename = "_data")]
    data: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FavoriteForm {
    favorite: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = load_settings();
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.log_filter));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let database_url = prepare_database_url(&settings.database_url)?;
    let storage = Storage::new(&database_url).await.map_err(|error| {
        error!(
            %database_url,
            %error,
            "failed to open SQLite database; verify parent directory exists and permissions are correct"
        );
        error
    })?;

    if settings.seed_demo_data && storage.count_contacts().await? == 0 {
        let seeded = seed_contacts(&storage, demo_contacts()).await?;
        info!(count = seeded.len(), "seeded demo contacts");
    }

    let state = AppState {
        api: ApiContext::new(Arc::new(storage)),
    };
    let app = build_router(Arc::new(state), settings.max_body_bytes);

    let addr: SocketAddr = settings.server_bind.parse()?;
    info!(%addr, "server listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn build_router(state: Arc<AppState>, max_body_bytes: usize) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/", get(root_page).post(new_contact))
        .route("/contacts/:contact_id", get(contact_page).post(favorite_contact))
        .route("/contacts/:contact_id/edit", get(edit_page).post(save_contact))
        .route("/contacts/:contact_id/destroy", post(destroy_contact))
        .layer(RequestBodyLimitLayer::new(max_body_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn healthz(State(state): State<Arc<AppState>>) -> Result<&'static str, StatusCode> {
    state.api.store.health_check().await.map_err(|error| {
        error!(%error, "health check failed");
        StatusCode::SERVICE_UNAVAILABLE
    })?;
    Ok("ok")
}

async fn root_page(
    State(state): State<Arc<AppState>>,
    Query(q): Query<RootQuery>,
) -> Response {
    let wants_data = q.data.as_deref() == Some(ROOT_DATA_KEY);
    let data = match server_api::load_root(&state.api, q.q).await {
        Ok(data) => data,
        Err(err) if wants_data => return json_error(err),
        Err(err) => return PageError(err).into_response(),
    };
    if wants_data {
        return Json(data).into_response();
    }

    render_with_shell(&data, None, &views::render_index()).into_response()
}

async fn new_contact(State(state): State<Arc<AppState>>) -> Result<Redirect, PageError> {
    let redirect = server_api::create_contact(&state.api).await?;
    Ok(Redirect::to(&redirect.location))
}

async fn contact_page(
    State(state): State<Arc<AppState>>,
    Path(params): RouteParams,
    Query(q): Query<RootQuery>,
) -> Result<Html<String>, PageError> {
    let data = server_api::load_root(&state.api, q.q).await?;
    let contact = server_api::load_contact(&state.api, contact_param(&params)).await?;
    Ok(render_with_shell(&data, Some(&contact.id), &views::render_contact(&contact)))
}

async fn edit_page(
    State(state): State<Arc<AppState>>,
    Path(params): RouteParams,
    Query(q): Query<RootQuery>,
) -> Result<Html<String>, PageError> {
    let data = server_api::load_root(&state.api, q.q).await?;
    let contact = server_api::load_contact(&state.api, contact_param(&params)).await?;
    Ok(render_with_shell(&data, Some(&contact.id), &views::render_edit(&contact)))
}

async fn save_contact(
    State(state): State<Arc<AppState>>,
    Path(params): RouteParams,
    Form(update): Form<ContactUpdate>,
) -> Result<Redirect, PageError> {
    let redirect = server_api::update_contact(&state.api, contact_param(&params), update).await?;
    Ok(Redirect::to(&redirect.location))
}

async fn favorite_contact(
    State(state): State<Arc<AppState>>,
    Path(params): RouteParams,
    Form(form): Form<FavoriteForm>,
) -> Result<Redirect, PageError> {
    let favorite = server_api::parse_favorite(form.favorite.as_deref())?;
    let redirect =
        server_api::set_favorite(&state.api, contact_param(&params), favorite).await?;
    Ok(Redirect::to(&redirect.location))
}

async fn destroy_contact(
    State(state): State<Arc<AppState>>,
    Path(params): RouteParams,
) -> Result<Redirect, PageError> {
    let redirect = server_api::destroy_contact(&state.api, contact_param(&params)).await?;
    Ok(Redirect::to(&redirect.location))
}

fn contact_param(params: &HashMap<String, String>) -> Option<&str> {
    params.get("contact_id").map(String::as_str)
}

fn render_with_shell(data: &RootData, active: Option<&ContactId>, detail: &str) -> Html<String> {
    let search = SearchSync::new(data.query.clone());
    let shell = match active {
        Some(id) => Shell::new(data, &search).with_active(id),
        None => Shell::new(data, &search),
    };
    Html(views::render_document(&shell, detail))
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
