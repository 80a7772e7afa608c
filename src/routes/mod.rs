use chrono::{NaiveDateTime, Utc};
use gotham::helpers::http::response::{create_empty_response, create_response};
use gotham::hyper::header::{HeaderValue, CACHE_CONTROL, LOCATION};
use gotham::hyper::{body, Body, Response, StatusCode};
use gotham::middleware::session::NewSessionMiddleware;
use gotham::middleware::state::StateMiddleware;
use gotham::pipeline::{new_pipeline, single_pipeline};
use gotham::router::builder::*;
use gotham::router::Router;
use gotham::state::{FromState, State};
use gotham_derive::{StateData, StaticResponseExtender};
use serde_derive::Deserialize;
use tracing::{error, info};

use crate::db::Database;
use crate::error::{Error, Kind, Result};
use crate::flash::{self, FlashMessages};
use crate::forms::FormData;
use crate::models::{Artist, Venue};
use crate::templates::{self, statics::StaticFile};
use crate::views::{FormPage, Link};

pub mod artists;
pub mod shows;
pub mod venues;

const RECENT: i64 = 10;

#[derive(Clone, StateData)]
pub struct AppState {
    pub db: Database,
}

#[derive(Deserialize, StateData, StaticResponseExtender)]
pub struct IdPath {
    pub id: String,
}

impl IdPath {
    /// The segment as a record id. A number too large to be one names a
    /// record that can't exist.
    pub fn key(&self, kind: Kind) -> Result<i32> {
        self.id.parse().map_err(|_| Error::NotFound {
            kind,
            id: self.id.clone(),
        })
    }
}

#[derive(Deserialize, StateData, StaticResponseExtender)]
struct StaticPath {
    name: String,
}

pub fn router(app: AppState, secure_cookies: bool) -> Router {
    let sessions = NewSessionMiddleware::default().with_session_type::<FlashMessages>();
    let sessions = if secure_cookies {
        sessions
    } else {
        sessions.insecure()
    };
    let (chain, pipelines) = single_pipeline(
        new_pipeline()
            .add(StateMiddleware::new(app))
            .add(sessions)
            .build(),
    );

    build_router(chain, pipelines, |route| {
        route.get("/").to(home);
        route
            .get("/static/:name")
            .with_path_extractor::<StaticPath>()
            .to(static_file);

        route.scope("/venues", |route| {
            route.get("/").to(venues::list);
            route.post("/search").to_async(venues::search);
            route.get("/create").to(venues::create_form);
            route.post("/create").to_async(venues::create);
            route
                .get("/:id:[0-9]+")
                .with_path_extractor::<IdPath>()
                .to(venues::detail);
            route
                .delete("/:id:[0-9]+")
                .with_path_extractor::<IdPath>()
                .to(venues::delete);
            route
                .get("/:id:[0-9]+/edit")
                .with_path_extractor::<IdPath>()
                .to(venues::edit_form);
            route
                .post("/:id:[0-9]+/edit")
                .with_path_extractor::<IdPath>()
                .to_async(venues::edit);
        });

        route.scope("/artists", |route| {
            route.get("/").to(artists::list);
            route.post("/search").to_async(artists::search);
            route.get("/create").to(artists::create_form);
            route.post("/create").to_async(artists::create);
            route
                .get("/:id:[0-9]+")
                .with_path_extractor::<IdPath>()
                .to(artists::detail);
            route
                .delete("/:id:[0-9]+")
                .with_path_extractor::<IdPath>()
                .to(artists::delete);
            route
                .get("/:id:[0-9]+/edit")
                .with_path_extractor::<IdPath>()
                .to(artists::edit_form);
            route
                .post("/:id:[0-9]+/edit")
                .with_path_extractor::<IdPath>()
                .to_async(artists::edit);
        });

        route.scope("/shows", |route| {
            route.get("/").to(shows::list);
            route.get("/create").to(shows::create_form);
            route.post("/create").to_async(shows::create);
        });

        route.get("/*").to(not_found);
    })
}

pub fn now() -> NaiveDateTime {
    Utc::now().naive_utc()
}

pub fn db(state: &State) -> Database {
    AppState::borrow_from(state).db.clone()
}

/// Renders an HTML page. `f` writes the template into the buffer.
pub fn render<F>(state: &State, status: StatusCode, f: F) -> Result<Response<Body>>
where
    F: FnOnce(&mut Vec<u8>) -> std::io::Result<()>,
{
    let mut buf = Vec::new();
    f(&mut buf)?;
    Ok(create_response(state, status, mime::TEXT_HTML_UTF_8, buf))
}

pub fn render_form(
    state: &mut State,
    status: StatusCode,
    page: &FormPage,
) -> Result<Response<Body>> {
    let flashes = flash::take(state);
    render(state, status, |buf| templates::form_html(buf, &flashes, page))
}

pub fn redirect(state: &State, to: &str) -> Response<Body> {
    let mut response = create_empty_response(state, StatusCode::SEE_OTHER);
    if let Ok(location) = HeaderValue::from_str(to) {
        response.headers_mut().insert(LOCATION, location);
    }
    response
}

pub fn finish(state: State, result: Result<Response<Body>>) -> (State, Response<Body>) {
    let response = match result {
        Ok(response) => response,
        Err(err) => err.as_response(&state),
    };
    (state, response)
}

/// Like `finish`, except that a missing record is reported with a flash on
/// the page at `to`.
pub fn finish_or_redirect(
    mut state: State,
    result: Result<Response<Body>>,
    to: &str,
) -> (State, Response<Body>) {
    match result {
        Err(err @ Error::NotFound { .. }) => {
            flash::error(&mut state, err.to_string());
            let response = redirect(&state, to);
            (state, response)
        }
        result => finish(state, result),
    }
}

pub async fn read_form(state: &mut State) -> Result<FormData> {
    let body = read_body(state).await?;
    Ok(FormData::parse(&body))
}

pub async fn read_body(state: &mut State) -> Result<body::Bytes> {
    body::to_bytes(Body::take_from(state))
        .await
        .map_err(Error::Body)
}

#[derive(Deserialize)]
struct SearchForm {
    #[serde(default)]
    search_term: String,
}

pub async fn read_search_term(state: &mut State) -> Result<String> {
    let body = read_body(state).await?;
    let form: SearchForm = serde_urlencoded::from_bytes(&body)?;
    Ok(form.search_term.trim().to_owned())
}

pub fn log_failure(err: &Error, message: &str) {
    error!(error = %err, cause = ?std::error::Error::source(err), "{}", message);
}

/// Outcome of a create form submission.
pub fn listed(state: &mut State, kind: Kind, name: &str, result: Result<i32>) -> Response<Body> {
    match result {
        Ok(id) => {
            info!(%kind, id, name, "listed");
            flash::info(state, format!("{} {} was successfully listed!", kind, name));
            redirect(state, &format!("/{}/{}", kind.section(), id))
        }
        Err(err) => {
            log_failure(&err, "couldn't list record");
            flash::error(
                state,
                format!("An error occurred. {} {} could not be listed.", kind, name),
            );
            redirect(state, "/")
        }
    }
}

/// Outcome of an edit form submission. A missing record is passed back to
/// the caller.
pub fn updated(
    state: &mut State,
    kind: Kind,
    id: i32,
    name: &str,
    result: Result<()>,
) -> Result<Response<Body>> {
    let detail = format!("/{}/{}", kind.section(), id);
    match result {
        Ok(()) => {
            info!(%kind, id, name, "updated");
            flash::info(state, format!("{} {} has been successfully updated!", kind, name));
        }
        Err(err @ Error::NotFound { .. }) => return Err(err),
        Err(err) => {
            log_failure(&err, "couldn't update record");
            flash::error(
                state,
                format!("An error occurred. {} {} could not be updated.", kind, name),
            );
        }
    }
    Ok(redirect(state, &detail))
}

/// Answers a DELETE with the path the client should load next, as plain
/// text. The outcome itself waits there as a flash.
pub fn deleted(mut state: State, kind: Kind, result: Result<String>) -> (State, Response<Body>) {
    let id = IdPath::borrow_from(&state).id.clone();
    let list = format!("/{}", kind.section());
    let detail = format!("/{}/{}", kind.section(), id);
    let (status, next) = match result {
        Ok(name) => {
            info!(%kind, %id, name = %name, "deleted");
            flash::info(&mut state, format!("{} {} was successfully deleted!", kind, name));
            (StatusCode::OK, list)
        }
        Err(err @ Error::NotFound { .. }) => {
            flash::error(&mut state, err.to_string());
            (StatusCode::NOT_FOUND, list)
        }
        Err(err @ Error::HasShows { .. }) => {
            flash::error(&mut state, err.to_string());
            (StatusCode::CONFLICT, detail)
        }
        Err(err) => {
            log_failure(&err, "couldn't delete record");
            flash::error(
                &mut state,
                format!("An error occurred. {} {} could not be deleted.", kind, id),
            );
            (StatusCode::INTERNAL_SERVER_ERROR, detail)
        }
    };
    let response = create_response(&state, status, mime::TEXT_PLAIN_UTF_8, next);
    (state, response)
}

fn home(mut state: State) -> (State, Response<Body>) {
    let result = home_page(&mut state);
    finish(state, result)
}

fn home_page(state: &mut State) -> Result<Response<Body>> {
    let (venues, artists) = db(state).read(|conn| {
        Ok((Venue::recent(conn, RECENT)?, Artist::recent(conn, RECENT)?))
    })?;
    let venues: Vec<Link> = venues.iter().map(|venue| Link::to("venues", venue)).collect();
    let artists: Vec<Link> = artists
        .iter()
        .map(|artist| Link::to("artists", artist))
        .collect();

    let flashes = flash::take(state);
    render(state, StatusCode::OK, |buf| {
        templates::home_html(buf, &flashes, &venues, &artists)
    })
}

fn static_file(state: State) -> (State, Response<Body>) {
    let response = match StaticFile::get(&StaticPath::borrow_from(&state).name) {
        Some(file) => {
            let mut response =
                create_response(&state, StatusCode::OK, file.mime.clone(), file.content);
            response.headers_mut().insert(
                CACHE_CONTROL,
                HeaderValue::from_static("public, max-age=31536000, immutable"),
            );
            response
        }
        None => Error::NoRoute.as_response(&state),
    };
    (state, response)
}

fn not_found(state: State) -> (State, Response<Body>) {
    let response = Error::NoRoute.as_response(&state);
    (state, response)
}
