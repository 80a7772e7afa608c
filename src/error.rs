use gotham::helpers::http::response::create_response;
use gotham::hyper::{Body, Response, StatusCode};
use gotham::state::State;
use std::fmt;
use tracing::error;

use crate::templates;

/// Which kind of record a lookup was for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Kind {
    Venue,
    Artist,
}

impl Kind {
    /// The path segment its pages live under.
    pub fn section(self) -> &'static str {
        match self {
            Kind::Venue => "venues",
            Kind::Artist => "artists",
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Kind::Venue => write!(f, "Venue"),
            Kind::Artist => write!(f, "Artist"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{kind} {id} does not exist")]
    /// `id` is the id as requested, which may not even parse as one.
    NotFound { kind: Kind, id: String },
    #[error("Page not found")]
    NoRoute,
    #[error("This artist already has a show booked at this venue for that time")]
    DuplicateShow,
    #[error("{kind} {name} still has {count} show{} booked and can't be deleted", plural(.count))]
    HasShows { kind: Kind, name: String, count: i64 },
    #[error("Couldn't read the request body")]
    Body(#[source] gotham::hyper::Error),
    #[error("Malformed form submission")]
    Form(#[from] serde_urlencoded::de::Error),
    #[error("Database connection error")]
    DatabaseConnection(#[from] diesel::ConnectionError),
    #[error("Database error")]
    Database(#[from] diesel::result::Error),
    #[error("Couldn't run database migrations: {0}")]
    Migration(String),
    #[error("Couldn't render page")]
    Render(#[from] std::io::Error),
    #[error("Configuration error")]
    Config(#[from] config::ConfigError),
    #[error("Server error: {0}")]
    Server(String),
}

fn plural(count: &i64) -> &'static str {
    if *count == 1 {
        ""
    } else {
        "s"
    }
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn status_code(&self) -> StatusCode {
        use Error::*;
        match self {
            NotFound { .. } | NoRoute => StatusCode::NOT_FOUND,
            DuplicateShow | HasShows { .. } => StatusCode::CONFLICT,
            Body(..) | Form(..) => StatusCode::BAD_REQUEST,
            DatabaseConnection(..) | Database(..) | Migration(..) | Render(..) | Config(..)
            | Server(..) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Renders the matching error page. Server-side failures are logged with
    /// their cause; the page itself never carries it.
    pub fn as_response(&self, state: &State) -> Response<Body> {
        let status = self.status_code();
        if status.is_server_error() {
            error!(error = %self, cause = ?std::error::Error::source(self), "request failed");
        }

        let mut buf = Vec::new();
        let rendered = if status == StatusCode::NOT_FOUND {
            templates::not_found_html(&mut buf, &[])
        } else if status.is_server_error() {
            templates::server_error_html(&mut buf, &[])
        } else {
            templates::client_error_html(&mut buf, &[], &self.to_string())
        };

        match rendered {
            Ok(()) => create_response(state, status, mime::TEXT_HTML_UTF_8, buf),
            Err(_) => create_response(
                state,
                status,
                mime::TEXT_PLAIN_UTF_8,
                format!("Error: {}", self),
            ),
        }
    }
}
