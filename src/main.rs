#[macro_use]
extern crate diesel;

use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::db::Database;
use crate::error::Error;
use crate::routes::AppState;
use crate::settings::{Args, Settings};

mod db;
mod error;
mod flash;
mod forms;
mod models;
mod routes;
mod schema;
mod settings;
mod views;

include!(concat!(env!("OUT_DIR"), "/templates.rs"));

fn main() -> Result<(), Error> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    let settings = Settings::load(&args)?;

    let db = Database::new(settings.database_url);
    db.migrate()?;

    let addr = format!("{}:{}", settings.host, settings.port);
    info!(%addr, secure_cookies = settings.secure_cookies, "listening");
    gotham::start(addr, routes::router(AppState { db }, settings.secure_cookies))
        .map_err(|err| Error::Server(err.to_string()))
}
