use gotham::handler::HandlerResult;
use gotham::hyper::{Body, Response, StatusCode};
use gotham::state::State;
use tracing::info;

use crate::error::{Error, Kind, Result};
use crate::flash;
use crate::forms::{ShowForm, ValidationErrors};
use crate::models::{Artist, ShowListing, Venue};
use crate::routes::{db, finish, log_failure, now, read_form, redirect, render, render_form};
use crate::templates;
use crate::views::{FormPage, ShowLine};

pub fn list(mut state: State) -> (State, Response<Body>) {
    let result = list_page(&mut state);
    finish(state, result)
}

fn list_page(state: &mut State) -> Result<Response<Body>> {
    let shows: Vec<ShowLine> = db(state)
        .read(ShowListing::all)?
        .into_iter()
        .map(ShowLine::from)
        .collect();
    let flashes = flash::take(state);
    render(state, StatusCode::OK, |buf| {
        templates::shows_html(buf, &flashes, &shows)
    })
}

fn form_page(
    state: &mut State,
    status: StatusCode,
    form: &ShowForm,
    errors: &ValidationErrors,
) -> Result<Response<Body>> {
    let (artists, venues) =
        db(state).read(|conn| Ok((Artist::names(conn)?, Venue::names(conn)?)))?;
    render_form(state, status, &FormPage::show(form, &artists, &venues, errors))
}

pub fn create_form(mut state: State) -> (State, Response<Body>) {
    let form = ShowForm::starting_at(now());
    let result = form_page(&mut state, StatusCode::OK, &form, &ValidationErrors::default());
    finish(state, result)
}

pub async fn create(mut state: State) -> HandlerResult {
    let result = match read_form(&mut state).await {
        Ok(data) => book(&mut state, ShowForm::from_data(&data)),
        Err(err) => Err(err),
    };
    Ok(finish(state, result))
}

fn book(state: &mut State, form: ShowForm) -> Result<Response<Body>> {
    let show = match form.validate() {
        Ok(show) => show,
        Err(errors) => {
            return form_page(state, StatusCode::UNPROCESSABLE_ENTITY, &form, &errors);
        }
    };

    let mut errors = ValidationErrors::default();
    let status = match db(state).transaction(|conn| show.insert(conn)) {
        Ok(id) => {
            info!(
                show_id = id,
                artist_id = show.artist_id,
                venue_id = show.venue_id,
                start_time = %show.start_time,
                "show booked"
            );
            flash::info(state, "Show was successfully listed!");
            return Ok(redirect(state, "/shows"));
        }
        Err(err @ Error::NotFound { kind: Kind::Artist, .. }) => {
            errors.add("artist_id", err.to_string());
            StatusCode::UNPROCESSABLE_ENTITY
        }
        Err(err @ Error::NotFound { .. }) => {
            errors.add("venue_id", err.to_string());
            StatusCode::UNPROCESSABLE_ENTITY
        }
        Err(err @ Error::DuplicateShow) => {
            flash::error(state, err.to_string());
            StatusCode::CONFLICT
        }
        Err(err) => {
            log_failure(&err, "couldn't book show");
            flash::error(state, "An error occurred. Show could not be listed.");
            return Ok(redirect(state, "/"));
        }
    };
    form_page(state, status, &form, &errors)
}
