use gotham::handler::HandlerResult;
use gotham::hyper::{Body, Response, StatusCode};
use gotham::state::{FromState, State};

use crate::error::{Kind, Result};
use crate::flash;
use crate::forms::{ValidationErrors, VenueForm};
use crate::models::{Schedule, Venue};
use crate::routes::{
    db, deleted, finish, finish_or_redirect, listed, now, read_form, read_search_term, render,
    render_form, updated, IdPath,
};
use crate::templates;
use crate::views::{FormPage, Listed, Profile, SearchPage};

pub fn list(mut state: State) -> (State, Response<Body>) {
    let result = list_page(&mut state);
    finish(state, result)
}

fn list_page(state: &mut State) -> Result<Response<Body>> {
    let areas = db(state).read(|conn| Venue::areas(conn, now()))?;
    let flashes = flash::take(state);
    render(state, StatusCode::OK, |buf| {
        templates::venues_html(buf, &flashes, &areas)
    })
}

pub async fn search(mut state: State) -> HandlerResult {
    let result = match read_search_term(&mut state).await {
        Ok(term) => search_page(&mut state, term),
        Err(err) => Err(err),
    };
    Ok(finish(state, result))
}

fn search_page(state: &mut State, term: String) -> Result<Response<Body>> {
    let results = db(state).read(|conn| Venue::search(conn, &term, now()))?;
    let page = SearchPage {
        title: "Venues",
        action: "/venues/search",
        results: results.iter().map(Listed::venue).collect(),
        term,
    };
    let flashes = flash::take(state);
    render(state, StatusCode::OK, |buf| {
        templates::search_html(buf, &flashes, &page)
    })
}

pub fn detail(mut state: State) -> (State, Response<Body>) {
    let result = detail_page(&mut state);
    finish_or_redirect(state, result, "/venues")
}

fn detail_page(state: &mut State) -> Result<Response<Body>> {
    let id = IdPath::borrow_from(state).key(Kind::Venue)?;
    let (venue, bookings) = db(state).read(|conn| {
        let venue = Venue::find(conn, id)?;
        Ok((venue, Venue::bookings(conn, id)?))
    })?;
    let profile = Profile::venue(venue, &Schedule::split(bookings, now()));
    let flashes = flash::take(state);
    render(state, StatusCode::OK, |buf| {
        templates::profile_html(buf, &flashes, &profile)
    })
}

fn edit_page(venue: &Venue, form: &VenueForm, errors: &ValidationErrors) -> FormPage {
    FormPage::venue(
        format!("Edit venue {}", venue.name),
        format!("/venues/{}/edit", venue.id),
        form,
        errors,
    )
}

pub fn edit_form(mut state: State) -> (State, Response<Body>) {
    let result = edit_form_page(&mut state);
    finish_or_redirect(state, result, "/venues")
}

fn edit_form_page(state: &mut State) -> Result<Response<Body>> {
    let id = IdPath::borrow_from(state).key(Kind::Venue)?;
    let venue = db(state).read(|conn| Venue::find(conn, id))?;
    let page = edit_page(&venue, &VenueForm::from_venue(&venue), &ValidationErrors::default());
    render_form(state, StatusCode::OK, &page)
}

pub async fn edit(mut state: State) -> HandlerResult {
    let result = submit_edit(&mut state).await;
    Ok(finish_or_redirect(state, result, "/venues"))
}

async fn submit_edit(state: &mut State) -> Result<Response<Body>> {
    let id = IdPath::borrow_from(state).key(Kind::Venue)?;
    let data = read_form(state).await?;
    save(state, id, VenueForm::from_data(&data))
}

fn save(state: &mut State, id: i32, form: VenueForm) -> Result<Response<Body>> {
    match form.validate() {
        Ok(record) => {
            let result = db(state).transaction(|conn| Venue::update(conn, id, &record));
            updated(state, Kind::Venue, id, &record.name, result)
        }
        Err(errors) => {
            let venue = db(state).read(|conn| Venue::find(conn, id))?;
            render_form(
                state,
                StatusCode::UNPROCESSABLE_ENTITY,
                &edit_page(&venue, &form, &errors),
            )
        }
    }
}

fn create_page(form: &VenueForm, errors: &ValidationErrors) -> FormPage {
    FormPage::venue(
        "List a new venue".to_owned(),
        "/venues/create".to_owned(),
        form,
        errors,
    )
}

pub fn create_form(mut state: State) -> (State, Response<Body>) {
    let page = create_page(&VenueForm::default(), &ValidationErrors::default());
    let result = render_form(&mut state, StatusCode::OK, &page);
    finish(state, result)
}

pub async fn create(mut state: State) -> HandlerResult {
    let result = match read_form(&mut state).await {
        Ok(data) => insert(&mut state, VenueForm::from_data(&data)),
        Err(err) => Err(err),
    };
    Ok(finish(state, result))
}

fn insert(state: &mut State, form: VenueForm) -> Result<Response<Body>> {
    match form.validate() {
        Ok(record) => {
            let result = db(state).transaction(|conn| record.insert(conn));
            Ok(listed(state, Kind::Venue, &record.name, result))
        }
        Err(errors) => render_form(
            state,
            StatusCode::UNPROCESSABLE_ENTITY,
            &create_page(&form, &errors),
        ),
    }
}

pub fn delete(state: State) -> (State, Response<Body>) {
    let result = IdPath::borrow_from(&state)
        .key(Kind::Venue)
        .and_then(|id| db(&state).transaction(|conn| Ok(Venue::delete(conn, id)?.name)));
    deleted(state, Kind::Venue, result)
}
