use gotham::handler::HandlerResult;
use gotham::hyper::{Body, Response, StatusCode};
use gotham::state::{FromState, State};

use crate::error::{Kind, Result};
use crate::flash;
use crate::forms::{ArtistForm, ValidationErrors};
use crate::models::{Artist, Schedule};
use crate::routes::{
    db, deleted, finish, finish_or_redirect, listed, now, read_form, read_search_term, render,
    render_form, updated, IdPath,
};
use crate::templates;
use crate::views::{FormPage, Link, Listed, Profile, SearchPage};

pub fn list(mut state: State) -> (State, Response<Body>) {
    let result = list_page(&mut state);
    finish(state, result)
}

fn list_page(state: &mut State) -> Result<Response<Body>> {
    let artists: Vec<Link> = db(state)
        .read(Artist::names)?
        .iter()
        .map(|artist| Link::to("artists", artist))
        .collect();
    let flashes = flash::take(state);
    render(state, StatusCode::OK, |buf| {
        templates::artists_html(buf, &flashes, &artists)
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
    let results = db(state).read(|conn| Artist::search(conn, &term, now()))?;
    let page = SearchPage {
        title: "Artists",
        action: "/artists/search",
        results: results.iter().map(Listed::artist).collect(),
        term,
    };
    let flashes = flash::take(state);
    render(state, StatusCode::OK, |buf| {
        templates::search_html(buf, &flashes, &page)
    })
}

pub fn detail(mut state: State) -> (State, Response<Body>) {
    let result = detail_page(&mut state);
    finish_or_redirect(state, result, "/artists")
}

fn detail_page(state: &mut State) -> Result<Response<Body>> {
    let id = IdPath::borrow_from(state).key(Kind::Artist)?;
    let (artist, bookings) = db(state).read(|conn| {
        let artist = Artist::find(conn, id)?;
        Ok((artist, Artist::bookings(conn, id)?))
    })?;
    let profile = Profile::artist(artist, &Schedule::split(bookings, now()));
    let flashes = flash::take(state);
    render(state, StatusCode::OK, |buf| {
        templates::profile_html(buf, &flashes, &profile)
    })
}

fn edit_page(artist: &Artist, form: &ArtistForm, errors: &ValidationErrors) -> FormPage {
    FormPage::artist(
        format!("Edit artist {}", artist.name),
        format!("/artists/{}/edit", artist.id),
        form,
        errors,
    )
}

pub fn edit_form(mut state: State) -> (State, Response<Body>) {
    let result = edit_form_page(&mut state);
    finish_or_redirect(state, result, "/artists")
}

fn edit_form_page(state: &mut State) -> Result<Response<Body>> {
    let id = IdPath::borrow_from(state).key(Kind::Artist)?;
    let artist = db(state).read(|conn| Artist::find(conn, id))?;
    let page = edit_page(
        &artist,
        &ArtistForm::from_artist(&artist),
        &ValidationErrors::default(),
    );
    render_form(state, StatusCode::OK, &page)
}

pub async fn edit(mut state: State) -> HandlerResult {
    let result = submit_edit(&mut state).await;
    Ok(finish_or_redirect(state, result, "/artists"))
}

async fn submit_edit(state: &mut State) -> Result<Response<Body>> {
    let id = IdPath::borrow_from(state).key(Kind::Artist)?;
    let data = read_form(state).await?;
    save(state, id, ArtistForm::from_data(&data))
}

fn save(state: &mut State, id: i32, form: ArtistForm) -> Result<Response<Body>> {
    match form.validate() {
        Ok(record) => {
            let result = db(state).transaction(|conn| Artist::update(conn, id, &record));
            updated(state, Kind::Artist, id, &record.name, result)
        }
        Err(errors) => {
            let artist = db(state).read(|conn| Artist::find(conn, id))?;
            render_form(
                state,
                StatusCode::UNPROCESSABLE_ENTITY,
                &edit_page(&artist, &form, &errors),
            )
        }
    }
}

fn create_page(form: &ArtistForm, errors: &ValidationErrors) -> FormPage {
    FormPage::artist(
        "List a new artist".to_owned(),
        "/artists/create".to_owned(),
        form,
        errors,
    )
}

pub fn create_form(mut state: State) -> (State, Response<Body>) {
    let page = create_page(&ArtistForm::default(), &ValidationErrors::default());
    let result = render_form(&mut state, StatusCode::OK, &page);
    finish(state, result)
}

pub async fn create(mut state: State) -> HandlerResult {
    let result = match read_form(&mut state).await {
        Ok(data) => insert(&mut state, ArtistForm::from_data(&data)),
        Err(err) => Err(err),
    };
    Ok(finish(state, result))
}

fn insert(state: &mut State, form: ArtistForm) -> Result<Response<Body>> {
    match form.validate() {
        Ok(record) => {
            let result = db(state).transaction(|conn| record.insert(conn));
            Ok(listed(state, Kind::Artist, &record.name, result))
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
        .key(Kind::Artist)
        .and_then(|id| db(&state).transaction(|conn| Ok(Artist::delete(conn, id)?.name)));
    deleted(state, Kind::Artist, result)
}
