//! Form parsing and validation.
//!
//! Each entity form maps onto its record type field by field in `validate`;
//! nothing is copied across by name at runtime.

use chrono::{DateTime, NaiveDateTime};
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::BTreeMap;
use url::{form_urlencoded, Url};

use crate::models::{join_genres, Artist, ArtistRecord, NewShow, Venue, VenueRecord};

pub const GENRES: &[&str] = &[
    "Alternative",
    "Blues",
    "Classical",
    "Country",
    "Electronic",
    "Folk",
    "Funk",
    "Hip-Hop",
    "Heavy Metal",
    "Instrumental",
    "Jazz",
    "Musical Theatre",
    "Pop",
    "Punk",
    "R&B",
    "Reggae",
    "Rock n Roll",
    "Soul",
    "Swing",
    "Other",
];

pub const STATES: &[&str] = &[
    "AL", "AK", "AZ", "AR", "CA", "CO", "CT", "DE", "DC", "FL", "GA", "HI", "ID", "IL", "IN", "IA",
    "KS", "KY", "LA", "ME", "MT", "NE", "NV", "NH", "NJ", "NM", "NY", "NC", "ND", "OH", "OK", "OR",
    "MD", "MA", "MI", "MN", "MS", "MO", "PA", "RI", "SC", "SD", "TN", "TX", "UT", "VT", "VA", "WA",
    "WV", "WI", "WY",
];

pub const START_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

lazy_static! {
    static ref PHONE: Regex = Regex::new(r"^\d{4}-\d{3}-\d{4}$").expect("phone pattern is valid");
}

/// A url-encoded form body. Keys may repeat (multi-selects).
#[derive(Debug, Default)]
pub struct FormData {
    pairs: Vec<(String, String)>,
}

impl FormData {
    pub fn parse(body: &[u8]) -> FormData {
        FormData {
            pairs: form_urlencoded::parse(body).into_owned().collect(),
        }
    }

    /// First value for `key`, trimmed; empty if absent.
    pub fn value(&self, key: &str) -> String {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.trim().to_owned())
            .unwrap_or_default()
    }

    pub fn values(&self, key: &str) -> Vec<String> {
        self.pairs
            .iter()
            .filter(|(k, v)| k == key && !v.trim().is_empty())
            .map(|(_, v)| v.trim().to_owned())
            .collect()
    }

    pub fn checked(&self, key: &str) -> bool {
        self.pairs
            .iter()
            .any(|(k, v)| k == key && !matches!(v.trim(), "" | "false"))
    }
}

/// Error messages per field name.
#[derive(Clone, Debug, Default)]
pub struct ValidationErrors(BTreeMap<&'static str, Vec<String>>);

impl ValidationErrors {
    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.entry(field).or_default().push(message.into());
    }

    pub fn get(&self, field: &str) -> &[String] {
        self.0.get(field).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn check<'e, 'v>(&'e mut self, field: &'static str, value: &'v str) -> FieldCheck<'e, 'v> {
        FieldCheck {
            errors: self,
            field,
            value,
            done: false,
        }
    }

    /// A multi-select: at least one value, every value one of `choices`.
    pub fn check_choices(&mut self, field: &'static str, values: &[String], choices: &[&str]) {
        if values.is_empty() {
            self.add(field, "This field is required.");
            return;
        }
        for value in values {
            if !choices.contains(&value.as_str()) {
                self.add(field, format!("'{}' is not a valid choice for this field.", value));
            }
        }
    }
}

/// Validators for one field, applied in order. The first failure is the
/// only one reported.
pub struct FieldCheck<'e, 'v> {
    errors: &'e mut ValidationErrors,
    field: &'static str,
    value: &'v str,
    done: bool,
}

impl<'e, 'v> FieldCheck<'e, 'v> {
    fn fail(mut self, message: impl Into<String>) -> Self {
        self.errors.add(self.field, message);
        self.done = true;
        self
    }

    fn test(self, ok: impl FnOnce(&str) -> bool, message: impl FnOnce() -> String) -> Self {
        if self.done || ok(self.value) {
            self
        } else {
            let message = message();
            self.fail(message)
        }
    }

    pub fn required(self) -> Self {
        self.test(|v| !v.trim().is_empty(), || "This field is required.".to_owned())
    }

    /// Stops the chain without an error when the field is blank.
    pub fn optional(mut self) -> Self {
        if self.value.trim().is_empty() {
            self.done = true;
        }
        self
    }

    pub fn max_length(self, max: usize) -> Self {
        self.test(
            |v| v.chars().count() <= max,
            || format!("Field cannot be longer than {} characters.", max),
        )
    }

    pub fn url(self) -> Self {
        self.test(is_url, || "Invalid URL.".to_owned())
    }

    pub fn phone(self) -> Self {
        self.test(
            |v| PHONE.is_match(v),
            || "Valid phone number format is xxxx-xxx-xxxx".to_owned(),
        )
    }

    pub fn one_of(self, choices: &[&str]) -> Self {
        self.test(|v| choices.contains(&v), || "Not a valid choice.".to_owned())
    }
}

/// An absolute http(s) URL whose host is a dotted domain name or an IP.
pub fn is_url(value: &str) -> bool {
    let url = match Url::parse(value) {
        Ok(url) => url,
        Err(_) => return false,
    };
    if !matches!(url.scheme(), "http" | "https") {
        return false;
    }
    match url.host() {
        Some(url::Host::Domain(domain)) => matches!(
            domain.trim_end_matches('.').rsplit_once('.'),
            Some((name, tld)) if !name.is_empty() && !tld.is_empty()
        ),
        Some(_) => true,
        None => false,
    }
}

/// Accepts the booking form's own format, the browser's `datetime-local`
/// format, and RFC 3339. Times without an offset are taken as UTC.
pub fn parse_start_time(value: &str) -> Option<NaiveDateTime> {
    if let Ok(time) = DateTime::parse_from_rfc3339(value) {
        return Some(time.naive_utc());
    }
    [
        START_TIME_FORMAT,
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M",
    ]
    .iter()
    .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
}

fn optional_text(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_owned())
    }
}

#[derive(Clone, Debug)]
pub struct VenueForm {
    pub name: String,
    pub city: String,
    pub state: String,
    pub address: String,
    pub phone: String,
    pub image_link: String,
    pub genres: Vec<String>,
    pub facebook_link: String,
    pub website_link: String,
    pub seeking_talent: bool,
    pub seeking_description: String,
}

impl Default for VenueForm {
    fn default() -> VenueForm {
        VenueForm {
            name: String::new(),
            city: String::new(),
            state: String::new(),
            address: String::new(),
            phone: String::new(),
            image_link: String::new(),
            genres: Vec::new(),
            facebook_link: String::new(),
            website_link: String::new(),
            seeking_talent: true,
            seeking_description: String::new(),
        }
    }
}

impl VenueForm {
    pub fn from_data(data: &FormData) -> VenueForm {
        VenueForm {
            name: data.value("name"),
            city: data.value("city"),
            state: data.value("state"),
            address: data.value("address"),
            phone: data.value("phone"),
            image_link: data.value("image_link"),
            genres: data.values("genres"),
            facebook_link: data.value("facebook_link"),
            website_link: data.value("website_link"),
            seeking_talent: data.checked("seeking_talent"),
            seeking_description: data.value("seeking_description"),
        }
    }

    pub fn from_venue(venue: &Venue) -> VenueForm {
        VenueForm {
            name: venue.name.clone(),
            city: venue.city.clone(),
            state: venue.state.clone(),
            address: venue.address.clone(),
            phone: venue.phone.clone(),
            image_link: venue.image_link.clone(),
            genres: venue.genre_list(),
            facebook_link: venue.facebook_link.clone().unwrap_or_default(),
            website_link: venue.website_link.clone().unwrap_or_default(),
            seeking_talent: venue.seeking_talent,
            seeking_description: venue.seeking_description.clone(),
        }
    }

    pub fn validate(&self) -> Result<VenueRecord, ValidationErrors> {
        let mut errors = ValidationErrors::default();
        errors.check("name", &self.name).required();
        errors.check("city", &self.city).required().max_length(50);
        errors
            .check("state", &self.state)
            .required()
            .max_length(50)
            .one_of(STATES);
        errors
            .check("address", &self.address)
            .required()
            .max_length(150);
        errors.check("phone", &self.phone).required().phone();
        errors
            .check("image_link", &self.image_link)
            .required()
            .url()
            .max_length(500);
        errors.check_choices("genres", &self.genres, GENRES);
        errors
            .check("facebook_link", &self.facebook_link)
            .optional()
            .url()
            .max_length(500);
        errors
            .check("website_link", &self.website_link)
            .optional()
            .url()
            .max_length(500);
        errors
            .check("seeking_description", &self.seeking_description)
            .required()
            .max_length(500);

        if !errors.is_empty() {
            return Err(errors);
        }
        Ok(VenueRecord {
            name: self.name.clone(),
            city: self.city.clone(),
            state: self.state.clone(),
            address: self.address.clone(),
            phone: self.phone.clone(),
            image_link: self.image_link.clone(),
            facebook_link: optional_text(&self.facebook_link),
            website_link: optional_text(&self.website_link),
            genres: join_genres(&self.genres),
            seeking_talent: self.seeking_talent,
            seeking_description: self.seeking_description.clone(),
        })
    }
}

#[derive(Clone, Debug)]
pub struct ArtistForm {
    pub name: String,
    pub city: String,
    pub state: String,
    pub phone: String,
    pub image_link: String,
    pub genres: Vec<String>,
    pub facebook_link: String,
    pub website_link: String,
    pub seeking_venue: bool,
    pub seeking_description: String,
}

impl Default for ArtistForm {
    fn default() -> ArtistForm {
        ArtistForm {
            name: String::new(),
            city: String::new(),
            state: String::new(),
            phone: String::new(),
            image_link: String::new(),
            genres: Vec::new(),
            facebook_link: String::new(),
            website_link: String::new(),
            seeking_venue: true,
            seeking_description: String::new(),
        }
    }
}

impl ArtistForm {
    pub fn from_data(data: &FormData) -> ArtistForm {
        ArtistForm {
            name: data.value("name"),
            city: data.value("city"),
            state: data.value("state"),
            phone: data.value("phone"),
            image_link: data.value("image_link"),
            genres: data.values("genres"),
            facebook_link: data.value("facebook_link"),
            website_link: data.value("website_link"),
            seeking_venue: data.checked("seeking_venue"),
            seeking_description: data.value("seeking_description"),
        }
    }

    pub fn from_artist(artist: &Artist) -> ArtistForm {
        ArtistForm {
            name: artist.name.clone(),
            city: artist.city.clone(),
            state: artist.state.clone(),
            phone: artist.phone.clone(),
            image_link: artist.image_link.clone(),
            genres: artist.genre_list(),
            facebook_link: artist.facebook_link.clone().unwrap_or_default(),
            website_link: artist.website_link.clone().unwrap_or_default(),
            seeking_venue: artist.seeking_venue,
            seeking_description: artist.seeking_description.clone().unwrap_or_default(),
        }
    }

    pub fn validate(&self) -> Result<ArtistRecord, ValidationErrors> {
        let mut errors = ValidationErrors::default();
        errors.check("name", &self.name).required();
        errors.check("city", &self.city).required().max_length(50);
        errors
            .check("state", &self.state)
            .required()
            .max_length(50)
            .one_of(STATES);
        errors.check("phone", &self.phone).required().phone();
        errors
            .check("image_link", &self.image_link)
            .required()
            .url()
            .max_length(500);
        errors.check_choices("genres", &self.genres, GENRES);
        errors
            .check("facebook_link", &self.facebook_link)
            .optional()
            .url()
            .max_length(500);
        errors
            .check("website_link", &self.website_link)
            .optional()
            .url()
            .max_length(500);
        errors
            .check("seeking_description", &self.seeking_description)
            .optional()
            .max_length(500);

        if !errors.is_empty() {
            return Err(errors);
        }
        Ok(ArtistRecord {
            name: self.name.clone(),
            city: self.city.clone(),
            state: self.state.clone(),
            phone: self.phone.clone(),
            genres: join_genres(&self.genres),
            image_link: self.image_link.clone(),
            facebook_link: optional_text(&self.facebook_link),
            website_link: optional_text(&self.website_link),
            seeking_venue: self.seeking_venue,
            seeking_description: optional_text(&self.seeking_description),
        })
    }
}

#[derive(Clone, Debug, Default)]
pub struct ShowForm {
    pub artist_id: String,
    pub venue_id: String,
    pub start_time: String,
}

impl ShowForm {
    /// A blank booking defaulting to `now`.
    pub fn starting_at(now: NaiveDateTime) -> ShowForm {
        ShowForm {
            start_time: now.format(START_TIME_FORMAT).to_string(),
            ..ShowForm::default()
        }
    }

    pub fn from_data(data: &FormData) -> ShowForm {
        ShowForm {
            artist_id: data.value("artist_id"),
            venue_id: data.value("venue_id"),
            start_time: data.value("start_time"),
        }
    }

    pub fn validate(&self) -> Result<NewShow, ValidationErrors> {
        let mut errors = ValidationErrors::default();
        let artist_id = parse_id(&mut errors, "artist_id", &self.artist_id);
        let venue_id = parse_id(&mut errors, "venue_id", &self.venue_id);

        let start_time = if self.start_time.is_empty() {
            errors.add("start_time", "This field is required.");
            None
        } else {
            let parsed = parse_start_time(&self.start_time);
            if parsed.is_none() {
                errors.add("start_time", "Not a valid datetime value.");
            }
            parsed
        };

        match (artist_id, venue_id, start_time) {
            (Some(artist_id), Some(venue_id), Some(start_time)) if errors.is_empty() => {
                Ok(NewShow {
                    artist_id,
                    venue_id,
                    start_time,
                })
            }
            _ => Err(errors),
        }
    }
}

fn parse_id(errors: &mut ValidationErrors, field: &'static str, value: &str) -> Option<i32> {
    if value.is_empty() {
        errors.add(field, "This field is required.");
        return None;
    }
    match value.parse() {
        Ok(id) => Some(id),
        Err(_) => {
            errors.add(field, "Not a valid integer value.");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::fixtures::at;

    fn encode(pairs: &[(&str, &str)]) -> Vec<u8> {
        form_urlencoded::Serializer::new(String::new())
            .extend_pairs(pairs)
            .finish()
            .into_bytes()
    }

    fn venue_data() -> Vec<(&'static str, &'static str)> {
        vec![
            ("name", "The Musical Hop"),
            ("city", "San Francisco"),
            ("state", "CA"),
            ("address", "1015 Folsom Street"),
            ("phone", "1234-123-1234"),
            ("image_link", "https://images.unsplash.com/photo-1543900694"),
            ("genres", "Jazz"),
            ("genres", "R&B"),
            ("facebook_link", ""),
            ("website_link", "https://www.themusicalhop.com"),
            ("seeking_talent", "y"),
            ("seeking_description", "We are on the lookout for a local artist"),
        ]
    }

    fn with(
        pairs: &[(&'static str, &'static str)],
        key: &str,
        value: &'static str,
    ) -> Vec<(&'static str, &'static str)> {
        pairs
            .iter()
            .map(|&(k, v)| if k == key { (k, value) } else { (k, v) })
            .collect()
    }

    #[test]
    fn valid_venue_maps_onto_record() {
        let form = VenueForm::from_data(&FormData::parse(&encode(&venue_data())));
        let record = form.validate().unwrap();

        assert_eq!(record.name, "The Musical Hop");
        assert_eq!(record.genres, "Jazz,R&B");
        assert_eq!(record.facebook_link, None);
        assert_eq!(record.website_link.as_deref(), Some("https://www.themusicalhop.com"));
        assert!(record.seeking_talent);
    }

    #[test]
    fn missing_checkbox_is_false() {
        let data: Vec<_> = venue_data()
            .into_iter()
            .filter(|(k, _)| *k != "seeking_talent")
            .collect();
        let form = VenueForm::from_data(&FormData::parse(&encode(&data)));
        assert!(!form.validate().unwrap().seeking_talent);

        let data = with(&venue_data(), "seeking_talent", "false");
        assert!(!VenueForm::from_data(&FormData::parse(&encode(&data))).seeking_talent);
    }

    #[test]
    fn phone_must_match_pattern() {
        for phone in ["123-123-1234", "1234-1234-123", "12341231234", "1234-123-12345"] {
            let mut errors = ValidationErrors::default();
            errors.check("phone", phone).phone();
            assert!(!errors.is_empty(), "{} should be rejected", phone);
        }
        let mut errors = ValidationErrors::default();
        errors.check("phone", "1234-123-1234").phone();
        assert!(errors.is_empty());

        let form = VenueForm::from_data(&FormData::parse(&encode(&with(
            &venue_data(),
            "phone",
            "555-555-5555",
        ))));
        let errors = form.validate().unwrap_err();
        assert_eq!(
            errors.get("phone"),
            ["Valid phone number format is xxxx-xxx-xxxx".to_owned()]
        );
    }

    #[test]
    fn first_failure_per_field_wins() {
        let form = VenueForm {
            city: String::new(),
            ..VenueForm::from_data(&FormData::parse(&encode(&venue_data())))
        };
        let errors = form.validate().unwrap_err();
        assert_eq!(errors.get("city"), ["This field is required.".to_owned()]);
        assert!(errors.get("name").is_empty());
    }

    #[test]
    fn enumerations_are_enforced() {
        let data = with(&venue_data(), "state", "ZZ");
        let data = with(&data, "genres", "Polka");
        let errors = VenueForm::from_data(&FormData::parse(&encode(&data)))
            .validate()
            .unwrap_err();
        assert_eq!(errors.get("state"), ["Not a valid choice.".to_owned()]);
        assert_eq!(errors.get("genres").len(), 2);

        let mut errors = ValidationErrors::default();
        errors.check_choices("genres", &[], GENRES);
        assert_eq!(errors.get("genres"), ["This field is required.".to_owned()]);
    }

    #[test]
    fn url_shape() {
        assert!(is_url("https://www.facebook.com/TheMusicalHop"));
        assert!(is_url("http://127.0.0.1:8000/image.png"));
        assert!(!is_url("www.facebook.com"));
        assert!(!is_url("ftp://files.example.com/a"));
        assert!(!is_url("http://localhost/image.png"));
        assert!(!is_url("not a url"));
    }

    #[test]
    fn long_values_are_capped() {
        let long = "x".repeat(51);
        let mut errors = ValidationErrors::default();
        errors.check("city", &long).required().max_length(50);
        assert_eq!(
            errors.get("city"),
            ["Field cannot be longer than 50 characters.".to_owned()]
        );
    }

    #[test]
    fn artist_description_and_links_are_optional() {
        let data = [
            ("name", "Guns N Petals"),
            ("city", "San Francisco"),
            ("state", "CA"),
            ("phone", "3264-326-5000"),
            ("image_link", "https://images.unsplash.com/photo-1549213783"),
            ("genres", "Rock n Roll"),
        ];
        let record = ArtistForm::from_data(&FormData::parse(&encode(&data)))
            .validate()
            .unwrap();
        assert_eq!(record.seeking_description, None);
        assert_eq!(record.website_link, None);
        assert!(!record.seeking_venue);
    }

    #[test]
    fn show_form_requires_every_field() {
        let errors = ShowForm::default().validate().unwrap_err();
        for field in ["artist_id", "venue_id", "start_time"] {
            assert_eq!(errors.get(field), ["This field is required.".to_owned()]);
        }

        let form = ShowForm {
            artist_id: "four".to_owned(),
            venue_id: "1".to_owned(),
            start_time: "tomorrow".to_owned(),
        };
        let errors = form.validate().unwrap_err();
        assert_eq!(errors.get("artist_id"), ["Not a valid integer value.".to_owned()]);
        assert_eq!(errors.get("start_time"), ["Not a valid datetime value.".to_owned()]);
    }

    #[test]
    fn start_time_formats() {
        let expected = at(2035, 4, 1, 20);
        assert_eq!(parse_start_time("2035-04-01 20:00:00"), Some(expected));
        assert_eq!(parse_start_time("2035-04-01T20:00"), Some(expected));
        assert_eq!(parse_start_time("2035-04-01T22:00:00+02:00"), Some(expected));
        assert_eq!(parse_start_time("04/01/2035"), None);

        let show = ShowForm {
            artist_id: "4".to_owned(),
            venue_id: "1".to_owned(),
            start_time: "2035-04-01 20:00:00".to_owned(),
        }
        .validate()
        .unwrap();
        assert_eq!((show.artist_id, show.venue_id, show.start_time), (4, 1, expected));

        assert_eq!(ShowForm::starting_at(expected).start_time, "2035-04-01 20:00:00");
    }
}
