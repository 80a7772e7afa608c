//! What the templates see: display-ready values built from models and forms.

use chrono::NaiveDateTime;

use crate::forms::{ArtistForm, ShowForm, ValidationErrors, VenueForm, GENRES, STATES};
use crate::models::artist::ArtistSummary;
use crate::models::venue::VenueSummary;
use crate::models::{Artist, Booking, Schedule, ShowListing, Venue};

pub fn display_time(time: NaiveDateTime) -> String {
    time.format("%a %b %-d, %Y %-I:%M %p UTC").to_string()
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Widget {
    Text,
    Tel,
    Url,
    DateTime,
    TextArea,
    Select,
    MultiSelect,
    Checkbox,
}

#[derive(Debug)]
pub struct Choice {
    pub value: String,
    pub label: String,
    pub selected: bool,
}

#[derive(Debug)]
pub struct Field {
    pub name: &'static str,
    pub label: &'static str,
    pub widget: Widget,
    pub value: String,
    pub checked: bool,
    pub choices: Vec<Choice>,
    pub errors: Vec<String>,
}

impl Field {
    fn new(name: &'static str, label: &'static str, widget: Widget, value: &str) -> Field {
        Field {
            name,
            label,
            widget,
            value: value.to_owned(),
            checked: false,
            choices: Vec::new(),
            errors: Vec::new(),
        }
    }

    fn checkbox(name: &'static str, label: &'static str, checked: bool) -> Field {
        Field {
            checked,
            ..Field::new(name, label, Widget::Checkbox, "")
        }
    }

    fn select(name: &'static str, label: &'static str, choices: &[&str], value: &str) -> Field {
        let choices = choices
            .iter()
            .map(|choice| Choice {
                value: (*choice).to_owned(),
                label: (*choice).to_owned(),
                selected: *choice == value,
            })
            .collect();
        Field {
            choices,
            ..Field::new(name, label, Widget::Select, value)
        }
    }

    fn genres(selected: &[String]) -> Field {
        let choices = GENRES
            .iter()
            .map(|genre| Choice {
                value: (*genre).to_owned(),
                label: (*genre).to_owned(),
                selected: selected.iter().any(|s| s == genre),
            })
            .collect();
        Field {
            choices,
            ..Field::new("genres", "Genres", Widget::MultiSelect, "")
        }
    }

    /// A select over `(id, name)` records, keyed by id.
    fn records(
        name: &'static str,
        label: &'static str,
        records: &[(i32, String)],
        value: &str,
    ) -> Field {
        let mut choices = vec![Choice {
            value: String::new(),
            label: "Pick one".to_owned(),
            selected: value.is_empty(),
        }];
        choices.extend(records.iter().map(|(id, record)| {
            let id = id.to_string();
            Choice {
                selected: id == value,
                value: id,
                label: record.clone(),
            }
        }));
        Field {
            choices,
            ..Field::new(name, label, Widget::Select, value)
        }
    }

    pub fn input_type(&self) -> &'static str {
        match self.widget {
            Widget::Tel => "tel",
            Widget::Url => "url",
            _ => "text",
        }
    }

    pub fn is_textarea(&self) -> bool {
        self.widget == Widget::TextArea
    }

    pub fn is_select(&self) -> bool {
        matches!(self.widget, Widget::Select | Widget::MultiSelect)
    }

    pub fn is_multiple(&self) -> bool {
        self.widget == Widget::MultiSelect
    }

    pub fn is_checkbox(&self) -> bool {
        self.widget == Widget::Checkbox
    }

    /// A plain `<input>`.
    pub fn is_input(&self) -> bool {
        !(self.is_textarea() || self.is_select() || self.is_checkbox())
    }

    pub fn placeholder(&self) -> &'static str {
        match self.widget {
            Widget::Tel => "xxxx-xxx-xxxx",
            Widget::Url => "https://",
            Widget::DateTime => "YYYY-MM-DD HH:MM:SS (UTC)",
            _ => "",
        }
    }
}

#[derive(Debug)]
pub struct FormPage {
    pub title: String,
    pub action: String,
    pub submit: &'static str,
    pub fields: Vec<Field>,
}

impl FormPage {
    fn new(
        title: String,
        action: String,
        submit: &'static str,
        mut fields: Vec<Field>,
        errors: &ValidationErrors,
    ) -> FormPage {
        for field in &mut fields {
            field.errors = errors.get(field.name).to_vec();
        }
        FormPage {
            title,
            action,
            submit,
            fields,
        }
    }

    pub fn venue(
        title: String,
        action: String,
        form: &VenueForm,
        errors: &ValidationErrors,
    ) -> FormPage {
        let fields = vec![
            Field::new("name", "Name", Widget::Text, &form.name),
            Field::new("city", "City", Widget::Text, &form.city),
            Field::select("state", "State", STATES, &form.state),
            Field::new("address", "Address", Widget::Text, &form.address),
            Field::new("phone", "Phone", Widget::Tel, &form.phone),
            Field::new("image_link", "Image link", Widget::Url, &form.image_link),
            Field::genres(&form.genres),
            Field::new("facebook_link", "Facebook link", Widget::Url, &form.facebook_link),
            Field::new("website_link", "Website link", Widget::Url, &form.website_link),
            Field::checkbox("seeking_talent", "Looking for talent", form.seeking_talent),
            Field::new(
                "seeking_description",
                "Seeking description",
                Widget::TextArea,
                &form.seeking_description,
            ),
        ];
        FormPage::new(title, action, "Save venue", fields, errors)
    }

    pub fn artist(
        title: String,
        action: String,
        form: &ArtistForm,
        errors: &ValidationErrors,
    ) -> FormPage {
        let fields = vec![
            Field::new("name", "Name", Widget::Text, &form.name),
            Field::new("city", "City", Widget::Text, &form.city),
            Field::select("state", "State", STATES, &form.state),
            Field::new("phone", "Phone", Widget::Tel, &form.phone),
            Field::new("image_link", "Image link", Widget::Url, &form.image_link),
            Field::genres(&form.genres),
            Field::new("facebook_link", "Facebook link", Widget::Url, &form.facebook_link),
            Field::new("website_link", "Website link", Widget::Url, &form.website_link),
            Field::checkbox("seeking_venue", "Looking for venues", form.seeking_venue),
            Field::new(
                "seeking_description",
                "Seeking description",
                Widget::TextArea,
                &form.seeking_description,
            ),
        ];
        FormPage::new(title, action, "Save artist", fields, errors)
    }

    pub fn show(
        form: &ShowForm,
        artists: &[(i32, String)],
        venues: &[(i32, String)],
        errors: &ValidationErrors,
    ) -> FormPage {
        let fields = vec![
            Field::records("artist_id", "Artist", artists, &form.artist_id),
            Field::records("venue_id", "Venue", venues, &form.venue_id),
            Field::new("start_time", "Start time", Widget::DateTime, &form.start_time),
        ];
        FormPage::new(
            "List a new show".to_owned(),
            "/shows/create".to_owned(),
            "Create show",
            fields,
            errors,
        )
    }
}

/// A link to a record, with its upcoming show count.
#[derive(Debug)]
pub struct Listed {
    pub href: String,
    pub name: String,
    pub num_upcoming_shows: i64,
}

impl Listed {
    pub fn venue(venue: &VenueSummary) -> Listed {
        Listed {
            href: format!("/venues/{}", venue.id),
            name: venue.name.clone(),
            num_upcoming_shows: venue.num_upcoming_shows,
        }
    }

    pub fn artist(artist: &ArtistSummary) -> Listed {
        Listed {
            href: format!("/artists/{}", artist.id),
            name: artist.name.clone(),
            num_upcoming_shows: artist.num_upcoming_shows,
        }
    }
}

#[derive(Debug)]
pub struct SearchPage {
    pub title: &'static str,
    pub action: &'static str,
    pub term: String,
    pub results: Vec<Listed>,
}

#[derive(Debug)]
pub struct Link {
    pub href: String,
    pub name: String,
}

impl Link {
    pub fn to(section: &str, (id, name): &(i32, String)) -> Link {
        Link {
            href: format!("/{}/{}", section, id),
            name: name.clone(),
        }
    }
}

#[derive(Debug)]
pub struct BookingLine {
    pub href: String,
    pub name: String,
    pub image_link: String,
    pub start_time: String,
}

impl BookingLine {
    fn from_bookings(section: &str, bookings: &[Booking]) -> Vec<BookingLine> {
        bookings
            .iter()
            .map(|booking| BookingLine {
                href: format!("/{}/{}", section, booking.id),
                name: booking.name.clone(),
                image_link: booking.image_link.clone(),
                start_time: display_time(booking.start_time),
            })
            .collect()
    }
}

/// Everything the venue and artist detail pages show.
#[derive(Debug)]
pub struct Profile {
    pub kind: &'static str,
    pub href: String,
    pub name: String,
    pub genres: Vec<String>,
    pub address: Option<String>,
    pub city: String,
    pub state: String,
    pub phone: String,
    pub website_link: Option<String>,
    pub facebook_link: Option<String>,
    pub seeking: bool,
    pub seeking_label: &'static str,
    pub seeking_description: Option<String>,
    pub image_link: String,
    pub past_shows: Vec<BookingLine>,
    pub upcoming_shows: Vec<BookingLine>,
}

impl Profile {
    pub fn venue(venue: Venue, schedule: &Schedule) -> Profile {
        Profile {
            kind: "venue",
            href: format!("/venues/{}", venue.id),
            genres: venue.genre_list(),
            name: venue.name,
            address: Some(venue.address),
            city: venue.city,
            state: venue.state,
            phone: venue.phone,
            website_link: venue.website_link,
            facebook_link: venue.facebook_link,
            seeking: venue.seeking_talent,
            seeking_label: "Seeking talent",
            seeking_description: Some(venue.seeking_description).filter(|d| !d.is_empty()),
            image_link: venue.image_link,
            past_shows: BookingLine::from_bookings("artists", &schedule.past),
            upcoming_shows: BookingLine::from_bookings("artists", &schedule.upcoming),
        }
    }

    pub fn artist(artist: Artist, schedule: &Schedule) -> Profile {
        Profile {
            kind: "artist",
            href: format!("/artists/{}", artist.id),
            genres: artist.genre_list(),
            name: artist.name,
            address: None,
            city: artist.city,
            state: artist.state,
            phone: artist.phone,
            website_link: artist.website_link,
            facebook_link: artist.facebook_link,
            seeking: artist.seeking_venue,
            seeking_label: "Seeking performance venues",
            seeking_description: artist.seeking_description.filter(|d| !d.is_empty()),
            image_link: artist.image_link,
            past_shows: BookingLine::from_bookings("venues", &schedule.past),
            upcoming_shows: BookingLine::from_bookings("venues", &schedule.upcoming),
        }
    }
}

#[derive(Debug)]
pub struct ShowLine {
    pub venue: Link,
    pub artist: Link,
    pub artist_image_link: String,
    pub start_time: String,
}

impl From<ShowListing> for ShowLine {
    fn from(show: ShowListing) -> ShowLine {
        ShowLine {
            venue: Link::to("venues", &(show.venue_id, show.venue_name)),
            artist: Link::to("artists", &(show.artist_id, show.artist_name)),
            artist_image_link: show.artist_image_link,
            start_time: display_time(show.start_time),
        }
    }
}
