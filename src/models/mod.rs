pub mod artist;
pub mod show;
pub mod venue;

pub use self::artist::{Artist, ArtistRecord};
pub use self::show::{Booking, NewShow, Schedule, ShowListing};
pub use self::venue::{Venue, VenueRecord};

/// Genres are stored as one comma-separated column.
pub fn split_genres(genres: &str) -> Vec<String> {
    genres
        .split(',')
        .map(str::trim)
        .filter(|genre| !genre.is_empty())
        .map(str::to_owned)
        .collect()
}

pub fn join_genres(genres: &[String]) -> String {
    genres.join(",")
}

/// Case-insensitive substring match on a record name. Case is folded with
/// Unicode rules, and `%` or `_` in the term are plain characters.
pub(crate) fn name_matches(name: &str, term: &str) -> bool {
    name.to_lowercase().contains(&term.trim().to_lowercase())
}

#[cfg(test)]
pub(crate) mod fixtures {
    use chrono::{NaiveDate, NaiveDateTime};
    use tempfile::TempDir;

    use super::{ArtistRecord, VenueRecord};
    use crate::db::Database;

    pub fn database() -> (TempDir, Database) {
        let dir = TempDir::new().unwrap();
        let db = Database::new(dir.path().join("fyyur.db").to_string_lossy().into_owned());
        db.migrate().unwrap();
        (dir, db)
    }

    pub fn venue_record(name: &str) -> VenueRecord {
        VenueRecord {
            name: name.to_owned(),
            city: "San Francisco".to_owned(),
            state: "CA".to_owned(),
            address: "1015 Folsom Street".to_owned(),
            phone: "1234-123-1234".to_owned(),
            image_link: "https://images.example.com/venue.jpg".to_owned(),
            facebook_link: None,
            website_link: Some("https://www.themusicalhop.com".to_owned()),
            genres: "Jazz,Reggae".to_owned(),
            seeking_talent: true,
            seeking_description: "We are on the lookout for a local artist".to_owned(),
        }
    }

    pub fn artist_record(name: &str) -> ArtistRecord {
        ArtistRecord {
            name: name.to_owned(),
            city: "San Francisco".to_owned(),
            state: "CA".to_owned(),
            phone: "3264-326-5000".to_owned(),
            genres: "Rock n Roll".to_owned(),
            image_link: "https://images.example.com/artist.jpg".to_owned(),
            facebook_link: Some("https://www.facebook.com/GunsNPetals".to_owned()),
            website_link: None,
            seeking_venue: true,
            seeking_description: None,
        }
    }

    pub fn at(year: i32, month: u32, day: u32, hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(year, month, day)
            .and_then(|date| date.and_hms_opt(hour, 0, 0))
            .unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn genres_round_trip_through_the_column() {
        let genres = vec!["Rock n Roll".to_owned(), "R&B".to_owned()];
        assert_eq!(split_genres(&join_genres(&genres)), genres);
        assert!(split_genres("").is_empty());
        assert_eq!(split_genres(" Jazz , ,Folk"), vec!["Jazz", "Folk"]);
    }

    #[test]
    fn names_match_ignoring_case_beyond_ascii() {
        assert!(name_matches("Concert Hall", "hall"));
        assert!(name_matches("CAFÉ ÉTOILE", "café"));
        assert!(name_matches("Café Étoile", " ÉTOILE "));
        assert!(name_matches("100% Hall", "0%"));
        assert!(!name_matches("The Musical Hop", "1_0"));
        assert!(name_matches("Anything", ""));
    }
}
