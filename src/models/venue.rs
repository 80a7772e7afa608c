use chrono::NaiveDateTime;
use diesel::dsl::count_star;
use diesel::prelude::*;
use std::collections::HashMap;

use crate::error::{Error, Kind, Result};
use crate::models::{name_matches, split_genres, Booking};
use crate::schema::{artists, shows, venues};

#[derive(Clone, Debug, Identifiable, Queryable, Selectable)]
#[diesel(table_name = venues)]
pub struct Venue {
    pub id: i32,
    pub name: String,
    pub city: String,
    pub state: String,
    pub address: String,
    pub phone: String,
    pub image_link: String,
    pub facebook_link: Option<String>,
    pub website_link: Option<String>,
    pub genres: String,
    pub seeking_talent: bool,
    pub seeking_description: String,
}

/// Every column a venue form may write. Used for both inserts and edits,
/// so an edit overwrites exactly these columns and nothing else.
#[derive(Clone, Debug, Insertable, AsChangeset)]
#[diesel(table_name = venues)]
#[diesel(treat_none_as_null = true)]
pub struct VenueRecord {
    pub name: String,
    pub city: String,
    pub state: String,
    pub address: String,
    pub phone: String,
    pub image_link: String,
    pub facebook_link: Option<String>,
    pub website_link: Option<String>,
    pub genres: String,
    pub seeking_talent: bool,
    pub seeking_description: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VenueSummary {
    pub id: i32,
    pub name: String,
    pub num_upcoming_shows: i64,
}

/// The venues of one (state, city) pair.
#[derive(Debug)]
pub struct Area {
    pub city: String,
    pub state: String,
    pub venues: Vec<VenueSummary>,
}

/// Number of shows later than `now`, keyed by venue.
fn upcoming_counts(conn: &mut SqliteConnection, now: NaiveDateTime) -> Result<HashMap<i32, i64>> {
    let counts = shows::table
        .filter(shows::start_time.gt(now))
        .group_by(shows::venue_id)
        .select((shows::venue_id, count_star()))
        .load::<(i32, i64)>(conn)?;
    Ok(counts.into_iter().collect())
}

impl Venue {
    pub fn find(conn: &mut SqliteConnection, venue_id: i32) -> Result<Venue> {
        venues::table
            .find(venue_id)
            .select(Venue::as_select())
            .first(conn)
            .optional()?
            .ok_or_else(|| Error::NotFound {
                kind: Kind::Venue,
                id: venue_id.to_string(),
            })
    }

    pub fn genre_list(&self) -> Vec<String> {
        split_genres(&self.genres)
    }

    pub fn areas(conn: &mut SqliteConnection, now: NaiveDateTime) -> Result<Vec<Area>> {
        let rows = venues::table
            .order((venues::state.asc(), venues::city.asc(), venues::name.asc()))
            .select((venues::id, venues::name, venues::city, venues::state))
            .load::<(i32, String, String, String)>(conn)?;
        let upcoming = upcoming_counts(conn, now)?;

        let mut areas: Vec<Area> = Vec::new();
        for (id, name, city, state) in rows {
            let summary = VenueSummary {
                id,
                name,
                num_upcoming_shows: upcoming.get(&id).copied().unwrap_or(0),
            };
            match areas.last_mut() {
                Some(area) if area.city == city && area.state == state => {
                    area.venues.push(summary)
                }
                _ => areas.push(Area {
                    city,
                    state,
                    venues: vec![summary],
                }),
            }
        }
        Ok(areas)
    }

    pub fn search(
        conn: &mut SqliteConnection,
        term: &str,
        now: NaiveDateTime,
    ) -> Result<Vec<VenueSummary>> {
        let matches = venues::table
            .order(venues::name.asc())
            .select((venues::id, venues::name))
            .load::<(i32, String)>(conn)?;
        let upcoming = upcoming_counts(conn, now)?;

        Ok(matches
            .into_iter()
            .filter(|(_, name)| name_matches(name, term))
            .map(|(id, name)| VenueSummary {
                id,
                name,
                num_upcoming_shows: upcoming.get(&id).copied().unwrap_or(0),
            })
            .collect())
    }

    /// The most recently listed venues, newest first.
    pub fn recent(conn: &mut SqliteConnection, limit: i64) -> Result<Vec<(i32, String)>> {
        Ok(venues::table
            .order(venues::id.desc())
            .limit(limit)
            .select((venues::id, venues::name))
            .load(conn)?)
    }

    /// Id and name of every venue, for the show booking form.
    pub fn names(conn: &mut SqliteConnection) -> Result<Vec<(i32, String)>> {
        Ok(venues::table
            .order(venues::name.asc())
            .select((venues::id, venues::name))
            .load(conn)?)
    }

    /// Every show at this venue, seen from the artist side.
    pub fn bookings(conn: &mut SqliteConnection, venue_id: i32) -> Result<Vec<Booking>> {
        Ok(shows::table
            .inner_join(artists::table)
            .filter(shows::venue_id.eq(venue_id))
            .select((
                shows::start_time,
                artists::id,
                artists::name,
                artists::image_link,
            ))
            .load(conn)?)
    }

    pub fn update(
        conn: &mut SqliteConnection,
        venue_id: i32,
        record: &VenueRecord,
    ) -> Result<()> {
        let updated = diesel::update(venues::table.find(venue_id))
            .set(record)
            .execute(conn)?;
        if updated == 0 {
            return Err(Error::NotFound {
                kind: Kind::Venue,
                id: venue_id.to_string(),
            });
        }
        Ok(())
    }

    /// Deletes a venue that has no shows. A venue with shows is left alone,
    /// together with its shows.
    pub fn delete(conn: &mut SqliteConnection, venue_id: i32) -> Result<Venue> {
        let venue = Venue::find(conn, venue_id)?;
        let booked: i64 = shows::table
            .filter(shows::venue_id.eq(venue_id))
            .count()
            .get_result(conn)?;
        if booked > 0 {
            return Err(Error::HasShows {
                kind: Kind::Venue,
                name: venue.name,
                count: booked,
            });
        }

        diesel::delete(venues::table.find(venue_id)).execute(conn)?;
        Ok(venue)
    }
}

impl VenueRecord {
    pub fn insert(&self, conn: &mut SqliteConnection) -> Result<i32> {
        Ok(diesel::insert_into(venues::table)
            .values(self)
            .returning(venues::id)
            .get_result(conn)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::fixtures::{self, at};
    use crate::models::NewShow;

    #[test]
    fn areas_group_by_state_and_city_with_per_venue_counts() {
        let (_dir, db) = fixtures::database();
        let now = at(2024, 6, 1, 12);

        let (hop, park, dueling) = db
            .transaction(|conn| {
                let hop = fixtures::venue_record("The Musical Hop").insert(conn)?;
                let dueling = VenueRecord {
                    city: "New York".to_owned(),
                    state: "NY".to_owned(),
                    ..fixtures::venue_record("The Dueling Pianos Bar")
                }
                .insert(conn)?;
                let park = fixtures::venue_record("Park Square Live Music & Coffee").insert(conn)?;
                let artist_id = fixtures::artist_record("Guns N Petals").insert(conn)?;

                for (venue_id, start_time) in [
                    (hop, at(2024, 7, 1, 20)),
                    (hop, at(2024, 8, 1, 20)),
                    (hop, at(2024, 1, 1, 20)),
                    (park, at(2024, 9, 1, 20)),
                ] {
                    NewShow {
                        artist_id,
                        venue_id,
                        start_time,
                    }
                    .insert(conn)?;
                }
                Ok((hop, park, dueling))
            })
            .unwrap();

        let areas = db.read(|conn| Venue::areas(conn, now)).unwrap();
        assert_eq!(areas.len(), 2);

        assert_eq!((areas[0].state.as_str(), areas[0].city.as_str()), ("CA", "San Francisco"));
        assert_eq!(
            areas[0].venues,
            vec![
                VenueSummary {
                    id: park,
                    name: "Park Square Live Music & Coffee".to_owned(),
                    num_upcoming_shows: 1,
                },
                VenueSummary {
                    id: hop,
                    name: "The Musical Hop".to_owned(),
                    num_upcoming_shows: 2,
                },
            ]
        );

        assert_eq!((areas[1].state.as_str(), areas[1].city.as_str()), ("NY", "New York"));
        assert_eq!(areas[1].venues[0].id, dueling);
        assert_eq!(areas[1].venues[0].num_upcoming_shows, 0);
    }

    #[test]
    fn search_is_case_insensitive_substring() {
        let (_dir, db) = fixtures::database();
        db.transaction(|conn| {
            fixtures::venue_record("Concert Hall").insert(conn)?;
            fixtures::venue_record("The Musical Hop").insert(conn)?;
            fixtures::venue_record("100% Hall").insert(conn)?;
            fixtures::venue_record("CAFÉ ÉTOILE").insert(conn)?;
            Ok(())
        })
        .unwrap();
        let now = at(2024, 6, 1, 12);

        let names = |term: &str| -> Vec<String> {
            db.read(|conn| Venue::search(conn, term, now))
                .unwrap()
                .into_iter()
                .map(|venue| venue.name)
                .collect()
        };

        assert_eq!(names("hall"), vec!["100% Hall", "Concert Hall"]);
        assert_eq!(names("HOP"), vec!["The Musical Hop"]);
        assert_eq!(names("0%"), vec!["100% Hall"]);
        assert_eq!(names("café"), vec!["CAFÉ ÉTOILE"]);
        assert_eq!(names("étoile"), vec!["CAFÉ ÉTOILE"]);
        assert!(names("opera").is_empty());
        assert!(names("_").is_empty());
        assert_eq!(names("").len(), 4);
    }

    #[test]
    fn update_overwrites_fields_and_reports_missing_venue() {
        let (_dir, db) = fixtures::database();
        let id = db
            .transaction(|conn| fixtures::venue_record("The Musical Hop").insert(conn))
            .unwrap();

        let record = VenueRecord {
            phone: "9999-999-9999".to_owned(),
            website_link: None,
            ..fixtures::venue_record("The Musical Hop II")
        };
        db.transaction(|conn| Venue::update(conn, id, &record))
            .unwrap();

        let venue = db.read(|conn| Venue::find(conn, id)).unwrap();
        assert_eq!(venue.name, "The Musical Hop II");
        assert_eq!(venue.phone, "9999-999-9999");
        assert_eq!(venue.website_link, None);
        assert_eq!(venue.genre_list(), vec!["Jazz", "Reggae"]);

        let missing = db.transaction(|conn| Venue::update(conn, id + 100, &record));
        assert!(matches!(missing, Err(Error::NotFound { kind: Kind::Venue, .. })));
    }

    #[test]
    fn venue_with_shows_is_not_deleted() {
        let (_dir, db) = fixtures::database();
        let (booked, free) = db
            .transaction(|conn| {
                let booked = fixtures::venue_record("Booked Room").insert(conn)?;
                let free = fixtures::venue_record("Free Room").insert(conn)?;
                let artist_id = fixtures::artist_record("Matt Quevedo").insert(conn)?;
                NewShow {
                    artist_id,
                    venue_id: booked,
                    start_time: at(2019, 6, 15, 23),
                }
                .insert(conn)?;
                Ok((booked, free))
            })
            .unwrap();

        let refused = db.transaction(|conn| Venue::delete(conn, booked));
        assert!(matches!(refused, Err(Error::HasShows { count: 1, .. })));
        assert_eq!(db.read(|conn| Venue::bookings(conn, booked)).unwrap().len(), 1);

        let deleted = db.transaction(|conn| Venue::delete(conn, free)).unwrap();
        assert_eq!(deleted.name, "Free Room");
        assert!(matches!(
            db.read(|conn| Venue::find(conn, free)),
            Err(Error::NotFound { .. })
        ));
        assert!(matches!(
            db.transaction(|conn| Venue::delete(conn, free)),
            Err(Error::NotFound { .. })
        ));
    }
}
