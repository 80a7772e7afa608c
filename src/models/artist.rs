use chrono::NaiveDateTime;
use diesel::dsl::count_star;
use diesel::prelude::*;
use std::collections::HashMap;

use crate::error::{Error, Kind, Result};
use crate::models::{name_matches, split_genres, Booking};
use crate::schema::{artists, shows, venues};

#[derive(Clone, Debug, Identifiable, Queryable, Selectable)]
#[diesel(table_name = artists)]
pub struct Artist {
    pub id: i32,
    pub name: String,
    pub city: String,
    pub state: String,
    pub phone: String,
    pub genres: String,
    pub image_link: String,
    pub facebook_link: Option<String>,
    pub website_link: Option<String>,
    pub seeking_venue: bool,
    pub seeking_description: Option<String>,
}

#[derive(Clone, Debug, Insertable, AsChangeset)]
#[diesel(table_name = artists)]
#[diesel(treat_none_as_null = true)]
pub struct ArtistRecord {
    pub name: String,
    pub city: String,
    pub state: String,
    pub phone: String,
    pub genres: String,
    pub image_link: String,
    pub facebook_link: Option<String>,
    pub website_link: Option<String>,
    pub seeking_venue: bool,
    pub seeking_description: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArtistSummary {
    pub id: i32,
    pub name: String,
    pub num_upcoming_shows: i64,
}

fn upcoming_counts(conn: &mut SqliteConnection, now: NaiveDateTime) -> Result<HashMap<i32, i64>> {
    let counts = shows::table
        .filter(shows::start_time.gt(now))
        .group_by(shows::artist_id)
        .select((shows::artist_id, count_star()))
        .load::<(i32, i64)>(conn)?;
    Ok(counts.into_iter().collect())
}

impl Artist {
    pub fn find(conn: &mut SqliteConnection, artist_id: i32) -> Result<Artist> {
        artists::table
            .find(artist_id)
            .select(Artist::as_select())
            .first(conn)
            .optional()?
            .ok_or_else(|| Error::NotFound {
                kind: Kind::Artist,
                id: artist_id.to_string(),
            })
    }

    pub fn genre_list(&self) -> Vec<String> {
        split_genres(&self.genres)
    }

    /// Id and name of every artist, alphabetically.
    pub fn names(conn: &mut SqliteConnection) -> Result<Vec<(i32, String)>> {
        Ok(artists::table
            .order((artists::name.asc(), artists::id.asc()))
            .select((artists::id, artists::name))
            .load(conn)?)
    }

    pub fn search(
        conn: &mut SqliteConnection,
        term: &str,
        now: NaiveDateTime,
    ) -> Result<Vec<ArtistSummary>> {
        let matches = artists::table
            .order(artists::name.asc())
            .select((artists::id, artists::name))
            .load::<(i32, String)>(conn)?;
        let upcoming = upcoming_counts(conn, now)?;

        Ok(matches
            .into_iter()
            .filter(|(_, name)| name_matches(name, term))
            .map(|(id, name)| ArtistSummary {
                id,
                name,
                num_upcoming_shows: upcoming.get(&id).copied().unwrap_or(0),
            })
            .collect())
    }

    pub fn recent(conn: &mut SqliteConnection, limit: i64) -> Result<Vec<(i32, String)>> {
        Ok(artists::table
            .order(artists::id.desc())
            .limit(limit)
            .select((artists::id, artists::name))
            .load(conn)?)
    }

    /// Every show this artist plays, seen from the venue side.
    pub fn bookings(conn: &mut SqliteConnection, artist_id: i32) -> Result<Vec<Booking>> {
        Ok(shows::table
            .inner_join(venues::table)
            .filter(shows::artist_id.eq(artist_id))
            .select((
                shows::start_time,
                venues::id,
                venues::name,
                venues::image_link,
            ))
            .load(conn)?)
    }

    pub fn update(
        conn: &mut SqliteConnection,
        artist_id: i32,
        record: &ArtistRecord,
    ) -> Result<()> {
        let updated = diesel::update(artists::table.find(artist_id))
            .set(record)
            .execute(conn)?;
        if updated == 0 {
            return Err(Error::NotFound {
                kind: Kind::Artist,
                id: artist_id.to_string(),
            });
        }
        Ok(())
    }

    pub fn delete(conn: &mut SqliteConnection, artist_id: i32) -> Result<Artist> {
        let artist = Artist::find(conn, artist_id)?;
        let booked: i64 = shows::table
            .filter(shows::artist_id.eq(artist_id))
            .count()
            .get_result(conn)?;
        if booked > 0 {
            return Err(Error::HasShows {
                kind: Kind::Artist,
                name: artist.name,
                count: booked,
            });
        }

        diesel::delete(artists::table.find(artist_id)).execute(conn)?;
        Ok(artist)
    }
}

impl ArtistRecord {
    pub fn insert(&self, conn: &mut SqliteConnection) -> Result<i32> {
        Ok(diesel::insert_into(artists::table)
            .values(self)
            .returning(artists::id)
            .get_result(conn)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::fixtures::{self, at};
    use crate::models::{NewShow, Schedule};

    #[test]
    fn bookings_split_into_past_and_upcoming() {
        let (_dir, db) = fixtures::database();
        let now = at(2024, 6, 1, 12);

        let (artist_id, hop, park) = db
            .transaction(|conn| {
                let artist_id = fixtures::artist_record("The Wild Sax Band").insert(conn)?;
                let hop = fixtures::venue_record("The Musical Hop").insert(conn)?;
                let park = fixtures::venue_record("Park Square").insert(conn)?;
                NewShow {
                    artist_id,
                    venue_id: hop,
                    start_time: at(2019, 6, 15, 23),
                }
                .insert(conn)?;
                NewShow {
                    artist_id,
                    venue_id: park,
                    start_time: at(2035, 4, 1, 20),
                }
                .insert(conn)?;
                Ok((artist_id, hop, park))
            })
            .unwrap();

        let bookings = db.read(|conn| Artist::bookings(conn, artist_id)).unwrap();
        let schedule = Schedule::split(bookings, now);
        assert_eq!(schedule.past.len(), 1);
        assert_eq!(schedule.past[0].id, hop);
        assert_eq!(schedule.past[0].name, "The Musical Hop");
        assert_eq!(schedule.upcoming.len(), 1);
        assert_eq!(schedule.upcoming[0].id, park);

        let found = db.read(|conn| Artist::search(conn, "wild", now)).unwrap();
        assert_eq!(
            found,
            vec![ArtistSummary {
                id: artist_id,
                name: "The Wild Sax Band".to_owned(),
                num_upcoming_shows: 1,
            }]
        );
    }

    #[test]
    fn search_folds_case_beyond_ascii() {
        let (_dir, db) = fixtures::database();
        db.transaction(|conn| {
            fixtures::artist_record("ÉMILIE SIMON").insert(conn)?;
            fixtures::artist_record("Guns N Petals").insert(conn)?;
            Ok(())
        })
        .unwrap();

        let found = db
            .read(|conn| Artist::search(conn, "émilie", at(2024, 6, 1, 12)))
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "ÉMILIE SIMON");
    }

    #[test]
    fn artist_with_shows_is_not_deleted() {
        let (_dir, db) = fixtures::database();
        let artist_id = db
            .transaction(|conn| {
                let artist_id = fixtures::artist_record("Matt Quevedo").insert(conn)?;
                let venue_id = fixtures::venue_record("The Dueling Pianos Bar").insert(conn)?;
                NewShow {
                    artist_id,
                    venue_id,
                    start_time: at(2019, 6, 15, 23),
                }
                .insert(conn)?;
                Ok(artist_id)
            })
            .unwrap();

        let refused = db.transaction(|conn| Artist::delete(conn, artist_id));
        assert!(matches!(
            refused,
            Err(Error::HasShows {
                kind: Kind::Artist,
                ..
            })
        ));
        assert_eq!(db.read(Artist::names).unwrap().len(), 1);
    }

    #[test]
    fn update_clears_optional_fields() {
        let (_dir, db) = fixtures::database();
        let artist_id = db
            .transaction(|conn| fixtures::artist_record("Guns N Petals").insert(conn))
            .unwrap();

        let record = ArtistRecord {
            facebook_link: None,
            seeking_description: Some("Looking for shows in the bay".to_owned()),
            genres: "Rock n Roll,Punk".to_owned(),
            ..fixtures::artist_record("Guns N Petals")
        };
        db.transaction(|conn| Artist::update(conn, artist_id, &record))
            .unwrap();

        let artist = db.read(|conn| Artist::find(conn, artist_id)).unwrap();
        assert_eq!(artist.facebook_link, None);
        assert_eq!(artist.seeking_description.as_deref(), Some("Looking for shows in the bay"));
        assert_eq!(artist.genre_list(), vec!["Rock n Roll", "Punk"]);
    }
}
