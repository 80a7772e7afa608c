use chrono::NaiveDateTime;
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use tracing::debug;

use crate::error::{Error, Result};
use crate::models::{Artist, Venue};
use crate::schema::{artists, shows, venues};

#[derive(Clone, Debug, Identifiable, Queryable, Selectable)]
#[diesel(table_name = shows)]
pub struct Show {
    pub id: i32,
    pub artist_id: i32,
    pub venue_id: i32,
    pub start_time: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = shows)]
pub struct NewShow {
    pub artist_id: i32,
    pub venue_id: i32,
    pub start_time: NaiveDateTime,
}

/// One row of the show listing: a show joined with its venue and artist.
#[derive(Debug, Queryable)]
pub struct ShowListing {
    pub venue_id: i32,
    pub venue_name: String,
    pub artist_id: i32,
    pub artist_name: String,
    pub artist_image_link: String,
    pub start_time: NaiveDateTime,
}

/// A show seen from one side of the booking: the counterpart is the artist
/// when looking from a venue, and the venue when looking from an artist.
#[derive(Clone, Debug, PartialEq, Eq, Queryable)]
pub struct Booking {
    pub start_time: NaiveDateTime,
    pub id: i32,
    pub name: String,
    pub image_link: String,
}

#[derive(Debug, Default)]
pub struct Schedule {
    /// Most recent first.
    pub past: Vec<Booking>,
    /// Soonest first.
    pub upcoming: Vec<Booking>,
}

impl Schedule {
    /// Anything later than `now` is upcoming; everything else is past.
    pub fn split(mut bookings: Vec<Booking>, now: NaiveDateTime) -> Schedule {
        bookings.sort_by_key(|booking| booking.start_time);
        let (mut past, upcoming): (Vec<_>, Vec<_>) = bookings
            .into_iter()
            .partition(|booking| booking.start_time <= now);
        past.reverse();
        Schedule { past, upcoming }
    }
}

impl Show {
    pub fn find_booking(conn: &mut SqliteConnection, show: &NewShow) -> Result<Option<Show>> {
        Ok(shows::table
            .filter(shows::artist_id.eq(show.artist_id))
            .filter(shows::venue_id.eq(show.venue_id))
            .filter(shows::start_time.eq(show.start_time))
            .select(Show::as_select())
            .first(conn)
            .optional()?)
    }
}

impl ShowListing {
    pub fn all(conn: &mut SqliteConnection) -> Result<Vec<ShowListing>> {
        Ok(shows::table
            .inner_join(venues::table)
            .inner_join(artists::table)
            .order((shows::start_time.asc(), shows::id.asc()))
            .select((
                venues::id,
                venues::name,
                artists::id,
                artists::name,
                artists::image_link,
                shows::start_time,
            ))
            .load(conn)?)
    }
}

impl NewShow {
    /// Books the show, refusing a second booking of the same artist at the
    /// same venue and time. Both sides of the booking must exist.
    pub fn insert(&self, conn: &mut SqliteConnection) -> Result<i32> {
        Artist::find(conn, self.artist_id)?;
        Venue::find(conn, self.venue_id)?;

        if let Some(existing) = Show::find_booking(conn, self)? {
            debug!(show_id = existing.id, "show is already booked");
            return Err(Error::DuplicateShow);
        }

        diesel::insert_into(shows::table)
            .values(self)
            .returning(shows::id)
            .get_result(conn)
            .map_err(|err| match err {
                DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                    Error::DuplicateShow
                }
                err => Error::Database(err),
            })
    }
}
