use crate::codec::{decode_genres, encode_genres};
use crate::config::StoreConfig;
use crate::schema::{artists, shows, venues};
use chrono::NaiveDateTime;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool, PooledConnection};
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use diesel::sql_types::Text;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use fyyur_domain::{Artist, ArtistFields, ArtistPatch, BookingRepository, DomainError, RecordKind, Result, Show,
                   ShowFields, ShowListing, ShowPatch, Venue, VenueFields, VenuePatch};
use std::sync::Arc;

#[cfg(not(feature = "pg"))]
pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations/sqlite");
#[cfg(feature = "pg")]
pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations/postgres");

#[cfg(feature = "pg")]
type DbConn = PgConnection;
#[cfg(not(feature = "pg"))]
type DbConn = SqliteConnection;
type DbPool = Pool<ConnectionManager<DbConn>>;

#[cfg(not(feature = "pg"))]
const SQLITE_BUSY_TIMEOUT_MS: u32 = 5000;

diesel::define_sql_function! {
    /// SQL `lower(text)`. On SQLite the built-in only folds ASCII, so each
    /// pooled connection replaces it with Rust's Unicode lowercase.
    fn lower(x: Text) -> Text;
}

/// Repo Diesel que implementa `BookingRepository`.
///
/// Every operation runs on its own pooled connection inside one
/// transaction. On SQLite writes use `BEGIN IMMEDIATE` so concurrent writers
/// queue on the busy timeout instead of failing on lock upgrade.
pub struct DieselBookingRepository {
  pool: Arc<DbPool>,
}

impl DieselBookingRepository {
  /// Opens the pool and runs pending migrations.
  pub fn new(config: &StoreConfig) -> Result<Self> {
    config.validate()?;
    let manager = ConnectionManager::<DbConn>::new(config.database_url.as_str());
    let builder = Pool::builder().max_size(config.effective_pool_size());
    #[cfg(not(feature = "pg"))]
    let builder = builder.connection_customizer(Box::new(SqlitePragmas { busy_timeout_ms: SQLITE_BUSY_TIMEOUT_MS }));
    let pool = builder.build(manager).map_err(|e| DomainError::ExternalError(format!("pool: {}", e)))?;
    let repo = DieselBookingRepository { pool: Arc::new(pool) };
    repo.prepare()?;
    log::info!("booking store ready (pool size {})", config.effective_pool_size());
    Ok(repo)
  }

  fn prepare(&self) -> Result<()> {
    let mut pooled = self.conn()?;
    let conn: &mut DbConn = &mut pooled;
    enable_wal(conn);
    let applied = conn.run_pending_migrations(MIGRATIONS)
                      .map_err(|e| DomainError::ExternalError(format!("migrations: {}", e)))?;
    if !applied.is_empty() {
      log::info!("applied {} migration(s)", applied.len());
    }
    Ok(())
  }

  fn conn_raw(&self) -> std::result::Result<PooledConnection<ConnectionManager<DbConn>>, r2d2::Error> {
    self.pool.get()
  }

  fn conn(&self) -> Result<PooledConnection<ConnectionManager<DbConn>>> {
    self.conn_raw().map_err(|e| DomainError::ExternalError(format!("pool: {}", e)))
  }

  /// Runs `f` in a write transaction; any error rolls everything back.
  fn write_tx<T, F>(&self, f: F) -> Result<T>
    where F: FnOnce(&mut DbConn) -> std::result::Result<T, TxError>
  {
    let mut pooled = self.conn()?;
    let conn: &mut DbConn = &mut pooled;
    #[cfg(not(feature = "pg"))]
    let outcome = conn.immediate_transaction(f);
    #[cfg(feature = "pg")]
    let outcome = conn.transaction(f);
    outcome.map_err(DomainError::from)
  }

  /// Runs `f` in a read transaction so multi-statement reads see one snapshot.
  fn read_tx<T, F>(&self, f: F) -> Result<T>
    where F: FnOnce(&mut DbConn) -> std::result::Result<T, TxError>
  {
    let mut pooled = self.conn()?;
    let conn: &mut DbConn = &mut pooled;
    conn.transaction(f).map_err(DomainError::from)
  }
}

#[cfg(not(feature = "pg"))]
fn enable_wal(conn: &mut DbConn) {
  if let Err(e) = diesel::sql_query("PRAGMA journal_mode = WAL;").execute(conn) {
    log::warn!("could not switch SQLite to WAL: {}", e);
  }
}

#[cfg(feature = "pg")]
fn enable_wal(_conn: &mut DbConn) {}

/// Per-connection SQLite settings. Foreign keys are off by default in SQLite
/// and `lower()` is swapped for a Unicode-aware version so name search folds
/// case the same way as `fyyur_domain::name_matches`.
#[cfg(not(feature = "pg"))]
#[derive(Debug, Clone, Copy)]
struct SqlitePragmas {
  busy_timeout_ms: u32,
}

#[cfg(not(feature = "pg"))]
impl diesel::r2d2::CustomizeConnection<SqliteConnection, diesel::r2d2::Error> for SqlitePragmas {
  fn on_acquire(&self, conn: &mut SqliteConnection) -> std::result::Result<(), diesel::r2d2::Error> {
    diesel::sql_query("PRAGMA foreign_keys = ON;").execute(conn).map_err(diesel::r2d2::Error::QueryError)?;
    diesel::sql_query(format!("PRAGMA busy_timeout = {};", self.busy_timeout_ms)).execute(conn)
                                                                                .map_err(diesel::r2d2::Error::QueryError)?;
    lower_utils::register_impl(conn, |x: String| x.to_lowercase()).map_err(diesel::r2d2::Error::QueryError)?;
    Ok(())
  }
}

/// Builds the repository from `FYYUR_DB_URL` / `DATABASE_URL`.
pub fn new_from_env() -> Result<DieselBookingRepository> {
  let config = StoreConfig::from_env()?;
  DieselBookingRepository::new(&config)
}

/// Opens (and migrates) an SQLite file at `path`.
#[cfg(not(feature = "pg"))]
pub fn new_sqlite_for_test(path: &str) -> Result<DieselBookingRepository> {
  DieselBookingRepository::new(&StoreConfig::new(path))
}

// Errors raised inside a transaction closure. Diesel needs
// `From<diesel::result::Error>` on the closure's error type to roll back.
#[derive(Debug, thiserror::Error)]
enum TxError {
  #[error(transparent)]
  Db(#[from] DieselError),
  #[error(transparent)]
  Domain(#[from] DomainError),
}

impl From<TxError> for DomainError {
  fn from(e: TxError) -> Self {
    match e {
      TxError::Db(e) => map_db_err(e),
      TxError::Domain(e) => e,
    }
  }
}

fn map_db_err(e: DieselError) -> DomainError {
  match e {
    DieselError::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, info) => {
      DomainError::ConstraintError(format!("foreign key: {}", info.message()))
    }
    DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info) => {
      DomainError::ConstraintError(format!("unique: {}", info.message()))
    }
    DieselError::NotFound => DomainError::NotFound("record".to_string()),
    other => DomainError::ExternalError(format!("db: {}", other)),
  }
}

/// `%term%` for a case-insensitive LIKE, with `\` as the escape character.
fn like_pattern(term: &str) -> String {
  let mut pattern = String::with_capacity(term.len() + 2);
  pattern.push('%');
  for ch in term.to_lowercase().chars() {
    if matches!(ch, '%' | '_' | '\\') {
      pattern.push('\\');
    }
    pattern.push(ch);
  }
  pattern.push('%');
  pattern
}

// Diesel row structs for the booking tables
#[derive(Debug, Queryable, Selectable)]
#[diesel(table_name = venues)]
struct VenueRow {
  id: i32,
  name: String,
  city: String,
  state: String,
  address: Option<String>,
  phone: String,
  genres: String,
  facebook_link: Option<String>,
  image_link: Option<String>,
  website: Option<String>,
  seeking_talent: bool,
  description: Option<String>,
}

impl VenueRow {
  fn into_venue(self) -> Result<Venue> {
    let fields = VenueFields { genres: decode_genres(&self.genres)?,
                               name: self.name,
                               city: self.city,
                               state: self.state,
                               address: self.address,
                               phone: self.phone,
                               facebook_link: self.facebook_link,
                               image_link: self.image_link,
                               website: self.website,
                               seeking_talent: self.seeking_talent,
                               description: self.description };
    Ok(Venue::new(self.id, fields))
  }
}

#[derive(Debug, Insertable, AsChangeset)]
#[diesel(table_name = venues)]
#[diesel(treat_none_as_null = true)]
struct VenueRecord<'a> {
  name: &'a str,
  city: &'a str,
  state: &'a str,
  address: Option<&'a str>,
  phone: &'a str,
  genres: String,
  facebook_link: Option<&'a str>,
  image_link: Option<&'a str>,
  website: Option<&'a str>,
  seeking_talent: bool,
  description: Option<&'a str>,
}

impl<'a> From<&'a VenueFields> for VenueRecord<'a> {
  fn from(f: &'a VenueFields) -> Self {
    VenueRecord { name: &f.name,
                  city: &f.city,
                  state: &f.state,
                  address: f.address.as_deref(),
                  phone: &f.phone,
                  genres: encode_genres(&f.genres),
                  facebook_link: f.facebook_link.as_deref(),
                  image_link: f.image_link.as_deref(),
                  website: f.website.as_deref(),
                  seeking_talent: f.seeking_talent,
                  description: f.description.as_deref() }
  }
}

#[derive(Debug, Queryable, Selectable)]
#[diesel(table_name = artists)]
struct ArtistRow {
  id: i32,
  name: String,
  city: String,
  state: String,
  phone: String,
  genres: String,
  facebook_link: Option<String>,
  image_link: Option<String>,
  website: Option<String>,
  seeking_venue: bool,
  description: Option<String>,
}

impl ArtistRow {
  fn into_artist(self) -> Result<Artist> {
    let fields = ArtistFields { genres: decode_genres(&self.genres)?,
                                name: self.name,
                                city: self.city,
                                state: self.state,
                                phone: self.phone,
                                facebook_link: self.facebook_link,
                                image_link: self.image_link,
                                website: self.website,
                                seeking_venue: self.seeking_venue,
                                description: self.description };
    Ok(Artist::new(self.id, fields))
  }
}

#[derive(Debug, Insertable, AsChangeset)]
#[diesel(table_name = artists)]
#[diesel(treat_none_as_null = true)]
struct ArtistRecord<'a> {
  name: &'a str,
  city: &'a str,
  state: &'a str,
  phone: &'a str,
  genres: String,
  facebook_link: Option<&'a str>,
  image_link: Option<&'a str>,
  website: Option<&'a str>,
  seeking_venue: bool,
  description: Option<&'a str>,
}

impl<'a> From<&'a ArtistFields> for ArtistRecord<'a> {
  fn from(f: &'a ArtistFields) -> Self {
    ArtistRecord { name: &f.name,
                   city: &f.city,
                   state: &f.state,
                   phone: &f.phone,
                   genres: encode_genres(&f.genres),
                   facebook_link: f.facebook_link.as_deref(),
                   image_link: f.image_link.as_deref(),
                   website: f.website.as_deref(),
                   seeking_venue: f.seeking_venue,
                   description: f.description.as_deref() }
  }
}

#[derive(Debug, Queryable, Selectable)]
#[diesel(table_name = shows)]
struct ShowRow {
  id: i32,
  artist_id: i32,
  venue_id: i32,
  start_time: NaiveDateTime,
}

impl From<ShowRow> for Show {
  fn from(r: ShowRow) -> Self {
    Show::new(r.id, ShowFields::new(r.artist_id, r.venue_id, r.start_time))
  }
}

#[derive(Debug, Insertable, AsChangeset)]
#[diesel(table_name = shows)]
struct ShowRecord {
  artist_id: i32,
  venue_id: i32,
  start_time: NaiveDateTime,
}

impl From<&ShowFields> for ShowRecord {
  fn from(f: &ShowFields) -> Self {
    ShowRecord { artist_id: f.artist_id, venue_id: f.venue_id, start_time: f.start_time }
  }
}

// Column order matches the tuple selected in `load_listings`.
#[derive(Debug, Queryable)]
struct ListingRow {
  show_id: i32,
  start_time: NaiveDateTime,
  venue_id: i32,
  venue_name: String,
  venue_image_link: Option<String>,
  artist_id: i32,
  artist_name: String,
  artist_image_link: Option<String>,
}

impl From<ListingRow> for ShowListing {
  fn from(r: ListingRow) -> Self {
    ShowListing { show_id: r.show_id,
                  start_time: r.start_time,
                  venue_id: r.venue_id,
                  venue_name: r.venue_name,
                  venue_image_link: r.venue_image_link,
                  artist_id: r.artist_id,
                  artist_name: r.artist_name,
                  artist_image_link: r.artist_image_link }
  }
}

enum ListingScope {
  All,
  Venue(i32),
  Artist(i32),
}

fn load_listings(conn: &mut DbConn, scope: ListingScope) -> QueryResult<Vec<ShowListing>> {
  let query = shows::table.inner_join(venues::table)
                          .inner_join(artists::table)
                          .select((shows::id,
                                   shows::start_time,
                                   venues::id,
                                   venues::name,
                                   venues::image_link,
                                   artists::id,
                                   artists::name,
                                   artists::image_link))
                          .order((shows::start_time.asc(), shows::id.asc()))
                          .into_boxed();
  let query = match scope {
    ListingScope::All => query,
    ListingScope::Venue(id) => query.filter(shows::venue_id.eq(id)),
    ListingScope::Artist(id) => query.filter(shows::artist_id.eq(id)),
  };
  Ok(query.load::<ListingRow>(conn)?.into_iter().map(ShowListing::from).collect())
}

fn find_venue(conn: &mut DbConn, id: i32) -> std::result::Result<Venue, TxError> {
  let row = venues::table.find(id).select(VenueRow::as_select()).first::<VenueRow>(conn).optional()?;
  match row {
    Some(row) => Ok(row.into_venue()?),
    None => Err(DomainError::not_found(RecordKind::Venue, id).into()),
  }
}

fn find_artist(conn: &mut DbConn, id: i32) -> std::result::Result<Artist, TxError> {
  let row = artists::table.find(id).select(ArtistRow::as_select()).first::<ArtistRow>(conn).optional()?;
  match row {
    Some(row) => Ok(row.into_artist()?),
    None => Err(DomainError::not_found(RecordKind::Artist, id).into()),
  }
}

fn find_show(conn: &mut DbConn, id: i32) -> std::result::Result<Show, TxError> {
  let row = shows::table.find(id).select(ShowRow::as_select()).first::<ShowRow>(conn).optional()?;
  row.map(Show::from).ok_or_else(|| DomainError::not_found(RecordKind::Show, id).into())
}

fn venue_exists(conn: &mut DbConn, id: i32) -> QueryResult<bool> {
  diesel::select(diesel::dsl::exists(venues::table.find(id))).get_result(conn)
}

fn artist_exists(conn: &mut DbConn, id: i32) -> QueryResult<bool> {
  diesel::select(diesel::dsl::exists(artists::table.find(id))).get_result(conn)
}

/// Both ends of a show must exist before it is written.
fn check_show_refs(conn: &mut DbConn, fields: &ShowFields) -> std::result::Result<(), TxError> {
  if !venue_exists(conn, fields.venue_id)? {
    return Err(DomainError::ConstraintError(format!("venue {} does not exist", fields.venue_id)).into());
  }
  if !artist_exists(conn, fields.artist_id)? {
    return Err(DomainError::ConstraintError(format!("artist {} does not exist", fields.artist_id)).into());
  }
  Ok(())
}

fn rows_into<R, T, F>(rows: Vec<R>, convert: F) -> Result<Vec<T>>
  where F: Fn(R) -> Result<T>
{
  rows.into_iter().map(convert).collect()
}

impl BookingRepository for DieselBookingRepository {
  fn create_venue(&self, fields: VenueFields) -> Result<i32> {
    fields.validate()?;
    let id = self.write_tx(|conn| {
                   let id = diesel::insert_into(venues::table).values(&VenueRecord::from(&fields))
                                                              .returning(venues::id)
                                                              .get_result::<i32>(conn)?;
                   Ok(id)
                 })?;
    log::debug!("db: created venue {}", id);
    Ok(id)
  }

  fn get_venue(&self, id: i32) -> Result<Venue> {
    let mut pooled = self.conn()?;
    Ok(find_venue(&mut pooled, id)?)
  }

  fn list_venues(&self) -> Result<Vec<Venue>> {
    let mut conn = self.conn()?;
    let rows = venues::table.order(venues::id.asc())
                            .select(VenueRow::as_select())
                            .load::<VenueRow>(&mut conn)
                            .map_err(map_db_err)?;
    rows_into(rows, VenueRow::into_venue)
  }

  fn update_venue(&self, id: i32, patch: VenuePatch) -> Result<Venue> {
    self.write_tx(|conn| {
          let current = find_venue(conn, id)?;
          let next = patch.apply_to(&current.fields)?;
          diesel::update(venues::table.find(id)).set(&VenueRecord::from(&next)).execute(conn)?;
          Ok(Venue::new(id, next))
        })
  }

  fn delete_venue(&self, id: i32) -> Result<()> {
    self.write_tx(|conn| {
          if !venue_exists(conn, id)? {
            return Err(DomainError::not_found(RecordKind::Venue, id).into());
          }
          let booked = shows::table.filter(shows::venue_id.eq(id)).count().get_result::<i64>(conn)?;
          if booked > 0 {
            return Err(DomainError::ConstraintError(format!("venue {} still has {} show(s)", id, booked)).into());
          }
          diesel::delete(venues::table.find(id)).execute(conn)?;
          Ok(())
        })
  }

  fn search_venues(&self, term: &str) -> Result<Vec<Venue>> {
    let mut conn = self.conn()?;
    let rows = venues::table.filter(lower(venues::name).like(like_pattern(term)).escape('\\'))
                            .order(venues::id.asc())
                            .select(VenueRow::as_select())
                            .load::<VenueRow>(&mut conn)
                            .map_err(map_db_err)?;
    rows_into(rows, VenueRow::into_venue)
  }

  fn create_artist(&self, fields: ArtistFields) -> Result<i32> {
    fields.validate()?;
    let id = self.write_tx(|conn| {
                   let id = diesel::insert_into(artists::table).values(&ArtistRecord::from(&fields))
                                                               .returning(artists::id)
                                                               .get_result::<i32>(conn)?;
                   Ok(id)
                 })?;
    log::debug!("db: created artist {}", id);
    Ok(id)
  }

  fn get_artist(&self, id: i32) -> Result<Artist> {
    let mut pooled = self.conn()?;
    Ok(find_artist(&mut pooled, id)?)
  }

  fn list_artists(&self) -> Result<Vec<Artist>> {
    let mut conn = self.conn()?;
    let rows = artists::table.order(artists::id.asc())
                             .select(ArtistRow::as_select())
                             .load::<ArtistRow>(&mut conn)
                             .map_err(map_db_err)?;
    rows_into(rows, ArtistRow::into_artist)
  }

  fn update_artist(&self, id: i32, patch: ArtistPatch) -> Result<Artist> {
    self.write_tx(|conn| {
          let current = find_artist(conn, id)?;
          let next = patch.apply_to(&current.fields)?;
          diesel::update(artists::table.find(id)).set(&ArtistRecord::from(&next)).execute(conn)?;
          Ok(Artist::new(id, next))
        })
  }

  fn delete_artist(&self, id: i32) -> Result<()> {
    self.write_tx(|conn| {
          if !artist_exists(conn, id)? {
            return Err(DomainError::not_found(RecordKind::Artist, id).into());
          }
          let booked = shows::table.filter(shows::artist_id.eq(id)).count().get_result::<i64>(conn)?;
          if booked > 0 {
            return Err(DomainError::ConstraintError(format!("artist {} still has {} show(s)", id, booked)).into());
          }
          diesel::delete(artists::table.find(id)).execute(conn)?;
          Ok(())
        })
  }

  fn search_artists(&self, term: &str) -> Result<Vec<Artist>> {
    let mut conn = self.conn()?;
    let rows = artists::table.filter(lower(artists::name).like(like_pattern(term)).escape('\\'))
                             .order(artists::id.asc())
                             .select(ArtistRow::as_select())
                             .load::<ArtistRow>(&mut conn)
                             .map_err(map_db_err)?;
    rows_into(rows, ArtistRow::into_artist)
  }

  fn create_show(&self, fields: ShowFields) -> Result<i32> {
    fields.validate()?;
    let id = self.write_tx(|conn| {
                   check_show_refs(conn, &fields)?;
                   let id = diesel::insert_into(shows::table).values(&ShowRecord::from(&fields))
                                                             .returning(shows::id)
                                                             .get_result::<i32>(conn)?;
                   Ok(id)
                 })?;
    log::debug!("db: created show {} (artist {} at venue {})", id, fields.artist_id, fields.venue_id);
    Ok(id)
  }

  fn get_show(&self, id: i32) -> Result<Show> {
    let mut pooled = self.conn()?;
    Ok(find_show(&mut pooled, id)?)
  }

  fn list_shows(&self) -> Result<Vec<Show>> {
    let mut conn = self.conn()?;
    let rows = shows::table.order(shows::id.asc())
                           .select(ShowRow::as_select())
                           .load::<ShowRow>(&mut conn)
                           .map_err(map_db_err)?;
    Ok(rows.into_iter().map(Show::from).collect())
  }

  fn update_show(&self, id: i32, patch: ShowPatch) -> Result<Show> {
    self.write_tx(|conn| {
          let current = find_show(conn, id)?;
          let next = patch.apply_to(&current.fields)?;
          check_show_refs(conn, &next)?;
          diesel::update(shows::table.find(id)).set(&ShowRecord::from(&next)).execute(conn)?;
          Ok(Show::new(id, next))
        })
  }

  fn delete_show(&self, id: i32) -> Result<()> {
    self.write_tx(|conn| {
          let removed = diesel::delete(shows::table.find(id)).execute(conn)?;
          if removed == 0 {
            return Err(DomainError::not_found(RecordKind::Show, id).into());
          }
          Ok(())
        })
  }

  fn venue_with_shows(&self, id: i32) -> Result<(Venue, Vec<ShowListing>)> {
    self.read_tx(|conn| {
          let venue = find_venue(conn, id)?;
          let listings = load_listings(conn, ListingScope::Venue(id))?;
          Ok((venue, listings))
        })
  }

  fn artist_with_shows(&self, id: i32) -> Result<(Artist, Vec<ShowListing>)> {
    self.read_tx(|conn| {
          let artist = find_artist(conn, id)?;
          let listings = load_listings(conn, ListingScope::Artist(id))?;
          Ok((artist, listings))
        })
  }

  fn list_show_listings(&self) -> Result<Vec<ShowListing>> {
    let mut pooled = self.conn()?;
    load_listings(&mut pooled, ListingScope::All).map_err(map_db_err)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn like_pattern_escapes_wildcards() {
    assert_eq!(like_pattern("Hop"), "%hop%");
    assert_eq!(like_pattern(""), "%%");
    assert_eq!(like_pattern("50%_off\\"), "%50\\%\\_off\\\\%");
  }

  #[test]
  fn diesel_errors_map_to_domain_errors() {
    let fk = DieselError::DatabaseError(DatabaseErrorKind::ForeignKeyViolation,
                                        Box::new(String::from("FOREIGN KEY constraint failed")));
    assert!(matches!(map_db_err(fk), DomainError::ConstraintError(_)));
    assert!(matches!(map_db_err(DieselError::NotFound), DomainError::NotFound(_)));
    assert!(matches!(map_db_err(DieselError::RollbackTransaction), DomainError::ExternalError(_)));
  }
}
