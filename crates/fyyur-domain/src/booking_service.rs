// Archivo: booking_service.rs
// Propósito: capa de consultas y agregación sobre el repositorio. Arma los
// modelos de vista (áreas, detalle de venue/artista, búsquedas, listado de
// shows) y clasifica shows en pasados/futuros con un único instante `now`
// por operación. Esta capa debe ser invocada desde handlers HTTP o la CLI.
use crate::clock::Clock;
use crate::domain_repository::{name_matches, BookingRepository};
use crate::errors::{RecordKind, Result};
use crate::views::{Area, ArtistDetail, ArtistListItem, ArtistShowSummary, ArtistSummary, SearchResults, ShowView,
                   VenueDetail, VenueShowSummary, VenueSummary};
use crate::{ArtistFields, ArtistPatch, Show, ShowFields, ShowListing, ShowPatch, ShowTiming, VenueFields, VenuePatch};
use chrono::NaiveDateTime;
use indexmap::IndexMap;
use std::collections::HashMap;
use std::sync::Arc;

/// Servicio de alto nivel sobre el directorio de reservas.
///
/// Las lecturas se componen de una o dos llamadas al repositorio; las
/// escrituras se delegan tal cual y quedan registradas en el log.
pub struct BookingService<R> where R: BookingRepository
{
  repo: Arc<R>,
  clock: Arc<dyn Clock>,
}

impl<R> BookingService<R> where R: BookingRepository
{
  pub fn new(repo: Arc<R>, clock: Arc<dyn Clock>) -> Self {
    Self { repo, clock }
  }

  pub fn repository(&self) -> &Arc<R> {
    &self.repo
  }

  /// Cuenta shows futuros por id, usando `key` para elegir venue o artista.
  fn upcoming_counts<F>(&self, now: NaiveDateTime, key: F) -> Result<HashMap<i32, usize>>
    where F: Fn(&Show) -> i32
  {
    let mut counts = HashMap::new();
    for show in self.repo.list_shows()? {
      if show.fields.timing(now).is_upcoming() {
        *counts.entry(key(&show)).or_insert(0) += 1;
      }
    }
    Ok(counts)
  }

  /// Venues agrupados por (city, state) exactos. Las áreas salen en el orden
  /// de su venue de menor id.
  pub fn group_venues_by_location(&self) -> Result<Vec<Area>> {
    let now = self.clock.now();
    let venues = self.repo.list_venues()?;
    let counts = self.upcoming_counts(now, |s| s.fields.venue_id)?;
    let mut areas: IndexMap<(String, String), Vec<VenueSummary>> = IndexMap::new();
    for venue in venues {
      let (city, state) = venue.location();
      let key = (city.to_string(), state.to_string());
      let summary = VenueSummary { id: venue.id,
                                   name: venue.fields.name,
                                   num_upcoming_shows: counts.get(&venue.id).copied().unwrap_or(0) };
      areas.entry(key).or_default().push(summary);
    }
    Ok(areas.into_iter().map(|((city, state), venues)| Area { city, state, venues }).collect())
  }

  pub fn venue_detail(&self, venue_id: i32) -> Result<VenueDetail> {
    let now = self.clock.now();
    let (venue, shows) = self.repo.venue_with_shows(venue_id)?;
    let (past, upcoming) = split_by_timing(shows, now, |l| ArtistShowSummary { start_time: l.formatted_start_time(),
                                                                                 artist_id: l.artist_id,
                                                                                 artist_name: l.artist_name,
                                                                                 artist_image_link:
                                                                                   l.artist_image_link });
    Ok(VenueDetail { id: venue.id,
                     fields: venue.fields,
                     past_shows_count: past.len(),
                     upcoming_shows_count: upcoming.len(),
                     past_shows: past,
                     upcoming_shows: upcoming })
  }

  pub fn artist_detail(&self, artist_id: i32) -> Result<ArtistDetail> {
    let now = self.clock.now();
    let (artist, shows) = self.repo.artist_with_shows(artist_id)?;
    let (past, upcoming) = split_by_timing(shows, now, |l| VenueShowSummary { start_time: l.formatted_start_time(),
                                                                                venue_id: l.venue_id,
                                                                                venue_name: l.venue_name,
                                                                                venue_image_link: l.venue_image_link });
    Ok(ArtistDetail { id: artist.id,
                      fields: artist.fields,
                      past_shows_count: past.len(),
                      upcoming_shows_count: upcoming.len(),
                      past_shows: past,
                      upcoming_shows: upcoming })
  }

  /// Búsqueda por subcadena del nombre. Un término vacío devuelve todos.
  pub fn search_venues(&self, term: &str) -> Result<SearchResults<VenueSummary>> {
    let now = self.clock.now();
    let venues = self.repo.search_venues(term)?;
    let counts = self.upcoming_counts(now, |s| s.fields.venue_id)?;
    let data = venues.into_iter()
                     .map(|v| VenueSummary { num_upcoming_shows: counts.get(&v.id).copied().unwrap_or(0),
                                             id: v.id,
                                             name: v.fields.name })
                     .collect();
    Ok(SearchResults::new(data))
  }

  pub fn search_artists(&self, term: &str) -> Result<SearchResults<ArtistSummary>> {
    let now = self.clock.now();
    let artists = self.repo.search_artists(term)?;
    let counts = self.upcoming_counts(now, |s| s.fields.artist_id)?;
    let data = artists.into_iter()
                      .map(|a| ArtistSummary { num_upcoming_shows: counts.get(&a.id).copied().unwrap_or(0),
                                               id: a.id,
                                               name: a.fields.name })
                      .collect();
    Ok(SearchResults::new(data))
  }

  /// Todos los shows, pasados y futuros, ordenados por `start_time`.
  pub fn list_shows(&self) -> Result<Vec<ShowView>> {
    Ok(self.repo.list_show_listings()?.into_iter().map(show_view).collect())
  }

  /// Shows cuyo artista o venue contiene `term` en el nombre.
  pub fn search_shows(&self, term: &str) -> Result<SearchResults<ShowView>> {
    let data = self.repo
                   .list_show_listings()?
                   .into_iter()
                   .filter(|l| name_matches(&l.artist_name, term) || name_matches(&l.venue_name, term))
                   .map(show_view)
                   .collect();
    Ok(SearchResults::new(data))
  }

  pub fn list_artists(&self) -> Result<Vec<ArtistListItem>> {
    Ok(self.repo
           .list_artists()?
           .into_iter()
           .map(|a| ArtistListItem { id: a.id, name: a.fields.name })
           .collect())
  }

  /// Campos guardados de un venue, para precargar el formulario de edición.
  pub fn venue_form(&self, venue_id: i32) -> Result<VenueFields> {
    Ok(self.repo.get_venue(venue_id)?.fields)
  }

  pub fn artist_form(&self, artist_id: i32) -> Result<ArtistFields> {
    Ok(self.repo.get_artist(artist_id)?.fields)
  }

  pub fn create_venue(&self, fields: VenueFields) -> Result<i32> {
    let name = fields.name.clone();
    logged(RecordKind::Venue, "create", self.repo.create_venue(fields)).inspect(|id| {
      log::info!("Venue {} ({}) was successfully listed", name, id)
    })
  }

  pub fn update_venue(&self, venue_id: i32, patch: VenuePatch) -> Result<VenueFields> {
    Ok(logged(RecordKind::Venue, "update", self.repo.update_venue(venue_id, patch))?.fields)
  }

  pub fn delete_venue(&self, venue_id: i32) -> Result<()> {
    logged(RecordKind::Venue, "delete", self.repo.delete_venue(venue_id))
  }

  pub fn create_artist(&self, fields: ArtistFields) -> Result<i32> {
    let name = fields.name.clone();
    logged(RecordKind::Artist, "create", self.repo.create_artist(fields)).inspect(|id| {
      log::info!("Artist {} ({}) was successfully listed", name, id)
    })
  }

  pub fn update_artist(&self, artist_id: i32, patch: ArtistPatch) -> Result<ArtistFields> {
    Ok(logged(RecordKind::Artist, "update", self.repo.update_artist(artist_id, patch))?.fields)
  }

  pub fn delete_artist(&self, artist_id: i32) -> Result<()> {
    logged(RecordKind::Artist, "delete", self.repo.delete_artist(artist_id))
  }

  pub fn create_show(&self, fields: ShowFields) -> Result<i32> {
    logged(RecordKind::Show, "create", self.repo.create_show(fields))
  }

  pub fn update_show(&self, show_id: i32, patch: ShowPatch) -> Result<ShowFields> {
    Ok(logged(RecordKind::Show, "update", self.repo.update_show(show_id, patch))?.fields)
  }

  pub fn delete_show(&self, show_id: i32) -> Result<()> {
    logged(RecordKind::Show, "delete", self.repo.delete_show(show_id))
  }
}

fn logged<T>(kind: RecordKind, op: &str, res: Result<T>) -> Result<T> {
  match &res {
    Ok(_) => log::debug!("{} {} ok", op, kind),
    Err(e) => log::warn!("{} {} rejected: {}", op, kind, e),
  }
  res
}

fn show_view(l: ShowListing) -> ShowView {
  ShowView { start_time: l.formatted_start_time(),
             show_id: l.show_id,
             venue_id: l.venue_id,
             venue_name: l.venue_name,
             artist_id: l.artist_id,
             artist_name: l.artist_name,
             artist_image_link: l.artist_image_link }
}

/// Separa en (pasados, futuros) conservando el orden de entrada.
fn split_by_timing<T, F>(shows: Vec<ShowListing>, now: NaiveDateTime, to_summary: F) -> (Vec<T>, Vec<T>)
  where F: Fn(ShowListing) -> T
{
  let mut past = Vec::new();
  let mut upcoming = Vec::new();
  for listing in shows {
    match listing.timing(now) {
      ShowTiming::Past => past.push(to_summary(listing)),
      ShowTiming::Upcoming => upcoming.push(to_summary(listing)),
    }
  }
  (past, upcoming)
}
