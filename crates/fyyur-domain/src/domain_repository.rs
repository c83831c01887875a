use crate::errors::{DomainError, RecordKind, Result};
use crate::{Artist, ArtistFields, ArtistPatch, Show, ShowFields, ShowListing, ShowPatch, Venue, VenueFields, VenuePatch};
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

/// Coincidencia por subcadena sin distinguir mayúsculas. Un término vacío
/// coincide con todo.
pub fn name_matches(name: &str, term: &str) -> bool {
  name.to_lowercase().contains(&term.to_lowercase())
}

/// Trait que define las operaciones de persistencia del directorio de
/// venues, artistas y shows.
///
/// Contrato común a todas las implementaciones:
/// - los listados y búsquedas se devuelven ordenados por id ascendente;
/// - las operaciones que modifican datos son atómicas: ante cualquier error
///   no queda ningún cambio parcial;
/// - borrar un venue o un artista con shows asociados se rechaza con
///   `ConstraintError`.
pub trait BookingRepository: Send + Sync {
  /// Valida y guarda un venue nuevo; devuelve el id generado.
  fn create_venue(&self, fields: VenueFields) -> Result<i32>;
  /// Obtiene un venue por id o `NotFound`.
  fn get_venue(&self, id: i32) -> Result<Venue>;
  fn list_venues(&self) -> Result<Vec<Venue>>;
  /// Aplica el patch completo o ninguno de sus cambios.
  fn update_venue(&self, id: i32, patch: VenuePatch) -> Result<Venue>;
  fn delete_venue(&self, id: i32) -> Result<()>;
  /// Venues cuyo nombre contiene `term` (sin distinguir mayúsculas).
  fn search_venues(&self, term: &str) -> Result<Vec<Venue>>;

  fn create_artist(&self, fields: ArtistFields) -> Result<i32>;
  fn get_artist(&self, id: i32) -> Result<Artist>;
  fn list_artists(&self) -> Result<Vec<Artist>>;
  fn update_artist(&self, id: i32, patch: ArtistPatch) -> Result<Artist>;
  fn delete_artist(&self, id: i32) -> Result<()>;
  fn search_artists(&self, term: &str) -> Result<Vec<Artist>>;

  /// Guarda un show. Falla con `ConstraintError` si el venue o el artista no
  /// existen.
  fn create_show(&self, fields: ShowFields) -> Result<i32>;
  fn get_show(&self, id: i32) -> Result<Show>;
  fn list_shows(&self) -> Result<Vec<Show>>;
  fn update_show(&self, id: i32, patch: ShowPatch) -> Result<Show>;
  fn delete_show(&self, id: i32) -> Result<()>;

  /// Venue y sus shows (con datos del artista), leídos de una sola vez.
  /// Los shows vienen ordenados por `start_time` y luego por id.
  fn venue_with_shows(&self, id: i32) -> Result<(Venue, Vec<ShowListing>)>;
  /// Artista y sus shows (con datos del venue).
  fn artist_with_shows(&self, id: i32) -> Result<(Artist, Vec<ShowListing>)>;
  /// Todos los shows unidos con venue y artista.
  fn list_show_listings(&self) -> Result<Vec<ShowListing>>;
}

#[derive(Default)]
struct InMemoryState {
  venues: BTreeMap<i32, VenueFields>,
  artists: BTreeMap<i32, ArtistFields>,
  shows: BTreeMap<i32, ShowFields>,
  last_venue_id: i32,
  last_artist_id: i32,
  last_show_id: i32,
}

impl InMemoryState {
  fn listing(&self, id: i32, show: &ShowFields) -> Result<ShowListing> {
    let venue = self.venues
                    .get(&show.venue_id)
                    .ok_or_else(|| DomainError::ExternalError(format!("show {} sin venue {}", id, show.venue_id)))?;
    let artist = self.artists
                     .get(&show.artist_id)
                     .ok_or_else(|| DomainError::ExternalError(format!("show {} sin artista {}", id, show.artist_id)))?;
    Ok(ShowListing { show_id: id,
                     start_time: show.start_time,
                     venue_id: show.venue_id,
                     venue_name: venue.name.clone(),
                     venue_image_link: venue.image_link.clone(),
                     artist_id: show.artist_id,
                     artist_name: artist.name.clone(),
                     artist_image_link: artist.image_link.clone() })
  }

  fn listings<F>(&self, keep: F) -> Result<Vec<ShowListing>>
    where F: Fn(&ShowFields) -> bool
  {
    let mut out = Vec::new();
    for (id, show) in self.shows.iter().filter(|entry| keep(entry.1)) {
      out.push(self.listing(*id, show)?);
    }
    out.sort_by(|a, b| a.start_time.cmp(&b.start_time).then(a.show_id.cmp(&b.show_id)));
    Ok(out)
  }

  fn check_show_refs(&self, fields: &ShowFields) -> Result<()> {
    if !self.venues.contains_key(&fields.venue_id) {
      return Err(DomainError::ConstraintError(format!("el venue {} no existe", fields.venue_id)));
    }
    if !self.artists.contains_key(&fields.artist_id) {
      return Err(DomainError::ConstraintError(format!("el artista {} no existe", fields.artist_id)));
    }
    Ok(())
  }
}

/// Implementación en memoria para tests y desarrollo.
///
/// Todo el estado vive detrás de un único mutex, de modo que cada operación
/// es atómica respecto de las demás. Los ids se generan de forma creciente y
/// no se reutilizan tras un borrado.
pub struct InMemoryBookingRepository {
  state: Mutex<InMemoryState>,
}

impl InMemoryBookingRepository {
  pub fn new() -> Self {
    Self { state: Mutex::new(InMemoryState::default()) }
  }

  // Helper to map poisoned mutex errors into DomainError
  fn lock(&self) -> Result<MutexGuard<'_, InMemoryState>> {
    self.state
        .lock()
        .map_err(|e| DomainError::ExternalError(format!("Mutex 'state' poisoned: {}", e)))
  }
}

impl Default for InMemoryBookingRepository {
  fn default() -> Self {
    Self::new()
  }
}

impl BookingRepository for InMemoryBookingRepository {
  fn create_venue(&self, fields: VenueFields) -> Result<i32> {
    fields.validate()?;
    let mut st = self.lock()?;
    st.last_venue_id += 1;
    let id = st.last_venue_id;
    st.venues.insert(id, fields);
    log::debug!("in-memory: created venue {}", id);
    Ok(id)
  }

  fn get_venue(&self, id: i32) -> Result<Venue> {
    let st = self.lock()?;
    st.venues
      .get(&id)
      .map(|f| Venue::new(id, f.clone()))
      .ok_or_else(|| DomainError::not_found(RecordKind::Venue, id))
  }

  fn list_venues(&self) -> Result<Vec<Venue>> {
    let st = self.lock()?;
    Ok(st.venues.iter().map(|(id, f)| Venue::new(*id, f.clone())).collect())
  }

  fn update_venue(&self, id: i32, patch: VenuePatch) -> Result<Venue> {
    let mut st = self.lock()?;
    let current = st.venues.get(&id).ok_or_else(|| DomainError::not_found(RecordKind::Venue, id))?;
    let next = patch.apply_to(current)?;
    st.venues.insert(id, next.clone());
    Ok(Venue::new(id, next))
  }

  fn delete_venue(&self, id: i32) -> Result<()> {
    let mut st = self.lock()?;
    if !st.venues.contains_key(&id) {
      return Err(DomainError::not_found(RecordKind::Venue, id));
    }
    let booked = st.shows.values().filter(|s| s.venue_id == id).count();
    if booked > 0 {
      return Err(DomainError::ConstraintError(format!("No se puede eliminar el venue {}; tiene {} shows", id, booked)));
    }
    st.venues.remove(&id);
    Ok(())
  }

  fn search_venues(&self, term: &str) -> Result<Vec<Venue>> {
    let st = self.lock()?;
    Ok(st.venues
         .iter()
         .filter(|(_, f)| name_matches(&f.name, term))
         .map(|(id, f)| Venue::new(*id, f.clone()))
         .collect())
  }

  fn create_artist(&self, fields: ArtistFields) -> Result<i32> {
    fields.validate()?;
    let mut st = self.lock()?;
    st.last_artist_id += 1;
    let id = st.last_artist_id;
    st.artists.insert(id, fields);
    log::debug!("in-memory: created artist {}", id);
    Ok(id)
  }

  fn get_artist(&self, id: i32) -> Result<Artist> {
    let st = self.lock()?;
    st.artists
      .get(&id)
      .map(|f| Artist::new(id, f.clone()))
      .ok_or_else(|| DomainError::not_found(RecordKind::Artist, id))
  }

  fn list_artists(&self) -> Result<Vec<Artist>> {
    let st = self.lock()?;
    Ok(st.artists.iter().map(|(id, f)| Artist::new(*id, f.clone())).collect())
  }

  fn update_artist(&self, id: i32, patch: ArtistPatch) -> Result<Artist> {
    let mut st = self.lock()?;
    let current = st.artists.get(&id).ok_or_else(|| DomainError::not_found(RecordKind::Artist, id))?;
    let next = patch.apply_to(current)?;
    st.artists.insert(id, next.clone());
    Ok(Artist::new(id, next))
  }

  fn delete_artist(&self, id: i32) -> Result<()> {
    let mut st = self.lock()?;
    if !st.artists.contains_key(&id) {
      return Err(DomainError::not_found(RecordKind::Artist, id));
    }
    let booked = st.shows.values().filter(|s| s.artist_id == id).count();
    if booked > 0 {
      return Err(DomainError::ConstraintError(format!("No se puede eliminar el artista {}; tiene {} shows",
                                                      id, booked)));
    }
    st.artists.remove(&id);
    Ok(())
  }

  fn search_artists(&self, term: &str) -> Result<Vec<Artist>> {
    let st = self.lock()?;
    Ok(st.artists
         .iter()
         .filter(|(_, f)| name_matches(&f.name, term))
         .map(|(id, f)| Artist::new(*id, f.clone()))
         .collect())
  }

  fn create_show(&self, fields: ShowFields) -> Result<i32> {
    fields.validate()?;
    let mut st = self.lock()?;
    st.check_show_refs(&fields)?;
    st.last_show_id += 1;
    let id = st.last_show_id;
    st.shows.insert(id, fields);
    log::debug!("in-memory: created show {}", id);
    Ok(id)
  }

  fn get_show(&self, id: i32) -> Result<Show> {
    let st = self.lock()?;
    st.shows
      .get(&id)
      .map(|f| Show::new(id, f.clone()))
      .ok_or_else(|| DomainError::not_found(RecordKind::Show, id))
  }

  fn list_shows(&self) -> Result<Vec<Show>> {
    let st = self.lock()?;
    Ok(st.shows.iter().map(|(id, f)| Show::new(*id, f.clone())).collect())
  }

  fn update_show(&self, id: i32, patch: ShowPatch) -> Result<Show> {
    let mut st = self.lock()?;
    let current = st.shows.get(&id).ok_or_else(|| DomainError::not_found(RecordKind::Show, id))?;
    let next = patch.apply_to(current)?;
    st.check_show_refs(&next)?;
    st.shows.insert(id, next.clone());
    Ok(Show::new(id, next))
  }

  fn delete_show(&self, id: i32) -> Result<()> {
    let mut st = self.lock()?;
    st.shows.remove(&id).map(|_| ()).ok_or_else(|| DomainError::not_found(RecordKind::Show, id))
  }

  fn venue_with_shows(&self, id: i32) -> Result<(Venue, Vec<ShowListing>)> {
    let st = self.lock()?;
    let fields = st.venues.get(&id).ok_or_else(|| DomainError::not_found(RecordKind::Venue, id))?;
    let shows = st.listings(|s| s.venue_id == id)?;
    Ok((Venue::new(id, fields.clone()), shows))
  }

  fn artist_with_shows(&self, id: i32) -> Result<(Artist, Vec<ShowListing>)> {
    let st = self.lock()?;
    let fields = st.artists.get(&id).ok_or_else(|| DomainError::not_found(RecordKind::Artist, id))?;
    let shows = st.listings(|s| s.artist_id == id)?;
    Ok((Artist::new(id, fields.clone()), shows))
  }

  fn list_show_listings(&self) -> Result<Vec<ShowListing>> {
    let st = self.lock()?;
    st.listings(|_| true)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use chrono::NaiveDate;

  fn venue() -> VenueFields {
    VenueFields::new("The Musical Hop", "San Francisco", "CA", "123-123-1234")
  }

  fn artist() -> ArtistFields {
    ArtistFields::new("Guns N Petals", "San Francisco", "CA", "326-123-5000")
  }

  fn when(day: u32) -> chrono::NaiveDateTime {
    NaiveDate::from_ymd_opt(2035, 4, day).and_then(|d| d.and_hms_opt(20, 0, 0)).expect("valid datetime")
  }

  #[test]
  fn create_and_get_venue() -> Result<()> {
    let repo = InMemoryBookingRepository::new();
    let id = repo.create_venue(venue())?;
    let loaded = repo.get_venue(id)?;
    assert_eq!(loaded.id, id);
    assert_eq!(loaded.fields, venue());
    Ok(())
  }

  #[test]
  fn ids_are_not_reused_after_delete() -> Result<()> {
    let repo = InMemoryBookingRepository::new();
    let first = repo.create_artist(artist())?;
    repo.delete_artist(first)?;
    let second = repo.create_artist(artist())?;
    assert!(second > first);
    Ok(())
  }

  #[test]
  fn show_with_missing_refs_is_rejected() -> Result<()> {
    let repo = InMemoryBookingRepository::new();
    let v = repo.create_venue(venue())?;
    match repo.create_show(ShowFields::new(99, v, when(1))) {
      Err(DomainError::ConstraintError(_)) => {}
      other => panic!("expected constraint error, got {:?}", other),
    }
    assert!(repo.list_shows()?.is_empty());
    Ok(())
  }

  #[test]
  fn listings_are_sorted_by_start_time() -> Result<()> {
    let repo = InMemoryBookingRepository::new();
    let v = repo.create_venue(venue())?;
    let a = repo.create_artist(artist())?;
    let late = repo.create_show(ShowFields::new(a, v, when(15)))?;
    let early = repo.create_show(ShowFields::new(a, v, when(1)))?;
    let (_, shows) = repo.venue_with_shows(v)?;
    let ids: Vec<i32> = shows.iter().map(|s| s.show_id).collect();
    assert_eq!(ids, vec![early, late]);
    assert_eq!(shows[0].artist_name, "Guns N Petals");
    Ok(())
  }

  #[test]
  fn failed_update_leaves_record_untouched() -> Result<()> {
    let repo = InMemoryBookingRepository::new();
    let id = repo.create_venue(venue())?;
    let patch = VenuePatch { name: Some("Renamed".into()), phone: Some(String::new()), ..Default::default() };
    assert!(matches!(repo.update_venue(id, patch), Err(DomainError::ValidationError(_))));
    assert_eq!(repo.get_venue(id)?.fields, venue());
    Ok(())
  }

  #[test]
  fn mutex_poisoning_returns_error() {
    use std::sync::Arc;
    use std::thread;

    let repo = Arc::new(InMemoryBookingRepository::new());
    let clone = repo.clone();
    let handle = thread::spawn(move || {
      let _g = clone.state.lock().unwrap();
      panic!("force poison");
    });
    let _ = handle.join();

    match repo.list_venues() {
      Err(DomainError::ExternalError(_)) => (),
      other => panic!("expected ExternalError, got {:?}", other),
    }
  }
}
