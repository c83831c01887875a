use crate::domain_repository::{BookingRepository, InMemoryBookingRepository};
use crate::errors::Result;
use crate::form::parse_datetime;
use crate::{ArtistFields, Genres, ShowFields, VenueFields};

/// Ids generados al cargar los datos de ejemplo.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedIds {
  pub venues: Vec<i32>,
  pub artists: Vec<i32>,
  pub shows: Vec<i32>,
}

pub struct DomainStubs;

impl DomainStubs {
  /// Crea un repositorio en memoria pre-poblado con los datos de ejemplo.
  pub fn sample_repo() -> Result<InMemoryBookingRepository> {
    let repo = InMemoryBookingRepository::new();
    Self::seed(&repo)?;
    Ok(repo)
  }

  /// Carga tres venues, tres artistas y cinco shows (dos pasados y tres en
  /// 2035) en cualquier repositorio.
  pub fn seed<R>(repo: &R) -> Result<SeedIds>
    where R: BookingRepository + ?Sized
  {
    let mut hop = VenueFields::new("The Musical Hop", "San Francisco", "CA", "123-123-1234");
    hop.address = Some("1015 Folsom Street".into());
    hop.genres = Genres::new(["Jazz", "Reggae", "Swing", "Classical", "Folk"])?;
    hop.website = Some("https://www.themusicalhop.com".into());
    hop.facebook_link = Some("https://www.facebook.com/TheMusicalHop".into());
    hop.seeking_talent = true;
    hop.description =
      Some("We are on the lookout for a local artist to play every two weeks. Please call us.".into());
    hop.image_link = Some("https://images.unsplash.com/photo-1543900694-133f37abaaa5".into());

    let mut pianos = VenueFields::new("The Dueling Pianos Bar", "New York", "NY", "914-003-1132");
    pianos.address = Some("335 Delancey Street".into());
    pianos.genres = Genres::new(["Classical", "R&B", "Hip-Hop"])?;
    pianos.website = Some("https://www.theduelingpianos.com".into());
    pianos.facebook_link = Some("https://www.facebook.com/theduelingpianos".into());
    pianos.image_link = Some("https://images.unsplash.com/photo-1497032205916-ac775f0649ae".into());

    let mut park = VenueFields::new("Park Square Live Music & Coffee", "San Francisco", "CA", "415-000-1234");
    park.address = Some("34 Whiskey Moore Ave".into());
    park.genres = Genres::new(["Rock n Roll", "Jazz", "Classical", "Folk"])?;
    park.website = Some("https://www.parksquarelivemusicandcoffee.com".into());
    park.facebook_link = Some("https://www.facebook.com/ParkSquareLiveMusicAndCoffee".into());
    park.image_link = Some("https://images.unsplash.com/photo-1485686531765-ba63b07845a7".into());

    let mut petals = ArtistFields::new("Guns N Petals", "San Francisco", "CA", "326-123-5000");
    petals.genres = Genres::new(["Rock n Roll"])?;
    petals.website = Some("https://www.gunsnpetalsband.com".into());
    petals.facebook_link = Some("https://www.facebook.com/GunsNPetals".into());
    petals.seeking_venue = true;
    petals.description = Some("Looking for shows to perform at in the San Francisco Bay Area!".into());
    petals.image_link = Some("https://images.unsplash.com/photo-1549213783-8284d0336c4f".into());

    let mut matt = ArtistFields::new("Matt Quevedo", "New York", "NY", "300-400-5000");
    matt.genres = Genres::new(["Jazz"])?;
    matt.facebook_link = Some("https://www.facebook.com/mattquevedo923251523".into());
    matt.image_link = Some("https://images.unsplash.com/photo-1495223153807-b916f75de8c5".into());

    let mut sax = ArtistFields::new("The Wild Sax Band", "San Francisco", "CA", "432-325-5432");
    sax.genres = Genres::new(["Jazz", "Classical"])?;
    sax.image_link = Some("https://images.unsplash.com/photo-1558369981-f9ca78462e61".into());

    let venues = vec![repo.create_venue(hop)?, repo.create_venue(pianos)?, repo.create_venue(park)?];
    let artists = vec![repo.create_artist(petals)?, repo.create_artist(matt)?, repo.create_artist(sax)?];

    let bookings = [(0, 0, "2019-05-21 21:30:00"),
                    (2, 1, "2019-06-15 23:00:00"),
                    (2, 2, "2035-04-01 20:00:00"),
                    (2, 2, "2035-04-08 20:00:00"),
                    (2, 2, "2035-04-15 20:00:00")];
    let mut shows = Vec::with_capacity(bookings.len());
    for (venue, artist, start) in bookings {
      shows.push(repo.create_show(ShowFields::new(artists[artist], venues[venue], parse_datetime(start)?))?);
    }
    log::info!("seeded {} venues, {} artists, {} shows", venues.len(), artists.len(), shows.len());
    Ok(SeedIds { venues, artists, shows })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn sample_repo_is_populated() -> Result<()> {
    let repo = DomainStubs::sample_repo()?;
    assert_eq!(repo.list_venues()?.len(), 3);
    assert_eq!(repo.list_artists()?.len(), 3);
    assert_eq!(repo.list_shows()?.len(), 5);
    let (_, park_shows) = repo.venue_with_shows(3)?;
    assert_eq!(park_shows.len(), 4);
    Ok(())
  }
}
