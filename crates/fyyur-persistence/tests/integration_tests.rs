#![cfg(not(feature = "pg"))]

use chrono::{Duration, NaiveDate};
use fyyur_domain::{BookingRepository, BookingService, DomainError, DomainStubs, FormData, ManualClock, ShowFields,
                   VenueFields};
use fyyur_persistence::{new_sqlite_for_test, DieselBookingRepository};
use std::sync::Arc;
use std::thread;
use uuid::Uuid;

fn setup_repo() -> (DieselBookingRepository, String) {
  let path = std::env::temp_dir().join(format!("fyyur_it_{}.db", Uuid::new_v4()));
  let path = path.to_str().unwrap().to_string();
  let repo = new_sqlite_for_test(&path).expect("open sqlite store");
  (repo, path)
}

fn cleanup(path: &str) {
  for suffix in ["", "-wal", "-shm"] {
    let _ = std::fs::remove_file(format!("{}{}", path, suffix));
  }
}

#[test]
fn seeded_store_serves_the_views() {
  let (repo, path) = setup_repo();
  let seeded = DomainStubs::seed(&repo).expect("seed");
  let clock = Arc::new(ManualClock::new(NaiveDate::from_ymd_opt(2030, 1, 1).unwrap().and_hms_opt(0, 0, 0).unwrap()));
  let service = BookingService::new(Arc::new(repo), clock.clone());

  let areas = service.group_venues_by_location().unwrap();
  assert_eq!(areas.len(), 2);
  assert_eq!((areas[0].city.as_str(), areas[0].state.as_str()), ("San Francisco", "CA"));
  assert_eq!(areas[0].venues.len(), 2);
  assert_eq!(areas[0].venues[1].num_upcoming_shows, 3);

  let park = service.venue_detail(seeded.venues[2]).unwrap();
  assert_eq!(park.past_shows_count, 1);
  assert_eq!(park.upcoming_shows_count, 3);
  assert_eq!(park.upcoming_shows[0].artist_name, "The Wild Sax Band");
  assert_eq!(park.fields.genres.as_slice().len(), 4);

  let sax = service.artist_detail(seeded.artists[2]).unwrap();
  assert_eq!(sax.upcoming_shows_count, 3);
  assert!(sax.past_shows.is_empty());

  // Move past every seeded show.
  clock.advance(Duration::days(365 * 10));
  let park = service.venue_detail(seeded.venues[2]).unwrap();
  assert_eq!(park.past_shows_count, 4);
  assert_eq!(park.upcoming_shows_count, 0);

  assert_eq!(service.search_artists("band").unwrap().count, 1);
  assert_eq!(service.list_shows().unwrap().len(), 5);
  cleanup(&path);
}

#[test]
fn form_submission_creates_and_edits_a_venue() {
  let (repo, path) = setup_repo();
  let service = BookingService::new(Arc::new(repo), Arc::new(ManualClock::new(chrono::Local::now().naive_local())));
  let form = FormData::from_pairs(vec![("name", "The Musical Hop"),
                                       ("city", "San Francisco"),
                                       ("state", "CA"),
                                       ("phone", "123-123-1234"),
                                       ("genres", "Jazz"),
                                       ("genres", "Swing"),
                                       ("seeking_talent", "y")]);
  let id = service.create_venue(VenueFields::from_form(&form).unwrap()).unwrap();
  let mut edited = service.venue_form(id).unwrap();
  assert_eq!(edited.genres.as_slice(), &["Jazz".to_string(), "Swing".to_string()]);
  edited.city = "Oakland".into();
  let saved = service.update_venue(id, edited.into()).unwrap();
  assert_eq!(saved.city, "Oakland");
  assert!(matches!(service.delete_venue(id + 1), Err(DomainError::NotFound(_))));
  service.delete_venue(id).unwrap();
  assert!(service.group_venues_by_location().unwrap().is_empty());
  cleanup(&path);
}

#[test]
fn concurrent_writers_all_succeed() {
  let (repo, path) = setup_repo();
  let repo = Arc::new(repo);
  let venue_id = repo.create_venue(VenueFields::new("Park Square", "San Francisco", "CA", "415")).unwrap();
  let artist_id = repo.create_artist(fyyur_domain::ArtistFields::new("The Wild Sax Band", "San Francisco", "CA", "432"))
                      .unwrap();
  let start = NaiveDate::from_ymd_opt(2035, 4, 1).unwrap().and_hms_opt(20, 0, 0).unwrap();

  let handles: Vec<_> = (0..4).map(|worker| {
                                let repo = Arc::clone(&repo);
                                thread::spawn(move || {
                                  for i in 0..5 {
                                    let when = start + Duration::days(worker * 10 + i);
                                    repo.create_show(ShowFields::new(artist_id, venue_id, when)).expect("create show");
                                  }
                                })
                              })
                              .collect();
  for h in handles {
    h.join().expect("writer thread");
  }

  let shows = repo.list_shows().unwrap();
  assert_eq!(shows.len(), 20);
  let mut ids: Vec<i32> = shows.iter().map(|s| s.id).collect();
  ids.dedup();
  assert_eq!(ids.len(), 20);
  let (_, listings) = repo.venue_with_shows(venue_id).unwrap();
  assert!(listings.windows(2).all(|w| w[0].start_time <= w[1].start_time));
  cleanup(&path);
}
