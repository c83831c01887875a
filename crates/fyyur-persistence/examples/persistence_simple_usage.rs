use fyyur_domain::{BookingRepository, DomainStubs, DomainError};
use fyyur_persistence::new_from_env;

fn main() -> Result<(), DomainError> {
  // Usa FYYUR_DB_URL (o DATABASE_URL). Para una demo local rápida:
  //   export FYYUR_DB_URL="fyyur-demo.db"
  let repo = new_from_env()?;
  let seeded = DomainStubs::seed(&repo)?;
  println!("seeded venues {:?}, artists {:?}, shows {:?}", seeded.venues, seeded.artists, seeded.shows);

  for listing in repo.list_show_listings()? {
    println!("{}  {} @ {}", listing.formatted_start_time(), listing.artist_name, listing.venue_name);
  }

  // Un venue con shows no se puede borrar.
  match repo.delete_venue(seeded.venues[0]) {
    Err(DomainError::ConstraintError(msg)) => println!("delete rejected: {}", msg),
    other => println!("unexpected: {:?}", other),
  }
  Ok(())
}
