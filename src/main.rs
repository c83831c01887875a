mod tracing_setup;

use fyyur_domain::views::{self, DateFormat, ShowView};
use fyyur_domain::{ArtistFields, BookingService, DomainError, DomainStubs, FormData, ShowFields, SystemClock, VenueFields};
use fyyur_persistence::{DieselBookingRepository, StoreConfig};
use std::error::Error;
use std::io::{self, Write};
use std::sync::Arc;

type Service = BookingService<DieselBookingRepository>;

const VENUE_FIELDS: [&str; 10] = ["name",
                                  "city",
                                  "state",
                                  "address",
                                  "phone",
                                  "genres",
                                  "facebook_link",
                                  "image_link",
                                  "website",
                                  "description"];
const ARTIST_FIELDS: [&str; 9] =
  ["name", "city", "state", "phone", "genres", "facebook_link", "image_link", "website", "description"];

/// Menú interactivo sobre el directorio de venues, artistas y shows.
///
/// La base se elige con `FYYUR_DB_URL` (o `DATABASE_URL`); `RUST_LOG`
/// controla el nivel de logs y `--debug` lo baja a `debug`.
fn main() -> Result<(), Box<dyn Error>> {
  dotenvy::dotenv().ok();
  let debug = std::env::args().any(|a| a == "--debug");
  tracing_setup::init_tracing(debug)?;

  let config = StoreConfig::from_env()?;
  let repo = DieselBookingRepository::new(&config)?;
  let service = BookingService::new(Arc::new(repo), Arc::new(SystemClock));
  log::info!("fyyur listo");

  loop {
    println!("\n== Fyyur ==");
    println!(" 1) Venues por ciudad");
    println!(" 2) Ver venue");
    println!(" 3) Buscar venues");
    println!(" 4) Artistas");
    println!(" 5) Ver artista");
    println!(" 6) Buscar artistas");
    println!(" 7) Shows");
    println!(" 8) Buscar shows");
    println!(" 9) Crear venue");
    println!("10) Editar venue");
    println!("11) Crear artista");
    println!("12) Editar artista");
    println!("13) Crear show");
    println!("14) Eliminar venue / artista / show");
    println!("15) Cargar datos de ejemplo");
    println!(" 0) Salir");
    let choice = prompt("Elige una opción: ")?;
    let outcome = match choice.trim() {
      "1" => list_areas(&service),
      "2" => show_venue(&service),
      "3" => search_venues(&service),
      "4" => list_artists(&service),
      "5" => show_artist(&service),
      "6" => search_artists(&service),
      "7" => service.list_shows().map_err(Into::into).map(|shows| print_shows(&shows)),
      "8" => search_shows(&service),
      "9" => create_venue(&service),
      "10" => edit_venue(&service),
      "11" => create_artist(&service),
      "12" => edit_artist(&service),
      "13" => create_show(&service),
      "14" => delete_record(&service),
      "15" => DomainStubs::seed(service.repository().as_ref()).map_err(Into::into).map(|ids| {
                println!("Cargados {} venues, {} artistas y {} shows",
                         ids.venues.len(),
                         ids.artists.len(),
                         ids.shows.len())
              }),
      "0" => {
        println!("Saliendo...");
        break;
      }
      other => {
        println!("Opción inválida: {}", other);
        Ok(())
      }
    };
    if let Err(e) = outcome {
      match e.downcast_ref::<DomainError>() {
        Some(d) if d.is_not_found() => eprintln!("No existe: {}", d),
        _ => eprintln!("Error: {}", e),
      }
    }
  }
  Ok(())
}

fn list_areas(service: &Service) -> Result<(), Box<dyn Error>> {
  let areas = service.group_venues_by_location()?;
  if areas.is_empty() {
    println!("No hay venues registrados");
  }
  for area in areas {
    println!("\n{}, {}", area.city, area.state);
    for v in area.venues {
      println!("  [{}] {} ({} próximos shows)", v.id, v.name, v.num_upcoming_shows);
    }
  }
  Ok(())
}

fn show_venue(service: &Service) -> Result<(), Box<dyn Error>> {
  let id = prompt_id("Venue id: ")?;
  let detail = service.venue_detail(id)?;
  println!("{}", serde_json::to_string_pretty(&views::to_context(&detail)?)?);
  Ok(())
}

fn show_artist(service: &Service) -> Result<(), Box<dyn Error>> {
  let id = prompt_id("Artista id: ")?;
  let detail = service.artist_detail(id)?;
  println!("{}", serde_json::to_string_pretty(&views::to_context(&detail)?)?);
  Ok(())
}

fn search_venues(service: &Service) -> Result<(), Box<dyn Error>> {
  let term = prompt("Buscar: ")?;
  let results = service.search_venues(term.trim())?;
  println!("{} resultado(s)", results.count);
  for v in results.data {
    println!("  [{}] {} ({} próximos shows)", v.id, v.name, v.num_upcoming_shows);
  }
  Ok(())
}

fn list_artists(service: &Service) -> Result<(), Box<dyn Error>> {
  for a in service.list_artists()? {
    println!("  [{}] {}", a.id, a.name);
  }
  Ok(())
}

fn search_artists(service: &Service) -> Result<(), Box<dyn Error>> {
  let term = prompt("Buscar: ")?;
  let results = service.search_artists(term.trim())?;
  println!("{} resultado(s)", results.count);
  for a in results.data {
    println!("  [{}] {} ({} próximos shows)", a.id, a.name, a.num_upcoming_shows);
  }
  Ok(())
}

fn search_shows(service: &Service) -> Result<(), Box<dyn Error>> {
  let term = prompt("Artista o venue: ")?;
  let results = service.search_shows(term.trim())?;
  println!("{} resultado(s)", results.count);
  print_shows(&results.data);
  Ok(())
}

fn print_shows(shows: &[ShowView]) {
  println!("\nSHOW | INICIO                  | ARTISTA                   | VENUE");
  println!("----------------------------------------------------------------------------");
  for s in shows {
    let when = views::format_datetime_str(&s.start_time, DateFormat::Medium).unwrap_or_else(|_| s.start_time.clone());
    println!("{:>4} | {:<23} | {:<25} | {}", s.show_id, when, s.artist_name, s.venue_name);
  }
}

fn create_venue(service: &Service) -> Result<(), Box<dyn Error>> {
  let mut form = prompt_form(&VENUE_FIELDS, &FormData::new())?;
  form.insert("seeking_talent", prompt("¿Busca talento? (y/n): ")?.trim());
  let id = service.create_venue(VenueFields::from_form(&form)?)?;
  println!("Venue creado: {}", id);
  Ok(())
}

fn edit_venue(service: &Service) -> Result<(), Box<dyn Error>> {
  let id = prompt_id("Venue id: ")?;
  let current = service.venue_form(id)?;
  let defaults = FormData::from_pairs(vec![("name", current.name.clone()),
                                           ("city", current.city.clone()),
                                           ("state", current.state.clone()),
                                           ("address", current.address.clone().unwrap_or_default()),
                                           ("phone", current.phone.clone()),
                                           ("genres", current.genres.as_slice().join(", ")),
                                           ("facebook_link", current.facebook_link.clone().unwrap_or_default()),
                                           ("image_link", current.image_link.clone().unwrap_or_default()),
                                           ("website", current.website.clone().unwrap_or_default()),
                                           ("description", current.description.clone().unwrap_or_default())]);
  let mut form = prompt_form(&VENUE_FIELDS, &defaults)?;
  let seeking = prompt_default("¿Busca talento? (y/n)", if current.seeking_talent { "y" } else { "n" })?;
  form.insert("seeking_talent", seeking);
  let saved = service.update_venue(id, VenueFields::from_form(&form)?.into())?;
  println!("Venue {} actualizado", saved.name);
  Ok(())
}

fn create_artist(service: &Service) -> Result<(), Box<dyn Error>> {
  let mut form = prompt_form(&ARTIST_FIELDS, &FormData::new())?;
  form.insert("seeking_venue", prompt("¿Busca venue? (y/n): ")?.trim());
  let id = service.create_artist(ArtistFields::from_form(&form)?)?;
  println!("Artista creado: {}", id);
  Ok(())
}

fn edit_artist(service: &Service) -> Result<(), Box<dyn Error>> {
  let id = prompt_id("Artista id: ")?;
  let current = service.artist_form(id)?;
  let defaults = FormData::from_pairs(vec![("name", current.name.clone()),
                                           ("city", current.city.clone()),
                                           ("state", current.state.clone()),
                                           ("phone", current.phone.clone()),
                                           ("genres", current.genres.as_slice().join(", ")),
                                           ("facebook_link", current.facebook_link.clone().unwrap_or_default()),
                                           ("image_link", current.image_link.clone().unwrap_or_default()),
                                           ("website", current.website.clone().unwrap_or_default()),
                                           ("description", current.description.clone().unwrap_or_default())]);
  let mut form = prompt_form(&ARTIST_FIELDS, &defaults)?;
  let seeking = prompt_default("¿Busca venue? (y/n)", if current.seeking_venue { "y" } else { "n" })?;
  form.insert("seeking_venue", seeking);
  let saved = service.update_artist(id, ArtistFields::from_form(&form)?.into())?;
  println!("Artista {} actualizado", saved.name);
  Ok(())
}

fn create_show(service: &Service) -> Result<(), Box<dyn Error>> {
  let mut form = FormData::new();
  form.insert("artist_id", prompt("Artista id: ")?.trim());
  form.insert("venue_id", prompt("Venue id: ")?.trim());
  form.insert("start_time", prompt("Inicio (YYYY-MM-DD HH:MM): ")?.trim());
  let id = service.create_show(ShowFields::from_form(&form)?)?;
  println!("Show creado: {}", id);
  Ok(())
}

fn delete_record(service: &Service) -> Result<(), Box<dyn Error>> {
  let kind = prompt("¿Qué eliminar? (venue/artista/show): ")?;
  let id = prompt_id("Id: ")?;
  let confirm = prompt(&format!("Confirma borrado de {} {}? escribir 'yes' para confirmar: ", kind.trim(), id))?;
  if confirm.trim().to_lowercase() != "yes" {
    println!("Borrado cancelado");
    return Ok(());
  }
  match kind.trim() {
    "venue" => service.delete_venue(id)?,
    "artista" | "artist" => service.delete_artist(id)?,
    "show" => service.delete_show(id)?,
    other => {
      println!("Tipo desconocido: {}", other);
      return Ok(());
    }
  }
  println!("Eliminado");
  Ok(())
}

/// Pide cada campo; enter conserva el valor de `defaults` y `-` lo vacía.
/// Los géneros se escriben separados por comas y se envían como valores
/// repetidos.
fn prompt_form(keys: &[&str], defaults: &FormData) -> io::Result<FormData> {
  let mut form = FormData::new();
  for key in keys {
    let value = prompt_default(key, defaults.get(key).unwrap_or(""))?;
    if *key == "genres" {
      for genre in value.split(',').map(str::trim).filter(|g| !g.is_empty()) {
        form.insert("genres", genre);
      }
    } else {
      form.insert(*key, value);
    }
  }
  Ok(form)
}

fn prompt_default(label: &str, default: &str) -> io::Result<String> {
  let answer = if default.is_empty() {
    prompt(&format!("{}: ", label))?
  } else {
    prompt(&format!("{} [{}]: ", label, default))?
  };
  Ok(match answer.trim() {
    "" => default.to_string(),
    "-" => String::new(),
    other => other.to_string(),
  })
}

fn prompt_id(msg: &str) -> Result<i32, Box<dyn Error>> {
  let raw = prompt(msg)?;
  raw.trim().parse::<i32>().map_err(|_| format!("id inválido: '{}'", raw.trim()).into())
}

fn prompt(msg: &str) -> io::Result<String> {
  print!("{}", msg);
  io::stdout().flush()?;
  let mut s = String::new();
  io::stdin().read_line(&mut s)?;
  Ok(s)
}
