// views.rs
//
// Modelos de vista que la capa de presentación recibe ya armados. Todos se
// serializan con serde; `to_context` los convierte en JSON para las
// plantillas.
use crate::errors::Result;
use crate::form::parse_datetime;
use crate::{ArtistFields, VenueFields};
use chrono::NaiveDateTime;
use serde::Serialize;

/// Venue dentro de un área, con la cantidad de shows futuros.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VenueSummary {
  pub id: i32,
  pub name: String,
  pub num_upcoming_shows: usize,
}

/// Artista en resultados de búsqueda.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArtistSummary {
  pub id: i32,
  pub name: String,
  pub num_upcoming_shows: usize,
}

/// Entrada del índice de artistas.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArtistListItem {
  pub id: i32,
  pub name: String,
}

/// Venues agrupados por (city, state).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Area {
  pub city: String,
  pub state: String,
  pub venues: Vec<VenueSummary>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchResults<T> {
  pub count: usize,
  pub data: Vec<T>,
}

impl<T> SearchResults<T> {
  pub fn new(data: Vec<T>) -> Self {
    Self { count: data.len(), data }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArtistShowSummary {
  pub artist_id: i32,
  pub artist_name: String,
  pub artist_image_link: Option<String>,
  pub start_time: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VenueShowSummary {
  pub venue_id: i32,
  pub venue_name: String,
  pub venue_image_link: Option<String>,
  pub start_time: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VenueDetail {
  pub id: i32,
  #[serde(flatten)]
  pub fields: VenueFields,
  pub past_shows: Vec<ArtistShowSummary>,
  pub upcoming_shows: Vec<ArtistShowSummary>,
  pub past_shows_count: usize,
  pub upcoming_shows_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArtistDetail {
  pub id: i32,
  #[serde(flatten)]
  pub fields: ArtistFields,
  pub past_shows: Vec<VenueShowSummary>,
  pub upcoming_shows: Vec<VenueShowSummary>,
  pub past_shows_count: usize,
  pub upcoming_shows_count: usize,
}

/// Fila del listado general de shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShowView {
  pub show_id: i32,
  pub venue_id: i32,
  pub venue_name: String,
  pub artist_id: i32,
  pub artist_name: String,
  pub artist_image_link: Option<String>,
  pub start_time: String,
}

/// Serializa un modelo de vista a JSON.
pub fn to_context<T: Serialize>(view: &T) -> Result<serde_json::Value> {
  Ok(serde_json::to_value(view)?)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DateFormat {
  #[default]
  Medium,
  Full,
}

/// Filtro de fecha para plantillas.
///
/// - `Medium`: `Mon 05, 21, 2035 9:30PM`
/// - `Full`: `Monday May, 21, 2035 at 9:30PM`
pub fn format_datetime(value: &NaiveDateTime, format: DateFormat) -> String {
  let pattern = match format {
    DateFormat::Medium => "%a %m, %d, %Y %-I:%M%p",
    DateFormat::Full => "%A %B, %-d, %Y at %-I:%M%p",
  };
  value.format(pattern).to_string()
}

/// Igual que `format_datetime` pero a partir del texto de un formulario.
pub fn format_datetime_str(value: &str, format: DateFormat) -> Result<String> {
  let parsed = parse_datetime(value)?;
  Ok(format_datetime(&parsed, format))
}

#[cfg(test)]
mod tests {
  use super::*;
  use chrono::NaiveDate;

  fn sample() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2035, 5, 21).and_then(|d| d.and_hms_opt(21, 30, 0)).expect("valid datetime")
  }

  #[test]
  fn medium_and_full_formats() {
    assert_eq!(format_datetime(&sample(), DateFormat::Medium), "Mon 05, 21, 2035 9:30PM");
    assert_eq!(format_datetime(&sample(), DateFormat::Full), "Monday May, 21, 2035 at 9:30PM");
  }

  #[test]
  fn format_from_form_text() -> Result<()> {
    assert_eq!(format_datetime_str("2035-05-21 21:30:00", DateFormat::Full)?, "Monday May, 21, 2035 at 9:30PM");
    assert!(format_datetime_str("mañana", DateFormat::Medium).is_err());
    Ok(())
  }

  #[test]
  fn search_results_count_matches_data() -> Result<()> {
    let res = SearchResults::new(vec![ArtistListItem { id: 1, name: "Guns N Petals".into() }]);
    let json = to_context(&res)?;
    assert_eq!(json["count"], 1);
    assert_eq!(json["data"][0]["name"], "Guns N Petals");
    Ok(())
  }
}
