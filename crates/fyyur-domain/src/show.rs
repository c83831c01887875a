// show.rs
use crate::errors::{DomainError, Result};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Formato con el que se presenta `start_time` en los modelos de vista.
pub const START_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Un show reserva a un artista en un venue en un instante dado.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShowFields {
  pub artist_id: i32,
  pub venue_id: i32,
  pub start_time: NaiveDateTime,
}

impl ShowFields {
  pub fn new(artist_id: i32, venue_id: i32, start_time: NaiveDateTime) -> Self {
    Self { artist_id, venue_id, start_time }
  }

  /// Sólo valida la forma de los ids; la existencia de venue y artista la
  /// comprueba el repositorio (`ConstraintError`).
  pub fn validate(&self) -> Result<()> {
    if self.artist_id <= 0 {
      return Err(DomainError::ValidationError(format!("artist_id inválido: {}", self.artist_id)));
    }
    if self.venue_id <= 0 {
      return Err(DomainError::ValidationError(format!("venue_id inválido: {}", self.venue_id)));
    }
    Ok(())
  }

  pub fn timing(&self, now: NaiveDateTime) -> ShowTiming {
    ShowTiming::classify(self.start_time, now)
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Show {
  pub id: i32,
  #[serde(flatten)]
  pub fields: ShowFields,
}

impl Show {
  pub fn new(id: i32, fields: ShowFields) -> Self {
    Self { id, fields }
  }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShowPatch {
  pub artist_id: Option<i32>,
  pub venue_id: Option<i32>,
  pub start_time: Option<NaiveDateTime>,
}

impl ShowPatch {
  pub fn start_time(start_time: NaiveDateTime) -> Self {
    Self { start_time: Some(start_time), ..Default::default() }
  }

  pub fn apply_to(self, current: &ShowFields) -> Result<ShowFields> {
    let next = ShowFields { artist_id: self.artist_id.unwrap_or(current.artist_id),
                            venue_id: self.venue_id.unwrap_or(current.venue_id),
                            start_time: self.start_time.unwrap_or(current.start_time) };
    next.validate()?;
    Ok(next)
  }
}

impl From<ShowFields> for ShowPatch {
  fn from(f: ShowFields) -> Self {
    Self { artist_id: Some(f.artist_id), venue_id: Some(f.venue_id), start_time: Some(f.start_time) }
  }
}

/// Clasificación de un show respecto al instante de evaluación.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ShowTiming {
  Past,
  Upcoming,
}

impl ShowTiming {
  /// `Upcoming` sólo si `start_time > now`; un show que empieza exactamente
  /// en `now` ya es pasado.
  pub fn classify(start_time: NaiveDateTime, now: NaiveDateTime) -> Self {
    if start_time > now {
      ShowTiming::Upcoming
    } else {
      ShowTiming::Past
    }
  }

  pub fn is_upcoming(self) -> bool {
    self == ShowTiming::Upcoming
  }
}

/// Show unido con los datos de su venue y su artista.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShowListing {
  pub show_id: i32,
  pub start_time: NaiveDateTime,
  pub venue_id: i32,
  pub venue_name: String,
  pub venue_image_link: Option<String>,
  pub artist_id: i32,
  pub artist_name: String,
  pub artist_image_link: Option<String>,
}

impl ShowListing {
  pub fn timing(&self, now: NaiveDateTime) -> ShowTiming {
    ShowTiming::classify(self.start_time, now)
  }

  pub fn formatted_start_time(&self) -> String {
    self.start_time.format(START_TIME_FORMAT).to_string()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use chrono::{Duration, NaiveDate};

  fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2035, 4, 1).and_then(|d| d.and_hms_opt(h, m, s)).expect("valid datetime")
  }

  #[test]
  fn boundary_instant_is_past() {
    let now = at(20, 0, 0);
    assert_eq!(ShowTiming::classify(now, now), ShowTiming::Past);
    assert_eq!(ShowTiming::classify(now + Duration::microseconds(1), now), ShowTiming::Upcoming);
    assert_eq!(ShowTiming::classify(now - Duration::seconds(1), now), ShowTiming::Past);
  }

  #[test]
  fn patch_keeps_unset_fields() -> Result<()> {
    let base = ShowFields::new(4, 1, at(21, 30, 0));
    let moved = ShowPatch::start_time(at(22, 0, 0)).apply_to(&base)?;
    assert_eq!(moved.artist_id, 4);
    assert_eq!(moved.venue_id, 1);
    assert_eq!(moved.start_time, at(22, 0, 0));
    Ok(())
  }

  #[test]
  fn non_positive_ids_are_malformed() {
    let bad = ShowFields::new(0, 1, at(21, 30, 0));
    assert!(matches!(bad.validate(), Err(DomainError::ValidationError(_))));
  }
}
