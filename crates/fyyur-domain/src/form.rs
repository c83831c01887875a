// form.rs
//
// Lectura de los campos enviados por un formulario HTML y conversión a los
// tipos del dominio. Esta capa sólo parsea y valida; nunca toca el
// almacenamiento.
use crate::errors::{DomainError, Result};
use crate::{ArtistFields, Genres, ShowFields, VenueFields};
use chrono::NaiveDateTime;

const DATETIME_FORMATS: [&str; 4] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M"];

/// Multimapa ordenado campo -> valores, tal como llega de un POST.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormData {
  pairs: Vec<(String, String)>,
}

impl FormData {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where I: IntoIterator<Item = (K, V)>,
          K: Into<String>,
          V: Into<String>
  {
    Self { pairs: pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect() }
  }

  pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
    self.pairs.push((key.into(), value.into()));
    self
  }

  /// Primer valor del campo.
  pub fn get(&self, key: &str) -> Option<&str> {
    self.pairs.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
  }

  pub fn get_all(&self, key: &str) -> Vec<&str> {
    self.pairs.iter().filter(|(k, _)| k == key).map(|(_, v)| v.as_str()).collect()
  }

  fn required(&self, key: &str) -> Result<String> {
    match self.get(key).map(str::trim) {
      Some(v) if !v.is_empty() => Ok(v.to_string()),
      _ => Err(DomainError::ValidationError(format!("el campo '{}' es obligatorio", key))),
    }
  }

  /// Un campo opcional en blanco se considera ausente.
  fn optional(&self, key: &str) -> Option<String> {
    self.get(key).map(str::trim).filter(|v| !v.is_empty()).map(str::to_string)
  }

  fn flag(&self, key: &str) -> Result<bool> {
    match self.get(key).map(|v| v.trim().to_lowercase()) {
      None => Ok(false),
      Some(v) => match v.as_str() {
        "y" | "yes" | "true" | "on" | "1" => Ok(true),
        "" | "n" | "no" | "false" | "off" | "0" => Ok(false),
        _ => Err(DomainError::ValidationError(format!("valor booleano inválido para '{}': {}", key, v))),
      },
    }
  }

  fn genres(&self) -> Result<Genres> {
    Genres::new(self.get_all("genres").into_iter().filter(|g| !g.trim().is_empty()))
  }

  fn id(&self, key: &str) -> Result<i32> {
    let raw = self.required(key)?;
    raw.parse::<i32>()
       .map_err(|_| DomainError::ValidationError(format!("'{}' no es un id válido para '{}'", raw, key)))
  }
}

/// Acepta `YYYY-MM-DD HH:MM[:SS]`, con espacio o `T` como separador.
pub fn parse_datetime(value: &str) -> Result<NaiveDateTime> {
  let value = value.trim();
  DATETIME_FORMATS.iter()
                  .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
                  .ok_or_else(|| DomainError::ValidationError(format!("fecha inválida: '{}'", value)))
}

impl VenueFields {
  pub fn from_form(form: &FormData) -> Result<Self> {
    let fields = Self { name: form.required("name")?,
                        city: form.required("city")?,
                        state: form.required("state")?,
                        address: form.optional("address"),
                        phone: form.required("phone")?,
                        genres: form.genres()?,
                        facebook_link: form.optional("facebook_link"),
                        image_link: form.optional("image_link"),
                        website: form.optional("website"),
                        seeking_talent: form.flag("seeking_talent")?,
                        description: form.optional("description") };
    fields.validate()?;
    Ok(fields)
  }
}

impl ArtistFields {
  pub fn from_form(form: &FormData) -> Result<Self> {
    let fields = Self { name: form.required("name")?,
                        city: form.required("city")?,
                        state: form.required("state")?,
                        phone: form.required("phone")?,
                        genres: form.genres()?,
                        facebook_link: form.optional("facebook_link"),
                        image_link: form.optional("image_link"),
                        website: form.optional("website"),
                        seeking_venue: form.flag("seeking_venue")?,
                        description: form.optional("description") };
    fields.validate()?;
    Ok(fields)
  }
}

impl ShowFields {
  pub fn from_form(form: &FormData) -> Result<Self> {
    let start_time = parse_datetime(&form.required("start_time")?)?;
    let fields = Self { artist_id: form.id("artist_id")?, venue_id: form.id("venue_id")?, start_time };
    fields.validate()?;
    Ok(fields)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn venue_form() -> FormData {
    FormData::from_pairs(vec![("name", "The Musical Hop"),
                              ("city", "San Francisco"),
                              ("state", "CA"),
                              ("address", "1015 Folsom Street"),
                              ("phone", "123-123-1234"),
                              ("genres", "Jazz"),
                              ("genres", "Reggae"),
                              ("facebook_link", ""),
                              ("seeking_talent", "y")])
  }

  #[test]
  fn parses_venue_form() -> Result<()> {
    let fields = VenueFields::from_form(&venue_form())?;
    assert_eq!(fields.name, "The Musical Hop");
    assert_eq!(fields.genres.as_slice(), &["Jazz".to_string(), "Reggae".to_string()]);
    assert_eq!(fields.facebook_link, None);
    assert_eq!(fields.website, None);
    assert!(fields.seeking_talent);
    Ok(())
  }

  #[test]
  fn missing_required_field_is_validation_error() {
    let form = FormData::from_pairs(venue_form().pairs.into_iter().filter(|(k, _)| k != "phone"));
    match VenueFields::from_form(&form) {
      Err(DomainError::ValidationError(msg)) => assert!(msg.contains("phone")),
      other => panic!("expected validation error, got {:?}", other),
    }
  }

  #[test]
  fn bad_boolean_is_rejected() {
    let form = FormData::from_pairs(vec![("name", "Guns N Petals"),
                                         ("city", "San Francisco"),
                                         ("state", "CA"),
                                         ("phone", "326-123-5000"),
                                         ("seeking_venue", "maybe")]);
    assert!(matches!(ArtistFields::from_form(&form), Err(DomainError::ValidationError(_))));
  }

  #[test]
  fn parses_show_form() -> Result<()> {
    let form = FormData::from_pairs(vec![("artist_id", "4"), ("venue_id", "1"), ("start_time", "2035-04-01T20:00")]);
    let show = ShowFields::from_form(&form)?;
    assert_eq!(show.artist_id, 4);
    assert_eq!(show.venue_id, 1);
    assert_eq!(show.start_time.to_string(), "2035-04-01 20:00:00");
    Ok(())
  }

  #[test]
  fn malformed_show_fields() {
    let bad_id = FormData::from_pairs(vec![("artist_id", "four"), ("venue_id", "1"), ("start_time", "2035-04-01 20:00")]);
    assert!(matches!(ShowFields::from_form(&bad_id), Err(DomainError::ValidationError(_))));
    let bad_time = FormData::from_pairs(vec![("artist_id", "4"), ("venue_id", "1"), ("start_time", "01/04/2035")]);
    assert!(matches!(ShowFields::from_form(&bad_time), Err(DomainError::ValidationError(_))));
  }
}
