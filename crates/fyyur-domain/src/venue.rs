// venue.rs
use crate::errors::{require_text, Result};
use crate::Genres;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Campos mutables de un venue (todo excepto el id).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VenueFields {
  pub name: String,
  pub city: String,
  pub state: String,
  pub address: Option<String>,
  pub phone: String,
  #[serde(default)]
  pub genres: Genres,
  pub facebook_link: Option<String>,
  pub image_link: Option<String>,
  pub website: Option<String>,
  #[serde(default)]
  pub seeking_talent: bool,
  pub description: Option<String>,
}

impl VenueFields {
  /// Construye un venue con los campos obligatorios; el resto queda vacío.
  pub fn new(name: impl Into<String>, city: impl Into<String>, state: impl Into<String>, phone: impl Into<String>)
             -> Self {
    Self { name: name.into(), city: city.into(), state: state.into(), phone: phone.into(), ..Default::default() }
  }

  pub fn validate(&self) -> Result<()> {
    require_text("name", &self.name)?;
    require_text("city", &self.city)?;
    require_text("state", &self.state)?;
    require_text("phone", &self.phone)?;
    Ok(())
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Venue {
  pub id: i32,
  #[serde(flatten)]
  pub fields: VenueFields,
}

impl Venue {
  pub fn new(id: i32, fields: VenueFields) -> Self {
    Self { id, fields }
  }

  pub fn name(&self) -> &str {
    &self.fields.name
  }

  /// Clave de agrupación por ubicación: coincidencia exacta de (city, state).
  pub fn location(&self) -> (&str, &str) {
    (&self.fields.city, &self.fields.state)
  }
}

impl fmt::Display for Venue {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "Venue({}: {}, {}, {})", self.id, self.fields.name, self.fields.city, self.fields.state)
  }
}

/// Cambios parciales sobre un venue. `None` deja el campo como está; para
/// los campos opcionales `Some(None)` lo borra.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VenuePatch {
  pub name: Option<String>,
  pub city: Option<String>,
  pub state: Option<String>,
  pub address: Option<Option<String>>,
  pub phone: Option<String>,
  pub genres: Option<Genres>,
  pub facebook_link: Option<Option<String>>,
  pub image_link: Option<Option<String>>,
  pub website: Option<Option<String>>,
  pub seeking_talent: Option<bool>,
  pub description: Option<Option<String>>,
}

impl VenuePatch {
  pub fn name(name: impl Into<String>) -> Self {
    Self { name: Some(name.into()), ..Default::default() }
  }

  pub fn is_empty(&self) -> bool {
    self == &Self::default()
  }

  /// Aplica el patch sobre una copia y valida el resultado.
  pub fn apply_to(self, current: &VenueFields) -> Result<VenueFields> {
    let mut next = current.clone();
    if let Some(v) = self.name {
      next.name = v;
    }
    if let Some(v) = self.city {
      next.city = v;
    }
    if let Some(v) = self.state {
      next.state = v;
    }
    if let Some(v) = self.address {
      next.address = v;
    }
    if let Some(v) = self.phone {
      next.phone = v;
    }
    if let Some(v) = self.genres {
      next.genres = v;
    }
    if let Some(v) = self.facebook_link {
      next.facebook_link = v;
    }
    if let Some(v) = self.image_link {
      next.image_link = v;
    }
    if let Some(v) = self.website {
      next.website = v;
    }
    if let Some(v) = self.seeking_talent {
      next.seeking_talent = v;
    }
    if let Some(v) = self.description {
      next.description = v;
    }
    next.validate()?;
    Ok(next)
  }
}

impl From<VenueFields> for VenuePatch {
  fn from(f: VenueFields) -> Self {
    Self { name: Some(f.name),
           city: Some(f.city),
           state: Some(f.state),
           address: Some(f.address),
           phone: Some(f.phone),
           genres: Some(f.genres),
           facebook_link: Some(f.facebook_link),
           image_link: Some(f.image_link),
           website: Some(f.website),
           seeking_talent: Some(f.seeking_talent),
           description: Some(f.description) }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::DomainError;

  #[test]
  fn required_fields_are_checked() {
    let ok = VenueFields::new("The Musical Hop", "San Francisco", "CA", "123-123-1234");
    assert!(ok.validate().is_ok());
    let missing_phone = VenueFields::new("The Musical Hop", "San Francisco", "CA", "  ");
    match missing_phone.validate() {
      Err(DomainError::ValidationError(msg)) => assert!(msg.contains("phone")),
      other => panic!("expected validation error, got {:?}", other),
    }
  }

  #[test]
  fn patch_only_touches_given_fields() -> Result<()> {
    let mut base = VenueFields::new("The Musical Hop", "San Francisco", "CA", "123-123-1234");
    base.address = Some("1015 Folsom Street".into());
    base.seeking_talent = true;
    let next = VenuePatch::name("The Musical Hop II").apply_to(&base)?;
    assert_eq!(next.name, "The Musical Hop II");
    assert_eq!(next.address, base.address);
    assert!(next.seeking_talent);
    let cleared = VenuePatch { address: Some(None), ..Default::default() }.apply_to(&base)?;
    assert_eq!(cleared.address, None);
    Ok(())
  }

  #[test]
  fn patch_result_is_validated() {
    let base = VenueFields::new("The Musical Hop", "San Francisco", "CA", "123-123-1234");
    let res = VenuePatch { city: Some(String::new()), ..Default::default() }.apply_to(&base);
    assert!(matches!(res, Err(DomainError::ValidationError(_))));
  }
}
