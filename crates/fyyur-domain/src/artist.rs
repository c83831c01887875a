// artist.rs
use crate::errors::{require_text, Result};
use crate::Genres;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Campos mutables de un artista.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtistFields {
  pub name: String,
  pub city: String,
  pub state: String,
  pub phone: String,
  #[serde(default)]
  pub genres: Genres,
  pub facebook_link: Option<String>,
  pub image_link: Option<String>,
  pub website: Option<String>,
  #[serde(default)]
  pub seeking_venue: bool,
  pub description: Option<String>,
}

impl ArtistFields {
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
pub struct Artist {
  pub id: i32,
  #[serde(flatten)]
  pub fields: ArtistFields,
}

impl Artist {
  pub fn new(id: i32, fields: ArtistFields) -> Self {
    Self { id, fields }
  }

  pub fn name(&self) -> &str {
    &self.fields.name
  }
}

impl fmt::Display for Artist {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "Artist({}: {}, {}, {})", self.id, self.fields.name, self.fields.city, self.fields.state)
  }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArtistPatch {
  pub name: Option<String>,
  pub city: Option<String>,
  pub state: Option<String>,
  pub phone: Option<String>,
  pub genres: Option<Genres>,
  pub facebook_link: Option<Option<String>>,
  pub image_link: Option<Option<String>>,
  pub website: Option<Option<String>>,
  pub seeking_venue: Option<bool>,
  pub description: Option<Option<String>>,
}

impl ArtistPatch {
  pub fn name(name: impl Into<String>) -> Self {
    Self { name: Some(name.into()), ..Default::default() }
  }

  pub fn is_empty(&self) -> bool {
    self == &Self::default()
  }

  pub fn apply_to(self, current: &ArtistFields) -> Result<ArtistFields> {
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
    if let Some(v) = self.seeking_venue {
      next.seeking_venue = v;
    }
    if let Some(v) = self.description {
      next.description = v;
    }
    next.validate()?;
    Ok(next)
  }
}

impl From<ArtistFields> for ArtistPatch {
  fn from(f: ArtistFields) -> Self {
    Self { name: Some(f.name),
           city: Some(f.city),
           state: Some(f.state),
           phone: Some(f.phone),
           genres: Some(f.genres),
           facebook_link: Some(f.facebook_link),
           image_link: Some(f.image_link),
           website: Some(f.website),
           seeking_venue: Some(f.seeking_venue),
           description: Some(f.description) }
  }
}
