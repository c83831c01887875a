// genres.rs
use crate::errors::{DomainError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lista ordenada de géneros musicales de un venue o artista.
///
/// En el dominio los géneros son siempre una secuencia de strings; la
/// codificación como texto delimitado sólo existe en la capa de
/// persistencia. Para que esa codificación sea reversible cada entrada se
/// recorta y no puede quedar vacía ni contener `,`, `{` o `}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct Genres(Vec<String>);

const RESERVED: [char; 3] = [',', '{', '}'];

impl Genres {
  pub fn new<I, S>(items: I) -> Result<Self>
    where I: IntoIterator<Item = S>,
          S: Into<String>
  {
    let mut out = Vec::new();
    for item in items {
      let raw: String = item.into();
      let genre = raw.trim();
      if genre.is_empty() {
        return Err(DomainError::ValidationError("un género no puede estar vacío".to_string()));
      }
      if genre.contains(&RESERVED[..]) {
        return Err(DomainError::ValidationError(format!("género inválido: '{}'", genre)));
      }
      out.push(genre.to_string());
    }
    Ok(Self(out))
  }

  pub fn empty() -> Self {
    Self(Vec::new())
  }

  pub fn as_slice(&self) -> &[String] {
    &self.0
  }

  pub fn iter(&self) -> std::slice::Iter<'_, String> {
    self.0.iter()
  }

  pub fn len(&self) -> usize {
    self.0.len()
  }

  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }
}

impl TryFrom<Vec<String>> for Genres {
  type Error = DomainError;

  fn try_from(items: Vec<String>) -> Result<Self> {
    Self::new(items)
  }
}

impl From<Genres> for Vec<String> {
  fn from(g: Genres) -> Self {
    g.0
  }
}

impl<'a> IntoIterator for &'a Genres {
  type Item = &'a String;
  type IntoIter = std::slice::Iter<'a, String>;

  fn into_iter(self) -> Self::IntoIter {
    self.0.iter()
  }
}

impl fmt::Display for Genres {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0.join(", "))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn trims_and_keeps_order() -> Result<()> {
    let g = Genres::new(vec![" Jazz", "Reggae ", "Swing"])?;
    assert_eq!(g.as_slice(), &["Jazz".to_string(), "Reggae".to_string(), "Swing".to_string()]);
    Ok(())
  }

  #[test]
  fn rejects_reserved_characters_and_blanks() {
    for bad in ["Rock, Roll", "{Jazz", "Folk}", "   "] {
      match Genres::new(vec![bad]) {
        Err(DomainError::ValidationError(_)) => {}
        other => panic!("expected validation error for {:?}, got {:?}", bad, other),
      }
    }
  }

  #[test]
  fn deserialization_validates_entries() {
    let ok: Genres = serde_json::from_str(r#"["Jazz","Folk"]"#).expect("valid genres");
    assert_eq!(ok.len(), 2);
    let bad = serde_json::from_str::<Genres>(r#"["Jazz,Folk"]"#);
    assert!(bad.is_err());
  }
}
