// codec.rs
//
// Genres are stored as a single text column using the `{a,b,c}` layout.
// The domain never sees this encoding.
use fyyur_domain::{DomainError, Genres, Result};

/// Encodes genres as `{a,b,c}`. An empty list becomes `{}`.
pub fn encode_genres(genres: &Genres) -> String {
  let joined: Vec<&str> = genres.iter().map(String::as_str).collect();
  format!("{{{}}}", joined.join(","))
}

/// Decodes the `{a,b,c}` layout back into `Genres`.
///
/// Surrounding braces are optional and blank segments are skipped. Entries
/// are taken verbatim apart from trimming, so quotes survive the round trip.
pub fn decode_genres(raw: &str) -> Result<Genres> {
  let inner = raw.trim();
  let inner = inner.strip_prefix('{').unwrap_or(inner);
  let inner = inner.strip_suffix('}').unwrap_or(inner);
  let items = inner.split(',')
                   .map(str::trim)
                   .filter(|s| !s.is_empty());
  Genres::new(items).map_err(|e| DomainError::ExternalError(format!("stored genres '{}' are corrupt: {}", raw, e)))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn encodes_braced_list() -> Result<()> {
    let genres = Genres::new(["Jazz", "Reggae", "Swing"])?;
    assert_eq!(encode_genres(&genres), "{Jazz,Reggae,Swing}");
    assert_eq!(encode_genres(&Genres::empty()), "{}");
    Ok(())
  }

  #[test]
  fn decodes_what_it_encodes() -> Result<()> {
    let genres = Genres::new(["Rock n Roll", "R&B", "Hip-Hop"])?;
    assert_eq!(decode_genres(&encode_genres(&genres))?, genres);
    assert!(decode_genres("{}")?.is_empty());
    Ok(())
  }

  #[test]
  fn quoted_entries_are_kept_verbatim() -> Result<()> {
    let genres = Genres::new(["\"Indie\"", "Jazz", "\""])?;
    assert_eq!(encode_genres(&genres), "{\"Indie\",Jazz,\"}");
    assert_eq!(decode_genres(&encode_genres(&genres))?, genres);
    Ok(())
  }

  #[test]
  fn decodes_without_braces_or_blanks() -> Result<()> {
    assert_eq!(decode_genres("Jazz, Folk")?.len(), 2);
    assert!(decode_genres("")?.is_empty());
    Ok(())
  }
}
