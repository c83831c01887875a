// errors.rs
use std::fmt;
use thiserror::Error;

/// Tipo de registro del directorio. Se usa en mensajes de error y logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKind {
  Venue,
  Artist,
  Show,
}

impl fmt::Display for RecordKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let s = match self {
      RecordKind::Venue => "venue",
      RecordKind::Artist => "artist",
      RecordKind::Show => "show",
    };
    f.write_str(s)
  }
}

/// Errores del dominio de reservas.
///
/// - `ValidationError`: entrada mal formada o campo requerido ausente.
/// - `ConstraintError`: clave foránea inválida o borrado bloqueado por shows.
/// - `NotFound`: el id no existe en el almacenamiento.
/// - `ExternalError`: fallo del almacenamiento (pool, conexión, migraciones).
/// - `SerializationError`: fallo al serializar un modelo de vista.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
  #[error("Error de validación: {0}")]
  ValidationError(String),
  #[error("Violación de restricción: {0}")]
  ConstraintError(String),
  #[error("No encontrado: {0}")]
  NotFound(String),
  #[error("Error externo: {0}")]
  ExternalError(String),
  #[error("Error de serialización: {0}")]
  SerializationError(String),
}

impl DomainError {
  pub fn not_found(kind: RecordKind, id: i32) -> Self {
    Self::NotFound(format!("{} {}", kind, id))
  }

  pub fn is_not_found(&self) -> bool {
    matches!(self, Self::NotFound(_))
  }
}

impl From<serde_json::Error> for DomainError {
  fn from(e: serde_json::Error) -> Self {
    Self::SerializationError(e.to_string())
  }
}

/// Alias de resultado usado por las APIs del crate.
pub type Result<T> = std::result::Result<T, DomainError>;

/// Un campo de texto requerido no puede estar vacío ni ser sólo espacios.
pub(crate) fn require_text(field: &str, value: &str) -> Result<()> {
  if value.trim().is_empty() {
    return Err(DomainError::ValidationError(format!("el campo '{}' es obligatorio", field)));
  }
  Ok(())
}
