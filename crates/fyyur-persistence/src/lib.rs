//! Persistencia Diesel para el directorio de reservas.
//! Expone el módulo `schema` y el repositorio `DieselBookingRepository`, que
//! implementa `fyyur_domain::BookingRepository` sobre SQLite (por defecto) o
//! Postgres (feature `pg`).

mod codec;
mod config;
mod domain_persistence;
pub mod schema;

pub use codec::{decode_genres, encode_genres};
pub use config::{StoreConfig, DB_URL_VAR, FALLBACK_DB_URL_VAR, POOL_SIZE_VAR};
#[cfg(not(feature = "pg"))]
pub use domain_persistence::new_sqlite_for_test;
pub use domain_persistence::{new_from_env, DieselBookingRepository, MIGRATIONS};
