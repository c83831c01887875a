//! Dominio del directorio de reservas: venues, artistas y shows.
//!
//! Este crate define los registros (`Venue`, `Artist`, `Show`), el contrato
//! de persistencia `BookingRepository` con una implementación en memoria, y
//! `BookingService`, la capa de consultas que arma los modelos de vista
//! (áreas por ciudad, detalle con shows pasados/futuros, búsquedas).
//!
//! Ejemplo rápido:
//! ```rust
//! use fyyur_domain::{BookingService, InMemoryBookingRepository, SystemClock, VenueFields};
//! use std::sync::Arc;
//! let service = BookingService::new(Arc::new(InMemoryBookingRepository::new()), Arc::new(SystemClock));
//! let id = service.create_venue(VenueFields::new("The Musical Hop", "San Francisco", "CA", "123-123-1234")).unwrap();
//! assert_eq!(service.venue_detail(id).unwrap().upcoming_shows_count, 0);
//! ```
mod artist;
mod booking_service;
mod clock;
mod domain_repository;
mod domain_stubs;
mod errors;
mod form;
mod genres;
mod show;
mod venue;
pub mod views;

pub use artist::{Artist, ArtistFields, ArtistPatch};
pub use booking_service::BookingService;
pub use clock::{Clock, ManualClock, SystemClock};
pub use domain_repository::{name_matches, BookingRepository, InMemoryBookingRepository};
pub use domain_stubs::{DomainStubs, SeedIds};
pub use errors::{DomainError, RecordKind, Result};
pub use form::{parse_datetime, FormData};
pub use genres::Genres;
pub use show::{Show, ShowFields, ShowListing, ShowPatch, ShowTiming, START_TIME_FORMAT};
pub use venue::{Venue, VenueFields, VenuePatch};
