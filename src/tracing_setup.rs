//! Inicialización de logs para el binario.
//!
//! Las librerías registran con la fachada `log`; el subscriber de
//! `tracing-subscriber` reenvía esos registros (puente `tracing-log`).
//!
//! Variables de entorno:
//!   RUST_LOG   # filtro (por defecto: info)

use std::error::Error;
use tracing_subscriber::EnvFilter;

pub fn init_tracing(debug: bool) -> Result<(), Box<dyn Error>> {
  let default = if debug { "debug" } else { "info" };
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
  tracing_subscriber::fmt().with_env_filter(filter)
                           .with_target(debug)
                           .compact()
                           .try_init()
                           .map_err(|e| e as Box<dyn Error>)
}
