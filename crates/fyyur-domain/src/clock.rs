// clock.rs
use chrono::{Duration, Local, NaiveDateTime};
use std::sync::Mutex;

/// Fuente del instante de evaluación para clasificar shows.
pub trait Clock: Send + Sync {
  fn now(&self) -> NaiveDateTime;
}

/// Hora local del sistema, sin zona horaria (como se guardan los shows).
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
  fn now(&self) -> NaiveDateTime {
    Local::now().naive_local()
  }
}

/// Reloj manual para pruebas: el tiempo sólo avanza cuando se le pide.
#[derive(Debug)]
pub struct ManualClock {
  now: Mutex<NaiveDateTime>,
}

impl ManualClock {
  pub fn new(start: NaiveDateTime) -> Self {
    Self { now: Mutex::new(start) }
  }

  pub fn set(&self, now: NaiveDateTime) {
    *self.now.lock().unwrap_or_else(|e| e.into_inner()) = now;
  }

  pub fn advance(&self, by: Duration) {
    let mut guard = self.now.lock().unwrap_or_else(|e| e.into_inner());
    *guard += by;
  }
}

impl Clock for ManualClock {
  fn now(&self) -> NaiveDateTime {
    *self.now.lock().unwrap_or_else(|e| e.into_inner())
  }
}
