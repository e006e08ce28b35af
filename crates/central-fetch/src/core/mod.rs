//! Pure computations for the fetch core.
//!
//! Nothing here performs I/O or reads a clock; the effectful halves in
//! [`crate::effects`] call into these.

mod backoff;
mod destination;

pub use backoff::backoff_delay;
pub use destination::destination_of;
