//! REST handlers, one module per resource.

pub mod applications;
pub mod bookings;
