//! Booking lifecycle: claiming, releasing and advancing deliveries, plus the
//! route-consolidation lookup that runs alongside them.

pub mod manager;
pub mod projection;
pub mod request;
pub mod transitions;

pub use manager::{BookingManager, Upload};
pub use projection::{BookingView, NearbyBooking, RouteView, ServiceSummary, UserSummary};
pub use request::{BookingRequest, CoordinateValue, NewBooking};
