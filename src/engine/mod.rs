pub mod accrual;
pub mod clock;
pub mod format;
pub mod geofence;

pub use accrual::{AccrualEngine, AccrualSnapshot, AttendanceDay, DisplayStatus, EngineError, OfficeHours};
pub use clock::{Clock, LocalClock};
pub use geofence::{GeoPoint, Geofence};
