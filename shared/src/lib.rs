pub mod api;
pub mod csrf;
pub mod dashboard;
pub mod error;
pub mod geo;
pub mod notify;
pub mod prediction;
pub mod progress;
pub mod refresh;
pub mod report;

pub use error::{ApiError, RequestError};
pub use geo::{Feature, Geometry, HANOI_BOUNDS, HANOI_CENTER, LatLng};
pub use notify::{Notification, NotificationLevel, NotificationQueue};
pub use prediction::{PredictionContext, PredictionSession};
pub use progress::ProgressTimer;
