// Doubly-constrained gravity model: distances, balancing, calibration
mod calibrate;
mod distance;
mod model;

pub use calibrate::calibrate_doubly_constrained;
pub use distance::{DistanceMatrix, distance_matrix_from_points};
pub use model::{BalanceObserver, GravityOutcome, LogObserver, doubly_constrained};
