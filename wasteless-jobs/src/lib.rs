pub mod scheduler;
pub mod sweep;

pub use sweep::{SweepReport, Sweeper};
