pub mod backward_pass;
pub mod critical_path;
pub mod forward_pass;

pub use critical_path::CriticalPathCalculator;
