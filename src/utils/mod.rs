/// Utility modules
pub mod polling;
