pub mod annealing;
pub mod cost;
pub mod destroy;
pub mod repair;
pub mod solution;
