pub mod feed;
pub mod monitor;
pub mod snapshot;
