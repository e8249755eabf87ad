pub mod delivery_request;
pub mod dispatch_problem;
pub mod location;
pub mod time_window;
pub mod vehicle;
