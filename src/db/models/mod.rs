pub mod location;
pub mod requests;
