pub mod locations;
pub mod requests;
