pub mod catalog;
pub mod filter;
pub mod impact;
pub mod map;
