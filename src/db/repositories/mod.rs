pub mod label;
pub mod recipe;
pub mod token;
pub mod user;
