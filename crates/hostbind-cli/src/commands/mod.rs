pub mod cache;
pub mod config;
pub mod docs;
pub mod inspect;
