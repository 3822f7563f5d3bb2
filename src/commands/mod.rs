pub mod config;
pub mod ensure;
pub mod inspect;
