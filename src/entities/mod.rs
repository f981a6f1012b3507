pub mod booking;
pub mod category;
pub mod file;
pub mod provider;
pub mod service;
pub mod user;
