pub mod entities;
pub mod models;
pub mod services;
pub mod store;

#[cfg(test)]
pub mod memory;
