#![warn(clippy::pedantic)]
#![allow(clippy::missing_errors_doc)]

mod app_storage;
mod config;
#[allow(clippy::module_name_repetitions)]
pub mod local_storage;
mod model;
pub mod rest;
pub mod sheets;

pub use app_storage::AppStorage;
pub use config::Config;

#[cfg(test)]
mod tests {
    pub mod data;
    pub mod mock;
}
