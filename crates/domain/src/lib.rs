#![warn(clippy::pedantic)]
#![allow(clippy::missing_errors_doc)]

mod document_store;
mod error;
mod exercise_weights;
mod program;
mod service;
mod session;
mod settings;
mod spreadsheet;
mod statistics;
mod sync;
mod user;
mod workout;

pub use document_store::*;
pub use error::*;
pub use exercise_weights::*;
pub use program::*;
pub use service::*;
pub use session::*;
pub use settings::*;
pub use spreadsheet::*;
pub use statistics::*;
pub use sync::{SyncReport, SyncService};
pub use user::*;
pub use workout::*;
