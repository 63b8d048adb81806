#![warn(clippy::pedantic)]
#![allow(clippy::missing_errors_doc)]

pub mod chart;
pub mod log;
pub mod service;
pub mod ticker;
pub mod workout;

pub use service::Service;
pub use ticker::{Browser, Executor, Ticker};
pub use workout::{FinishError, WorkoutController};
