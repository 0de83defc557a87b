pub mod api;
pub mod calendar;
pub mod models;
pub mod student;

pub use calendar::{Board, BucketDate};
pub use student::StudentNumber;
