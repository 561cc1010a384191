pub mod controller;
pub mod engine;
pub mod error;
pub mod traits;
