pub mod calendar;
pub mod config;
pub mod time;
pub mod types;
pub mod upload;

// Keep the public surface small and intentional.
pub use calendar::*;
pub use config::*;
pub use time::*;
pub use types::*;
pub use upload::*;
