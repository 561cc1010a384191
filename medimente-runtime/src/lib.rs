pub mod config_store;
pub mod defaults;
pub mod files;
pub mod gateway;
pub mod output;
pub mod runtime_engine;
pub mod secrets;
