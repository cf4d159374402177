pub mod audit;
pub mod catalog;
pub mod config;
pub mod db;
pub mod error;
pub mod fetch;
pub mod import;
pub mod normalize;
pub mod reconcile;
pub mod utils;
