pub mod config;
pub mod error;
pub mod order;
pub mod plot;
pub mod result;
pub mod util;
