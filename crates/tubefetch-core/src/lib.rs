pub mod config;
pub mod logging;

pub mod catalog;
pub mod error;
pub mod fetch;
pub mod job;
pub mod naming;
pub mod prompt;
pub mod resolver;
pub mod selector;
pub mod temp;
pub mod transcoder;
