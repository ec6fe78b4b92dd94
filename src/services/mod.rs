pub mod config;
pub mod http;
pub mod logger;
pub mod paginate;
pub mod poll;
pub mod resolve;
