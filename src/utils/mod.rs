pub mod logger;
pub mod paths;
