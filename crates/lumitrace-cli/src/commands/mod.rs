pub mod config;
pub mod dark;
pub mod detect;
pub mod info;
pub mod pipeline;
pub mod scan;
