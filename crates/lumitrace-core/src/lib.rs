pub mod error;
pub mod consts;
pub mod frame;
pub mod io;
pub mod correct;
pub mod features;
pub mod cluster;
pub mod blob;
pub mod signal;
pub mod pipeline;
