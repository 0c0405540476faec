pub mod core;
pub mod models;
pub mod rpc;
pub mod pipeline;
