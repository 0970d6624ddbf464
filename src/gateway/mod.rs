//! Gateway facade and builder

mod builder;
mod service;

pub use builder::{Huginn, HuginnBuilder};
pub use service::Gateway;
