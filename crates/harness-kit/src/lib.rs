#[macro_use]
extern crate serde_derive;

#[macro_use]
extern crate lazy_static;

pub use indexmap;
pub use serde;
pub use serde_json;

pub mod artifacts;
pub mod config;
pub mod deployments;
pub mod errors;
pub mod network;
