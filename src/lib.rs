pub mod cli;
pub mod config;
pub mod expansion;
pub mod export;
pub mod fetch;
pub mod input;
pub mod logger;
pub mod model;
pub mod network;
pub mod resolver;
pub mod source;

pub use expansion::{collect, CollectionState, ExpansionSettings};
pub use model::{Firm, Relationship};
pub use source::{DataSource, RefinitivClient};
