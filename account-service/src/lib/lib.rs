pub mod config;
pub mod dispatcher;
pub mod domain;
pub mod inbound;
pub mod outbound;

pub use domain::account;
pub use outbound::repositories;
