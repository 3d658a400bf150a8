mod config;
mod connection;
mod error;
mod models;
pub mod store;

pub use config::MongoConfig;
pub use connection::ConnectRetry;
pub use error::MongoDaoError;
pub use store::MongoLeagueStore;
