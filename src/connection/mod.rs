mod connection;
mod state;

pub use connection::Connection;
pub use state::ConnectionState;
