mod msg_client_to_server;
mod msg_coordinator;
mod msg_server_to_client;

pub use self::msg_client_to_server::*;
pub use self::msg_coordinator::*;
pub use self::msg_server_to_client::*;
