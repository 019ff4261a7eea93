mod connection;
pub use connection::Connection;

mod messages;
pub use messages::Messages;

mod broadcast;
pub use broadcast::{Broadcaster, MessageSent};
