pub mod config;
pub mod gateway;
pub mod input;
pub mod message;
pub mod repaint;
pub mod serve;
pub mod store;
pub mod sync;

pub use config::Config;
pub use gateway::{Gateway, GatewayError, HttpGateway, LocalGateway};
pub use message::{ChannelId, LocalId, Message, MessageKey, RemoteMessage, Sender, ServerId};
pub use sync::{ChatView, Event, SyncError};

pub const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));
