mod id;
pub use id::{ChannelId, LocalId, MessageKey, ServerId, UserId};

mod sender;
pub use sender::{Role, Sender};

mod remote;
pub use remote::{NewMessage, RemoteMessage};

mod local;
pub use local::Message;
