mod error;
pub use error::SyncError;

mod event;
pub(crate) use event::Completion;
pub use event::Event;

mod ticker;
pub use ticker::Ticker;

mod timeline;
pub use timeline::Timeline;

mod view;
pub use view::ChatView;

pub use crate::config::SyncConfig;
