#![allow(dead_code)]

use std::sync::{
    atomic::{AtomicBool, AtomicUsize, Ordering},
    Arc,
};

use time::OffsetDateTime;
use tokio::sync::Notify;

use classchat::{
    gateway::{Gateway, GatewayError, LocalGateway},
    message::{ChannelId, NewMessage, RemoteMessage, Role, Sender, ServerId, UserId},
    sync::SyncConfig,
    ChatView,
};

pub const CLASS: ChannelId = ChannelId(7);

pub fn ada() -> Sender {
    Sender {
        id: UserId(1),
        name: "ada".into(),
        avatar: None,
        role: Role::Student,
    }
}

pub fn lin() -> Sender {
    Sender {
        id: UserId(2),
        name: "lin".into(),
        avatar: Some("avatars/2.png".into()),
        role: Role::Lecturer,
    }
}

pub fn fast_sync() -> SyncConfig {
    SyncConfig {
        poll_interval_ms: 20,
        rollback_grace_ms: 30,
        initial_limit: 100,
    }
}

pub fn open(gateway: &Arc<Scripted>) -> ChatView {
    ChatView::open(CLASS, gateway.clone(), fast_sync(), ())
}

pub fn confirmed_ids(view: &ChatView) -> Vec<ServerId> {
    view.messages().iter().filter_map(|msg| msg.server_id()).collect()
}

pub fn assert_unique(view: &ChatView) {
    let mut ids = confirmed_ids(view);
    let total = ids.len();
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), total, "duplicate ids in {:?}", confirmed_ids(view));
}

/// A store-backed gateway whose calls can be made to fail or to stall.
pub struct Scripted {
    inner: LocalGateway,

    pub fail_create: AtomicBool,
    pub fail_list: AtomicBool,
    pub fail_update: AtomicBool,

    pub hold_lists: AtomicBool,
    lists_released: Notify,

    pub list_since_calls: AtomicUsize,
}

impl Scripted {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            inner: LocalGateway::in_memory().unwrap(),
            fail_create: AtomicBool::new(false),
            fail_list: AtomicBool::new(false),
            fail_update: AtomicBool::new(false),
            hold_lists: AtomicBool::new(false),
            lists_released: Notify::new(),
            list_since_calls: AtomicUsize::new(0),
        })
    }

    pub fn store(&self) -> &LocalGateway {
        &self.inner
    }

    pub fn set(flag: &AtomicBool, value: bool) {
        flag.store(value, Ordering::SeqCst)
    }

    /// Stores a message as if another client had sent it.
    pub async fn post(&self, body: &str, sender: Sender) -> RemoteMessage {
        self.store()
            .create(NewMessage {
                channel: CLASS,
                body: body.into(),
                sender,
            })
            .await
            .unwrap()
    }

    pub fn seed(&self, body: &str, created_at: OffsetDateTime) -> RemoteMessage {
        let msg = NewMessage {
            channel: CLASS,
            body: body.into(),
            sender: lin(),
        };
        self.store().seed(&msg, created_at).unwrap()
    }

    pub fn release_lists(&self) {
        self.hold_lists.store(false, Ordering::SeqCst);
        self.lists_released.notify_one();
    }

    fn check(flag: &AtomicBool, what: &str) -> Result<(), GatewayError> {
        match flag.load(Ordering::SeqCst) {
            true => Err(GatewayError::Status {
                status: 503,
                reason: format!("{what} is unavailable"),
            }),
            false => Ok(()),
        }
    }
}

#[async_trait::async_trait]
impl Gateway for Scripted {
    async fn list_recent(
        &self,
        channel: ChannelId,
        limit: usize,
    ) -> Result<Vec<RemoteMessage>, GatewayError> {
        Self::check(&self.fail_list, "listing")?;
        self.store().list_recent(channel, limit).await
    }

    async fn list_since(
        &self,
        channel: ChannelId,
        since: OffsetDateTime,
    ) -> Result<Vec<RemoteMessage>, GatewayError> {
        self.list_since_calls.fetch_add(1, Ordering::SeqCst);
        if self.hold_lists.load(Ordering::SeqCst) {
            self.lists_released.notified().await;
        }
        Self::check(&self.fail_list, "listing")?;
        self.store().list_since(channel, since).await
    }

    async fn create(&self, message: NewMessage) -> Result<RemoteMessage, GatewayError> {
        Self::check(&self.fail_create, "sending")?;
        self.store().create(message).await
    }

    async fn update(&self, id: ServerId, body: String) -> Result<(), GatewayError> {
        Self::check(&self.fail_update, "editing")?;
        self.store().update(id, body).await
    }

    async fn delete(&self, id: ServerId) -> Result<(), GatewayError> {
        self.store().delete(id).await
    }
}
