use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use hashbrown::HashSet;
use time::OffsetDateTime;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};

use crate::{
    gateway::Gateway,
    message::{
        ChannelId, LocalId, Message, MessageKey, NewMessage, RemoteMessage, Sender, ServerId,
    },
    repaint::{ErasedRepaint, Repaint},
};

use super::{Completion, Event, SyncConfig, SyncError, Ticker, Timeline};

/// The client side of one open class chat.
///
/// All mutation of the local list happens on the caller's task, either inside
/// an operation or while draining background completions with [`poll`],
/// [`next_event`] or [`settle`]. Background work (create requests, scheduled
/// delta fetches, rollback timers) only ever reports back through a channel
/// that is closed on teardown, so nothing can land in a closed view.
///
/// [`poll`]: Self::poll
/// [`next_event`]: Self::next_event
/// [`settle`]: Self::settle
pub struct ChatView {
    channel: ChannelId,
    gateway: Arc<dyn Gateway>,
    config: SyncConfig,
    timeline: Timeline,
    repaint: ErasedRepaint,

    send: UnboundedSender<Completion>,
    recv: UnboundedReceiver<Completion>,
    ticker: Option<Ticker>,
    tick_epoch: u64,
    tick_queued: Arc<AtomicBool>,

    generation: u64,
    delta_in_flight: bool,
    sending: HashSet<LocalId>,
    expiring: HashSet<LocalId>,
    closed: bool,
}

impl ChatView {
    pub fn open(
        channel: ChannelId,
        gateway: Arc<dyn Gateway>,
        config: SyncConfig,
        repaint: impl Repaint,
    ) -> Self {
        let (send, recv) = unbounded_channel();
        log::info!("opening channel view for class {channel}");

        Self {
            channel,
            gateway,
            config,
            timeline: Timeline::new(),
            repaint: repaint.erased(),

            send,
            recv,
            ticker: None,
            tick_epoch: 0,
            tick_queued: Arc::default(),

            generation: 0,
            delta_in_flight: false,
            sending: HashSet::new(),
            expiring: HashSet::new(),
            closed: false,
        }
    }

    pub const fn channel(&self) -> ChannelId {
        self.channel
    }

    pub fn messages(&self) -> &[Message] {
        self.timeline.messages()
    }

    pub const fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    pub const fn cursor(&self) -> Option<OffsetDateTime> {
        self.timeline.cursor()
    }

    pub const fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn is_polling(&self) -> bool {
        self.ticker.is_some()
    }

    /// Whether any send, scheduled delta or rollback is still outstanding.
    pub fn is_busy(&self) -> bool {
        self.delta_in_flight || !self.sending.is_empty() || !self.expiring.is_empty()
    }

    /// Fetches the most recent messages and replaces the view with them.
    pub async fn load_initial(&mut self) -> Result<&[Message], SyncError> {
        self.ensure_open()?;

        let stamp = OffsetDateTime::now_utc();
        let snapshot = self
            .gateway
            .list_recent(self.channel, self.config.initial_limit)
            .await
            .map_err(|err| {
                log::warn!("cannot load class {}: {err}", self.channel);
                err
            })?;

        // a delta started before this snapshot must not land after it
        self.generation += 1;
        self.timeline.reset(snapshot, stamp);
        log::debug!(
            "loaded {} message(s) for class {}",
            self.timeline.len(),
            self.channel
        );
        Ok(self.timeline.messages())
    }

    /// Fetches what arrived since the cursor and appends the unseen messages.
    ///
    /// Returns how many were appended. The cursor only moves on success.
    pub async fn poll_delta(&mut self) -> Result<usize, SyncError> {
        self.ensure_open()?;

        let stamp = OffsetDateTime::now_utc();
        let delta = self.gateway.list_since(self.channel, self.since()).await?;
        Ok(self.apply_delta(stamp, delta))
    }

    /// Starts fetching deltas every [`SyncConfig::poll_interval`].
    ///
    /// At most one tick waits in the completion queue at a time, however long
    /// the caller goes without draining it.
    pub fn start_polling(&mut self) {
        if self.closed || self.ticker.is_some() {
            return;
        }

        self.tick_epoch += 1;
        self.tick_queued = Arc::default();

        let epoch = self.tick_epoch;
        let queued = Arc::clone(&self.tick_queued);
        let send = self.send.clone();
        let repaint = Arc::clone(&self.repaint);
        let ticker = Ticker::spawn(self.config.poll_interval(), move || {
            if queued.swap(true, Ordering::AcqRel) {
                return true;
            }
            let ok = send.send(Completion::Tick { epoch }).is_ok();
            if ok {
                repaint();
            }
            ok
        });
        self.ticker = Some(ticker);
        log::debug!(
            "polling class {} every {:?}",
            self.channel,
            self.config.poll_interval()
        );
    }

    /// Stops polling. Ticks already queued are discarded when drained.
    pub fn stop_polling(&mut self) {
        if let Some(ticker) = self.ticker.take() {
            ticker.cancel();
            log::debug!("stopped polling class {}", self.channel);
        }
    }

    /// Shows `body` at once as a pending message and sends it in the background.
    ///
    /// The outcome arrives later as [`Event::Confirmed`], or as
    /// [`Event::SendFailed`] followed by [`Event::RolledBack`] once the
    /// rollback grace period has passed.
    pub fn send(&mut self, body: impl Into<String>, sender: Sender) -> Result<LocalId, SyncError> {
        self.ensure_open()?;
        let body = Self::non_empty(body.into())?;

        let local = LocalId::new();
        self.timeline.push_pending(Message::pending(
            local,
            self.channel,
            sender.clone(),
            body.clone(),
        ));
        self.sending.insert(local);

        let new = NewMessage {
            channel: self.channel,
            body,
            sender,
        };

        let gateway = Arc::clone(&self.gateway);
        let send = self.send.clone();
        let repaint = Arc::clone(&self.repaint);
        tokio::spawn(async move {
            let result = gateway.create(new).await;
            if send.send(Completion::Sent { local, result }).is_ok() {
                repaint();
            }
        });

        log::debug!("sending {local} to class {}", self.channel);
        Ok(local)
    }

    /// Changes the body of a confirmed message, locally only once the server agrees.
    pub async fn edit(
        &mut self,
        key: impl Into<MessageKey>,
        body: impl Into<String>,
    ) -> Result<(), SyncError> {
        self.ensure_open()?;
        let id = self.confirmed_id(key.into())?;
        let body = Self::non_empty(body.into())?;

        self.gateway.update(id, body.clone()).await?;
        self.timeline.apply_edit(id, body);
        Ok(())
    }

    /// Deletes a confirmed message, locally only once the server agrees.
    pub async fn delete(&mut self, key: impl Into<MessageKey>) -> Result<(), SyncError> {
        self.ensure_open()?;
        let id = self.confirmed_id(key.into())?;

        self.gateway.delete(id).await?;
        self.timeline.remove(id);
        Ok(())
    }

    /// Applies whatever background work has finished, without waiting.
    pub fn poll(&mut self) -> Option<Event> {
        while !self.closed {
            let completion = self.recv.try_recv().ok()?;
            if let Some(event) = self.apply(completion) {
                return Some(event);
            }
        }
        None
    }

    /// Waits for the next background completion that produces an event.
    pub async fn next_event(&mut self) -> Option<Event> {
        while !self.closed {
            let completion = self.recv.recv().await?;
            if let Some(event) = self.apply(completion) {
                return Some(event);
            }
        }
        None
    }

    /// Waits until no send, delta or rollback is outstanding.
    pub async fn settle(&mut self) -> Vec<Event> {
        let mut events = vec![];
        while !self.closed && self.is_busy() {
            let Some(completion) = self.recv.recv().await else { break };
            events.extend(self.apply(completion));
        }
        events
    }

    /// Tears the view down. Nothing that completes afterwards is applied.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }

        self.closed = true;
        self.stop_polling();
        self.recv.close();
        log::info!("closed channel view for class {}", self.channel);
    }

    fn ensure_open(&self) -> Result<(), SyncError> {
        match self.closed {
            true => Err(SyncError::Closed),
            false => Ok(()),
        }
    }

    fn non_empty(body: String) -> Result<String, SyncError> {
        let trimmed = body.trim();
        if trimmed.is_empty() {
            return Err(SyncError::EmptyBody);
        }

        Ok(match trimmed.len() == body.len() {
            true => body,
            false => trimmed.to_string(),
        })
    }

    fn confirmed_id(&self, key: MessageKey) -> Result<ServerId, SyncError> {
        match key {
            MessageKey::Pending(local) => Err(SyncError::NotConfirmed(local)),
            MessageKey::Confirmed(id) if self.timeline.contains(id) => Ok(id),
            MessageKey::Confirmed(id) => Err(SyncError::UnknownMessage(id)),
        }
    }

    fn since(&self) -> OffsetDateTime {
        self.timeline
            .cursor()
            .unwrap_or(OffsetDateTime::UNIX_EPOCH)
    }

    fn apply_delta(&mut self, stamp: OffsetDateTime, delta: Vec<RemoteMessage>) -> usize {
        let count = self.timeline.merge(delta);
        self.timeline.advance(stamp);
        if count > 0 {
            log::debug!("appended {count} message(s) to class {}", self.channel);
        }
        count
    }

    fn schedule_delta(&mut self) {
        if self.delta_in_flight {
            log::trace!("previous delta for class {} still in flight", self.channel);
            return;
        }
        self.delta_in_flight = true;

        let (channel, since, generation) = (self.channel, self.since(), self.generation);
        let gateway = Arc::clone(&self.gateway);
        let send = self.send.clone();
        let repaint = Arc::clone(&self.repaint);
        tokio::spawn(async move {
            let stamp = OffsetDateTime::now_utc();
            let result = gateway.list_since(channel, since).await;
            let delta = Completion::Delta {
                generation,
                stamp,
                result,
            };
            if send.send(delta).is_ok() {
                repaint();
            }
        });
    }

    fn schedule_rollback(&mut self, local: LocalId) {
        self.expiring.insert(local);

        let grace = self.config.rollback_grace();
        let send = self.send.clone();
        let repaint = Arc::clone(&self.repaint);
        tokio::spawn(async move {
            tokio::time::sleep(grace).await;
            if send.send(Completion::Expired { local }).is_ok() {
                repaint();
            }
        });
    }

    fn apply(&mut self, completion: Completion) -> Option<Event> {
        match completion {
            Completion::Tick { epoch } => {
                if self.ticker.is_none() || epoch != self.tick_epoch {
                    log::trace!("dropping a tick for class {} from a stopped ticker", self.channel);
                    return None;
                }
                self.tick_queued.store(false, Ordering::Release);
                self.schedule_delta();
                None
            }

            Completion::Delta {
                generation,
                stamp,
                result,
            } => {
                self.delta_in_flight = false;
                if generation != self.generation {
                    log::debug!("dropping a delta for class {} from before a reload", self.channel);
                    return None;
                }

                match result {
                    Ok(delta) => {
                        let count = self.apply_delta(stamp, delta);
                        (count > 0).then_some(Event::Appended { count })
                    }
                    Err(error) => {
                        log::warn!("cannot poll class {}: {error}", self.channel);
                        Some(Event::PollFailed { error })
                    }
                }
            }

            Completion::Sent { local, result } => {
                self.sending.remove(&local);
                match result {
                    Ok(remote) => {
                        let id = remote.id;
                        self.timeline.confirm(local, remote);
                        log::debug!("{local} confirmed as {id}");
                        Some(Event::Confirmed { local, id })
                    }
                    Err(error) => {
                        log::warn!("cannot send {local}: {error}");
                        self.timeline.mark_failed(local);
                        self.schedule_rollback(local);
                        Some(Event::SendFailed { local, error })
                    }
                }
            }

            Completion::Expired { local } => {
                self.expiring.remove(&local);
                self.timeline
                    .discard_pending(local)
                    .then_some(Event::RolledBack { local })
            }
        }
    }
}

impl Drop for ChatView {
    fn drop(&mut self) {
        self.close()
    }
}
