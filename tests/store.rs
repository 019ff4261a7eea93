use time::{macros::datetime, Duration, OffsetDateTime};

use classchat::{
    gateway::{Gateway as _, GatewayError, LocalGateway},
    message::{ChannelId, NewMessage, Role, Sender, ServerId, UserId},
    store::{Broadcaster, Connection, MessageSent},
};

const CLASS: ChannelId = ChannelId(3);
const T0: OffsetDateTime = datetime!(2020-09-01 08:00 UTC);

fn grace() -> Sender {
    Sender {
        id: UserId(11),
        name: "grace".into(),
        avatar: Some("avatars/11.png".into()),
        role: Role::Admin,
    }
}

fn new_message(channel: ChannelId, body: &str) -> NewMessage {
    NewMessage {
        channel,
        body: body.into(),
        sender: grace(),
    }
}

#[test]
fn insert_then_read_back() {
    let conn = Connection::in_memory().unwrap();
    let messages = conn.messages();

    let stored = messages
        .insert(&new_message(CLASS, "hello"), T0 + Duration::nanoseconds(1_234_567))
        .unwrap();
    assert_eq!(stored.created_at, T0 + Duration::milliseconds(1));

    let read = messages.get(stored.id).unwrap().unwrap();
    assert_eq!(read, stored);
    assert_eq!(read.user, grace());
    assert!(messages.get(ServerId(stored.id.0 + 1)).unwrap().is_none());
}

#[test]
fn list_recent_is_the_newest_oldest_first() {
    let conn = Connection::in_memory().unwrap();
    let messages = conn.messages();

    let ids = (0..5)
        .map(|i| {
            messages
                .insert(&new_message(CLASS, &format!("#{i}")), T0 + Duration::seconds(i))
                .unwrap()
                .id
        })
        .collect::<Vec<_>>();
    messages
        .insert(&new_message(ChannelId(99), "elsewhere"), T0)
        .unwrap();

    let recent = messages.list_recent(CLASS, 3).unwrap();
    assert_eq!(recent.iter().map(|m| m.id).collect::<Vec<_>>(), &ids[2..]);

    let all = messages.list_recent(CLASS, 100).unwrap();
    assert_eq!(all.len(), 5);
    assert!(all.windows(2).all(|w| w[0].created_at <= w[1].created_at));
}

#[test]
fn list_since_is_strictly_after() {
    let conn = Connection::in_memory().unwrap();
    let messages = conn.messages();

    let first = messages.insert(&new_message(CLASS, "a"), T0).unwrap();
    let second = messages
        .insert(&new_message(CLASS, "b"), T0 + Duration::seconds(1))
        .unwrap();

    let ids = |since| {
        messages
            .list_since(CLASS, since)
            .unwrap()
            .into_iter()
            .map(|m| m.id)
            .collect::<Vec<_>>()
    };

    assert_eq!(ids(T0 - Duration::seconds(1)), [first.id, second.id]);
    assert_eq!(ids(T0), [second.id]);
    assert!(ids(T0 + Duration::seconds(1)).is_empty());

    // a cursor inside a millisecond still sees what was stored at that millisecond
    let later = T0 + Duration::seconds(1) + Duration::microseconds(300);
    let third = messages
        .insert(&new_message(CLASS, "c"), T0 + Duration::seconds(1) + Duration::microseconds(700))
        .unwrap();
    assert!(ids(later).contains(&third.id));
}

#[test]
fn update_and_delete_report_missing_rows() {
    let conn = Connection::in_memory().unwrap();
    let messages = conn.messages();
    let stored = messages.insert(&new_message(CLASS, "typo"), T0).unwrap();

    assert!(messages.update_body(stored.id, "fixed").unwrap());
    assert_eq!(messages.get(stored.id).unwrap().unwrap().body, "fixed");
    assert!(!messages.update_body(ServerId(404), "nope").unwrap());

    assert!(messages.delete(stored.id).unwrap());
    assert!(!messages.delete(stored.id).unwrap());
    assert!(messages.list_recent(CLASS, 10).unwrap().is_empty());
}

#[test]
fn unknown_roles_are_kept_as_unknown() {
    let conn = Connection::in_memory().unwrap();
    let mut msg = new_message(CLASS, "hi");
    msg.sender.role = Role::Unknown;
    let stored = conn.messages().insert(&msg, T0).unwrap();
    assert_eq!(conn.messages().get(stored.id).unwrap().unwrap().user.role, Role::Unknown);
}

#[test]
fn broadcaster_fans_out_per_channel() {
    let broadcaster = Broadcaster::with_capacity(4);
    let stored = Connection::in_memory()
        .unwrap()
        .messages()
        .insert(&new_message(CLASS, "hi"), T0)
        .unwrap();
    let event = MessageSent {
        channel: CLASS,
        message: stored.clone(),
    };

    assert_eq!(broadcaster.publish(event.clone()), 0);

    let mut first = broadcaster.subscribe(CLASS);
    let mut second = broadcaster.subscribe(CLASS);
    let mut other = broadcaster.subscribe(ChannelId(99));
    assert_eq!(broadcaster.publish(event), 2);

    assert_eq!(first.try_recv().unwrap().message, stored);
    assert_eq!(second.try_recv().unwrap().message, stored);
    assert!(other.try_recv().is_err());

    drop((first, second));
    let event = MessageSent {
        channel: CLASS,
        message: stored,
    };
    assert_eq!(broadcaster.publish(event), 0);
}

#[tokio::test]
async fn local_gateway_publishes_what_it_stores() {
    let gateway = LocalGateway::in_memory().unwrap();
    let mut sent = gateway.subscribe(CLASS);

    let stored = gateway.create(new_message(CLASS, "  spaced  ")).await.unwrap();
    let event = sent.recv().await.unwrap();
    assert_eq!(event.channel, CLASS);
    assert_eq!(event.message, stored);

    let seeded = gateway.seed(&new_message(CLASS, "quiet"), T0).unwrap();
    assert!(sent.try_recv().is_err());
    assert_eq!(gateway.get(seeded.id).unwrap().unwrap().body, "quiet");
}

#[tokio::test]
async fn local_gateway_rejects_blank_and_missing() {
    let gateway = LocalGateway::in_memory().unwrap();

    let err = gateway.create(new_message(CLASS, " \t")).await.unwrap_err();
    assert!(matches!(err, GatewayError::Rejected { .. }));

    let stored = gateway.create(new_message(CLASS, "ok")).await.unwrap();
    let err = gateway.update(stored.id, "".into()).await.unwrap_err();
    assert!(matches!(err, GatewayError::Rejected { .. }));

    let err = gateway.update(ServerId(77), "text".into()).await.unwrap_err();
    assert!(matches!(err, GatewayError::NotFound(ServerId(77))));
    let err = gateway.delete(ServerId(77)).await.unwrap_err();
    assert!(matches!(err, GatewayError::NotFound(ServerId(77))));

    gateway.delete(stored.id).await.unwrap();
    assert!(gateway.get(stored.id).unwrap().is_none());
}
