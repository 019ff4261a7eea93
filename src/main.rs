use std::sync::Arc;

use anyhow::Context as _;
use tokio::io::{AsyncBufReadExt as _, BufReader};

use classchat::{
    input::Input,
    sync::{ChatView, Event},
    Config, HttpGateway, Message,
};

fn print_message(msg: &Message) {
    let time = msg.created_at.time();
    println!(
        "[{:02}:{:02}] {} <{}> {}",
        time.hour(),
        time.minute(),
        msg.key,
        msg.sender.name,
        msg.body
    );
}

fn print_tail(view: &ChatView, count: usize) {
    let messages = view.messages();
    for msg in &messages[messages.len().saturating_sub(count)..] {
        print_message(msg)
    }
}

fn report(view: &ChatView, event: Event) {
    match event {
        Event::Appended { count } => print_tail(view, count),
        Event::Confirmed { local, id } => log::debug!("{local} is now {id}"),
        Event::SendFailed { local, error } => {
            println!("!! could not send {local}: {}", error.reason())
        }
        Event::RolledBack { local } => println!("!! {local} was removed"),
        Event::PollFailed { error } => log::warn!("refresh failed: {error}"),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    simple_env_load::load_env_from([".dev.env", ".secrets.env"]);
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Config::load(Config::FILE)?;
    config.client.validate().context("invalid client configuration")?;

    let gateway = HttpGateway::create(&config.client)?;
    log::info!("connecting to {}", gateway.base_url());

    let user = config.client.user.clone();
    let mut view = ChatView::open(
        config.client.channel,
        Arc::new(gateway),
        config.sync.clone(),
        (),
    );

    match view.load_initial().await {
        Ok(messages) => messages.iter().for_each(print_message),
        Err(err) => log::error!("cannot load class {}: {err}", view.channel()),
    }
    view.start_polling();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = tokio::select! {
            line = lines.next_line() => line?,
            Some(event) = view.next_event() => {
                report(&view, event);
                continue;
            }
        };

        let Some(line) = line else { break };
        match Input::parse(line.trim_end()) {
            Input::Send { data } => {
                if data.trim().is_empty() {
                    continue;
                }
                if let Err(err) = view.send(data, user.clone()) {
                    println!("!! {err}")
                }
            }
            Input::Edit { id, body } => match view.edit(id, body).await {
                Ok(()) => println!("edited {id}"),
                Err(err) => println!("!! {err}"),
            },
            Input::Delete { id } => match view.delete(id).await {
                Ok(()) => println!("deleted {id}"),
                Err(err) => println!("!! {err}"),
            },
            Input::List => view.messages().iter().for_each(print_message),
            Input::Refresh => match view.poll_delta().await {
                Ok(count) => print_tail(&view, count),
                Err(err) => println!("!! {err}"),
            },
            Input::Quit => break,
            Input::Usage { message, .. } => println!("{message}"),
            Input::Unknown { data } => println!("unknown command: {data}"),
        }
    }

    view.close();
    Ok(())
}
