use std::{path::Path, time::Duration};

use anyhow::Context as _;

use crate::message::{ChannelId, Sender, UserId};

/// Settings for both binaries, read from `classchat.toml` and the environment.
#[derive(Clone, Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct Config {
    pub client: ClientConfig,
    pub server: ServerConfig,
    pub sync: SyncConfig,
}

#[derive(Clone, Debug, serde::Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub base_url: String,
    pub token: Option<String>,
    pub channel: ChannelId,
    pub user: Sender,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: String::from("http://127.0.0.1:8080/"),
            token: None,
            channel: ChannelId::default(),
            user: Sender::default(),
        }
    }
}

impl ClientConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(!self.base_url.trim().is_empty(), "base_url is empty");
        anyhow::ensure!(self.channel != ChannelId(0), "a class channel must be set");
        anyhow::ensure!(!self.user.name.trim().is_empty(), "a user name must be set");
        Ok(())
    }
}

#[derive(Clone, Debug, serde::Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
    pub database: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: String::from("127.0.0.1:8080"),
            database: String::from("classchat.db"),
        }
    }
}

/// Timing and sizing of a channel view.
#[derive(Clone, Debug, PartialEq, Eq, serde::Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    pub poll_interval_ms: u64,
    pub rollback_grace_ms: u64,
    pub initial_limit: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 5_000,
            rollback_grace_ms: 1_500,
            initial_limit: 100,
        }
    }
}

impl SyncConfig {
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub const fn rollback_grace(&self) -> Duration {
        Duration::from_millis(self.rollback_grace_ms)
    }
}

impl Config {
    pub const FILE: &str = "classchat.toml";

    /// Reads `path` if it exists, then applies the environment overrides.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let mut this = match std::fs::read_to_string(path) {
            Ok(data) => Self::parse(&data).with_context(|| format!("parse {}", path.display()))?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Self::default(),
            Err(err) => return Err(err).with_context(|| format!("read {}", path.display())),
        };

        this.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(this)
    }

    pub fn parse(data: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(data)?)
    }

    fn apply_overrides(&mut self, get: impl Fn(&str) -> Option<String>) -> anyhow::Result<()> {
        macro_rules! parsed {
            ($ty:ty, $key:expr) => {
                get($key)
                    .map(|value| value.parse::<$ty>())
                    .transpose()
                    .with_context(|| format!("invalid value for '{}'", $key))?
            };
        }

        if let Some(base_url) = get("CLASSCHAT_BASE_URL") {
            self.client.base_url = base_url;
        }
        if let Some(token) = get("CLASSCHAT_TOKEN") {
            self.client.token.replace(token);
        }
        if let Some(channel) = parsed!(ChannelId, "CLASSCHAT_CHANNEL") {
            self.client.channel = channel;
        }
        if let Some(id) = parsed!(u64, "CLASSCHAT_USER_ID") {
            self.client.user.id = UserId(id);
        }
        if let Some(name) = get("CLASSCHAT_USER_NAME") {
            self.client.user.name = name;
        }
        if let Some(bind) = get("CLASSCHAT_BIND") {
            self.server.bind = bind;
        }
        if let Some(database) = get("CLASSCHAT_DATABASE") {
            self.server.database = database;
        }
        if let Some(ms) = parsed!(u64, "CLASSCHAT_POLL_INTERVAL_MS") {
            self.sync.poll_interval_ms = ms;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use hashbrown::HashMap;

    use super::*;
    use crate::message::Role;

    #[test]
    fn defaults_without_a_file() {
        let config = Config::parse("").unwrap();
        assert_eq!(config.sync, SyncConfig::default());
        assert_eq!(config.sync.poll_interval(), Duration::from_secs(5));
        assert_eq!(config.sync.initial_limit, 100);
        assert_eq!(config.server.bind, "127.0.0.1:8080");
        assert!(config.client.validate().is_err());
    }

    #[test]
    fn reads_sections() {
        let config = Config::parse(
            r#"
                [client]
                base_url = "https://lms.example.edu/api/"
                channel = 42

                [client.user]
                id = 7
                name = "Ada"
                role = "lecturer"

                [sync]
                poll_interval_ms = 2500
            "#,
        )
        .unwrap();

        assert_eq!(config.client.channel, ChannelId(42));
        assert_eq!(config.client.user.role, Role::Lecturer);
        assert_eq!(config.sync.poll_interval(), Duration::from_millis(2500));
        assert_eq!(config.sync.rollback_grace_ms, 1_500);
        config.client.validate().unwrap();
    }

    #[test]
    fn environment_overrides_the_file() {
        let env: HashMap<&str, &str> = [
            ("CLASSCHAT_CHANNEL", "9"),
            ("CLASSCHAT_USER_NAME", "Lin"),
            ("CLASSCHAT_TOKEN", "secret"),
            ("CLASSCHAT_POLL_INTERVAL_MS", "100"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config
            .apply_overrides(|key| env.get(key).map(|s| s.to_string()))
            .unwrap();

        assert_eq!(config.client.channel, ChannelId(9));
        assert_eq!(config.client.user.name, "Lin");
        assert_eq!(config.client.token.as_deref(), Some("secret"));
        assert_eq!(config.sync.poll_interval_ms, 100);
    }

    #[test]
    fn bad_numbers_are_reported() {
        let mut config = Config::default();
        let err = config
            .apply_overrides(|key| (key == "CLASSCHAT_CHANNEL").then(|| "nine".to_string()))
            .unwrap_err();
        assert!(err.to_string().contains("CLASSCHAT_CHANNEL"));
    }
}
