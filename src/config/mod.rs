use std::fmt::{Display, Formatter};
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use url::Url;

pub mod store;

pub use store::{ConfigError, ConfigStore, LoadOutcome, Recovery};

/// Opaque bot identity. Numeric JSON values are accepted and kept as their
/// decimal string form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BotId(String);

impl BotId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for BotId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for BotId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl Serialize for BotId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for BotId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Text(String),
            Number(u64),
        }

        let id = match RawId::deserialize(deserializer)? {
            RawId::Text(text) => text.trim().to_owned(),
            RawId::Number(number) => number.to_string(),
        };
        if id.is_empty() {
            return Err(serde::de::Error::custom("botId must not be empty"));
        }
        Ok(Self(id))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BotConfig {
    pub bot: BotSection,
    #[serde(default)]
    pub connect: ConnectSection,
    pub advanced: AdvancedSection,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BotSection {
    #[serde(default)]
    pub name: String,
    pub bot_id: BotId,
    #[serde(default = "default_message_post_format")]
    pub message_post_format: String,
    #[serde(default)]
    pub report_self_message: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectSection {
    #[serde(default)]
    pub ws: Vec<Url>,
    #[serde(default)]
    pub reverse_ws: Vec<Url>,
    #[serde(default)]
    pub http: Vec<Url>,
    #[serde(default)]
    pub http_post: Vec<HttpPostTarget>,
    #[serde(default = "default_heart_interval")]
    pub heart_interval: u64,
    #[serde(default)]
    pub token: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for ConnectSection {
    fn default() -> Self {
        Self {
            ws: Vec::new(),
            reverse_ws: Vec::new(),
            http: Vec::new(),
            http_post: Vec::new(),
            heart_interval: default_heart_interval(),
            token: String::new(),
            extra: Map::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpPostTarget {
    pub url: Url,
    #[serde(default)]
    pub secret: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdvancedSection {
    /// Directory holding the QQ runtime executable.
    pub runtime_path: PathBuf,
    #[serde(default)]
    pub ffmpeg_path: String,
    #[serde(default)]
    pub debug: bool,
    #[serde(default)]
    pub file_log: bool,
    #[serde(default = "default_true")]
    pub console_log: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl BotConfig {
    /// Reads a single bot record, e.g. an edited draft or a file given to `add`.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read(path).map_err(|error| ConfigError::Read {
            path: path.to_path_buf(),
            error,
        })?;
        serde_json::from_slice(&raw).map_err(|error| ConfigError::Parse {
            path: path.to_path_buf(),
            error,
        })
    }

    pub fn identity(&self) -> &BotId {
        &self.bot.bot_id
    }

    pub fn same_identity(&self, other: &BotConfig) -> bool {
        self.identity() == other.identity()
    }

    pub fn display_name(&self) -> &str {
        if self.bot.name.trim().is_empty() {
            self.bot.bot_id.as_str()
        } else {
            &self.bot.name
        }
    }

    /// Every configured endpoint URL, in section order.
    pub fn endpoints(&self) -> Vec<&Url> {
        self.connect
            .ws
            .iter()
            .chain(self.connect.reverse_ws.iter())
            .chain(self.connect.http.iter())
            .chain(self.connect.http_post.iter().map(|target| &target.url))
            .collect()
    }
}

fn default_message_post_format() -> String {
    "array".to_owned()
}

fn default_heart_interval() -> u64 {
    30_000
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_bot_id_is_normalized_to_string() {
        let config: BotConfig = serde_json::from_str(
            r#"{"bot":{"botId":10001},"advanced":{"runtimePath":"/opt/QQ"}}"#,
        )
        .expect("parse");
        assert_eq!(config.identity().as_str(), "10001");
        let rendered = serde_json::to_value(&config).expect("encode");
        assert_eq!(rendered["bot"]["botId"], Value::String("10001".to_owned()));
    }

    #[test]
    fn empty_bot_id_is_rejected() {
        let parsed = serde_json::from_str::<BotConfig>(
            r#"{"bot":{"botId":"  "},"advanced":{"runtimePath":"/opt/QQ"}}"#,
        );
        assert!(parsed.is_err());
    }

    #[test]
    fn urls_serialize_as_plain_strings() {
        let config: BotConfig = serde_json::from_str(
            r#"{"bot":{"botId":"1"},"connect":{"ws":["ws://127.0.0.1:3001"],"httpPost":[{"url":"http://127.0.0.1:8080"}]},"advanced":{"runtimePath":"/opt/QQ"}}"#,
        )
        .expect("parse");
        let rendered = serde_json::to_value(&config).expect("encode");
        assert_eq!(
            rendered["connect"]["ws"][0],
            Value::String("ws://127.0.0.1:3001/".to_owned())
        );
        assert_eq!(
            rendered["connect"]["httpPost"][0]["url"],
            Value::String("http://127.0.0.1:8080/".to_owned())
        );
    }

    #[test]
    fn unknown_top_level_keys_survive_round_trip() {
        let raw = r#"{"bot":{"botId":"1"},"advanced":{"runtimePath":"/opt/QQ"},"musicSignUrl":"https://x.invalid/"}"#;
        let config: BotConfig = serde_json::from_str(raw).expect("parse");
        let rendered = serde_json::to_value(&config).expect("encode");
        assert_eq!(
            rendered["musicSignUrl"],
            Value::String("https://x.invalid/".to_owned())
        );
    }

    #[test]
    fn identity_ignores_other_fields() {
        let a: BotConfig = serde_json::from_str(
            r#"{"bot":{"botId":"7","name":"a"},"advanced":{"runtimePath":"/a"}}"#,
        )
        .expect("parse");
        let b: BotConfig = serde_json::from_str(
            r#"{"bot":{"botId":"7","name":"b"},"advanced":{"runtimePath":"/b"}}"#,
        )
        .expect("parse");
        assert!(a.same_identity(&b));
        assert_ne!(a, b);
        assert_eq!(a.display_name(), "a");
    }
}
