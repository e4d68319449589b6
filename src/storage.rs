// Local records. The shell mirrors a flat string map to `localStorage`; the core reads
// and writes typed records through `KeyValueStore`. Undecodable values fall back to
// defaults so a corrupted entry never blocks the page.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::EngineError;

pub const EGG_RECORD_KEY: &str = "love-letter-easter-eggs";
pub const CHAT_LOG_KEY: &str = "local-chat-messages";
pub const UNLOCK_KEY: &str = "unlocked";
pub const KEY_HINT_KEY: &str = "keyHintShown";

/// String key/value storage, shaped like the browser's `localStorage`.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: String);
    fn remove(&mut self, key: &str);
}

/// In-memory store, exchanged with the shell as a JSON object of strings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MemoryStore {
    entries: BTreeMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(json: &str) -> Result<Self, EngineError> {
        if json.trim().is_empty() {
            return Ok(Self::new());
        }
        serde_json::from_str(json).map_err(|e| EngineError::Storage {
            key: "*".to_string(),
            message: e.to_string(),
        })
    }

    pub fn to_json(&self) -> Result<String, EngineError> {
        Ok(serde_json::to_string(self)?)
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: String) {
        self.entries.insert(key.to_string(), value);
    }

    fn remove(&mut self, key: &str) {
        self.entries.remove(key);
    }
}

/// Persisted easter-egg bookkeeping.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EggRecord {
    #[serde(default)]
    pub visit_count: u32,
    #[serde(default)]
    pub shown_eggs: Vec<String>,
    /// Older records stored a locale date string; anything unparsable reads as "never".
    #[serde(default, deserialize_with = "lenient_date")]
    pub last_visit_date: Option<NaiveDate>,
    /// Milliseconds since the Unix epoch.
    #[serde(default)]
    pub last_visit_time: Option<i64>,
    #[serde(default)]
    pub dismissed_missed: Vec<String>,
    #[serde(default, deserialize_with = "lenient_date")]
    pub install_date: Option<NaiveDate>,
}

fn lenient_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.and_then(|s| NaiveDate::parse_from_str(&s, "%Y-%m-%d").ok()))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    #[default]
    Text,
    Image,
}

/// One entry of the local chat log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: String,
    pub content: String,
    pub sender: String,
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
    #[serde(rename = "type", default)]
    pub kind: MessageKind,
}

fn read_json<T, S>(store: &S, key: &str) -> T
where
    T: for<'de> Deserialize<'de> + Default,
    S: KeyValueStore + ?Sized,
{
    let Some(raw) = store.get(key) else {
        return T::default();
    };
    match serde_json::from_str(&raw) {
        Ok(value) => value,
        Err(e) => {
            log::warn!("discarding unreadable {key}: {e}");
            T::default()
        }
    }
}

fn write_json<T, S>(store: &mut S, key: &str, value: &T) -> Result<(), EngineError>
where
    T: Serialize,
    S: KeyValueStore + ?Sized,
{
    let json = serde_json::to_string(value).map_err(|e| EngineError::Storage {
        key: key.to_string(),
        message: e.to_string(),
    })?;
    store.set(key, json);
    Ok(())
}

pub fn load_egg_record<S: KeyValueStore + ?Sized>(store: &S) -> EggRecord {
    read_json(store, EGG_RECORD_KEY)
}

pub fn save_egg_record<S: KeyValueStore + ?Sized>(store: &mut S, record: &EggRecord) -> Result<(), EngineError> {
    write_json(store, EGG_RECORD_KEY, record)
}

pub fn load_chat_log<S: KeyValueStore + ?Sized>(store: &S) -> Vec<ChatMessage> {
    read_json(store, CHAT_LOG_KEY)
}

/// Append a message. Blank content is refused and returns `Ok(None)`.
pub fn append_chat_message<S: KeyValueStore + ?Sized>(
    store: &mut S,
    content: &str,
    sender: &str,
    kind: MessageKind,
    now_ms: i64,
) -> Result<Option<ChatMessage>, EngineError> {
    if content.trim().is_empty() {
        return Ok(None);
    }
    let message = ChatMessage {
        id: format!("msg-{now_ms}"),
        content: content.to_string(),
        sender: sender.to_string(),
        timestamp: now_ms,
        kind,
    };
    let mut log = load_chat_log(store);
    log.push(message.clone());
    write_json(store, CHAT_LOG_KEY, &log)?;
    Ok(Some(message))
}

fn flag<S: KeyValueStore + ?Sized>(store: &S, key: &str) -> bool {
    store.get(key).as_deref() == Some("true")
}

pub fn is_unlocked<S: KeyValueStore + ?Sized>(store: &S) -> bool {
    flag(store, UNLOCK_KEY)
}

pub fn set_unlocked<S: KeyValueStore + ?Sized>(store: &mut S) {
    store.set(UNLOCK_KEY, "true".to_string());
}

pub fn key_hint_shown<S: KeyValueStore + ?Sized>(store: &S) -> bool {
    flag(store, KEY_HINT_KEY)
}

pub fn set_key_hint_shown<S: KeyValueStore + ?Sized>(store: &mut S) {
    store.set(KEY_HINT_KEY, "true".to_string());
}
