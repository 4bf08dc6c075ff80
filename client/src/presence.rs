//! Data exchanged with the presence collaborator (realtime key-value store).
//!
//! The engine never talks to the network. The host hands it raw snapshots and
//! forwards the engine's position samples. Anything missing or malformed in a
//! snapshot is treated as "no data", never as an error.

use glam::Vec3;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::CHAT_HISTORY_LIMIT;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Appearance {
    pub skin: String,
    pub shirt: String,
    pub pants: String,
}

impl Default for Appearance {
    fn default() -> Self {
        Self {
            skin: "#ffcd38".into(),
            shirt: "#0088ff".into(),
            pants: "#228b22".into(),
        }
    }
}

impl Appearance {
    /// Used for remote records that carry no appearance.
    pub fn remote_fallback() -> Self {
        Self {
            skin: "#ffcd38".into(),
            shirt: "#999".into(),
            pants: "#333".into(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl From<Vec3> for Position {
    fn from(v: Vec3) -> Self {
        Self {
            x: v.x,
            y: v.y,
            z: v.z,
        }
    }
}

impl From<Position> for Vec3 {
    fn from(p: Position) -> Self {
        Vec3::new(p.x, p.y, p.z)
    }
}

/// A player entry as stored under `players/<id>`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PlayerEntry {
    id: Option<String>,
    username: Option<String>,
    appearance: Option<Appearance>,
    level: Option<u32>,
    online: Option<bool>,
    position: Option<Position>,
    rotation: Option<f32>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct RemotePlayer {
    pub id: String,
    pub username: String,
    pub appearance: Appearance,
    pub level: u32,
    pub online: bool,
    pub position: Option<Vec3>,
    pub rotation: Option<f32>,
}

impl RemotePlayer {
    fn from_entry(key: Option<&str>, entry: PlayerEntry) -> Option<Self> {
        let id = entry.id.or_else(|| key.map(str::to_string))?;
        Some(Self {
            username: entry.username.unwrap_or_else(|| id.clone()),
            id,
            appearance: entry.appearance.unwrap_or_else(Appearance::remote_fallback),
            level: entry.level.unwrap_or(1),
            online: entry.online.unwrap_or(true),
            position: entry.position.map(Vec3::from),
            rotation: entry.rotation,
        })
    }

    /// Whether the record should be drawn as an avatar.
    pub fn is_visible(&self) -> bool {
        self.online && self.position.is_some()
    }
}

/// Accepts either the raw `players` map (id → entry) or a list of entries
/// carrying their own `id`.
pub fn players_from_value(value: &Value) -> Vec<RemotePlayer> {
    let parse = |key: Option<&str>, raw: &Value| {
        let entry = PlayerEntry::deserialize(raw)
            .inspect_err(|e| log::debug!("Skipping malformed player entry: {}", e))
            .ok()?;
        RemotePlayer::from_entry(key, entry)
    };
    match value {
        Value::Object(map) => map
            .iter()
            .filter_map(|(key, raw)| parse(Some(key), raw))
            .collect(),
        Value::Array(items) => items.iter().filter_map(|raw| parse(None, raw)).collect(),
        _ => Vec::new(),
    }
}

pub fn parse_players(json: &str) -> Vec<RemotePlayer> {
    match serde_json::from_str::<Value>(json) {
        Ok(value) => players_from_value(&value),
        Err(e) => {
            log::warn!("Ignoring unreadable player snapshot: {}", e);
            Vec::new()
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    #[serde(default)]
    pub id: String,
    pub username: String,
    pub text: String,
    #[serde(default)]
    pub timestamp: f64,
    #[serde(default)]
    pub is_system: bool,
}

/// Chat snapshot ordered by timestamp, most recent `CHAT_HISTORY_LIMIT` kept.
pub fn chat_from_value(value: &Value) -> Vec<ChatMessage> {
    let parse = |key: Option<&str>, raw: &Value| {
        let mut message = ChatMessage::deserialize(raw).ok()?;
        if message.id.is_empty()
            && let Some(key) = key
        {
            message.id = key.to_string();
        }
        Some(message)
    };
    let mut messages: Vec<ChatMessage> = match value {
        Value::Object(map) => map.iter().filter_map(|(k, raw)| parse(Some(k), raw)).collect(),
        Value::Array(items) => items.iter().filter_map(|raw| parse(None, raw)).collect(),
        _ => Vec::new(),
    };
    messages.sort_by(|a, b| a.timestamp.total_cmp(&b.timestamp));
    let excess = messages.len().saturating_sub(CHAT_HISTORY_LIMIT);
    messages.drain(..excess);
    messages
}

pub fn parse_chat(json: &str) -> Vec<ChatMessage> {
    serde_json::from_str::<Value>(json)
        .map(|value| chat_from_value(&value))
        .unwrap_or_default()
}

/// The local player's transform as written back to `players/<id>`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct PositionSample {
    pub position: Position,
    pub rotation: f32,
}

impl PositionSample {
    pub fn new(position: Vec3, rotation: f32) -> Self {
        Self {
            position: position.into(),
            rotation,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn players_map_fills_defaults() {
        let snapshot = json!({
            "u1": {
                "username": "alice",
                "appearance": {"skin": "#fff", "shirt": "#f00", "pants": "#00f"},
                "level": 3,
                "online": true,
                "timestamp": 1700000000000u64,
                "position": {"x": 1.0, "y": 2.0, "z": 3.0},
                "rotation": 0.5
            },
            "u2": {"username": "bob"}
        });
        let players = players_from_value(&snapshot);
        assert_eq!(players.len(), 2);
        assert_eq!(players[0].id, "u1");
        assert_eq!(players[0].level, 3);
        assert_eq!(players[0].position, Some(Vec3::new(1.0, 2.0, 3.0)));
        assert!(players[0].is_visible());
        assert_eq!(players[1].appearance, Appearance::remote_fallback());
        assert_eq!(players[1].level, 1);
        assert!(!players[1].is_visible());
    }

    #[test]
    fn malformed_snapshots_become_empty() {
        assert!(parse_players("not json").is_empty());
        assert!(parse_players("null").is_empty());
        assert!(parse_players("42").is_empty());
        let players = parse_players(r#"{"bad": {"level": "high"}, "ok": {"username": "x"}}"#);
        assert_eq!(players.len(), 1);
        assert_eq!(players[0].id, "ok");
    }

    #[test]
    fn player_list_form_needs_ids() {
        let players = parse_players(
            r#"[{"id": "a", "username": "ann", "online": false}, {"username": "anon"}]"#,
        );
        assert_eq!(players.len(), 1);
        assert!(!players[0].online);
    }

    #[test]
    fn chat_is_sorted_and_capped() {
        let mut map = serde_json::Map::new();
        for i in 0..60u32 {
            map.insert(
                format!("m{i:02}"),
                json!({"username": "u", "text": format!("#{i}"), "timestamp": 1000 - i}),
            );
        }
        map.insert("junk".into(), json!({"text": 5}));
        let messages = chat_from_value(&Value::Object(map));
        assert_eq!(messages.len(), CHAT_HISTORY_LIMIT);
        assert!(messages.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
        assert_eq!(messages.last().unwrap().text, "#0");
        assert_eq!(messages.last().unwrap().id, "m00");
    }

    #[test]
    fn system_flag_round_trips_from_host_json() {
        let messages =
            parse_chat(r#"[{"username":"sys","text":"hi","timestamp":1,"isSystem":true}]"#);
        assert!(messages[0].is_system);
        assert!(parse_chat("{").is_empty());
    }

    #[test]
    fn position_sample_serializes_like_the_store() {
        let sample = PositionSample::new(Vec3::new(1.0, 2.0, 3.0), 0.25);
        let value = serde_json::to_value(sample).unwrap();
        assert_eq!(
            value,
            json!({"position": {"x": 1.0, "y": 2.0, "z": 3.0}, "rotation": 0.25})
        );
    }
}
