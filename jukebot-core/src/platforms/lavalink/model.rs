// File: src/platforms/lavalink/model.rs
//
// Lavalink v4 wire types and their mapping onto our domain models.

use serde::Deserialize;
use serde_json::Value;

use jukebot_common::models::{
    LoadResult, NodeEvent, PlayableItem, SessionKey, TrackEndReason, TrackSource,
};

use crate::Error;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackInfo {
    pub identifier: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub length: u64,
    #[serde(default)]
    pub is_stream: bool,
    #[serde(default)]
    pub title: String,
    pub uri: Option<String>,
    #[serde(default)]
    pub source_name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Track {
    pub encoded: String,
    pub info: TrackInfo,
}

impl From<Track> for PlayableItem {
    fn from(t: Track) -> Self {
        // Streams report a bogus length.
        let duration = if t.info.is_stream { 0 } else { t.info.length };
        PlayableItem::new(
            t.info.title,
            t.info.author,
            duration,
            TrackSource {
                encoded: t.encoded,
                identifier: t.info.identifier,
                uri: t.info.uri,
                source_name: t.info.source_name,
            },
        )
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadTracksResponse {
    pub load_type: String,
    #[serde(default)]
    pub data: Value,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlaylistInfo {
    #[serde(default)]
    name: String,
    /// -1 when the link selected nothing.
    #[serde(default = "no_selection")]
    selected_track: i64,
}

fn no_selection() -> i64 {
    -1
}

#[derive(Debug, Deserialize)]
struct PlaylistData {
    info: PlaylistInfo,
    #[serde(default)]
    tracks: Vec<Track>,
}

#[derive(Debug, Deserialize)]
struct Exception {
    message: Option<String>,
    #[serde(default)]
    cause: String,
}

impl Exception {
    fn describe(self) -> String {
        self.message.unwrap_or(self.cause)
    }
}

impl LoadTracksResponse {
    pub fn into_load_result(self) -> Result<LoadResult, Error> {
        let result = match self.load_type.as_str() {
            "track" => LoadResult::SingleItem(serde_json::from_value::<Track>(self.data)?.into()),
            "playlist" => {
                let data: PlaylistData = serde_json::from_value(self.data)?;
                let selected = usize::try_from(data.info.selected_track)
                    .ok()
                    .filter(|i| *i < data.tracks.len());
                LoadResult::PlaylistItems {
                    name: data.info.name,
                    items: data.tracks.into_iter().map(Into::into).collect(),
                    selected,
                }
            }
            "search" => {
                let tracks: Vec<Track> = serde_json::from_value(self.data)?;
                LoadResult::SearchResults(tracks.into_iter().map(Into::into).collect())
            }
            "empty" => LoadResult::NoMatch,
            "error" => {
                let exception: Exception = serde_json::from_value(self.data)?;
                LoadResult::LoadFailure { message: exception.describe() }
            }
            other => return Err(Error::Parse(format!("unknown loadType '{other}'"))),
        };
        Ok(result)
    }
}

#[derive(Debug, Deserialize)]
pub struct PlayerResponse {
    pub track: Option<Track>,
}

/// Payload of the `ready` op.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ready {
    pub session_id: String,
    #[serde(default)]
    pub resumed: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EventEnvelope {
    #[serde(rename = "type")]
    kind: String,
    guild_id: String,
    track: Option<Track>,
    reason: Option<Value>,
    exception: Option<Exception>,
    threshold_ms: Option<u64>,
    code: Option<u16>,
}

/// Parses one websocket text frame. `Ok(None)` for ops we do not route
/// (`playerUpdate`, `stats`, unknown event types).
pub fn parse_node_message(txt: &str) -> Result<Option<NodeEvent>, Error> {
    let parsed: Value = serde_json::from_str(txt)?;
    match parsed.get("op").and_then(|v| v.as_str()) {
        Some("ready") => {
            let ready: Ready = serde_json::from_value(parsed)?;
            Ok(Some(NodeEvent::Ready {
                session_id: ready.session_id,
                resumed: ready.resumed,
            }))
        }
        Some("event") => parse_event(serde_json::from_value(parsed)?),
        _ => Ok(None),
    }
}

fn parse_event(env: EventEnvelope) -> Result<Option<NodeEvent>, Error> {
    let session: SessionKey = env.guild_id.parse()?;
    let event = match env.kind.as_str() {
        "TrackStartEvent" => NodeEvent::TrackStart {
            session,
            identifier: env.track.map(|t| t.info.identifier).unwrap_or_default(),
        },
        "TrackEndEvent" => {
            let reason = env
                .reason
                .as_ref()
                .and_then(|r| r.as_str())
                .ok_or_else(|| Error::Parse("TrackEndEvent without reason".into()))?;
            NodeEvent::TrackEnd {
                session,
                reason: reason.parse()?,
            }
        }
        "TrackExceptionEvent" => NodeEvent::TrackException {
            session,
            message: env.exception.map(Exception::describe).unwrap_or_default(),
        },
        "TrackStuckEvent" => NodeEvent::TrackStuck {
            session,
            threshold_ms: env.threshold_ms.unwrap_or_default(),
        },
        "WebSocketClosedEvent" => NodeEvent::WebSocketClosed {
            session,
            code: env.code.unwrap_or_default(),
            reason: env
                .reason
                .as_ref()
                .and_then(|r| r.as_str())
                .unwrap_or_default()
                .to_string(),
        },
        _ => return Ok(None),
    };
    Ok(Some(event))
}

#[cfg(test)]
mod tests {
    use super::*;

    const TRACK: &str = r#"{
        "encoded":"QAAA",
        "info":{"identifier":"dQw4w9WgXcQ","isSeekable":true,"author":"Rick Astley",
                "length":212000,"isStream":false,"position":0,
                "title":"Never Gonna Give You Up","uri":"https://www.youtube.com/watch?v=dQw4w9WgXcQ",
                "sourceName":"youtube"},
        "pluginInfo":{}
    }"#;

    fn load(json: &str) -> LoadResult {
        serde_json::from_str::<LoadTracksResponse>(json)
            .unwrap()
            .into_load_result()
            .unwrap()
    }

    #[test]
    fn test_single_track() {
        let LoadResult::SingleItem(item) = load(&format!(r#"{{"loadType":"track","data":{TRACK}}}"#)) else {
            panic!("expected single item");
        };
        assert_eq!(item.qualified_name(), "Rick Astley - Never Gonna Give You Up");
        assert_eq!(item.formatted_duration(), "3min32s");
        assert_eq!(item.source().encoded, "QAAA");
        assert_eq!(item.source().source_name, "youtube");
    }

    #[test]
    fn test_playlist_selected_track() {
        let playlist = |selected: i64| {
            load(&format!(
                r#"{{"loadType":"playlist","data":{{"info":{{"name":"Mix","selectedTrack":{selected}}},"pluginInfo":{{}},"tracks":[{TRACK},{TRACK}]}}}}"#
            ))
        };
        assert!(matches!(playlist(1), LoadResult::PlaylistItems { selected: Some(1), .. }));
        // Out of range is treated as no selection.
        assert!(matches!(playlist(5), LoadResult::PlaylistItems { selected: None, .. }));

        let missing = load(&format!(
            r#"{{"loadType":"playlist","data":{{"info":{{"name":"Mix"}},"tracks":[{TRACK}]}}}}"#
        ));
        assert!(matches!(missing, LoadResult::PlaylistItems { selected: None, .. }));
    }

    #[test]
    fn test_playlist_search_empty_error() {
        let playlist = load(&format!(
            r#"{{"loadType":"playlist","data":{{"info":{{"name":"Mix","selectedTrack":-1}},"pluginInfo":{{}},"tracks":[{TRACK},{TRACK}]}}}}"#
        ));
        assert!(matches!(playlist, LoadResult::PlaylistItems { ref name, ref items, selected: None } if name == "Mix" && items.len() == 2));

        let search = load(&format!(r#"{{"loadType":"search","data":[{TRACK}]}}"#));
        assert!(matches!(search, LoadResult::SearchResults(ref v) if v.len() == 1));

        assert_eq!(load(r#"{"loadType":"empty","data":{}}"#), LoadResult::NoMatch);

        let failed = load(
            r#"{"loadType":"error","data":{"message":"This video is unavailable","severity":"common","cause":"x"}}"#,
        );
        assert_eq!(
            failed,
            LoadResult::LoadFailure { message: "This video is unavailable".into() }
        );
    }

    #[test]
    fn test_streams_have_no_duration() {
        let json = TRACK.replace(r#""isStream":false"#, r#""isStream":true"#);
        let track: Track = serde_json::from_str(&json).unwrap();
        let item: PlayableItem = track.into();
        assert_eq!(item.duration_millis(), 0);
        assert_eq!(item.formatted_duration(), "<n/a>");
    }

    #[test]
    fn test_unknown_load_type() {
        let resp: LoadTracksResponse = serde_json::from_str(r#"{"loadType":"weird"}"#).unwrap();
        assert!(resp.into_load_result().is_err());
    }

    #[test]
    fn test_parse_ready_and_events() {
        let ready = parse_node_message(r#"{"op":"ready","resumed":false,"sessionId":"la3kfsdf5eafe848"}"#)
            .unwrap()
            .unwrap();
        assert!(matches!(ready, NodeEvent::Ready { ref session_id, resumed: false } if session_id == "la3kfsdf5eafe848"));

        let end = parse_node_message(&format!(
            r#"{{"op":"event","type":"TrackEndEvent","guildId":"817327181659111454","track":{TRACK},"reason":"finished"}}"#
        ))
        .unwrap()
        .unwrap();
        assert!(matches!(
            end,
            NodeEvent::TrackEnd { session: SessionKey(817327181659111454), reason: TrackEndReason::Finished }
        ));

        let stuck = parse_node_message(&format!(
            r#"{{"op":"event","type":"TrackStuckEvent","guildId":"1","track":{TRACK},"thresholdMs":10000}}"#
        ))
        .unwrap()
        .unwrap();
        assert!(matches!(stuck, NodeEvent::TrackStuck { threshold_ms: 10000, .. }));

        let closed = parse_node_message(
            r#"{"op":"event","type":"WebSocketClosedEvent","guildId":"1","code":4006,"reason":"Your session is no longer valid.","byRemote":true}"#,
        )
        .unwrap()
        .unwrap();
        assert!(matches!(closed, NodeEvent::WebSocketClosed { code: 4006, .. }));
    }

    #[test]
    fn test_ignored_ops() {
        assert!(parse_node_message(r#"{"op":"stats","players":1}"#).unwrap().is_none());
        assert!(parse_node_message(r#"{"op":"playerUpdate","guildId":"1","state":{}}"#)
            .unwrap()
            .is_none());
        assert!(parse_node_message("not json").is_err());
    }
}
