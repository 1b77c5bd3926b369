use std::collections::HashMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

use crate::extract::{AttackingSide, PossessionEvent, RawBall, RawPlay, round_tenths};
use crate::play::PlayId;

#[derive(Debug, Deserialize)]
struct PositionsDocument {
    #[serde(default)]
    sequences: Vec<SequenceRow>,
}

#[derive(Debug, Deserialize)]
struct SequenceRow {
    #[serde(default, alias = "id", alias = "sequenceId")]
    sequence_id: Option<Value>,
    #[serde(default)]
    team_id: Option<Value>,
    #[serde(default)]
    frames: Vec<i64>,
    #[serde(default)]
    positions: HashMap<String, Vec<Value>>,
    #[serde(default)]
    attacking_side: Option<String>,
}

pub fn parse_sequence_positions_json(
    raw: &str,
    match_id: u64,
    frame_rate_hz: f64,
) -> Result<Vec<RawPlay>> {
    if !(frame_rate_hz.is_finite() && frame_rate_hz > 0.0) {
        return Err(anyhow!("frame rate must be positive, got {frame_rate_hz}"));
    }
    let doc = serde_json::from_str::<Option<PositionsDocument>>(raw)
        .context("parse sequence positions json")?;
    let Some(doc) = doc else {
        return Ok(Vec::new());
    };

    let mut out = Vec::with_capacity(doc.sequences.len());
    for (idx, row) in doc.sequences.into_iter().enumerate() {
        let Some(sequence_id) = row.sequence_id.as_ref().and_then(sequence_id_text) else {
            warn!(match_id, index = idx, "sequence without id skipped");
            continue;
        };
        out.push(raw_play_from_row(
            PlayId::new(match_id, sequence_id),
            row,
            frame_rate_hz,
        ));
    }
    Ok(out)
}

pub fn load_sequence_positions_file(
    path: &Path,
    match_id: Option<u64>,
    frame_rate_hz: f64,
) -> Result<Vec<RawPlay>> {
    let match_id = match_id
        .or_else(|| match_id_from_path(path))
        .with_context(|| format!("no match id for {}", path.display()))?;
    let raw = fs::read_to_string(path)
        .with_context(|| format!("read positions file {}", path.display()))?;
    parse_sequence_positions_json(&raw, match_id, frame_rate_hz)
        .with_context(|| format!("positions file {}", path.display()))
}

pub fn match_id_from_path(path: &Path) -> Option<u64> {
    let name = path.file_name()?.to_str()?;
    let digits: String = name.chars().take_while(|c| c.is_ascii_digit()).collect();
    digits.parse::<u64>().ok()
}

fn raw_play_from_row(id: PlayId, row: SequenceRow, frame_rate_hz: f64) -> RawPlay {
    let mut frames = if row.frames.is_empty() {
        row.positions
            .keys()
            .filter_map(|k| k.trim().parse::<i64>().ok())
            .collect::<Vec<_>>()
    } else {
        row.frames
    };
    frames.sort_unstable();
    frames.dedup();

    let events = frames
        .iter()
        .map(|frame| PossessionEvent {
            timestamp_secs: *frame as f64 / frame_rate_hz,
            ball: row
                .positions
                .get(&frame.to_string())
                .and_then(|coords| ball_from_coords(coords)),
        })
        .collect();

    let duration_secs = match (frames.first(), frames.last()) {
        (Some(first), Some(last)) => Some(round_tenths((last - first) as f64 / frame_rate_hz)),
        _ => None,
    };

    let attacking_side = row.attacking_side.as_deref().and_then(AttackingSide::parse);
    if row.attacking_side.is_some() && attacking_side.is_none() {
        warn!(play = %id, side = ?row.attacking_side, "unrecognised attacking side");
    }

    RawPlay {
        id,
        events,
        duration_secs,
        team_id: row.team_id.as_ref().and_then(value_as_u64),
        video_ref: None,
        attacking_side,
    }
}

fn ball_from_coords(coords: &[Value]) -> Option<RawBall> {
    if coords.len() < 2 {
        return None;
    }
    Some(RawBall {
        x: value_as_f64(&coords[0]),
        y: value_as_f64(&coords[1]),
        z: coords.get(2).and_then(value_as_f64),
    })
}

fn value_as_f64(v: &Value) -> Option<f64> {
    match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

fn value_as_u64(v: &Value) -> Option<u64> {
    match v {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0 && f.fract() == 0.0).map(|f| f as u64)),
        Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    }
}

fn sequence_id_text(v: &Value) -> Option<String> {
    match v {
        Value::Number(n) => Some(
            n.as_u64()
                .map(|i| i.to_string())
                .unwrap_or_else(|| n.to_string()),
        ),
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        _ => None,
    }
}
