use std::fmt;

use serde::{Deserialize, Serialize};

mod snapshot;

pub use snapshot::{
    decode_snapshot, decode_state, encode_snapshot, encode_state, supersedes, validate_state,
    Snapshot, SnapshotError, MAX_PAYLOAD_BYTES,
};

pub const DEFAULT_COLOR: &str = "black";
pub const DEFAULT_WIDTH: u32 = 1;
pub const MAX_ID_LEN: usize = 64;
pub const MAX_COLOR_LEN: usize = 32;
pub const MAX_ROOM_LEN: usize = 64;

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    pub fn midpoint(self, other: Point) -> Point {
        Point {
            x: (self.x + other.x) * 0.5,
            y: (self.y + other.y) * 0.5,
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum StrokeError {
    #[error("stroke has an odd number of coordinates ({0})")]
    OddCoordinates(usize),
    #[error("stroke coordinate {0} is not finite")]
    NonFinite(usize),
}

/// One freehand gesture. On the wire a stroke is a flat coordinate array
/// `[x0, y0, x1, y1, ...]`.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(try_from = "Vec<f64>", into = "Vec<f64>")]
pub struct Stroke {
    pub points: Vec<Point>,
}

impl Stroke {
    pub fn new(points: Vec<Point>) -> Self {
        Self { points }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

impl TryFrom<Vec<f64>> for Stroke {
    type Error = StrokeError;

    fn try_from(coords: Vec<f64>) -> Result<Self, Self::Error> {
        if coords.len() % 2 != 0 {
            return Err(StrokeError::OddCoordinates(coords.len()));
        }
        if let Some(index) = coords.iter().position(|value| !value.is_finite()) {
            return Err(StrokeError::NonFinite(index));
        }
        let points = coords
            .chunks_exact(2)
            .map(|pair| Point::new(pair[0], pair[1]))
            .collect();
        Ok(Self { points })
    }
}

impl From<Stroke> for Vec<f64> {
    fn from(stroke: Stroke) -> Self {
        let mut coords = Vec::with_capacity(stroke.points.len() * 2);
        for point in stroke.points {
            coords.push(point.x);
            coords.push(point.y);
        }
        coords
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(from = "RawClientId", into = "String")]
pub struct ClientId(String);

#[derive(Deserialize)]
#[serde(untagged)]
enum RawClientId {
    Text(String),
    Number(u64),
}

impl From<RawClientId> for ClientId {
    fn from(raw: RawClientId) -> Self {
        match raw {
            RawClientId::Text(text) => ClientId(text),
            RawClientId::Number(number) => ClientId(number.to_string()),
        }
    }
}

impl From<ClientId> for String {
    fn from(id: ClientId) -> Self {
        id.0
    }
}

impl ClientId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn from_parts(millis: u64, random: u32) -> Self {
        Self(format!("{millis:x}-{random:08x}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ClientState {
    pub id: ClientId,
    pub color: String,
    pub width: u32,
    pub strokes: Vec<Stroke>,
}

impl ClientState {
    pub fn new(id: ClientId) -> Self {
        Self {
            id,
            color: DEFAULT_COLOR.to_string(),
            width: DEFAULT_WIDTH,
            strokes: Vec::new(),
        }
    }
}

pub fn is_room_name(value: &str) -> bool {
    !value.is_empty()
        && value.len() <= MAX_ROOM_LEN
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn room_names_are_path_safe() {
        assert!(is_room_name("lobby"));
        assert!(is_room_name("0b4e2c1a-5f7e-4d4b-9a55-1f1f1f1f1f1f"));
        assert!(!is_room_name(""));
        assert!(!is_room_name("../etc"));
        assert!(!is_room_name("a b"));
        assert!(!is_room_name(&"x".repeat(MAX_ROOM_LEN + 1)));
    }

    #[test]
    fn stroke_serializes_as_flat_coordinates() {
        let stroke = Stroke::new(vec![Point::new(1.0, 2.0), Point::new(3.5, -4.0)]);
        let json = serde_json::to_string(&stroke).unwrap();
        assert_eq!(json, "[1.0,2.0,3.5,-4.0]");
    }

    #[test]
    fn stroke_rejects_odd_coordinate_count() {
        let parsed = serde_json::from_str::<Stroke>("[1,2,3]");
        assert!(parsed.is_err());
        assert_eq!(
            Stroke::try_from(vec![1.0, 2.0, 3.0]),
            Err(StrokeError::OddCoordinates(3))
        );
    }

    #[test]
    fn stroke_rejects_non_finite_coordinates() {
        assert_eq!(
            Stroke::try_from(vec![1.0, f64::NAN]),
            Err(StrokeError::NonFinite(1))
        );
    }

    #[test]
    fn numeric_client_id_is_normalized() {
        let id: ClientId = serde_json::from_str("1546300800000").unwrap();
        assert_eq!(id.as_str(), "1546300800000");
        let id: ClientId = serde_json::from_str("\"abc\"").unwrap();
        assert_eq!(id, ClientId::new("abc"));
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"abc\"");
    }

    #[test]
    fn time_derived_id_is_hex() {
        let id = ClientId::from_parts(255, 1);
        assert_eq!(id.as_str(), "ff-00000001");
    }

    #[test]
    fn new_state_uses_defaults() {
        let state = ClientState::new(ClientId::new("a"));
        assert_eq!(state.color, DEFAULT_COLOR);
        assert_eq!(state.width, DEFAULT_WIDTH);
        assert!(state.strokes.is_empty());
    }

    #[test]
    fn midpoint_is_average() {
        let mid = Point::new(0.0, 0.0).midpoint(Point::new(4.0, -2.0));
        assert_eq!(mid, Point::new(2.0, -1.0));
    }
}
