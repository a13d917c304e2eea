//! JSON request/response shapes of the web client.

use serde::{Deserialize, Serialize};

use super::geometry::Target;
use super::placement::SafeArea;
use super::session::Outcome;

/// Round seconds to hundredths for display.
pub fn round_time(seconds: f64) -> f64 {
    (seconds * 100.0).round() / 100.0
}

/// `POST /api/game/start` body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StartGameRequest {
    #[serde(default)]
    pub player_name: Option<String>,
    pub numbers_count: u32,
    pub canvas_width: f64,
    pub canvas_height: f64,
    #[serde(default)]
    pub safe_area: Option<SafeArea>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StartGameResponse {
    pub game_id: String,
    pub circles: Vec<Target>,
    pub next_expected: u32,
}

/// `POST /api/game/click` body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClickRequest {
    pub game_id: String,
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "lowercase")]
pub enum ClickResponse {
    Empty {
        current_number: u32,
    },
    Correct {
        current_number: u32,
        circles: Vec<Target>,
    },
    Complete {
        time: f64,
        circles: Vec<Target>,
    },
    Wrong {
        expected: u32,
        clicked: u32,
        time: f64,
    },
}

impl ClickResponse {
    /// Build the response for an outcome, given the session's targets after
    /// the click.
    pub fn from_outcome(outcome: &Outcome, targets: &[Target]) -> Self {
        match *outcome {
            Outcome::Empty { expected } => Self::Empty {
                current_number: expected,
            },
            Outcome::Correct { expected } => Self::Correct {
                current_number: expected,
                circles: targets.to_vec(),
            },
            Outcome::Complete { elapsed } => Self::Complete {
                time: round_time(elapsed),
                circles: targets.to_vec(),
            },
            Outcome::Wrong {
                expected,
                clicked,
                elapsed,
            } => Self::Wrong {
                expected,
                clicked,
                time: round_time(elapsed),
            },
        }
    }
}

/// Error body for rejected requests.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl From<&super::error::GameError> for ErrorResponse {
    fn from(e: &super::error::GameError) -> Self {
        Self {
            error: e.code().to_string(),
            message: e.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::error::GameError;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_round_time() {
        assert_eq!(round_time(1.23456), 1.23);
        assert_eq!(round_time(1.235001), 1.24);
        assert_eq!(round_time(0.0), 0.0);
    }

    #[test]
    fn test_start_request_parse() {
        let req: StartGameRequest = serde_json::from_str(
            r#"{
                "player_name": "Alice",
                "numbers_count": 10,
                "canvas_width": 1280,
                "canvas_height": 720,
                "safe_area": {"minX": 40, "maxX": 1240, "minY": 120, "maxY": 600}
            }"#,
        )
        .unwrap();

        assert_eq!(req.player_name.as_deref(), Some("Alice"));
        assert_eq!(req.numbers_count, 10);
        assert_eq!(req.safe_area, Some(SafeArea::new(40.0, 1240.0, 120.0, 600.0)));
    }

    #[test]
    fn test_start_request_optional_fields() {
        let req: StartGameRequest = serde_json::from_str(
            r#"{"numbers_count": 5, "canvas_width": 800, "canvas_height": 600}"#,
        )
        .unwrap();
        assert_eq!(req.player_name, None);
        assert_eq!(req.safe_area, None);
    }

    #[test]
    fn test_click_response_shapes() {
        let targets = vec![Target::new(1.0, 2.0, 1, 30.0)];

        let json = serde_json::to_value(ClickResponse::from_outcome(
            &Outcome::Correct { expected: 2 },
            &targets,
        ))
        .unwrap();
        assert_eq!(json["result"], "correct");
        assert_eq!(json["current_number"], 2);
        assert_eq!(json["circles"][0]["number"], 1);

        let json = serde_json::to_value(ClickResponse::from_outcome(
            &Outcome::Wrong {
                expected: 1,
                clicked: 3,
                elapsed: 2.34567,
            },
            &targets,
        ))
        .unwrap();
        assert_eq!(
            json,
            serde_json::json!({"result": "wrong", "expected": 1, "clicked": 3, "time": 2.35})
        );

        let json = serde_json::to_value(ClickResponse::from_outcome(
            &Outcome::Empty { expected: 4 },
            &targets,
        ))
        .unwrap();
        assert_eq!(json, serde_json::json!({"result": "empty", "current_number": 4}));
    }

    #[test]
    fn test_error_response() {
        let body = ErrorResponse::from(&GameError::SessionNotFound);
        assert_eq!(body.error, "session_not_found");
        assert_eq!(body.message, "Game session not found");
    }
}
