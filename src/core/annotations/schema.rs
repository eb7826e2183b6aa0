//! Label Schema Registry
//!
//! Data-driven validation table for move types, their contextual questions,
//! tag types, and body locations. New move types are pure data additions:
//! the store validates against whatever schema it was opened with, and a
//! project can override the built-in schema with a JSON file.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::core::annotations::{ContextualAnswer, ContextualData};
use crate::core::{CoreError, CoreResult};

/// Schema format version for forward migration.
pub const SCHEMA_VERSION: u32 = 1;

// =============================================================================
// Schema Types
// =============================================================================

/// One contextual question asked for a specific move type.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    /// Stable answer key (e.g. "catching_hand")
    pub key: String,
    /// Prompt text shown in the labeling form
    pub prompt: String,
    /// Closed option vocabulary
    pub options: Vec<String>,
    /// Whether the answer may select multiple options
    #[serde(default)]
    pub multi_select: bool,
}

/// Question set for one move type, in form-rendering order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveTypeSchema {
    pub move_type: String,
    pub questions: Vec<Question>,
}

impl MoveTypeSchema {
    /// Looks up a question by answer key.
    pub fn question(&self, key: &str) -> Option<&Question> {
        self.questions.iter().find(|q| q.key == key)
    }
}

/// The full label vocabulary: move types with questions, tag types, and body
/// locations.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabelSchema {
    #[serde(default = "default_version")]
    pub version: u32,
    pub move_types: Vec<MoveTypeSchema>,
    /// Tag type key -> display name
    pub tag_types: BTreeMap<String, String>,
    /// Closed body-location vocabulary for sensation tags
    pub body_parts: Vec<String>,
}

fn default_version() -> u32 {
    SCHEMA_VERSION
}

impl Default for LabelSchema {
    fn default() -> Self {
        Self::builtin()
    }
}

impl LabelSchema {
    /// Loads a schema from a JSON file, falling back to the built-in schema
    /// when the file does not exist.
    pub fn load_or_builtin(path: &Path) -> CoreResult<Self> {
        if !path.exists() {
            return Ok(Self::builtin());
        }
        let content = std::fs::read_to_string(path)?;
        let schema: LabelSchema = serde_json::from_str(&content)?;
        info!(
            path = %path.display(),
            move_types = schema.move_types.len(),
            "Loaded label schema override"
        );
        Ok(schema)
    }

    /// Returns the registered move type keys.
    pub fn move_type_keys(&self) -> Vec<&str> {
        self.move_types.iter().map(|m| m.move_type.as_str()).collect()
    }

    /// Resolves a move type, failing with `UnknownMoveType`.
    pub fn require_move_type(&self, move_type: &str) -> CoreResult<&MoveTypeSchema> {
        self.move_types
            .iter()
            .find(|m| m.move_type == move_type)
            .ok_or_else(|| CoreError::UnknownMoveType(move_type.to_string()))
    }

    /// Validates contextual answers against the question schema of the given
    /// move type. Every key must be a registered question, the answer shape
    /// must match the question's multi-select flag, and every selected value
    /// must come from the question's option vocabulary.
    pub fn validate_contextual(&self, move_type: &str, data: &ContextualData) -> CoreResult<()> {
        let schema = self.require_move_type(move_type)?;

        for (key, answer) in data {
            let question = schema.question(key).ok_or_else(|| CoreError::SchemaMismatch {
                move_type: move_type.to_string(),
                detail: format!("unknown question key '{key}'"),
            })?;

            if let ContextualAnswer::Many(_) = answer {
                if !question.multi_select {
                    return Err(CoreError::SchemaMismatch {
                        move_type: move_type.to_string(),
                        detail: format!("question '{key}' does not accept multiple selections"),
                    });
                }
            }

            for value in answer.selected() {
                if !question.options.iter().any(|o| o == value) {
                    return Err(CoreError::SchemaMismatch {
                        move_type: move_type.to_string(),
                        detail: format!("'{value}' is not an option for question '{key}'"),
                    });
                }
            }
        }

        Ok(())
    }

    /// Validates a tag type key, failing with `UnknownTagType`.
    pub fn require_tag_type(&self, tag_type: &str) -> CoreResult<()> {
        if self.tag_types.contains_key(tag_type) {
            Ok(())
        } else {
            Err(CoreError::UnknownTagType(tag_type.to_string()))
        }
    }

    /// Validates a non-empty set of body locations against the vocabulary.
    pub fn validate_locations(&self, locations: &[String]) -> CoreResult<()> {
        if locations.is_empty() {
            return Err(CoreError::EmptyLocations);
        }
        for location in locations {
            if !self.body_parts.iter().any(|p| p == location) {
                return Err(CoreError::UnknownLocation(location.clone()));
            }
        }
        Ok(())
    }

    // =========================================================================
    // Built-in Vocabulary
    // =========================================================================

    /// The built-in climbing vocabulary: six move types, nine tag types, and
    /// sixteen body locations.
    pub fn builtin() -> Self {
        let contact_options = || {
            vec![
                "left_hand".to_string(),
                "right_hand".to_string(),
                "left_foot".to_string(),
                "right_foot".to_string(),
            ]
        };

        let move_types = vec![
            MoveTypeSchema {
                move_type: "static".into(),
                questions: vec![
                    question("reaching_hand", "Which hand reached?", &["left_hand", "right_hand", "both_hands"], false),
                    question("supporting_leg", "Supporting leg", &["left_foot", "right_foot", "both_feet"], false),
                    question("other_leg_position", "Other leg position", &["on_hold", "flagged_left", "flagged_right", "dangling"], false),
                    Question {
                        key: "contact_points".into(),
                        prompt: "Contact points".into(),
                        options: contact_options(),
                        multi_select: true,
                    },
                ],
            },
            MoveTypeSchema {
                move_type: "lock_off".into(),
                questions: vec![
                    question("lock_off_arm", "Which arm was the lock-off on?", &["left_arm", "right_arm", "both_arms"], false),
                    Question {
                        key: "contact_points".into(),
                        prompt: "Contact points during lock-off".into(),
                        options: contact_options(),
                        multi_select: true,
                    },
                    question("hold_duration", "How long held (estimate)", &["<1sec", "1-3sec", "3-5sec", ">5sec"], false),
                ],
            },
            MoveTypeSchema {
                move_type: "dyno".into(),
                questions: vec![
                    question("catching_hand", "Which hand caught the target hold?", &["left_hand", "right_hand", "both_hands", "missed"], false),
                    question("push_foot", "Which foot pushed off?", &["left_foot", "right_foot", "both_feet"], false),
                    Question {
                        key: "contact_at_launch".into(),
                        prompt: "Contact points at launch".into(),
                        options: contact_options(),
                        multi_select: true,
                    },
                    question("body_position", "Body position", &["square", "side_on", "turned_away"], false),
                ],
            },
            MoveTypeSchema {
                move_type: "deadpoint".into(),
                questions: vec![
                    question("reaching_hand", "Which hand reached?", &["left_hand", "right_hand", "both_hands"], false),
                    question("push_foot", "Push foot", &["left_foot", "right_foot", "both_feet"], false),
                    Question {
                        key: "contact_at_peak".into(),
                        prompt: "Contact at peak".into(),
                        options: contact_options(),
                        multi_select: true,
                    },
                ],
            },
            MoveTypeSchema {
                move_type: "mantle".into(),
                questions: vec![
                    question("mantle_side", "Which side mantled first?", &["left_side", "right_side", "both_together"], false),
                    question("starting_position", "Starting position", &["below_hold", "level_with_hold", "above_hold"], false),
                    question("contact_at_top", "Contact points at top", &["left_hand", "right_hand", "left_knee", "right_knee"], true),
                ],
            },
            MoveTypeSchema {
                move_type: "drop_knee".into(),
                questions: vec![
                    question("dropped_knee", "Which knee dropped?", &["left_knee", "right_knee"], false),
                    question("hip_rotation", "Hip rotation", &["internal", "external", "neutral"], false),
                    Question {
                        key: "contact_points".into(),
                        prompt: "Contact points".into(),
                        options: contact_options(),
                        multi_select: true,
                    },
                ],
            },
        ];

        let tag_types = [
            ("sharp_pain", "Sharp Pain"),
            ("dull_pain", "Dull Pain"),
            ("pop", "Pop"),
            ("unstable", "Unstable"),
            ("stretch_awkward", "Stretch/Awkward"),
            ("strong_controlled", "Strong/Controlled"),
            ("weak", "Weak"),
            ("pumped", "Pumped"),
            ("fatigue", "Fatigue"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        let body_parts = [
            "left_shoulder", "right_shoulder",
            "left_elbow", "right_elbow",
            "left_wrist", "right_wrist",
            "left_hip", "right_hip",
            "left_knee", "right_knee",
            "left_ankle", "right_ankle",
            "lower_back", "upper_back",
            "core", "forearms",
        ]
        .into_iter()
        .map(String::from)
        .collect();

        Self {
            version: SCHEMA_VERSION,
            move_types,
            tag_types,
            body_parts,
        }
    }
}

fn question(key: &str, prompt: &str, options: &[&str], multi_select: bool) -> Question {
    Question {
        key: key.to_string(),
        prompt: prompt.to_string(),
        options: options.iter().map(|o| o.to_string()).collect(),
        multi_select,
    }
}

// =============================================================================
// Tests
// =============================================================================
