//! Lesson content: the exercise catalog and gateway-generated lessons
//!
//! Exercises are either shipped with the app (the starter catalog) or
//! produced by the lesson gateway. Identity is an opaque string id; the lock
//! flag is display-time state cleared wholesale by the premium upgrade.

use serde::Deserialize;

/// Difficulty grades used across the catalog
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
pub enum Difficulty {
    Beginner,
    Intermediate,
    Advanced,
}

impl std::fmt::Display for Difficulty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Difficulty::Beginner => write!(f, "Beginner"),
            Difficulty::Intermediate => write!(f, "Intermediate"),
            Difficulty::Advanced => write!(f, "Advanced"),
        }
    }
}

/// Contract bounds for a generated lesson
pub const MIN_LESSON_STEPS: usize = 3;
pub const MAX_LESSON_STEPS: usize = 5;
pub const TABLATURE_LINES: usize = 6;

/// A lesson as produced by the generation gateway
///
/// Field names follow the gateway's JSON response schema.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonRecord {
    pub title: String,
    pub difficulty: Difficulty,
    pub description: String,
    pub theory: String,
    pub lesson_steps: Vec<String>,
    pub tablature: String,
}

impl LessonRecord {
    /// Check the record against the generation contract: 3–5 ordered steps
    /// and a six-line tablature block. Returns the violation, if any.
    pub fn contract_violation(&self) -> Option<String> {
        let steps = self.lesson_steps.len();
        if !(MIN_LESSON_STEPS..=MAX_LESSON_STEPS).contains(&steps) {
            return Some(format!(
                "expected {MIN_LESSON_STEPS}-{MAX_LESSON_STEPS} lesson steps, got {steps}"
            ));
        }
        let lines = self.tablature.lines().count();
        if lines != TABLATURE_LINES {
            return Some(format!(
                "expected {TABLATURE_LINES} tablature lines, got {lines}"
            ));
        }
        None
    }
}

/// One exercise in the catalog
#[derive(Clone, Debug)]
pub struct Exercise {
    pub id: String,
    pub title: String,
    pub difficulty: Difficulty,
    pub description: String,
    pub theory: String,
    pub lesson_steps: Vec<String>,
    pub tablature: String,
    pub is_locked: bool,
    pub video_uri: Option<String>,
}

impl Exercise {
    /// Wrap a generated lesson into a catalog entry
    ///
    /// Generated lessons are never locked; the user paid for them with quota
    /// or holds premium.
    pub fn from_record(id: impl Into<String>, record: LessonRecord) -> Self {
        Self {
            id: id.into(),
            title: record.title,
            difficulty: record.difficulty,
            description: record.description,
            theory: record.theory,
            lesson_steps: record.lesson_steps,
            tablature: record.tablature,
            is_locked: false,
            video_uri: None,
        }
    }
}

/// Topics rotated through when the user asks for a generated lesson
pub const LESSON_TOPICS: [&str; 6] = [
    "Arpeggios",
    "Power Chords",
    "Funk Rhythms",
    "Blues Licks",
    "Fingerpicking",
    "Sweep Picking",
];

/// The catalog shipped with the app
///
/// One free exercise and one source-marked-locked exercise, so the lock and
/// upgrade paths are exercised out of the box.
pub fn starter_exercises() -> Vec<Exercise> {
    vec![
        Exercise {
            id: "ex-spider".to_string(),
            title: "Spider Walk Warmup".to_string(),
            difficulty: Difficulty::Beginner,
            description: "Four-finger chromatic runs to wake up both hands.".to_string(),
            theory: "Chromatic warmups carry no melodic content on purpose: the goal is \
                     finger independence and left/right hand synchronization, one fret per \
                     finger, before any real material."
                .to_string(),
            lesson_steps: vec![
                "Index finger on the low E string, 1st fret; play the note cleanly.".to_string(),
                "Add middle, ring, and pinky on frets 2-4 without lifting earlier fingers."
                    .to_string(),
                "Move to the A string and repeat, keeping strict alternate picking.".to_string(),
                "Work up to the high E string, thumb centered behind the neck.".to_string(),
            ],
            tablature: "e|-------------------------1-2-3-4-|\n\
                        B|-----------------1-2-3-4---------|\n\
                        G|---------1-2-3-4-----------------|\n\
                        D|-1-2-3-4-------------------------|\n\
                        A|---------------------------------|\n\
                        E|-1-2-3-4-------------------------|"
                .to_string(),
            is_locked: false,
            video_uri: None,
        },
        Exercise {
            id: "ex-pentatonic".to_string(),
            title: "A Minor Pentatonic, Box One".to_string(),
            difficulty: Difficulty::Beginner,
            description: "The workhorse scale shape for rock and blues soloing.".to_string(),
            theory: "The minor pentatonic keeps five notes per octave, dropping the scale \
                     degrees that clash over a standard blues progression. That is why every \
                     note in the box sounds usable: there is nothing to avoid."
                .to_string(),
            lesson_steps: vec![
                "Anchor the index finger at the 5th fret of the low E string.".to_string(),
                "Pinky takes the 8th fret on the E and B strings.".to_string(),
                "Ring finger covers the 7th fret on the A, D, and G strings.".to_string(),
                "Ascend and descend slowly with alternate picking until the shape is \
                 automatic."
                    .to_string(),
            ],
            tablature: "e|---------------------5-8-|\n\
                        B|-----------------5-8-----|\n\
                        G|-------------5-7---------|\n\
                        D|---------5-7-------------|\n\
                        A|-----5-7-----------------|\n\
                        E|-5-8---------------------|"
                .to_string(),
            is_locked: true,
            video_uri: None,
        },
    ]
}
