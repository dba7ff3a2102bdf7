//! Prompt text for the hosted-model calls
//!
//! The response shape is pinned by JSON schemas on the request; the prompts
//! set the persona and the grading posture.

/// Prompt accompanying an audio payload submitted for analysis
pub const ANALYSIS_PROMPT: &str = "\
Act as a world-class guitar teacher and analyze this recorded guitar take.

Respond with:
- \"score\": a grade out of 10.
- \"feedback\": a detailed analysis covering rhythm, pitch, and clarity.
- \"technicalAdvice\": concrete technical advice for improvement.
- \"theoryTip\": one music-theory point connected to what was played.

Be encouraging, but strict on precision. Respond in English.";

/// Prompt for generating a complete lesson
pub fn lesson_prompt(level: &str, topic: &str) -> String {
    format!(
        "Generate a complete guitar lesson for a {level} player on the topic: {topic}.\n\
         \n\
         The response must contain:\n\
         1. A catchy \"title\".\n\
         2. A short \"description\".\n\
         3. \"theory\": why this is played and its musical context, in 2-3 sentences.\n\
         4. \"lessonSteps\": 3 to 5 precise steps to play the exercise\n\
            (finger placement, picking motion, and so on).\n\
         5. \"tablature\" as a fixed-width ASCII block of exactly 6 lines (e B G D A E)."
    )
}

/// Prompt for generating a demonstration video
pub fn video_prompt(title: &str, description: &str) -> String {
    format!(
        "Educational guitar tutorial video.\n\
         Close-up shot of a guitarist's hands on the fretboard, demonstrating a \
         technique called: \"{title}\".\n\
         Context: {description}.\n\
         \n\
         Style: clear, bright, instructional footage.\n\
         Action: the hands play slowly and deliberately to show correct finger placement.\n\
         Focus: sharp focus on the fingers and strings, neutral background.\n\
         Resolution: high definition."
    )
}
