//! Lightweight structural checks on model output.
//!
//! The single-question and six-section rules are prompt instructions, not
//! guarantees. These helpers measure how well the model followed them so the
//! caller can log a warning; they never reject output.

/// Number of sections a summary is asked to contain.
pub const EXPECTED_SUMMARY_SECTIONS: usize = 6;

/// Counts question marks, ASCII and full-width.
pub fn count_questions(text: &str) -> usize {
    text.chars().filter(|c| matches!(c, '?' | '？')).count()
}

/// Counts lines that start with an enumeration marker such as `1.`, `2)` or
/// `3．`.
pub fn count_enumerated_sections(text: &str) -> usize {
    text.lines().filter(|line| is_enumerated(line)).count()
}

fn is_enumerated(line: &str) -> bool {
    let line = line.trim_start();
    let digits = line.chars().take_while(char::is_ascii_digit).count();
    if digits == 0 {
        return false;
    }
    matches!(line[digits..].chars().next(), Some('.' | ')' | '．' | '、'))
}
