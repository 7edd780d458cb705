//! Classifies a wrong answer into an [`ErrorType`] and records it on the item.

use crate::types::{ErrorExample, ErrorPattern, ErrorType, MasteryRecord, MAX_PATTERN_EXAMPLES};

/// Letters learners commonly swap: same skeleton with different dots, or close articulation.
const CONFUSABLE_GROUPS: &[&[char]] = &[
    &['ب', 'ت', 'ث', 'ن', 'ي'],
    &['ج', 'ح', 'خ'],
    &['د', 'ذ'],
    &['ر', 'ز'],
    &['س', 'ش', 'ص'],
    &['ص', 'ض'],
    &['ت', 'ط'],
    &['ط', 'ظ'],
    &['ذ', 'ز', 'ظ'],
    &['ع', 'غ', 'ء'],
    &['ف', 'ق'],
    &['ق', 'ك'],
    &['ه', 'ة'],
    &['ا', 'أ', 'إ', 'آ'],
];

fn is_diacritic(c: char) -> bool {
    matches!(c, '\u{064B}'..='\u{065F}' | '\u{0670}' | '\u{0640}')
}

pub fn strip_tashkeel(text: &str) -> String {
    text.chars().filter(|c| !is_diacritic(*c)).collect()
}

pub fn has_tashkeel(text: &str) -> bool {
    text.chars().any(is_diacritic)
}

fn confusable(a: char, b: char) -> bool {
    CONFUSABLE_GROUPS
        .iter()
        .any(|group| group.contains(&a) && group.contains(&b))
}

/// `None` when the answers match exactly.
pub fn detect_error_type(expected: &str, actual: &str) -> Option<ErrorType> {
    let expected = expected.trim();
    let actual = actual.trim();
    if expected == actual {
        return None;
    }

    let bare_expected = strip_tashkeel(expected);
    let bare_actual = strip_tashkeel(actual);
    if bare_expected == bare_actual {
        return Some(if has_tashkeel(actual) {
            ErrorType::WrongTashkeel
        } else {
            ErrorType::MissingTashkeel
        });
    }

    let e: Vec<char> = bare_expected.chars().collect();
    let a: Vec<char> = bare_actual.chars().collect();
    if e.len() == a.len() {
        let mut diffs = e.iter().zip(&a).filter(|(x, y)| x != y).peekable();
        if diffs.peek().is_some() && diffs.all(|(x, y)| confusable(*x, *y)) {
            return Some(ErrorType::LetterConfusion);
        }
    }

    let mut expected_words: Vec<&str> = bare_expected.split_whitespace().collect();
    let mut actual_words: Vec<&str> = bare_actual.split_whitespace().collect();
    if expected_words.len() > 1 {
        expected_words.sort_unstable();
        actual_words.sort_unstable();
        if expected_words == actual_words {
            return Some(ErrorType::WordOrder);
        }
    }

    Some(ErrorType::WrongWord)
}

/// Bumps (or creates) the pattern for `error_type`, keeping the newest examples first.
pub fn record_error_pattern(
    record: &mut MasteryRecord,
    error_type: ErrorType,
    example: Option<ErrorExample>,
    now_ms: i64,
) {
    let idx = match record
        .error_patterns
        .iter()
        .position(|p| p.error_type == error_type)
    {
        Some(idx) => idx,
        None => {
            record.error_patterns.push(ErrorPattern {
                error_type,
                count: 0,
                last_occurred: now_ms,
                examples: Vec::new(),
            });
            record.error_patterns.len() - 1
        }
    };

    let pattern = &mut record.error_patterns[idx];
    pattern.count = pattern.count.saturating_add(1);
    pattern.last_occurred = now_ms;
    if let Some(example) = example {
        pattern.examples.insert(0, example);
        pattern.examples.truncate(MAX_PATTERN_EXAMPLES);
    }
}
