//! Final clean-up of the reduced summary.

use super::sanitize::collapse_repeats;

/// Marker appended when the summary had to be cut.
pub const ELLIPSIS: &str = "…";

/// Remove repeats introduced by the model and enforce the hard length ceiling.
///
/// The result is at most `max_length + 1` characters: a cut summary ends at a word boundary
/// (when one exists) followed by [`ELLIPSIS`].
pub fn finalize(text: &str, max_length: usize) -> String {
    let cleaned = collapse_repeats(text);
    let Some((cut, next)) = cleaned
        .char_indices()
        .nth(max_length)
        .map(|(offset, next)| (&cleaned[..offset], next))
    else {
        return cleaned;
    };

    let kept = if next.is_whitespace() {
        cut
    } else {
        match cut.rfind(char::is_whitespace) {
            Some(position) if position > 0 => &cut[..position],
            _ => cut,
        }
    };
    format!("{}{ELLIPSIS}", kept.trim_end())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_text_is_returned_cleaned() {
        assert_eq!(finalize("Fine fine fine result.", 100), "Fine result.");
    }

    #[test]
    fn long_text_is_cut_at_word_boundary() {
        let result = finalize("The council approved the budget yesterday", 20);
        assert_eq!(result, "The council approved…");
        assert!(result.chars().count() <= 21);
    }

    #[test]
    fn cut_backs_up_from_partial_word() {
        assert_eq!(finalize("alpha beta gamma", 8), "alpha…");
    }

    #[test]
    fn text_without_whitespace_is_hard_cut() {
        assert_eq!(finalize("abcdefghij", 4), "abcd…");
    }

    #[test]
    fn output_never_exceeds_max_plus_one() {
        let text = "Zażółć gęślą jaźń w nowym budżecie miasta na przyszły rok. ".repeat(5);
        for max in [1, 7, 30, 99] {
            assert!(finalize(&text, max).chars().count() <= max + 1);
        }
    }

    #[test]
    fn exact_length_is_not_cut() {
        assert_eq!(finalize("abcd", 4), "abcd");
    }
}
