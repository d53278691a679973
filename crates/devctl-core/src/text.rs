//! OLED text layout.
//!
//! The panel fits 16 characters per line and 4 lines of the 8px font at a
//! 16px line pitch. Messages are truncated to 64 characters, then word
//! wrapped. Words wider than a line are split across lines.

/// Maximum characters per line.
pub const LINE_WIDTH: usize = 16;

/// Maximum number of lines.
pub const MAX_LINES: usize = 4;

/// Maximum characters consumed from a message.
pub const MAX_CHARS: usize = LINE_WIDTH * MAX_LINES;

/// Horizontal offset of message lines.
pub const MESSAGE_X: i32 = 5;

/// Vertical distance between message lines.
pub const LINE_STEP: i32 = 16;

/// Truncate `message` to [`MAX_CHARS`] and wrap it into at most
/// [`MAX_LINES`] lines of at most [`LINE_WIDTH`] characters.
///
/// Runs of spaces collapse to a single break. Anything that does not fit is
/// dropped silently.
pub fn wrap_message(message: &str) -> Vec<String> {
    let truncated: String = message.chars().take(MAX_CHARS).collect();

    let mut lines = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for word in truncated.split(' ').filter(|w| !w.is_empty()) {
        let mut chars: Vec<char> = word.chars().collect();

        while chars.len() > LINE_WIDTH {
            if current_len > 0 {
                lines.push(std::mem::take(&mut current));
                current_len = 0;
            }
            let rest = chars.split_off(LINE_WIDTH);
            lines.push(chars.into_iter().collect());
            chars = rest;
        }

        if chars.is_empty() {
            continue;
        }

        let separator = usize::from(current_len > 0);
        if current_len + separator + chars.len() <= LINE_WIDTH {
            if separator == 1 {
                current.push(' ');
            }
            current.extend(chars.iter());
            current_len += separator + chars.len();
        } else {
            lines.push(std::mem::take(&mut current));
            current_len = chars.len();
            current.extend(chars.iter());
        }
    }

    if current_len > 0 {
        lines.push(current);
    }

    lines.truncate(MAX_LINES);
    lines
}

/// Vertical position of the `index`th message line.
pub fn line_y(index: usize) -> i32 {
    index as i32 * LINE_STEP
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_short_message() {
        assert_eq!(wrap_message("Hello"), vec!["Hello"]);
    }

    #[test]
    fn test_word_wrap() {
        assert_eq!(
            wrap_message("the quick brown fox jumps over the lazy dog"),
            vec!["the quick brown", "fox jumps over", "the lazy dog"]
        );
    }

    #[test]
    fn test_exact_width_fits() {
        assert_eq!(
            wrap_message("abcdefgh abcdefg"),
            vec!["abcdefgh abcdefg"]
        );
    }

    #[test]
    fn test_long_word_is_split() {
        assert_eq!(
            wrap_message("hi abcdefghijklmnopqrstuvwxyz"),
            vec!["hi", "abcdefghijklmnop", "qrstuvwxyz"]
        );
    }

    #[test]
    fn test_truncates_to_four_lines() {
        let message = "a".repeat(200);
        let lines = wrap_message(&message);
        assert_eq!(lines.len(), MAX_LINES);
        assert!(lines.iter().all(|l| l.chars().count() == LINE_WIDTH));
    }

    #[test]
    fn test_wrap_never_exceeds_limits() {
        let samples = [
            "",
            " ",
            "one",
            "   spaced    out   words   ",
            "aaaaaaaaaaaaaaaaa b cccccccccccccccccccccccccccccccc d e f",
            "x x x x x x x x x x x x x x x x x x x x x x x x x x x x x x x x x x x x x x",
            "héllo wörld ünïcode çharacters everywhere in this message",
        ];

        for sample in samples {
            let lines = wrap_message(sample);
            assert!(lines.len() <= MAX_LINES, "{sample:?}");
            assert!(
                lines.iter().all(|l| l.chars().count() <= LINE_WIDTH),
                "{sample:?}"
            );
            let consumed: usize = lines
                .iter()
                .map(|l| l.chars().filter(|c| *c != ' ').count())
                .sum();
            assert!(consumed <= MAX_CHARS, "{sample:?}");
        }
    }

    #[test]
    fn test_empty_message() {
        assert!(wrap_message("").is_empty());
        assert!(wrap_message("    ").is_empty());
    }

    #[test]
    fn test_line_positions() {
        assert_eq!(line_y(0), 0);
        assert_eq!(line_y(3), 48);
    }
}
