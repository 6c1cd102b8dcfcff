use super::*;
use crate::text::fonts::FontBook;

// Block face at 20px: every character is 10px wide.
fn check<F: FnOnce(&mut crate::text::fonts::SizedFont<'_>)>(f: F) {
    let mut book = FontBook::builtin_only();
    let face = book.resolve("body");
    let mut font = book.sized(&face, 20.0);
    f(&mut font);
}

const LOREM: &str = "Lorem ipsum dolor sit amet, consectetur adipiscing elit, sed do eiusmod \
tempor incididunt ut labore et dolore magna aliqua. Ut enim ad minim veniam, quis nostrud \
exercitation ullamco laboris nisi ut aliquip ex ea commodo consequat. Supercalifragilisticexpialidocious.";

#[test]
fn greedy_fill_breaks_before_overflow() {
    check(|font| {
        assert_eq!(
            wrap_text("aaaa bbbb cccc", font, 100.0),
            vec!["aaaa bbbb".to_string(), "cccc".to_string()]
        );
    });
}

#[test]
fn exact_fit_stays_on_one_line() {
    check(|font| {
        assert_eq!(wrap_text("aaaa bbbbb", font, 100.0), vec!["aaaa bbbbb"]);
    });
}

#[test]
fn empty_and_whitespace_yield_single_empty_line() {
    check(|font| {
        assert_eq!(wrap_text("", font, 100.0), vec![String::new()]);
        assert_eq!(wrap_text("  \n\t ", font, 100.0), vec![String::new()]);
    });
}

#[test]
fn oversized_word_splits_into_fitting_chunks() {
    check(|font| {
        assert_eq!(
            wrap_text("abcdefghijklmnopqrstuvwxy", font, 100.0),
            vec!["abcdefghij", "klmnopqrst", "uvwxy"]
        );
    });
}

#[test]
fn split_remainder_accepts_following_words() {
    check(|font| {
        assert_eq!(
            wrap_text("abcdefghijklm no", font, 100.0),
            vec!["abcdefghij", "klm no"]
        );
    });
}

#[test]
fn character_wider_than_line_gets_its_own_line() {
    check(|font| {
        assert_eq!(wrap_text("abc", font, 5.0), vec!["a", "b", "c"]);
    });
}

#[test]
fn no_line_exceeds_width() {
    check(|font| {
        for width in [50.0f32, 95.0, 180.0, 333.0, 880.0] {
            for line in wrap_text(LOREM, font, width) {
                assert!(
                    font.text_width(&line) <= width,
                    "line {line:?} exceeds {width}"
                );
            }
        }
    });
}

#[test]
fn rewrapping_is_idempotent() {
    check(|font| {
        let lines = wrap_text(LOREM, font, 240.0);
        for line in &lines {
            assert_eq!(&wrap_text(line, font, 240.0), &vec![line.clone()]);
        }
        assert_eq!(wrap_text(&lines.join(" "), font, 240.0), lines);
    });
}

#[test]
fn two_paragraphs_get_exactly_one_break_between() {
    check(|font| {
        let text = "First paragraph is here.\n\nSecond one follows it.";
        let lines = wrap_paragraphs(text, font, 150.0);
        let breaks: Vec<usize> = lines
            .iter()
            .enumerate()
            .filter(|(_, l)| l.is_paragraph_break())
            .map(|(i, _)| i)
            .collect();
        assert_eq!(breaks.len(), 1);
        let b = breaks[0];
        assert!(b > 0 && b < lines.len() - 1);
        assert!(lines[..b].iter().all(|l| l.as_text().is_some()));
        assert!(lines[b + 1..].iter().all(|l| l.as_text().is_some()));
        assert_eq!(lines.first().and_then(LayoutLine::as_text), Some("First paragraph"));
    });
}

#[test]
fn blank_paragraphs_and_crlf_are_collapsed() {
    check(|font| {
        let text = "one\r\n\r\n\n\n   \n\ntwo\n\n";
        let lines = wrap_paragraphs(text, font, 500.0);
        assert_eq!(
            lines,
            vec![
                LayoutLine::Text("one".to_string()),
                LayoutLine::ParagraphBreak,
                LayoutLine::Text("two".to_string()),
            ]
        );
    });
}

#[test]
fn empty_body_yields_single_empty_text_line() {
    check(|font| {
        assert_eq!(
            wrap_paragraphs("\n\n", font, 500.0),
            vec![LayoutLine::Text(String::new())]
        );
    });
}
