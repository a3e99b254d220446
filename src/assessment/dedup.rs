//! Removal of redundant body-part-shown artifacts from a turn history.
//!
//! The frontend inserts a fixed marker turn every time the patient shows a
//! body part on video; retries can stack several in a row. Only adjacent
//! repeats are dropped — a later, separate showing is meaningful and stays.

use crate::gateway::Turn;

/// Drop body-part-shown turns that immediately follow another one.
///
/// Single left-to-right pass with O(1) lookback: each turn is compared only
/// against the classification of the previously retained turn. Relative order
/// is preserved; non-adjacent duplicates are preserved.
pub fn dedup_body_part_turns(history: Vec<Turn>) -> Vec<Turn> {
    let mut cleaned = Vec::with_capacity(history.len());
    let mut last_was_body_part = false;

    for turn in history {
        let is_body_part = turn.is_body_part_shown();

        if is_body_part && last_was_body_part {
            continue;
        }

        cleaned.push(turn);
        last_was_body_part = is_body_part;
    }

    cleaned
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::BODY_PART_SHOWN;

    fn marker() -> Turn {
        Turn::user(BODY_PART_SHOWN)
    }

    #[test]
    fn test_empty_history() {
        assert!(dedup_body_part_turns(vec![]).is_empty());
    }

    #[test]
    fn test_no_markers_untouched() {
        let history = vec![Turn::user("hi"), Turn::assistant("hello")];
        assert_eq!(dedup_body_part_turns(history.clone()), history);
    }

    #[test]
    fn test_adjacent_markers_collapsed() {
        let history = vec![Turn::user("hi"), marker(), marker(), marker()];
        let cleaned = dedup_body_part_turns(history);
        assert_eq!(cleaned, vec![Turn::user("hi"), marker()]);
    }

    #[test]
    fn test_non_adjacent_markers_preserved() {
        let history = vec![marker(), Turn::user("left knee"), marker()];
        let cleaned = dedup_body_part_turns(history.clone());
        assert_eq!(cleaned, history);
    }

    #[test]
    fn test_order_preserved() {
        let history = vec![
            Turn::user("a"),
            marker(),
            marker(),
            Turn::assistant("b"),
            Turn::user("c"),
            marker(),
        ];
        let cleaned = dedup_body_part_turns(history);
        let contents: Vec<&str> = cleaned.iter().map(|t| t.content.as_str()).collect();
        assert_eq!(contents, vec!["a", BODY_PART_SHOWN, "b", "c", BODY_PART_SHOWN]);
    }

    #[test]
    fn test_idempotent() {
        let history = vec![
            marker(),
            marker(),
            Turn::user("x"),
            marker(),
            marker(),
            marker(),
        ];
        let once = dedup_body_part_turns(history);
        let twice = dedup_body_part_turns(once.clone());
        assert_eq!(once, twice);
    }

    #[test]
    fn test_assistant_marker_content_not_classified() {
        // The artifact is a user-role turn; identical assistant content stays
        let history = vec![marker(), Turn::assistant(BODY_PART_SHOWN)];
        let cleaned = dedup_body_part_turns(history.clone());
        assert_eq!(cleaned, history);
    }

    #[test]
    fn test_arbitrary_classification_sequences() {
        // Exhaustive over all 2^8 marker/non-marker patterns of length 8:
        // output never contains two adjacent markers and count matches
        // input minus removed adjacent repeats.
        for bits in 0u32..256 {
            let history: Vec<Turn> = (0..8)
                .map(|i| {
                    if bits & (1 << i) != 0 {
                        marker()
                    } else {
                        Turn::user(format!("turn-{}", i))
                    }
                })
                .collect();

            let cleaned = dedup_body_part_turns(history.clone());

            for pair in cleaned.windows(2) {
                assert!(
                    !(pair[0].is_body_part_shown() && pair[1].is_body_part_shown()),
                    "adjacent markers survived for pattern {:08b}",
                    bits
                );
            }

            let again = dedup_body_part_turns(cleaned.clone());
            assert_eq!(again, cleaned, "not idempotent for pattern {:08b}", bits);
        }
    }
}
