//! Minimum-length gate between extraction and the model call.
//!
//! Image-only exports (slides saved as pictures) extract to nothing or to a
//! few stray characters. Sending that to the model yields a confident but
//! meaningless scorecard, so such decks stop here.

use super::extract::ExtractedDeck;
use crate::error::ScorerError;
use tracing::debug;

/// Default minimum number of characters.
pub const DEFAULT_MIN_TEXT_CHARS: usize = 50;

/// Pass `deck` through when its trimmed text has at least `min_chars` characters.
pub fn check_extracted(deck: ExtractedDeck, min_chars: usize) -> Result<ExtractedDeck, ScorerError> {
    let chars = deck.char_count();
    if chars < min_chars {
        return Err(ScorerError::EmptyContent {
            source_name: deck.source_name,
            chars,
            min_chars,
        });
    }
    debug!("'{}' passed the content gate ({} chars)", deck.source_name, chars);
    Ok(deck)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::extract::DeckFormat;

    fn deck(text: &str) -> ExtractedDeck {
        ExtractedDeck {
            raw_text: text.to_string(),
            format: DeckFormat::Pdf,
            source_name: "deck.pdf".into(),
        }
    }

    #[test]
    fn boundary_49_fails_50_passes() {
        let err = check_extracted(deck(&"x".repeat(49)), 50).unwrap_err();
        assert!(matches!(err, ScorerError::EmptyContent { chars: 49, .. }));
        assert!(check_extracted(deck(&"x".repeat(50)), 50).is_ok());
    }

    #[test]
    fn surrounding_whitespace_does_not_count() {
        let text = format!("\n\n   {}   \n", "x".repeat(49));
        assert!(check_extracted(deck(&text), 50).is_err());
    }

    #[test]
    fn counts_characters_not_bytes() {
        assert!(check_extracted(deck(&"é".repeat(50)), 50).is_ok());
        assert!(check_extracted(deck(&"é".repeat(30)), 50).is_err());
    }

    #[test]
    fn empty_deck_reports_zero() {
        let err = check_extracted(deck("  \n "), 50).unwrap_err();
        assert!(matches!(err, ScorerError::EmptyContent { chars: 0, .. }));
        assert!(err.to_string().contains("No extractable text"));
    }
}
