//! Constants for board geometry, game termination, and text symbols.
//!
//! Unlike a fixed-size playout engine, board size here is chosen per game at
//! runtime and validated against [`SUPPORTED_SIZES`].

// =============================================================================
// Board Geometry
// =============================================================================

/// Board sizes a game may be created with. Standard Go sizes are 9, 13, or 19.
pub const SUPPORTED_SIZES: [usize; 3] = [9, 13, 19];

/// Board size used when a caller does not pick one.
pub const DEFAULT_SIZE: usize = 9;

/// Largest supported board side, used to size GTP vertex parsing.
pub const MAX_SIZE: usize = 19;

/// Returns `true` if `size` is one of the supported board sizes.
pub fn is_supported_size(size: usize) -> bool {
    SUPPORTED_SIZES.contains(&size)
}

// =============================================================================
// Game Termination
// =============================================================================

/// Consecutive passes that end the game.
pub const PASSES_TO_END: u8 = 2;

// =============================================================================
// Text Symbols
// =============================================================================

/// Black stone in text renderings.
pub const SYMBOL_BLACK: char = 'X';

/// White stone in text renderings.
pub const SYMBOL_WHITE: char = 'O';

/// Empty point in text renderings.
pub const SYMBOL_EMPTY: char = '.';

/// GTP column letters. `I` is skipped to avoid confusion with `J`.
pub const COLUMN_LETTERS: &[u8; MAX_SIZE] = b"ABCDEFGHJKLMNOPQRST";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_supported_sizes() {
        assert!(is_supported_size(9));
        assert!(is_supported_size(13));
        assert!(is_supported_size(19));
        assert!(!is_supported_size(0));
        assert!(!is_supported_size(7));
        assert!(!is_supported_size(21));
        assert!(is_supported_size(DEFAULT_SIZE));
    }

    #[test]
    fn test_column_letters_skip_i() {
        assert!(!COLUMN_LETTERS.contains(&b'I'));
        assert_eq!(COLUMN_LETTERS[8], b'J');
    }
}
