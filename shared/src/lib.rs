//! Wire protocol for the word-guessing game.
//!
//! The protocol is line-oriented text: every message, in both directions,
//! is terminated by `\r\n`. This crate holds the exact server→client
//! message catalog plus the protocol constants, so the server, the test
//! client and the integration tests all agree on the bytes on the wire.

/// Line terminator for every protocol message.
pub const TERMINATOR: &str = "\r\n";

/// Maximum bytes a client may accumulate without sending a terminator.
/// Exceeding this disconnects the client.
pub const MAX_LINE_BYTES: usize = 128;

/// Default TCP port the server listens on.
pub const DEFAULT_PORT: u16 = 59042;

/// Default number of guesses per round.
pub const DEFAULT_GUESSES: u32 = 8;

/// Placeholder shown for letters not yet revealed.
pub const PLACEHOLDER: char = '-';

pub const WELCOME: &str = "Welcome! What's your name?\r\n";
pub const YOUR_GUESS: &str = "Your guess?\r\n";
pub const NOT_YOUR_TURN: &str = "It is not your turn.\r\n";
pub const INVALID_GUESS: &str = "Invalid guess. Your guess?\r\n";
pub const ALREADY_GUESSED: &str = "Already guessed. Your guess again?\r\n";
pub const WIN_SELF: &str = "Game over! You win!\r\n\r\n";
pub const NO_GUESSES_LEFT: &str = "No guesses left. Game over.\r\n\r\n";
pub const NEW_GAME: &str = "Let's start a new game\r\n";

/// Broadcast when a pending client picks a valid name.
pub fn joined(name: &str) -> String {
    format!("{} has just joined\r\n", name)
}

/// Broadcast after every applied guess.
pub fn guessed(name: &str, letter: char) -> String {
    format!("{} guesses: {}\r\n", name, letter)
}

/// Sent to the guesser when the letter is absent from the word.
pub fn not_in_word(letter: char) -> String {
    format!("{} is not in the word\r\n", letter)
}

/// Sent to everyone except the turn holder.
pub fn turn(name: &str) -> String {
    format!("It's {}'s turn.\r\n", name)
}

/// Broadcast to everyone except the winner.
pub fn won(name: &str) -> String {
    format!("Game over! {} won!\r\n\r\n", name)
}

/// Broadcast when an active player disconnects.
pub fn goodbye(name: &str) -> String {
    format!("Goodbye {}\r\n", name)
}

/// One-line view of the round: revealed word plus guesses remaining.
pub fn status(revealed: &str, guesses_left: u32) -> String {
    format!("Word: {}, {} guesses remaining\r\n", revealed, guesses_left)
}

/// Parses a submitted guess line: exactly one lowercase ASCII letter.
pub fn parse_guess(line: &str) -> Option<char> {
    let mut chars = line.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if c.is_ascii_lowercase() => Some(c),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_are_terminated() {
        for msg in [
            WELCOME,
            YOUR_GUESS,
            NOT_YOUR_TURN,
            INVALID_GUESS,
            ALREADY_GUESSED,
            NEW_GAME,
        ] {
            assert!(msg.ends_with(TERMINATOR));
        }
        // Round-result messages carry a trailing blank line.
        for msg in [WIN_SELF, NO_GUESSES_LEFT] {
            assert!(msg.ends_with("\r\n\r\n"));
        }
    }

    #[test]
    fn test_formatted_messages() {
        assert_eq!(joined("alice"), "alice has just joined\r\n");
        assert_eq!(guessed("alice", 'x'), "alice guesses: x\r\n");
        assert_eq!(not_in_word('q'), "q is not in the word\r\n");
        assert_eq!(turn("bob"), "It's bob's turn.\r\n");
        assert_eq!(won("bob"), "Game over! bob won!\r\n\r\n");
        assert_eq!(goodbye("carol"), "Goodbye carol\r\n");
        assert_eq!(status("-a--e", 5), "Word: -a--e, 5 guesses remaining\r\n");
    }

    #[test]
    fn test_parse_guess_accepts_single_lowercase_letter() {
        assert_eq!(parse_guess("a"), Some('a'));
        assert_eq!(parse_guess("z"), Some('z'));
    }

    #[test]
    fn test_parse_guess_rejects_everything_else() {
        assert_eq!(parse_guess(""), None);
        assert_eq!(parse_guess("zz"), None);
        assert_eq!(parse_guess("A"), None);
        assert_eq!(parse_guess("1"), None);
        assert_eq!(parse_guess(" a"), None);
        assert_eq!(parse_guess("é"), None);
    }
}
