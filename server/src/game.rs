//! The shared word puzzle and the turn scheduler.
//!
//! One `GameState` exists per process (single room). Rounds reset the
//! puzzle but never the turn holder: whoever's turn it was keeps it into
//! the next round, and the active group membership outlives any round.

use log::warn;
use shared::PLACEHOLDER;

/// Outcome of applying a new valid letter to the round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuessOutcome {
    /// The reveal buffer now equals the target word.
    Win,
    /// The guess counter reached zero without completing the word.
    /// `hit` says whether the final letter was in the word.
    Exhausted { hit: bool },
    /// Round continues; `hit` says whether the letter was in the word.
    Continue { hit: bool },
}

impl GuessOutcome {
    /// Whether the guessed letter appears in the word.
    pub fn hit(&self) -> bool {
        match *self {
            GuessOutcome::Win => true,
            GuessOutcome::Exhausted { hit } | GuessOutcome::Continue { hit } => hit,
        }
    }
}

#[derive(Debug, Clone)]
pub struct GameState {
    /// Target word, lowercase ASCII letters only.
    word: String,
    /// Same-length view of the word, placeholder where unguessed.
    revealed: Vec<u8>,
    /// One flag per letter of the alphabet.
    guessed: [bool; 26],
    guesses_left: u32,
    guess_budget: u32,
    /// Id of the active player whose turn it is. None iff the active
    /// group is empty.
    turn: Option<u32>,
}

impl GameState {
    pub fn new(guess_budget: u32) -> Self {
        Self {
            word: String::new(),
            revealed: Vec::new(),
            guessed: [false; 26],
            guesses_left: guess_budget,
            guess_budget,
            turn: None,
        }
    }

    /// Resets the puzzle for a new round. The turn holder is untouched.
    pub fn start_round(&mut self, word: &str) {
        debug_assert!(word.bytes().all(|b| b.is_ascii_lowercase()));
        self.word = word.to_string();
        self.revealed = vec![PLACEHOLDER as u8; word.len()];
        self.guessed = [false; 26];
        self.guesses_left = self.guess_budget;
    }

    pub fn is_guessed(&self, letter: char) -> bool {
        self.guessed[(letter as u8 - b'a') as usize]
    }

    /// Applies a new valid letter and decides the round outcome.
    ///
    /// Callers must have validated the letter: a single lowercase ASCII
    /// character not previously guessed. The counter decrements whether
    /// the letter hits or misses; a win on the final guess takes priority
    /// over exhaustion.
    pub fn apply_guess(&mut self, letter: char) -> GuessOutcome {
        debug_assert!(letter.is_ascii_lowercase());
        debug_assert!(!self.is_guessed(letter));

        self.guessed[(letter as u8 - b'a') as usize] = true;

        // Reveal positions move in lock-step with the guessed flag.
        let mut hit = false;
        for (i, b) in self.word.bytes().enumerate() {
            if b == letter as u8 {
                self.revealed[i] = b;
                hit = true;
            }
        }

        self.guesses_left = self.guesses_left.saturating_sub(1);

        if self.revealed == self.word.as_bytes() {
            GuessOutcome::Win
        } else if self.guesses_left == 0 {
            GuessOutcome::Exhausted { hit }
        } else {
            GuessOutcome::Continue { hit }
        }
    }

    /// The reveal buffer as shown to players.
    pub fn revealed_word(&self) -> String {
        String::from_utf8_lossy(&self.revealed).into_owned()
    }

    pub fn guesses_left(&self) -> u32 {
        self.guesses_left
    }

    pub fn turn(&self) -> Option<u32> {
        self.turn
    }

    /// Hands the turn to a specific player (the first-ever joiner).
    pub fn set_turn(&mut self, id: u32) {
        self.turn = Some(id);
    }

    pub fn clear_turn(&mut self) {
        self.turn = None;
    }

    /// Moves the turn to the next player in `order` after the current
    /// holder, wrapping at the end. An empty order clears the turn.
    ///
    /// Callers advancing ahead of a removal pass the pre-removal order,
    /// so the current holder is still present in it.
    pub fn advance_turn(&mut self, order: &[u32]) {
        if order.is_empty() {
            self.turn = None;
            return;
        }
        let Some(current) = self.turn else {
            self.turn = Some(order[0]);
            return;
        };
        match order.iter().position(|&id| id == current) {
            Some(i) => self.turn = Some(order[(i + 1) % order.len()]),
            None => {
                // Should not happen: the holder is advanced before any
                // removal. Recover by restarting the cycle.
                warn!("turn holder {} missing from active group", current);
                self.turn = Some(order[0]);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn game(word: &str, budget: u32) -> GameState {
        let mut g = GameState::new(budget);
        g.start_round(word);
        g
    }

    #[test]
    fn test_round_starts_fully_hidden() {
        let g = game("apple", 8);
        assert_eq!(g.revealed_word(), "-----");
        assert_eq!(g.guesses_left(), 8);
        assert!(!g.is_guessed('a'));
    }

    #[test]
    fn test_hit_reveals_every_matching_position() {
        let mut g = game("apple", 8);
        assert_eq!(g.apply_guess('p'), GuessOutcome::Continue { hit: true });
        assert_eq!(g.revealed_word(), "-pp--");
        assert!(g.is_guessed('p'));
        assert_eq!(g.guesses_left(), 7);
    }

    #[test]
    fn test_miss_decrements_but_reveals_nothing() {
        let mut g = game("apple", 8);
        assert_eq!(g.apply_guess('z'), GuessOutcome::Continue { hit: false });
        assert_eq!(g.revealed_word(), "-----");
        assert_eq!(g.guesses_left(), 7);
    }

    #[test]
    fn test_guessing_every_letter_wins() {
        let mut g = game("apple", 8);
        assert_eq!(g.apply_guess('a'), GuessOutcome::Continue { hit: true });
        assert_eq!(g.apply_guess('p'), GuessOutcome::Continue { hit: true });
        assert_eq!(g.apply_guess('l'), GuessOutcome::Continue { hit: true });
        assert_eq!(g.apply_guess('e'), GuessOutcome::Win);
        assert_eq!(g.revealed_word(), "apple");
    }

    #[test]
    fn test_budget_exhaustion() {
        let mut g = game("cat", 1);
        assert_eq!(g.apply_guess('z'), GuessOutcome::Exhausted { hit: false });
        assert_eq!(g.guesses_left(), 0);
    }

    #[test]
    fn test_hit_can_exhaust_without_winning() {
        let mut g = game("cat", 1);
        assert_eq!(g.apply_guess('c'), GuessOutcome::Exhausted { hit: true });
    }

    #[test]
    fn test_win_takes_priority_over_exhaustion() {
        let mut g = game("cat", 3);
        g.apply_guess('c');
        g.apply_guess('a');
        // Final guess both completes the word and empties the counter.
        assert_eq!(g.apply_guess('t'), GuessOutcome::Win);
        assert_eq!(g.guesses_left(), 0);
    }

    #[test]
    fn test_new_round_resets_puzzle_but_not_turn() {
        let mut g = game("cat", 2);
        g.set_turn(7);
        g.apply_guess('c');
        g.start_round("zebra");
        assert_eq!(g.revealed_word(), "-----");
        assert_eq!(g.guesses_left(), 2);
        assert!(!g.is_guessed('c'));
        assert_eq!(g.turn(), Some(7));
    }

    #[test]
    fn test_advance_turn_cycles_in_order() {
        let mut g = game("cat", 8);
        let order = [3, 2, 1];
        g.set_turn(3);
        g.advance_turn(&order);
        assert_eq!(g.turn(), Some(2));
        g.advance_turn(&order);
        assert_eq!(g.turn(), Some(1));
        g.advance_turn(&order);
        assert_eq!(g.turn(), Some(3));
    }

    #[test]
    fn test_advance_turn_empty_group_clears() {
        let mut g = game("cat", 8);
        g.set_turn(1);
        g.advance_turn(&[]);
        assert_eq!(g.turn(), None);
    }

    #[test]
    fn test_advance_turn_single_member_stays() {
        let mut g = game("cat", 8);
        g.set_turn(5);
        g.advance_turn(&[5]);
        assert_eq!(g.turn(), Some(5));
    }

    #[test]
    fn test_advance_turn_with_no_holder_picks_head() {
        let mut g = game("cat", 8);
        g.advance_turn(&[9, 8]);
        assert_eq!(g.turn(), Some(9));
    }
}
