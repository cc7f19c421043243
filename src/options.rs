//! Game configuration options.

/// Configuration options for a Hearts game.
///
/// Use the builder pattern to customize options:
///
/// ```
/// use hearts_sync::GameOptions;
///
/// let options = GameOptions::default()
///     .with_end_score(50)
///     .with_follow_suit(false);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameOptions {
    /// Cumulative score at which the game ends.
    pub end_score: u32,
    /// Number of cards each seat passes.
    pub pass_count: usize,
    /// Whether a player holding the led suit must follow it.
    pub follow_suit: bool,
    /// Whether the holder of the two of clubs leads the first trick.
    pub two_of_clubs_leads: bool,
}

impl Default for GameOptions {
    fn default() -> Self {
        Self {
            end_score: 100,
            pass_count: 3,
            follow_suit: true,
            two_of_clubs_leads: true,
        }
    }
}

impl GameOptions {
    /// Sets the end-of-game score threshold.
    ///
    /// # Example
    ///
    /// ```
    /// use hearts_sync::GameOptions;
    ///
    /// let options = GameOptions::default().with_end_score(50);
    /// assert_eq!(options.end_score, 50);
    /// ```
    #[must_use]
    pub const fn with_end_score(mut self, end_score: u32) -> Self {
        self.end_score = end_score;
        self
    }

    /// Sets the number of cards passed per seat.
    #[must_use]
    pub const fn with_pass_count(mut self, pass_count: usize) -> Self {
        self.pass_count = pass_count;
        self
    }

    /// Sets whether players must follow the led suit.
    #[must_use]
    pub const fn with_follow_suit(mut self, follow_suit: bool) -> Self {
        self.follow_suit = follow_suit;
        self
    }

    /// Sets whether the two of clubs leads the first trick.
    ///
    /// When disabled, any seat may lead the first trick of a round.
    #[must_use]
    pub const fn with_two_of_clubs_leads(mut self, two_of_clubs_leads: bool) -> Self {
        self.two_of_clubs_leads = two_of_clubs_leads;
        self
    }
}
