use std::fmt;

/// End of a list a consumer takes from.
///
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Head,
    Tail,
}

impl Direction {
    pub const ALL: [Direction; 2] = [Direction::Head, Direction::Tail];

    /// Stable slot index, head first.
    ///
    #[inline]
    pub fn index(self) -> usize {
        match self {
            Direction::Head => 0,
            Direction::Tail => 1,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Head => f.write_str("head"),
            Direction::Tail => f.write_str("tail"),
        }
    }
}
