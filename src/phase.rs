use std::fmt;

/// Signal shown by the traffic light.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum Phase {
    #[default]
    Red,
    Green,
}

impl Phase {
    /// The phase the light switches to next.
    pub const fn toggled(self) -> Self {
        match self {
            Phase::Red => Phase::Green,
            Phase::Green => Phase::Red,
        }
    }

    pub const fn is_green(self) -> bool {
        matches!(self, Phase::Green)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Red => f.write_str("red"),
            Phase::Green => f.write_str("green"),
        }
    }
}
