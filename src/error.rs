use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub(crate) enum SimError {
    /// Ropes kept forcing flips past the pass ceiling within one tick.
    #[error("rope propagation did not settle after {passes} passes (mutually forcing ropes)")]
    RopeCycle { passes: usize },
    #[error("rope {rope} references missing seesaw {seesaw}")]
    DanglingRope { rope: usize, seesaw: usize },
    #[error("rope {rope} ties a seesaw to itself")]
    SelfRope { rope: usize },
    #[error("rule {which} is empty")]
    EmptyRule { which: char },
    #[error("rule {which} contains '{ch}', expected only 0 or 1")]
    InvalidRuleBit { which: char, ch: char },
}
