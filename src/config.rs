/// How DRW reports a collision in VF.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CollisionFlag {
    /// VF is rewritten for every sprite bit, so only the last bit drawn
    /// (bottom row, rightmost column) decides the final value.
    LastBit,
    /// VF is 1 if any pixel of the sprite was erased.
    AnyPixel,
}

impl Default for CollisionFlag {
    fn default() -> Self {
        CollisionFlag::LastBit
    }
}

/// Behaviours where interpreters disagree.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Quirks {
    pub collision: CollisionFlag,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Config {
    pub quirks: Quirks,
    /// Seed for RND; `None` seeds from the OS.
    pub seed: Option<u64>,
}

impl Config {
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_collision(mut self, collision: CollisionFlag) -> Self {
        self.quirks.collision = collision;
        self
    }
}
