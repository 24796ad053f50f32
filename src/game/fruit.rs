//! Falling fruit: the catalog and the per-object state

use rand::Rng;

/// Kinds of fruit that can spawn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FruitKind {
    Apple,
    Orange,
    Banana,
    Watermelon,
    Pineapple,
    Grapes,
}

/// Visual symbol and horizontal speed per kind
#[derive(Debug, Clone, Copy)]
pub struct FruitStats {
    pub symbol: &'static str,
    /// Units per step
    pub speed: f32,
}

impl FruitKind {
    pub const ALL: [FruitKind; 6] = [
        FruitKind::Apple,
        FruitKind::Orange,
        FruitKind::Banana,
        FruitKind::Watermelon,
        FruitKind::Pineapple,
        FruitKind::Grapes,
    ];

    pub fn stats(self) -> FruitStats {
        match self {
            FruitKind::Apple => FruitStats {
                symbol: "🍎",
                speed: 2.0,
            },
            FruitKind::Orange => FruitStats {
                symbol: "🍊",
                speed: 2.5,
            },
            FruitKind::Banana => FruitStats {
                symbol: "🍌",
                speed: 3.0,
            },
            FruitKind::Watermelon => FruitStats {
                symbol: "🍉",
                speed: 1.5,
            },
            FruitKind::Pineapple => FruitStats {
                symbol: "🍍",
                speed: 2.2,
            },
            FruitKind::Grapes => FruitStats {
                symbol: "🍇",
                speed: 2.8,
            },
        }
    }

    pub fn symbol(self) -> &'static str {
        self.stats().symbol
    }

    /// Uniform pick from the catalog
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self::ALL[rng.gen_range(0..Self::ALL.len())]
    }
}

/// A fruit on the surface
#[derive(Debug, Clone)]
pub struct Fruit {
    pub kind: FruitKind,
    pub x: f32,
    pub y: f32,
    pub vel_x: f32,
    pub vel_y: f32,
    pub width: f32,
    pub height: f32,
    /// Cut fruit is inert to slashes but keeps falling until it leaves the surface
    pub cut: bool,
    /// Seconds since the cut
    pub cut_time: f32,
}

impl Fruit {
    pub fn new(kind: FruitKind, x: f32, y: f32, size: f32) -> Self {
        Self {
            kind,
            x,
            y,
            vel_x: kind.stats().speed,
            vel_y: 0.0,
            width: size,
            height: size,
            cut: false,
            cut_time: 0.0,
        }
    }

    /// Mark as cut. Returns false if it was already cut.
    pub fn mark_cut(&mut self) -> bool {
        if self.cut {
            return false;
        }
        self.cut = true;
        self.cut_time = 0.0;
        true
    }
}
