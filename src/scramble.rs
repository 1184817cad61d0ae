use rand::Rng;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Standard length for a 3x3 scramble
pub const DEFAULT_SCRAMBLE_LENGTH: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum_macros::Display)]
pub enum Face {
    R,
    L,
    U,
    D,
    F,
    B,
}

impl Face {
    pub const ALL: [Face; 6] = [Face::R, Face::L, Face::U, Face::D, Face::F, Face::B];

    /// The face on the same axis
    pub fn opposite(self) -> Face {
        match self {
            Face::R => Face::L,
            Face::L => Face::R,
            Face::U => Face::D,
            Face::D => Face::U,
            Face::F => Face::B,
            Face::B => Face::F,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Modifier {
    Clockwise,
    Inverse,
    Double,
}

impl Modifier {
    pub const ALL: [Modifier; 3] = [Modifier::Clockwise, Modifier::Inverse, Modifier::Double];

    fn suffix(self) -> &'static str {
        match self {
            Modifier::Clockwise => "",
            Modifier::Inverse => "'",
            Modifier::Double => "2",
        }
    }
}

/// A single token such as `R`, `U'` or `F2`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Move {
    pub face: Face,
    pub modifier: Modifier,
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.face, self.modifier.suffix())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ScrambleError {
    #[error("invalid move token: {0:?}")]
    InvalidToken(String),
}

impl FromStr for Move {
    type Err = ScrambleError;

    fn from_str(token: &str) -> Result<Self, Self::Err> {
        let mut chars = token.chars();
        let face = match chars.next() {
            Some('R') => Face::R,
            Some('L') => Face::L,
            Some('U') => Face::U,
            Some('D') => Face::D,
            Some('F') => Face::F,
            Some('B') => Face::B,
            _ => return Err(ScrambleError::InvalidToken(token.to_string())),
        };
        let modifier = match chars.as_str() {
            "" => Modifier::Clockwise,
            "'" => Modifier::Inverse,
            "2" => Modifier::Double,
            _ => return Err(ScrambleError::InvalidToken(token.to_string())),
        };
        Ok(Move { face, modifier })
    }
}

/// An immutable move sequence for one attempt
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Scramble {
    moves: Vec<Move>,
}

impl Scramble {
    pub fn moves(&self) -> &[Move] {
        &self.moves
    }

    pub fn len(&self) -> usize {
        self.moves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }
}

impl fmt::Display for Scramble {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, m) in self.moves.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{m}")?;
        }
        Ok(())
    }
}

impl FromStr for Scramble {
    type Err = ScrambleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let moves = s
            .split_whitespace()
            .map(Move::from_str)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Scramble { moves })
    }
}

/// Faces allowed after `last` and `second_last`.
///
/// The previous face is always excluded. When the previous two moves turned
/// opposite faces (R L, U D, ...), both faces of that axis are excluded so the
/// sequence cannot collapse into redundant same-axis turns like `R L R`.
pub fn valid_faces(last: Option<Face>, second_last: Option<Face>) -> Vec<Face> {
    let same_axis = match (last, second_last) {
        (Some(a), Some(b)) => a.opposite() == b,
        _ => false,
    };

    Face::ALL
        .iter()
        .copied()
        .filter(|&face| Some(face) != last)
        .filter(|&face| !(same_axis && Some(face) == second_last))
        .collect()
}

/// Generates random scrambles from an injectable random source
pub struct ScrambleGenerator<R: Rng> {
    rng: R,
}

impl ScrambleGenerator<rand::rngs::ThreadRng> {
    pub fn new() -> Self {
        Self {
            rng: rand::thread_rng(),
        }
    }
}

impl Default for ScrambleGenerator<rand::rngs::ThreadRng> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Rng> ScrambleGenerator<R> {
    pub fn with_rng(rng: R) -> Self {
        Self { rng }
    }

    pub fn generate(&mut self, length: usize) -> Scramble {
        let mut moves = Vec::with_capacity(length);
        let mut last = None;
        let mut second_last = None;

        for _ in 0..length {
            let faces = valid_faces(last, second_last);
            let face = faces[self.rng.gen_range(0..faces.len())];
            let modifier = Modifier::ALL[self.rng.gen_range(0..Modifier::ALL.len())];

            moves.push(Move { face, modifier });
            second_last = last;
            last = Some(face);
        }

        Scramble { moves }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn seeded(seed: u64) -> ScrambleGenerator<StdRng> {
        ScrambleGenerator::with_rng(StdRng::seed_from_u64(seed))
    }

    #[test]
    fn test_generate_default_length() {
        let mut generator = ScrambleGenerator::new();
        let scramble = generator.generate(DEFAULT_SCRAMBLE_LENGTH);

        assert_eq!(scramble.len(), 20);
        assert_eq!(scramble.to_string().split(' ').count(), 20);
    }

    #[test]
    fn test_generate_zero_length() {
        let scramble = seeded(1).generate(0);
        assert!(scramble.is_empty());
        assert_eq!(scramble.to_string(), "");
    }

    #[test]
    fn test_no_face_repeats_and_no_axis_cycles() {
        for seed in 0..200 {
            let scramble = seeded(seed).generate(DEFAULT_SCRAMBLE_LENGTH);
            let faces: Vec<Face> = scramble.moves().iter().map(|m| m.face).collect();

            for i in 1..faces.len() {
                assert_ne!(faces[i], faces[i - 1], "seed {seed}: {scramble}");
            }
            for i in 2..faces.len() {
                if faces[i - 1].opposite() == faces[i - 2] {
                    assert_ne!(faces[i], faces[i - 1], "seed {seed}: {scramble}");
                    assert_ne!(faces[i], faces[i - 2], "seed {seed}: {scramble}");
                }
            }
        }
    }

    #[test]
    fn test_valid_faces_counts() {
        assert_eq!(valid_faces(None, None).len(), 6);
        assert_eq!(valid_faces(Some(Face::R), None).len(), 5);
        assert_eq!(valid_faces(Some(Face::R), Some(Face::U)).len(), 5);

        let after_axis = valid_faces(Some(Face::L), Some(Face::R));
        assert_eq!(after_axis.len(), 4);
        assert!(!after_axis.contains(&Face::L));
        assert!(!after_axis.contains(&Face::R));
    }

    #[test]
    fn test_every_token_is_reachable() {
        let mut generator = seeded(42);
        let mut seen = std::collections::HashSet::new();
        for _ in 0..50 {
            for m in generator.generate(DEFAULT_SCRAMBLE_LENGTH).moves() {
                seen.insert(*m);
            }
        }
        assert_eq!(seen.len(), 18);
    }

    #[test]
    fn test_move_display() {
        let m = Move {
            face: Face::U,
            modifier: Modifier::Inverse,
        };
        assert_eq!(m.to_string(), "U'");
        let m = Move {
            face: Face::F,
            modifier: Modifier::Double,
        };
        assert_eq!(m.to_string(), "F2");
    }

    #[test]
    fn test_parse_scramble() {
        let scramble: Scramble = "R U2 F' B".parse().unwrap();
        assert_eq!(scramble.len(), 4);
        assert_eq!(scramble.moves()[2].face, Face::F);
        assert_eq!(scramble.moves()[2].modifier, Modifier::Inverse);
        assert_eq!(scramble.to_string(), "R U2 F' B");
    }

    #[test]
    fn test_parse_invalid_token() {
        let err = "R X2".parse::<Scramble>().unwrap_err();
        assert_eq!(err, ScrambleError::InvalidToken("X2".to_string()));
        assert!("R3".parse::<Move>().is_err());
    }
}
