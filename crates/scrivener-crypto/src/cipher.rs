use crate::error::ValidationError;

/// Alphabets in lookup priority order. A character is shifted within the
/// first alphabet that contains it.
const ALPHABETS: [&str; 4] = [
    "АБВГДЕЁЖЗИЙКЛМНОПРСТУФХЦЧШЩЪЫЬЭЮЯ",
    "абвгдеёжзийклмнопрстуфхцчшщъыьэюя",
    "ABCDEFGHIJKLMNOPQRSTUVWXYZ",
    "abcdefghijklmnopqrstuvwxyz",
];

/// A Gronsfeld key: one shift per position, applied cyclically.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CipherKey(Vec<u32>);

impl CipherKey {
    pub fn new(shifts: Vec<u32>) -> Result<Self, ValidationError> {
        if shifts.is_empty() {
            return Err(ValidationError::InvalidKey);
        }
        Ok(Self(shifts))
    }

    /// Parse the wire form: a string of decimal digits, one shift per digit.
    pub fn parse(digits: &str) -> Result<Self, ValidationError> {
        let shifts = digits
            .chars()
            .map(|c| c.to_digit(10).ok_or(ValidationError::InvalidKey))
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(shifts)
    }

    pub fn shifts(&self) -> &[u32] {
        &self.0
    }

    fn shift_at(&self, position: usize) -> usize {
        self.0[position % self.0.len()] as usize
    }
}

#[derive(Clone, Copy)]
enum Direction {
    Forward,
    Backward,
}

pub fn encrypt(text: &str, key: &CipherKey) -> String {
    apply(text, key, Direction::Forward)
}

pub fn decrypt(text: &str, key: &CipherKey) -> String {
    apply(text, key, Direction::Backward)
}

fn apply(text: &str, key: &CipherKey, direction: Direction) -> String {
    // `position` counts every character, including pass-through ones, so a
    // digit or space still consumes its key slot.
    text.chars()
        .enumerate()
        .map(|(position, ch)| match locate(ch) {
            Some((alphabet, idx)) => {
                let len = alphabet.chars().count();
                let shift = key.shift_at(position) % len;
                let target = match direction {
                    Direction::Forward => (idx + shift) % len,
                    Direction::Backward => (idx + len - shift) % len,
                };
                alphabet.chars().nth(target).unwrap_or(ch)
            }
            None => ch,
        })
        .collect()
}

fn locate(ch: char) -> Option<(&'static str, usize)> {
    ALPHABETS
        .iter()
        .find_map(|alphabet| alphabet.chars().position(|c| c == ch).map(|idx| (*alphabet, idx)))
}
