use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Fixed-width numeric key addressing one source document, e.g. `"007"`.
///
/// Ordering is numeric first; two identifiers with the same value but a
/// different padding width are distinct keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Identifier {
    value: u32,
    width: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdError {
    #[error("identifier is empty")]
    Empty,
    #[error("identifier {0:?} contains non-digit characters")]
    NotNumeric(String),
    #[error("identifier {0:?} is out of range")]
    Overflow(String),
    #[error("range start {start} is greater than end {end}")]
    InvertedRange { start: u32, end: u32 },
    #[error("range end {end} does not fit in {width} digits")]
    WidthTooSmall { end: u32, width: u8 },
}

impl Identifier {
    pub fn new(value: u32, width: u8) -> Self {
        Self { value, width }
    }

    pub fn value(&self) -> u32 {
        self.value
    }

    pub fn width(&self) -> u8 {
        self.width
    }

    /// The zero-padded string form used in the ledger, the result file and locators.
    pub fn key(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:0width$}", self.value, width = usize::from(self.width))
    }
}

impl FromStr for Identifier {
    type Err = IdError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(IdError::Empty);
        }
        if !raw.bytes().all(|b| b.is_ascii_digit()) {
            return Err(IdError::NotNumeric(raw.to_string()));
        }
        let width = u8::try_from(raw.len()).map_err(|_| IdError::Overflow(raw.to_string()))?;
        let value = raw
            .parse::<u32>()
            .map_err(|_| IdError::Overflow(raw.to_string()))?;
        Ok(Self { value, width })
    }
}

/// Compare two record keys: numerically when both parse, lexically otherwise.
///
/// Keeps the result file ordered by identifier even if a hand-edited file mixes
/// padding widths.
pub fn compare_keys(a: &str, b: &str) -> Ordering {
    match (a.parse::<Identifier>(), b.parse::<Identifier>()) {
        (Ok(left), Ok(right)) => left.value.cmp(&right.value).then_with(|| a.cmp(b)),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => a.cmp(b),
    }
}

/// Dense, inclusive identifier range `[start, end]` with a fixed padding width.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdRange {
    start: u32,
    end: u32,
    width: u8,
}

impl IdRange {
    pub fn new(start: u32, end: u32, width: u8) -> Result<Self, IdError> {
        if start > end {
            return Err(IdError::InvertedRange { start, end });
        }
        if digit_count(end) > u32::from(width) {
            return Err(IdError::WidthTooSmall { end, width });
        }
        Ok(Self { start, end, width })
    }

    pub fn start(&self) -> Identifier {
        Identifier::new(self.start, self.width)
    }

    pub fn end(&self) -> Identifier {
        Identifier::new(self.end, self.width)
    }

    pub fn len(&self) -> usize {
        (self.end - self.start) as usize + 1
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn contains(&self, id: &Identifier) -> bool {
        id.width == self.width && (self.start..=self.end).contains(&id.value)
    }

    /// Identifiers in increasing order.
    pub fn iter(&self) -> impl Iterator<Item = Identifier> {
        let width = self.width;
        (self.start..=self.end).map(move |value| Identifier::new(value, width))
    }
}

fn digit_count(mut value: u32) -> u32 {
    let mut digits = 1;
    while value >= 10 {
        value /= 10;
        digits += 1;
    }
    digits
}
