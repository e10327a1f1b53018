//! Sibling-group numbering schemes.
//!
//! Every sibling group renders its positions with one [`IndexType`]. Positions
//! are 1-based, so `1` is rendered as `"1"`, `"a"` or `"I"`.

use std::{fmt, num::NonZeroUsize, str::FromStr};

use serde::{Deserialize, Serialize};

/// Greedy lookup table for subtractive roman numerals, largest first.
const ROMAN_TABLE: [(usize, &str); 13] = [
    (1000, "M"),
    (900, "CM"),
    (500, "D"),
    (400, "CD"),
    (100, "C"),
    (90, "XC"),
    (50, "L"),
    (40, "XL"),
    (10, "X"),
    (9, "IX"),
    (5, "V"),
    (4, "IV"),
    (1, "I"),
];

/// Number of letters available to the alphabetic scheme.
pub const ALPHA_LIMIT: usize = 26;

/// The numbering scheme used to render a sibling group's positions.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum IndexType {
    /// `1`, `2`, `3`, ...
    #[default]
    Decimal,
    /// `a`, `b`, `c`, ... up to `z`.
    Alpha,
    /// `I`, `II`, `III`, `IV`, ...
    Roman,
}

/// Errors raised while formatting or parsing an index label.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum FormatError {
    /// Alphabetic labels only cover positions 1 to 26.
    #[error("position {0} cannot be rendered alphabetically (maximum is 26)")]
    AlphaOutOfRange(usize),

    /// The label is not a valid rendering under the given index type.
    #[error("'{label}' is not a valid {index_type} label")]
    InvalidLabel {
        /// The label that failed to parse.
        label: String,
        /// The scheme it was parsed against.
        index_type: IndexType,
    },

    /// The string does not name an index type.
    #[error("unknown index type '{0}': expected one of decimal, alpha, roman")]
    UnknownType(String),
}

impl IndexType {
    /// Render a 1-based position under this scheme.
    ///
    /// # Errors
    ///
    /// Returns [`FormatError::AlphaOutOfRange`] for alphabetic positions
    /// beyond `z`. Decimal and roman rendering are total.
    pub fn format(self, position: NonZeroUsize) -> Result<String, FormatError> {
        match self {
            Self::Decimal => Ok(position.to_string()),
            Self::Alpha => to_alpha(position),
            Self::Roman => Ok(to_roman(position)),
        }
    }

    /// Parse a rendered label back into its position.
    ///
    /// Alphabetic and roman labels are accepted in either case. Roman labels
    /// must be in canonical subtractive form, so `"IIII"` is rejected.
    ///
    /// # Errors
    ///
    /// Returns [`FormatError::InvalidLabel`] if the label is not something
    /// [`IndexType::format`] could have produced.
    pub fn parse(self, label: &str) -> Result<NonZeroUsize, FormatError> {
        let invalid = || FormatError::InvalidLabel {
            label: label.to_string(),
            index_type: self,
        };

        match self {
            Self::Decimal => label
                .parse::<usize>()
                .ok()
                .and_then(NonZeroUsize::new)
                .ok_or_else(invalid),
            Self::Alpha => {
                let mut chars = label.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) if c.is_ascii_alphabetic() => {
                        let offset = c.to_ascii_lowercase() as usize - 'a' as usize;
                        NonZeroUsize::new(offset + 1).ok_or_else(invalid)
                    }
                    _ => Err(invalid()),
                }
            }
            Self::Roman => {
                let upper = label.to_ascii_uppercase();
                let value = from_roman(&upper).ok_or_else(invalid)?;
                // Only accept the canonical spelling.
                if to_roman(value) == upper {
                    Ok(value)
                } else {
                    Err(invalid())
                }
            }
        }
    }

    /// The lower-case name of this scheme.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Decimal => "decimal",
            Self::Alpha => "alpha",
            Self::Roman => "roman",
        }
    }
}

impl fmt::Display for IndexType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IndexType {
    type Err = FormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "decimal" => Ok(Self::Decimal),
            "alpha" => Ok(Self::Alpha),
            "roman" => Ok(Self::Roman),
            _ => Err(FormatError::UnknownType(s.to_string())),
        }
    }
}

fn to_alpha(position: NonZeroUsize) -> Result<String, FormatError> {
    let n = position.get();
    if n > ALPHA_LIMIT {
        return Err(FormatError::AlphaOutOfRange(n));
    }
    let offset = u8::try_from(n - 1).map_err(|_| FormatError::AlphaOutOfRange(n))?;
    Ok(char::from(b'a' + offset).to_string())
}

/// Render a position as a classic subtractive roman numeral.
///
/// Numerals are unbounded: positions above 3999 simply repeat `M`.
#[must_use]
pub fn to_roman(position: NonZeroUsize) -> String {
    let mut remaining = position.get();
    let mut numeral = String::new();
    for (value, symbol) in ROMAN_TABLE {
        let count = remaining / value;
        numeral.push_str(&symbol.repeat(count));
        remaining -= value * count;
    }
    numeral
}

fn from_roman(numeral: &str) -> Option<NonZeroUsize> {
    let mut rest = numeral;
    let mut total = 0usize;
    for (value, symbol) in ROMAN_TABLE {
        while let Some(stripped) = rest.strip_prefix(symbol) {
            total = total.checked_add(value)?;
            rest = stripped;
        }
    }
    if rest.is_empty() {
        NonZeroUsize::new(total)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;

    fn pos(n: usize) -> NonZeroUsize {
        NonZeroUsize::new(n).unwrap()
    }

    #[test_case(IndexType::Decimal, 3, "3")]
    #[test_case(IndexType::Decimal, 42, "42")]
    #[test_case(IndexType::Alpha, 1, "a")]
    #[test_case(IndexType::Alpha, 26, "z")]
    #[test_case(IndexType::Roman, 4, "IV")]
    #[test_case(IndexType::Roman, 9, "IX")]
    #[test_case(IndexType::Roman, 14, "XIV")]
    #[test_case(IndexType::Roman, 1994, "MCMXCIV")]
    #[test_case(IndexType::Roman, 3999, "MMMCMXCIX")]
    fn formats_position(index_type: IndexType, n: usize, expected: &str) {
        assert_eq!(index_type.format(pos(n)).unwrap(), expected);
    }

    #[test]
    fn alpha_beyond_z_is_rejected() {
        assert_eq!(
            IndexType::Alpha.format(pos(27)),
            Err(FormatError::AlphaOutOfRange(27))
        );
    }

    #[test]
    fn roman_is_unbounded() {
        assert_eq!(to_roman(pos(5000)), "MMMMM");
    }

    /// Independent additive/subtractive parser used as a reference decoder.
    fn reference_decode(numeral: &str) -> usize {
        let value = |c| match c {
            'I' => 1,
            'V' => 5,
            'X' => 10,
            'L' => 50,
            'C' => 100,
            'D' => 500,
            'M' => 1000,
            other => panic!("unexpected numeral {other}"),
        };
        let digits: Vec<usize> = numeral.chars().map(value).collect();
        let mut total = 0;
        for (i, digit) in digits.iter().enumerate() {
            match digits.get(i + 1) {
                Some(next) if next > digit => total -= *digit as isize,
                _ => total += *digit as isize,
            }
        }
        usize::try_from(total).unwrap()
    }

    #[test]
    fn roman_decodes_back_for_classic_range() {
        for n in 1..=3999 {
            let numeral = to_roman(pos(n));
            assert_eq!(reference_decode(&numeral), n, "{numeral}");
            assert_eq!(IndexType::Roman.parse(&numeral).unwrap().get(), n);
        }
    }

    #[test_case(IndexType::Decimal, "12", 12)]
    #[test_case(IndexType::Alpha, "c", 3)]
    #[test_case(IndexType::Alpha, "C", 3)]
    #[test_case(IndexType::Roman, "xiv", 14)]
    fn parses_label(index_type: IndexType, label: &str, expected: usize) {
        assert_eq!(index_type.parse(label).unwrap().get(), expected);
    }

    #[test_case(IndexType::Decimal, "0")]
    #[test_case(IndexType::Decimal, "-1")]
    #[test_case(IndexType::Alpha, "ab")]
    #[test_case(IndexType::Alpha, "1")]
    #[test_case(IndexType::Roman, "IIII")]
    #[test_case(IndexType::Roman, "")]
    fn rejects_label(index_type: IndexType, label: &str) {
        assert!(matches!(
            index_type.parse(label),
            Err(FormatError::InvalidLabel { .. })
        ));
    }

    #[test]
    fn index_type_from_str_is_case_insensitive() {
        assert_eq!("Roman".parse::<IndexType>().unwrap(), IndexType::Roman);
        assert!(matches!(
            "greek".parse::<IndexType>(),
            Err(FormatError::UnknownType(_))
        ));
    }
}
