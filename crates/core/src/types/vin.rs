//! Vehicle identification number type.

use core::fmt;

use serde::Serialize;

/// Errors that can occur when parsing a [`Vin`].
///
/// Messages are shown to the user as-is, so they are written in Spanish.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum VinError {
    /// The input is empty or only whitespace.
    #[error("Ingrese un VIN.")]
    EmptyInput,
    /// The input does not have exactly 17 characters.
    #[error("El VIN debe tener {expected} caracteres.", expected = Vin::LENGTH)]
    WrongLength {
        /// Number of characters received after trimming.
        len: usize,
    },
    /// The input contains characters outside the VIN alphabet.
    #[error("VIN inválido.")]
    InvalidCharacters,
}

/// A vehicle identification number.
///
/// ## Constraints
///
/// - Exactly 17 characters after trimming
/// - Characters drawn from `A-H`, `J-N`, `P`, `R-Z` and `0-9`
///   (`I`, `O` and `Q` are never used in VINs)
/// - Stored uppercase
///
/// ## Examples
///
/// ```
/// use ofertas_vin_core::Vin;
///
/// let vin = Vin::parse(" 1hgcm82633a004352 ").unwrap();
/// assert_eq!(vin.as_str(), "1HGCM82633A004352");
///
/// assert!(Vin::parse("").is_err());
/// assert!(Vin::parse("SHORT").is_err());
/// assert!(Vin::parse("1HGCM82633A00435O").is_err()); // letter O
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Vin(String);

impl Vin {
    /// Number of characters in a VIN.
    pub const LENGTH: usize = 17;

    /// Parse a `Vin` from user input.
    ///
    /// # Errors
    ///
    /// Returns an error if the input:
    /// - Is blank
    /// - Does not have exactly 17 characters
    /// - Contains `I`, `O`, `Q` or anything that is not an ASCII letter or digit
    pub fn parse(input: &str) -> Result<Self, VinError> {
        let normalized = input.trim().to_uppercase();

        if normalized.is_empty() {
            return Err(VinError::EmptyInput);
        }

        let len = normalized.chars().count();
        if len != Self::LENGTH {
            return Err(VinError::WrongLength { len });
        }

        if !normalized.chars().all(is_vin_char) {
            return Err(VinError::InvalidCharacters);
        }

        Ok(Self(normalized))
    }

    /// Returns the VIN as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the `Vin` and returns its inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

const fn is_vin_char(c: char) -> bool {
    matches!(c, 'A'..='H' | 'J'..='N' | 'P' | 'R'..='Z' | '0'..='9')
}

impl fmt::Display for Vin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for Vin {
    type Err = VinError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for Vin {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
