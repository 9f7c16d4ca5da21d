use std::fmt;

/// Longest accepted course reference number
const CRN_MAX_LEN: usize = 16;

/// Course reference number, identifying a single course section
///
/// Institutions format CRNs differently, so only a loose input check is applied
/// at the API boundary: non-empty, at most 16 characters, ASCII letters and digits.
/// Widen it here if a course data source publishes other shapes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Crn(String);

impl Crn {
    /// Parse course reference number
    pub fn parse(crn: String) -> Result<Self, String> {
        let is_empty = crn.is_empty();
        let is_too_long = crn.chars().count() > CRN_MAX_LEN;
        let contains_invalid_chars = crn.chars().any(|c| !c.is_ascii_alphanumeric());

        if is_empty || is_too_long || contains_invalid_chars {
            Err(format!("`{crn}` is not a valid course reference number"))
        } else {
            Ok(Self(crn))
        }
    }
}

impl TryFrom<String> for Crn {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<Crn> for String {
    fn from(value: Crn) -> Self {
        value.0
    }
}

impl AsRef<str> for Crn {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Crn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
