//! Missing Set document: a JSON array of heights, overwritten wholesale on
//! every detector scan.
use thiserror::Error;

use crate::Height;

#[derive(Debug, Error)]
pub enum MissingSetError {
    #[error("malformed missing set: {0}")]
    Json(#[from] serde_json::Error),
}

/// Encodes heights as a JSON array of integers.
pub fn encode(heights: &[Height]) -> String {
    // A Vec<u64> always serializes.
    serde_json::to_string(heights).unwrap_or_else(|_| String::from("[]"))
}

/// Decodes a stored document. Absent, blank and `[]` documents all mean
/// there is nothing to heal and yield an empty list.
pub fn decode(raw: Option<&str>) -> Result<Vec<Height>, MissingSetError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(Vec::new()),
        Some(doc) => Ok(serde_json::from_str(doc)?),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_and_blank_are_empty() {
        assert!(decode(None).unwrap().is_empty());
        assert!(decode(Some("  ")).unwrap().is_empty());
        assert!(decode(Some("[]")).unwrap().is_empty());
    }

    #[test]
    fn encodes_flat_array() {
        assert_eq!(encode(&[5, 6, 9, 10]), "[5,6,9,10]");
        assert_eq!(decode(Some("[5,6,9,10]")).unwrap(), vec![5, 6, 9, 10]);
    }

    #[test]
    fn rejects_non_integer_entries() {
        assert!(decode(Some(r#"["5", "x"]"#)).is_err());
        assert!(decode(Some("{")).is_err());
    }
}
