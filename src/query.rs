//! Search input validation.

use serde::Deserialize;

use crate::error::LookupError;

/// Raw query-string parameters as sent by the directory client.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LookupParams {
    #[serde(rename = "Number")]
    pub number: Option<String>,
    #[serde(rename = "Email")]
    pub email: Option<String>,
}

impl LookupParams {
    /// Collects the recognised parameters from decoded query pairs. A
    /// repeated parameter keeps its last value; unknown names are ignored.
    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut params = Self::default();
        for (name, value) in pairs {
            match name.as_str() {
                "Number" => params.number = Some(value),
                "Email" => params.email = Some(value),
                _ => {}
            }
        }
        params
    }
}

/// A validated search: at least one of phone or email is present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupQuery {
    phone: Option<String>,
    email: Option<String>,
}

impl LookupQuery {
    /// Validates the two optional inputs.
    ///
    /// Empty inputs count as absent. Fails with `BadRequest` when neither is
    /// present. A present phone input has its spaces removed afterwards, so
    /// a spaces-only number becomes the empty substring.
    pub fn new(number: Option<&str>, email: Option<&str>) -> Result<Self, LookupError> {
        let phone = number.filter(|n| !n.is_empty()).map(strip_spaces);
        let email = email.filter(|e| !e.is_empty()).map(str::to_string);

        if phone.is_none() && email.is_none() {
            return Err(LookupError::BadRequest(
                "Either Number or Email must be provided".to_string(),
            ));
        }

        Ok(Self { phone, email })
    }

    pub fn from_params(params: &LookupParams) -> Result<Self, LookupError> {
        Self::new(params.number.as_deref(), params.email.as_deref())
    }

    /// The phone input with spaces removed.
    pub fn phone(&self) -> Option<&str> {
        self.phone.as_deref()
    }

    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    /// `LIKE` pattern matching the phone input anywhere in a column.
    ///
    /// `%` and `_` in the input are matched literally, escaped with
    /// [`LIKE_ESCAPE`].
    pub fn phone_pattern(&self) -> Option<String> {
        self.phone
            .as_deref()
            .map(|p| format!("%{}%", escape_like(p)))
    }
}

/// Escape character used in the lookup's `LIKE ... ESCAPE` clauses.
pub const LIKE_ESCAPE: char = '!';

pub fn strip_spaces(s: &str) -> String {
    s.chars().filter(|c| *c != ' ').collect()
}

fn escape_like(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if c == '%' || c == '_' || c == LIKE_ESCAPE {
            out.push(LIKE_ESCAPE);
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_requires_one_input() {
        assert!(matches!(
            LookupQuery::new(None, None),
            Err(LookupError::BadRequest(_))
        ));
        assert!(LookupQuery::new(Some(""), Some("")).is_err());
    }

    #[test]
    fn test_spaces_only_number_is_present() {
        let q = LookupQuery::new(Some("   "), None).unwrap();
        assert_eq!(q.phone(), Some(""));
        assert_eq!(q.phone_pattern().as_deref(), Some("%%"));

        let q = LookupQuery::new(Some("  "), Some("a@b.com")).unwrap();
        assert_eq!(q.phone(), Some(""));
        assert_eq!(q.email(), Some("a@b.com"));
    }

    #[test]
    fn test_number_is_stripped() {
        let q = LookupQuery::new(Some("555 123 4567"), None).unwrap();
        assert_eq!(q.phone(), Some("5551234567"));
        assert_eq!(q.phone_pattern().as_deref(), Some("%5551234567%"));
        assert_eq!(q.email(), None);
    }

    #[test]
    fn test_both_inputs_kept() {
        let q = LookupQuery::new(Some("+44 20"), Some("a@b.com")).unwrap();
        assert_eq!(q.phone(), Some("+4420"));
        assert_eq!(q.email(), Some("a@b.com"));
    }

    #[test]
    fn test_email_passed_verbatim() {
        let q = LookupQuery::new(None, Some(" A@B.com")).unwrap();
        assert_eq!(q.email(), Some(" A@B.com"));
    }

    #[test]
    fn test_wildcards_are_escaped() {
        let q = LookupQuery::new(Some("5%5_1!"), None).unwrap();
        assert_eq!(q.phone_pattern().as_deref(), Some("%5!%5!_1!!%"));
    }

    #[test]
    fn test_from_pairs_keeps_last_value() {
        let pairs = vec![
            ("Number".to_string(), "555".to_string()),
            ("Other".to_string(), "x".to_string()),
            ("Number".to_string(), "123".to_string()),
        ];
        let params = LookupParams::from_pairs(pairs);
        assert_eq!(params.number.as_deref(), Some("123"));
        assert_eq!(params.email, None);
    }

    #[test]
    fn test_from_params() {
        let params = LookupParams {
            number: None,
            email: Some("x@y.org".to_string()),
        };
        let q = LookupQuery::from_params(&params).unwrap();
        assert_eq!(q.email(), Some("x@y.org"));
    }
}
