// Gift-code announcements - argument parsing and validation.
//
// Staff paste `CODE`, `CODE:label`, or `"CODE:label with spaces"` after
// the command; this module turns that into validated, upper-cased codes
// ready for the discord layer to render as an embed with redeem buttons.

use thiserror::Error;

/// Codes allowed per announcement.
pub const MAX_CODES: usize = 25;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GiftCode {
    pub code: String,
    pub label: String,
}

impl GiftCode {
    pub fn redeem_url(&self, base: &str) -> String {
        format!("{base}{code}", code = self.code)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CodesError {
    #[error("No codes provided")]
    Empty,
    #[error("You can only post up to {MAX_CODES} codes at once.")]
    TooMany(usize),
    /// The offending segment, backticks stripped so it can be echoed
    /// inside a code span.
    #[error("The code `{0}` doesn't look right")]
    InvalidCode(String),
}

/// Split the raw argument string on whitespace, honoring double quotes so
/// `"CODE:60x Jade, 10x Coins"` stays one segment.
fn split_args(input: &str) -> Vec<String> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;

    for ch in input.chars() {
        match ch {
            '"' => in_quotes = !in_quotes,
            c if c.is_whitespace() && !in_quotes => {
                if !current.is_empty() {
                    args.push(std::mem::take(&mut current));
                }
            }
            c => current.push(c),
        }
    }
    if !current.is_empty() {
        args.push(current);
    }
    args
}

/// Parse and validate an announcement's worth of codes.
///
/// Each segment is `CODE` or `CODE:label`; codes must be alphanumeric and
/// are upper-cased, labels default to `Code N`.
pub fn parse_codes(input: &str) -> Result<Vec<GiftCode>, CodesError> {
    let segments = split_args(input);
    if segments.is_empty() {
        return Err(CodesError::Empty);
    }
    if segments.len() > MAX_CODES {
        return Err(CodesError::TooMany(segments.len()));
    }

    let mut codes = Vec::with_capacity(segments.len());
    for (index, segment) in segments.iter().enumerate() {
        let (code, label) = match segment.split_once(':') {
            Some((code, label)) => (code, label.to_string()),
            None => (segment.as_str(), format!("Code {}", index + 1)),
        };

        if code.is_empty() || !code.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(CodesError::InvalidCode(code.replace('`', "[backtick]")));
        }

        codes.push(GiftCode {
            code: code.to_ascii_uppercase(),
            label,
        });
    }
    Ok(codes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_codes_get_default_labels() {
        let codes = parse_codes("foobar1 FOOBAR2").unwrap();
        assert_eq!(
            codes,
            vec![
                GiftCode {
                    code: "FOOBAR1".to_string(),
                    label: "Code 1".to_string()
                },
                GiftCode {
                    code: "FOOBAR2".to_string(),
                    label: "Code 2".to_string()
                },
            ]
        );
    }

    #[test]
    fn labeled_and_quoted_codes() {
        let codes = parse_codes(r#""FOOBAR1:60x Jade, 10x Coins" FOOBAR2:Bonus"#).unwrap();
        assert_eq!(codes[0].code, "FOOBAR1");
        assert_eq!(codes[0].label, "60x Jade, 10x Coins");
        assert_eq!(codes[1].code, "FOOBAR2");
        assert_eq!(codes[1].label, "Bonus");
    }

    #[test]
    fn invalid_codes_are_reported() {
        assert_eq!(
            parse_codes("FOO-BAR"),
            Err(CodesError::InvalidCode("FOO-BAR".to_string()))
        );
        assert_eq!(
            parse_codes("`rm`:oops"),
            Err(CodesError::InvalidCode("[backtick]rm[backtick]".to_string()))
        );
        assert_eq!(parse_codes(":nolabel"), Err(CodesError::InvalidCode(String::new())));
    }

    #[test]
    fn limits() {
        assert_eq!(parse_codes("   "), Err(CodesError::Empty));
        let many = vec!["CODE"; MAX_CODES].join(" ");
        assert_eq!(parse_codes(&many).unwrap().len(), MAX_CODES);
        let too_many = vec!["CODE"; MAX_CODES + 1].join(" ");
        assert_eq!(parse_codes(&too_many), Err(CodesError::TooMany(MAX_CODES + 1)));
    }

    #[test]
    fn redeem_url_appends_code() {
        let code = GiftCode {
            code: "ABC123".to_string(),
            label: "Code 1".to_string(),
        };
        assert_eq!(
            code.redeem_url("https://example.com/gift?code="),
            "https://example.com/gift?code=ABC123"
        );
    }
}
