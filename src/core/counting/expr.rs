// Integer expression evaluation for counting messages.
//
// The counting channel accepts plain numbers and simple arithmetic, so
// "409+1" or "(20+1)*2" count just as well as "410" or "42". The grammar is
// deliberately tiny: + - * / % ** and parentheses over i64, with checked
// arithmetic throughout. `^` and `|` are rejected outright because people
// type them expecting `**` or abs, and silently meaning something else
// would ruin counts.

/// Longest content we bother tokenizing as an expression.
const MAX_INPUT_LEN: usize = 256;

/// Exponent cap. Counts will never get anywhere near this; it exists to
/// bound evaluation cost.
const MAX_EXPONENT: u32 = 1000;

/// Parse message content into an integer, if it is one.
///
/// Plain digit strings (commas and surrounding whitespace allowed) parse
/// directly. Anything else is evaluated as an arithmetic expression; any
/// syntax error, overflow, division by zero, or non-integer result yields
/// `None`.
pub fn parse(content: &str) -> Option<i64> {
    let simple: String = content.trim().replace(',', "");
    if !simple.is_empty() && simple.bytes().all(|b| b.is_ascii_digit()) {
        return simple.parse().ok();
    }

    let trimmed = content.trim();
    if trimmed.len() > MAX_INPUT_LEN || trimmed.contains('^') || trimmed.contains('|') {
        return None;
    }

    let tokens = tokenize(trimmed)?;
    let mut parser = Parser {
        tokens: &tokens,
        pos: 0,
    };
    let value = parser.expr()?;
    if parser.pos == tokens.len() {
        Some(value)
    } else {
        None
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Token {
    Num(i64),
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Pow,
    LParen,
    RParen,
}

fn tokenize(input: &str) -> Option<Vec<Token>> {
    let bytes = input.as_bytes();
    let mut tokens = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b' ' | b'\t' | b'\n' | b'\r' => i += 1,
            b'0'..=b'9' => {
                let start = i;
                while i < bytes.len() && bytes[i].is_ascii_digit() {
                    i += 1;
                }
                let value: i64 = input[start..i].parse().ok()?;
                tokens.push(Token::Num(value));
            }
            b'+' => {
                tokens.push(Token::Plus);
                i += 1;
            }
            b'-' => {
                tokens.push(Token::Minus);
                i += 1;
            }
            b'*' => {
                if bytes.get(i + 1) == Some(&b'*') {
                    tokens.push(Token::Pow);
                    i += 2;
                } else {
                    tokens.push(Token::Star);
                    i += 1;
                }
            }
            b'/' => {
                tokens.push(Token::Slash);
                i += 1;
            }
            b'%' => {
                tokens.push(Token::Percent);
                i += 1;
            }
            b'(' => {
                tokens.push(Token::LParen);
                i += 1;
            }
            b')' => {
                tokens.push(Token::RParen);
                i += 1;
            }
            _ => return None,
        }
    }
    if tokens.is_empty() {
        None
    } else {
        Some(tokens)
    }
}

// Recursive descent with Python's precedence for `**`: it binds tighter
// than unary minus on its left but takes a unary expression on its right,
// so `-2 ** 2` is -4 and `2 ** -1` fails the integer check.
struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
}

impl Parser<'_> {
    fn peek(&self) -> Option<Token> {
        self.tokens.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<Token> {
        let token = self.peek()?;
        self.pos += 1;
        Some(token)
    }

    fn expr(&mut self) -> Option<i64> {
        let mut acc = self.term()?;
        while let Some(op @ (Token::Plus | Token::Minus)) = self.peek() {
            self.pos += 1;
            let rhs = self.term()?;
            acc = match op {
                Token::Plus => acc.checked_add(rhs)?,
                _ => acc.checked_sub(rhs)?,
            };
        }
        Some(acc)
    }

    fn term(&mut self) -> Option<i64> {
        let mut acc = self.unary()?;
        while let Some(op @ (Token::Star | Token::Slash | Token::Percent)) = self.peek() {
            self.pos += 1;
            let rhs = self.unary()?;
            acc = match op {
                Token::Star => acc.checked_mul(rhs)?,
                Token::Slash => {
                    // Integer-only counting: inexact division is not a number.
                    if rhs == 0 || acc.checked_rem(rhs)? != 0 {
                        return None;
                    }
                    acc.checked_div(rhs)?
                }
                _ => {
                    if rhs == 0 {
                        return None;
                    }
                    acc.checked_rem(rhs)?
                }
            };
        }
        Some(acc)
    }

    fn unary(&mut self) -> Option<i64> {
        if self.peek() == Some(Token::Minus) {
            self.pos += 1;
            let value = self.unary()?;
            return value.checked_neg();
        }
        self.power()
    }

    fn power(&mut self) -> Option<i64> {
        let base = self.primary()?;
        if self.peek() == Some(Token::Pow) {
            self.pos += 1;
            let exp = self.unary()?;
            return checked_pow(base, exp);
        }
        Some(base)
    }

    fn primary(&mut self) -> Option<i64> {
        match self.bump()? {
            Token::Num(value) => Some(value),
            Token::LParen => {
                let value = self.expr()?;
                if self.bump()? == Token::RParen {
                    Some(value)
                } else {
                    None
                }
            }
            _ => None,
        }
    }
}

fn checked_pow(base: i64, exp: i64) -> Option<i64> {
    if exp < 0 {
        // Negative exponents produce fractions, never integers (except
        // trivially for |base| == 1, which nobody counts with).
        return None;
    }
    let exp = u32::try_from(exp).ok()?;
    if exp > MAX_EXPONENT {
        return None;
    }
    base.checked_pow(exp)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_numbers() {
        assert_eq!(parse("42"), Some(42));
        assert_eq!(parse("  42  "), Some(42));
        assert_eq!(parse("1,000"), Some(1000));
        assert_eq!(parse("0"), Some(0));
    }

    #[test]
    fn simple_arithmetic() {
        assert_eq!(parse("2+3"), Some(5));
        assert_eq!(parse("10 - 4"), Some(6));
        assert_eq!(parse("3*7"), Some(21));
        assert_eq!(parse("7%3"), Some(1));
        assert_eq!(parse("(1+2)*3"), Some(9));
    }

    #[test]
    fn precedence() {
        assert_eq!(parse("2+3*4"), Some(14));
        assert_eq!(parse("2*3+4"), Some(10));
        assert_eq!(parse("2**3**2"), Some(512)); // right-associative
        assert_eq!(parse("-2**2"), Some(-4)); // Python semantics
        assert_eq!(parse("(-2)**2"), Some(4));
    }

    #[test]
    fn unary_minus() {
        assert_eq!(parse("-5"), Some(-5));
        assert_eq!(parse("-5+6"), Some(1));
        assert_eq!(parse("3*-2"), Some(-6));
        assert_eq!(parse("--4"), Some(4));
    }

    #[test]
    fn division_must_be_exact() {
        assert_eq!(parse("10/2"), Some(5));
        assert_eq!(parse("5/2"), None);
        assert_eq!(parse("5/0"), None);
        assert_eq!(parse("5%0"), None);
    }

    #[test]
    fn rejected_operators() {
        assert_eq!(parse("2^3"), None);
        assert_eq!(parse("2|3"), None);
    }

    #[test]
    fn overflow_is_not_a_number() {
        assert_eq!(parse("9223372036854775807"), Some(i64::MAX));
        assert_eq!(parse("9223372036854775807+1"), None);
        assert_eq!(parse("9223372036854775808"), None);
        assert_eq!(parse("2**2000"), None);
        assert_eq!(parse("2**63"), None);
        assert_eq!(parse("2**-1"), None);
    }

    #[test]
    fn garbage_is_not_a_number() {
        assert_eq!(parse(""), None);
        assert_eq!(parse("   "), None);
        assert_eq!(parse("abc"), None);
        assert_eq!(parse("4 eggs"), None);
        assert_eq!(parse("()"), None);
        assert_eq!(parse("5)"), None);
        assert_eq!(parse("(5"), None);
        assert_eq!(parse("1,000+1"), None); // commas only allowed in plain numbers
        assert_eq!(parse("+"), None);
    }

    #[test]
    fn long_input_rejected() {
        let long = "1+".repeat(200) + "1";
        assert_eq!(parse(&long), None);
    }
}
