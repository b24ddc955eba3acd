/// Why a single line could not be read as an expense.
///
/// A line needs at least one amount token and one description token, so a
/// one-token line is reported by what it lacks rather than by its length.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum LineRejection {
    #[error("invalid format - need description and amount")]
    TooFewTokens,

    #[error("no valid amount found")]
    NoAmountFound,

    #[error("missing description")]
    MissingDescription,

    /// The numeric tokens add up to a value that is not representable.
    #[error("amount is too large")]
    AmountOverflow,
}

/// One successfully interpreted line.
///
/// Only [`interpret`] builds this, so `amount` is always finite and positive and
/// `description` is never blank.
#[derive(Clone, Debug, PartialEq)]
pub struct ParsedExpense {
    amount: f64,
    description: String,
}

impl ParsedExpense {
    pub fn amount(&self) -> f64 {
        self.amount
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn into_parts(self) -> (f64, String) {
        (self.amount, self.description)
    }
}

/// Parse one line of free text into an amount and description.
///
/// Every token that reads as a positive number contributes to the amount (so
/// "Coffee 5 10 15" is 30); every other token is description text, in order.
/// Zero and negative numbers are description text.
pub fn interpret(line: &str) -> Result<ParsedExpense, LineRejection> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    if tokens.is_empty() {
        return Err(LineRejection::TooFewTokens);
    }

    let mut amounts = Vec::new();
    let mut words = Vec::new();
    for token in tokens {
        match parse_amount(token) {
            Some(v) => amounts.push(v),
            None => words.push(token),
        }
    }

    if amounts.is_empty() {
        return Err(LineRejection::NoAmountFound);
    }
    if words.is_empty() {
        return Err(LineRejection::MissingDescription);
    }

    let amount: f64 = amounts.iter().sum();
    if !amount.is_finite() {
        return Err(LineRejection::AmountOverflow);
    }

    Ok(ParsedExpense {
        amount,
        description: words.join(" "),
    })
}

/// True when any whitespace-separated token is a number, regardless of sign.
///
/// Used to route free text to the expense path before it is interpreted.
pub fn contains_number(text: &str) -> bool {
    text.split_whitespace().any(|t| parse_number(t).is_some())
}

fn parse_amount(token: &str) -> Option<f64> {
    parse_number(token).filter(|v| *v > 0.0)
}

// Plain decimal with optional sign; exponents are accepted. `inf`/`NaN` are not numbers here.
fn parse_number(token: &str) -> Option<f64> {
    token.parse::<f64>().ok().filter(|v| v.is_finite())
}
