/// Failure taxonomy surfaced by the checked operation variants and the
/// verification kit. Plain arithmetic resolves these to sentinel values and
/// never aborts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ArithmeticError {
    #[error("division by zero")]
    DivisionByZero,
    #[error("NaR operand propagated")]
    NarPropagation,
    #[error("NaN operand propagated")]
    NanPropagation,
    #[error("exponent range exceeded")]
    Overflow,
    #[error("value too small for the destination")]
    Underflow,
    #[error("rounding occurred")]
    InexactRounding,
    #[error("bit pattern does not match the encoding shape")]
    InvalidEncoding,
}

/// Parse failure of a textual number representation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseNumberError {
    #[error("empty input")]
    Empty,
    #[error("invalid digit {0:?}")]
    InvalidDigit(char),
    #[error("not a recognized number literal")]
    Malformed,
}
