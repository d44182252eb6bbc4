//! Domain error types.

use rust_decimal::Decimal;

/// Top-level error type for quantsim.
#[derive(Debug, thiserror::Error)]
pub enum QuantsimError {
    #[error("no active session: initialize the portfolio first")]
    UninitializedSession,

    #[error("insufficient funds to buy {symbol}: need {required:.2}, have {available:.2}")]
    InsufficientFunds {
        symbol: String,
        required: Decimal,
        available: Decimal,
    },

    #[error("insufficient shares of {symbol}: requested {requested}, held {held}")]
    InsufficientShares {
        symbol: String,
        requested: u64,
        held: u64,
    },

    #[error("invalid trade quantity {shares}: shares must be a positive integer")]
    InvalidTradeQuantity { shares: u64 },

    #[error("trade of {shares} {symbol} exceeds the largest representable holding or value")]
    QuantityOverflow { symbol: String, shares: u64 },

    #[error("invalid price {price} for {symbol}: must be positive")]
    InvalidPrice { symbol: String, price: Decimal },

    #[error("symbol must not be empty")]
    InvalidSymbol,

    #[error("invalid snapshot: {reason}")]
    InvalidSnapshot { reason: String },

    #[error("initial capital {capital} outside allowed range [{min}, {max}]")]
    CapitalOutOfRange {
        capital: Decimal,
        min: Decimal,
        max: Decimal,
    },

    #[error("no price data for {symbol}")]
    NoPriceData { symbol: String },

    #[error("price data error: {reason}")]
    PriceData { reason: String },

    #[error("storage error: {reason}")]
    Storage { reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl QuantsimError {
    /// True for errors that reject a trade request without touching state.
    pub fn is_trade_rejection(&self) -> bool {
        matches!(
            self,
            QuantsimError::InsufficientFunds { .. }
                | QuantsimError::InsufficientShares { .. }
                | QuantsimError::InvalidTradeQuantity { .. }
                | QuantsimError::QuantityOverflow { .. }
                | QuantsimError::InvalidPrice { .. }
                | QuantsimError::InvalidSymbol
        )
    }
}

impl From<&QuantsimError> for std::process::ExitCode {
    fn from(err: &QuantsimError) -> Self {
        let code: u8 = match err {
            QuantsimError::Io(_)
            | QuantsimError::Json(_)
            | QuantsimError::Storage { .. }
            | QuantsimError::InvalidSnapshot { .. } => 1,
            QuantsimError::ConfigParse { .. }
            | QuantsimError::ConfigMissing { .. }
            | QuantsimError::ConfigInvalid { .. } => 2,
            QuantsimError::InsufficientFunds { .. }
            | QuantsimError::InsufficientShares { .. }
            | QuantsimError::InvalidTradeQuantity { .. }
            | QuantsimError::QuantityOverflow { .. }
            | QuantsimError::InvalidPrice { .. }
            | QuantsimError::InvalidSymbol => 3,
            QuantsimError::UninitializedSession | QuantsimError::CapitalOutOfRange { .. } => 4,
            QuantsimError::NoPriceData { .. } | QuantsimError::PriceData { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
