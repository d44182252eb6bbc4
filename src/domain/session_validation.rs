//! Session policy and configuration validation.
//!
//! Checks config values before a session is created or indicators are run.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::domain::error::QuantsimError;
use crate::domain::indicator::IndicatorParams;
use crate::ports::config_port::ConfigPort;

pub const MIN_INITIAL_CAPITAL: Decimal = dec!(10000);
pub const MAX_INITIAL_CAPITAL: Decimal = dec!(1000000);
pub const DEFAULT_INITIAL_CAPITAL: Decimal = dec!(100000);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    Json,
    Sqlite,
}

impl StoreKind {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "json" => Some(StoreKind::Json),
            "sqlite" => Some(StoreKind::Sqlite),
            _ => None,
        }
    }
}

/// Capital accepted for a new session, inclusive on both ends.
pub fn validate_initial_capital(capital: Decimal) -> Result<(), QuantsimError> {
    if !(MIN_INITIAL_CAPITAL..=MAX_INITIAL_CAPITAL).contains(&capital) {
        return Err(QuantsimError::CapitalOutOfRange {
            capital,
            min: MIN_INITIAL_CAPITAL,
            max: MAX_INITIAL_CAPITAL,
        });
    }
    Ok(())
}

pub fn validate_session_config(config: &dyn ConfigPort) -> Result<(), QuantsimError> {
    validate_configured_capital(config)?;
    store_kind(config)?;
    indicator_params_from_config(config)?;
    Ok(())
}

fn invalid(section: &str, key: &str, reason: impl Into<String>) -> QuantsimError {
    QuantsimError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.into(),
    }
}

/// `[session] initial_capital`, parsed exactly; the default when absent.
pub fn configured_initial_capital(config: &dyn ConfigPort) -> Result<Decimal, QuantsimError> {
    match config.get_string("session", "initial_capital") {
        None => Ok(DEFAULT_INITIAL_CAPITAL),
        Some(raw) => raw.trim().parse::<Decimal>().map_err(|_| {
            invalid(
                "session",
                "initial_capital",
                format!("'{}' is not a decimal amount", raw),
            )
        }),
    }
}

fn validate_configured_capital(config: &dyn ConfigPort) -> Result<(), QuantsimError> {
    let capital = configured_initial_capital(config)?;
    validate_initial_capital(capital).map_err(|_| {
        invalid(
            "session",
            "initial_capital",
            format!(
                "initial_capital must be between {} and {}",
                MIN_INITIAL_CAPITAL, MAX_INITIAL_CAPITAL
            ),
        )
    })
}

/// Storage backend named by `[session] store`, JSON when absent.
pub fn store_kind(config: &dyn ConfigPort) -> Result<StoreKind, QuantsimError> {
    match config.get_string("session", "store") {
        None => Ok(StoreKind::Json),
        Some(s) => StoreKind::parse(&s)
            .ok_or_else(|| invalid("session", "store", "store must be 'json' or 'sqlite'")),
    }
}

fn positive_period(
    config: &dyn ConfigPort,
    key: &str,
    default: usize,
) -> Result<usize, QuantsimError> {
    let value = config.get_int("indicators", key, default as i64);
    if value <= 0 {
        return Err(invalid("indicators", key, format!("{} must be positive", key)));
    }
    Ok(value as usize)
}

/// Indicator periods from `[indicators]`, falling back to the defaults.
pub fn indicator_params_from_config(
    config: &dyn ConfigPort,
) -> Result<IndicatorParams, QuantsimError> {
    let defaults = IndicatorParams::default();

    let params = IndicatorParams {
        sma_period: positive_period(config, "sma_period", defaults.sma_period)?,
        ema_period: positive_period(config, "ema_period", defaults.ema_period)?,
        rsi_period: positive_period(config, "rsi_period", defaults.rsi_period)?,
        macd_fast: positive_period(config, "macd_fast", defaults.macd_fast)?,
        macd_slow: positive_period(config, "macd_slow", defaults.macd_slow)?,
        macd_signal: positive_period(config, "macd_signal", defaults.macd_signal)?,
        bollinger_period: positive_period(config, "bollinger_period", defaults.bollinger_period)?,
        bollinger_mult: config.get_double("indicators", "bollinger_mult", defaults.bollinger_mult),
    };

    if params.macd_fast > params.macd_slow {
        return Err(invalid(
            "indicators",
            "macd_fast",
            "macd_fast must not exceed macd_slow",
        ));
    }
    if !params.bollinger_mult.is_finite() || params.bollinger_mult < 0.0 {
        return Err(invalid(
            "indicators",
            "bollinger_mult",
            "bollinger_mult must be non-negative",
        ));
    }
    Ok(params)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::file_config_adapter::FileConfigAdapter;

    fn make_config(content: &str) -> FileConfigAdapter {
        FileConfigAdapter::from_string(content).unwrap()
    }

    #[test]
    fn capital_bounds_are_inclusive() {
        assert!(validate_initial_capital(dec!(10000)).is_ok());
        assert!(validate_initial_capital(dec!(1000000)).is_ok());
        assert!(validate_initial_capital(dec!(9999.99)).is_err());
        assert!(validate_initial_capital(dec!(1000000.01)).is_err());
        assert!(validate_initial_capital(dec!(-20000)).is_err());
    }

    #[test]
    fn capital_error_carries_bounds() {
        match validate_initial_capital(dec!(5)).unwrap_err() {
            QuantsimError::CapitalOutOfRange { capital, min, max } => {
                assert_eq!(capital, dec!(5));
                assert_eq!(min, MIN_INITIAL_CAPITAL);
                assert_eq!(max, MAX_INITIAL_CAPITAL);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn valid_session_config_passes() {
        let config = make_config(
            r#"
[session]
initial_capital = 250000
store = sqlite
state_path = quantsim.db

[indicators]
sma_period = 50
macd_fast = 5
macd_slow = 35
bollinger_mult = 2.5
"#,
        );
        assert!(validate_session_config(&config).is_ok());
        assert_eq!(store_kind(&config).unwrap(), StoreKind::Sqlite);
    }

    #[test]
    fn empty_config_uses_defaults() {
        let config = make_config("");
        assert!(validate_session_config(&config).is_ok());
        assert_eq!(store_kind(&config).unwrap(), StoreKind::Json);
        assert_eq!(
            indicator_params_from_config(&config).unwrap(),
            IndicatorParams::default()
        );
    }

    #[test]
    fn configured_capital_out_of_range_fails() {
        let config = make_config("[session]\ninitial_capital = 500\n");
        let err = validate_session_config(&config).unwrap_err();
        assert!(matches!(err, QuantsimError::ConfigInvalid { ref key, .. } if key == "initial_capital"));
    }

    #[test]
    fn configured_capital_is_parsed_exactly() {
        let config = make_config("[session]\ninitial_capital = 27654.3081\n");
        assert_eq!(configured_initial_capital(&config).unwrap(), dec!(27654.3081));
        assert_eq!(
            configured_initial_capital(&make_config("")).unwrap(),
            DEFAULT_INITIAL_CAPITAL
        );

        let config = make_config("[session]\ninitial_capital = lots\n");
        assert!(matches!(
            validate_session_config(&config),
            Err(QuantsimError::ConfigInvalid { ref key, .. }) if key == "initial_capital"
        ));
    }

    #[test]
    fn unknown_store_fails() {
        let config = make_config("[session]\nstore = postgres\n");
        assert!(matches!(
            store_kind(&config),
            Err(QuantsimError::ConfigInvalid { .. })
        ));
    }

    #[test]
    fn zero_period_fails() {
        let config = make_config("[indicators]\nrsi_period = 0\n");
        let err = indicator_params_from_config(&config).unwrap_err();
        assert!(matches!(err, QuantsimError::ConfigInvalid { ref key, .. } if key == "rsi_period"));
    }

    #[test]
    fn macd_fast_above_slow_fails() {
        let config = make_config("[indicators]\nmacd_fast = 30\nmacd_slow = 26\n");
        assert!(indicator_params_from_config(&config).is_err());
    }

    #[test]
    fn negative_bollinger_mult_fails() {
        let config = make_config("[indicators]\nbollinger_mult = -1.0\n");
        assert!(indicator_params_from_config(&config).is_err());
    }

    #[test]
    fn params_read_from_config() {
        let config = make_config("[indicators]\nema_period = 9\nrsi_period = 7\n");
        let params = indicator_params_from_config(&config).unwrap();
        assert_eq!(params.ema_period, 9);
        assert_eq!(params.rsi_period, 7);
        assert_eq!(params.sma_period, 20);
    }
}
