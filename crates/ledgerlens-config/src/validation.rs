//! Configuration validation.

use ledgerlens_core::catalog::currency::is_iso_currency;
use ledgerlens_core::error::{EngineError, EngineResult};
use rust_decimal::Decimal;

use crate::schema::{LocaleDetection, ProcessingConfig};

/// Validate a configuration before a pipeline run.
///
/// Returns the first violation found; a valid config returns `Ok(())`.
pub fn validate_config(config: &ProcessingConfig) -> EngineResult<()> {
    if !(0.0..=1.0).contains(&config.column_overlap_threshold) {
        return Err(EngineError::config(format!(
            "column_overlap_threshold {} outside 0..=1",
            config.column_overlap_threshold
        )));
    }
    if !(0.0..=1.0).contains(&config.confidence_threshold) {
        return Err(EngineError::config(format!(
            "confidence_threshold {} outside 0..=1",
            config.confidence_threshold
        )));
    }
    if config.row_gap_threshold <= 0.0 {
        return Err(EngineError::config(format!(
            "row_gap_threshold {} must be positive",
            config.row_gap_threshold
        )));
    }
    if config.line_y_tolerance <= 0.0 {
        return Err(EngineError::config(format!(
            "line_y_tolerance {} must be positive",
            config.line_y_tolerance
        )));
    }
    if config.max_continuation_lines == 0 {
        return Err(EngineError::config(
            "max_continuation_lines must be at least 1",
        ));
    }
    if !is_iso_currency(&config.local_currency) {
        return Err(EngineError::config(format!(
            "unknown local currency {:?}",
            config.local_currency
        )));
    }
    if let LocaleDetection::Explicit(ref code) = config.locale_detection {
        if code.is_empty() {
            return Err(EngineError::config("explicit locale code is empty"));
        }
    }

    let t = &config.tolerances;
    if t.exact < Decimal::ZERO || t.rounding < Decimal::ZERO || t.cent < Decimal::ZERO {
        return Err(EngineError::config("tolerance tiers must be non-negative"));
    }
    if t.exact > t.rounding || t.rounding > t.cent {
        return Err(EngineError::config(
            "tolerance tiers must satisfy exact <= rounding <= cent",
        ));
    }
    if t.epsilon <= Decimal::ZERO {
        return Err(EngineError::config("epsilon must be positive"));
    }

    if !(0.0..=1.0).contains(&config.repair.min_amount_coverage) {
        return Err(EngineError::config(format!(
            "repair.min_amount_coverage {} outside 0..=1",
            config.repair.min_amount_coverage
        )));
    }
    if config.repair.max_pair_candidates == 0 && config.repair.enabled {
        return Err(EngineError::config(
            "repair.max_pair_candidates must be at least 1 when repair is enabled",
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&ProcessingConfig::default()).is_ok());
    }

    #[test]
    fn test_rejects_out_of_range_thresholds() {
        let mut config = ProcessingConfig::default();
        config.column_overlap_threshold = 1.5;
        assert!(validate_config(&config).is_err());

        let mut config = ProcessingConfig::default();
        config.confidence_threshold = -0.1;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_rejects_unknown_currency() {
        let mut config = ProcessingConfig::default();
        config.local_currency = "XXX".to_string();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_rejects_inverted_tolerance_tiers() {
        let mut config = ProcessingConfig::default();
        config.tolerances.rounding = dec!(0.10);
        config.tolerances.cent = dec!(0.05);
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_rejects_empty_explicit_locale() {
        let mut config = ProcessingConfig::default();
        config.locale_detection = LocaleDetection::Explicit(String::new());
        assert!(validate_config(&config).is_err());
    }
}
