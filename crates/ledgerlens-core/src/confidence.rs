//! Extraction confidence scoring for transactions.

use serde::{Deserialize, Serialize};

/// Letter grade derived from the overall confidence score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConfidenceGrade {
    /// 90 and above
    A,
    /// 80..90
    B,
    /// 70..80
    C,
    /// 60..70
    D,
    /// Below 60
    F,
}

impl ConfidenceGrade {
    /// Map an overall score (0..=100) to a grade.
    pub fn from_score(score: f64) -> Self {
        match score {
            s if s >= 90.0 => Self::A,
            s if s >= 80.0 => Self::B,
            s if s >= 70.0 => Self::C,
            s if s >= 60.0 => Self::D,
            _ => Self::F,
        }
    }
}

/// Per-aspect confidence factors, each 0..=100.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceFactors {
    /// Date extraction and parsing
    pub date: f64,
    /// Amount extraction and parsing
    pub amount: f64,
    /// Balance extraction and arithmetic agreement
    pub balance: f64,
    /// Lowest OCR recognition confidence over source fragments, scaled to
    /// 0..=100; absent for native text
    pub ocr: Option<f64>,
    /// Description completeness
    pub description: f64,
}

impl Default for ConfidenceFactors {
    fn default() -> Self {
        Self {
            date: 100.0,
            amount: 100.0,
            balance: 100.0,
            ocr: None,
            description: 100.0,
        }
    }
}

/// Confidence breakdown attached to every emitted transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionConfidence {
    /// Weighted overall score, 0..=100
    pub overall: f64,
    /// Letter grade for the overall score
    pub grade: ConfidenceGrade,
    /// Per-aspect factors
    pub factors: ConfidenceFactors,
    /// Degradations encountered while extracting the row
    pub flags: Vec<String>,
}

impl TransactionConfidence {
    /// Compute the weighted overall score and grade from factors.
    ///
    /// Weights: date 25%, amount 30%, balance 25%, description 10%; the OCR
    /// factor, when present, takes 10% and the others shrink proportionally.
    pub fn from_factors(factors: ConfidenceFactors, flags: Vec<String>) -> Self {
        let base = factors.date * 0.25
            + factors.amount * 0.30
            + factors.balance * 0.25
            + factors.description * 0.10;
        let overall = match factors.ocr {
            Some(ocr) => (base / 0.90) * 0.90 + ocr * 0.10,
            None => base / 0.90,
        };
        let overall = overall.clamp(0.0, 100.0);
        Self {
            overall,
            grade: ConfidenceGrade::from_score(overall),
            factors,
            flags,
        }
    }

    /// Add a degradation flag, keeping the list deduplicated.
    pub fn flag(&mut self, flag: impl Into<String>) {
        let flag = flag.into();
        if !self.flags.contains(&flag) {
            self.flags.push(flag);
        }
    }
}

impl Default for TransactionConfidence {
    fn default() -> Self {
        Self::from_factors(ConfidenceFactors::default(), Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grade_boundaries() {
        assert_eq!(ConfidenceGrade::from_score(95.0), ConfidenceGrade::A);
        assert_eq!(ConfidenceGrade::from_score(90.0), ConfidenceGrade::A);
        assert_eq!(ConfidenceGrade::from_score(89.9), ConfidenceGrade::B);
        assert_eq!(ConfidenceGrade::from_score(70.0), ConfidenceGrade::C);
        assert_eq!(ConfidenceGrade::from_score(60.0), ConfidenceGrade::D);
        assert_eq!(ConfidenceGrade::from_score(59.9), ConfidenceGrade::F);
    }

    #[test]
    fn test_perfect_factors_give_grade_a() {
        let confidence = TransactionConfidence::default();
        assert!((confidence.overall - 100.0).abs() < 1e-9);
        assert_eq!(confidence.grade, ConfidenceGrade::A);
    }

    #[test]
    fn test_ocr_factor_lowers_overall() {
        let factors = ConfidenceFactors {
            ocr: Some(50.0),
            ..ConfidenceFactors::default()
        };
        let confidence = TransactionConfidence::from_factors(factors, Vec::new());
        assert!(confidence.overall < 100.0);
        assert!(confidence.overall > 90.0);
    }

    #[test]
    fn test_flag_deduplicates() {
        let mut confidence = TransactionConfidence::default();
        confidence.flag("stitched");
        confidence.flag("stitched");
        assert_eq!(confidence.flags.len(), 1);
    }
}
