//! Progressive personal income tax bands (NTA 2025)

use serde::Serialize;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TaxBand {
    pub min: f64,
    /// `None` for the open-ended top band
    pub max: Option<f64>,
    pub rate: f64,
    pub description: &'static str,
}

pub const TAX_BANDS: &[TaxBand] = &[
    TaxBand {
        min: 0.0,
        max: Some(800_000.0),
        rate: 0.0,
        description: "First NGN 800,000 (Tax-free)",
    },
    TaxBand {
        min: 800_000.0,
        max: Some(3_000_000.0),
        rate: 0.15,
        description: "Next NGN 2,200,000 (15%)",
    },
    TaxBand {
        min: 3_000_000.0,
        max: Some(12_000_000.0),
        rate: 0.18,
        description: "Next NGN 9,000,000 (18%)",
    },
    TaxBand {
        min: 12_000_000.0,
        max: Some(25_000_000.0),
        rate: 0.21,
        description: "Next NGN 13,000,000 (21%)",
    },
    TaxBand {
        min: 25_000_000.0,
        max: Some(50_000_000.0),
        rate: 0.23,
        description: "Next NGN 25,000,000 (23%)",
    },
    TaxBand {
        min: 50_000_000.0,
        max: None,
        rate: 0.25,
        description: "Above NGN 50,000,000 (25%)",
    },
];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BandTax {
    pub band_description: &'static str,
    pub band_min: f64,
    pub band_max: Option<f64>,
    pub tax_rate: f64,
    pub taxable_amount_in_band: f64,
    pub tax_in_band: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaxBreakdown {
    pub taxable_income: f64,
    pub total_tax_liability: f64,
    /// Percentage of taxable income
    pub effective_tax_rate: f64,
    pub tax_band_breakdown: Vec<BandTax>,
}

pub fn apply_progressive_tax_bands(taxable_income: f64) -> TaxBreakdown {
    if !(taxable_income > 0.0) {
        return TaxBreakdown {
            taxable_income,
            total_tax_liability: 0.0,
            effective_tax_rate: 0.0,
            tax_band_breakdown: Vec::new(),
        };
    }

    let mut total_tax = 0.0;
    let mut breakdown = Vec::new();

    for band in TAX_BANDS {
        if taxable_income <= band.min {
            break;
        }
        let upper = band.max.map_or(taxable_income, |max| taxable_income.min(max));
        let taxable_in_band = upper - band.min;
        let tax_in_band = taxable_in_band * band.rate;
        total_tax += tax_in_band;

        breakdown.push(BandTax {
            band_description: band.description,
            band_min: band.min,
            band_max: band.max,
            tax_rate: band.rate,
            taxable_amount_in_band: taxable_in_band,
            tax_in_band,
        });
    }

    info!(
        "Applied progressive tax bands to taxable income {}: total tax {}",
        taxable_income, total_tax
    );

    TaxBreakdown {
        taxable_income,
        total_tax_liability: total_tax,
        effective_tax_rate: total_tax / taxable_income * 100.0,
        tax_band_breakdown: breakdown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-6
    }

    #[test]
    fn test_zero_and_negative_income() {
        for income in [0.0, -5000.0] {
            let result = apply_progressive_tax_bands(income);
            assert_eq!(result.total_tax_liability, 0.0);
            assert!(result.tax_band_breakdown.is_empty());
        }
    }

    #[test]
    fn test_income_inside_free_band() {
        let result = apply_progressive_tax_bands(500_000.0);
        assert_eq!(result.total_tax_liability, 0.0);
        assert_eq!(result.tax_band_breakdown.len(), 1);
    }

    #[test]
    fn test_second_band() {
        let result = apply_progressive_tax_bands(1_000_000.0);
        assert!(close(result.total_tax_liability, 30_000.0));
        assert!(close(result.effective_tax_rate, 3.0));
    }

    #[test]
    fn test_band_edges_are_continuous() {
        let at_edge = apply_progressive_tax_bands(3_000_000.0);
        assert!(close(at_edge.total_tax_liability, 330_000.0));
        assert_eq!(at_edge.tax_band_breakdown.len(), 2);

        let above = apply_progressive_tax_bands(5_000_000.0);
        assert!(close(above.total_tax_liability, 690_000.0));
    }

    #[test]
    fn test_top_band() {
        let result = apply_progressive_tax_bands(60_000_000.0);
        // 330k + 1.62M + 2.73M + 5.75M + 2.5M
        assert!(close(result.total_tax_liability, 12_930_000.0));
        assert_eq!(result.tax_band_breakdown.len(), 6);
        assert_eq!(result.tax_band_breakdown[5].band_max, None);
    }
}
