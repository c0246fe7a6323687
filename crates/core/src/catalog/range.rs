use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::CatalogError;

/// Half-open slice `[min, max)` of the amount axis. `max: None` is the unbounded top.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AmountRange {
    pub code: String,
    pub min: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<Decimal>,
}

impl AmountRange {
    pub fn new(code: impl Into<String>, min: Decimal, max: Option<Decimal>) -> Self {
        Self { code: code.into(), min, max }
    }

    pub fn contains(&self, amount: Decimal) -> bool {
        self.min <= amount && self.max.map_or(true, |max| amount < max)
    }
}

/// Checks that `ranges` partition `[0, inf)` with no gap and no overlap.
///
/// Order of the input does not matter; ranges are compared sorted by `min`.
pub fn validate_coverage(ranges: &[AmountRange]) -> Result<(), CatalogError> {
    if ranges.is_empty() {
        return Err(CatalogError::NoRanges);
    }

    let mut codes = std::collections::HashSet::new();
    for range in ranges {
        if !codes.insert(super::normalize_key(&range.code)) {
            return Err(CatalogError::DuplicateRangeCode(range.code.clone()));
        }
        if let Some(max) = range.max {
            if max <= range.min {
                return Err(CatalogError::InvertedRange {
                    code: range.code.clone(),
                    min: range.min,
                    max,
                });
            }
        }
    }

    let mut sorted: Vec<&AmountRange> = ranges.iter().collect();
    sorted.sort_by(|left, right| left.min.cmp(&right.min).then_with(|| left.code.cmp(&right.code)));

    let first = sorted[0];
    if first.min != Decimal::ZERO {
        return Err(CatalogError::DoesNotStartAtZero { code: first.code.clone(), min: first.min });
    }

    for pair in sorted.windows(2) {
        let (current, next) = (pair[0], pair[1]);
        let Some(max) = current.max else {
            return Err(CatalogError::UnboundedBeforeEnd {
                code: current.code.clone(),
                next: next.code.clone(),
            });
        };

        if max < next.min {
            return Err(CatalogError::Gap {
                after: current.code.clone(),
                before: next.code.clone(),
                from: max,
                to: next.min,
            });
        }
        if max > next.min {
            return Err(CatalogError::Overlap {
                first: current.code.clone(),
                second: next.code.clone(),
                from: next.min,
                to: max,
            });
        }
    }

    let last = sorted[sorted.len() - 1];
    if let Some(max) = last.max {
        return Err(CatalogError::BoundedTail { code: last.code.clone(), max });
    }

    Ok(())
}
