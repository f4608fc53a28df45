//! Nearest-timestamp join of option rows against a month of spot prices.

use crate::data::types::{OptionRecord, SpotSeries};

/// Attach the nearest spot price to every row.
///
/// Rows are stably sorted by timestamp first. Both sides are then walked in a
/// single pass. When the previous and next spot observations are equally
/// near, the earlier one wins. An empty series leaves `spot_price` unset.
pub fn merge_spot(mut rows: Vec<OptionRecord>, spot: &SpotSeries) -> Vec<OptionRecord> {
    rows.sort_by_key(|r| r.timestamp);

    let points = spot.points();
    if points.is_empty() {
        for row in &mut rows {
            row.spot_price = None;
        }
        return rows;
    }

    // Number of spot points at or before the current row.
    let mut passed = 0;
    for row in &mut rows {
        while passed < points.len() && points[passed].timestamp <= row.timestamp {
            passed += 1;
        }

        let before = passed.checked_sub(1).map(|i| &points[i]);
        let after = points.get(passed);

        let nearest = match (before, after) {
            (Some(b), Some(a)) if a.timestamp - row.timestamp < row.timestamp - b.timestamp => a,
            (Some(b), _) => b,
            (None, Some(a)) => a,
            (None, None) => continue,
        };
        row.spot_price = Some(nearest.spot_price);
    }

    rows
}
