use crate::model::{Alert, InventoryLine, Metrics};

/// Portfolio rollup over all lines.
///
/// `turnover_ratio` is total outbound over the mean line value, 0 when the
/// mean is 0.
pub fn compute_metrics(lines: &[InventoryLine], alerts: &[Alert], high_value_threshold: f64) -> Metrics {
    let item_count = lines.len();
    let total_value: f64 = lines.iter().map(|l| l.inventory_value).sum();
    let total_in: f64 = lines.iter().map(|l| l.total_in).sum();
    let total_out: f64 = lines.iter().map(|l| l.total_out).sum();

    let average_unit_cost = if item_count == 0 {
        0.0
    } else {
        lines.iter().map(|l| l.unit_cost).sum::<f64>() / item_count as f64
    };

    let mean_value = total_value / item_count.max(1) as f64;
    let turnover_ratio = if mean_value == 0.0 { 0.0 } else { total_out / mean_value };

    Metrics {
        item_count,
        total_value,
        total_in,
        total_out,
        high_value_count: lines
            .iter()
            .filter(|l| l.inventory_value > high_value_threshold)
            .count(),
        average_unit_cost,
        total_reorder_value: alerts.iter().map(|a| a.estimated_reorder_value).sum(),
        turnover_ratio,
    }
}
