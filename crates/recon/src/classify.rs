use crate::model::{Alert, AlertReason, AlertSummary, AlertTier, InventoryLine, Priority};

/// Tier and reason for one line. Critical checks run before warning checks.
///
/// Stock at or below zero is out of stock.
pub fn classify(line: &InventoryLine, critical_ratio: f64) -> (AlertTier, Option<AlertReason>) {
    let stock = line.current_stock;
    let reorder = line.reorder_level;

    if stock <= 0.0 {
        return (AlertTier::Critical, Some(AlertReason::OutOfStock));
    }
    if stock <= reorder * critical_ratio {
        return (AlertTier::Critical, Some(AlertReason::CriticallyLow));
    }
    if stock <= reorder {
        return (AlertTier::Warning, Some(AlertReason::BelowReorderLevel));
    }
    if line.manual_reorder {
        return (AlertTier::Warning, Some(AlertReason::ManualReorder));
    }
    (AlertTier::Ok, None)
}

pub fn priority_for(reason: AlertReason) -> Priority {
    match reason {
        AlertReason::OutOfStock => Priority::High,
        AlertReason::CriticallyLow => Priority::Medium,
        AlertReason::BelowReorderLevel | AlertReason::ManualReorder => Priority::Low,
    }
}

/// Set tier and reorder quantity on every line and collect one alert per
/// non-ok line, in line order.
pub fn apply_alerts(lines: &mut [InventoryLine], critical_ratio: f64) -> Vec<Alert> {
    let mut alerts = Vec::new();

    for line in lines.iter_mut() {
        let (tier, reason) = classify(line, critical_ratio);
        line.alert_tier = tier;
        let Some(reason) = reason else {
            line.reorder_quantity = 0.0;
            continue;
        };
        line.reorder_quantity = (line.reorder_level - line.current_stock).max(0.0);

        alerts.push(Alert {
            key: line.key.clone(),
            name: line.name.clone(),
            unit: line.unit.clone(),
            current_stock: line.current_stock,
            reorder_level: line.reorder_level,
            tier,
            reason,
            label: reason.label(),
            priority: priority_for(reason),
            reorder_quantity: line.reorder_quantity,
            estimated_reorder_value: line.reorder_level * line.unit_cost,
        });
    }

    alerts
}

pub fn summarize(alerts: &[Alert]) -> AlertSummary {
    let mut summary = AlertSummary {
        total: alerts.len(),
        ..AlertSummary::default()
    };
    for alert in alerts {
        match alert.tier {
            AlertTier::Critical => summary.critical += 1,
            AlertTier::Warning => summary.warning += 1,
            AlertTier::Ok => {}
        }
        if alert.reason == AlertReason::OutOfStock {
            summary.out_of_stock += 1;
        }
        match alert.priority {
            Priority::High => summary.high += 1,
            Priority::Medium => summary.medium += 1,
            Priority::Low => summary.low += 1,
        }
        summary.estimated_reorder_value += alert.estimated_reorder_value;
    }
    summary
}
