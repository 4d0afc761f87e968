//! Feature normalization for fraud model inference.
//!
//! Upstream producers disagree on field naming (snake_case vs camelCase), so
//! every canonical feature name maps to a fixed list of accepted wire-format
//! aliases, first match wins. The dispatch table below is fixed at compile
//! time; normalization is a pure function of `(event, feature_order)`.

use crate::types::TransactionEvent;
use chrono::{DateTime, NaiveDateTime, Timelike};
use serde_json::Value;

/// Normalize a raw event into the canonical feature vector declared by the
/// active model artifact.
///
/// The output length always equals `feature_order.len()`, and position `i`
/// corresponds to `feature_order[i]`. Canonical names with no table entry or
/// no resolvable raw value contribute 0.0.
pub fn normalize(event: &TransactionEvent, feature_order: &[String]) -> Vec<f64> {
    feature_order
        .iter()
        .map(|name| resolve(name, event))
        .collect()
}

/// Resolve one canonical feature name against an event.
fn resolve(name: &str, event: &TransactionEvent) -> f64 {
    match name {
        "amount" => first_of(event, &["amount"]),
        "tx_count_1min" => first_of(event, &["tx_count_1min", "txCountLast1Min"]),
        "tx_amount_1hour" => first_of(event, &["tx_amount_1hour", "txAmountLast1Hour"]),
        "is_new_device" => first_of(event, &["is_new_device", "isNewDevice", "newDevice"]),
        "is_overseas" => first_of(event, &["is_overseas", "overseas"]),
        "is_night" => is_night(event),
        "is_cross_border" => first_of(event, &["is_cross_border", "crossBorder"]),
        "amount_usd_equivalent" => first_of(event, &["amountUsdEquivalent", "amount_usd_equivalent"]),
        "avg_amount_usd_24h" => avg_amount_usd_24h(event),
        "amount_risk_tier" => amount_risk_tier(event),
        "sender_account_age_days" => first_of(event, &["senderAccountAgeDays"]),
        "receiver_account_age_days" => first_of(event, &["receiverAccountAgeDays"]),
        "sender_tx_count_24h" => first_of(event, &["senderTxCount24h"]),
        "sender_total_amount_usd_24h" => first_of(event, &["senderTotalAmountUsd24h"]),
        "receiver_inbound_count_24h" => first_of(event, &["receiverInboundCount24h"]),
        "sender_receiver_tx_count_24h" => {
            first_of(event, &["senderReceiverTxCount24h", "sender_receiver_tx_count_24h"])
        }
        "small_amount_burst_1m" => small_amount_burst_1m(event),
        "small_amount_spread_24h" => small_amount_spread_24h(event),
        "is_first_time_receiver" => first_of(event, &["is_first_time_receiver", "firstTimeContact"]),
        _ => 0.0,
    }
}

/// Coerce the value under the first alias that is present on the event.
fn first_of(event: &TransactionEvent, aliases: &[&str]) -> f64 {
    aliases
        .iter()
        .find_map(|alias| event.get(*alias))
        .map(coerce)
        .unwrap_or(0.0)
}

/// Coerce an arbitrary JSON value to a feature value.
///
/// null -> 0.0; booleans -> 1.0/0.0; numbers pass through; numeric strings
/// parse; anything else is 0.0.
fn coerce(value: &Value) -> f64 {
    match value {
        Value::Null => 0.0,
        Value::Bool(b) => {
            if *b {
                1.0
            } else {
                0.0
            }
        }
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => s.trim().parse::<f64>().unwrap_or(0.0),
        _ => 0.0,
    }
}

/// Nighttime flag: taken verbatim when present, otherwise derived from the
/// event timestamp's hour (1 if hour >= 22 or hour <= 5).
///
/// `eventTime` takes precedence over `receivedAt`: the first non-empty value
/// is the timestamp, and if it then turns out not to be a parseable string
/// the flag is 0 rather than the other field being consulted.
fn is_night(event: &TransactionEvent) -> f64 {
    if let Some(value) = event.get("is_night") {
        return coerce(value);
    }

    let timestamp = ["eventTime", "receivedAt"]
        .iter()
        .find_map(|key| event.get(*key).filter(|value| !is_empty_value(value)));

    let Some(Value::String(raw)) = timestamp else {
        return 0.0;
    };
    match timestamp_hour(raw) {
        Some(hour) if hour >= 22 || hour <= 5 => 1.0,
        _ => 0.0,
    }
}

/// Values that count as "no timestamp here" and let the next source win.
fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
    }
}

/// Hour-of-day of an ISO-8601 timestamp in the timestamp's own offset.
fn timestamp_hour(raw: &str) -> Option<u32> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.hour());
    }
    // Offset-less timestamps like "2025-01-01T23:10:00"
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|parsed| parsed.hour())
}

/// Mean USD amount over the sender's trailing 24h window; 0 when the window
/// holds no transactions.
fn avg_amount_usd_24h(event: &TransactionEvent) -> f64 {
    let total = first_of(event, &["senderTotalAmountUsd24h"]);
    let count = first_of(event, &["senderTxCount24h"]);
    if count <= 0.0 {
        0.0
    } else {
        total / count
    }
}

/// Risk tier: numeric passthrough, or the ordinal mapping of the tier label.
fn amount_risk_tier(event: &TransactionEvent) -> f64 {
    let raw = event
        .get("amount_risk_tier")
        .or_else(|| event.get("amountRiskTier"));

    match raw {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => match s.to_ascii_uppercase().as_str() {
            "LOW" => 1.0,
            "MEDIUM" => 2.0,
            "HIGH" => 3.0,
            "CRITICAL" => 4.0,
            _ => 0.0,
        },
        _ => 0.0,
    }
}

/// 1 iff at least 5 transactions in the last minute, each side staying at or
/// below 15 USD.
fn small_amount_burst_1m(event: &TransactionEvent) -> f64 {
    let tx_count = first_of(event, &["tx_count_1min", "txCountLast1Min"]);
    let amount = first_of(event, &["amountUsdEquivalent", "amount_usd_equivalent"]);
    if tx_count >= 5.0 && amount <= 15.0 {
        1.0
    } else {
        0.0
    }
}

/// 1 iff at least 30 transactions over 24h with a mean amount at or below
/// 20 USD.
fn small_amount_spread_24h(event: &TransactionEvent) -> f64 {
    let tx_count = first_of(event, &["senderTxCount24h"]);
    let avg = avg_amount_usd_24h(event);
    if tx_count >= 30.0 && avg <= 20.0 {
        1.0
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn event(value: serde_json::Value) -> TransactionEvent {
        value.as_object().unwrap().clone()
    }

    fn order(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn test_vector_length_matches_feature_order() {
        let ev = event(json!({"amount": 100}));
        let feature_order = order(&["amount", "is_night", "no_such_feature"]);
        let vector = normalize(&ev, &feature_order);
        assert_eq!(vector.len(), feature_order.len());
    }

    #[test]
    fn test_normalization_is_deterministic() {
        let ev = event(json!({
            "amount": "42.5",
            "txCountLast1Min": 3,
            "isNewDevice": true,
            "eventTime": "2025-03-01T23:10:00Z",
        }));
        let feature_order = order(&["amount", "tx_count_1min", "is_new_device", "is_night"]);

        let first = normalize(&ev, &feature_order);
        let second = normalize(&ev, &feature_order);
        assert_eq!(first, second);
        assert_eq!(first, vec![42.5, 3.0, 1.0, 1.0]);
    }

    #[test]
    fn test_alias_resolution_first_match_wins() {
        let ev = event(json!({"tx_count_1min": 7, "txCountLast1Min": 2}));
        assert_eq!(resolve("tx_count_1min", &ev), 7.0);

        let ev = event(json!({"txCountLast1Min": 2}));
        assert_eq!(resolve("tx_count_1min", &ev), 2.0);

        let ev = event(json!({"newDevice": true}));
        assert_eq!(resolve("is_new_device", &ev), 1.0);

        let ev = event(json!({"firstTimeContact": 1}));
        assert_eq!(resolve("is_first_time_receiver", &ev), 1.0);
    }

    #[test]
    fn test_unknown_feature_name_yields_zero() {
        let ev = event(json!({"anything": 5}));
        assert_eq!(resolve("not_a_feature", &ev), 0.0);
    }

    #[test]
    fn test_type_coercion() {
        assert_eq!(coerce(&json!(null)), 0.0);
        assert_eq!(coerce(&json!(true)), 1.0);
        assert_eq!(coerce(&json!(false)), 0.0);
        assert_eq!(coerce(&json!(3)), 3.0);
        assert_eq!(coerce(&json!(2.5)), 2.5);
        assert_eq!(coerce(&json!("17.25")), 17.25);
        assert_eq!(coerce(&json!(" 8 ")), 8.0);
        assert_eq!(coerce(&json!("not-a-number")), 0.0);
        assert_eq!(coerce(&json!([1, 2])), 0.0);
        assert_eq!(coerce(&json!({"nested": 1})), 0.0);
    }

    #[test]
    fn test_missing_value_yields_zero() {
        let ev = event(json!({}));
        assert_eq!(resolve("amount", &ev), 0.0);
        assert_eq!(resolve("sender_account_age_days", &ev), 0.0);
    }

    #[test]
    fn test_is_overseas_defaults_to_zero() {
        let ev = event(json!({}));
        assert_eq!(resolve("is_overseas", &ev), 0.0);

        let ev = event(json!({"overseas": true}));
        assert_eq!(resolve("is_overseas", &ev), 1.0);
    }

    #[test]
    fn test_is_night_explicit_field_wins() {
        let ev = event(json!({"is_night": 1, "eventTime": "2025-03-01T12:00:00Z"}));
        assert_eq!(resolve("is_night", &ev), 1.0);
    }

    #[test]
    fn test_is_night_derived_from_event_time() {
        let ev = event(json!({"eventTime": "2025-03-01T23:30:00Z"}));
        assert_eq!(resolve("is_night", &ev), 1.0);

        let ev = event(json!({"eventTime": "2025-03-01T04:00:00+07:00"}));
        assert_eq!(resolve("is_night", &ev), 1.0);

        let ev = event(json!({"eventTime": "2025-03-01T12:00:00Z"}));
        assert_eq!(resolve("is_night", &ev), 0.0);

        // receivedAt is the fallback source
        let ev = event(json!({"receivedAt": "2025-03-01T22:00:00Z"}));
        assert_eq!(resolve("is_night", &ev), 1.0);

        // offset-less timestamps still parse
        let ev = event(json!({"eventTime": "2025-03-01T02:15:00"}));
        assert_eq!(resolve("is_night", &ev), 1.0);
    }

    #[test]
    fn test_is_night_unparseable_timestamp_is_zero() {
        let ev = event(json!({"eventTime": "yesterday evening"}));
        assert_eq!(resolve("is_night", &ev), 0.0);

        let ev = event(json!({"eventTime": 1714500000}));
        assert_eq!(resolve("is_night", &ev), 0.0);

        let ev = event(json!({}));
        assert_eq!(resolve("is_night", &ev), 0.0);
    }

    #[test]
    fn test_is_night_event_time_shadows_received_at() {
        // an unparseable non-empty eventTime is consumed, not skipped; the
        // fallback source is only reached when eventTime is empty/absent
        let ev = event(json!({
            "eventTime": 1714500000,
            "receivedAt": "2025-03-01T23:00:00Z",
        }));
        assert_eq!(resolve("is_night", &ev), 0.0);

        for empty in [json!(null), json!(""), json!(0)] {
            let ev = event(json!({
                "eventTime": empty,
                "receivedAt": "2025-03-01T23:00:00Z",
            }));
            assert_eq!(resolve("is_night", &ev), 1.0);
        }
    }

    #[test]
    fn test_amount_risk_tier_mapping() {
        for (label, expected) in [
            ("LOW", 1.0),
            ("MEDIUM", 2.0),
            ("HIGH", 3.0),
            ("CRITICAL", 4.0),
            ("low", 1.0),
            ("critical", 4.0),
            ("UNKNOWN", 0.0),
        ] {
            let ev = event(json!({"amount_risk_tier": label}));
            assert_eq!(resolve("amount_risk_tier", &ev), expected, "label {label}");
        }

        let ev = event(json!({"amount_risk_tier": 3}));
        assert_eq!(resolve("amount_risk_tier", &ev), 3.0);

        let ev = event(json!({"amountRiskTier": "HIGH"}));
        assert_eq!(resolve("amount_risk_tier", &ev), 3.0);

        let ev = event(json!({}));
        assert_eq!(resolve("amount_risk_tier", &ev), 0.0);
    }

    #[test]
    fn test_avg_amount_usd_24h() {
        let ev = event(json!({"senderTotalAmountUsd24h": 300, "senderTxCount24h": 4}));
        assert_eq!(resolve("avg_amount_usd_24h", &ev), 75.0);

        let ev = event(json!({"senderTotalAmountUsd24h": 300, "senderTxCount24h": 0}));
        assert_eq!(resolve("avg_amount_usd_24h", &ev), 0.0);

        let ev = event(json!({"senderTotalAmountUsd24h": 300, "senderTxCount24h": -2}));
        assert_eq!(resolve("avg_amount_usd_24h", &ev), 0.0);

        let ev = event(json!({"senderTotalAmountUsd24h": 300}));
        assert_eq!(resolve("avg_amount_usd_24h", &ev), 0.0);
    }

    #[test]
    fn test_small_amount_burst_1m() {
        let ev = event(json!({"tx_count_1min": 5, "amountUsdEquivalent": 15}));
        assert_eq!(resolve("small_amount_burst_1m", &ev), 1.0);

        let ev = event(json!({"txCountLast1Min": 6, "amount_usd_equivalent": 10}));
        assert_eq!(resolve("small_amount_burst_1m", &ev), 1.0);

        let ev = event(json!({"tx_count_1min": 4, "amountUsdEquivalent": 10}));
        assert_eq!(resolve("small_amount_burst_1m", &ev), 0.0);

        let ev = event(json!({"tx_count_1min": 6, "amountUsdEquivalent": 16}));
        assert_eq!(resolve("small_amount_burst_1m", &ev), 0.0);
    }

    #[test]
    fn test_small_amount_spread_24h() {
        let ev = event(json!({"senderTxCount24h": 30, "senderTotalAmountUsd24h": 600}));
        assert_eq!(resolve("small_amount_spread_24h", &ev), 1.0);

        let ev = event(json!({"senderTxCount24h": 30, "senderTotalAmountUsd24h": 900}));
        assert_eq!(resolve("small_amount_spread_24h", &ev), 0.0);

        let ev = event(json!({"senderTxCount24h": 29, "senderTotalAmountUsd24h": 100}));
        assert_eq!(resolve("small_amount_spread_24h", &ev), 0.0);
    }

    #[test]
    fn test_worked_example_small_amount_burst() {
        // Event from a producer mixing conventions: burst position must be 1.0
        let ev = event(json!({
            "transactionId": "tx-1",
            "ruleBand": "GRAY",
            "amountUsdEquivalent": 10,
            "tx_count_1min": 6,
        }));
        let feature_order = order(&["amount", "small_amount_burst_1m", "amount_usd_equivalent"]);
        let vector = normalize(&ev, &feature_order);
        assert_eq!(vector, vec![0.0, 1.0, 10.0]);
    }
}
