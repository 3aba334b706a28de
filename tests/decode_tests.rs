use chrono::{TimeZone, Utc};
use rust_decimal_macros::dec;
use serde_json::json;

use bitkub_sdk::error_codes::{error_message, known_codes, lookup};
use bitkub_sdk::*;

#[test]
fn page_info_number_and_string_forms_match() {
    let numbers: PageInfo =
        serde_json::from_value(json!({"page": 1, "last": 3, "next": 2, "prev": 0})).unwrap();
    let strings: PageInfo =
        serde_json::from_value(json!({"page": "1", "last": "3", "next": "2", "prev": null})).unwrap();
    let floats: PageInfo = serde_json::from_value(json!({"page": 0.6, "last": 2.5, "next": 2})).unwrap();
    assert_eq!(numbers, strings);
    assert_eq!(numbers, floats);
}

#[test]
fn page_info_rejects_non_numeric_counter() {
    let err = serde_json::from_value::<PageInfo>(json!({"page": [1]})).unwrap_err();
    assert!(err.to_string().contains("page"), "{err}");
}

#[test]
fn user_limits_with_mixed_number_shapes() {
    let limits: UserLimits = serde_json::from_value(json!({
        "limits": {
            "crypto": {"deposit": 0.88971929, "withdraw": "0.88971929"},
            "fiat": {"deposit": 200000, "withdraw": "200000"}
        },
        "usage": {
            "crypto": {
                "deposit": 0, "withdraw": "0",
                "deposit_percentage": 0, "withdraw_percentage": "0",
                "deposit_thb_equivalent": 0, "withdraw_thb_equivalent": "0"
            },
            "fiat": {
                "deposit": 0, "withdraw": 0,
                "deposit_percentage": 0, "withdraw_percentage": "12.5"
            }
        },
        "rate": 224790
    }))
    .unwrap();

    assert_eq!(limits.limits.crypto.deposit, dec!(0.88971929));
    assert_eq!(limits.limits.crypto.withdraw, dec!(0.88971929));
    assert_eq!(limits.limits.fiat.withdraw, dec!(200000));
    assert_eq!(limits.usage.fiat.withdraw_percentage, dec!(12.5));
    assert_eq!(limits.usage.crypto.limit.withdraw, dec!(0));
    assert_eq!(limits.rate, dec!(224790));
}

#[test]
fn user_limits_missing_sections_default() {
    let limits: UserLimits = serde_json::from_value(json!({"rate": "1"})).unwrap();
    assert_eq!(limits.limits, KycLimits::default());
    assert_eq!(limits.rate, dec!(1));
}

#[test]
fn timestamp_round_trips_through_chrono() {
    let instant = Utc.with_ymd_and_hms(2020, 1, 1, 12, 30, 0).unwrap();
    let ts = Timestamp::new(instant);
    assert_eq!(ts.to_datetime(), Some(instant));
    assert_eq!(Timestamp::from(std::time::SystemTime::from(instant)), ts);
    assert_eq!(ts.to_string(), "2020-01-01T12:30:00Z");
}

#[test]
fn trade_row_from_strings() {
    let trade: TradeEntry =
        serde_json::from_value(json!(["1620000000", "123.45", "0.01", "BUY"])).unwrap();
    assert_eq!(trade.timestamp, Timestamp::from_unix(1620000000));
    assert_eq!(trade.rate, dec!(123.45));
    assert_eq!(trade.amount, dec!(0.01));
    assert_eq!(trade.side, "BUY");

    assert!(serde_json::from_value::<TradeEntry>(json!(["1620000000", "123.45", "0.01"])).is_err());
}

#[test]
fn trade_rows_serialize_positionally() {
    let trade: TradeEntry =
        serde_json::from_value(json!(["1529516287", "10000.5", "0.1", "BUY"])).unwrap();
    let back = serde_json::to_value(&trade).unwrap();
    assert_eq!(back[0], 1529516287);
    assert_eq!(back[3], "BUY");
    assert_eq!(back.as_array().unwrap().len(), TradeEntry::ARITY);
}

#[test]
fn catalog_is_sorted_and_complete() {
    let codes: Vec<i64> = known_codes().collect();
    assert!(codes.windows(2).all(|w| w[0] < w[1]));
    assert_eq!(lookup(0), Some("No error"));
    assert_eq!(lookup(6), Some("Missing / invalid signature"));
    assert_eq!(lookup(90), Some("Server error (please contact support)"));
    assert_eq!(lookup(26), None);
    assert_eq!(error_message(26), "Unknown error 26");
}
