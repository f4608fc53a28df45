//! End-to-end queries against a small dataset written to a temp directory.

use std::fs;
use std::path::Path;

use chrono::NaiveDate;
use tempfile::TempDir;

use nifty_marketdata::{
    MarketDataEngine, MarketDataError, OptionType, QueryFilter, SurfaceRequest,
    TimeSeriesRequest,
};

const STRIKES: [i64; 5] = [21500, 21600, 21700, 21800, 21900];

fn volume_for(strike: i64, right: &str) -> u64 {
    let base = (strike % 300 / 100 * 10) as u64;
    if right == "CE" {
        base
    } else {
        base + 5
    }
}

fn write_option_file(root: &Path, expiry: &str, trade_date: &str, times: &[&str]) {
    let dir = root.join("2024").join("2024JAN");
    fs::create_dir_all(&dir).unwrap();

    let mut body =
        String::from("datetime,strike_price,right,open,high,low,close,volume,open_interest\n");
    for time in times {
        for strike in STRIKES {
            for right in ["CE", "PE"] {
                let close = if right == "CE" {
                    (22000 - strike) as f64 / 2.0 + 50.0
                } else {
                    (strike - 21400) as f64 / 2.0 + 20.0
                };
                body.push_str(&format!(
                    "{time},{strike},{right},{},{},{},{close},{},{}\n",
                    close - 1.0,
                    close + 3.0,
                    close - 3.0,
                    volume_for(strike, right),
                    1000 + strike / 100,
                ));
            }
        }
    }
    fs::write(dir.join(format!("NIFTY-{expiry}-{trade_date}.csv")), body).unwrap();
}

fn write_spot_file(root: &Path) {
    let dir = root.join("2024").join("2024Nifty");
    fs::create_dir_all(&dir).unwrap();
    fs::write(
        dir.join("Nifty-2024JAN.csv"),
        "datetime,open,high,low,close\n\
         2024-01-01 09:15:00,21720,21740,21710,21731.4\n\
         2024-01-01 09:16:00,21731,21740,21730,21735.0\n\
         2024-01-01 10:00:00,21750,21765,21745,21760.0\n\
         2024-01-02 09:15:00,21640,21660,21630,21650.0\n\
         2024-01-02 10:00:00,21650,21660,21640,21655.0\n",
    )
    .unwrap();
}

/// Two trading days in January 2024; 03JAN24 is deliberately absent.
fn fixture() -> (TempDir, MarketDataEngine) {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    write_option_file(root, "04JAN24", "01JAN24", &["09:15:00", "10:00:00"]);
    write_option_file(root, "25JAN24", "01JAN24", &["09:15:00", "10:00:00"]);
    write_option_file(root, "11JAN24", "01JAN24", &["09:15:00"]);
    write_option_file(root, "25JAN24", "02JAN24", &["09:15:00", "10:00:00"]);
    write_spot_file(root);

    let engine = MarketDataEngine::new(root).unwrap();
    (dir, engine)
}

#[test]
fn test_unfiltered_query_returns_every_row() {
    let (_dir, md) = fixture();
    let frame = md
        .query_options("04JAN24", "01JAN24", &QueryFilter::default())
        .unwrap();

    assert_eq!(frame.len(), 2 * STRIKES.len() * 2);
    assert!(frame
        .iter()
        .all(|r| matches!(r.option_type, OptionType::Call | OptionType::Put)));
    assert!(frame.iter().all(|r| r.spot_price.is_some()));
    assert!(frame.iter().all(|r| r.market_price == r.close_price));

    // Merged output is in timestamp order.
    assert!(frame.rows().windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
}

#[test]
fn test_days_to_expiry_is_constant() {
    let (_dir, md) = fixture();
    let frame = md
        .query_options("25JAN24", "01JAN24", &QueryFilter::default())
        .unwrap();
    let expiry = NaiveDate::from_ymd_opt(2024, 1, 25).unwrap();

    assert!(frame.iter().all(|r| r.days_to_expiry == 24));
    assert!(frame.iter().all(|r| r.expiry_date == expiry));
}

#[test]
fn test_repeated_queries_are_identical() {
    let (_dir, md) = fixture();
    let filter = QueryFilter::new().option_type("P");
    let first = md.query_options("04JAN24", "01JAN24", &filter).unwrap();
    let second = md.query_options("04JAN24", "01JAN24", &filter).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_spot_cache_lifecycle() {
    let (dir, md) = fixture();
    assert!(md.cache_status().is_empty());

    md.load_spot_month("2024JAN").unwrap();
    let spot_path = dir.path().join("2024/2024Nifty/Nifty-2024JAN.csv");
    fs::remove_file(&spot_path).unwrap();

    // Served from memory: the file is gone but the load still succeeds.
    let series = md.load_spot_month("2024JAN").unwrap();
    assert_eq!(series.len(), 5);
    assert_eq!(md.cache_status().get("2024JAN"), Some(&5));
    assert_eq!(md.cache_status().len(), 1);

    assert_eq!(md.clear_spot_cache(), 1);
    assert!(md.cache_status().is_empty());

    let err = md.load_spot_month("2024JAN").unwrap_err();
    assert!(matches!(err, MarketDataError::FileNotAvailable { .. }));
}

#[test]
fn test_spot_is_nearest_observation() {
    let (_dir, md) = fixture();
    let frame = md
        .query_options("04JAN24", "01JAN24", &QueryFilter::default())
        .unwrap();

    for row in &frame {
        let expected = if row.timestamp.format("%H:%M").to_string() == "09:15" {
            21731.4
        } else {
            21760.0
        };
        assert_eq!(row.spot_price, Some(expected));
    }
}

#[test]
fn test_filter_composition() {
    let (_dir, md) = fixture();
    let filter = QueryFilter::new()
        .strikes([21000, 21500, 21800])
        .option_type("C")
        .min_volume(10);
    let frame = md.query_options("04JAN24", "01JAN24", &filter).unwrap();

    assert!(!frame.is_empty());
    for row in &frame {
        assert!(row.strike == 21500 || row.strike == 21800);
        assert_eq!(row.option_type, OptionType::Call);
        assert!(row.volume >= 10);
    }
    let expected = [21500, 21800]
        .iter()
        .filter(|s| volume_for(**s, "CE") >= 10)
        .count()
        * 2;
    assert_eq!(frame.len(), expected);
}

#[test]
fn test_time_window_is_inclusive() {
    let (_dir, md) = fixture();
    let filter = QueryFilter::new().at("2024-01-01 10:00");
    let frame = md.query_options("04JAN24", "01JAN24", &filter).unwrap();

    assert_eq!(frame.len(), STRIKES.len() * 2);
    assert!(frame.iter().all(|r| r.spot_price == Some(21760.0)));
}

#[test]
fn test_empty_result_is_not_an_error_by_default() {
    let (_dir, md) = fixture();
    let filter = QueryFilter::new().strikes([30000]);
    let frame = md.query_options("04JAN24", "01JAN24", &filter).unwrap();
    assert!(frame.is_empty());

    let err = md
        .query_options("04JAN24", "01JAN24", &filter.raise_if_empty(true))
        .unwrap_err();
    assert!(matches!(err, MarketDataError::NoDataReturned(_)));
    let msg = err.to_string();
    assert!(msg.contains("strikes"));
    assert!(msg.contains("min_volume"));
    assert!(msg.contains("04JAN24"));
}

#[test]
fn test_invalid_arguments() {
    let (_dir, md) = fixture();

    let err = md
        .query_options("04JAN24", "01JAN24", &QueryFilter::new().start("yesterday"))
        .unwrap_err();
    assert!(matches!(err, MarketDataError::InvalidParameter(_)));
    assert!(err.to_string().contains("yesterday"));

    let err = md
        .query_options("04JAN24", "01JAN24", &QueryFilter::new().end("not a time"))
        .unwrap_err();
    assert!(matches!(err, MarketDataError::InvalidParameter(_)));
    assert!(err.to_string().contains("'end'"));
    assert!(err.to_string().contains("not a time"));

    let request = TimeSeriesRequest {
        snapshot_time: Some("25:99".into()),
        ..TimeSeriesRequest::default()
    };
    let err = md
        .query_time_series("04JAN24", &["01JAN24"], &request)
        .unwrap_err();
    assert!(matches!(err, MarketDataError::InvalidParameter(_)));
    assert!(err.to_string().contains("25:99"));

    let err = md
        .query_options("04JAN24", "01JAN24", &QueryFilter::new().strikes([f64::NAN]))
        .unwrap_err();
    assert!(matches!(err, MarketDataError::InvalidParameter(_)));

    let err = md
        .query_options("04JAN24", "2024-01-01", &QueryFilter::default())
        .unwrap_err();
    assert!(err.to_string().contains("trade_date"));
}

#[test]
fn test_missing_spot_file_fails_query() {
    let dir = TempDir::new().unwrap();
    write_option_file(dir.path(), "04JAN24", "01JAN24", &["09:15:00"]);
    let md = MarketDataEngine::new(dir.path()).unwrap();

    let err = md
        .query_options("04JAN24", "01JAN24", &QueryFilter::default())
        .unwrap_err();
    assert!(matches!(err, MarketDataError::FileNotAvailable { .. }));
    assert!(err.to_string().contains("2024JAN"));
}

#[test]
fn test_discovery() {
    let (_dir, md) = fixture();
    assert_eq!(
        md.list_expiries("01JAN24").unwrap(),
        vec!["04JAN24", "11JAN24", "25JAN24"]
    );
    assert_eq!(md.list_strikes("04JAN24", "01JAN24").unwrap(), STRIKES.to_vec());
    assert_eq!(
        md.list_trading_days(2024, "JAN").unwrap(),
        vec!["01JAN24", "02JAN24"]
    );
}

#[test]
fn test_atm_grid() {
    let (_dir, md) = fixture();
    let grid = md.get_atm_strikes("04JAN24", "01JAN24", 5, 100).unwrap();

    assert_eq!(grid.atm, 21700);
    assert_eq!(grid.strikes.len(), 11);
    assert!(grid.strikes.windows(2).all(|w| w[1] - w[0] == 100));
    assert_eq!(grid.strikes[5], 21700);
}

#[test]
fn test_time_series_skips_missing_dates() {
    let (_dir, md) = fixture();
    let request = TimeSeriesRequest {
        option_type: Some("C".into()),
        snapshot_time: Some("10:00".into()),
        ..TimeSeriesRequest::default()
    };
    let frame = md
        .query_time_series("25JAN24", &["02JAN24", "03JAN24", "01JAN24"], &request)
        .unwrap();

    assert_eq!(frame.len(), 2 * STRIKES.len());
    let tags: Vec<&str> = frame
        .iter()
        .map(|r| r.trade_date.as_deref().unwrap())
        .collect();
    let split = STRIKES.len();
    assert!(tags[..split].iter().all(|t| *t == "02JAN24"));
    assert!(tags[split..].iter().all(|t| *t == "01JAN24"));

    let df = frame.to_dataframe().unwrap();
    assert_eq!(df.get_column_names()[0].to_string(), "trade_date");
}

#[test]
fn test_time_series_fails_when_every_date_fails() {
    let (_dir, md) = fixture();
    let err = md
        .query_time_series(
            "25JAN24",
            &["03JAN24", "04JAN24", "05JAN24"],
            &TimeSeriesRequest::default(),
        )
        .unwrap_err();
    assert!(matches!(err, MarketDataError::NoDataReturned(_)));
}

#[test]
fn test_surface_snapshot() {
    let (_dir, md) = fixture();
    let request = SurfaceRequest {
        n_strikes: 1,
        ..SurfaceRequest::default()
    };
    let frame = md
        .surface_snapshot("01JAN24", "2024-01-01 10:00", &request)
        .unwrap();

    // 11JAN24 has no 10:00 rows and contributes nothing.
    let jan11 = NaiveDate::from_ymd_opt(2024, 1, 11).unwrap();
    assert!(frame.iter().all(|r| r.expiry_date != jan11));
    assert_eq!(frame.len(), 2 * 3 * 2);

    let keys: Vec<_> = frame
        .iter()
        .map(|r| (r.expiry_date, r.strike, r.option_type))
        .collect();
    let mut sorted = keys.clone();
    sorted.sort();
    assert_eq!(keys, sorted);
    assert!(frame.iter().all(|r| [21600, 21700, 21800].contains(&r.strike)));
}

#[test]
fn test_surface_snapshot_without_data() {
    let (_dir, md) = fixture();
    let err = md
        .surface_snapshot("01JAN24", "2024-01-01 14:00", &SurfaceRequest::default())
        .unwrap_err();
    assert!(matches!(err, MarketDataError::NoDataReturned(_)));

    let err = md
        .surface_snapshot("05JAN24", "2024-01-05 10:00", &SurfaceRequest::default())
        .unwrap_err();
    assert!(matches!(err, MarketDataError::NoDataReturned(_)));
}

#[test]
fn test_engines_do_not_share_cache() {
    let (dir, first) = fixture();
    let second = MarketDataEngine::new(dir.path()).unwrap();
    first.load_spot_month("2024JAN").unwrap();
    assert_eq!(first.cache_status().len(), 1);
    assert!(second.cache_status().is_empty());
}
