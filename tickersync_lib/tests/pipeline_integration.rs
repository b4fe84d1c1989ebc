use std::collections::HashMap;

use chrono::NaiveDate;
use serde_json::json;
use tickersync_lib::config::{
    API_KEY_VAR, BASE_URL_VAR, PAGE_DELAY_VAR, RATE_LIMIT_BACKOFF_VAR, RETRY_BASE_VAR,
    RETRY_MAX_VAR, WAREHOUSE_DATABASE_VAR, WAREHOUSE_TABLE_VAR,
};
use tickersync_lib::{AppConfig, CsvTarget, Pipeline, SinkTargets, Warehouse};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn app_config(server: &MockServer, database: Option<&str>) -> AppConfig {
    let mut vars: HashMap<&str, String> = HashMap::from([
        (API_KEY_VAR, "test-key".to_string()),
        (BASE_URL_VAR, server.uri()),
        (PAGE_DELAY_VAR, "0".to_string()),
        (RATE_LIMIT_BACKOFF_VAR, "0".to_string()),
        (RETRY_MAX_VAR, "1".to_string()),
        (RETRY_BASE_VAR, "0".to_string()),
    ]);
    if let Some(database) = database {
        vars.insert(WAREHOUSE_DATABASE_VAR, database.to_string());
        vars.insert(WAREHOUSE_TABLE_VAR, "RAW_TICKERS".to_string());
    }
    AppConfig::from_lookup(move |key: &str| vars.get(key).cloned()).unwrap()
}

async fn mount_two_pages(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/v3/reference/tickers"))
        .and(query_param("market", "stocks"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "OK",
            "results": [
                { "ticker": "A", "name": "Agilent Technologies Inc.", "active": true,
                  "last_updated_utc": "2026-02-07T07:07:28.766612314Z" },
                { "ticker": "AA", "name": "Alcoa Corporation", "active": true }
            ],
            "next_url": format!("{}/v3/reference/tickers?cursor=p2", server.uri())
        })))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v3/reference/tickers"))
        .and(query_param("cursor", "p2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "OK",
            "results": [ { "ticker": "AAPL", "name": "Apple Inc.", "active": true } ]
        })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn run_once_writes_both_sinks_with_one_partition_date() {
    let server = MockServer::start().await;
    mount_two_pages(&server).await;

    let dir = tempfile::tempdir().unwrap();
    let csv_path = dir.path().join("tickers.csv");
    let db_path = dir.path().join("tickers.db");
    let config = app_config(&server, db_path.to_str());
    let ds = NaiveDate::from_ymd_opt(2026, 10, 15).unwrap();

    let targets = SinkTargets {
        csv: Some(CsvTarget {
            path: csv_path.clone(),
            include_partition: true,
        }),
        warehouse: true,
    };
    let pipeline = Pipeline::new(&config, targets, Some(ds)).unwrap();
    let summary = pipeline.run_once().await;

    assert!(summary.is_success(), "failures: {:?}", summary.failures());
    assert_eq!(summary.fetched, 3);
    assert_eq!(summary.ds, ds);
    assert_eq!(summary.csv.as_ref().unwrap().as_ref().unwrap().rows, 3);
    assert_eq!(summary.warehouse.as_ref().unwrap().as_ref().unwrap().rows, 3);

    let mut rdr = csv::Reader::from_path(&csv_path).unwrap();
    let rows: Vec<csv::StringRecord> = rdr.records().map(|r| r.unwrap()).collect();
    let tickers: Vec<&str> = rows.iter().map(|r| &r[0]).collect();
    assert_eq!(tickers, vec!["A", "AA", "AAPL"]);
    assert!(rows.iter().all(|r| &r[12] == "2026-10-15"));

    let wh = Warehouse::connect(config.warehouse.as_ref().unwrap()).unwrap();
    assert_eq!(wh.partition_count(ds).unwrap(), 3);
}

#[tokio::test]
async fn failed_fetch_skips_sinks_and_keeps_previous_csv() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v3/reference/tickers"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let csv_path = dir.path().join("tickers.csv");
    std::fs::write(&csv_path, "ticker\nOLD\n").unwrap();
    let config = app_config(&server, None);

    let targets = SinkTargets {
        csv: Some(CsvTarget {
            path: csv_path.clone(),
            include_partition: false,
        }),
        warehouse: false,
    };
    let summary = Pipeline::new(&config, targets, None)
        .unwrap()
        .run_once()
        .await;

    assert!(!summary.is_success());
    assert!(summary.termination.is_failure());
    assert!(summary.csv.is_none());
    assert_eq!(
        std::fs::read_to_string(&csv_path).unwrap(),
        "ticker\nOLD\n"
    );
}

#[tokio::test]
async fn warehouse_sink_failure_does_not_block_csv() {
    let server = MockServer::start().await;
    mount_two_pages(&server).await;

    let dir = tempfile::tempdir().unwrap();
    let csv_path = dir.path().join("tickers.csv");
    let db_path = dir.path().join("missing").join("tickers.db");
    let config = app_config(&server, db_path.to_str());

    let targets = SinkTargets {
        csv: Some(CsvTarget {
            path: csv_path.clone(),
            include_partition: false,
        }),
        warehouse: true,
    };
    let summary = Pipeline::new(&config, targets, None)
        .unwrap()
        .run_once()
        .await;

    assert!(!summary.is_success());
    assert_eq!(summary.failures().len(), 1);
    assert!(summary.csv.as_ref().unwrap().is_ok());
    assert!(summary.warehouse.as_ref().unwrap().is_err());
    assert!(csv_path.exists());
}

#[tokio::test]
async fn warehouse_target_requires_configuration() {
    let server = MockServer::start().await;
    let config = app_config(&server, None);
    let targets = SinkTargets {
        csv: None,
        warehouse: true,
    };
    assert!(Pipeline::new(&config, targets, None).is_err());
}

#[tokio::test]
async fn persistent_rate_limit_on_first_page_keeps_previous_csv() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v3/reference/tickers"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "ERROR",
            "error": "You've exceeded the maximum requests per minute."
        })))
        .expect(2)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let csv_path = dir.path().join("tickers.csv");
    std::fs::write(&csv_path, "ticker\nGOOD1\nGOOD2\n").unwrap();
    let config = app_config(&server, None);

    let targets = SinkTargets {
        csv: Some(CsvTarget {
            path: csv_path.clone(),
            include_partition: true,
        }),
        warehouse: false,
    };
    let summary = Pipeline::new(&config, targets, None)
        .unwrap()
        .run_once()
        .await;

    assert!(!summary.is_success());
    assert!(summary.csv.is_none());
    assert_eq!(
        std::fs::read_to_string(&csv_path).unwrap(),
        "ticker\nGOOD1\nGOOD2\n"
    );
}
