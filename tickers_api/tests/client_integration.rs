use tickers_api::{Client, Error, TickerQuery};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn load_fixture(name: &str) -> String {
    std::fs::read_to_string(format!("tests/fixtures/{}", name)).unwrap()
}

#[tokio::test]
async fn list_tickers_success() {
    let mock_server = MockServer::start().await;
    let body = load_fixture("tickers_page.json");

    Mock::given(method("GET"))
        .and(path("/v3/reference/tickers"))
        .and(query_param("market", "stocks"))
        .and(query_param("active", "true"))
        .and(query_param("order", "asc"))
        .and(query_param("sort", "ticker"))
        .and(query_param("limit", "1000"))
        .and(query_param("apiKey", "test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_string(&body))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = Client::with_base_url(&mock_server.uri(), "test-key").unwrap();
    let page = client.list_tickers(&TickerQuery::default()).await.unwrap();

    let results = page.results.unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0].ticker, "A");
    assert_eq!(results[1].ticker, "JLQD");
}

#[tokio::test]
async fn follow_cursor_appends_api_key() {
    let mock_server = MockServer::start().await;
    let body = load_fixture("tickers_last_page.json");

    Mock::given(method("GET"))
        .and(path("/v3/reference/tickers"))
        .and(query_param("cursor", "abc"))
        .and(query_param("apiKey", "test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_string(&body))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = Client::with_base_url(&mock_server.uri(), "test-key").unwrap();
    let cursor = format!("{}/v3/reference/tickers?cursor=abc", mock_server.uri());
    let page = client.follow_cursor(&cursor).await.unwrap();

    assert!(page.next_url.is_none());
    assert_eq!(page.results.unwrap()[0].ticker, "ZZZ");
}

#[tokio::test]
async fn error_body_with_ok_status_is_returned_as_page() {
    let mock_server = MockServer::start().await;
    let body = load_fixture("tickers_error.json");

    Mock::given(method("GET"))
        .and(path("/v3/reference/tickers"))
        .respond_with(ResponseTemplate::new(200).set_body_string(&body))
        .mount(&mock_server)
        .await;

    let client = Client::with_base_url(&mock_server.uri(), "test-key").unwrap();
    let page = client.list_tickers(&TickerQuery::default()).await.unwrap();
    assert!(page.is_error());
}

#[tokio::test]
async fn too_many_requests_maps_to_rate_limited() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v3/reference/tickers"))
        .respond_with(ResponseTemplate::new(429).set_body_string(load_fixture("tickers_error.json")))
        .mount(&mock_server)
        .await;

    let client = Client::with_base_url(&mock_server.uri(), "test-key").unwrap();
    let result = client.list_tickers(&TickerQuery::default()).await;
    assert!(matches!(result, Err(Error::RateLimited)));
}

#[tokio::test]
async fn server_error_carries_status_and_body() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v3/reference/tickers"))
        .respond_with(ResponseTemplate::new(502).set_body_string("Bad Gateway"))
        .mount(&mock_server)
        .await;

    let client = Client::with_base_url(&mock_server.uri(), "test-key").unwrap();
    let result = client.list_tickers(&TickerQuery::default()).await;
    match result {
        Err(Error::HttpStatus { status, body }) => {
            assert_eq!(status, 502);
            assert_eq!(body, "Bad Gateway");
        }
        other => panic!("expected HttpStatus, got {:?}", other.map(|_| ())),
    }
}

#[tokio::test]
async fn malformed_json_is_a_decode_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v3/reference/tickers"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{not valid json}"))
        .mount(&mock_server)
        .await;

    let client = Client::with_base_url(&mock_server.uri(), "test-key").unwrap();
    let result = client.list_tickers(&TickerQuery::default()).await;
    assert!(matches!(result, Err(Error::Decode(_))));
}
