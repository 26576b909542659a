use cryptofolio::core::config::AppConfig;
use cryptofolio::core::{LotSide, Position, WalletError};
use cryptofolio::{AppCommand, AppContext};
use std::fs;
use tracing::info;

mod test_utils {
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    pub const LISTING: &str = r#"{
        "data": [
            {"id": "bitcoin", "symbol": "BTC", "priceUsd": "50000.0"},
            {"id": "ethereum", "symbol": "ETH", "priceUsd": "2000.0"},
            {"id": "ripple", "symbol": "XRP", "priceUsd": "0.5"},
            {"id": "solana", "symbol": "SOL", "priceUsd": "150.0"}
        ]
    }"#;

    pub async fn mount(server: &MockServer, url_path: &str, status: u16, body: &str) {
        Mock::given(method("GET"))
            .and(path(url_path))
            .respond_with(ResponseTemplate::new(status).set_body_string(body))
            .mount(server)
            .await;
    }

    pub fn price_body(price: &str) -> String {
        format!(r#"{{"data": {{"priceUsd": "{price}"}}}}"#)
    }

    /// Provider with BTC, XRP and SOL priced and ETH failing.
    pub async fn create_mock_server() -> MockServer {
        let server = MockServer::start().await;
        mount(&server, "/assets", 200, LISTING).await;
        mount(&server, "/assets/bitcoin", 200, &price_body("55000")).await;
        mount(&server, "/assets/ripple", 200, &price_body("0.475")).await;
        mount(&server, "/assets/solana", 200, &price_body("150.25")).await;
        mount(&server, "/assets/ethereum", 500, "upstream timeout").await;
        server
    }

    pub fn config_yaml(base_url: &str) -> String {
        format!(
            r#"
wallet:
  positions:
    - symbol: "btc"
      quantity: 1.0
      purchase_price: 50000.0
    - symbol: "ETH"
      quantity: 2.0
      purchase_price: 1500.0
    - symbol: "XRP"
      quantity: 1000.0
      purchase_price: 0.5
providers:
  coincap:
    base_url: {base_url}
refresh:
  workers: 2
  retries: 0
"#
        )
    }
}

fn context_for(base_url: &str) -> AppContext {
    let config: AppConfig =
        serde_yaml::from_str(&test_utils::config_yaml(base_url)).expect("valid config");
    AppContext::from_config(config).expect("context")
}

#[test_log::test(tokio::test)]
async fn test_refresh_then_valuate_wallet() {
    let server = test_utils::create_mock_server().await;
    let ctx = context_for(&server.uri());

    let updated = ctx.refresh_once().await.unwrap();
    info!(?updated, "Refresh pass finished");
    assert_eq!(updated, 2);

    assert_eq!(ctx.prices().fetch_latest_price("BTC").unwrap(), 55000.0);
    assert_eq!(
        ctx.prices().fetch_latest_price("ETH"),
        Err(WalletError::PriceUnavailable("ETH".to_string()))
    );
    // SOL is listed but neither held nor tracked
    assert!(ctx.prices().fetch_latest_price("SOL").is_err());

    let positions = vec![
        Position::new("BTC", 1.0, 50000.0),
        Position::new("ETH", 2.0, 1500.0),
        Position::new("XRP", 1000.0, 0.5),
    ];
    assert_eq!(ctx.valuation.total_purchase_value(&positions), 53500.0);
    assert_eq!(ctx.valuation.total_current_value(&positions), 55475.0);

    let best = ctx.valuation.best_performing(&positions).unwrap();
    assert_eq!(best.symbol, "BTC");
    assert_eq!(best.growth_rate, 10.0);
    let worst = ctx.valuation.worst_performing(&positions).unwrap();
    assert_eq!(worst.symbol, "XRP");
    assert_eq!(worst.growth_rate, -5.0);
}

#[test_log::test(tokio::test)]
async fn test_stale_price_survives_failed_refresh() {
    let server = test_utils::create_mock_server().await;
    let ctx = context_for(&server.uri());
    ctx.refresh_once().await.unwrap();

    server.reset().await;
    test_utils::mount(&server, "/assets/bitcoin", 503, "down").await;
    test_utils::mount(
        &server,
        "/assets/ripple",
        200,
        &test_utils::price_body("0.6"),
    )
    .await;

    assert_eq!(ctx.refresh_once().await.unwrap(), 1);
    assert_eq!(ctx.prices().fetch_latest_price("btc").unwrap(), 55000.0);
    assert_eq!(ctx.prices().fetch_latest_price("XRP").unwrap(), 0.6);
}

#[test_log::test(tokio::test)]
async fn test_listing_outage_degrades_to_empty_pass() {
    let server = wiremock::MockServer::start().await;
    test_utils::mount(&server, "/assets", 503, "maintenance").await;
    let ctx = context_for(&server.uri());

    assert_eq!(ctx.refresh_once().await.unwrap(), 0);
    assert!(ctx.prices().is_empty());
    assert!(ctx.refresher.index().is_empty());
}

#[test_log::test(tokio::test)]
async fn test_full_app_flow_with_mock() {
    let server = test_utils::create_mock_server().await;

    let config_file = tempfile::NamedTempFile::new().expect("Failed to create temp file");
    let config_path = config_file.path();
    fs::write(config_path, test_utils::config_yaml(&server.uri()))
        .expect("Failed to write config file");

    let result = cryptofolio::run_command(AppCommand::Summary, config_path.to_str()).await;
    assert!(
        result.is_ok(),
        "Summary command failed with: {:?}",
        result.err()
    );

    let result =
        cryptofolio::run_command(AppCommand::Price("sol".to_string()), config_path.to_str()).await;
    assert!(result.is_ok(), "Price command failed with: {:?}", result.err());

    let result =
        cryptofolio::run_command(AppCommand::Price("eth".to_string()), config_path.to_str()).await;
    let err = result.expect_err("ETH has no price");
    assert!(err.to_string().contains("Price not available for symbol: ETH"));

    let result =
        cryptofolio::run_command(AppCommand::Price("  ".to_string()), config_path.to_str()).await;
    assert!(result.unwrap_err().to_string().contains("Invalid symbol"));
}

#[test_log::test(tokio::test)]
async fn test_missing_config_file_fails() {
    let result =
        cryptofolio::run_command(AppCommand::Summary, Some("/nonexistent/config.yaml")).await;
    assert!(result.is_err());
}

#[test_log::test(tokio::test)]
async fn test_buy_and_sell_write_wallet_back_to_config() {
    let server = test_utils::create_mock_server().await;

    let config_file = tempfile::NamedTempFile::new().expect("Failed to create temp file");
    let config_path = config_file.path();
    fs::write(config_path, test_utils::config_yaml(&server.uri()))
        .expect("Failed to write config file");
    let path = config_path.to_str();

    let buy = |symbol: &str, quantity| AppCommand::Buy {
        symbol: symbol.to_string(),
        quantity,
    };
    let sell = |symbol: &str, quantity| AppCommand::Sell {
        symbol: symbol.to_string(),
        quantity,
    };

    cryptofolio::run_command(buy("sol", 2.0), path).await.unwrap();
    cryptofolio::run_command(buy("btc", 0.5), path).await.unwrap();
    cryptofolio::run_command(sell("XRP", 1000.0), path).await.unwrap();

    let err = cryptofolio::run_command(sell("ETH", 1.0), path)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("Price not available for symbol: ETH"));
    let err = cryptofolio::run_command(sell("DOGE", 1.0), path)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("not found"));
    let err = cryptofolio::run_command(buy("BTC", -1.0), path)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("Invalid quantity"));

    let saved = AppConfig::load_from_path(config_path).unwrap();
    assert_eq!(
        saved.wallet.positions,
        vec![
            Position::new("BTC", 1.5, 50000.0),
            Position::new("ETH", 2.0, 1500.0),
            Position::new("SOL", 2.0, 150.25),
        ]
    );
    let lots: Vec<_> = saved
        .wallet
        .lots
        .iter()
        .map(|lot| (lot.symbol.as_str(), lot.side, lot.quantity, lot.price))
        .collect();
    assert_eq!(
        lots,
        vec![
            ("SOL", LotSide::Buy, 2.0, 150.25),
            ("BTC", LotSide::Buy, 0.5, 55000.0),
            ("XRP", LotSide::Sell, 1000.0, 0.475),
        ]
    );
    assert_eq!(saved.coincap_base_url(), server.uri());
    assert_eq!(saved.refresh.workers, 2);
}

#[test_log::test(tokio::test)]
async fn test_invalid_positions_in_config_are_rejected() {
    let config_file = tempfile::NamedTempFile::new().expect("Failed to create temp file");
    fs::write(
        config_file.path(),
        "wallet:\n  positions:\n    - {symbol: BTC, quantity: -2.0, purchase_price: 100.0}\n",
    )
    .unwrap();

    let err = cryptofolio::run_command(AppCommand::Summary, config_file.path().to_str())
        .await
        .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<WalletError>(),
        Some(WalletError::InvalidQuantity(_))
    ));
}

