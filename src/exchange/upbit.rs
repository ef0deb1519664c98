use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::NaiveDateTime;
use jsonwebtoken::{encode, EncodingKey, Header};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha512};
use std::collections::{HashMap, HashSet};
use std::time::{Duration, Instant};
use uuid::Uuid;

use crate::config::Config;
use crate::error::EngineError;
use crate::exchange::MarketApi;
use crate::models::{BookLevel, Candle, CandleSeries, Holding, OrderBook};

const BASE_URL: &str = "https://api.upbit.com";
const MIN_REQUEST_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Debug, Serialize)]
struct JwtClaims {
    access_key: String,
    nonce: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    query_hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    query_hash_alg: Option<&'static str>,
}

#[derive(Debug, Deserialize)]
struct RawCandle {
    candle_date_time_utc: String,
    opening_price: f64,
    high_price: f64,
    low_price: f64,
    trade_price: f64,
    candle_acc_trade_volume: f64,
}

#[derive(Debug, Deserialize)]
struct MarketInfo {
    market: String,
    #[serde(default)]
    market_warning: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OrderbookResponse {
    orderbook_units: Vec<OrderbookUnit>,
}

#[derive(Debug, Deserialize)]
struct OrderbookUnit {
    ask_price: f64,
    bid_price: f64,
    ask_size: f64,
    bid_size: f64,
}

#[derive(Debug, Deserialize)]
struct TickerQuote {
    trade_price: f64,
}

#[derive(Debug, Deserialize)]
struct Account {
    currency: String,
    balance: String,
    locked: String,
    avg_buy_price: String,
}

#[derive(Debug, Deserialize)]
struct OrderResponse {
    uuid: Option<String>,
    error: Option<OrderError>,
}

#[derive(Debug, Deserialize)]
struct OrderError {
    message: String,
}

/// Upbit REST client with JWT auth and a soft request-interval limit.
pub struct UpbitClient {
    client: Client,
    access_key: String,
    secret_key: String,
    fiat: String,
    last_request: Option<Instant>,
    cache: HashMap<String, (Instant, CandleSeries)>,
    cache_ttl: Duration,
}

impl UpbitClient {
    pub fn new(cfg: &Config) -> Self {
        Self {
            client: Client::new(),
            access_key: cfg.upbit_access_key.clone(),
            secret_key: cfg.upbit_secret_key.clone(),
            fiat: cfg.fiat.clone(),
            last_request: None,
            cache: HashMap::new(),
            cache_ttl: Duration::from_secs(5),
        }
    }

    /// Upbit signs requests with an HS256 JWT carrying a v4 nonce; requests
    /// with parameters additionally carry a SHA-512 hash of the query string.
    fn generate_jwt(&self, query: Option<&str>) -> Result<String> {
        if self.access_key.is_empty() || self.secret_key.is_empty() {
            return Err(EngineError::ConfigurationMissing("upbit api keys").into());
        }

        let (query_hash, query_hash_alg) = match query {
            Some(q) => {
                let mut hasher = Sha512::new();
                hasher.update(q.as_bytes());
                (Some(hex::encode(hasher.finalize())), Some("SHA512"))
            }
            None => (None, None),
        };

        let claims = JwtClaims {
            access_key: self.access_key.clone(),
            nonce: Uuid::new_v4().to_string(),
            query_hash,
            query_hash_alg,
        };

        let key = EncodingKey::from_secret(self.secret_key.as_bytes());
        encode(&Header::default(), &claims, &key).context("Failed to encode JWT")
    }

    async fn rate_limit(&mut self) {
        if let Some(last) = self.last_request {
            let elapsed = last.elapsed();
            if elapsed < MIN_REQUEST_INTERVAL {
                tokio::time::sleep(MIN_REQUEST_INTERVAL - elapsed).await;
            }
        }
        self.last_request = Some(Instant::now());
    }

    async fn get_public<T: serde::de::DeserializeOwned>(
        &mut self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        self.rate_limit().await;

        let resp = self
            .client
            .get(format!("{}{}", BASE_URL, path))
            .query(query)
            .send()
            .await
            .with_context(|| format!("Failed to fetch {path}"))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("Upbit API error {}: {}", status, body);
        }

        resp.json::<T>()
            .await
            .with_context(|| format!("Failed to parse {path} response"))
    }
}

#[async_trait]
impl MarketApi for UpbitClient {
    async fn fetch_tickers(&mut self) -> Result<Vec<String>> {
        let markets: Vec<MarketInfo> = self
            .get_public("/v1/market/all", &[("is_details", "false".to_string())])
            .await?;
        let prefix = format!("{}-", self.fiat);
        Ok(markets
            .into_iter()
            .map(|m| m.market)
            .filter(|m| m.starts_with(&prefix))
            .collect())
    }

    async fn fetch_candles(&mut self, ticker: &str, count: usize) -> Result<CandleSeries> {
        let cache_key = format!("{ticker}_{count}");
        if let Some((cached_at, series)) = self.cache.get(&cache_key) {
            if cached_at.elapsed() < self.cache_ttl {
                return Ok(series.clone());
            }
        }

        let raw: Vec<RawCandle> = self
            .get_public(
                "/v1/candles/minutes/15",
                &[
                    ("market", ticker.to_string()),
                    ("count", count.to_string()),
                ],
            )
            .await?;

        // Upbit returns newest first, we want oldest first.
        let mut candles: Vec<Candle> = raw
            .into_iter()
            .filter_map(|rc| {
                let naive =
                    NaiveDateTime::parse_from_str(&rc.candle_date_time_utc, "%Y-%m-%dT%H:%M:%S")
                        .ok()?;
                Some(Candle {
                    timestamp: naive.and_utc(),
                    open: rc.opening_price,
                    high: rc.high_price,
                    low: rc.low_price,
                    close: rc.trade_price,
                    volume: rc.candle_acc_trade_volume,
                })
            })
            .collect();
        candles.sort_by_key(|c| c.timestamp);

        let series = CandleSeries::new(candles);
        self.cache
            .insert(cache_key, (Instant::now(), series.clone()));

        Ok(series)
    }

    async fn fetch_order_book(&mut self, ticker: &str) -> Result<OrderBook> {
        let books: Vec<OrderbookResponse> = self
            .get_public("/v1/orderbook", &[("markets", ticker.to_string())])
            .await?;

        let book = books
            .into_iter()
            .next()
            .context("Empty orderbook response")?;

        let mut out = OrderBook::default();
        for unit in book.orderbook_units {
            out.bids.push(BookLevel {
                price: unit.bid_price,
                size: unit.bid_size,
            });
            out.asks.push(BookLevel {
                price: unit.ask_price,
                size: unit.ask_size,
            });
        }
        Ok(out)
    }

    async fn fetch_current_price(&mut self, ticker: &str) -> Result<f64> {
        let quotes: Vec<TickerQuote> = self
            .get_public("/v1/ticker", &[("markets", ticker.to_string())])
            .await?;
        quotes
            .first()
            .map(|q| q.trade_price)
            .context("No price in ticker response")
    }

    async fn fetch_cash(&mut self) -> Result<f64> {
        let accounts = self.fetch_accounts().await?;
        Ok(accounts
            .iter()
            .find(|a| a.currency == self.fiat)
            .and_then(|a| a.balance.parse::<f64>().ok())
            .unwrap_or(0.0))
    }

    async fn fetch_holdings(&mut self) -> Result<Vec<Holding>> {
        let accounts = self.fetch_accounts().await?;
        let holdings = accounts
            .into_iter()
            .filter(|a| a.currency != self.fiat)
            .filter_map(|a| {
                let balance: f64 = a.balance.parse().ok()?;
                let locked: f64 = a.locked.parse().ok()?;
                let avg: f64 = a.avg_buy_price.parse().ok()?;
                let quantity = balance + locked;
                if quantity <= 0.0 {
                    return None;
                }
                Some(Holding {
                    ticker: format!("{}-{}", self.fiat, a.currency),
                    quantity,
                    avg_buy_price: avg,
                })
            })
            .collect();
        Ok(holdings)
    }

    async fn fetch_risk_flags(&mut self) -> Result<HashSet<String>> {
        let markets: Vec<MarketInfo> = self
            .get_public("/v1/market/all", &[("is_details", "true".to_string())])
            .await?;
        Ok(markets
            .into_iter()
            .filter(|m| {
                m.market_warning
                    .as_deref()
                    .is_some_and(|w| w != "NONE")
            })
            .map(|m| m.market)
            .collect())
    }

    async fn place_market_buy(&mut self, ticker: &str, krw_amount: f64) -> Result<String> {
        let params = [
            ("market", ticker.to_string()),
            ("side", "bid".to_string()),
            ("price", format!("{:.0}", krw_amount)),
            ("ord_type", "price".to_string()),
        ];
        self.place_order(&params).await
    }

    async fn place_market_sell(&mut self, ticker: &str, quantity: f64) -> Result<String> {
        let params = [
            ("market", ticker.to_string()),
            ("side", "ask".to_string()),
            ("volume", format!("{}", quantity)),
            ("ord_type", "market".to_string()),
        ];
        self.place_order(&params).await
    }
}

impl UpbitClient {
    async fn fetch_accounts(&mut self) -> Result<Vec<Account>> {
        self.rate_limit().await;
        let jwt = self.generate_jwt(None)?;

        let resp = self
            .client
            .get(format!("{}/v1/accounts", BASE_URL))
            .header("Authorization", format!("Bearer {jwt}"))
            .send()
            .await
            .context("Failed to fetch accounts")?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("Upbit accounts error {}: {}", status, body);
        }

        resp.json().await.context("Failed to parse accounts")
    }

    async fn place_order(&mut self, params: &[(&str, String)]) -> Result<String> {
        self.rate_limit().await;

        let query: String = params
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("&");
        let jwt = self.generate_jwt(Some(&query))?;

        let body: HashMap<&str, &str> = params.iter().map(|(k, v)| (*k, v.as_str())).collect();

        let resp = self
            .client
            .post(format!("{}/v1/orders", BASE_URL))
            .header("Authorization", format!("Bearer {jwt}"))
            .json(&body)
            .send()
            .await
            .context("Failed to place order")?;

        let status = resp.status();
        let order: OrderResponse = resp.json().await.context("Failed to parse order response")?;

        if let Some(err) = order.error {
            return Err(EngineError::OrderRejected(err.message).into());
        }
        match order.uuid {
            Some(uuid) => Ok(uuid),
            None => Err(EngineError::OrderRejected(format!("no order id, status {status}")).into()),
        }
    }
}
