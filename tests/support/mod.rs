#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::get;
use axum::{Json, Router};
use reqwest::Url;
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use coin_screener::engine::{SessionHandle, SessionSettings, View, spawn_session};
use coin_screener::market_data::{
    FetchError, Listing, ListingsQuery, LogoInfo, LogoMap, MarketDataSource, QueryClient,
};

pub fn listing(id: u64) -> Listing {
    serde_json::from_value(listing_json(id)).expect("fixture listing")
}

fn listing_json(id: u64) -> Value {
    json!({
        "id": id,
        "name": format!("Coin {id}"),
        "symbol": format!("C{id}"),
        "slug": format!("coin-{id}"),
        "cmc_rank": id,
        "quote": {"USD": {
            "price": id as f64 * 2.0,
            "market_cap": id as f64 * 1_000_000.0,
            "percent_change_24h": 0.5,
        }},
    })
}

/// In-process source with `total` coins ranked by id.
pub struct FixtureSource {
    total: u64,
    calls: Mutex<Vec<ListingsQuery>>,
    fail: Mutex<Option<FetchError>>,
}

impl FixtureSource {
    pub fn new(total: u64) -> Arc<Self> {
        Arc::new(Self {
            total,
            calls: Mutex::new(Vec::new()),
            fail: Mutex::new(None),
        })
    }

    pub fn calls(&self) -> Vec<ListingsQuery> {
        self.calls.lock().unwrap().clone()
    }

    pub fn fail_with(&self, error: FetchError) {
        *self.fail.lock().unwrap() = Some(error);
    }
}

#[async_trait]
impl MarketDataSource for FixtureSource {
    async fn fetch_listings(&self, query: &ListingsQuery) -> Result<Vec<Listing>, FetchError> {
        self.calls.lock().unwrap().push(query.clone());
        tokio::time::sleep(Duration::from_millis(20)).await;
        if let Some(error) = self.fail.lock().unwrap().clone() {
            return Err(error);
        }
        let first = u64::from(query.start);
        let last = (first + u64::from(query.limit)).min(self.total + 1);
        Ok((first..last).map(listing).collect())
    }

    async fn fetch_logos(&self, ids: &[u64]) -> Result<LogoMap, FetchError> {
        Ok(ids
            .iter()
            .map(|id| {
                let logo = format!("https://img.example/{id}.png");
                (*id, LogoInfo { logo })
            })
            .collect())
    }
}

pub fn start_session(
    source: Arc<FixtureSource>,
    settings: SessionSettings,
    location: &str,
) -> SessionHandle {
    let client = QueryClient::new(source);
    let location = Url::parse(location).expect("test location");
    spawn_session(settings, client, location, 16)
}

pub async fn wait_view(handle: &mut SessionHandle, pred: impl FnMut(&View) -> bool) -> View {
    let view = tokio::time::timeout(Duration::from_secs(30), handle.view.wait_for(pred))
        .await
        .expect("timed out waiting for view")
        .expect("session closed");
    (*view).clone()
}

/// A request as seen by [`MockApi`].
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub path: String,
    pub query: HashMap<String, String>,
    pub api_key: Option<String>,
}

struct MockState {
    total: u64,
    requests: Mutex<Vec<RecordedRequest>>,
    failure: Mutex<Option<(StatusCode, String)>>,
}

impl MockState {
    fn record(&self, path: &str, query: HashMap<String, String>, headers: &HeaderMap) {
        let api_key = headers
            .get(API_KEY_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        self.requests.lock().unwrap().push(RecordedRequest {
            path: path.to_string(),
            query,
            api_key,
        });
    }

    fn failure(&self) -> Option<(StatusCode, Json<Value>)> {
        let (status, message) = self.failure.lock().unwrap().clone()?;
        let body = json!({"status": {"error_code": status.as_u16(), "error_message": message}});
        Some((status, Json(body)))
    }
}

const LISTINGS_PATH: &str = "/v1/cryptocurrency/listings/latest";
const INFO_PATH: &str = "/v1/cryptocurrency/info";
const API_KEY_HEADER: &str = "x-cmc_pro_api_key";

/// Stand-in for the listings API, served by axum on a random local port.
pub struct MockApi {
    addr: SocketAddr,
    state: Arc<MockState>,
    task: JoinHandle<()>,
}

impl MockApi {
    pub async fn spawn(total: u64) -> Self {
        let state = Arc::new(MockState {
            total,
            requests: Mutex::new(Vec::new()),
            failure: Mutex::new(None),
        });
        let app = Router::new()
            .route(LISTINGS_PATH, get(listings))
            .route(INFO_PATH, get(info))
            .with_state(Arc::clone(&state));

        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind mock api");
        let addr = listener.local_addr().expect("mock api addr");
        let task = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self { addr, state, task }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.requests.lock().unwrap().clone()
    }

    pub fn fail_with(&self, status: u16, message: &str) {
        let status = StatusCode::from_u16(status).expect("valid status code");
        *self.state.failure.lock().unwrap() = Some((status, message.to_string()));
    }
}

impl Drop for MockApi {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn listings(
    State(api): State<Arc<MockState>>,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> (StatusCode, Json<Value>) {
    let start: u64 = params.get("start").and_then(|v| v.parse().ok()).unwrap_or(1);
    let limit: u64 = params.get("limit").and_then(|v| v.parse().ok()).unwrap_or(100);
    api.record(LISTINGS_PATH, params, &headers);
    if let Some(failure) = api.failure() {
        return failure;
    }

    let last = (start + limit).min(api.total + 1);
    let data: Vec<Value> = (start..last).map(listing_json).collect();
    (StatusCode::OK, Json(json!({"status": {"error_code": 0}, "data": data})))
}

async fn info(
    State(api): State<Arc<MockState>>,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> (StatusCode, Json<Value>) {
    let ids: Vec<String> = params
        .get("id")
        .map(|ids| ids.split(',').map(str::to_string).collect())
        .unwrap_or_default();
    api.record(INFO_PATH, params, &headers);
    if let Some(failure) = api.failure() {
        return failure;
    }

    let data: serde_json::Map<String, Value> = ids
        .into_iter()
        .map(|id| {
            let logo = json!({"logo": format!("https://img.example/{id}.png")});
            (id, logo)
        })
        .collect();
    (StatusCode::OK, Json(json!({"status": {"error_code": 0}, "data": data})))
}
