#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use reqwest::{Client, StatusCode};
use serde_json::{Value, json};

use reminders::config::Config;
use reminders::delivery::{Delivery, Dispatcher, NotificationSystem, Permission};
use reminders::error::DeliveryError;
use reminders::models::Reminder;
use reminders::scheduler::{Clock, ReminderEngine};
use reminders::store::{KeyValueBackend, MemoryBackend, ReminderStore};
use reminders::templates::{Notification, TemplateRegistry};

pub fn utc(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
}

/// Clock that only moves when told to.
pub struct FixedClock {
    now: Mutex<DateTime<Utc>>,
}

impl FixedClock {
    pub fn new(now: DateTime<Utc>) -> Arc<Self> {
        Arc::new(Self {
            now: Mutex::new(now),
        })
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap();
        *now += by;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}

/// Delivery that fails a fixed number of times before succeeding.
pub struct ScriptedDelivery {
    failures_left: AtomicU32,
    pub calls: Mutex<Vec<(Value, Value)>>,
}

impl ScriptedDelivery {
    pub fn succeeding() -> Arc<Self> {
        Self::failing(0)
    }

    pub fn failing(times: u32) -> Arc<Self> {
        Arc::new(Self {
            failures_left: AtomicU32::new(times),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn always_failing() -> Arc<Self> {
        Self::failing(u32::MAX)
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl Delivery for ScriptedDelivery {
    async fn deliver(&self, target: &Value, payload: &Value) -> Result<(), DeliveryError> {
        self.calls
            .lock()
            .unwrap()
            .push((target.clone(), payload.clone()));

        let left = self.failures_left.load(Ordering::SeqCst);
        if left == 0 {
            return Ok(());
        }
        if left != u32::MAX {
            self.failures_left.store(left - 1, Ordering::SeqCst);
        }
        Err(DeliveryError::from("channel unavailable"))
    }
}

/// Delivery that records what the store holds while the attempt is running.
pub struct ObservingDelivery {
    pub store: ReminderStore,
    pub snapshots: Mutex<Vec<Vec<Reminder>>>,
}

#[async_trait]
impl Delivery for ObservingDelivery {
    async fn deliver(&self, _target: &Value, _payload: &Value) -> Result<(), DeliveryError> {
        let snapshot = self.store.reminders().await;
        self.snapshots.lock().unwrap().push(snapshot);
        Ok(())
    }
}

/// Native notification fake with a settable permission.
pub struct FakeNative {
    permission: Mutex<Permission>,
    grant_on_request: Option<Permission>,
    fail_show: bool,
    pub requests: AtomicU32,
    pub shown: Mutex<Vec<Notification>>,
}

impl FakeNative {
    pub fn new(permission: Permission) -> Self {
        Self {
            permission: Mutex::new(permission),
            grant_on_request: None,
            fail_show: false,
            requests: AtomicU32::new(0),
            shown: Mutex::new(Vec::new()),
        }
    }

    pub fn resolving_to(mut self, permission: Permission) -> Self {
        self.grant_on_request = Some(permission);
        self
    }

    pub fn failing(mut self) -> Self {
        self.fail_show = true;
        self
    }

    pub fn request_count(&self) -> u32 {
        self.requests.load(Ordering::SeqCst)
    }

    pub fn shown_count(&self) -> usize {
        self.shown.lock().unwrap().len()
    }
}

#[async_trait]
impl NotificationSystem for FakeNative {
    fn permission(&self) -> Permission {
        *self.permission.lock().unwrap()
    }

    async fn request_permission(&self) -> Result<Permission, DeliveryError> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        let mut permission = self.permission.lock().unwrap();
        if let Some(resolved) = self.grant_on_request {
            *permission = resolved;
        }
        Ok(*permission)
    }

    async fn show(&self, notification: &Notification, _target: &Value) -> Result<(), DeliveryError> {
        if self.fail_show {
            return Err(DeliveryError::from("native channel crashed"));
        }
        self.shown.lock().unwrap().push(notification.clone());
        Ok(())
    }
}

/// An engine over an in-memory backend with a fixed clock.
pub struct TestEngine {
    pub engine: ReminderEngine,
    pub backend: MemoryBackend,
    pub clock: Arc<FixedClock>,
}

impl TestEngine {
    pub fn store(&self) -> &ReminderStore {
        self.engine.store()
    }

    pub async fn get(&self, id: &str) -> Reminder {
        self.engine
            .reminder(id)
            .await
            .unwrap_or_else(|| panic!("reminder {id} missing"))
    }
}

pub fn engine_with(backend: MemoryBackend, delivery: Option<Arc<dyn Delivery>>) -> TestEngine {
    let clock = FixedClock::new(utc(2024, 6, 1, 12, 0));
    let store = ReminderStore::new(Arc::new(backend.clone()) as Arc<dyn KeyValueBackend>);
    let dispatcher = Arc::new(Dispatcher::new(Arc::new(TemplateRegistry::new())));

    let mut engine = ReminderEngine::new(store, dispatcher).with_clock(clock.clone());
    if let Some(delivery) = delivery {
        engine = engine.with_delivery(delivery);
    }

    TestEngine {
        engine,
        backend,
        clock,
    }
}

pub fn engine(delivery: Arc<dyn Delivery>) -> TestEngine {
    engine_with(MemoryBackend::new(), Some(delivery))
}

/// A running test server instance over an in-memory store.
pub struct TestApp {
    pub addr: SocketAddr,
    pub client: Client,
    pub engine: Arc<ReminderEngine>,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub async fn get(&self, path: &str) -> (Value, StatusCode) {
        let resp = self
            .client
            .get(self.url(path))
            .send()
            .await
            .expect("get request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }

    pub async fn post(&self, path: &str, body: &Value) -> (Value, StatusCode) {
        let resp = self
            .client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .expect("post request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }

    pub async fn put(&self, path: &str, body: &Value) -> (Value, StatusCode) {
        let resp = self
            .client
            .put(self.url(path))
            .json(body)
            .send()
            .await
            .expect("put request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }
}

pub fn test_config() -> Config {
    Config {
        host: "127.0.0.1".parse().unwrap(),
        port: 0,
        data_dir: std::env::temp_dir(),
        storage_key: "reminders".to_string(),
        tick_interval: std::time::Duration::from_secs(30),
        push_url: None,
        max_body_size: 1_048_576,
        log_level: "warn".to_string(),
    }
}

/// Spawn the HTTP app over the given engine on a random port.
pub async fn spawn_app_with(engine: Arc<ReminderEngine>) -> TestApp {
    spawn_app_with_config(engine, test_config()).await
}

pub async fn spawn_app_with_config(engine: Arc<ReminderEngine>, config: Config) -> TestApp {
    let app = reminders::build_app(engine.clone(), config);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind to random port");
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("Server failed");
    });

    TestApp {
        addr,
        client: Client::new(),
        engine,
    }
}

pub async fn spawn_app() -> TestApp {
    let store = ReminderStore::new(Arc::new(MemoryBackend::new()));
    let dispatcher = Arc::new(Dispatcher::new(Arc::new(TemplateRegistry::new())));
    spawn_app_with(Arc::new(ReminderEngine::new(store, dispatcher))).await
}
