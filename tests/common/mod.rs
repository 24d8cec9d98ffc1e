//! Shared test harness for integration tests.
//!
//! Provides [`TestHarness`] which wires a full [`AppContext`] to a scripted
//! catalog ([`MockCatalog`]) and a recording worker launcher
//! ([`MockLauncher`]). [`TestHarness::with_server`] starts Axum on a random
//! port for tests that need a real connection.

#![allow(dead_code)]

use std::io;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::body::Body;
use axum::http::Request;
use axum::response::Response;
use http_body_util::BodyExt;
use tempfile::TempDir;
use tower::ServiceExt;

use u7d_common::{Error, Program, RequestIdentity, Result};
use u7d_gateway::catalog::CatalogResolver;
use u7d_gateway::config::Config;
use u7d_gateway::server::{create_router, serve, AppContext};
use u7d_gateway::worker::{WorkerLauncher, WorkerProcess, WorkerRequest};

/// Program returned by [`MockCatalog::found`] in most tests.
pub fn sample_program() -> Program {
    Program {
        channel_id: "1".to_string(),
        program_id: "99".to_string(),
        offset: "30".to_string(),
    }
}

/// Catalog that answers every lookup with the same result.
pub struct MockCatalog {
    program: Option<Program>,
    calls: AtomicUsize,
}

impl MockCatalog {
    pub fn found(program: Program) -> Self {
        Self {
            program: Some(program),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn not_found() -> Self {
        Self {
            program: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl CatalogResolver for MockCatalog {
    async fn resolve(&self, identity: &RequestIdentity) -> Result<Program> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.program
            .clone()
            .ok_or_else(|| Error::not_found(identity))
    }
}

/// How launched mock workers behave.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerBehavior {
    /// Keeps running until interrupted.
    StaysAlive,
    /// Exits with code 1 immediately.
    ExitsEarly,
    /// Spawning fails.
    FailsToSpawn,
}

/// Launcher that records every request and counts interrupts.
pub struct MockLauncher {
    behavior: WorkerBehavior,
    requests: Mutex<Vec<WorkerRequest>>,
    interrupts: Arc<AtomicUsize>,
}

impl MockLauncher {
    pub fn new(behavior: WorkerBehavior) -> Self {
        Self {
            behavior,
            requests: Mutex::new(Vec::new()),
            interrupts: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn requests(&self) -> Vec<WorkerRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn launches(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn interrupts(&self) -> usize {
        self.interrupts.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl WorkerLauncher for MockLauncher {
    async fn launch(&self, request: &WorkerRequest) -> io::Result<Box<dyn WorkerProcess>> {
        self.requests.lock().unwrap().push(request.clone());

        match self.behavior {
            WorkerBehavior::FailsToSpawn => {
                Err(io::Error::new(io::ErrorKind::NotFound, "no such program"))
            }
            behavior => Ok(Box::new(MockProcess {
                exits: behavior == WorkerBehavior::ExitsEarly,
                interrupts: Arc::clone(&self.interrupts),
            })),
        }
    }
}

struct MockProcess {
    exits: bool,
    interrupts: Arc<AtomicUsize>,
}

#[async_trait::async_trait]
impl WorkerProcess for MockProcess {
    fn id(&self) -> Option<u32> {
        Some(31337)
    }

    async fn wait(&mut self) -> io::Result<Option<i32>> {
        if self.exits {
            Ok(Some(1))
        } else {
            std::future::pending().await
        }
    }

    fn interrupt(&mut self) -> io::Result<()> {
        self.interrupts.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Test harness wrapping a fully-constructed [`AppContext`].
pub struct TestHarness {
    pub ctx: AppContext,
    pub catalog: Arc<MockCatalog>,
    pub launcher: Arc<MockLauncher>,
    /// Directory holding the channel list and guide files.
    pub home: TempDir,
}

impl TestHarness {
    /// Catalog resolves every program token, workers stay alive.
    pub fn new() -> Self {
        Self::with_mocks(
            MockCatalog::found(sample_program()),
            MockLauncher::new(WorkerBehavior::StaysAlive),
        )
    }

    pub fn with_mocks(catalog: MockCatalog, launcher: MockLauncher) -> Self {
        let home = tempfile::tempdir().expect("failed to create temp dir");
        let catalog = Arc::new(catalog);
        let launcher = Arc::new(launcher);

        let ctx = AppContext::with_components(
            test_config(home.path()),
            catalog.clone(),
            launcher.clone(),
        );

        Self {
            ctx,
            catalog,
            launcher,
            home,
        }
    }

    /// Send a GET through the router without a network connection.
    pub async fn get(&self, uri: &str) -> Response {
        self.get_from(uri, None).await
    }

    /// Send a GET with an `X-Forwarded-For` header.
    pub async fn get_from(&self, uri: &str, forwarded_for: Option<&str>) -> Response {
        let mut builder = Request::builder().uri(uri);
        if let Some(ip) = forwarded_for {
            builder = builder.header("x-forwarded-for", ip);
        }

        create_router(self.ctx.clone())
            .oneshot(builder.body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    /// Start an Axum server on a random port and return the harness together
    /// with the bound socket address.
    pub async fn with_server(self) -> (Self, SocketAddr) {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind random port");
        let addr = listener.local_addr().expect("failed to get local addr");

        let ctx = self.ctx.clone();
        tokio::spawn(async move {
            serve(listener, ctx, std::future::pending()).await.ok();
        });

        (self, addr)
    }
}

/// Configuration for tests: loopback relay, short readiness window.
pub fn test_config(home: &Path) -> Config {
    let mut config = Config::default();
    config.relay.host = "127.0.0.1".to_string();
    config.relay.multicast_base_url = "http://192.168.137.1:4022/rtp/".to_string();
    config.worker.readiness_window_ms = 50;
    config.files.home_dir = home.to_path_buf();
    config
}

/// Collect a response body as a string.
pub async fn body_string(response: Response) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// Collect a response body as JSON.
pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
