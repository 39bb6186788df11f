//! Main application orchestration.
//!
//! Owns the store handle, the optional chat source and the lifecycle, and
//! drives startup, steady state and the ordered drain.

use std::sync::Arc;
use std::time::Duration;

use sigrelay_api::{bind_with_retry, create_router, serve, ApiError, AppState};
use sigrelay_ingest::{DynEventSource, IngestionAdapter, TelegramClient, TelegramPoller};
use sigrelay_store::{DynRecordStore, PgStore};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::config::AppConfig;
use crate::error::AppResult;
use crate::lifecycle::{Lifecycle, LifecycleState};

/// How the drain ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitStatus {
    /// Drain completed in order.
    Clean,
    /// Drain did not finish before the deadline.
    DeadlineExceeded,
}

impl ExitStatus {
    pub fn code(&self) -> i32 {
        match self {
            Self::Clean => 0,
            Self::DeadlineExceeded => 1,
        }
    }
}

/// Cloneable trigger for the drain.
#[derive(Debug, Clone, Default)]
pub struct ShutdownHandle {
    token: CancellationToken,
}

impl ShutdownHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request shutdown. Only the first call is logged.
    pub fn trigger(&self, reason: &str) {
        if !self.token.is_cancelled() {
            info!(reason, "Shutdown requested");
            self.token.cancel();
        }
    }

    pub fn is_triggered(&self) -> bool {
        self.token.is_cancelled()
    }

    pub async fn triggered(&self) {
        self.token.cancelled().await;
    }
}

/// Main application.
pub struct Application {
    config: AppConfig,
    store: DynRecordStore,
    source: Option<DynEventSource>,
    lifecycle: Arc<Lifecycle>,
    shutdown: ShutdownHandle,
}

impl Application {
    /// Build the PostgreSQL-backed application. The pool connects lazily,
    /// so nothing touches the network until `run`.
    pub fn new(config: AppConfig) -> AppResult<Self> {
        let store: DynRecordStore = Arc::new(PgStore::connect_lazy(&config.store_config()?)?);
        let source = Self::telegram_source(&config)?;
        Ok(Self::from_parts(config, store, source))
    }

    /// Assemble from already-built parts.
    pub fn from_parts(
        config: AppConfig,
        store: DynRecordStore,
        source: Option<DynEventSource>,
    ) -> Self {
        Self {
            config,
            store,
            source,
            lifecycle: Arc::new(Lifecycle::new()),
            shutdown: ShutdownHandle::new(),
        }
    }

    fn telegram_source(config: &AppConfig) -> AppResult<Option<DynEventSource>> {
        let telegram = &config.telegram;
        let Some(token) = telegram.bot_token.as_deref() else {
            error!("BOT_TOKEN is not set, chat ingestion disabled");
            return Ok(None);
        };

        let poll_timeout = Duration::from_secs(telegram.poll_timeout_secs);
        let client = TelegramClient::new(&telegram.api_url, token, poll_timeout)?;
        Ok(Some(Arc::new(TelegramPoller::new(client, poll_timeout))))
    }

    pub fn shutdown_handle(&self) -> ShutdownHandle {
        self.shutdown.clone()
    }

    pub fn lifecycle(&self) -> Arc<Lifecycle> {
        Arc::clone(&self.lifecycle)
    }

    /// Run until shutdown is requested and the drain finishes.
    ///
    /// Startup failures return `Err` with the lifecycle in FAILED.
    pub async fn run(self) -> AppResult<ExitStatus> {
        self.lifecycle.transition(LifecycleState::Connecting)?;

        let adapter = Arc::new(IngestionAdapter::new(
            Arc::clone(&self.store),
            self.config.ingest_config(),
        ));

        let listener = tokio::select! {
            biased;
            () = self.shutdown.triggered() => {
                info!("Shutdown requested during startup");
                self.lifecycle.transition(LifecycleState::Draining)?;
                self.store.close().await;
                self.lifecycle.transition(LifecycleState::Stopped)?;
                return Ok(ExitStatus::Clean);
            }
            result = self.connect(&adapter) => match result {
                Ok(listener) => listener,
                Err(e) => {
                    error!(error = %e, "Startup failed");
                    self.lifecycle.fail();
                    self.store.close().await;
                    return Err(e);
                }
            },
        };

        let port = listener.local_addr()?.port();
        self.lifecycle.set_bound_port(port);

        let http_token = CancellationToken::new();
        let http_task = self.spawn_http(listener, port, http_token.clone());

        let ingest_token = CancellationToken::new();
        let ingest_task = self.spawn_ingestion(&adapter, ingest_token.clone());

        self.lifecycle.transition(LifecycleState::Ready)?;
        info!(
            port,
            ingestion = ingest_task.is_some(),
            mode = %adapter.config().capture_mode,
            "Service ready"
        );

        self.shutdown.triggered().await;
        self.lifecycle.transition(LifecycleState::Draining)?;

        let drain = async {
            http_token.cancel();
            match http_task.await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => warn!(error = %e, "HTTP server stopped with error"),
                Err(e) => error!(error = %e, "HTTP task panicked"),
            }

            ingest_token.cancel();
            if let Some(task) = ingest_task {
                if let Err(e) = task.await {
                    error!(error = %e, "Ingestion task panicked");
                }
            }

            self.store.close().await;
        };

        let deadline = self.config.drain_timeout();
        match tokio::time::timeout(deadline, drain).await {
            Ok(()) => {
                self.lifecycle.transition(LifecycleState::Stopped)?;
                info!("Shutdown complete");
                Ok(ExitStatus::Clean)
            }
            Err(_) => {
                error!(
                    deadline_secs = deadline.as_secs(),
                    "Drain deadline exceeded, forcing exit"
                );
                self.lifecycle.fail();
                Ok(ExitStatus::DeadlineExceeded)
            }
        }
    }

    /// CONNECTING: verify the schema, bind the listener, launch ingestion.
    async fn connect(&self, adapter: &IngestionAdapter) -> AppResult<TcpListener> {
        self.store.verify_schema().await?;
        info!("Database schema verified");

        let listener = bind_with_retry(&self.config.api_config()).await?;

        match &self.source {
            Some(source) => {
                adapter.launch(source.as_ref()).await?;
            }
            None => warn!("No chat source configured, running API only"),
        }

        Ok(listener)
    }

    fn spawn_http(
        &self,
        listener: TcpListener,
        port: u16,
        token: CancellationToken,
    ) -> JoinHandle<Result<(), ApiError>> {
        let state = AppState::new(Arc::clone(&self.store), self.config.api_config()).with_port(port);
        let router = create_router(state);
        let shutdown = self.shutdown.clone();

        tokio::spawn(async move {
            let result = serve(listener, router, token.clone()).await;
            if !token.is_cancelled() {
                error!("HTTP server exited unexpectedly");
                shutdown.trigger("http server exited");
            }
            result
        })
    }

    fn spawn_ingestion(
        &self,
        adapter: &Arc<IngestionAdapter>,
        token: CancellationToken,
    ) -> Option<JoinHandle<()>> {
        let source = self.source.clone()?;
        let adapter = Arc::clone(adapter);
        let shutdown = self.shutdown.clone();

        Some(tokio::spawn(async move {
            adapter.run(source.as_ref(), token.clone()).await;
            if !token.is_cancelled() {
                error!("Ingestion loop exited unexpectedly");
                shutdown.trigger("ingestion exited");
            }
        }))
    }
}

/// Route panics anywhere in the process into the drain.
///
/// The previous hook still runs, so the panic message is printed as usual.
pub fn install_panic_hook(handle: ShutdownHandle) {
    let previous = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        previous(info);
        error!(panic = %info, "Uncaught panic");
        handle.trigger("panic");
    }));
}

/// Wait for SIGINT or SIGTERM, then trigger shutdown.
pub async fn wait_for_signal(handle: ShutdownHandle) -> AppResult<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut terminate = signal(SignalKind::terminate())?;
        tokio::select! {
            result = tokio::signal::ctrl_c() => {
                result?;
                handle.trigger("SIGINT");
            }
            _ = terminate.recv() => handle.trigger("SIGTERM"),
            () = handle.triggered() => {}
        }
    }

    #[cfg(not(unix))]
    {
        tokio::select! {
            result = tokio::signal::ctrl_c() => {
                result?;
                handle.trigger("interrupt");
            }
            () = handle.triggered() => {}
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;

    #[test]
    fn test_exit_codes() {
        assert_eq!(ExitStatus::Clean.code(), 0);
        assert_eq!(ExitStatus::DeadlineExceeded.code(), 1);
    }

    #[test]
    fn test_shutdown_handle_is_shared() {
        let handle = ShutdownHandle::new();
        let clone = handle.clone();
        assert!(!handle.is_triggered());
        clone.trigger("test");
        assert!(handle.is_triggered());
        handle.trigger("again");
        assert!(clone.is_triggered());
    }

    #[test]
    fn test_missing_token_disables_ingestion() {
        let config = AppConfig::default();
        assert!(Application::telegram_source(&config).unwrap().is_none());
    }

    #[test]
    fn test_token_builds_poller() {
        let mut config = AppConfig::default();
        config.telegram.bot_token = Some("1:abc".to_string());
        assert!(Application::telegram_source(&config).unwrap().is_some());
    }

    #[test]
    fn test_new_requires_database_url() {
        assert!(matches!(
            Application::new(AppConfig::default()),
            Err(AppError::Config(_))
        ));
    }
}
