//! The Bottex runtime: receivers in, pipeline through, replies out.
//!
//! ```text
//!              ┌──────────── task per receiver ────────────┐
//! Receiver A ──┤ listen() ─▶ spawn(dispatch) ─▶ await ─▶ … │
//! Receiver B ──┤ listen() ─▶ spawn(dispatch) ─▶ await ─▶ … │──▶ shared pipeline
//!              └───────────────────────────────────────────┘
//! ```
//!
//! Each receiver runs in its own task, so an idle platform never blocks a busy
//! one. Within a task requests are dispatched one at a time, in arrival
//! order. Each dispatch runs in a task of its own so a panicking handler only
//! loses its request. Shutdown cancels every receiver task; dropping a
//! receiver's stream releases its transport.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! let mut bottex = Bottex::builder().config_file("bottex.toml").build()?;
//! bottex.register_receiver::<TelegramReceiver>()?;
//! bottex.add_middleware(LoggingLayer::new());
//! bottex.set_handler(root_router);
//! bottex.run().await?;
//! ```

use std::future::Future;

use bottex_core::{BoxedReceiver, ConfigurableReceiver, Receiver, Request};
use bottex_framework::{BoxError, Dispatcher, Handler, IntoHandler, dispatch};
use futures::StreamExt;
use tokio::signal;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tower::{Layer, Service};
use tracing::{debug, error, info, warn};

use crate::config::{BottexConfig, ConfigLoader, ConfigResult};
use crate::error::{RuntimeError, RuntimeResult};
use crate::logging;

/// The dispatcher process: owns the receivers and the handler pipeline.
pub struct Bottex {
    config: BottexConfig,
    receivers: Vec<BoxedReceiver>,
    dispatcher: Dispatcher,
    shutdown: CancellationToken,
}

impl Bottex {
    /// Creates a runtime, loading configuration from the current directory.
    ///
    /// If loading fails, default settings are used.
    pub fn new() -> Self {
        let config = ConfigLoader::new()
            .with_current_dir()
            .load()
            .unwrap_or_else(|e| {
                eprintln!("Warning: Failed to load config ({e}), using defaults");
                BottexConfig::default()
            });

        Self::from_config(&config)
    }

    /// Creates a runtime builder for custom configuration.
    pub fn builder() -> RuntimeBuilder {
        RuntimeBuilder::new()
    }

    /// Creates a runtime from configuration and initializes logging from it.
    pub fn from_config(config: &BottexConfig) -> Self {
        logging::init_from_config(&config.logging);

        info!(
            log_level = %config.logging.level,
            log_format = ?config.logging.format,
            "Runtime initialized from configuration"
        );

        Self {
            config: config.clone(),
            receivers: Vec::new(),
            dispatcher: Dispatcher::new(),
            shutdown: CancellationToken::new(),
        }
    }

    /// Returns the configuration.
    pub fn config(&self) -> &BottexConfig {
        &self.config
    }

    /// Returns `true` if the configuration has a `receivers.<name>` section.
    pub fn has_receiver_config(&self, name: &str) -> bool {
        self.config.receivers.contains_key(name)
    }

    /// Adds an already built receiver.
    pub fn add_receiver<R: Receiver>(&mut self, receiver: R) {
        info!(platform = receiver.platform(), "Registered receiver");
        self.receivers.push(Box::new(receiver));
    }

    /// Builds a receiver from its `receivers.<name>` configuration section and
    /// adds it. Without a section the receiver's default configuration is used.
    pub fn register_receiver<R>(&mut self) -> RuntimeResult<()>
    where
        R: ConfigurableReceiver,
    {
        let name = R::name();

        let config: R::Config = match self.config.receivers.get(name) {
            Some(value) => value.deserialize().map_err(|e| {
                RuntimeError::ReceiverConfigDeserialize(format!(
                    "Failed to deserialize config for receiver '{name}': {e}"
                ))
            })?,
            None => {
                warn!(receiver = name, "No configuration found for receiver, using default");
                Default::default()
            }
        };

        self.add_receiver(R::from_config(config)?);
        Ok(())
    }

    /// Returns the number of registered receivers.
    pub fn receiver_count(&self) -> usize {
        self.receivers.len()
    }

    /// Sets the root handler, usually a [`Router`](bottex_framework::Router).
    pub fn set_handler<H, M>(&mut self, handler: H)
    where
        H: IntoHandler<M>,
    {
        self.dispatcher.set_handler(handler);
    }

    /// Registers a middleware layer. The first registered layer is outermost.
    pub fn add_middleware<L>(&mut self, layer: L)
    where
        L: Layer<Handler> + Send + Sync + 'static,
        L::Service: Service<Request, Response = bottex_core::Reply, Error = BoxError>
            + Clone
            + Send
            + Sync
            + 'static,
        <L::Service as Service<Request>>::Future: Send + 'static,
    {
        self.dispatcher.add_middleware(layer);
    }

    /// Returns a token that stops the runtime when cancelled.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Runs until Ctrl+C or SIGTERM.
    pub async fn run(self) -> RuntimeResult<()> {
        info!("Bottex is starting. Press Ctrl+C to stop.");
        self.run_until(wait_for_shutdown()).await
    }

    /// Runs forever, or until the cancellation token fires.
    pub async fn serve_forever(self) -> RuntimeResult<()> {
        self.run_until(std::future::pending()).await
    }

    /// Runs until `shutdown` completes or the cancellation token fires.
    pub async fn run_until<F>(self, shutdown: F) -> RuntimeResult<()>
    where
        F: Future<Output = ()>,
    {
        let handler = self.dispatcher.build().ok_or(RuntimeError::NoHandler)?;
        if self.receivers.is_empty() {
            warn!("No receivers registered; nothing will be dispatched");
        }

        let token = self.shutdown;
        let mut tasks = JoinSet::new();
        for receiver in self.receivers {
            tasks.spawn(serve_receiver(receiver, handler.clone(), token.child_token()));
        }
        info!(receivers = tasks.len(), "Runtime started");

        tokio::select! {
            _ = shutdown => debug!("Shutdown future completed"),
            _ = token.cancelled() => debug!("Runtime cancelled"),
        }

        info!("Stopping Bottex runtime");
        token.cancel();
        while let Some(result) = tasks.join_next().await {
            if let Err(e) = result {
                error!(error = %e, "Receiver task failed");
            }
        }
        info!("Runtime stopped");

        Ok(())
    }
}

impl Default for Bottex {
    fn default() -> Self {
        Self::new()
    }
}

/// One receiver's listen loop.
async fn serve_receiver(receiver: BoxedReceiver, handler: Handler, token: CancellationToken) {
    let platform = receiver.platform();
    info!(platform, "Receiver started");

    let mut requests = receiver.listen();
    loop {
        tokio::select! {
            _ = token.cancelled() => break,
            next = requests.next() => {
                let Some(request) = next else {
                    warn!(platform, "Receiver stream ended");
                    break;
                };
                let handler = handler.clone();
                let job = tokio::spawn(async move { dispatch(&handler, request).await });
                if let Err(e) = job.await {
                    error!(platform, error = %e, "Dispatch task panicked, request dropped");
                }
            }
        }
    }

    drop(requests);
    info!(platform, "Receiver stopped");
}

/// Waits for shutdown signals (Ctrl+C or SIGTERM).
async fn wait_for_shutdown() {
    #[cfg(unix)]
    {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = signal::ctrl_c() => info!("Received Ctrl+C, shutting down"),
                    _ = sigterm.recv() => info!("Received SIGTERM, shutting down"),
                }
                return;
            }
            Err(e) => warn!(error = %e, "Failed to register SIGTERM handler"),
        }
    }

    match signal::ctrl_c().await {
        Ok(()) => info!("Received Ctrl+C, shutting down"),
        Err(e) => {
            error!(error = %e, "Failed to listen for Ctrl+C, running until cancelled");
            std::future::pending::<()>().await;
        }
    }
}

// =============================================================================
// RuntimeBuilder
// =============================================================================

/// Builder for creating a [`Bottex`] runtime with custom configuration.
///
/// ```rust,ignore
/// let bottex = Bottex::builder()
///     .config_file("config/bottex.toml")
///     .profile("production")
///     .build()?;
/// ```
pub struct RuntimeBuilder {
    config_loader: ConfigLoader,
}

impl RuntimeBuilder {
    /// Creates a new runtime builder.
    pub fn new() -> Self {
        Self {
            config_loader: ConfigLoader::new().with_current_dir().with_user_config_dir(),
        }
    }

    /// Sets a specific configuration file to load.
    pub fn config_file<P: AsRef<std::path::Path>>(mut self, path: P) -> Self {
        self.config_loader = self.config_loader.file(path);
        self
    }

    /// Sets the configuration profile (e.g., "development", "production").
    pub fn profile(mut self, profile: impl Into<String>) -> Self {
        self.config_loader = self.config_loader.profile(profile);
        self
    }

    /// Adds a search path for configuration files.
    pub fn search_path<P: AsRef<std::path::Path>>(mut self, path: P) -> Self {
        self.config_loader = self.config_loader.search_path(path);
        self
    }

    /// Disables loading environment variables.
    pub fn without_env(mut self) -> Self {
        self.config_loader = self.config_loader.without_env();
        self
    }

    /// Merges a base configuration.
    pub fn merge(mut self, config: BottexConfig) -> Self {
        self.config_loader = self.config_loader.merge(config);
        self
    }

    /// Builds the runtime.
    pub fn build(self) -> ConfigResult<Bottex> {
        let config = self.config_loader.load()?;
        Ok(Bottex::from_config(&config))
    }
}

impl Default for RuntimeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bottex_core::{BoxedChat, Chat, Keyboard, Reply, TransportError, TransportResult, report_delivery};
    use serde::Deserialize;
    use serde_json::Value;
    use std::collections::VecDeque;
    use std::time::Duration;
    use tokio::sync::mpsc;

    struct NullChat;

    #[async_trait]
    impl Chat for NullChat {
        async fn send(&self, _text: &str, _keyboard: Option<&Keyboard>) -> Reply {
            Reply::Sent
        }
    }

    /// Stalls on `"slow"`, then fails the send the way a platform timeout does.
    struct StallingChat;

    #[async_trait]
    impl Chat for StallingChat {
        async fn send(&self, text: &str, _keyboard: Option<&Keyboard>) -> Reply {
            if text == "slow" {
                tokio::time::sleep(Duration::from_millis(50)).await;
                return report_delivery("scripted", Err(TransportError::Timeout));
            }
            report_delivery("scripted", Ok(()))
        }
    }

    fn null_chat() -> BoxedChat {
        Box::new(NullChat)
    }

    fn stalling_chat() -> BoxedChat {
        Box::new(StallingChat)
    }

    /// Yields its scripted texts one batch at a time, then idles.
    struct ScriptedReceiver {
        batches: VecDeque<Vec<String>>,
        chat: fn() -> BoxedChat,
    }

    fn scripted(batches: &[&[&str]]) -> ScriptedReceiver {
        ScriptedReceiver {
            batches: batches
                .iter()
                .map(|b| b.iter().map(|t| t.to_string()).collect())
                .collect(),
            chat: null_chat,
        }
    }

    #[derive(Debug, Default, Deserialize)]
    struct ScriptedConfig {
        texts: Vec<String>,
    }

    #[async_trait]
    impl Receiver for ScriptedReceiver {
        fn platform(&self) -> &'static str {
            "scripted"
        }

        fn sender_id(&self, _payload: &Value) -> Option<String> {
            Some("1".into())
        }

        async fn poll_updates(&mut self) -> TransportResult<Vec<Request>> {
            match self.batches.pop_front() {
                Some(batch) if batch.is_empty() => Err(TransportError::Timeout),
                Some(batch) => Ok(batch
                    .into_iter()
                    .map(|text| self.request(text, (self.chat)(), Value::Null))
                    .collect()),
                None => {
                    tokio::time::sleep(Duration::from_millis(5)).await;
                    Ok(Vec::new())
                }
            }
        }

        fn retry_delay(&self) -> Duration {
            Duration::from_millis(1)
        }
    }

    impl ConfigurableReceiver for ScriptedReceiver {
        type Config = ScriptedConfig;

        fn name() -> &'static str {
            "scripted"
        }

        fn from_config(config: ScriptedConfig) -> TransportResult<Self> {
            Ok(Self {
                batches: VecDeque::from([config.texts]),
                chat: null_chat,
            })
        }
    }

    fn runtime() -> Bottex {
        Bottex::from_config(&BottexConfig::default())
    }

    fn forwarding(tx: mpsc::UnboundedSender<String>) -> Handler {
        Handler::new(move |req: Request| {
            let tx = tx.clone();
            async move {
                if req.text == "panic" {
                    panic!("handler blew up");
                }
                let _ = tx.send(req.text.clone());
            }
        })
    }

    async fn collect(rx: &mut mpsc::UnboundedReceiver<String>, n: usize) -> Vec<String> {
        let mut out = Vec::new();
        while out.len() < n {
            match rx.recv().await {
                Some(text) => out.push(text),
                None => break,
            }
        }
        out
    }

    #[tokio::test]
    async fn test_run_without_handler() {
        let err = runtime().run_until(async {}).await.unwrap_err();
        assert!(matches!(err, RuntimeError::NoHandler));
    }

    #[tokio::test]
    async fn test_dispatches_in_order_across_failures() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut bottex = runtime();
        bottex.add_receiver(scripted(&[&["1", "2"], &[], &["panic", "3"]]));
        bottex.set_handler(forwarding(tx));

        let token = bottex.cancellation_token();
        let run = tokio::spawn(bottex.serve_forever());

        let texts = tokio::time::timeout(Duration::from_secs(5), collect(&mut rx, 3))
            .await
            .unwrap();
        token.cancel();
        run.await.unwrap().unwrap();

        assert_eq!(texts, vec!["1", "2", "3"]);
    }

    #[tokio::test]
    async fn test_failed_send_does_not_stop_the_receiver() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut bottex = runtime();
        bottex.add_receiver(ScriptedReceiver {
            chat: stalling_chat,
            ..scripted(&[&["slow"], &["next"]])
        });
        bottex.set_handler(Handler::new(move |req: Request| {
            let tx = tx.clone();
            async move {
                let reply = req.reply(&req.text).await;
                let _ = tx.send(format!("{}:{reply:?}", req.text));
            }
        }));

        let token = bottex.cancellation_token();
        let run = tokio::spawn(bottex.serve_forever());

        let outcomes = tokio::time::timeout(Duration::from_secs(5), collect(&mut rx, 2))
            .await
            .unwrap();
        token.cancel();
        run.await.unwrap().unwrap();

        assert_eq!(outcomes, vec!["slow:Failed", "next:Sent"]);
    }

    #[tokio::test]
    async fn test_receivers_run_concurrently() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut bottex = runtime();
        bottex.add_receiver(scripted(&[&["a"]]));
        bottex.add_receiver(scripted(&[&["b"]]));
        bottex.set_handler(forwarding(tx));

        let result = bottex
            .run_until(async {
                let mut texts = collect(&mut rx, 2).await;
                texts.sort();
                assert_eq!(texts, vec!["a", "b"]);
            })
            .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_register_receiver_from_config() {
        let mut config = BottexConfig::default();
        config.receivers.insert(
            "scripted".into(),
            figment::value::Value::serialize(serde_json::json!({"texts": ["hello"]})).unwrap(),
        );
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut bottex = Bottex::from_config(&config);
        assert!(bottex.has_receiver_config("scripted"));
        bottex.register_receiver::<ScriptedReceiver>().unwrap();
        bottex.set_handler(forwarding(tx));
        assert_eq!(bottex.receiver_count(), 1);

        bottex
            .run_until(async {
                assert_eq!(collect(&mut rx, 1).await, vec!["hello"]);
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_register_receiver_rejects_bad_config() {
        let mut config = BottexConfig::default();
        config.receivers.insert(
            "scripted".into(),
            figment::value::Value::serialize(serde_json::json!({"texts": 5})).unwrap(),
        );
        let mut bottex = Bottex::from_config(&config);

        let err = bottex.register_receiver::<ScriptedReceiver>().unwrap_err();
        assert!(matches!(err, RuntimeError::ReceiverConfigDeserialize(_)));
    }
}
