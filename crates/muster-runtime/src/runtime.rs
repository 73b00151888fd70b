//! The event loop around an [`Engine`].
//!
//! [`MusterRuntime`] is the composition root of a bot: it loads the
//! configuration, sets up logging, builds the engine from the registered
//! features and then services events until shutdown.
//!
//! ```text
//!                       ┌─ messages ────► worker ─┐
//! events ──► router ────┼─ components ──► worker ─┼──► Engine
//!                       ├─ ...                    │
//!                       └─ lifecycle ───► worker ─┘
//! tick task ─────────────────────────────────────────► Engine::tick
//! ```
//!
//! Each stream is handled by one task, one event at a time; streams run
//! concurrently with each other and with the tick task.
//!
//! # Example
//!
//! ```rust,ignore
//! let runtime = MusterRuntime::builder(gateway)
//!     .config_file("muster.toml")
//!     .feature(Arc::new(Attendance::default()))
//!     .build()?;
//!
//! runtime.run(events).await?;
//! ```

use std::future::Future;
use std::path::Path;
use std::sync::Arc;

use futures::future::join_all;
use muster_core::{BoxedGateway, EventStream, GatewayEvent};
use muster_framework::{Engine, EngineBuilder, Feature, RegistrationError};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Duration, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;
use tracing::{Instrument, debug, error, info, info_span, warn};

use crate::config::{ConfigLoader, MusterConfig, validate_config};
use crate::error::RuntimeResult;
use crate::logging;

type Registration = Box<dyn FnOnce(&mut EngineBuilder) -> Result<(), RegistrationError> + Send>;

/// A configured engine ready to service events.
pub struct MusterRuntime {
    engine: Engine,
    config: MusterConfig,
    shutdown: CancellationToken,
}

impl MusterRuntime {
    /// Starts building a runtime over `gateway`.
    pub fn builder(gateway: BoxedGateway) -> RuntimeBuilder {
        RuntimeBuilder::new(gateway)
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    pub fn config(&self) -> &MusterConfig {
        &self.config
    }

    /// A token that stops the runtime when cancelled.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Services `events` until Ctrl+C (or SIGTERM), the shutdown token, or
    /// the end of the event source.
    pub async fn run(self, events: mpsc::Receiver<GatewayEvent>) -> RuntimeResult<()> {
        self.run_until(events, shutdown_signal()).await
    }

    /// Services `events` until `shutdown` completes, the shutdown token is
    /// cancelled, or the event source closes.
    ///
    /// Stream queues are unbounded, so a stalled handler holds up only its
    /// own stream. When the source closes, events already queued are still
    /// handled. On shutdown, queued events are dropped and in-flight
    /// synchronous handlers are abandoned; detached handlers keep running.
    pub async fn run_until<F>(
        self,
        mut events: mpsc::Receiver<GatewayEvent>,
        shutdown: F,
    ) -> RuntimeResult<()>
    where
        F: Future<Output = ()>,
    {
        let token = self.shutdown.clone();

        let mut senders = Vec::with_capacity(EventStream::ALL.len());
        let mut workers = Vec::with_capacity(EventStream::ALL.len());
        for stream in EventStream::ALL {
            let (tx, rx) = mpsc::unbounded_channel();
            senders.push((stream, tx));
            workers.push(spawn_stream_worker(
                self.engine.clone(),
                stream,
                rx,
                token.clone(),
            ));
        }
        let ticker = spawn_ticker(
            self.engine.clone(),
            self.config.scheduler.tick_interval(),
            token.clone(),
        );

        info!(
            handlers = self.engine.registry().len(),
            tick_interval_ms = self.config.scheduler.tick_interval_ms,
            "Muster runtime is now running"
        );

        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                () = &mut shutdown => {
                    info!("Shutdown requested");
                    token.cancel();
                    break;
                }
                () = token.cancelled() => break,
                event = events.recv() => {
                    let Some(event) = event else {
                        info!("Event source closed");
                        break;
                    };
                    let stream = event.stream();
                    let Some((_, tx)) = senders.iter().find(|(s, _)| *s == stream) else {
                        continue;
                    };
                    if tx.send(event).is_err() {
                        warn!(?stream, "Stream worker stopped, dropping event");
                    }
                }
            }
        }

        drop(senders);
        let drained = join_all(workers);
        tokio::pin!(drained);
        let results = if token.is_cancelled() {
            drained.await
        } else {
            tokio::select! {
                results = &mut drained => results,
                () = &mut shutdown => {
                    info!("Shutdown requested, dropping queued events");
                    token.cancel();
                    drained.await
                }
                () = token.cancelled() => drained.await,
            }
        };
        for result in results {
            if let Err(e) = result {
                error!(error = %e, "Stream worker failed");
            }
        }

        token.cancel();
        if let Err(e) = ticker.await {
            error!(error = %e, "Tick task failed");
        }

        info!("Muster runtime stopped");
        Ok(())
    }
}

impl std::fmt::Debug for MusterRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MusterRuntime")
            .field("engine", &self.engine)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

fn spawn_stream_worker(
    engine: Engine,
    stream: EventStream,
    mut rx: mpsc::UnboundedReceiver<GatewayEvent>,
    token: CancellationToken,
) -> JoinHandle<()> {
    let span = info_span!("stream", ?stream);
    tokio::spawn(
        async move {
            debug!("Stream worker started");
            loop {
                let event = tokio::select! {
                    () = token.cancelled() => break,
                    event = rx.recv() => match event {
                        Some(event) => event,
                        None => break,
                    },
                };
                tokio::select! {
                    () = token.cancelled() => {
                        warn!("Abandoning in-flight event on shutdown");
                        break;
                    }
                    result = engine.clone().oneshot(event) => {
                        result.unwrap_or_else(|never| match never {});
                    }
                }
            }
            debug!("Stream worker stopped");
        }
        .instrument(span),
    )
}

fn spawn_ticker(engine: Engine, period: Duration, token: CancellationToken) -> JoinHandle<()> {
    tokio::spawn(
        async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    () = token.cancelled() => break,
                    now = interval.tick() => {
                        tokio::select! {
                            () = token.cancelled() => break,
                            () = engine.tick(now) => {}
                        }
                    }
                }
            }
        }
        .instrument(info_span!("ticker")),
    )
}

/// Completes on Ctrl+C, or SIGTERM on Unix.
///
/// If the signal handlers cannot be installed the failure is logged and the
/// future never completes.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let mut sigterm = match signal(SignalKind::terminate()) {
            Ok(sigterm) => sigterm,
            Err(e) => {
                error!(error = %e, "Failed to register SIGTERM handler");
                return wait_for_ctrl_c().await;
            }
        };

        tokio::select! {
            () = wait_for_ctrl_c() => {}
            _ = sigterm.recv() => info!("Received SIGTERM, shutting down"),
        }
    }

    #[cfg(not(unix))]
    wait_for_ctrl_c().await;
}

async fn wait_for_ctrl_c() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Received Ctrl+C, shutting down"),
        Err(e) => {
            error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    }
}

/// Builder for [`MusterRuntime`].
///
/// Features are registered after configuration and logging are set up, so
/// registration errors are logged through the configured subscriber.
pub struct RuntimeBuilder {
    gateway: BoxedGateway,
    loader: ConfigLoader,
    config: Option<MusterConfig>,
    init_logging: bool,
    registrations: Vec<Registration>,
}

impl RuntimeBuilder {
    pub fn new(gateway: BoxedGateway) -> Self {
        Self {
            gateway,
            loader: ConfigLoader::new(),
            config: None,
            init_logging: true,
            registrations: Vec::new(),
        }
    }

    /// Sets a specific configuration file to load.
    pub fn config_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.loader = self.loader.file(path);
        self
    }

    /// Sets the configuration profile (e.g. "development", "production").
    pub fn profile(mut self, profile: impl AsRef<str>) -> Self {
        self.loader = self.loader.profile(profile);
        self
    }

    /// Adds a search path for configuration files.
    pub fn search_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.loader = self.loader.search_path(path);
        self
    }

    /// Disables `MUSTER_*` environment overrides.
    pub fn without_env(mut self) -> Self {
        self.loader = self.loader.without_env();
        self
    }

    /// Uses `config` as is instead of loading one.
    pub fn config(mut self, config: MusterConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Leaves the global tracing subscriber to the caller.
    pub fn without_logging(mut self) -> Self {
        self.init_logging = false;
        self
    }

    /// Registers a feature object.
    pub fn feature<F: Feature>(mut self, feature: Arc<F>) -> Self {
        self.registrations
            .push(Box::new(move |engine: &mut EngineBuilder| {
                engine.add_feature(feature)
            }));
        self
    }

    /// Loads configuration, initializes logging and builds the engine.
    pub fn build(self) -> RuntimeResult<MusterRuntime> {
        let config = match self.config {
            Some(config) => {
                validate_config(&config)?;
                config
            }
            None => self.loader.load()?,
        };

        if self.init_logging {
            logging::init_from_config(&config.logging);
        }

        let mut builder = Engine::builder(self.gateway).config(config.engine.clone());
        for register in self.registrations {
            if let Err(e) = register(&mut builder) {
                error!(error = %e, "Feature registration failed");
                return Err(e.into());
            }
        }
        let engine = builder.build().inspect_err(|e| {
            error!(error = %e, "Feature registration failed");
        })?;

        info!(
            log_level = %config.logging.level,
            log_format = ?config.logging.format,
            handlers = engine.registry().len(),
            "Runtime initialized from configuration"
        );

        Ok(MusterRuntime {
            engine,
            config,
            shutdown: CancellationToken::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use muster_core::{
        ChannelId, CommandSchema, ComponentInteraction, ComponentKind, Gateway, GatewayResult,
        GuildId, InteractionId, Message, MessageId, Ready, Role, User, UserId,
    };
    use muster_framework::{HandlerResult, Invocation, Registrar};

    use super::*;
    use crate::error::RuntimeError;

    struct NullGateway;

    #[async_trait]
    impl Gateway for NullGateway {
        async fn send_message(&self, _: ChannelId, _: &str) -> GatewayResult<MessageId> {
            Ok(MessageId(1))
        }

        async fn prompt(
            &self,
            _: ChannelId,
            _: UserId,
            _: Duration,
        ) -> GatewayResult<Option<Message>> {
            Ok(None)
        }

        async fn guilds(&self) -> GatewayResult<Vec<GuildId>> {
            Ok(Vec::new())
        }

        async fn member_roles(&self, _: GuildId, _: UserId) -> GatewayResult<Vec<Role>> {
            Ok(Vec::new())
        }

        async fn register_commands(&self, _: GuildId, _: &[CommandSchema]) -> GatewayResult<()> {
            Ok(())
        }

        async fn respond(&self, _: InteractionId, _: &str) -> GatewayResult<()> {
            Ok(())
        }
    }

    struct Recorder {
        seen: mpsc::UnboundedSender<String>,
    }

    impl Recorder {
        fn new() -> (Arc<Self>, mpsc::UnboundedReceiver<String>) {
            let (seen, rx) = mpsc::unbounded_channel();
            (Arc::new(Self { seen }), rx)
        }

        async fn record(self: Arc<Self>, ctx: Invocation) -> HandlerResult {
            self.seen.send(ctx.handler().name().to_string())?;
            Ok(())
        }
    }

    impl Feature for Recorder {
        fn register(r: &mut Registrar<Self>) {
            r.handler("ping", Self::record).command("!ping");
            r.handler("boot", Self::record).on_ready();
            r.handler("tick", Self::record).every(0, 1);
        }
    }

    fn user(id: u64) -> User {
        User {
            id: UserId(id),
            name: format!("user{id}"),
            bot: false,
        }
    }

    fn ready() -> GatewayEvent {
        GatewayEvent::Ready(Ready {
            user: user(99),
            guilds: Vec::new(),
        })
    }

    fn ping() -> GatewayEvent {
        GatewayEvent::Message(Message {
            id: MessageId(5),
            guild_id: None,
            channel_id: ChannelId(10),
            author: user(7),
            content: "!ping".into(),
            mentions: Vec::new(),
        })
    }

    fn runtime(config: MusterConfig, recorder: Arc<Recorder>) -> RuntimeResult<MusterRuntime> {
        MusterRuntime::builder(Arc::new(NullGateway))
            .config(config)
            .without_logging()
            .feature(recorder)
            .build()
    }

    fn drain(rx: &mut mpsc::UnboundedReceiver<String>) -> Vec<String> {
        let mut seen = Vec::new();
        while let Ok(name) = rx.try_recv() {
            seen.push(name);
        }
        seen
    }

    #[tokio::test]
    async fn test_queued_events_are_handled_before_stopping() {
        let (recorder, mut seen) = Recorder::new();
        let runtime = runtime(MusterConfig::default(), recorder).unwrap();

        let (tx, rx) = mpsc::channel(8);
        tx.send(ready()).await.unwrap();
        tx.send(ping()).await.unwrap();
        drop(tx);

        runtime
            .run_until(rx, std::future::pending())
            .await
            .unwrap();

        let seen = drain(&mut seen);
        assert!(seen.iter().any(|name| name == "boot"));
        assert!(seen.iter().any(|name| name == "ping"));
    }

    #[tokio::test]
    async fn test_shutdown_token_stops_runtime() {
        let (recorder, _seen) = Recorder::new();
        let runtime = runtime(MusterConfig::default(), recorder).unwrap();
        let token = runtime.shutdown_token();

        let (_tx, rx) = mpsc::channel(8);
        let handle = tokio::spawn(runtime.run_until(rx, std::future::pending()));
        token.cancel();
        handle.await.unwrap().unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticker_drives_interval_handlers() {
        let (recorder, mut seen) = Recorder::new();
        let mut config = MusterConfig::default();
        config.scheduler.tick_interval_ms = 500;
        let runtime = runtime(config, recorder).unwrap();

        let (tx, rx) = mpsc::channel(8);
        tx.send(ready()).await.unwrap();
        runtime
            .run_until(rx, tokio::time::sleep(Duration::from_secs(3)))
            .await
            .unwrap();

        let ticks = drain(&mut seen)
            .into_iter()
            .filter(|name| name == "tick")
            .count();
        // Once a second after ready, over three seconds.
        assert!((2..=4).contains(&ticks), "fired {ticks} times");
        drop(tx);
    }

    /// Never finishes handling messages; records button clicks.
    struct Stuck {
        clicks: mpsc::UnboundedSender<String>,
    }

    impl Stuck {
        async fn hang(self: Arc<Self>, _ctx: Invocation) -> HandlerResult {
            std::future::pending::<()>().await;
            Ok(())
        }

        async fn click(self: Arc<Self>, ctx: Invocation) -> HandlerResult {
            let component = ctx.component().ok_or("not a click")?;
            self.clicks.send(component.custom_id.clone())?;
            Ok(())
        }
    }

    impl Feature for Stuck {
        fn register(r: &mut Registrar<Self>) {
            r.handler("hang", Self::hang).on_message();
            r.handler("click", Self::click).button("b");
        }
    }

    fn click(custom_id: &str) -> GatewayEvent {
        GatewayEvent::Component(ComponentInteraction {
            id: InteractionId(1),
            kind: ComponentKind::Button,
            custom_id: custom_id.into(),
            values: Vec::new(),
            message_id: None,
            guild_id: None,
            channel_id: ChannelId(10),
            user: user(7),
        })
    }

    #[tokio::test(start_paused = true)]
    async fn test_stalled_stream_does_not_block_others_or_shutdown() {
        let (clicks, mut clicked) = mpsc::unbounded_channel();
        let runtime = MusterRuntime::builder(Arc::new(NullGateway))
            .config(MusterConfig::default())
            .without_logging()
            .feature(Arc::new(Stuck { clicks }))
            .build()
            .unwrap();

        let (tx, rx) = mpsc::channel(512);
        for _ in 0..300 {
            tx.send(ping()).await.unwrap();
        }
        tx.send(click("b")).await.unwrap();

        let stopped = tokio::time::timeout(
            Duration::from_secs(60),
            runtime.run_until(rx, tokio::time::sleep(Duration::from_secs(2))),
        )
        .await;
        assert!(stopped.is_ok(), "runtime ignored shutdown");
        assert_eq!(clicked.try_recv().ok().as_deref(), Some("b"));
        drop(tx);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_interrupts_drain_of_stalled_stream() {
        let (clicks, _clicked) = mpsc::unbounded_channel();
        let runtime = MusterRuntime::builder(Arc::new(NullGateway))
            .config(MusterConfig::default())
            .without_logging()
            .feature(Arc::new(Stuck { clicks }))
            .build()
            .unwrap();

        let (tx, rx) = mpsc::channel(8);
        tx.send(ping()).await.unwrap();
        drop(tx);

        let stopped = tokio::time::timeout(
            Duration::from_secs(60),
            runtime.run_until(rx, tokio::time::sleep(Duration::from_secs(2))),
        )
        .await;
        assert!(stopped.is_ok(), "draining ignored shutdown");
    }

    #[test]
    fn test_invalid_config_fails_build() {
        let (recorder, _seen) = Recorder::new();
        let mut config = MusterConfig::default();
        config.scheduler.tick_interval_ms = 0;

        let err = runtime(config, recorder).unwrap_err();
        assert!(matches!(err, RuntimeError::Config(_)));
    }

    #[test]
    fn test_registration_error_fails_build() {
        struct Broken;

        impl Broken {
            async fn run(self: Arc<Self>, _ctx: Invocation) -> HandlerResult {
                Ok(())
            }
        }

        impl Feature for Broken {
            fn register(r: &mut Registrar<Self>) {
                r.handler("run", Self::run);
            }
        }

        let err = MusterRuntime::builder(Arc::new(NullGateway))
            .config(MusterConfig::default())
            .without_logging()
            .feature(Arc::new(Broken))
            .build()
            .unwrap_err();
        assert!(matches!(
            err,
            RuntimeError::Registration(RegistrationError::NoTriggers { .. })
        ));
    }
}
