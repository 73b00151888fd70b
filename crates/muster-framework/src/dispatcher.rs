//! Handler execution.
//!
//! The [`Dispatcher`] runs a resolved list of handlers for one payload:
//!
//! 1. Handlers run in list order
//! 2. [`ExecutionMode::Sync`] handlers are awaited before the next starts
//! 3. [`ExecutionMode::FireAndForget`] handlers are spawned and not awaited
//! 4. A failing or panicking handler is logged and never affects the others
//!
//! For text commands a failure is also answered in the originating channel,
//! with the handler's usage hint when it declares one.

use std::any::Any;
use std::error::Error;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use muster_core::BoxedGateway;
use tracing::{Instrument, debug, error, trace, warn};

use crate::args::Args;
use crate::context::{Invocation, Payload};
use crate::descriptor::{ExecutionMode, HandlerDescriptor};

/// What to do after a handler fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Log the failure only.
    LogOnly,
    /// Log, then reply with the usage hint or the generic failure message.
    ReplyUsage,
}

/// How to choose each handler's execution mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModePolicy {
    /// Use the mode the handler declared.
    Declared,
    /// Detach every handler regardless of its declaration.
    Detached,
}

/// One handler ready to run, with its bound arguments.
#[derive(Debug)]
pub struct Call {
    pub handler: Arc<HandlerDescriptor>,
    pub args: Args,
}

impl Call {
    pub fn new(handler: Arc<HandlerDescriptor>, args: Args) -> Self {
        Self { handler, args }
    }
}

/// Runs handlers with per-handler error isolation.
///
/// Cheap to clone; clones share the gateway and failure message.
#[derive(Clone)]
pub struct Dispatcher {
    gateway: BoxedGateway,
    failure_reply: Arc<str>,
}

impl Dispatcher {
    /// Creates a dispatcher replying `failure_reply` when a text command
    /// without a usage hint fails.
    pub fn new(gateway: BoxedGateway, failure_reply: impl Into<Arc<str>>) -> Self {
        Self {
            gateway,
            failure_reply: failure_reply.into(),
        }
    }

    /// Runs `calls` in order for `payload`.
    ///
    /// Returns once every synchronous handler has finished; detached handlers
    /// may still be running.
    pub async fn dispatch(
        &self,
        payload: &Arc<Payload>,
        calls: Vec<Call>,
        modes: ModePolicy,
        failure: FailurePolicy,
    ) {
        for Call { handler, args } in calls {
            let mode = match modes {
                ModePolicy::Declared => handler.mode(),
                ModePolicy::Detached => ExecutionMode::FireAndForget,
            };
            let ctx = Invocation::new(
                Arc::clone(payload),
                args,
                Arc::clone(&self.gateway),
                Arc::clone(&handler),
            );

            match mode {
                ExecutionMode::Sync => self.execute(handler, ctx, failure).await,
                ExecutionMode::FireAndForget => {
                    trace!(handler = handler.name(), "Detaching handler");
                    let this = self.clone();
                    tokio::spawn(
                        async move { this.execute(handler, ctx, failure).await }.in_current_span(),
                    );
                }
            }
        }
    }

    async fn execute(
        &self,
        handler: Arc<HandlerDescriptor>,
        ctx: Invocation,
        failure: FailurePolicy,
    ) {
        trace!(handler = handler.name(), owner = handler.owner(), "Executing handler");
        let payload = ctx.shared_payload();

        match AssertUnwindSafe(handler.call(ctx)).catch_unwind().await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => self.report(&handler, &payload, e.as_ref(), failure).await,
            Err(panic) => {
                let message = panic_message(panic.as_ref());
                let err: Box<dyn Error + Send + Sync> =
                    format!("handler panicked: {message}").into();
                self.report(&handler, &payload, err.as_ref(), failure).await;
            }
        }
    }

    /// Logs a failed invocation and applies `failure`.
    pub async fn report(
        &self,
        handler: &HandlerDescriptor,
        payload: &Payload,
        err: &(dyn Error + Send + Sync),
        failure: FailurePolicy,
    ) {
        error!(
            handler = handler.name(),
            owner = handler.owner(),
            trigger = %handler.trigger(),
            error = %err,
            "Handler failed"
        );

        if failure != FailurePolicy::ReplyUsage {
            return;
        }
        let Payload::Event(event) = payload else {
            return;
        };
        let Some(channel) = event.channel_id() else {
            debug!(handler = handler.name(), "No channel to report failure to");
            return;
        };

        let reply = handler.usage().unwrap_or(self.failure_reply.as_ref());
        if let Err(e) = self.gateway.send_message(channel, reply).await {
            warn!(%channel, error = %e, "Failed to send failure reply");
        }
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("failure_reply", &self.failure_reply)
            .finish_non_exhaustive()
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(s) = panic.downcast_ref::<&'static str>() {
        s
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s
    } else {
        "non-string panic payload"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::TriggerRegistry;
    use crate::testing::{CHANNEL, RecordingGateway, Scripted, drain, message};
    use crate::trigger::TriggerKind;

    fn calls(registry: &TriggerRegistry) -> Vec<Call> {
        registry
            .listeners(TriggerKind::Message)
            .iter()
            .map(|h| Call::new(Arc::clone(h), Args::new()))
            .collect()
    }

    #[tokio::test]
    async fn test_sync_handlers_run_in_order() {
        let gateway = RecordingGateway::new();
        let (feature, mut rx) = Scripted::new(|r| {
            r.handler("one", Scripted::echo).on_message();
            r.handler("two", Scripted::fail).on_message();
            r.handler("three", Scripted::echo).on_message();
        });
        let registry = TriggerRegistry::builder()
            .feature(feature)
            .unwrap()
            .build()
            .unwrap();

        let dispatcher = Dispatcher::new(gateway.boxed(), "failed");
        let payload = Arc::new(Payload::Event(message(7, "hi")));
        dispatcher
            .dispatch(&payload, calls(&registry), ModePolicy::Declared, FailurePolicy::LogOnly)
            .await;

        assert_eq!(drain(&mut rx), ["one", "three"]);
        assert!(gateway.sent().is_empty());
    }

    #[tokio::test]
    async fn test_detached_mode_overrides_declared_mode() {
        let gateway = RecordingGateway::new();
        let (feature, mut rx) = Scripted::new(|r| {
            r.handler("slow", Scripted::wait).on_message();
        });
        let registry = TriggerRegistry::builder()
            .feature(Arc::clone(&feature))
            .unwrap()
            .build()
            .unwrap();

        let dispatcher = Dispatcher::new(gateway.boxed(), "failed");
        let payload = Arc::new(Payload::Event(message(7, "hi")));
        // Would never return if `slow` were awaited.
        dispatcher
            .dispatch(&payload, calls(&registry), ModePolicy::Detached, FailurePolicy::LogOnly)
            .await;
        assert!(drain(&mut rx).is_empty());

        feature.release.notify_one();
        assert_eq!(rx.recv().await.as_deref(), Some("slow"));
    }

    #[tokio::test]
    async fn test_panics_are_reported_like_errors() {
        let gateway = RecordingGateway::new();
        let (feature, _rx) = Scripted::new(|r| {
            r.handler("boom", Scripted::explode).on_message();
        });
        let registry = TriggerRegistry::builder()
            .feature(feature)
            .unwrap()
            .build()
            .unwrap();

        let dispatcher = Dispatcher::new(gateway.boxed(), "Something broke");
        let payload = Arc::new(Payload::Event(message(7, "hi")));
        dispatcher
            .dispatch(
                &payload,
                calls(&registry),
                ModePolicy::Declared,
                FailurePolicy::ReplyUsage,
            )
            .await;

        assert_eq!(gateway.sent(), [(CHANNEL, "Something broke".to_string())]);
    }

    #[tokio::test]
    async fn test_ticks_have_no_channel_to_reply_to() {
        let gateway = RecordingGateway::new();
        let (feature, _rx) = Scripted::new(|r| {
            r.handler("boom", Scripted::fail).on_message();
        });
        let registry = TriggerRegistry::builder()
            .feature(feature)
            .unwrap()
            .build()
            .unwrap();

        let dispatcher = Dispatcher::new(gateway.boxed(), "failed");
        let payload = Arc::new(Payload::Tick(tokio::time::Instant::now()));
        dispatcher
            .dispatch(
                &payload,
                calls(&registry),
                ModePolicy::Declared,
                FailurePolicy::ReplyUsage,
            )
            .await;

        assert!(gateway.sent().is_empty());
    }

    #[test]
    fn test_panic_message() {
        let payload: Box<dyn Any + Send> = Box::new("static");
        assert_eq!(panic_message(payload.as_ref()), "static");
        let payload: Box<dyn Any + Send> = Box::new(String::from("owned"));
        assert_eq!(panic_message(payload.as_ref()), "owned");
        let payload: Box<dyn Any + Send> = Box::new(42);
        assert_eq!(panic_message(payload.as_ref()), "non-string panic payload");
    }
}
