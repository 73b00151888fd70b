//! Handler traits.
//!
//! A handler is an async method on a feature object. Every handler has the
//! same shape, so the dispatcher never inspects return types:
//!
//! ```rust,ignore
//! impl Giveaway {
//!     async fn start(self: Arc<Self>, ctx: Invocation) -> HandlerResult {
//!         let prize = ctx.args().text("prize")?;
//!         ctx.reply(&format!("Giveaway started for {prize}!")).await?;
//!         Ok(())
//!     }
//! }
//! ```
//!
//! `Giveaway::start` then implements [`Handler<Giveaway>`] and can be passed
//! to [`Registrar::handler`](crate::Registrar::handler).

use std::future::Future;
use std::marker::PhantomData;
use std::pin::Pin;
use std::sync::Arc;

use crate::context::Invocation;
use crate::error::HandlerResult;

/// A type alias for a boxed, pinned future that is `Send`.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A handler method of the feature type `S`.
///
/// Implemented for every `Fn(Arc<S>, Invocation) -> impl Future<Output =
/// HandlerResult>`, which covers `async fn(self: Arc<Self>, ctx: Invocation)`
/// methods as well as closures.
pub trait Handler<S>: Send + Sync + 'static {
    /// Calls the handler on `owner`.
    fn call(&self, owner: Arc<S>, ctx: Invocation) -> BoxFuture<'static, HandlerResult>;
}

impl<S, F, Fut> Handler<S> for F
where
    S: Send + Sync + 'static,
    F: Fn(Arc<S>, Invocation) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    fn call(&self, owner: Arc<S>, ctx: Invocation) -> BoxFuture<'static, HandlerResult> {
        Box::pin((self)(owner, ctx))
    }
}

/// Type-erased handler trait for dynamic dispatch.
pub trait ErasedHandler: Send + Sync {
    /// Runs the handler with the given invocation.
    fn call(&self, ctx: Invocation) -> BoxFuture<'static, HandlerResult>;
}

/// A handler together with the feature instance it belongs to.
pub struct BoundHandler<S, H> {
    owner: Arc<S>,
    handler: H,
    _marker: PhantomData<fn() -> S>,
}

impl<S, H> BoundHandler<S, H> {
    /// Binds `handler` to `owner`.
    pub fn new(owner: Arc<S>, handler: H) -> Self {
        Self {
            owner,
            handler,
            _marker: PhantomData,
        }
    }
}

impl<S, H> ErasedHandler for BoundHandler<S, H>
where
    S: Send + Sync + 'static,
    H: Handler<S>,
{
    fn call(&self, ctx: Invocation) -> BoxFuture<'static, HandlerResult> {
        self.handler.call(Arc::clone(&self.owner), ctx)
    }
}

/// A type-erased handler that can be stored in collections.
pub type BoxedHandler = Arc<dyn ErasedHandler>;

/// Binds a handler to its owner and erases both types.
pub fn bind_handler<S, H>(owner: Arc<S>, handler: H) -> BoxedHandler
where
    S: Send + Sync + 'static,
    H: Handler<S>,
{
    Arc::new(BoundHandler::new(owner, handler))
}
