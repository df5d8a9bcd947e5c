//! Guard composition
//!
//! A guard inspects (and may annotate) the request parts before the
//! handler runs. Guards are plain values composed into a [`GuardChain`],
//! which runs them in order and short-circuits on the first failure.
//!
//! # Example
//!
//! ```ignore
//! use axum::{Router, handler::Handler, routing::get};
//!
//! let chain = state.active_staff().then(RoleGuard::new([StaffRole::Admin]));
//!
//! Router::new().route("/staff", get(list_staff.layer(chain)))
//! ```

use std::sync::Arc;
use std::task::{Context, Poll};

use async_trait::async_trait;
use axum::extract::Request;
use axum::http::request::Parts;
use axum::response::{IntoResponse, Response};
use futures_util::future::BoxFuture;
use tower::{Layer, Service};

use crate::error::ApiError;

/// One authorization step
#[async_trait]
pub trait Guard: Send + Sync + 'static {
    /// Allow the request through or reject it
    ///
    /// Guards that establish identity insert it into `parts.extensions`
    /// for later guards and handlers.
    async fn check(&self, parts: &mut Parts) -> Result<(), ApiError>;
}

/// Ordered list of guards, usable as a tower layer
#[derive(Clone, Default)]
pub struct GuardChain {
    guards: Vec<Arc<dyn Guard>>,
}

impl std::fmt::Debug for GuardChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GuardChain")
            .field("len", &self.guards.len())
            .finish()
    }
}

impl GuardChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a guard that runs after the existing ones
    pub fn then<G: Guard>(mut self, guard: G) -> Self {
        self.guards.push(Arc::new(guard));
        self
    }

    pub fn len(&self) -> usize {
        self.guards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.guards.is_empty()
    }

    /// Run every guard in order
    pub async fn run(&self, parts: &mut Parts) -> Result<(), ApiError> {
        for guard in &self.guards {
            guard.check(parts).await?;
        }
        Ok(())
    }
}

impl<S> Layer<S> for GuardChain {
    type Service = GuardService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        GuardService {
            inner,
            chain: self.clone(),
        }
    }
}

/// Service that runs a guard chain before forwarding the request
#[derive(Clone)]
pub struct GuardService<S> {
    inner: S,
    chain: GuardChain,
}

impl<S> Service<Request> for GuardService<S>
where
    S: Service<Request, Response = Response> + Clone + Send + 'static,
    S::Future: Send,
{
    type Response = Response;
    type Error = S::Error;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request) -> Self::Future {
        let chain = self.chain.clone();
        let mut inner = self.inner.clone();

        Box::pin(async move {
            let (mut parts, body) = req.into_parts();

            if let Err(e) = chain.run(&mut parts).await {
                return Ok(e.into_response());
            }

            inner.call(Request::from_parts(parts, body)).await
        })
    }
}
