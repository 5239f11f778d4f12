//! Request dispatch.
//!
//! The router maps method names to handlers. Handlers are synchronous: they
//! read the request, touch shared state under short-lived locks and return an
//! [`Outcome`]. The router turns that into the reply plus any pushes and
//! queues them for the writer. Every known request runs in its own task, so
//! a slow handler never holds up the ingress queue and requests from one
//! connection may complete out of order.

use crate::connection::{Incoming, Outgoing};
use crate::context::ServerContext;
use crate::error::ServiceError;
use log::{debug, info, warn};
use shared::{Data, Response};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;

pub const UNKNOWN_METHOD: &str = "unknown method";

pub type Handler = fn(&ServerContext, &Incoming) -> Result<Outcome, ServiceError>;

/// What a successful handler produced: the reply payload for the caller and
/// pushes for other connections.
#[derive(Debug, Default)]
pub struct Outcome {
    pub data: Data,
    pub pushes: Vec<Outgoing>,
}

impl Outcome {
    pub fn reply(data: Data) -> Self {
        Self {
            data,
            pushes: Vec::new(),
        }
    }

    /// Adds a push if it could be addressed.
    pub fn with_push(mut self, push: Option<Outgoing>) -> Self {
        self.pushes.extend(push);
        self
    }
}

#[derive(Default)]
pub struct Router {
    routes: HashMap<String, Handler>,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handler` for `method`, replacing any previous one.
    pub fn add_route(&mut self, method: &str, handler: Handler) {
        self.routes.insert(method.to_string(), handler);
    }

    pub fn has_route(&self, method: &str) -> bool {
        self.routes.contains_key(method)
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Runs a handler and builds everything that has to be written back.
    /// The reply to the caller always comes first.
    pub fn handle(handler: Handler, ctx: &ServerContext, incoming: &Incoming) -> Vec<Outgoing> {
        let method = &incoming.request.method;

        match handler(ctx, incoming) {
            Ok(outcome) => {
                debug!("{} from {} handled", method, incoming.from);
                let mut outgoing = Vec::with_capacity(1 + outcome.pushes.len());
                outgoing.push(Outgoing::new(
                    incoming.from,
                    Response::ok(method.as_str(), outcome.data),
                ));
                outgoing.extend(outcome.pushes);
                outgoing
            }
            Err(e) => {
                warn!("{} from {} rejected: {}", method, incoming.from, e);
                vec![Outgoing::new(
                    incoming.from,
                    Response::error(method.as_str(), e.to_string()),
                )]
            }
        }
    }

    /// Hands one request to its handler without waiting for it to finish.
    pub async fn dispatch(&self, ctx: &Arc<ServerContext>, incoming: Incoming) {
        let Some(handler) = self.routes.get(&incoming.request.method).copied() else {
            warn!(
                "Unknown method {:?} from {}",
                incoming.request.method, incoming.from
            );
            let response = Response::error(incoming.request.method, UNKNOWN_METHOD);
            ctx.enqueue(Outgoing::new(incoming.from, response)).await;
            return;
        };

        let ctx = Arc::clone(ctx);
        tokio::spawn(async move {
            for outgoing in Self::handle(handler, &ctx, &incoming) {
                ctx.enqueue(outgoing).await;
            }
        });
    }

    /// Drains the ingress queue until every sender is gone.
    pub async fn run(&self, ctx: Arc<ServerContext>, mut ingress: mpsc::Receiver<Incoming>) {
        while let Some(incoming) = ingress.recv().await {
            self.dispatch(&ctx, incoming).await;
        }
        info!("Dispatcher stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::test_support::*;
    use serde_json::Value;
    use shared::{Request, Status};
    use std::time::Duration;
    use tokio::time::timeout;

    fn echo(_ctx: &ServerContext, incoming: &Incoming) -> Result<Outcome, ServiceError> {
        Ok(Outcome::reply(incoming.request.data.clone()))
    }

    fn reject(_ctx: &ServerContext, _incoming: &Incoming) -> Result<Outcome, ServiceError> {
        Err(ServiceError::RoomFull)
    }

    fn push_to_alice(ctx: &ServerContext, _incoming: &Incoming) -> Result<Outcome, ServiceError> {
        let push = ctx.push_to("alice", Response::ok("nudge", Data::new()));
        Ok(Outcome::reply(Data::new()).with_push(push))
    }

    fn test_router() -> Router {
        let mut router = Router::new();
        router.add_route("echo", echo);
        router.add_route("reject", reject);
        router.add_route("nudge", push_to_alice);
        router
    }

    #[test]
    fn test_router_registration() {
        let router = test_router();
        assert_eq!(router.len(), 3);
        assert!(router.has_route("echo"));
        assert!(!router.has_route("get_opponent_card"));
        assert!(Router::new().is_empty());
    }

    #[test]
    fn test_handle_success_replies_to_caller() {
        let (ctx, _rx) = test_context();
        let request = incoming(7000, Request::new("echo").with("x", 1));

        let outgoing = Router::handle(echo, &ctx, &request);
        assert_eq!(outgoing.len(), 1);
        assert_eq!(outgoing[0].to, conn(7000));
        assert_eq!(outgoing[0].response.status, Status::Ok);
        assert_eq!(outgoing[0].response.data.get("x"), Some(&Value::from(1)));
    }

    #[test]
    fn test_handle_error_becomes_error_response() {
        let (ctx, _rx) = test_context();
        let outgoing = Router::handle(reject, &ctx, &incoming(7001, Request::new("reject")));

        assert_eq!(outgoing.len(), 1);
        assert_eq!(outgoing[0].response.method, "reject");
        assert_eq!(outgoing[0].response.status, Status::Error);
        assert_eq!(outgoing[0].response.message(), Some("room is full"));
    }

    #[test]
    fn test_handle_reply_precedes_pushes() {
        let (ctx, _rx) = test_context();
        logged_in(&ctx, "alice", 7002);

        let outgoing = Router::handle(push_to_alice, &ctx, &incoming(7003, Request::new("nudge")));
        assert_eq!(outgoing.len(), 2);
        assert_eq!(outgoing[0].to, conn(7003));
        assert_eq!(outgoing[1].to, conn(7002));
        assert_eq!(outgoing[1].response.method, "nudge");
    }

    #[tokio::test]
    async fn test_dispatch_unknown_method() {
        let (ctx, mut rx) = test_context();
        let router = test_router();

        router
            .dispatch(&ctx, incoming(7004, Request::new("get_opponent_card")))
            .await;

        let outgoing = rx.recv().await.unwrap();
        assert_eq!(outgoing.to, conn(7004));
        assert_eq!(outgoing.response.method, "get_opponent_card");
        assert_eq!(outgoing.response.status, Status::Error);
        assert_eq!(outgoing.response.message(), Some(UNKNOWN_METHOD));
    }

    #[tokio::test]
    async fn test_dispatch_spawns_handler() {
        let (ctx, mut rx) = test_context();
        let router = test_router();

        router
            .dispatch(&ctx, incoming(7005, Request::new("echo").with("n", 5)))
            .await;

        let outgoing = timeout(Duration::from_secs(1), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert!(outgoing.response.is_ok());
        assert_eq!(outgoing.response.data.get("n"), Some(&Value::from(5)));
    }

    #[tokio::test]
    async fn test_run_stops_when_ingress_closes() {
        let (ctx, mut rx) = test_context();
        let router = test_router();
        let (tx, ingress) = mpsc::channel(8);

        tx.send(incoming(7006, Request::new("nope"))).await.unwrap();
        drop(tx);

        timeout(Duration::from_secs(1), router.run(ctx, ingress))
            .await
            .unwrap();
        let outgoing = rx.recv().await.unwrap();
        assert_eq!(outgoing.response.message(), Some(UNKNOWN_METHOD));
    }
}
