//! Scriptable HTTP server for testing tile clients.
//!
//! Each [`Server::anticipate`] call queues one expected request for a path. Requests for the
//! same path are matched against anticipations in the order they were made, which makes it easy
//! to script a server that fails a few times and then succeeds. Requests nobody anticipated are
//! answered with `418` and make the [`Server`] panic when dropped.

use http_body_util::Full;
use hyper::{Request, Response, server::conn::http1, service::Service};
use hyper_util::rt::TokioIo;
use std::{
    collections::{HashMap, VecDeque},
    future::Future,
    net::SocketAddr,
    pin::Pin,
    sync::{Arc, Mutex, MutexGuard},
    time::Instant,
};
use tokio::{net::TcpListener, sync::oneshot};

pub use hyper;
pub use hyper::StatusCode;
pub use hyper::body::Bytes;

enum Reply {
    Body(Bytes),
    Status(StatusCode),
}

struct Anticipation {
    request_tx: oneshot::Sender<Request<()>>,
    reply_rx: oneshot::Receiver<Reply>,
}

/// Request which reached the server, anticipated or not.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub path: String,
    pub at: Instant,
}

#[derive(Default)]
struct State {
    anticipated: HashMap<String, VecDeque<Anticipation>>,
    unexpected: Vec<String>,
    log: Vec<RecordedRequest>,
}

fn lock(state: &Mutex<State>) -> MutexGuard<'_, State> {
    // A panicking test thread is the only way to poison it, and the state is still usable.
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

pub struct Server {
    port: u16,
    state: Arc<Mutex<State>>,
}

impl Server {
    /// Create new [`Server`], and bind it to a random port.
    ///
    /// # Panics
    ///
    /// When no local port can be bound.
    pub async fn bind() -> Self {
        let state = Arc::new(Mutex::new(State::default()));

        let addr = SocketAddr::from(([127, 0, 0, 1], 0));
        #[allow(clippy::unwrap_used)] // Test helper.
        let listener = TcpListener::bind(addr).await.unwrap();
        #[allow(clippy::unwrap_used)] // Test helper.
        let port = listener.local_addr().unwrap().port();

        let state_clone = Arc::clone(&state);
        tokio::spawn(async move {
            loop {
                let Ok((stream, _)) = listener.accept().await else {
                    log::error!("Mock server stopped accepting connections.");
                    break;
                };
                let io = TokioIo::new(stream);

                let state = Arc::clone(&state_clone);
                tokio::task::spawn(async move {
                    if let Err(err) = http1::Builder::new()
                        .serve_connection(io, MockRequest { state })
                        .await
                    {
                        log::debug!("Connection closed: {err}");
                    }
                });
            }
        });

        Self { port, state }
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Base URL of the server, without a trailing slash.
    pub fn url(&self) -> String {
        format!("http://localhost:{}", self.port)
    }

    /// Queue one expected request for `path`.
    pub fn anticipate(&self, path: impl Into<String>) -> AnticipatedRequest {
        let path = path.into();
        log::info!("Anticipating '{path}'.");

        let (request_tx, request_rx) = oneshot::channel();
        let (reply_tx, reply_rx) = oneshot::channel();

        lock(&self.state)
            .anticipated
            .entry(path)
            .or_default()
            .push_back(Anticipation {
                request_tx,
                reply_rx,
            });

        AnticipatedRequest {
            request_rx: Some(request_rx),
            reply_tx: Some(reply_tx),
        }
    }

    /// Every request received so far, in arrival order.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        lock(&self.state).log.clone()
    }
}

impl Drop for Server {
    fn drop(&mut self) {
        let unexpected = lock(&self.state).unexpected.clone();
        if !unexpected.is_empty() && !std::thread::panicking() {
            panic!("there are unexpected requests: {unexpected:?}");
        }
    }
}

/// Handle to a request queued with [`Server::anticipate`].
pub struct AnticipatedRequest {
    request_rx: Option<oneshot::Receiver<Request<()>>>,
    reply_tx: Option<oneshot::Sender<Reply>>,
}

impl AnticipatedRequest {
    /// Wait until the request arrives, and return its head.
    ///
    /// # Panics
    ///
    /// When called twice, or when the server went away.
    #[allow(clippy::unwrap_used)] // Test helper.
    pub async fn expect(&mut self) -> Request<()> {
        let request_rx = self.request_rx.take().unwrap();
        request_rx.await.unwrap()
    }

    /// Respond with `200 OK` and the given body. Can be called before the request arrives.
    pub fn respond(mut self, payload: impl Into<Bytes>) {
        self.reply(Reply::Body(payload.into()));
    }

    /// Respond with an empty body and the given status.
    pub fn respond_with_status(mut self, status: StatusCode) {
        self.reply(Reply::Status(status));
    }

    fn reply(&mut self, reply: Reply) {
        if let Some(reply_tx) = self.reply_tx.take() {
            if reply_tx.send(reply).is_err() {
                log::warn!("Server is gone, nobody to respond to.");
            }
        }
    }
}

struct MockRequest {
    state: Arc<Mutex<State>>,
}

impl Service<Request<hyper::body::Incoming>> for MockRequest {
    type Response = Response<Full<Bytes>>;
    type Error = hyper::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn call(&self, request: Request<hyper::body::Incoming>) -> Self::Future {
        let path = request.uri().path().to_owned();
        log::info!("Incoming request '{}'.", request.uri());

        let anticipation = {
            let mut state = lock(&self.state);
            state.log.push(RecordedRequest {
                path: path.clone(),
                at: Instant::now(),
            });
            state
                .anticipated
                .get_mut(&path)
                .and_then(VecDeque::pop_front)
        };

        let state = Arc::clone(&self.state);
        Box::pin(async move {
            let Some(anticipation) = anticipation else {
                log::warn!("Unexpected '{path}'.");
                lock(&state).unexpected.push(path);
                return Ok(response(StatusCode::IM_A_TEAPOT, Bytes::from_static(b"unexpected")));
            };

            let (parts, _body) = request.into_parts();
            if anticipation
                .request_tx
                .send(Request::from_parts(parts, ()))
                .is_err()
            {
                log::debug!("Nobody is waiting for '{path}'.");
            }

            Ok(match anticipation.reply_rx.await {
                Ok(Reply::Body(payload)) => response(StatusCode::OK, payload),
                Ok(Reply::Status(status)) => response(status, Bytes::new()),
                Err(_) => {
                    log::warn!("Anticipation for '{path}' was dropped without a reply.");
                    response(StatusCode::INTERNAL_SERVER_ERROR, Bytes::new())
                }
            })
        })
    }
}

fn response(status: StatusCode, payload: Bytes) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(payload));
    *response.status_mut() = status;
    response
}
