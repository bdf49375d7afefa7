//! HTTP/1 server adapting a [`Handler`] to hyper connections

use bytes::Bytes;
use futures_util::TryStreamExt;
use http_body_util::combinators::UnsyncBoxBody;
use http_body_util::{BodyExt, Empty, Full, StreamBody};
use hyper::body::{Frame, Incoming};
use hyper::server::conn::http1;
use hyper::service::Service;
use hyper_util::rt::TokioIo;
use hyper_util::server::graceful::GracefulShutdown;
use std::future::Future;
use std::net::SocketAddr;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tokio::net::{TcpListener, TcpStream};
use tokio_util::io::ReaderStream;
use ucdn_http::{Body, Handler, Request, Response};

/// Body type handed to hyper
pub type ResponseBody = UnsyncBoxBody<Bytes, std::io::Error>;

/// Default time open connections get to finish after shutdown starts
pub const DEFAULT_GRACE_PERIOD: Duration = Duration::from_secs(30);

/// HTTP server for a single handler
pub struct HttpServer {
	handler: Arc<dyn Handler>,
	grace_period: Duration,
}

impl HttpServer {
	/// Create a new server with the given handler
	///
	/// # Examples
	///
	/// ```
	/// use std::sync::Arc;
	/// use ucdn_server::{HttpServer, UcdnConfig, UcdnHandler};
	///
	/// let handler = UcdnHandler::new(UcdnConfig::new("public"));
	/// let server = HttpServer::new(Arc::new(handler));
	/// ```
	pub fn new(handler: Arc<dyn Handler>) -> Self {
		Self {
			handler,
			grace_period: DEFAULT_GRACE_PERIOD,
		}
	}

	/// Sets how long open connections may run once shutdown starts
	pub fn with_grace_period(mut self, grace_period: Duration) -> Self {
		self.grace_period = grace_period;
		self
	}

	/// Binds `addr` and serves until Ctrl-C
	///
	/// # Errors
	///
	/// Returns an error if binding or accepting fails.
	pub async fn listen(self, addr: SocketAddr) -> std::io::Result<()> {
		let listener = TcpListener::bind(addr).await?;
		self.serve(listener, shutdown_signal()).await
	}

	/// Serves connections from `listener` until `shutdown` resolves, then
	/// waits up to the grace period for open connections to finish.
	///
	/// # Errors
	///
	/// Returns an error if accepting a connection fails.
	pub async fn serve(
		self,
		listener: TcpListener,
		shutdown: impl Future<Output = ()>,
	) -> std::io::Result<()> {
		log::info!("Server listening on http://{}", listener.local_addr()?);
		let graceful = GracefulShutdown::new();
		tokio::pin!(shutdown);

		loop {
			tokio::select! {
				result = listener.accept() => {
					let (stream, socket_addr) = result?;
					let conn = Self::connection(stream, socket_addr, self.handler.clone());
					let conn = graceful.watch(conn);
					tokio::task::spawn(async move {
						if let Err(err) = conn.await {
							log::error!("Error handling connection from {}: {:?}", socket_addr, err);
						}
					});
				}
				_ = &mut shutdown => {
					log::info!("Shutdown signal received, stopping server...");
					break;
				}
			}
		}

		tokio::select! {
			_ = graceful.shutdown() => log::info!("All connections closed"),
			_ = tokio::time::sleep(self.grace_period) => {
				log::warn!("Grace period of {:?} elapsed with connections still open", self.grace_period);
			}
		}
		Ok(())
	}

	fn connection(
		stream: TcpStream,
		socket_addr: SocketAddr,
		handler: Arc<dyn Handler>,
	) -> http1::Connection<TokioIo<TcpStream>, RequestService> {
		let io = TokioIo::new(stream);
		let service = RequestService {
			handler,
			remote_addr: socket_addr,
		};
		http1::Builder::new().serve_connection(io, service)
	}
}

/// Resolves on Ctrl-C
pub async fn shutdown_signal() {
	if let Err(e) = tokio::signal::ctrl_c().await {
		log::error!("Failed to listen for Ctrl-C: {}", e);
		std::future::pending::<()>().await;
	}
}

/// Service implementation for hyper
pub struct RequestService {
	handler: Arc<dyn Handler>,
	remote_addr: SocketAddr,
}

impl Service<hyper::Request<Incoming>> for RequestService {
	type Response = hyper::Response<ResponseBody>;
	type Error = Box<dyn std::error::Error + Send + Sync>;
	type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send + 'static>>;

	fn call(&self, req: hyper::Request<Incoming>) -> Self::Future {
		let handler = self.handler.clone();
		let remote_addr = self.remote_addr;

		Box::pin(async move {
			let (parts, body) = req.into_parts();
			let body_bytes = body.collect().await?.to_bytes();

			let mut request = Request::new(
				parts.method,
				parts.uri,
				parts.version,
				parts.headers,
				body_bytes,
			);
			request.remote_addr = Some(remote_addr);

			let response = handler.handle(request).await.unwrap_or_else(Response::from);
			Ok(into_hyper(response)?)
		})
	}
}

/// Converts a handler response, streaming file bodies
pub fn into_hyper(response: Response) -> hyper::http::Result<hyper::Response<ResponseBody>> {
	let mut builder = hyper::Response::builder().status(response.status);
	if let Some(headers) = builder.headers_mut() {
		headers.extend(response.headers);
	}
	builder.body(into_body(response.body))
}

fn into_body(body: Body) -> ResponseBody {
	match body {
		Body::Empty => Empty::<Bytes>::new()
			.map_err(|never| match never {})
			.boxed_unsync(),
		Body::Full(bytes) => Full::new(bytes)
			.map_err(|never| match never {})
			.boxed_unsync(),
		Body::File { file, len } => {
			StreamBody::new(ReaderStream::new(file.take(len)).map_ok(Frame::data)).boxed_unsync()
		}
	}
}
