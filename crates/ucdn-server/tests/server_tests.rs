//! HTTP server and configuration resolution

mod fixtures;

use fixtures::{CSS, Site, gunzip, site};
use rstest::rstest;
use serial_test::serial;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;
use ucdn_server::{HttpServer, UcdnConfig, UcdnHandler};

async fn raw_get(addr: std::net::SocketAddr, path: &str, extra: &str) -> Vec<u8> {
	let mut stream = TcpStream::connect(addr).await.unwrap();
	let request = format!(
		"GET {} HTTP/1.1\r\nHost: localhost\r\n{}Connection: close\r\n\r\n",
		path, extra
	);
	stream.write_all(request.as_bytes()).await.unwrap();
	let mut response = Vec::new();
	stream.read_to_end(&mut response).await.unwrap();
	response
}

fn split_response(raw: &[u8]) -> (String, Vec<u8>) {
	let at = raw
		.windows(4)
		.position(|w| w == b"\r\n\r\n")
		.expect("header terminator");
	(
		String::from_utf8_lossy(&raw[..at]).to_lowercase(),
		raw[at + 4..].to_vec(),
	)
}

#[rstest]
#[tokio::test]
async fn test_server_streams_variants(site: Site) {
	let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
	let addr = listener.local_addr().unwrap();
	let (stop, stopped) = oneshot::channel::<()>();
	let server = HttpServer::new(Arc::new(site.handler.clone()))
		.with_grace_period(Duration::from_secs(1));
	let running = tokio::spawn(server.serve(listener, async move {
		let _ = stopped.await;
	}));

	let raw = raw_get(addr, "/app.css", "Accept-Encoding: gzip\r\n").await;
	let (head, body) = split_response(&raw);
	assert!(head.starts_with("http/1.1 200"));
	assert!(head.contains("content-encoding: gzip"));
	assert_eq!(gunzip(&body), CSS.repeat(100).into_bytes());

	let raw = raw_get(addr, "/missing.css", "").await;
	let (head, body) = split_response(&raw);
	assert!(head.starts_with("http/1.1 404"));
	assert!(body.is_empty());

	stop.send(()).unwrap();
	running.await.unwrap().unwrap();
}

#[rstest]
#[serial(cwd)]
fn test_relative_source_resolves_against_cwd() {
	let dir = tempfile::TempDir::new().unwrap();
	std::fs::create_dir(dir.path().join("public")).unwrap();
	let previous = std::env::current_dir().unwrap();

	std::env::set_current_dir(dir.path()).unwrap();
	let handler = UcdnHandler::new(UcdnConfig::new("public").with_dest("built"));
	std::env::set_current_dir(previous).unwrap();

	let cwd = std::fs::canonicalize(dir.path()).unwrap();
	let source = std::fs::canonicalize(handler.source_root()).unwrap();
	assert_eq!(source, cwd.join("public"));
	assert!(handler.dest_root().is_absolute());
	assert!(handler.dest_root().ends_with(Path::new("built")));
}
