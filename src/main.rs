//! ucdn command line
//!
//! ```bash
//! ucdn --source ./public --port 8080
//! ucdn --config ucdn.toml --header "Cache-Control: public, max-age=300" -v
//! ```

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use ucdn::server::config::parse_header_line;
use ucdn::{HttpServer, UcdnConfig, UcdnHandler};

#[derive(Parser)]
#[command(name = "ucdn")]
#[command(about = "Serve static assets with on-demand compressed variants", long_about = None)]
#[command(version)]
struct Cli {
	/// Source directory (defaults to the current directory)
	#[arg(short, long, value_name = "DIR")]
	source: Option<PathBuf>,

	/// Directory for built variants (defaults to <tmp>/ucdn)
	#[arg(short, long, value_name = "DIR")]
	dest: Option<PathBuf>,

	/// Address to bind
	#[arg(long, default_value = "127.0.0.1")]
	host: IpAddr,

	/// Port to listen on
	#[arg(short, long, default_value_t = 8080)]
	port: u16,

	/// Cache timeout in milliseconds
	#[arg(long, value_name = "MS")]
	cache_timeout: Option<u64>,

	/// Extra response header, as "Name: value" (can be repeated)
	#[arg(long = "header", value_name = "HEADER")]
	headers: Vec<String>,

	/// TOML configuration file; flags override its values
	#[arg(short, long, value_name = "FILE")]
	config: Option<PathBuf>,

	/// Verbosity level (can be repeated)
	#[arg(short, long, action = clap::ArgAction::Count)]
	verbosity: u8,
}

impl Cli {
	fn into_config(self) -> anyhow::Result<UcdnConfig> {
		let mut config = match &self.config {
			Some(path) => UcdnConfig::from_file(path)
				.with_context(|| format!("loading {}", path.display()))?,
			None => UcdnConfig::default(),
		};

		if let Some(source) = self.source {
			config.source = source;
		}
		if let Some(dest) = self.dest {
			config = config.with_dest(dest);
		}
		if let Some(ms) = self.cache_timeout {
			config = config.with_cache_timeout(Duration::from_millis(ms));
		}
		for line in &self.headers {
			let (name, value) = parse_header_line(line)?;
			config = config.with_header(name, value);
		}

		config.validate()?;
		Ok(config)
	}
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
	let cli = Cli::parse();

	let level = match cli.verbosity {
		0 => "info",
		1 => "debug",
		_ => "trace",
	};
	env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

	let addr = SocketAddr::new(cli.host, cli.port);
	let config = cli.into_config()?;
	let cache_timeout = config.cache_timeout;
	let handler = UcdnHandler::new(config);
	log::info!(
		"Serving {} (variants in {})",
		handler.source_root().display(),
		handler.dest_root().display()
	);

	let store = handler.store().clone();
	tokio::spawn(async move {
		let mut interval = tokio::time::interval(cache_timeout.max(Duration::from_secs(1)) * 4);
		loop {
			interval.tick().await;
			store.cleanup_expired().await;
			let stats = store.statistics().await;
			log::debug!(
				"Metadata hit rate {:.2} ({} records in memory, {} builds)",
				stats.hit_rate(),
				stats.entry_count,
				stats.builds
			);
		}
	});

	HttpServer::new(Arc::new(handler)).listen(addr).await?;
	Ok(())
}
