//! Smoke/stress client: opens many connections and pings the server from
//! each, then prints throughput and latency figures.

use clap::Parser;
use shared::codec::{FrameReader, FrameWriter};
use shared::{methods, Request, Response};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::TcpStream;
use tokio::time::{sleep, timeout};

#[derive(Parser, Debug)]
#[command(author, version, about = "Ping the card room server from many connections", long_about = None)]
struct Args {
    /// Server address to connect to
    #[arg(short = 's', long, default_value = "127.0.0.1:8080")]
    server: String,

    /// Number of concurrent connections
    #[arg(short = 'c', long, default_value = "10")]
    clients: usize,

    /// Delay between pings on one connection, in milliseconds
    #[arg(short = 'i', long, default_value = "100")]
    interval: u64,

    /// How long to run, in seconds
    #[arg(short = 'd', long, default_value = "10")]
    duration: u64,

    /// Only open and close the connections, without pinging
    #[arg(long)]
    only_conn: bool,
}

#[derive(Default)]
struct Stats {
    connected: AtomicU64,
    sent: AtomicU64,
    received: AtomicU64,
    errors: AtomicU64,
    total_latency_us: AtomicU64,
    max_latency_us: AtomicU64,
}

impl Stats {
    fn record_latency(&self, latency: Duration) {
        let micros = latency.as_micros().min(u64::MAX as u128) as u64;
        self.received.fetch_add(1, Ordering::Relaxed);
        self.total_latency_us.fetch_add(micros, Ordering::Relaxed);
        self.max_latency_us.fetch_max(micros, Ordering::Relaxed);
    }

    fn print_summary(&self, elapsed: Duration) {
        let sent = self.sent.load(Ordering::Relaxed);
        let received = self.received.load(Ordering::Relaxed);
        let mean_us = if received > 0 {
            self.total_latency_us.load(Ordering::Relaxed) / received
        } else {
            0
        };

        println!("Test finished after {:.1}s", elapsed.as_secs_f64());
        println!("  connections: {}", self.connected.load(Ordering::Relaxed));
        println!("  sent:        {}", sent);
        println!("  received:    {}", received);
        println!("  errors:      {}", self.errors.load(Ordering::Relaxed));
        println!("  mean rtt:    {:.2}ms", mean_us as f64 / 1000.0);
        println!(
            "  max rtt:     {:.2}ms",
            self.max_latency_us.load(Ordering::Relaxed) as f64 / 1000.0
        );
        if elapsed.as_secs_f64() > 0.0 {
            println!(
                "  throughput:  {:.0} req/s",
                received as f64 / elapsed.as_secs_f64()
            );
        }
    }
}

async fn run_client(
    server: String,
    interval: Duration,
    deadline: Instant,
    only_conn: bool,
    stats: Arc<Stats>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let stream = TcpStream::connect(&server).await?;
    stats.connected.fetch_add(1, Ordering::Relaxed);
    if only_conn {
        return Ok(());
    }

    let (read_half, write_half) = stream.into_split();
    let mut reader = FrameReader::new(read_half);
    let mut writer = FrameWriter::new(write_half);
    let ping = Request::new(methods::PING);

    while Instant::now() < deadline {
        let started = Instant::now();
        writer.write_frame(&ping).await?;
        stats.sent.fetch_add(1, Ordering::Relaxed);

        match timeout(Duration::from_secs(5), reader.read_frame::<Response>()).await {
            Ok(Ok(response)) if response.is_ok() => stats.record_latency(started.elapsed()),
            Ok(Ok(_)) | Err(_) => {
                stats.errors.fetch_add(1, Ordering::Relaxed);
            }
            Ok(Err(e)) => return Err(e.into()),
        }

        sleep(interval).await;
    }

    writer.shutdown().await?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    println!(
        "Starting {} client(s) against {} for {}s",
        args.clients, args.server, args.duration
    );

    let stats = Arc::new(Stats::default());
    let started = Instant::now();
    let deadline = started + Duration::from_secs(args.duration);
    let interval = Duration::from_millis(args.interval);
    let only_conn = args.only_conn;

    let mut handles = Vec::with_capacity(args.clients);
    for _ in 0..args.clients {
        let stats = Arc::clone(&stats);
        let server = args.server.clone();
        handles.push(tokio::spawn(async move {
            let result = run_client(server, interval, deadline, only_conn, Arc::clone(&stats)).await;
            if let Err(e) = result {
                eprintln!("Client error: {}", e);
                stats.errors.fetch_add(1, Ordering::Relaxed);
            }
        }));
    }

    for handle in handles {
        handle.await?;
    }

    stats.print_summary(started.elapsed());
    Ok(())
}
