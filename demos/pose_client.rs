//! Stream head poses to the capture server as type-2 packets.
//!
//! Runs the bridge over the simulated runtime and sends one pose packet per
//! tick to `HEADPOSE_SERVER` (default 127.0.0.1:5000).
//!
//! Usage: cargo run --example pose_client
//! Env: HEADPOSE_SERVER, HEADPOSE_RATE_HZ (default 20), HEADPOSE_SAMPLES (default 200)

use headpose::packet;
use headpose::{SimulatedPerception, TrackingSession};
use std::io::Write;
use std::net::TcpStream;
use std::time::{Duration, Instant};

fn read_env_string(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}

fn read_env_u32(name: &str, default: u32) -> u32 {
    std::env::var(name)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

fn main() {
    env_logger::init();

    let server = read_env_string("HEADPOSE_SERVER", "127.0.0.1:5000");
    let rate_hz = read_env_u32("HEADPOSE_RATE_HZ", 20).max(1);
    let samples = read_env_u32("HEADPOSE_SAMPLES", 200);

    let session = TrackingSession::new(SimulatedPerception::default());
    if !session.initialize() {
        eprintln!("Failed to initialize head tracking");
        std::process::exit(1);
    }

    let mut stream = match TcpStream::connect(&server) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Failed to connect to {}: {}", server, e);
            session.shutdown();
            std::process::exit(1);
        }
    };
    println!("Connected to {}", server);

    let period = Duration::from_secs_f64(1.0 / rate_hz as f64);
    let start = Instant::now();
    let mut sent: u32 = 0;

    while sent < samples {
        let t_ns = start.elapsed().as_nanos() as u64;
        match session.try_query_pose_at(t_ns as i64) {
            Ok(pose) => {
                let bytes = packet::encode_pose(0, t_ns, &pose);
                if let Err(e) = stream.write_all(&bytes) {
                    eprintln!("Send failed: {}", e);
                    break;
                }
                sent += 1;
                if sent % 20 == 1 {
                    let p = pose.position;
                    let q = pose.orientation;
                    println!(
                        "t={:<12} pos=[{:+.3}, {:+.3}, {:+.3}] quat=[{:+.3}, {:+.3}, {:+.3}, {:+.3}]",
                        t_ns, p[0], p[1], p[2], q[0], q[1], q[2], q[3]
                    );
                }
            }
            Err(e) => eprintln!("No pose at t={}: {}", t_ns, e),
        }
        std::thread::sleep(period);
    }

    session.shutdown();
    println!("Sent {} pose packets in {:.1}s", sent, start.elapsed().as_secs_f64());
}
