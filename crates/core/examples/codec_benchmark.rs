//! Lightweight eager/lazy codec benchmark harness for local baselines.
//!
//! Run from repository root:
//! `cargo run -p kqcode_core --example codec_benchmark --release`
//!
//! `KQCODE_BENCH_ITERS` overrides the iteration count (default 20000).

use std::hint::black_box;
use std::time::{Duration, Instant};

use kqcode_core::{Code, LazyCode, MapCode, StripOptions, locate_all, split, strip};

fn per_iter_us(elapsed: Duration, iterations: usize) -> f64 {
    elapsed.as_secs_f64() * 1_000_000.0 / iterations as f64
}

fn time<F: FnMut()>(iterations: usize, mut f: F) -> Duration {
    let start = Instant::now();
    for _ in 0..iterations {
        f();
    }
    start.elapsed()
}

fn run_token_benchmark(label: &str, token: &str, iterations: usize) -> Result<(), String> {
    let keys: Vec<String> = MapCode::parse(token)
        .map_err(|e| format!("sample '{label}' does not parse: {e}"))?
        .keys()
        .map(str::to_string)
        .collect();

    let eager_parse = time(iterations, || {
        black_box(MapCode::parse(black_box(token)).ok());
    });
    let lazy_parse = time(iterations, || {
        black_box(LazyCode::parse(black_box(token)).ok());
    });

    let eager = MapCode::parse(token).map_err(|e| e.to_string())?;
    let lazy = LazyCode::parse(token).map_err(|e| e.to_string())?;

    let eager_one = time(iterations, || {
        black_box(eager.get(&keys[0]));
    });
    let lazy_one = time(iterations, || {
        black_box(lazy.get(&keys[0]));
    });
    let eager_all = time(iterations, || {
        for key in &keys {
            black_box(eager.get(key));
        }
    });
    let lazy_all = time(iterations, || {
        for key in &keys {
            black_box(lazy.get(key));
        }
    });

    println!("Benchmark: {label}");
    println!("  token_bytes: {}, params: {}", token.len(), keys.len());
    println!(
        "  parse:        eager={:.3} us, lazy={:.3} us",
        per_iter_us(eager_parse, iterations),
        per_iter_us(lazy_parse, iterations)
    );
    println!(
        "  get (repeat): eager={:.3} us, lazy={:.3} us",
        per_iter_us(eager_one, iterations),
        per_iter_us(lazy_one, iterations)
    );
    println!(
        "  get (all):    eager={:.3} us, lazy={:.3} us",
        per_iter_us(eager_all, iterations),
        per_iter_us(lazy_all, iterations)
    );
    Ok(())
}

fn run_body_benchmark(body: &str, iterations: usize) {
    let opts = StripOptions::default().with_join(" ");
    let split_elapsed = time(iterations, || {
        black_box(split(black_box(body)));
    });
    let locate_elapsed = time(iterations, || {
        black_box(locate_all(black_box(body), Some("at")));
    });
    let strip_elapsed = time(iterations, || {
        black_box(strip(black_box(body), None, &opts));
    });

    println!("Benchmark: body scan");
    println!("  body_bytes: {}", body.len());
    println!("  split:      {:.3} us", per_iter_us(split_elapsed, iterations));
    println!("  locate_all: {:.3} us", per_iter_us(locate_elapsed, iterations));
    println!("  strip:      {:.3} us", per_iter_us(strip_elapsed, iterations));
}

fn main() -> Result<(), String> {
    let iterations = std::env::var("KQCODE_BENCH_ITERS")
        .ok()
        .and_then(|v| v.parse::<usize>().ok())
        .filter(|v| *v > 0)
        .unwrap_or(20_000);

    let samples = [
        ("mention", "[CQ:at,qq=123456789]".to_string()),
        (
            "custom_music",
            "[CQ:music,type=custom,url=https://e.com/s?id=1&amp;t=2,audio=https://e.com/a.mp3,title=Song&#44; live,content=desc,image=https://e.com/c.jpg]"
                .to_string(),
        ),
        (
            "wide",
            format!(
                "[CQ:wide{}]",
                (0..32).map(|i| format!(",key{i}=value{i}")).collect::<String>()
            ),
        ),
    ];
    for (label, token) in &samples {
        run_token_benchmark(label, token, iterations)?;
    }

    let body = "hello [CQ:at,qq=1] world [CQ:face,id=14] ".repeat(50);
    run_body_benchmark(&body, iterations / 10);
    Ok(())
}
