//! Response Parsing Benchmarks
//!
//! Measures the cost of turning collected bytes into status, headers and body:
//! - Status line recognition (HTTP and non-HTTP)
//! - Header block parsing with and without duplicates
//! - Full-response body extraction at increasing sizes
//!
//! Run with: cargo bench --bench parser_performance

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rawprobe::probe::parser::{parse_response, parse_status_line};
use std::time::Duration;

fn response_with_body(lines: usize) -> Vec<u8> {
    let mut raw = b"HTTP/1.1 200 OK\r\nContent-Type: text/html\r\nServer: bench\r\n\r\n".to_vec();
    for i in 0..lines {
        raw.extend_from_slice(format!("<p>line {}</p>\r\n", i).as_bytes());
        if i % 10 == 0 {
            raw.extend_from_slice(b"\r\n");
        }
    }
    raw
}

fn bench_status_line(c: &mut Criterion) {
    let mut group = c.benchmark_group("status_line");

    group.bench_function("http_ok", |b| {
        b.iter(|| parse_status_line(black_box("HTTP/1.1 200 OK")));
    });

    group.bench_function("http_long_reason", |b| {
        b.iter(|| parse_status_line(black_box("HTTP/1.0 503 Service Temporarily Unavailable")));
    });

    group.bench_function("not_http", |b| {
        b.iter(|| parse_status_line(black_box("SSH-2.0-OpenSSH_9.6")));
    });

    group.finish();
}

fn bench_headers(c: &mut Criterion) {
    let mut group = c.benchmark_group("headers");

    let typical = b"HTTP/1.1 301 Moved Permanently\r\n\
        Location: https://www.example.com/\r\n\
        Content-Type: text/html; charset=UTF-8\r\n\
        Date: Wed, 01 May 2024 12:00:00 GMT\r\n\
        Cache-Control: public, max-age=2592000\r\n\
        Server: gws\r\n\
        Content-Length: 220\r\n\r\n";
    group.bench_function("typical", |b| {
        b.iter(|| parse_response(black_box(typical), false));
    });

    let mut duplicated = b"HTTP/1.1 200 OK\r\n".to_vec();
    for i in 0..50 {
        duplicated.extend_from_slice(format!("Set-Cookie: session{}=abc\r\n", i).as_bytes());
        duplicated.extend_from_slice(format!("X-Header-{}: {}\r\n", i, i).as_bytes());
    }
    duplicated.extend_from_slice(b"\r\n");
    group.bench_function("duplicates", |b| {
        b.iter(|| parse_response(black_box(&duplicated), false));
    });

    group.finish();
}

fn bench_full_response(c: &mut Criterion) {
    let mut group = c.benchmark_group("full_response");

    for lines in [10usize, 100, 1000] {
        let raw = response_with_body(lines);
        group.throughput(Throughput::Bytes(raw.len() as u64));

        group.bench_with_input(BenchmarkId::new("with_body", lines), &raw, |b, raw| {
            b.iter(|| parse_response(black_box(raw), true));
        });

        group.bench_with_input(BenchmarkId::new("headers_only", lines), &raw, |b, raw| {
            b.iter(|| parse_response(black_box(raw), false));
        });
    }

    group.finish();
}

criterion_group! {
    name = parsing;
    config = Criterion::default()
        .measurement_time(Duration::from_secs(5))
        .sample_size(200);
    targets =
        bench_status_line,
        bench_headers,
        bench_full_response
}

criterion_main!(parsing);
