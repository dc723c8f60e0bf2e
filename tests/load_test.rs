//! Load testing for the classifying proxy.

use std::time::{Duration, Instant};

use axum::http::StatusCode;

mod common;

use common::GPTBOT_UA;

#[tokio::test]
async fn test_load_performance() {
    let upstream = common::start_mock_backend().await;
    let (collector, mut events) = common::start_collector(StatusCode::OK).await;
    let (proxy, shutdown) = common::start_proxy(
        common::proxy_config(upstream, collector),
        common::filter_set(vec![common::openai_filter()]),
    )
    .await;

    // Half the traffic is crawler traffic, half ordinary browsing.
    let concurrency = 20;
    let requests_per_task = 25;
    let total_requests = concurrency * requests_per_task;

    let client = common::client();
    let start = Instant::now();

    let mut tasks = Vec::new();
    for task in 0..concurrency {
        let client = client.clone();
        let url = format!("http://{}/load/{}", proxy, task);
        let crawler = task % 2 == 0;
        tasks.push(tokio::spawn(async move {
            let mut latencies = Vec::new();
            for _ in 0..requests_per_task {
                let req_start = Instant::now();
                let mut request = client.get(&url);
                if crawler {
                    request = request
                        .header("user-agent", GPTBOT_UA)
                        .header("x-forwarded-for", "20.15.240.66");
                }
                if let Ok(res) = request.send().await {
                    if res.status().is_success() {
                        latencies.push(req_start.elapsed());
                    }
                }
            }
            latencies
        }));
    }

    let mut all_latencies = Vec::new();
    for task in tasks {
        all_latencies.extend(task.await.unwrap());
    }
    let elapsed = start.elapsed();

    assert_eq!(all_latencies.len(), total_requests, "every request should succeed");

    all_latencies.sort();
    let p50 = all_latencies[all_latencies.len() / 2];
    let p99 = all_latencies[all_latencies.len() * 99 / 100];
    println!(
        "{} requests in {:?} ({:.0} req/s), p50 {:?}, p99 {:?}",
        total_requests,
        elapsed,
        total_requests as f64 / elapsed.as_secs_f64(),
        p50,
        p99
    );

    // Every crawler request is reported once; browsing is not reported.
    let expected = (concurrency / 2) * requests_per_task;
    let mut received = 0;
    while common::next_event(&mut events, Duration::from_secs(5)).await.is_some() {
        received += 1;
        if received == expected {
            break;
        }
    }
    assert_eq!(received, expected);
    assert!(common::next_event(&mut events, Duration::from_millis(300)).await.is_none());

    shutdown.trigger();
}
