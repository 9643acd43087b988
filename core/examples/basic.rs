//! Basic breaker usage example

use leaky_breaker::{Breaker, CallError, State};
use std::thread;
use std::time::Duration;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "leaky_breaker=info".into()),
        )
        .init();

    println!("=== Breaker Basic Example ===\n");

    let breaker = Breaker::builder("payment_api")
        .errors_percentage(50.0)
        .minimum_number_of_requests(3)
        .number_of_seconds_to_store(2)
        .on_open(|name| println!("🔴 Circuit '{}' opened!", name))
        .on_close(|name| println!("🟢 Circuit '{}' closed!", name))
        .build()
        .expect("valid options");

    let changes = breaker.changes();
    thread::spawn(move || {
        for state in changes.iter() {
            println!("   (notified: {})", state);
        }
    });

    println!("Initial state: {}\n", breaker.state());

    println!("--- Successful calls ---");
    for i in 1..=2 {
        match breaker.call(move || Ok::<_, String>(format!("Payment {}", i))) {
            Ok(result) => println!("✓ {}", result),
            Err(e) => println!("✗ {}", e),
        }
    }

    println!("\n--- Triggering failures ---");
    for i in 1..=4 {
        match breaker.call(move || Err::<String, _>(format!("Payment failed {}", i))) {
            Ok(_) => println!("✓ Success"),
            Err(e) => println!("✗ {}", e),
        }
    }

    // outcomes are recorded in the background
    thread::sleep(Duration::from_millis(50));
    println!("State: {}\n", breaker.state());

    println!("--- Attempting call while open ---");
    match breaker.call(|| Ok::<_, String>("Should be rejected")) {
        Err(CallError::Open { circuit }) => println!("✗ '{}' rejected the call", circuit),
        other => println!("? {:?}", other),
    }

    println!("\n--- Waiting for the window to expire ---");
    thread::sleep(Duration::from_secs(3));

    match breaker.call(|| Ok::<_, String>("Payment successful")) {
        Ok(result) => println!("✓ {}", result),
        Err(e) => println!("✗ {}", e),
    }
    thread::sleep(Duration::from_millis(50));

    let health = breaker.health().expect("counter running");
    println!(
        "State: {} (failures={}, successes={}, error%={:.1})",
        breaker.state(),
        health.failures,
        health.successes,
        health.error_percentage
    );
    assert_eq!(breaker.state(), State::Closed);

    breaker.cancel();
}
