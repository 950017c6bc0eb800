//! Concurrency stress tests for the decision engine
//!
//! These tests validate that a shared authenticator stays consistent when:
//! - Many tasks decide on overlapping token sets at once
//! - A tiny cache churns through constant evictions
//! - The cache is cleared while decisions are in flight
//!
//! Every decision must match what a fresh, uncached validation returns.

use bearer_auth::{AuthConfig, BearerAuthenticator, FailureKind};
use bearer_auth_test_utils::*;
use std::sync::Arc;

const TASKS: usize = 8;
const ROUNDS: usize = 200;

/// Header plus the rejection it must produce (`None` for acceptance)
fn token_mix() -> Vec<(String, Option<FailureKind>, &'static str)> {
    let builder = TestTokenBuilder::at(FIXED_NOW);
    let forged = builder
        .sign_hmac(bearer_auth::Algorithm::HS256, OTHER_HMAC_SECRET)
        .unwrap();

    vec![
        (
            bearer_header(&builder.clone().for_subject(TEST_SUBJECT_ALICE).sign_hs256()),
            None,
            TEST_SUBJECT_ALICE,
        ),
        (
            bearer_header(&builder.clone().for_subject(TEST_SUBJECT_BOB).sign(bearer_auth::Algorithm::HS384)),
            None,
            TEST_SUBJECT_BOB,
        ),
        (
            bearer_header(&builder.clone().for_subject(TEST_SUBJECT).sign_rs256()),
            Some(FailureKind::InvalidSignature),
            TEST_SUBJECT,
        ),
        (
            bearer_header(&builder.clone().expires_in(-3600).sign_hs256()),
            Some(FailureKind::TokenExpired),
            TEST_SUBJECT,
        ),
        (bearer_header(&forged), Some(FailureKind::InvalidSignature), TEST_SUBJECT),
        (
            bearer_header(&builder.clone().for_subject(TEST_SUBJECT_UNKNOWN).sign_hs256()),
            None,
            TEST_SUBJECT_UNKNOWN,
        ),
    ]
}

fn small_cache_authenticator(cache_size: usize) -> Arc<BearerAuthenticator> {
    Arc::new(
        BearerAuthenticator::builder(AuthConfig {
            token_cache_size: cache_size,
            ..hmac_config()
        })
        .clock(ManualClock::new(FIXED_NOW))
        .build()
        .unwrap(),
    )
}

async fn hammer(auth: Arc<BearerAuthenticator>, offset: usize) -> Result<usize, anyhow::Error> {
    let mix = token_mix();
    let mut checked = 0;
    for (round, (header, expected, subject)) in mix.iter().cycle().skip(offset).take(ROUNDS).enumerate() {
        let decision = auth.authenticate(Some(header));
        match expected {
            None => {
                decision.assert_subject(subject);
            }
            Some(kind) => {
                decision.assert_rejected_with(*kind);
            }
        }
        checked += 1;
        if round % 16 == 0 {
            tokio::task::yield_now().await;
        }
    }
    Ok(checked)
}

/// Many tasks sharing one authenticator with a cache smaller than the
/// working set
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_decisions_with_cache_churn() -> Result<(), anyhow::Error> {
    let auth = small_cache_authenticator(2);

    let handles: Vec<_> = (0..TASKS)
        .map(|offset| tokio::spawn(hammer(Arc::clone(&auth), offset)))
        .collect();

    let mut total = 0;
    for handle in handles {
        total += handle.await??;
    }

    assert_eq!(total, TASKS * ROUNDS);
    assert!(auth.cache_len() <= 2, "Cache exceeded its capacity");

    let stats = auth.cache_stats();
    assert!(stats.capacity_evictions > 0, "Expected evictions with a 2-entry cache");
    Ok(())
}

/// Clearing the cache mid-flight never changes a decision
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_clear_cache_during_decisions() -> Result<(), anyhow::Error> {
    let auth = small_cache_authenticator(64);

    let clearer = {
        let auth = Arc::clone(&auth);
        tokio::spawn(async move {
            for _ in 0..50 {
                auth.clear_cache();
                tokio::task::yield_now().await;
            }
        })
    };

    let handles: Vec<_> = (0..TASKS)
        .map(|offset| tokio::spawn(hammer(Arc::clone(&auth), offset)))
        .collect();

    for handle in handles {
        assert_eq!(handle.await??, ROUNDS);
    }
    clearer.await?;

    assert!(auth.cache_len() <= 3, "Only the three valid tokens are cacheable");
    Ok(())
}

/// Cached and uncached authenticators agree on every token
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_cached_and_uncached_agree() -> Result<(), anyhow::Error> {
    let cached = small_cache_authenticator(1000);
    let uncached = small_cache_authenticator(0);

    let handles: Vec<_> = (0..TASKS)
        .map(|_| {
            let cached = Arc::clone(&cached);
            let uncached = Arc::clone(&uncached);
            tokio::spawn(async move {
                for (header, _, _) in token_mix() {
                    for _ in 0..10 {
                        assert_eq!(
                            cached.authenticate(Some(&header)),
                            uncached.authenticate(Some(&header))
                        );
                    }
                }
            })
        })
        .collect();

    for handle in handles {
        handle.await?;
    }

    assert_eq!(uncached.cache_len(), 0);
    assert_eq!(cached.cache_len(), 3);
    Ok(())
}
