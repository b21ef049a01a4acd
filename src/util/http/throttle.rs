use std::time::Duration;

use tokio::{sync::Mutex, time::Instant};

/// 確保任兩次對外請求之間至少間隔 `min_interval`，避免被交易所封鎖。
///
/// 同一個實例以 `Arc` 分享給所有需要協調的呼叫端；同時呼叫 [`RateLimiter::acquire`]
/// 時會依序排隊(tokio 的 `Mutex` 是公平的)，每一個都等到距離上一次取得滿
/// `min_interval` 才放行。
#[derive(Debug)]
pub struct RateLimiter {
    min_interval: Duration,
    last: Mutex<Option<Instant>>,
}

impl RateLimiter {
    pub fn new(min_interval: Duration) -> Self {
        RateLimiter {
            min_interval,
            last: Mutex::new(None),
        }
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// 等到可以送出下一個請求為止，並記錄這次的時間
    pub async fn acquire(&self) {
        let mut last = self.last.lock().await;

        if let Some(prev) = *last {
            let elapsed = prev.elapsed();
            if elapsed < self.min_interval {
                tokio::time::sleep(self.min_interval - elapsed).await;
            }
        }

        *last = Some(Instant::now());
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use futures::future::join_all;

    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_acquire_spacing() {
        let min_interval = Duration::from_millis(250);
        let limiter = Arc::new(RateLimiter::new(min_interval));
        let start = Instant::now();

        let tasks = (0..4).map(|_| {
            let limiter = Arc::clone(&limiter);
            tokio::spawn(async move {
                limiter.acquire().await;
                Instant::now()
            })
        });

        let mut stamps: Vec<Instant> = join_all(tasks)
            .await
            .into_iter()
            .map(|r| r.unwrap())
            .collect();
        stamps.sort();

        assert!(start.elapsed() >= min_interval * 3);
        for pair in stamps.windows(2) {
            assert!(pair[1] - pair[0] >= min_interval);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_acquire_does_not_wait() {
        let limiter = RateLimiter::new(Duration::from_secs(3));
        let start = Instant::now();
        limiter.acquire().await;
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_acquire_after_idle_does_not_wait() {
        let limiter = RateLimiter::new(Duration::from_secs(3));
        limiter.acquire().await;
        tokio::time::sleep(Duration::from_secs(5)).await;

        let start = Instant::now();
        limiter.acquire().await;
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_acquire_waits_only_the_remainder() {
        let limiter = RateLimiter::new(Duration::from_secs(3));
        limiter.acquire().await;
        tokio::time::sleep(Duration::from_secs(1)).await;

        let start = Instant::now();
        limiter.acquire().await;
        assert_eq!(start.elapsed(), Duration::from_secs(2));
    }
}
