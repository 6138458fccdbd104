use parking_lot::Mutex;
use std::time::{Duration, Instant};

/// Минимальный интервал между допущенными попытками отправки, из любого источника
pub const ANTIFLOOD_COOLDOWN: Duration = Duration::from_secs(15 * 60);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Admitted,
    Rejected { remaining_secs: u64 },
}

/// Глобальный антифлуд. Отметка ставится в момент допуска, а не успеха:
/// неудачная отправка тоже занимает окно.
pub struct AntifloodGuard {
    cooldown: Duration,
    last_attempt: Mutex<Option<Instant>>,
}

impl Default for AntifloodGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl AntifloodGuard {
    pub fn new() -> Self {
        Self::with_cooldown(ANTIFLOOD_COOLDOWN)
    }

    pub fn with_cooldown(cooldown: Duration) -> Self {
        Self {
            cooldown,
            last_attempt: Mutex::new(None),
        }
    }

    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }

    /// Проверка и отметка в одной критической секции
    pub fn try_admit(&self, now: Instant) -> Admission {
        let mut last_attempt = self.last_attempt.lock();

        if let Some(previous) = *last_attempt {
            let elapsed = now.saturating_duration_since(previous);
            if elapsed < self.cooldown {
                return Admission::Rejected {
                    remaining_secs: (self.cooldown - elapsed).as_secs(),
                };
            }
        }

        *last_attempt = Some(now);
        Admission::Admitted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Barrier};

    #[test]
    fn first_attempt_admitted() {
        let guard = AntifloodGuard::new();
        assert_eq!(guard.try_admit(Instant::now()), Admission::Admitted);
    }

    #[test]
    fn rejects_inside_cooldown_and_admits_at_boundary() {
        let guard = AntifloodGuard::new();
        let t0 = Instant::now();
        assert_eq!(guard.try_admit(t0), Admission::Admitted);

        assert_eq!(
            guard.try_admit(t0 + Duration::from_secs(600)),
            Admission::Rejected { remaining_secs: 300 }
        );
        assert_eq!(guard.try_admit(t0 + Duration::from_secs(900)), Admission::Admitted);
    }

    #[test]
    fn rejected_attempt_does_not_restamp() {
        let guard = AntifloodGuard::new();
        let t0 = Instant::now();
        guard.try_admit(t0);
        guard.try_admit(t0 + Duration::from_secs(899));
        assert_eq!(guard.try_admit(t0 + Duration::from_secs(900)), Admission::Admitted);
    }

    #[test]
    fn concurrent_attempts_admit_exactly_one() {
        let guard = Arc::new(AntifloodGuard::new());
        let barrier = Arc::new(Barrier::new(8));
        let admitted = Arc::new(AtomicUsize::new(0));
        let now = Instant::now();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let guard = guard.clone();
                let barrier = barrier.clone();
                let admitted = admitted.clone();
                std::thread::spawn(move || {
                    barrier.wait();
                    if guard.try_admit(now) == Admission::Admitted {
                        admitted.fetch_add(1, Ordering::SeqCst);
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(admitted.load(Ordering::SeqCst), 1);
    }
}
