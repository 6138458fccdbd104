use crate::debug_if_enabled;
use crate::services::scheduler::SlotScheduler;
use chrono::{DateTime, Local, TimeDelta};
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, info, warn};

/// Интервал опроса таймера
const POLL_INTERVAL: Duration = Duration::from_millis(200);
/// Пауза, если гард срабатывания занят
const GUARD_BACKOFF: Duration = Duration::from_millis(100);

/// Получатель срабатываний таймера. Не должен блокировать: отправка
/// запускается отдельной задачей.
pub trait FireHandler: Send + Sync {
    fn fire(&self, target: DateTime<Local>);
}

#[derive(Debug, Default)]
struct ScheduleState {
    active: bool,
    next_target: Option<DateTime<Local>>,
    last_fired_target: Option<DateTime<Local>>,
    /// Номер текущего цикла; старый цикл после stop/start завершается сам
    generation: u64,
}

/// Результат одного опроса
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Poll {
    Stopped,
    Idle,
    /// Гард занят другим срабатыванием
    Busy,
    Fired {
        target: DateTime<Local>,
        next: DateTime<Local>,
    },
}

#[derive(Debug, Clone, Copy)]
pub struct TimerStatus {
    pub active: bool,
    pub next_target: DateTime<Local>,
    pub remaining: TimeDelta,
}

impl fmt::Display for TimerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let total = self.remaining.num_seconds().max(0);
        let status = if self.active {
            "🟢 Таймер активен"
        } else {
            "⚪ Таймер выключен"
        };
        write!(
            f,
            "{} | следующий доклад: {} | осталось: {:02}:{:02}:{:02}",
            status,
            self.next_target.format("%H:%M:%S"),
            total / 3600,
            (total % 3600) / 60,
            total % 60
        )
    }
}

/// Единственный цикл таймера: одно срабатывание на каждый рассчитанный слот,
/// после срабатывания сразу переносится на следующий час.
pub struct TimerLoop {
    state: Mutex<ScheduleState>,
    fire_guard: Mutex<()>,
    handler: Arc<dyn FireHandler>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl TimerLoop {
    pub fn new(handler: Arc<dyn FireHandler>) -> Self {
        Self {
            state: Mutex::new(ScheduleState::default()),
            fire_guard: Mutex::new(()),
            handler,
            task: Mutex::new(None),
        }
    }

    /// Запустить цикл. Возвращает false, если он уже работает.
    pub fn start(self: &Arc<Self>) -> bool {
        let mut task = self.task.lock();
        let running = task.as_ref().is_some_and(|handle| !handle.is_finished());

        let generation = {
            let mut state = self.state.lock();
            if state.active && running {
                warn!("⚠️ Таймер уже работает.");
                return false;
            }
            Self::arm(&mut state, Local::now());
            state.generation += 1;
            state.generation
        };

        let timer = Arc::clone(self);
        *task = Some(tokio::spawn(async move { timer.run(generation).await }));
        info!("▶️ Запуск таймера…");
        true
    }

    /// Остановить цикл. Уже запущенные отправки доработают до конца.
    pub fn stop(&self) {
        self.state.lock().active = false;
        info!("🛑 Таймер остановлен.");
    }

    pub fn is_active(&self) -> bool {
        self.state.lock().active
    }

    pub fn next_target(&self) -> Option<DateTime<Local>> {
        self.state.lock().next_target
    }

    /// Включить расписание без запуска цикла. Ожидающий слот сохраняется.
    fn arm(state: &mut ScheduleState, now: DateTime<Local>) {
        state.active = true;
        if state.next_target.is_none() {
            state.next_target = Some(SlotScheduler::next_slot(&now));
        }
    }

    async fn run(self: Arc<Self>, generation: u64) {
        info!("✅ Таймер запущен.");
        if let Some(target) = self.next_target() {
            info!("📅 Следующий доклад запланирован на {}", target.format("%H:%M:%S"));
        }

        loop {
            if !self.is_current(generation) {
                break;
            }

            let pause = match self.poll_once(Local::now()) {
                Poll::Busy => GUARD_BACKOFF,
                Poll::Fired { target, next } => {
                    debug_if_enabled!("Слот {} передан на отправку, следующий {}", target, next);
                    POLL_INTERVAL
                }
                Poll::Idle | Poll::Stopped => POLL_INTERVAL,
            };
            sleep(pause).await;
        }

        debug!("Цикл таймера #{} завершён", generation);
    }

    fn is_current(&self, generation: u64) -> bool {
        let state = self.state.lock();
        state.active && state.generation == generation
    }

    /// Один опрос: если слот наступил и ещё не срабатывал, взять гард,
    /// отметить слот, передать срабатывание и перенести слот на следующий час.
    pub fn poll_once(&self, now: DateTime<Local>) -> Poll {
        let due = {
            let state = self.state.lock();
            if !state.active {
                return Poll::Stopped;
            }
            match state.next_target {
                Some(target) if now >= target && state.last_fired_target != Some(target) => target,
                _ => return Poll::Idle,
            }
        };

        let Some(_guard) = self.fire_guard.try_lock() else {
            return Poll::Busy;
        };

        {
            let mut state = self.state.lock();
            // пока ждали гард, слот мог уже сработать
            if state.next_target != Some(due) || state.last_fired_target == Some(due) {
                return Poll::Idle;
            }
            state.last_fired_target = Some(due);
        }

        info!("⏰ ТАЙМЕР: {} — отправляю автоматически.", due.format("%H:%M:%S"));
        self.handler.fire(due);

        let next = SlotScheduler::next_slot_after(&due);
        self.state.lock().next_target = Some(next);
        info!("📅 Следующий доклад запланирован на {}", next.format("%H:%M:%S"));

        Poll::Fired { target: due, next }
    }

    /// Статус для показа. Без сохранённого слота показывается ближайший
    /// расчётный; состояние при этом не меняется.
    pub fn status(&self, now: DateTime<Local>) -> TimerStatus {
        let (active, stored) = {
            let state = self.state.lock();
            (state.active, state.next_target)
        };

        let mut target = stored.unwrap_or_else(|| SlotScheduler::next_slot(&now));
        if target < now {
            target = SlotScheduler::next_slot(&(now + TimeDelta::seconds(1)));
        }

        TimerStatus {
            active,
            next_target: target,
            remaining: target - now,
        }
    }

    #[cfg(test)]
    pub(crate) fn force_target(&self, target: DateTime<Local>) {
        let mut state = self.state.lock();
        state.active = true;
        state.next_target = Some(target);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Barrier;

    #[derive(Default)]
    struct CountingHandler {
        fired: Mutex<Vec<DateTime<Local>>>,
        calls: AtomicUsize,
    }

    impl FireHandler for CountingHandler {
        fn fire(&self, target: DateTime<Local>) {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.fired.lock().push(target);
            // держим гард подольше, чтобы конкуренты успели в него упереться
            std::thread::sleep(Duration::from_millis(20));
        }
    }

    fn timer() -> (Arc<TimerLoop>, Arc<CountingHandler>) {
        let handler = Arc::new(CountingHandler::default());
        (Arc::new(TimerLoop::new(handler.clone())), handler)
    }

    #[test]
    fn stopped_timer_never_fires() {
        let (timer, handler) = timer();
        assert_eq!(timer.poll_once(Local::now()), Poll::Stopped);
        assert_eq!(handler.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn fires_once_per_target_and_reschedules() {
        let (timer, handler) = timer();
        let now = Local::now();
        let target = now - TimeDelta::seconds(1);
        timer.force_target(target);

        let next = match timer.poll_once(now) {
            Poll::Fired { target: fired, next } => {
                assert_eq!(fired, target);
                next
            }
            other => panic!("ожидалось срабатывание, получено {:?}", other),
        };

        // следующий час, :45 ±2
        assert!(next > now);
        assert!((43..=47).contains(&next.minute()), "{}", next);
        assert_eq!(next.second(), 0);
        assert!(next - target <= TimeDelta::minutes(108));
        assert_eq!(timer.next_target(), Some(next));

        assert_eq!(timer.poll_once(now), Poll::Idle);
        assert_eq!(handler.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn stale_target_catches_up_one_slot_per_poll() {
        let (timer, handler) = timer();
        let now = Local::now();
        timer.force_target(now - TimeDelta::hours(5));

        let mut fired = Vec::new();
        while let Poll::Fired { target, .. } = timer.poll_once(now) {
            fired.push(target);
            assert!(fired.len() <= 6, "{:?}", fired);
        }

        // исходный слот, четыре пропущенных часа и, возможно, слот текущего часа
        assert!((5..=6).contains(&fired.len()), "{:?}", fired);
        assert!(fired.windows(2).all(|pair| pair[0] < pair[1]));
        assert_eq!(handler.calls.load(Ordering::SeqCst), fired.len());
        assert!(timer.next_target().is_some_and(|next| next > now));
        assert_eq!(timer.poll_once(now), Poll::Idle);
    }

    #[test]
    fn future_target_is_idle() {
        let (timer, handler) = timer();
        timer.force_target(Local::now() + TimeDelta::minutes(10));
        assert_eq!(timer.poll_once(Local::now()), Poll::Idle);
        assert_eq!(handler.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn concurrent_polls_fire_exactly_once() {
        let (timer, handler) = timer();
        let target = Local::now() - TimeDelta::seconds(1);
        timer.force_target(target);

        let threads = 16;
        let barrier = Arc::new(Barrier::new(threads));
        let now = Local::now();

        let handles: Vec<_> = (0..threads)
            .map(|_| {
                let timer = timer.clone();
                let barrier = barrier.clone();
                std::thread::spawn(move || {
                    barrier.wait();
                    timer.poll_once(now)
                })
            })
            .collect();

        let results: Vec<Poll> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        let fired = results
            .iter()
            .filter(|r| matches!(r, Poll::Fired { .. }))
            .count();

        assert_eq!(fired, 1);
        assert_eq!(handler.calls.load(Ordering::SeqCst), 1);
        assert_eq!(*handler.fired.lock(), vec![target]);
    }

    #[test]
    fn stop_keeps_pending_target() {
        let (timer, _handler) = timer();
        let target = Local::now() + TimeDelta::minutes(30);
        timer.force_target(target);

        timer.stop();
        assert!(!timer.is_active());
        assert_eq!(timer.next_target(), Some(target));

        let mut state = timer.state.lock();
        TimerLoop::arm(&mut state, Local::now());
        assert!(state.active);
        assert_eq!(state.next_target, Some(target));
    }

    #[test]
    fn status_without_target_shows_computed_slot() {
        let (timer, _handler) = timer();
        let now = Local::now();
        let status = timer.status(now);

        assert!(!status.active);
        assert!(status.next_target >= now - TimeDelta::minutes(2));
        assert!(status.remaining <= TimeDelta::minutes(63));
        assert_eq!(timer.next_target(), None);
    }

    #[test]
    fn status_with_past_target_shows_upcoming_slot() {
        let (timer, _handler) = timer();
        timer.force_target(Local::now() - TimeDelta::hours(3));

        let now = Local::now();
        let status = timer.status(now);
        assert!(status.active);
        assert!(status.next_target > now - TimeDelta::minutes(3));
        assert!(status.to_string().starts_with("🟢 Таймер активен"));
    }

    #[tokio::test]
    async fn start_twice_is_rejected_and_stop_ends_loop() {
        let (timer, _handler) = timer();
        assert!(timer.start());
        assert!(!timer.start());
        assert!(timer.next_target().is_some());

        timer.stop();
        tokio::time::sleep(POLL_INTERVAL * 2).await;
        let finished = timer
            .task
            .lock()
            .as_ref()
            .map(|handle| handle.is_finished())
            .unwrap_or(false);
        assert!(finished);

        assert!(timer.start());
        timer.stop();
    }

    #[tokio::test]
    async fn running_loop_fires_due_target_once() {
        let (timer, handler) = timer();
        let target = Local::now() - TimeDelta::seconds(1);
        timer.force_target(target);
        assert!(timer.start());

        tokio::time::sleep(POLL_INTERVAL * 3).await;
        assert_eq!(handler.calls.load(Ordering::SeqCst), 1);
        assert_eq!(*handler.fired.lock(), vec![target]);
        assert!(timer.next_target().is_some_and(|next| next > Local::now()));
        assert!(timer.is_active());

        timer.stop();
    }

    #[tokio::test]
    async fn restart_within_one_poll_leaves_single_loop() {
        let (timer, handler) = timer();
        timer.force_target(Local::now() + TimeDelta::minutes(30));
        assert!(timer.start());

        // первый цикл уже спит внутри интервала опроса
        tokio::time::sleep(Duration::from_millis(50)).await;
        timer.stop();
        let old = timer.task.lock().take().expect("цикл запущен");
        assert!(timer.start());

        let target = Local::now() - TimeDelta::seconds(1);
        timer.force_target(target);
        tokio::time::sleep(POLL_INTERVAL * 2).await;

        assert!(old.is_finished());
        let current_running = timer
            .task
            .lock()
            .as_ref()
            .is_some_and(|handle| !handle.is_finished());
        assert!(current_running);
        assert_eq!(handler.calls.load(Ordering::SeqCst), 1);
        assert_eq!(*handler.fired.lock(), vec![target]);

        timer.stop();
    }
}
