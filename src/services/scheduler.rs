use chrono::{DateTime, TimeDelta, TimeZone, Timelike};
use rand::Rng;

/// Минута часа, на которую ставятся слоты
pub const SLOT_MINUTE: u32 = 45;
/// Джиттер слота в минутах, включительно в обе стороны
pub const SLOT_JITTER_MINUTES: i64 = 2;

/// Расчёт целевого времени автоматических отправок: HH:45 ±2 мин.
///
/// Чистые функции от базового времени и источника случайности. Джиттер может
/// дать время раньше текущего, тогда таймер сработает на ближайшем опросе.
pub struct SlotScheduler;

impl SlotScheduler {
    /// Ближайший слот: :45 текущего часа, если минута < 45, иначе следующего
    pub fn next_slot<Tz: TimeZone>(base: &DateTime<Tz>) -> DateTime<Tz> {
        Self::next_slot_with(base, &mut rand::thread_rng())
    }

    pub fn next_slot_with<Tz: TimeZone, R: Rng + ?Sized>(base: &DateTime<Tz>, rng: &mut R) -> DateTime<Tz> {
        let slot = if base.minute() < SLOT_MINUTE {
            at_slot_minute(base.clone())
        } else {
            at_slot_minute(base.clone() + TimeDelta::hours(1))
        };
        slot + jitter(rng)
    }

    /// Слот ровно через час после номинала предыдущего: дрейф срабатывания не накапливается
    pub fn next_slot_after<Tz: TimeZone>(previous_target: &DateTime<Tz>) -> DateTime<Tz> {
        Self::next_slot_after_with(previous_target, &mut rand::thread_rng())
    }

    pub fn next_slot_after_with<Tz: TimeZone, R: Rng + ?Sized>(
        previous_target: &DateTime<Tz>,
        rng: &mut R,
    ) -> DateTime<Tz> {
        at_slot_minute(previous_target.clone() + TimeDelta::hours(1)) + jitter(rng)
    }
}

/// Тот же час, минута 45, секунды и доли обнулены. Сдвиг считается длительностью,
/// поэтому переходы на летнее время не дают несуществующего локального времени.
fn at_slot_minute<Tz: TimeZone>(time: DateTime<Tz>) -> DateTime<Tz> {
    let minute_shift = i64::from(time.minute()) - i64::from(SLOT_MINUTE);
    let shift = TimeDelta::minutes(minute_shift)
        + TimeDelta::seconds(i64::from(time.second()))
        + TimeDelta::nanoseconds(i64::from(time.nanosecond()));
    time - shift
}

fn jitter<R: Rng + ?Sized>(rng: &mut R) -> TimeDelta {
    TimeDelta::minutes(rng.gen_range(-SLOT_JITTER_MINUTES..=SLOT_JITTER_MINUTES))
}
