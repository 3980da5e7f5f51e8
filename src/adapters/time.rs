//! Time sources: monotonic uptime for the UI loop, wall time for the clock
//! screen.

use crate::ui::screens::WallTime;

/// Wall time earlier than this means SNTP has not synchronised yet
/// (2020-01-01T00:00:00Z).
const EPOCH_SANITY_FLOOR: i64 = 1_577_836_800;

// ---------------------------------------------------------------------------
// Device implementation
// ---------------------------------------------------------------------------

#[cfg(feature = "espidf")]
mod device {
    use super::EPOCH_SANITY_FLOOR;
    use crate::ui::screens::WallTime;

    pub struct SystemClock;

    impl SystemClock {
        pub fn new() -> Self {
            Self
        }

        /// Microsecond timer since boot, scaled to milliseconds.
        pub fn uptime_ms(&self) -> i64 {
            unsafe { esp_idf_svc::sys::esp_timer_get_time() / 1000 }
        }

        /// Local wall time, or `None` until SNTP has set the clock.
        pub fn wall_time(&self) -> Option<WallTime> {
            let mut now: esp_idf_svc::sys::time_t = 0;
            unsafe {
                esp_idf_svc::sys::time(&mut now);
            }
            if i64::from(now) < EPOCH_SANITY_FLOOR {
                return None;
            }

            let mut tm: esp_idf_svc::sys::tm = unsafe { core::mem::zeroed() };
            unsafe {
                esp_idf_svc::sys::localtime_r(&now, &mut tm);
            }
            Some(WallTime {
                hour: tm.tm_hour as u8,
                minute: tm.tm_min as u8,
                second: tm.tm_sec as u8,
            })
        }
    }
}

#[cfg(feature = "espidf")]
pub use device::SystemClock;

// ---------------------------------------------------------------------------
// Host simulation
// ---------------------------------------------------------------------------

#[cfg(not(feature = "espidf"))]
mod sim {
    use std::time::{Instant, SystemTime, UNIX_EPOCH};

    use super::EPOCH_SANITY_FLOOR;
    use crate::ui::screens::WallTime;

    pub struct SystemClock {
        start: Instant,
    }

    impl SystemClock {
        pub fn new() -> Self {
            Self {
                start: Instant::now(),
            }
        }

        pub fn uptime_ms(&self) -> i64 {
            self.start.elapsed().as_millis() as i64
        }

        /// Host clocks are always set; shown as UTC.
        pub fn wall_time(&self) -> Option<WallTime> {
            let secs = SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .ok()?
                .as_secs() as i64;
            if secs < EPOCH_SANITY_FLOOR {
                return None;
            }
            let day = secs.rem_euclid(86_400);
            Some(WallTime {
                hour: (day / 3_600) as u8,
                minute: (day % 3_600 / 60) as u8,
                second: (day % 60) as u8,
            })
        }
    }
}

#[cfg(not(feature = "espidf"))]
pub use sim::SystemClock;
