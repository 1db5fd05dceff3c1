//! ESP32 time adapter.
//!
//! Monotonic time for the loop and wall-clock time for the clock face.
//!
//! - **`target_os = "espidf"`**: `esp_timer_get_time()` for uptime,
//!   `gettimeofday()` (set by SNTP) for wall time.
//! - **`not(target_os = "espidf")`**: `std::time::Instant` plus an
//!   optional simulated epoch for host tests.
//!
//! The GMT offset is applied here rather than through a TZ string, so the
//! calendar conversion below is plain integer arithmetic.

use core::fmt::Write;

use heapless::String;

/// Wall clock readings before this are treated as "not yet synced".
const EPOCH_2020: i64 = 1_577_836_800;

#[cfg_attr(not(target_os = "espidf"), allow(dead_code))]
const SNTP_SERVER: &str = "pool.ntp.org";

const WEEKDAYS: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];
const MONTHS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

// ---------------------------------------------------------------------------
// Calendar conversion
// ---------------------------------------------------------------------------

/// Broken-down local time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocalTime {
    pub year: i32,
    /// 1..=12
    pub month: u8,
    /// 1..=31
    pub day: u8,
    /// 0 = Sunday
    pub weekday: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
}

impl LocalTime {
    /// Convert Unix seconds plus a fixed offset into local calendar time.
    pub fn from_unix(unix_secs: i64, offset_secs: i32) -> Self {
        let local = unix_secs + i64::from(offset_secs);
        let days = local.div_euclid(86_400);
        let secs_of_day = local.rem_euclid(86_400);

        let (year, month, day) = civil_from_days(days);
        // 1970-01-01 was a Thursday.
        let weekday = (days + 4).rem_euclid(7) as u8;

        Self {
            year,
            month,
            day,
            weekday,
            hour: (secs_of_day / 3600) as u8,
            minute: (secs_of_day % 3600 / 60) as u8,
            second: (secs_of_day % 60) as u8,
        }
    }

    /// Hour as shown on the face: 0..=23, or 1..=12 in 12-hour mode.
    pub fn display_hour(&self, format_24h: bool) -> u8 {
        if format_24h {
            self.hour
        } else {
            match self.hour % 12 {
                0 => 12,
                h => h,
            }
        }
    }

    pub fn is_pm(&self) -> bool {
        self.hour >= 12
    }

    /// `HH:MM`, with an ` AM`/` PM` suffix in 12-hour mode.
    pub fn time_text(&self, format_24h: bool) -> String<8> {
        let mut s = String::new();
        let _ = write!(s, "{:02}:{:02}", self.display_hour(format_24h), self.minute);
        if !format_24h {
            let _ = s.push_str(if self.is_pm() { " PM" } else { " AM" });
        }
        s
    }

    /// e.g. `Fri Oct 17 2026`.
    pub fn date_text(&self) -> String<16> {
        let mut s = String::new();
        let _ = write!(
            s,
            "{} {} {:02} {}",
            WEEKDAYS[usize::from(self.weekday % 7)],
            MONTHS[usize::from((self.month.clamp(1, 12)) - 1)],
            self.day,
            self.year
        );
        s
    }
}

/// Days since 1970-01-01 to (year, month, day), proleptic Gregorian.
fn civil_from_days(days: i64) -> (i32, u8, u8) {
    let z = days + 719_468;
    let era = z.div_euclid(146_097);
    let doe = z.rem_euclid(146_097);
    let yoe = (doe - doe / 1460 + doe / 36_524 - doe / 146_096) / 365;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = (doy - (153 * mp + 2) / 5 + 1) as u8;
    let month = (if mp < 10 { mp + 3 } else { mp - 9 }) as u8;
    let year = yoe + era * 400 + i64::from(month <= 2);
    (year as i32, month, day)
}

// ---------------------------------------------------------------------------
// SystemClock
// ---------------------------------------------------------------------------

/// Time adapter for the ESP32.
pub struct SystemClock {
    offset_secs: i32,
    #[cfg(not(target_os = "espidf"))]
    start: std::time::Instant,
    #[cfg(not(target_os = "espidf"))]
    sim_epoch: Option<i64>,
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new(0)
    }
}

impl SystemClock {
    pub fn new(offset_secs: i32) -> Self {
        Self {
            offset_secs,
            #[cfg(not(target_os = "espidf"))]
            start: std::time::Instant::now(),
            #[cfg(not(target_os = "espidf"))]
            sim_epoch: None,
        }
    }

    /// Milliseconds since boot (monotonic).
    #[cfg(target_os = "espidf")]
    pub fn uptime_ms(&self) -> u64 {
        (unsafe { esp_idf_sys::esp_timer_get_time() }) as u64 / 1000
    }

    /// Milliseconds since boot (monotonic).
    #[cfg(not(target_os = "espidf"))]
    pub fn uptime_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }

    /// Seconds since the Unix epoch, `None` until SNTP has set the clock.
    #[cfg(target_os = "espidf")]
    pub fn unix_time(&self) -> Option<i64> {
        let mut tv = esp_idf_sys::timeval {
            tv_sec: 0,
            tv_usec: 0,
        };
        if unsafe { esp_idf_sys::gettimeofday(&mut tv, core::ptr::null_mut()) } != 0 {
            return None;
        }
        let secs = tv.tv_sec as i64;
        (secs >= EPOCH_2020).then_some(secs)
    }

    /// Simulated wall clock: the planted epoch advanced by uptime.
    #[cfg(not(target_os = "espidf"))]
    pub fn unix_time(&self) -> Option<i64> {
        let base = self.sim_epoch?;
        let secs = base + self.start.elapsed().as_secs() as i64;
        (secs >= EPOCH_2020).then_some(secs)
    }

    /// Simulation only: pretend SNTP set the clock to `unix_secs` at boot.
    #[cfg(not(target_os = "espidf"))]
    pub fn set_sim_epoch(&mut self, unix_secs: i64) {
        self.sim_epoch = Some(unix_secs);
    }

    pub fn local_time(&self) -> Option<LocalTime> {
        self.unix_time()
            .map(|secs| LocalTime::from_unix(secs, self.offset_secs))
    }

    pub fn offset_secs(&self) -> i32 {
        self.offset_secs
    }
}

/// Start background SNTP sync against `pool.ntp.org`.
///
/// Does not wait for the first sync; the clock face shows placeholders
/// until [`SystemClock::unix_time`] becomes available.  The returned
/// handle must be kept alive.
#[cfg(target_os = "espidf")]
pub fn start_sntp() -> anyhow::Result<esp_idf_svc::sntp::EspSntp<'static>> {
    use esp_idf_svc::sntp::{EspSntp, OperatingMode, SntpConf, SyncMode};

    let mut conf = SntpConf {
        sync_mode: SyncMode::Immediate,
        operating_mode: OperatingMode::Poll,
        ..Default::default()
    };
    conf.servers[0] = SNTP_SERVER;
    let sntp = EspSntp::new_with_callback(&conf, |_| {
        log::info!("SNTP: wall clock synchronised");
    })?;
    log::info!("SNTP: polling {}", SNTP_SERVER);
    Ok(sntp)
}
