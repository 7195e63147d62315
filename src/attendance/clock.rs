use chrono::{Local, NaiveDateTime};

/// Source of the authoritative "now". Attendance dates are never taken
/// from the client.
pub trait Clock: Send + Sync {
    fn now(&self) -> NaiveDateTime;
}

/// Server-local wall clock.
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

#[cfg(test)]
pub struct FixedClock(pub NaiveDateTime);

#[cfg(test)]
impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.0
    }
}
