use chrono::{Local, NaiveDate};

/// Source of the calendar date that anchors a simulation's month offsets.
pub trait Clock {
    fn today(&self) -> NaiveDate;
}

#[derive(Copy, Clone, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}
