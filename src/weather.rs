// src/weather.rs

use crate::db::{Medium, LAST_APPLICATION_KEY};
use crate::error::Result;
use crate::models::iso_timestamp;
use chrono::{DateTime, Duration, Utc};
use rand::seq::SliceRandom;
use rand::Rng;
use std::fmt;
use tracing::{info, warn};

/// Days to wait between two applications.
pub const APPLICATION_INTERVAL_DAYS: i64 = 14;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Condition {
    Sunny,
    Cloudy,
    Rainy,
    Windy,
}

impl Condition {
    pub const ALL: [Condition; 4] = [
        Condition::Sunny,
        Condition::Cloudy,
        Condition::Rainy,
        Condition::Windy,
    ];

    pub fn description(self) -> &'static str {
        match self {
            Condition::Sunny => "Clear and sunny",
            Condition::Cloudy => "Partly cloudy",
            Condition::Rainy => "Light rain",
            Condition::Windy => "Windy conditions",
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Condition::Sunny => "sunny",
            Condition::Cloudy => "cloudy",
            Condition::Rainy => "rainy",
            Condition::Windy => "windy",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct WeatherReading {
    pub location: String,
    /// Degrees Celsius.
    pub temperature: i32,
    pub condition: Condition,
    /// Percent.
    pub humidity: u32,
    /// km/h.
    pub wind_speed: u32,
    /// hPa.
    pub pressure: u32,
    pub description: String,
}

pub trait WeatherSource {
    fn current(&self) -> WeatherReading;
}

/// Stand-in until a real forecast provider is wired up.
pub struct SimulatedWeather;

impl WeatherSource for SimulatedWeather {
    fn current(&self) -> WeatherReading {
        let mut rng = rand::thread_rng();
        let condition = *Condition::ALL
            .choose(&mut rng)
            .unwrap_or(&Condition::Cloudy);
        WeatherReading {
            location: "Your Location".to_string(),
            temperature: rng.gen_range(15..30),
            condition,
            humidity: rng.gen_range(40..80),
            wind_speed: rng.gen_range(5..25),
            pressure: rng.gen_range(1000..1050),
            description: condition.description().to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advice {
    Ideal,
    Good,
    NotRecommended,
    CheckConditions,
}

impl Advice {
    /// `None` when the weather is neither clearly good nor clearly bad.
    pub fn is_good_weather(self) -> Option<bool> {
        match self {
            Advice::Ideal | Advice::Good => Some(true),
            Advice::NotRecommended => Some(false),
            Advice::CheckConditions => None,
        }
    }

    pub fn text(self) -> &'static str {
        match self {
            Advice::Ideal => "Perfect weather! Ideal conditions for pesticide application.",
            Advice::Good => "Good weather! You can apply pesticide with caution.",
            Advice::NotRecommended => "Not recommended! Wait for better weather conditions.",
            Advice::CheckConditions => "Check weather conditions carefully before application.",
        }
    }
}

pub fn advice(reading: &WeatherReading) -> Advice {
    let WeatherReading {
        condition,
        wind_speed,
        temperature,
        humidity,
        ..
    } = *reading;

    if condition == Condition::Sunny
        && wind_speed < 10
        && temperature > 18
        && temperature < 28
        && humidity > 50
    {
        return Advice::Ideal;
    }
    if condition == Condition::Cloudy && wind_speed < 15 && temperature > 15 {
        return Advice::Good;
    }
    if condition == Condition::Rainy || wind_speed > 15 {
        return Advice::NotRecommended;
    }
    Advice::CheckConditions
}

pub fn last_application(medium: &Medium) -> Option<DateTime<Utc>> {
    let raw = medium.get_item_or_warn(LAST_APPLICATION_KEY)?;
    match DateTime::parse_from_rfc3339(&raw) {
        Ok(dt) => Some(dt.with_timezone(&Utc)),
        Err(e) => {
            warn!(error = %e, value = %raw, "ignoring malformed last application time");
            None
        }
    }
}

pub fn set_last_application(medium: &Medium, at: DateTime<Utc>) -> Result<()> {
    medium.set_item(LAST_APPLICATION_KEY, &iso_timestamp(at))?;
    info!(at = %at, "recorded last application");
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Countdown {
    NoRecord,
    Ready,
    Remaining { days: i64, hours: i64, minutes: i64 },
}

pub fn countdown(last: Option<DateTime<Utc>>, now: DateTime<Utc>) -> Countdown {
    let Some(last) = last else {
        return Countdown::NoRecord;
    };
    let left = last + Duration::days(APPLICATION_INTERVAL_DAYS) - now;
    if left <= Duration::zero() {
        return Countdown::Ready;
    }
    Countdown::Remaining {
        days: left.num_days(),
        hours: left.num_hours() % 24,
        minutes: left.num_minutes() % 60,
    }
}

impl fmt::Display for Countdown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Countdown::NoRecord => f.write_str("No previous application recorded"),
            Countdown::Ready => f.write_str("Ready for next application"),
            Countdown::Remaining {
                days,
                hours,
                minutes,
            } => write!(f, "{}d {}h {}m until next application", days, hours, minutes),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn reading(condition: Condition, temperature: i32, humidity: u32, wind_speed: u32) -> WeatherReading {
        WeatherReading {
            location: "Test".to_string(),
            temperature,
            condition,
            humidity,
            wind_speed,
            pressure: 1013,
            description: condition.description().to_string(),
        }
    }

    #[test]
    fn advice_follows_rule_order() {
        assert_eq!(advice(&reading(Condition::Sunny, 22, 60, 5)), Advice::Ideal);
        // Too hot for ideal, and sunny never falls into the cloudy rule.
        assert_eq!(advice(&reading(Condition::Sunny, 28, 60, 5)), Advice::CheckConditions);
        assert_eq!(advice(&reading(Condition::Cloudy, 16, 45, 14)), Advice::Good);
        assert_eq!(advice(&reading(Condition::Cloudy, 20, 45, 16)), Advice::NotRecommended);
        assert_eq!(advice(&reading(Condition::Rainy, 20, 70, 5)), Advice::NotRecommended);
        assert_eq!(advice(&reading(Condition::Windy, 20, 70, 15)), Advice::CheckConditions);
    }

    #[test]
    fn simulated_reading_stays_in_range() {
        for _ in 0..50 {
            let r = SimulatedWeather.current();
            assert!((15..30).contains(&r.temperature));
            assert!((40..80).contains(&r.humidity));
            assert!((5..25).contains(&r.wind_speed));
            assert!((1000..1050).contains(&r.pressure));
            assert_eq!(r.description, r.condition.description());
        }
    }

    #[test]
    fn countdown_states() {
        let last = Utc.with_ymd_and_hms(2026, 10, 1, 8, 0, 0).unwrap();
        assert_eq!(countdown(None, last), Countdown::NoRecord);

        let now = Utc.with_ymd_and_hms(2026, 10, 5, 6, 30, 0).unwrap();
        let left = countdown(Some(last), now);
        assert_eq!(left, Countdown::Remaining { days: 10, hours: 1, minutes: 30 });
        assert_eq!(left.to_string(), "10d 1h 30m until next application");

        let later = Utc.with_ymd_and_hms(2026, 10, 15, 8, 0, 0).unwrap();
        assert_eq!(countdown(Some(last), later), Countdown::Ready);
    }

    #[test]
    fn last_application_round_trips_and_ignores_garbage() {
        let medium = Medium::open_in_memory().unwrap();
        assert_eq!(last_application(&medium), None);

        let at = Utc.with_ymd_and_hms(2026, 9, 30, 17, 5, 0).unwrap();
        set_last_application(&medium, at).unwrap();
        assert_eq!(last_application(&medium), Some(at));

        medium.set_item(LAST_APPLICATION_KEY, "yesterday").unwrap();
        assert_eq!(last_application(&medium), None);
    }
}
