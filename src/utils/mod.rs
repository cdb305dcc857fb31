use std::{fmt, hash::BuildHasherDefault, time::Duration};

use indexmap::{IndexMap, IndexSet};
use rustc_hash::FxHasher;

pub(crate) mod indenter;

pub type FxIndexMap<K, V> = IndexMap<K, V, BuildHasherDefault<FxHasher>>;
pub type FxIndexSet<T> = IndexSet<T, BuildHasherDefault<FxHasher>>;

pub fn duration_fmt(duration: Duration) -> String {
    if duration.is_zero() {
        return "0 ns".to_owned();
    }

    let mut si_idx = 0;
    let mut float = duration.as_secs_f64() * 1e9;
    let mut rounded = f64::round(float * 100.0) / 100.0;
    while rounded >= 1e3 {
        float /= 1e3;
        rounded = f64::round(float * 100.0) / 100.0;
        si_idx += 1;
        if si_idx == 3 {
            break;
        }
    }

    let unit = match si_idx {
        0 => "ns",
        1 => "µs",
        2 => "ms",
        3 => "s",

        _ => unreachable!(),
    };

    format!("{rounded} {unit}")
}

/// Byte count printed with a binary unit.
#[derive(Debug, Clone, Copy)]
pub struct ByteFmt(pub usize);

impl fmt::Display for ByteFmt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const UNITS: [&str; 4] = ["B", "KiB", "MiB", "GiB"];

        let mut value = self.0 as f64;
        let mut unit = 0;
        while value >= 1024.0 && unit < UNITS.len() - 1 {
            value /= 1024.0;
            unit += 1;
        }

        if unit == 0 {
            write!(f, "{} {}", self.0, UNITS[0])
        } else {
            write!(f, "{:.2} {}", value, UNITS[unit])
        }
    }
}

#[test]
fn test_format_duration() {
    assert_eq!("1 ns", duration_fmt(Duration::from_secs_f64(0.000000001)));
    assert_eq!("100 ns", duration_fmt(Duration::from_secs_f64(0.0000001)));

    assert_eq!("1 µs", duration_fmt(Duration::from_secs_f64(0.000001)));
    assert_eq!("10 µs", duration_fmt(Duration::from_secs_f64(0.00001)));

    assert_eq!("1 ms", duration_fmt(Duration::from_secs_f64(0.001)));
    assert_eq!("100 ms", duration_fmt(Duration::from_secs_f64(0.1)));

    assert_eq!("1 s", duration_fmt(Duration::from_secs_f64(1.0)));
    assert_eq!("1000 s", duration_fmt(Duration::from_secs_f64(1000.0)));

    assert_eq!("15.6 µs", duration_fmt(Duration::from_nanos(15_600)));
    assert_eq!("14.12 ms", duration_fmt(Duration::from_nanos(14_123_333)));
    assert_eq!("801.5 ms", duration_fmt(Duration::from_secs_f64(0.8015)));
    assert_eq!("0 ns", duration_fmt(Duration::ZERO));
}

#[test]
fn test_format_bytes() {
    assert_eq!("0 B", ByteFmt(0).to_string());
    assert_eq!("1023 B", ByteFmt(1023).to_string());
    assert_eq!("1.00 KiB", ByteFmt(1024).to_string());
    assert_eq!("1.50 KiB", ByteFmt(1536).to_string());
    assert_eq!("2.00 MiB", ByteFmt(2 * 1024 * 1024).to_string());
}
