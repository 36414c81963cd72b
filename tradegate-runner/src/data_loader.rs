//! OHLCV loading for the suite.
//!
//! Two sources:
//! 1. CSV files (fast and slow timeframe), normalised to strictly ascending bars
//! 2. Synthetic bars for offline runs: a seeded random walk on 4h bars,
//!    aggregated to daily bars for the trend timeframe
//!
//! Results produced on synthetic data are tagged through `MarketData::source`.

use chrono::{DateTime, Duration, TimeZone, Utc};
use std::io::Read;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

use tradegate_core::domain::Bar;
use tradegate_core::time::parse_timestamp;

/// Columns every OHLCV CSV must carry.
pub const REQUIRED_COLUMNS: [&str; 7] = [
    "open_time",
    "open",
    "high",
    "low",
    "close",
    "volume",
    "close_time",
];

/// Fast (4h) bars per slow (daily) bar.
pub const FAST_BARS_PER_SLOW: usize = 6;

/// Errors from the data loading layer.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to open '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("missing column '{0}'")]
    MissingColumn(&'static str),
    #[error("no usable rows after normalisation")]
    Empty,
    #[error("duplicate open_time {0}")]
    DuplicateTimestamp(DateTime<Utc>),
}

/// Bars for both timeframes plus provenance.
#[derive(Debug, Clone)]
pub struct MarketData {
    pub fast: Vec<Bar>,
    pub slow: Vec<Bar>,
    /// Free-form tag carried into the report, e.g. `csv` or `synthetic`.
    pub source: String,
    /// BLAKE3 over every bar of both series.
    pub dataset_hash: String,
}

impl MarketData {
    pub fn new(fast: Vec<Bar>, slow: Vec<Bar>, source: impl Into<String>) -> Self {
        let dataset_hash = compute_dataset_hash(&fast, &slow);
        Self {
            fast,
            slow,
            source: source.into(),
            dataset_hash,
        }
    }

    pub fn is_synthetic(&self) -> bool {
        self.source == "synthetic"
    }
}

/// Load both timeframes from CSV files.
pub fn load_market_data(fast_path: &Path, slow_path: &Path) -> Result<MarketData, LoadError> {
    let fast = load_bars_csv(fast_path)?;
    let slow = load_bars_csv(slow_path)?;
    info!(
        fast_bars = fast.len(),
        slow_bars = slow.len(),
        "loaded OHLCV from CSV"
    );
    Ok(MarketData::new(fast, slow, "csv"))
}

pub fn load_bars_csv(path: &Path) -> Result<Vec<Bar>, LoadError> {
    let file = std::fs::File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    read_bars_csv(file)
}

/// Parse OHLCV rows. Rows with unparseable fields or an inconsistent OHLC
/// envelope (see [`Bar::is_sane`]) are dropped; the rest are
/// sorted by `open_time`, which must then be unique.
pub fn read_bars_csv<R: Read>(reader: R) -> Result<Vec<Bar>, LoadError> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let headers = rdr.headers()?.clone();
    let mut idx = [0usize; 7];
    for (slot, name) in idx.iter_mut().zip(REQUIRED_COLUMNS) {
        *slot = headers
            .iter()
            .position(|h| h.eq_ignore_ascii_case(name))
            .ok_or(LoadError::MissingColumn(name))?;
    }

    let mut bars = Vec::new();
    let mut dropped = 0usize;
    for record in rdr.records() {
        let record = record?;
        match parse_row(&record, &idx) {
            Some(bar) => bars.push(bar),
            None => dropped += 1,
        }
    }
    if dropped > 0 {
        warn!(dropped, "dropped unparseable OHLCV rows");
    }
    if bars.is_empty() {
        return Err(LoadError::Empty);
    }

    bars.sort_by_key(|b| b.open_time);
    if let Some(pair) = bars.windows(2).find(|w| w[0].open_time == w[1].open_time) {
        return Err(LoadError::DuplicateTimestamp(pair[1].open_time));
    }
    Ok(bars)
}

fn parse_row(record: &csv::StringRecord, idx: &[usize; 7]) -> Option<Bar> {
    let field = |i: usize| record.get(idx[i]);
    let number = |i: usize| -> Option<f64> {
        field(i)?.parse::<f64>().ok().filter(|v| v.is_finite())
    };
    let bar = Bar {
        open_time: parse_timestamp(field(0)?).ok()?,
        open: number(1)?,
        high: number(2)?,
        low: number(3)?,
        close: number(4)?,
        volume: number(5)?,
        close_time: parse_timestamp(field(6)?).ok()?,
    };
    bar.is_sane().then_some(bar)
}

/// Merge consecutive groups of `group` bars; a trailing partial group is dropped.
pub fn aggregate_bars(bars: &[Bar], group: usize) -> Vec<Bar> {
    if group == 0 {
        return Vec::new();
    }
    bars.chunks_exact(group)
        .map(|chunk| {
            let first = &chunk[0];
            let last = &chunk[chunk.len() - 1];
            Bar {
                open_time: first.open_time,
                close_time: last.close_time,
                open: first.open,
                high: chunk.iter().map(|b| b.high).fold(f64::MIN, f64::max),
                low: chunk.iter().map(|b| b.low).fold(f64::MAX, f64::min),
                close: last.close,
                volume: chunk.iter().map(|b| b.volume).sum(),
            }
        })
        .collect()
}

/// Deterministic synthetic 4h bars for `symbol`, starting at `start`.
///
/// Produces a drifting random walk from a starting price of 100.0.
/// These are clearly fake and tagged as synthetic.
pub fn synthetic_bars(symbol: &str, count: usize, start: DateTime<Utc>) -> Vec<Bar> {
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    // Deterministic seed from symbol name
    let seed: [u8; 32] = *blake3::hash(symbol.as_bytes()).as_bytes();
    let mut rng = StdRng::from_seed(seed);

    let step = Duration::hours(4);
    let mut bars = Vec::with_capacity(count);
    let mut price = 100.0_f64;
    let mut open_time = start;

    for _ in 0..count {
        let ret: f64 = rng.gen_range(-0.012..0.0135);
        let open = price;
        let close = (price * (1.0 + ret)).max(0.01);
        let high = open.max(close) * (1.0 + rng.gen_range(0.0..0.004));
        let low = open.min(close) * (1.0 - rng.gen_range(0.0..0.004));
        let volume = rng.gen_range(100.0..5_000.0);

        bars.push(Bar {
            open_time,
            close_time: open_time + step,
            open,
            high,
            low,
            close,
            volume,
        });

        price = close;
        open_time += step;
    }
    bars
}

/// Synthetic fast bars plus their daily aggregation.
pub fn synthetic_market_data(symbol: &str, fast_bars: usize) -> MarketData {
    let start = Utc
        .with_ymd_and_hms(2023, 1, 1, 0, 0, 0)
        .single()
        .unwrap_or_default();
    let fast = synthetic_bars(symbol, fast_bars, start);
    let slow = aggregate_bars(&fast, FAST_BARS_PER_SLOW);
    MarketData::new(fast, slow, "synthetic")
}

/// Compute a BLAKE3 hash of both bar series.
///
/// The hash covers timestamps and all OHLCV values in series order.
pub fn compute_dataset_hash(fast: &[Bar], slow: &[Bar]) -> String {
    let mut hasher = blake3::Hasher::new();
    for (tag, bars) in [("fast", fast), ("slow", slow)] {
        hasher.update(tag.as_bytes());
        for bar in bars {
            hasher.update(&bar.open_time.timestamp_millis().to_le_bytes());
            hasher.update(&bar.close_time.timestamp_millis().to_le_bytes());
            hasher.update(&bar.open.to_le_bytes());
            hasher.update(&bar.high.to_le_bytes());
            hasher.update(&bar.low.to_le_bytes());
            hasher.update(&bar.close.to_le_bytes());
            hasher.update(&bar.volume.to_le_bytes());
        }
    }
    hasher.finalize().to_hex().to_string()
}
