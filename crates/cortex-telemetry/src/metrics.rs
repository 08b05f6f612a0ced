use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};

/// In-memory counter. Monotonically increasing.
struct Counter {
    value: AtomicU64,
}

impl Counter {
    fn new() -> Self {
        Self {
            value: AtomicU64::new(0),
        }
    }
    fn increment(&self, n: u64) {
        self.value.fetch_add(n, Ordering::Relaxed);
    }
    fn get(&self) -> u64 {
        self.value.load(Ordering::Relaxed)
    }
}

/// Observations kept per histogram for percentiles.
pub const HISTOGRAM_WINDOW: usize = 1024;

/// In-memory histogram. Count and sum cover every observation; percentiles
/// come from the most recent [`HISTOGRAM_WINDOW`] samples.
struct Histogram {
    state: Mutex<HistogramState>,
}

#[derive(Default)]
struct HistogramState {
    count: u64,
    sum: f64,
    recent: VecDeque<f64>,
}

impl Histogram {
    fn new() -> Self {
        Self {
            state: Mutex::new(HistogramState::default()),
        }
    }
    fn observe(&self, value: f64) {
        let mut st = self.state.lock();
        st.count += 1;
        st.sum += value;
        if st.recent.len() == HISTOGRAM_WINDOW {
            st.recent.pop_front();
        }
        st.recent.push_back(value);
    }
    fn summary(&self) -> HistogramSummary {
        let st = self.state.lock();
        if st.recent.is_empty() {
            return HistogramSummary::default();
        }
        let mut obs: Vec<f64> = st.recent.iter().copied().collect();
        obs.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        let n = obs.len();
        let at = |q: f64| obs[((n as f64 * q) as usize).min(n - 1)];
        HistogramSummary {
            count: st.count,
            sum: st.sum,
            p50: obs[n / 2],
            p95: at(0.95),
            p99: at(0.99),
        }
    }
}

/// Summary statistics from a histogram.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct HistogramSummary {
    pub count: u64,
    pub sum: f64,
    pub p50: f64,
    pub p95: f64,
    pub p99: f64,
}

/// Metric key: name + labels.
#[derive(Clone, Debug, Hash, PartialEq, Eq)]
struct MetricKey {
    name: String,
    labels: Vec<(String, String)>,
}

impl MetricKey {
    fn new(name: impl Into<String>, labels: &[(&str, &str)]) -> Self {
        let mut sorted: Vec<(String, String)> = labels
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        sorted.sort_by(|a, b| a.0.cmp(&b.0));
        Self {
            name: name.into(),
            labels: sorted,
        }
    }

    fn labels_map(&self) -> HashMap<String, String> {
        self.labels.iter().cloned().collect()
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CounterValue {
    pub name: String,
    pub labels: HashMap<String, String>,
    pub value: u64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HistogramValue {
    pub name: String,
    pub labels: HashMap<String, String>,
    #[serde(flatten)]
    pub summary: HistogramSummary,
}

/// Point-in-time view of every recorded metric, sorted by name.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct MetricsReport {
    pub counters: Vec<CounterValue>,
    pub histograms: Vec<HistogramValue>,
}

/// Thread-safe in-memory metrics recorder.
#[derive(Default)]
pub struct MetricsRecorder {
    counters: RwLock<HashMap<MetricKey, Counter>>,
    histograms: RwLock<HashMap<MetricKey, Histogram>>,
}

impl MetricsRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Increment a counter by n.
    pub fn counter_inc(&self, name: &str, labels: &[(&str, &str)], n: u64) {
        let key = MetricKey::new(name, labels);
        let counters = self.counters.read();
        if let Some(c) = counters.get(&key) {
            c.increment(n);
            return;
        }
        drop(counters);
        let mut counters = self.counters.write();
        let c = counters.entry(key).or_insert_with(Counter::new);
        c.increment(n);
    }

    /// Record a histogram observation.
    pub fn histogram_observe(&self, name: &str, labels: &[(&str, &str)], value: f64) {
        let key = MetricKey::new(name, labels);
        let histograms = self.histograms.read();
        if let Some(h) = histograms.get(&key) {
            h.observe(value);
            return;
        }
        drop(histograms);
        let mut histograms = self.histograms.write();
        let h = histograms.entry(key).or_insert_with(Histogram::new);
        h.observe(value);
    }

    /// Get current value of a counter.
    pub fn counter_get(&self, name: &str, labels: &[(&str, &str)]) -> u64 {
        let key = MetricKey::new(name, labels);
        self.counters.read().get(&key).map_or(0, |c| c.get())
    }

    /// Get a histogram summary.
    pub fn histogram_summary(&self, name: &str, labels: &[(&str, &str)]) -> HistogramSummary {
        let key = MetricKey::new(name, labels);
        self.histograms
            .read()
            .get(&key)
            .map(|h| h.summary())
            .unwrap_or_default()
    }

    pub fn report(&self) -> MetricsReport {
        let mut counters: Vec<CounterValue> = self
            .counters
            .read()
            .iter()
            .map(|(key, c)| CounterValue {
                name: key.name.clone(),
                labels: key.labels_map(),
                value: c.get(),
            })
            .collect();
        counters.sort_by(|a, b| a.name.cmp(&b.name));

        let mut histograms: Vec<HistogramValue> = self
            .histograms
            .read()
            .iter()
            .map(|(key, h)| HistogramValue {
                name: key.name.clone(),
                labels: key.labels_map(),
                summary: h.summary(),
            })
            .collect();
        histograms.sort_by(|a, b| a.name.cmp(&b.name));

        MetricsReport { counters, histograms }
    }
}
