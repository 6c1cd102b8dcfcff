use std::{collections::BTreeMap, sync::Mutex, time::Duration};

/// Request counters shared by everything that serves narration requests.
#[derive(Debug, Default)]
pub struct UsageStats {
    inner: Mutex<Counters>,
}

#[derive(Debug, Default)]
struct Counters {
    requests: u64,
    errors: u64,
    total_generation: Duration,
    provider_usage: BTreeMap<String, u64>,
}

/// Point-in-time copy of [`UsageStats`].
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize)]
pub struct UsageSnapshot {
    pub requests: u64,
    pub errors: u64,
    pub error_rate: f64,
    pub avg_generation_secs: f64,
    pub provider_usage: BTreeMap<String, u64>,
}

impl UsageStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn track(&self, success: bool, generation: Duration, provider: Option<&str>) {
        let mut c = self.inner.lock().unwrap_or_else(|p| p.into_inner());
        c.requests += 1;
        if !success {
            c.errors += 1;
        }
        c.total_generation += generation;
        if let Some(provider) = provider {
            *c.provider_usage.entry(provider.to_string()).or_default() += 1;
        }
    }

    pub fn snapshot(&self) -> UsageSnapshot {
        let c = self.inner.lock().unwrap_or_else(|p| p.into_inner());
        let denom = c.requests.max(1) as f64;
        UsageSnapshot {
            requests: c.requests,
            errors: c.errors,
            error_rate: c.errors as f64 / denom,
            avg_generation_secs: c.total_generation.as_secs_f64() / denom,
            provider_usage: c.provider_usage.clone(),
        }
    }
}

#[cfg(test)]
#[path = "../tests/unit/usage.rs"]
mod tests;
