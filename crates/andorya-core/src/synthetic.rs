//! Synthetic demo data for dashboards running without real hardware.
//!
//! Each schema gets a slow sine/cosine baseline plus uniform noise, so charts
//! look alive and the shape is recognisable across restarts.

use std::marker::PhantomData;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::collector::SampleSource;
use crate::error::SourceError;
use crate::sample::{DiskThroughput, Gauge, MetricSet, NetworkThroughput, SystemLoad};

/// A metric set that can be generated for tick `step`.
pub trait Synthesize: MetricSet {
    fn synthesize<R: Rng + ?Sized>(step: u64, rng: &mut R) -> Self;
}

impl Synthesize for Gauge {
    fn synthesize<R: Rng + ?Sized>(step: u64, rng: &mut R) -> Self {
        let i = step as f64;
        Self {
            value: 50.0 + (i / 10.0).sin() * 25.0 + rng.random::<f64>() * 10.0,
        }
    }
}

impl Synthesize for DiskThroughput {
    fn synthesize<R: Rng + ?Sized>(step: u64, rng: &mut R) -> Self {
        let i = step as f64;
        let read = 400.0 + (i / 10.0).sin() * 100.0 + rng.random::<f64>() * 50.0;
        let write = 300.0 + (i / 15.0).cos() * 80.0 + rng.random::<f64>() * 40.0;
        Self {
            read,
            write,
            iops: (read * 5.0 + rng.random::<f64>() * 500.0).floor(),
        }
    }
}

impl Synthesize for NetworkThroughput {
    fn synthesize<R: Rng + ?Sized>(step: u64, rng: &mut R) -> Self {
        let i = step as f64;
        Self {
            download: 120.0 + (i / 12.0).sin() * 60.0 + rng.random::<f64>() * 30.0,
            upload: 40.0 + (i / 20.0).cos() * 20.0 + rng.random::<f64>() * 10.0,
        }
    }
}

impl Synthesize for SystemLoad {
    fn synthesize<R: Rng + ?Sized>(step: u64, rng: &mut R) -> Self {
        let i = step as f64;
        Self {
            cpu_load: (20.0 + (i / 8.0).sin() * 15.0 + rng.random::<f64>() * 10.0)
                .clamp(0.0, 100.0),
            mem_used: 4.0 + (i / 30.0).cos() * 0.5 + rng.random::<f64>() * 0.2,
        }
    }
}

/// [`SampleSource`] producing [`Synthesize`] data. Never fails.
#[derive(Debug)]
pub struct SyntheticSource<M> {
    step: u64,
    rng: StdRng,
    _schema: PhantomData<fn() -> M>,
}

impl<M: Synthesize> SyntheticSource<M> {
    pub fn new() -> Self {
        Self::from_rng(StdRng::from_os_rng())
    }

    /// Reproducible sequence for tests and demos.
    pub fn seeded(seed: u64) -> Self {
        Self::from_rng(StdRng::seed_from_u64(seed))
    }

    fn from_rng(rng: StdRng) -> Self {
        Self {
            step: 0,
            rng,
            _schema: PhantomData,
        }
    }

    /// Generate `count` consecutive values without a collector.
    pub fn take(&mut self, count: usize) -> Vec<M> {
        (0..count).map(|_| self.next_metrics()).collect()
    }

    fn next_metrics(&mut self) -> M {
        let m = M::synthesize(self.step, &mut self.rng);
        self.step += 1;
        m
    }
}

impl<M: Synthesize> Default for SyntheticSource<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: Synthesize> SampleSource<M> for SyntheticSource<M> {
    fn name(&self) -> &str {
        "synthetic"
    }

    fn fetch(&mut self) -> Result<M, SourceError> {
        Ok(self.next_metrics())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disk_values_stay_in_demo_ranges() {
        let mut source = SyntheticSource::<DiskThroughput>::seeded(7);
        for d in source.take(500) {
            assert!((300.0..=550.0).contains(&d.read), "read {}", d.read);
            assert!((220.0..=420.0).contains(&d.write), "write {}", d.write);
            assert!(d.iops >= (d.read * 5.0).floor());
            assert!(d.iops < d.read * 5.0 + 500.0);
            assert_eq!(d.iops.fract(), 0.0);
        }
    }

    #[test]
    fn seeded_sources_repeat() {
        let a = SyntheticSource::<NetworkThroughput>::seeded(42).take(20);
        let b = SyntheticSource::<NetworkThroughput>::seeded(42).take(20);
        assert_eq!(a, b);
    }

    #[test]
    fn cpu_load_is_a_percentage() {
        let mut source = SyntheticSource::<SystemLoad>::seeded(1);
        assert!(
            source
                .take(200)
                .iter()
                .all(|s| (0.0..=100.0).contains(&s.cpu_load))
        );
    }

    #[test]
    fn fetch_never_fails() {
        let mut source = SyntheticSource::<Gauge>::new();
        for _ in 0..10 {
            assert!(source.fetch().is_ok());
        }
        assert_eq!(source.name(), "synthetic");
    }
}
