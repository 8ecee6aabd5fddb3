use std::collections::HashSet;

use fluxcast_parser::Observation;
use serde::Serialize;
use tracing::info;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CleanReport {
    pub input_rows: usize,
    pub duplicate_timestamps: usize,
    pub non_positive_flux: usize,
    pub retained: usize,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CleanedObservations {
    pub observations: Vec<Observation>,
    pub report: CleanReport,
}

/// Drops repeated timestamps (first occurrence wins), then rows whose flux is not strictly
/// positive. Input order is preserved and an empty result is not an error.
pub fn clean_observations(observations: &[Observation]) -> CleanedObservations {
    let mut seen: HashSet<u64> = HashSet::with_capacity(observations.len());
    let mut report = CleanReport {
        input_rows: observations.len(),
        ..CleanReport::default()
    };

    let unique: Vec<Observation> = observations
        .iter()
        .filter(|observation| {
            let fresh = seen.insert(time_key(observation.time));
            if !fresh {
                report.duplicate_timestamps += 1;
            }
            fresh
        })
        .copied()
        .collect();

    let retained: Vec<Observation> = unique
        .into_iter()
        .filter(|observation| {
            let positive = observation.flux > 0.0;
            if !positive {
                report.non_positive_flux += 1;
            }
            positive
        })
        .collect();

    report.retained = retained.len();
    info!(
        input_rows = report.input_rows,
        duplicate_timestamps = report.duplicate_timestamps,
        non_positive_flux = report.non_positive_flux,
        retained = report.retained,
        "Cleaned observations"
    );

    CleanedObservations {
        observations: retained,
        report,
    }
}

// -0.0 and 0.0 are the same timestamp.
fn time_key(time: f64) -> u64 {
    if time == 0.0 {
        0.0f64.to_bits()
    } else {
        time.to_bits()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obs(time: f64, flux: f64) -> Observation {
        Observation::new(time, flux)
    }

    #[test]
    fn keeps_first_duplicate_then_drops_non_positive() {
        let input = vec![
            obs(1.0, 5.0),
            obs(2.0, 6.0),
            obs(2.0, 7.0),
            obs(3.0, 0.0),
            obs(4.0, -1.0),
            obs(5.0, 8.0),
        ];

        let cleaned = clean_observations(&input);

        assert_eq!(
            cleaned.observations,
            vec![obs(1.0, 5.0), obs(2.0, 6.0), obs(5.0, 8.0)]
        );
        assert_eq!(cleaned.report.duplicate_timestamps, 1);
        assert_eq!(cleaned.report.non_positive_flux, 2);
        assert_eq!(cleaned.report.retained, 3);
    }

    #[test]
    fn duplicate_check_runs_before_flux_filter() {
        // The first row at t=1 is dropped for its flux, so its positive twin is gone too.
        let cleaned = clean_observations(&[obs(1.0, -2.0), obs(1.0, 3.0)]);
        assert!(cleaned.observations.is_empty());
        assert_eq!(cleaned.report.duplicate_timestamps, 1);
        assert_eq!(cleaned.report.non_positive_flux, 1);
    }

    #[test]
    fn signed_zero_times_collide() {
        let cleaned = clean_observations(&[obs(0.0, 1.0), obs(-0.0, 2.0)]);
        assert_eq!(cleaned.observations.len(), 1);
    }

    #[test]
    fn empty_input_is_fine() {
        let cleaned = clean_observations(&[]);
        assert!(cleaned.observations.is_empty());
        assert_eq!(cleaned.report, CleanReport::default());
    }
}
