//! Activity classification and bout segmentation

use crate::types::{Bout, WindowedSma};

/// Label each window active when its SMA is valid and strictly above `threshold`.
///
/// Masked windows are labelled inactive, so they count against the activity
/// percentage rather than being excluded from it.
pub fn classify(sma: &WindowedSma, threshold: f64) -> Vec<bool> {
    sma.values
        .iter()
        .map(|value| matches!(value, Some(v) if *v > threshold))
        .collect()
}

/// Group maximal runs of active windows into bouts.
///
/// `labels` and `sma` must have equal length; every active window has a valid SMA.
pub fn segment_bouts(labels: &[bool], sma: &WindowedSma) -> Vec<Bout> {
    let mut bouts = Vec::new();
    let mut current: Option<Bout> = None;

    for (index, (active, value)) in labels.iter().zip(&sma.values).enumerate() {
        match (*active, *value) {
            (true, Some(v)) => {
                if let Some(bout) = current.as_mut() {
                    bout.intensities.push(v);
                } else {
                    current = Some(Bout {
                        first_window: index,
                        intensities: vec![v],
                    });
                }
            }
            _ => bouts.extend(current.take()),
        }
    }

    bouts.extend(current);
    bouts
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sma(values: Vec<Option<f64>>) -> WindowedSma {
        WindowedSma {
            window_length_s: 5.0,
            samples_per_window: 50,
            values,
        }
    }

    fn bout_sizes(bouts: &[Bout]) -> Vec<usize> {
        bouts.iter().map(Bout::len).collect()
    }

    #[test]
    fn test_threshold_is_strict() {
        let labels = classify(&sma(vec![Some(0.135), Some(0.1351), Some(0.0)]), 0.135);
        assert_eq!(labels, vec![false, true, false]);
    }

    #[test]
    fn test_invalid_window_is_inactive() {
        // Even with a threshold no valid window could fall under
        let labels = classify(&sma(vec![None, Some(1.0), None]), -1.0);
        assert_eq!(labels, vec![false, true, false]);
    }

    #[test]
    fn test_segment_mixed_sequence() {
        let windows = sma(vec![Some(0.0), Some(0.5), Some(0.7), Some(0.0), Some(0.9)]);
        let labels = vec![false, true, true, false, true];

        let bouts = segment_bouts(&labels, &windows);
        assert_eq!(bout_sizes(&bouts), vec![2, 1]);
        assert_eq!(
            bouts[0],
            Bout {
                first_window: 1,
                intensities: vec![0.5, 0.7]
            }
        );
        assert_eq!(bouts[1].first_window, 4);
        assert_eq!(bouts[1].intensities, vec![0.9]);
    }

    #[test]
    fn test_segment_all_inactive() {
        let windows = sma(vec![Some(0.0); 6]);
        assert!(segment_bouts(&[false; 6], &windows).is_empty());
    }

    #[test]
    fn test_segment_all_active() {
        let windows = sma((0..6).map(|i| Some(i as f64 + 1.0)).collect());
        let bouts = segment_bouts(&[true; 6], &windows);

        assert_eq!(bouts.len(), 1);
        assert_eq!(bouts[0].first_window, 0);
        assert_eq!(bouts[0].intensities, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
    }

    #[test]
    fn test_segment_empty() {
        assert!(segment_bouts(&[], &sma(vec![])).is_empty());
    }

    #[test]
    fn test_masked_window_splits_bout() {
        let windows = sma(vec![Some(1.0), None, Some(1.0)]);
        let labels = classify(&windows, 0.135);
        assert_eq!(bout_sizes(&segment_bouts(&labels, &windows)), vec![1, 1]);
    }
}
