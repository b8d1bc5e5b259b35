//! Demographia classification of a price-to-income ratio.

use crate::domain::{AffordabilityBand, BAND_THRESHOLDS};

/// Map a PTI to its affordability band.
///
/// Bounds are inclusive upper limits (see `BAND_THRESHOLDS`). Null and NaN
/// return `None`; infinities land in the outermost bands.
pub fn classify(pti: Option<f64>) -> Option<AffordabilityBand> {
    let pti = pti.filter(|v| !v.is_nan())?;

    let band = if pti <= BAND_THRESHOLDS[0] {
        AffordabilityBand::Affordable
    } else if pti <= BAND_THRESHOLDS[1] {
        AffordabilityBand::ModeratelyUnaffordable
    } else if pti <= BAND_THRESHOLDS[2] {
        AffordabilityBand::SeriouslyUnaffordable
    } else if pti <= BAND_THRESHOLDS[3] {
        AffordabilityBand::SeverelyUnaffordable
    } else {
        AffordabilityBand::ImpossiblyUnaffordable
    };
    Some(band)
}

#[cfg(test)]
mod tests {
    use super::*;
    use AffordabilityBand::*;

    #[test]
    fn boundaries_are_inclusive_upper_bounds() {
        assert_eq!(classify(Some(3.0)), Some(Affordable));
        assert_eq!(classify(Some(3.1)), Some(ModeratelyUnaffordable));
        assert_eq!(classify(Some(4.0)), Some(ModeratelyUnaffordable));
        assert_eq!(classify(Some(5.0)), Some(SeriouslyUnaffordable));
        assert_eq!(classify(Some(8.9)), Some(SeverelyUnaffordable));
        assert_eq!(classify(Some(8.91)), Some(ImpossiblyUnaffordable));
        assert_eq!(classify(Some(9.0)), Some(ImpossiblyUnaffordable));
    }

    #[test]
    fn null_and_nan_have_no_band() {
        assert_eq!(classify(None), None);
        assert_eq!(classify(Some(f64::NAN)), None);
    }

    #[test]
    fn infinities_are_classified() {
        assert_eq!(classify(Some(f64::INFINITY)), Some(ImpossiblyUnaffordable));
        assert_eq!(classify(Some(f64::NEG_INFINITY)), Some(Affordable));
    }

    #[test]
    fn classification_is_monotonic() {
        let mut prev = 0usize;
        let mut r = -1.0;
        while r < 15.0 {
            let rank = classify(Some(r)).map(AffordabilityBand::rank).unwrap();
            assert!(rank >= prev, "rank dropped at {r}");
            prev = rank;
            r += 0.01;
        }
        assert_eq!(prev, ImpossiblyUnaffordable.rank());
    }
}
