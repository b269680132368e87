use serde::{Deserialize, Serialize};

/// Winning class of one classifier run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    /// Index into the model's label space.
    pub predicted_class: usize,
    /// Probability of `predicted_class` (0.0–1.0).
    pub confidence: f32,
}

impl Prediction {
    /// Argmax over a probability vector. Ties resolve to the lowest index.
    pub fn from_probabilities(probabilities: &[f32]) -> Option<Self> {
        let mut iter = probabilities.iter().copied().enumerate();
        let first = iter.next()?;
        let (predicted_class, confidence) =
            iter.fold(first, |best, (i, p)| if p > best.1 { (i, p) } else { best });
        Some(Self { predicted_class, confidence })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn picks_highest_probability() {
        let p = Prediction::from_probabilities(&[0.1, 0.7, 0.2]).unwrap();
        assert_eq!(p.predicted_class, 1);
        assert_eq!(p.confidence, 0.7);
    }

    #[test]
    fn ties_go_to_first_index() {
        let p = Prediction::from_probabilities(&[0.4, 0.2, 0.4]).unwrap();
        assert_eq!(p.predicted_class, 0);
    }

    #[test]
    fn empty_vector_has_no_prediction() {
        assert_eq!(Prediction::from_probabilities(&[]), None);
    }

    #[test]
    fn serializes_flat() {
        let p = Prediction { predicted_class: 2, confidence: 0.5 };
        let json = serde_json::to_value(p).unwrap();
        assert_eq!(json, serde_json::json!({ "predicted_class": 2, "confidence": 0.5 }));
    }
}
