//! Abstract vehicle records

use serde::{Deserialize, Serialize};

/// Per-axis frequency-domain coefficients of one trajectory
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    x_sig: Vec<f64>,
    y_sig: Vec<f64>,
}

impl Signal {
    pub(crate) fn new(x_sig: Vec<f64>, y_sig: Vec<f64>) -> Self {
        Self { x_sig, y_sig }
    }

    /// Magnitude spectrum of the x series
    pub fn x_sig(&self) -> &[f64] {
        &self.x_sig
    }

    /// Magnitude spectrum of the y series
    pub fn y_sig(&self) -> &[f64] {
        &self.y_sig
    }

    /// Number of coefficients per axis
    pub fn len(&self) -> usize {
        self.x_sig.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x_sig.is_empty()
    }
}

/// Feature representation of one finished track
///
/// Built once from the full track history and never modified afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AbstractVehicle {
    /// Id of the source track
    id: u64,
    /// Frequency-domain signal
    signal: Signal,
    /// Maneuver class, if assigned
    label: Option<String>,
}

impl AbstractVehicle {
    pub(crate) fn new(id: u64, signal: Signal) -> Self {
        Self {
            id,
            signal,
            label: None,
        }
    }

    /// Same vehicle carrying a maneuver label
    pub fn with_label(self, label: impl Into<String>) -> Self {
        Self {
            label: Some(label.into()),
            ..self
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn signal(&self) -> &Signal {
        &self.signal
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_label() {
        let v = AbstractVehicle::new(4, Signal::new(vec![1.0], vec![2.0]));
        assert_eq!(v.label(), None);

        let labeled = v.clone().with_label("LANE_CHANGE");
        assert_eq!(labeled.label(), Some("LANE_CHANGE"));
        assert_eq!(labeled.id(), 4);
        assert_eq!(labeled.signal(), v.signal());
    }
}
