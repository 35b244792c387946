//! Test data builders for creating test objects

use iumview::types::{IrPeak, Measurement, MeasurementData, NumericArray, Variable, Variables};

/// Builder for creating test Measurements
pub struct MeasurementBuilder {
    id: String,
    kind: String,
    title: Option<String>,
    entries: Vec<MeasurementData>,
}

impl MeasurementBuilder {
    pub fn new(id: &str, kind: &str) -> Self {
        Self {
            id: id.to_string(),
            kind: kind.to_string(),
            title: None,
            entries: Vec::new(),
        }
    }

    pub fn title(mut self, title: &str) -> Self {
        self.title = Some(title.to_string());
        self
    }

    /// Add an entry with `x` and `y` variables
    pub fn xy(mut self, x: Vec<f64>, y: Vec<f64>) -> Self {
        let variables = Variables::from_iter([
            ("x".to_string(), Variable::new(x)),
            ("y".to_string(), Variable::new(y)),
        ]);
        self.entries.push(MeasurementData::new(variables));
        self
    }

    /// Add an entry with arbitrary variables
    pub fn entry(mut self, variables: Vec<(&str, NumericArray)>) -> Self {
        let variables: Variables = variables
            .into_iter()
            .map(|(name, data)| (name.to_string(), Variable::new(data)))
            .collect();
        self.entries.push(MeasurementData::new(variables));
        self
    }

    /// Attach peaks to the last entry
    pub fn peaks(mut self, peaks: Vec<IrPeak>) -> Self {
        if let Some(entry) = self.entries.last_mut() {
            entry.peaks = Some(peaks);
        }
        self
    }

    pub fn build(self) -> Measurement {
        let mut measurement = Measurement::new(self.id, self.kind);
        measurement.title = self.title;
        measurement.data = self.entries;
        measurement
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_measurement_builder() {
        let m = MeasurementBuilder::new("m1", "ir")
            .title("Ethanol")
            .xy(vec![1.0, 2.0], vec![3.0, 4.0])
            .build();

        assert_eq!(m.id, "m1");
        assert_eq!(m.kind, "ir");
        assert_eq!(m.display_name(), "Ethanol");
        assert_eq!(m.data[0].point_count(), 2);
    }
}
