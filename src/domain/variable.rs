// Variable domain model
use serde::{Deserialize, Deserializer, Serialize};

const VALID_RESPONSE_CODE: &str = "OK";

/// Value read from the provider, classified once at parse time.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
#[serde(untagged)]
pub enum VariableValue {
    Numeric(f64),
    Boolean(bool),
    #[default]
    Unavailable,
}

impl VariableValue {
    pub fn from_json(value: Option<&serde_json::Value>) -> Self {
        match value {
            Some(serde_json::Value::Bool(b)) => VariableValue::Boolean(*b),
            Some(serde_json::Value::Number(n)) => n
                .as_f64()
                .map(VariableValue::Numeric)
                .unwrap_or(VariableValue::Unavailable),
            _ => VariableValue::Unavailable,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            VariableValue::Numeric(v) => Some(*v),
            _ => None,
        }
    }

    pub fn is_available(&self) -> bool {
        !matches!(self, VariableValue::Unavailable)
    }
}

fn deserialize_value<'de, D>(deserializer: D) -> Result<VariableValue, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(VariableValue::from_json(raw.as_ref()))
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Variable {
    pub name: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub data_type: String,
    #[serde(default, deserialize_with = "deserialize_value")]
    pub last_value: VariableValue,
    #[serde(default)]
    pub response_code: String,
    #[serde(default)]
    pub min: Option<f64>,
    #[serde(default)]
    pub max: Option<f64>,
}

impl Variable {
    #[cfg(test)]
    pub fn new(name: impl Into<String>, data_type: impl Into<String>, last_value: VariableValue) -> Self {
        Self {
            name: name.into(),
            address: String::new(),
            data_type: data_type.into(),
            last_value,
            response_code: VALID_RESPONSE_CODE.to_string(),
            min: None,
            max: None,
        }
    }

    #[cfg(test)]
    pub fn with_response_code(mut self, code: impl Into<String>) -> Self {
        self.response_code = code.into();
        self
    }

    #[cfg(test)]
    pub fn with_bounds(mut self, min: f64, max: f64) -> Self {
        self.min = Some(min);
        self.max = Some(max);
        self
    }

    /// A record carries a readable value only when the provider answered OK
    /// and the value is present.
    pub fn is_valid(&self) -> bool {
        self.response_code == VALID_RESPONSE_CODE && self.last_value.is_available()
    }

    pub fn is_real(&self) -> bool {
        self.data_type.contains("REAL")
    }

    /// Presentation string consumed by the visual collaborators.
    pub fn display_value(&self) -> Option<String> {
        match self.last_value {
            VariableValue::Boolean(true) => Some("TRUE".to_string()),
            VariableValue::Boolean(false) => Some("FALSE".to_string()),
            VariableValue::Numeric(v) if self.is_real() => Some(format!("{:.2}", v)),
            VariableValue::Numeric(v) => Some(format!("{}", round_half_up(v))),
            VariableValue::Unavailable => None,
        }
    }
}

// Halves round toward +inf, so -2.5 becomes -2.
fn round_half_up(v: f64) -> i64 {
    (v + 0.5).floor() as i64
}

#[derive(Debug, Clone, Deserialize)]
pub struct VariableSnapshot {
    #[serde(default)]
    pub details: Vec<Variable>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_snapshot() {
        let body = r#"{
            "details": [
                {"name": "T1", "address": "DB1.DBD0", "dataType": "REAL", "lastValue": 12.345, "responseCode": "OK", "min": 1.0, "max": 20.5},
                {"name": "B1", "address": "DB1.DBX4.0", "dataType": "BOOL", "lastValue": true, "responseCode": "OK"},
                {"name": "W1", "dataType": "WORD", "lastValue": null, "responseCode": "OK"},
                {"name": "S1", "dataType": "STRING", "lastValue": "abc", "responseCode": "OK"}
            ],
            "count": 4
        }"#;

        let snapshot: VariableSnapshot = serde_json::from_str(body).unwrap();
        assert_eq!(snapshot.details.len(), 4);
        assert_eq!(snapshot.details[0].last_value, VariableValue::Numeric(12.345));
        assert_eq!(snapshot.details[0].min, Some(1.0));
        assert_eq!(snapshot.details[1].last_value, VariableValue::Boolean(true));
        assert_eq!(snapshot.details[2].last_value, VariableValue::Unavailable);
        assert_eq!(snapshot.details[3].last_value, VariableValue::Unavailable);
        assert_eq!(snapshot.details[2].address, "");
    }

    #[test]
    fn test_missing_last_value_is_unavailable() {
        let var: Variable =
            serde_json::from_str(r#"{"name": "X", "dataType": "INT", "responseCode": "OK"}"#).unwrap();
        assert!(!var.is_valid());
    }

    #[test]
    fn test_validity() {
        assert!(Variable::new("A", "INT", VariableValue::Numeric(1.0)).is_valid());
        assert!(!Variable::new("A", "INT", VariableValue::Numeric(1.0))
            .with_response_code("ERROR")
            .is_valid());
        assert!(!Variable::new("A", "INT", VariableValue::Unavailable).is_valid());
    }

    #[test]
    fn test_display_value() {
        let real = Variable::new("T1", "REAL", VariableValue::Numeric(12.345));
        assert_eq!(real.display_value().as_deref(), Some("12.35"));

        let lreal = Variable::new("T2", "LREAL", VariableValue::Numeric(3.0));
        assert_eq!(lreal.display_value().as_deref(), Some("3.00"));

        let int = Variable::new("I1", "INT", VariableValue::Numeric(41.6));
        assert_eq!(int.display_value().as_deref(), Some("42"));

        let half = Variable::new("I2", "INT", VariableValue::Numeric(-2.5));
        assert_eq!(half.display_value().as_deref(), Some("-2"));

        let on = Variable::new("B1", "BOOL", VariableValue::Boolean(true));
        assert_eq!(on.display_value().as_deref(), Some("TRUE"));

        let off = Variable::new("B2", "BOOL", VariableValue::Boolean(false));
        assert_eq!(off.display_value().as_deref(), Some("FALSE"));
    }
}
