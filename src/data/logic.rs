use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Every 2-input boolean combination, shared by all gates.
pub const LOGIC_INPUTS: [[f64; 2]; 4] = [[0.0, 0.0], [0.0, 1.0], [1.0, 0.0], [1.0, 1.0]];

/// Training rows: `inputs[i]` should produce `expected[i]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    pub inputs: Vec<Vec<f64>>,
    pub expected: Vec<Vec<f64>>,
}

impl Dataset {
    pub fn len(&self) -> usize {
        self.inputs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inputs.is_empty()
    }

    pub fn input_width(&self) -> usize {
        self.inputs.first().map_or(0, Vec::len)
    }

    pub fn output_width(&self) -> usize {
        self.expected.first().map_or(0, Vec::len)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogicGate {
    Xor,
    And,
    Or,
}

impl LogicGate {
    pub const ALL: [LogicGate; 3] = [LogicGate::Xor, LogicGate::And, LogicGate::Or];

    /// Truth-table column, in `LOGIC_INPUTS` order.
    pub fn truth_table(&self) -> [f64; 4] {
        match self {
            LogicGate::Xor => [0.0, 1.0, 1.0, 0.0],
            LogicGate::And => [0.0, 0.0, 0.0, 1.0],
            LogicGate::Or => [0.0, 1.0, 1.0, 1.0],
        }
    }

    pub fn dataset(&self) -> Dataset {
        Dataset {
            inputs: LOGIC_INPUTS.iter().map(|row| row.to_vec()).collect(),
            expected: self.truth_table().iter().map(|&y| vec![y]).collect(),
        }
    }
}

impl fmt::Display for LogicGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LogicGate::Xor => "XOR",
            LogicGate::And => "AND",
            LogicGate::Or => "OR",
        };
        f.write_str(name)
    }
}

impl FromStr for LogicGate {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "xor" => Ok(LogicGate::Xor),
            "and" => Ok(LogicGate::And),
            "or" => Ok(LogicGate::Or),
            other => Err(format!("Unknown logic gate {other:?}, expected one of xor, and, or")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tables_follow_boolean_semantics() {
        for gate in LogicGate::ALL {
            let data = gate.dataset();
            assert_eq!(data.len(), 4);
            assert_eq!((data.input_width(), data.output_width()), (2, 1));

            for (input, expected) in data.inputs.iter().zip(&data.expected) {
                let (a, b) = (input[0] == 1.0, input[1] == 1.0);
                let truth = match gate {
                    LogicGate::Xor => a ^ b,
                    LogicGate::And => a && b,
                    LogicGate::Or => a || b,
                };
                assert_eq!(expected[0], if truth { 1.0 } else { 0.0 }, "{gate} {input:?}");
            }
        }
    }

    #[test]
    fn parses_case_insensitively() {
        assert_eq!("XOR".parse::<LogicGate>(), Ok(LogicGate::Xor));
        assert_eq!("and".parse::<LogicGate>(), Ok(LogicGate::And));
        assert_eq!("Or".parse::<LogicGate>(), Ok(LogicGate::Or));
        assert!("nand".parse::<LogicGate>().is_err());
        assert_eq!(LogicGate::Or.to_string(), "OR");
    }
}
