use serde::{Deserialize, Serialize};

/// A user's role label. Calls are always cross-cohort.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Cohort {
    Sales,
    Customers,
}

impl Cohort {
    pub fn opposite(self) -> Cohort {
        match self {
            Cohort::Sales => Cohort::Customers,
            Cohort::Customers => Cohort::Sales,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Cohort::Sales => "sales",
            Cohort::Customers => "customers",
        }
    }
}

impl std::fmt::Display for Cohort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opposite_flips() {
        assert_eq!(Cohort::Sales.opposite(), Cohort::Customers);
        assert_eq!(Cohort::Customers.opposite(), Cohort::Sales);
    }

    #[test]
    fn serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Cohort::Sales).unwrap(), "\"sales\"");
        assert_eq!(serde_json::to_string(&Cohort::Customers).unwrap(), "\"customers\"");
    }
}
