use std::fmt::Display;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum PlanType {
    Recurring,
    OneTime,
}

impl PlanType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlanType::Recurring => "recurring",
            PlanType::OneTime => "one_time",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "recurring" => Some(PlanType::Recurring),
            "one_time" => Some(PlanType::OneTime),
            _ => None,
        }
    }
}

impl Display for PlanType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
