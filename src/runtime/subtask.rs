//! Subtask metadata handed to the runtime at registration.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Domain a subtask produces data for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DomainType {
    Code,
    Ticket,
    CodeReview,
    Cicd,
    CodeQuality,
    Cross,
}

impl fmt::Display for DomainType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DomainType::Code => "CODE",
            DomainType::Ticket => "TICKET",
            DomainType::CodeReview => "CODE_REVIEW",
            DomainType::Cicd => "CICD",
            DomainType::CodeQuality => "CODE_QUALITY",
            DomainType::Cross => "CROSS",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for DomainType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().replace('-', "_").as_str() {
            "CODE" => Ok(DomainType::Code),
            "TICKET" => Ok(DomainType::Ticket),
            "CODE_REVIEW" => Ok(DomainType::CodeReview),
            "CICD" => Ok(DomainType::Cicd),
            "CODE_QUALITY" => Ok(DomainType::CodeQuality),
            "CROSS" => Ok(DomainType::Cross),
            other => Err(format!(
                "Unsupported domain type: '{}'. Supported: CODE, TICKET, CODE_REVIEW, CICD, CODE_QUALITY, CROSS",
                other
            )),
        }
    }
}

/// Static description of a subtask. Pure configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubTaskMeta {
    pub name: String,
    pub enabled_by_default: bool,
    pub description: String,
    pub domain_types: Vec<DomainType>,
}

impl SubTaskMeta {
    pub fn covers(&self, domain: DomainType) -> bool {
        self.domain_types.contains(&domain)
    }
}
