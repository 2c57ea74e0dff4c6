//! Static description of the agents behind the pipeline

use serde::Serialize;

/// Public description of one agent
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct AgentDescriptor {
    pub name: &'static str,
    pub description: &'static str,
    pub status: &'static str,
}

const CATALOG: [AgentDescriptor; 5] = [
    AgentDescriptor {
        name: "RequirementsAgent",
        description: "Analyzes and breaks down programming requirements",
        status: "active",
    },
    AgentDescriptor {
        name: "CodegenAgent",
        description: "Generates code based on specifications",
        status: "active",
    },
    AgentDescriptor {
        name: "ReviewAgent",
        description: "Reviews code for quality and style compliance",
        status: "active",
    },
    AgentDescriptor {
        name: "OptimizationAgent",
        description: "Optimizes code for performance and readability",
        status: "active",
    },
    AgentDescriptor {
        name: "TestingAgent",
        description: "Generates test cases and test code",
        status: "active",
    },
];

pub fn agent_catalog() -> &'static [AgentDescriptor] {
    &CATALOG
}
