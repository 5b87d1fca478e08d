//! Stage registry and category routing table.
//!
//! The registry is a fixed, ordered catalog of seven stage descriptors. Indices
//! are stable for the lifetime of the process and the catalog is shared
//! read-only by every concurrent diagnosis.
//!
//! The category routing table lives next to the catalog so the whole routing
//! surface (category -> start index -> descriptor) can be audited in one place.

use serde::Serialize;

use crate::classifier::ProblemCategory;

/// Static description of one pipeline stage.
///
/// `trigger` and `chemistry` are documentary: the executor never evaluates
/// them, it only carries `chemistry` through to results for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StageDescriptor {
    /// Stable identifier, unique within the registry.
    pub id: &'static str,
    /// Opaque inference backend reference passed to the model service.
    pub model: &'static str,
    /// Human role label used in prompts and reports.
    pub role: &'static str,
    /// Advisory description of when this stage is most useful.
    pub trigger: &'static str,
    /// Ordered task list; the first entry is the primary task.
    pub tasks: &'static [&'static str],
    /// Label of the artifact this stage produces.
    pub output: &'static str,
    /// Cosmetic annotation carried through for display.
    pub chemistry: &'static str,
}

impl StageDescriptor {
    /// The first task in the list, or an empty string for a task-less stage.
    pub fn primary_task(&self) -> &'static str {
        self.tasks.first().copied().unwrap_or("")
    }
}

/// Number of stages in the registry.
pub const REGISTRY_SIZE: usize = 7;

static STAGES: [StageDescriptor; REGISTRY_SIZE] = [
    StageDescriptor {
        id: "syntax",
        model: "falcon:7b",
        role: "Syntax Specialist",
        trigger: "parse failures, unexpected tokens, malformed JSX",
        tasks: &[
            "Locate the exact token or construct that breaks parsing",
            "Explain why the parser rejects it",
            "Propose the minimal edit that restores valid syntax",
        ],
        output: "syntax_fixes",
        chemistry: "Catalyst: lowers the activation energy of a broken parse",
    },
    StageDescriptor {
        id: "types",
        model: "qwen2.5-coder:7b",
        role: "Type System Analyst",
        trigger: "type errors, TS diagnostic codes, unassignable values",
        tasks: &[
            "Identify the conflicting types and where each is introduced",
            "Trace the inference chain that produced the mismatch",
            "Suggest annotations, narrowing, or signature changes that resolve it",
        ],
        output: "type_resolutions",
        chemistry: "Reagent: bonds values to the types that hold them",
    },
    StageDescriptor {
        id: "build",
        model: "llama3.2:3b",
        role: "Build Fast Responder",
        trigger: "build and compile failures, unknown problems",
        tasks: &[
            "Triage the failure quickly and name the most likely cause",
            "Check bundler, compiler, and toolchain configuration",
            "List the commands to reproduce and verify the fix",
        ],
        output: "build_triage",
        chemistry: "Fast reaction: exothermic first pass over the failure",
    },
    StageDescriptor {
        id: "dependency",
        model: "deepseek-coder:6.7b",
        role: "Dependency Coordinator",
        trigger: "missing modules, peer dependency and version conflicts",
        tasks: &[
            "Determine which package or import path cannot be resolved",
            "Check declared versions against peer requirements",
            "Give the exact install, upgrade, or resolution commands",
        ],
        output: "dependency_plan",
        chemistry: "Chelator: binds loose packages into a stable complex",
    },
    StageDescriptor {
        id: "architecture",
        model: "deepseek-r1:8b",
        role: "Architecture Strategist",
        trigger: "design questions, refactors, circular imports",
        tasks: &[
            "Map the modules and boundaries involved in the problem",
            "Identify structural causes such as cycles or leaky layers",
            "Outline an incremental refactor with clear checkpoints",
        ],
        output: "architecture_notes",
        chemistry: "Polymerizer: links small fixes into lasting structure",
    },
    StageDescriptor {
        id: "review",
        model: "codellama:7b",
        role: "Code Reviewer",
        trigger: "verification of proposed fixes",
        tasks: &[
            "Review the fixes proposed so far for correctness",
            "Flag regressions, edge cases, and missing tests",
            "Rank the remaining risks",
        ],
        output: "review_findings",
        chemistry: "Buffer: keeps the mixture from swinging too far",
    },
    StageDescriptor {
        id: "synthesis",
        model: "mistral:7b",
        role: "Synthesis Lead",
        trigger: "final consolidation of all findings",
        tasks: &[
            "Merge all prior findings into one ordered action plan",
            "Resolve contradictions between earlier stages",
            "State the single next step the developer should take",
        ],
        output: "action_plan",
        chemistry: "Precipitate: the solid result that settles out",
    },
];

/// Category -> start index. Unknown problems start at the fast build stage.
const ROUTING: [(ProblemCategory, usize); 6] = [
    (ProblemCategory::Syntax, 0),
    (ProblemCategory::Type, 1),
    (ProblemCategory::Build, 2),
    (ProblemCategory::Dependency, 3),
    (ProblemCategory::Complex, 4),
    (ProblemCategory::Unknown, DEFAULT_START_INDEX),
];

/// Start index used when a category has no routing entry.
pub const DEFAULT_START_INDEX: usize = 2;

/// The full, ordered stage catalog.
pub fn stages() -> &'static [StageDescriptor] {
    &STAGES
}

/// Look up a stage by registry index.
pub fn stage_at(index: usize) -> Option<&'static StageDescriptor> {
    STAGES.get(index)
}

/// Look up a stage by identifier.
pub fn find_stage(id: &str) -> Option<&'static StageDescriptor> {
    STAGES.iter().find(|s| s.id == id)
}

/// Registry index at which a diagnosis of `category` begins.
pub fn start_index(category: ProblemCategory) -> usize {
    ROUTING
        .iter()
        .find(|(c, _)| *c == category)
        .map(|(_, idx)| *idx)
        .unwrap_or(DEFAULT_START_INDEX)
}
