//! Type-ahead filtering of example inputs

/// Starter prompts offered while no feedback loop is active
pub const COMMON_PROMPTS: &[&str] = &[
    "Draft a proposal for seismic borehole rehabilitation in a remote location",
    "Generate a proposal for the installation of a broadband seismic sensor",
    "Write a proposal for drilling a compliant borehole to IMS standards",
    "Create a technical bid for seismic station upgrade in Africa",
    "Generate a proposal for revalidating IMS auxiliary stations",
    "Draft a TOR-compliant borehole rehabilitation project plan",
    "Write a bid to conduct leak testing and casing inspection",
    "Draft a proposal for seismic monitoring infrastructure installation",
    "Generate a proposal involving down-hole camera assessment",
    "Develop a plan for verticality testing and acceptance logging",
    "Create a borehole drilling and cementing work schedule",
    "Draft a response for borehole construction with earthing specs",
    "Write a technical proposal for geotechnical survey and site prep",
    "Generate a proposal involving local and international partnerships",
    "Create a drilling operation plan for CTBTO compliance",
    "Write a response plan for borehole flushing and water testing",
    "Develop a technical approach for pressure testing boreholes",
    "Draft a proposal for borehole site rehabilitation and clearing",
    "Create a final report outline for borehole acceptance testing",
    "Write a bid involving collaboration with licensed drilling contractors",
];

/// Canned reviewer feedback offered while a draft awaits review
pub const FEEDBACK_OPTIONS: &[&str] = &[
    "Approve",
    "Too vague",
    "Too generic",
    "Not aligned with scope",
    "Needs more technical detail",
    "Not suitable for client",
    "Missing cost breakdown",
    "Incorrect format",
    "Not aligned with project timeline",
    "Uses unclear terminology",
    "Requires clearer deliverables",
    "No reference to project location",
    "Insufficient technical justification",
    "Overly verbose",
    "Missing compliance section",
    "Incomplete project scope",
    "Too informal in tone",
    "Lacks risk assessment",
    "Needs a stronger conclusion",
    "Missing key qualifications",
    "Does not address exclusions",
];

/// Case-insensitive substring match over `candidates`, original order kept.
///
/// Empty input yields no suggestions.
pub fn filter_suggestions<'a, S>(input: &str, candidates: &'a [S]) -> Vec<&'a str>
where
    S: AsRef<str>,
{
    if input.is_empty() {
        return Vec::new();
    }
    let needle = input.to_lowercase();
    candidates
        .iter()
        .map(|candidate| candidate.as_ref())
        .filter(|candidate| candidate.to_lowercase().contains(&needle))
        .collect()
}
