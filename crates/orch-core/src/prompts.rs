//! Builder and reviewer prompt text.
//!
//! Both builders are pure: the same `(ticket_id, ticket_md, refs)` always
//! yields byte-identical text.

/// Reference documents every run points both roles at, relative to the
/// client repository root.
pub const DEFAULT_REFS: &[&str] = &[
    "AI_RUNBOOK.md (optional; may be empty or absent)",
    "orchestration/contracts/ticket.contract.md",
    "orchestration/policies/human_interrupt_rules.md",
    "orchestration/clients/social/plan.lock.json (may be placeholder)",
    "orchestration/clients/social/schema.truth_table.md (may be placeholder)",
];

pub fn default_refs() -> Vec<String> {
    DEFAULT_REFS.iter().map(|r| r.to_string()).collect()
}

#[derive(Debug, Clone, Copy)]
pub struct PromptInput<'a> {
    pub ticket_id: &'a str,
    pub ticket_md: &'a str,
    pub refs: &'a [String],
}

fn bullets(refs: &[String]) -> impl Iterator<Item = String> + '_ {
    refs.iter().map(|r| format!("- {r}"))
}

pub fn build_builder_prompt(input: PromptInput<'_>) -> String {
    let mut lines: Vec<String> = vec![
        "# ORCHESTRATOR — CLAUDE BUILDER PROMPT".into(),
        String::new(),
        format!("Ticket ID: {}", input.ticket_id),
        String::new(),
        "ROLE: You are the BUILDER. Implement the ticket exactly.".into(),
        "- Obey scope, files-touched, verification steps, and stop condition.".into(),
        "- Do not refactor outside scope.".into(),
        "- Work inside the repo where the ticket lives (the current working repo).".into(),
        "- Only modify files listed under Files touched.".into(),
        "- If a path is ambiguous, STOP and ask for clarification.".into(),
        String::new(),
        "## Required references".into(),
    ];
    lines.extend(bullets(input.refs));
    lines.extend([
        String::new(),
        "---".into(),
        "## Ticket".into(),
        input.ticket_md.to_string(),
        String::new(),
        "---".into(),
        "## Output format".into(),
        "1) Plan".into(),
        "2) Exact commands + edits".into(),
        "3) Verification output".into(),
        "4) STOP".into(),
        String::new(),
    ]);
    lines.join("\n")
}

pub fn build_reviewer_prompt(input: PromptInput<'_>) -> String {
    let mut lines: Vec<String> = vec![
        "# ORCHESTRATOR — CODEX REVIEWER PROMPT".into(),
        String::new(),
        format!("Ticket ID: {}", input.ticket_id),
        String::new(),
        "ROLE: You are the REVIEWER + PLANNER (Codex).".into(),
        "You must output ONLY ONE of:".into(),
        "- VERDICT: APPROVED".into(),
        "- VERDICT: BLOCKED (list exact issues + violated rule/doc)".into(),
        "- VERDICT: ESCALATE (include payload)".into(),
        String::new(),
        "## Reference documents (for context)".into(),
        "These files exist in the client repo. Items marked \"(optional)\" or \"(may be placeholder)\" are not required for approval.".into(),
    ];
    lines.extend(bullets(input.refs));
    lines.extend([
        String::new(),
        "**IMPORTANT:** Do NOT block a ticket solely because a reference file is empty or marked optional.".into(),
        "Only block if the ticket's acceptance criteria, verification steps, or scope are violated.".into(),
        String::new(),
        "---".into(),
        "## Ticket".into(),
        input.ticket_md.to_string(),
        String::new(),
        "---".into(),
        "## Review rubric".into(),
        "- Files touched match ticket scope".into(),
        "- No extra modifications outside scope".into(),
        "- Acceptance criteria verified (based on builder output and evidence)".into(),
        "- Stop condition respected".into(),
        "- Analysis-only tickets (Files Touched: None) require NO file changes".into(),
        String::new(),
    ]);
    lines.join("\n")
}
