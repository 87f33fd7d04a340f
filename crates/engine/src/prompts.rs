pub struct PhasePrompts;

impl PhasePrompts {
    pub fn plan(issue_key: &str, summary: &str, description: &str) -> String {
        format!(
            r#"You are analyzing a bug tracked as {issue_key}. Create a detailed fix plan.

## Issue
**Summary:** {summary}
**Description:** {description}

## Required Output
The plan should include:
1. Root cause analysis
2. Files to modify/create
3. Step-by-step fix steps
4. Potential risks
5. Estimated complexity (S/M/L/XL)

Do NOT implement anything yet. Only create the plan."#,
            issue_key = issue_key,
            summary = summary,
            description = description
        )
    }

    pub fn implement(issue_key: &str, plan: &str) -> String {
        format!(
            r#"Implement the approved fix for {issue_key} according to the plan.

## Plan
{plan}

## Instructions
1. Follow the plan step by step
2. Keep changes minimal and focused on the fix
3. Write tests if applicable
4. Commit your changes on the current branch

Start implementation now."#,
            issue_key = issue_key,
            plan = plan
        )
    }

    pub fn review(issue_key: &str) -> String {
        format!(
            r#"Perform a security and code review of the committed changes for {issue_key}.

## Review Criteria
1. Correctness - does the change fix the issue?
2. Security concerns (injection, secrets, unsafe input handling)
3. Code quality and style
4. Tests - are they adequate?
5. Breaking changes

## Output
If the changes are sound, respond with: APPROVED
If anything needs fixing first, respond with: FINDINGS and list them."#,
            issue_key = issue_key
        )
    }
}
