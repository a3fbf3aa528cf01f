//! Prompt templates for per-file generation.

/// Prompt for one file named by a check.
///
/// README gets a dedicated template so the result reads as project
/// documentation rather than a restatement of the check.
pub fn file_prompt(filename: &str, brief: &str, check: &str) -> String {
    if filename.eq_ignore_ascii_case("readme.md") {
        readme_prompt(brief)
    } else {
        format!(
            "Generate professional, well-structured content for {filename} based on this \
             project requirement: {brief}. Check requirement: {check}"
        )
    }
}

fn readme_prompt(brief: &str) -> String {
    format!(
        "Create a professional README.md file for this project with the following requirements:

Project: {brief}

Include these sections:
1. Project title and brief description
2. Features/Overview
3. Installation instructions
4. Usage guide
5. Technologies used
6. Contributing guidelines
7. License information

Make it well-structured, professional, and include proper markdown formatting. \
Focus on clarity and completeness."
    )
}

/// Commit message for a generated file.
pub fn commit_message(filename: &str) -> String {
    format!("Update {filename} via AI task")
}
