//! Markdown rendering of a ranking, one collapsible justification block per resume.

use std::fmt::Write;

use crate::models::ranking::RankingResponse;

pub fn render_markdown(response: &RankingResponse) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail.
    let _ = writeln!(out, "## Ranked Resumes\n");
    let _ = writeln!(out, "Job description: {}\n", response.job_description);

    for resume in &response.results {
        let _ = write!(
            out,
            "### {}. {} — Score: {}/100",
            resume.rank, resume.name, resume.score
        );
        if !resume.score_parsed {
            out.push_str(" (score could not be read from the reply)");
        }
        out.push_str("\n\n<details>\n<summary>View Justification</summary>\n\n");
        out.push_str(resume.justification.trim_end());
        out.push_str("\n\n</details>\n\n");
    }
    out
}
