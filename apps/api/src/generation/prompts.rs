//! Prompt assembly for the generation endpoint.
//!
//! Two request shapes: extension requests carry scraped page content and ask
//! the model to identify the job from it; manual/link requests carry the
//! user-entered fields with extract-from-resume fallbacks. Oversized inputs
//! are capped before interpolation.

use crate::generation::LetterSnapshot;

/// Captured page text is capped before interpolation.
pub const PAGE_CONTENT_BUDGET: usize = 12_000;
/// Manually supplied job descriptions are capped before interpolation.
pub const JOB_DESCRIPTION_BUDGET: usize = 8_000;

/// The system instruction shared by both request shapes; only the
/// job-context rule differs.
pub fn system_instruction(snapshot: &LetterSnapshot, extension: bool) -> String {
    let job_context_rule = if extension {
        "Analyze the PAGE CONTENT provided to identify the job position, company name, \
         job requirements, and company culture."
    } else {
        "If a Job Posting URL is provided, infer what you can about the company and position."
    };

    format!(
        "You are an expert career coach and professional writer.\n\
         Your task is to write a flawless, human-sounding cover letter.\n\
         The letter should be written in {language}.\n\
         The tone should be {tone}.\n\
         The length should be approximately {length}.\n\
         \n\
         EXTRACTION AND RESEARCH RULES:\n\
         1. **Resume Analysis**: Analyze the resume provided. EXTRACT the candidate's full name \
         and contact information from the resume.\n\
         2. **Job Context**: {job_context_rule}\n\
         3. **Company Research**: Use your knowledge about the company to understand their \
         values and mission. Incorporate relevant details when appropriate.\n\
         \n\
         FORMATTING RULES (Strictly Follow):\n\
         1. **Format**: Use a standard professional business letter format.\n\
         2. **Header**: Include the Candidate's Name (Extracted) and Contact Info \
         (email/phone extracted from resume) at the top.\n\
         3. **Date**: Include today's date.\n\
         4. **Recipient**: Use \"Dear Hiring Manager,\" or a specific name if found.\n\
         5. **Body**: Start with a strong opening that connects the candidate's passion to the \
         company's mission. Avoid \"I am writing to apply\". Highlight relevant skills from the \
         resume that match the job description.\n\
         6. **Closing**: Use \"Sincerely,\" followed by a blank line for signature, followed by \
         the Candidate's Full Name. Do NOT use placeholders like \"[Your Name]\".\n\
         \n\
         STYLE RULES:\n\
         1. Ensure the text flows naturally and does not sound robotic.\n\
         2. If additional instructions are provided, strictly follow them.\n",
        language = or_default(&snapshot.language, "English"),
        tone = or_default(&snapshot.tone, "Professional"),
        length = or_default(&snapshot.length, "Standard (350 words)"),
    )
}

pub fn user_prompt(snapshot: &LetterSnapshot, extension: bool) -> String {
    if extension {
        extension_prompt(snapshot)
    } else {
        manual_prompt(snapshot)
    }
}

/// Extension shape: the model identifies the job from scraped page content.
fn extension_prompt(snapshot: &LetterSnapshot) -> String {
    let page_content = truncate_chars(
        snapshot.page_content.as_deref().unwrap_or_default(),
        PAGE_CONTENT_BUDGET,
    );

    format!(
        "TASK: Analyze the web page content below to extract job details, then write a \
         tailored cover letter.\n\
         \n\
         PAGE URL: {url}\n\
         PAGE TITLE: {title}\n\
         \n\
         PAGE CONTENT (scraped from job posting page):\n\
         {page_content}\n\
         \n\
         ---\n\
         \n\
         CANDIDATE'S RESUME:\n\
         {resume}\n\
         \n\
         ---\n\
         \n\
         INSTRUCTIONS:\n\
         1. First, analyze the PAGE CONTENT to identify the company name, the job title, key \
         requirements and qualifications, and company values or culture if mentioned.\n\
         2. Then, write a professional cover letter that addresses the specific job \
         requirements found in the page content, highlights relevant experience from the \
         resume, shows enthusiasm for the specific company and role, and is written in \
         {language}.\n\
         \n\
         Please write the cover letter now.\n",
        url = or_default(snapshot.page_url.as_deref().unwrap_or_default(), "Not provided"),
        title = or_default(snapshot.page_title.as_deref().unwrap_or_default(), "Not provided"),
        resume = snapshot.resume_text,
        language = or_default(&snapshot.language, "English"),
    )
}

/// Manual/link shape: user-entered fields with extract-from-resume fallbacks.
fn manual_prompt(snapshot: &LetterSnapshot) -> String {
    let mut prompt = format!(
        "INPUT DATA:\n\
         My Name: {name}\n\
         Target Company: {company}\n\
         Target Position: {position}\n",
        name = or_default(&snapshot.full_name, "(Please EXTRACT from Resume)"),
        company = or_default(
            &snapshot.company_name,
            "(Please EXTRACT from Job Description if possible)"
        ),
        position = or_default(
            &snapshot.job_title,
            "(Please EXTRACT from Job Description if possible)"
        ),
    );

    if !snapshot.job_link.is_empty() {
        prompt.push_str(&format!("\nJob Posting URL: {}\n", snapshot.job_link));
    }

    if !snapshot.job_description.is_empty() {
        prompt.push_str(&format!(
            "\nJOB DESCRIPTION:\n{}\n\nIMPORTANT: Use the job description above to understand \
             the role requirements. Match the candidate's experience to these specific \
             requirements.\n",
            truncate_chars(&snapshot.job_description, JOB_DESCRIPTION_BUDGET)
        ));
    } else if !snapshot.job_link.is_empty() {
        prompt.push_str(
            "\nNote: Please use the URL to infer company name and position, and use any \
             knowledge you have about this company.\n",
        );
    }

    if snapshot.resume_data.is_some() {
        prompt.push_str(
            "\nPlease find my resume attached. Use it to extract my name and contact info and \
             to analyze my experience.\n",
        );
    } else {
        prompt.push_str(&format!("\nMy Resume Content:\n{}\n", snapshot.resume_text));
    }

    if !snapshot.additional_instructions.is_empty() {
        prompt.push_str(&format!(
            "\nAdditional Instructions: {}\n",
            snapshot.additional_instructions
        ));
    }

    prompt.push_str("\nPlease write the cover letter now based on the instructions.\n");
    prompt
}

fn or_default<'a>(value: &'a str, fallback: &'a str) -> &'a str {
    if value.is_empty() {
        fallback
    } else {
        value
    }
}

fn truncate_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manual_snapshot() -> LetterSnapshot {
        LetterSnapshot {
            full_name: "Jane Doe".to_string(),
            company_name: "Acme".to_string(),
            job_title: "Engineer".to_string(),
            resume_text: "Ten years of robotics.".to_string(),
            language: "English".to_string(),
            tone: "Professional".to_string(),
            length: "Standard (350 words)".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_manual_prompt_uses_provided_fields() {
        let prompt = user_prompt(&manual_snapshot(), false);
        assert!(prompt.contains("My Name: Jane Doe"));
        assert!(prompt.contains("Target Company: Acme"));
        assert!(prompt.contains("My Resume Content:\nTen years of robotics."));
    }

    #[test]
    fn test_manual_prompt_falls_back_to_extraction_hints() {
        let mut snapshot = manual_snapshot();
        snapshot.full_name.clear();
        snapshot.company_name.clear();

        let prompt = user_prompt(&snapshot, false);
        assert!(prompt.contains("My Name: (Please EXTRACT from Resume)"));
        assert!(prompt.contains("Target Company: (Please EXTRACT from Job Description if possible)"));
    }

    #[test]
    fn test_manual_prompt_truncates_job_description() {
        let mut snapshot = manual_snapshot();
        snapshot.job_description = "x".repeat(JOB_DESCRIPTION_BUDGET + 500);

        let prompt = user_prompt(&snapshot, false);
        assert!(prompt.contains(&"x".repeat(JOB_DESCRIPTION_BUDGET)));
        assert!(!prompt.contains(&"x".repeat(JOB_DESCRIPTION_BUDGET + 1)));
        assert!(prompt.contains("IMPORTANT: Use the job description above"));
    }

    #[test]
    fn test_manual_prompt_with_link_but_no_description_adds_inference_note() {
        let mut snapshot = manual_snapshot();
        snapshot.job_link = "https://jobs.example/1".to_string();

        let prompt = user_prompt(&snapshot, false);
        assert!(prompt.contains("Job Posting URL: https://jobs.example/1"));
        assert!(prompt.contains("use the URL to infer company name and position"));
    }

    #[test]
    fn test_attachment_snapshot_references_attached_resume() {
        let mut snapshot = manual_snapshot();
        snapshot.resume_text.clear();
        snapshot.resume_data = Some("QkFTRTY0".to_string());

        let prompt = user_prompt(&snapshot, false);
        assert!(prompt.contains("resume attached"));
        assert!(!prompt.contains("My Resume Content:"));
    }

    #[test]
    fn test_extension_prompt_embeds_capped_page_content() {
        let mut snapshot = manual_snapshot();
        snapshot.page_content = Some("y".repeat(PAGE_CONTENT_BUDGET + 500));
        snapshot.page_url = Some("https://jobs.example/1".to_string());
        snapshot.page_title = Some("Engineer - Acme".to_string());

        let prompt = user_prompt(&snapshot, true);
        assert!(prompt.contains("PAGE URL: https://jobs.example/1"));
        assert!(prompt.contains("PAGE TITLE: Engineer - Acme"));
        assert!(prompt.contains(&"y".repeat(PAGE_CONTENT_BUDGET)));
        assert!(!prompt.contains(&"y".repeat(PAGE_CONTENT_BUDGET + 1)));
    }

    #[test]
    fn test_system_instruction_branches_on_request_shape() {
        let snapshot = manual_snapshot();
        let manual = system_instruction(&snapshot, false);
        let extension = system_instruction(&snapshot, true);

        assert!(manual.contains("Job Posting URL"));
        assert!(extension.contains("PAGE CONTENT"));
        assert!(manual.contains("The letter should be written in English."));
    }

    #[test]
    fn test_system_instruction_defaults_blank_settings() {
        let snapshot = LetterSnapshot::default();
        let system = system_instruction(&snapshot, false);
        assert!(system.contains("The tone should be Professional."));
        assert!(system.contains("approximately Standard (350 words)."));
    }
}
