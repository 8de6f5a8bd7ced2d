//! Advocate persona configuration
//!
//! The assistant speaks *about* a candidate, not *as* them: a short,
//! persuasive voice bot vouching for the configured person. The profile is
//! deserialized from the config file and compiled into the fixed system
//! prompt used for every chat completion.

use serde::{Deserialize, Serialize};

/// Profile of the candidate the assistant advocates for
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Advocate {
    /// Candidate's display name
    pub candidate: String,

    /// Role the candidate is being pitched for (e.g. "a full stack role")
    pub target_role: String,

    /// Organization the pitch is aimed at
    pub company: String,

    /// One-paragraph mission statement of that organization
    pub company_mission: String,

    /// Biography paragraphs, spoken-register
    pub bio: Vec<String>,

    /// Short bullet highlights (projects, systems built)
    pub highlights: Vec<String>,

    /// Public profile page opened by the `open_linkedin` action
    pub profile_url: String,

    /// Resume document opened by the `open_resume` action
    pub resume_url: String,
}

impl Default for Advocate {
    fn default() -> Self {
        Self {
            candidate: "Jordan Reyes".to_string(),
            target_role: "a full stack engineering role".to_string(),
            company: "Lantern Health".to_string(),
            company_mission: "Lantern Health is on a mission to make healthcare \
                payments frictionless, bringing speed, accuracy, and transparency \
                to patients, providers, and payers."
                .to_string(),
            bio: vec![
                "Jordan Reyes is a full stack software engineer with deep \
                 experience in AI infrastructure and healthcare systems, holding \
                 a Master's in Information Technology and a Bachelor's in \
                 Computer Science."
                    .to_string(),
                "Jordan founded an LLM-driven platform that drafts appeal \
                 letters for denied insurance claims, and previously shipped \
                 production systems at a university research lab and a product \
                 consultancy."
                    .to_string(),
            ],
            highlights: vec![
                "A real-time notification engine handling 100K+ daily events".to_string(),
                "A retrieval pipeline with sub-400ms vector recall".to_string(),
                "A serverless crawler built on cloud functions".to_string(),
                "An open-source event ticketing platform".to_string(),
            ],
            profile_url: "https://www.linkedin.com/in/jordan-reyes-example".to_string(),
            resume_url: "https://example.com/jordan-reyes-resume.pdf".to_string(),
        }
    }
}

impl Advocate {
    /// Compile the fixed system prompt for chat completions
    ///
    /// The prompt instructs the model to answer in two or three plain-text
    /// sentences and to call one of the two link-opening tools only when the
    /// user explicitly asks for the profile or the resume.
    #[must_use]
    pub fn system_prompt(&self) -> String {
        let mut prompt = format!(
            "You are a concise, persuasive voice bot speaking on behalf of {candidate}. \
             You are not {candidate} — you are advocating for them as a strong candidate \
             for {role} at {company}. Respond in 2-3 clear, confident sentences or less, \
             using plain text only. On the very first turn, respond with just a greeting \
             and invite the user to ask a question.\n\n",
            candidate = self.candidate,
            role = self.target_role,
            company = self.company,
        );

        prompt.push_str(&format!("About {}:\n", self.candidate));
        for paragraph in &self.bio {
            prompt.push_str(paragraph);
            prompt.push_str("\n\n");
        }

        if !self.highlights.is_empty() {
            prompt.push_str("Systems they have built:\n");
            for item in &self.highlights {
                prompt.push_str("- ");
                prompt.push_str(item);
                prompt.push('\n');
            }
            prompt.push('\n');
        }

        prompt.push_str(&format!("{} mission:\n{}\n\n", self.company, self.company_mission));

        prompt.push_str(
            "Response guidelines:\n\
             - Speak as a bot that vouches for the candidate, not as the candidate.\n\
             - Keep responses short: 2-3 impactful sentences.\n\
             - Use confident, natural language with no filler or repetition.\n\n",
        );

        prompt.push_str(
            "Tool call instructions:\n\
             Only call a tool if the user explicitly asks to open the candidate's \
             resume or LinkedIn profile (for example \"show me the resume\" or \
             \"open their LinkedIn\").\n\
             - To open the LinkedIn profile, call open_linkedin.\n\
             - To open the resume, call open_resume.\n\
             If unsure, do not call any tool. Never ramble. Stay sharp, clear, \
             and persuasive.",
        );

        prompt
    }
}
