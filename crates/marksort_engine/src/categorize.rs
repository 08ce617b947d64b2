use marksort_core::{BookmarkRecord, CategoryPlan};
use marksort_logging::{mark_debug, mark_info};
use serde_json::Value;

use crate::{ModelClient, OrganizeError};

pub const TITLE_LIMIT: usize = 60;
pub const URL_LIMIT: usize = 80;
const ELLIPSIS: &str = "...";
const FENCE: &str = "```";

/// Turns valid bookmarks into a folder plan with one model round trip.
pub struct Categorizer<'a> {
    client: &'a dyn ModelClient,
}

impl<'a> Categorizer<'a> {
    pub fn new(client: &'a dyn ModelClient) -> Self {
        Self { client }
    }

    /// Plans come back exactly as the model wrote them; index coverage is
    /// the caller's concern.
    pub async fn categorize(
        &self,
        records: &[BookmarkRecord],
        credential: &str,
        max_folders: Option<u32>,
    ) -> Result<Vec<CategoryPlan>, OrganizeError> {
        let prompt = format!(
            "{}\n\n{}",
            build_system_prompt(max_folders),
            build_user_prompt(records)
        );
        mark_info!(
            "Requesting categories for {} bookmarks (max_folders={:?})",
            records.len(),
            max_folders
        );

        let reply = self.client.generate(credential, &prompt).await?;
        mark_debug!("Model reply ({} chars)", reply.len());

        let json = extract_json(&reply)?;
        parse_plans(json)
    }
}

pub fn build_system_prompt(max_folders: Option<u32>) -> String {
    let folder_rule = match max_folders {
        Some(max) => format!(
            "4. Create NO MORE than {max} folders. Merge similar topics if needed to stay under this limit."
        ),
        None => "4. Create as many folders as makes sense, but prefer fewer well-organized folders \
                 over many sparse ones. Aim for 5-15 folders for typical bookmark collections."
            .to_string(),
    };

    format!(
        r#"You are a bookmark organizer. You will receive a list of bookmarks with their titles and URLs.

Your task:
1. Analyze the bookmarks and group them into logical folders based on their content/purpose
2. Each folder must have a SHORT name (max 2 words, no special characters)
3. Assign every bookmark to exactly one folder
{folder_rule}

Guidelines for folder names:
- Use SHORT names, max 2 words (e.g. "Dev", "Finance", "Shopping", "Travel", "Learning", "Work", "Fun", "Health", "News", "Docs", "Tools", "Social Media", "Food", "Music", "Games", "Code", "Design", "AI", "Crypto")
- Prefer single words when possible, max 2 words when needed
- Group by purpose/topic, not by website

Respond ONLY with valid JSON in this exact format:
{{
  "folders": [
    {{
      "name": "Folder Name",
      "bookmarks": [0, 5, 12]
    }}
  ]
}}

The "bookmarks" array contains indices from the input list (0-indexed).
Do not include any explanation or text outside the JSON.
Every bookmark index must appear exactly once across all folders."#
    )
}

/// One `[index] title | url` line per bookmark.
pub fn build_user_prompt(records: &[BookmarkRecord]) -> String {
    let mut prompt = String::from("Organize these bookmarks:\n\n");
    for (idx, record) in records.iter().enumerate() {
        prompt.push_str(&format!(
            "[{idx}] {} | {}\n",
            truncate(&record.title, TITLE_LIMIT),
            truncate(&record.url, URL_LIMIT)
        ));
    }
    prompt
}

/// Keeps at most `max_chars` characters, replacing the tail with `...` when cut.
pub fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let keep = max_chars.saturating_sub(ELLIPSIS.len());
    let mut out: String = text.chars().take(keep).collect();
    out.push_str(ELLIPSIS);
    out
}

/// Pulls the JSON object out of a model reply that may be fenced or wrapped
/// in prose.
pub fn extract_json(content: &str) -> Result<&str, OrganizeError> {
    let trimmed = content.trim();

    if trimmed.starts_with(FENCE) {
        if let Some(body) = first_fenced_block(trimmed) {
            return Ok(body);
        }
    }

    if trimmed.starts_with('{') {
        return Ok(trimmed);
    }

    match (content.find('{'), content.rfind('}')) {
        (Some(start), Some(end)) if end > start => Ok(&content[start..=end]),
        _ => Err(OrganizeError::Extraction),
    }
}

/// Lines between the opening fence line (language tag allowed) and the next
/// fence line. `None` when the block is empty or never closed.
fn first_fenced_block(text: &str) -> Option<&str> {
    let mut lines = text.split('\n');
    let opening = lines.next()?;
    let body_start = opening.len() + 1;

    let mut offset = body_start;
    for line in lines {
        if line.starts_with(FENCE) {
            if offset == body_start {
                return None;
            }
            // Drop the newline that precedes the closing fence.
            return text.get(body_start..offset - 1);
        }
        offset += line.len() + 1;
    }
    None
}

pub fn parse_plans(json: &str) -> Result<Vec<CategoryPlan>, OrganizeError> {
    let value: Value = serde_json::from_str(json)
        .map_err(|err| OrganizeError::Schema(format!("response is not valid JSON: {err}")))?;
    let folders = value
        .get("folders")
        .filter(|folders| folders.is_array())
        .cloned()
        .ok_or_else(|| OrganizeError::Schema("response has no \"folders\" array".to_string()))?;
    serde_json::from_value(folders)
        .map_err(|err| OrganizeError::Schema(format!("malformed folder entry: {err}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn clean_json_is_returned_trimmed() {
        let json = "  {\"folders\": []}\n";
        assert_eq!(extract_json(json).unwrap(), json.trim());
        // Running it again changes nothing.
        assert_eq!(extract_json(extract_json(json).unwrap()).unwrap(), json.trim());
    }

    #[test]
    fn fenced_block_with_language_tag() {
        let reply = "```json\n{\"folders\": [\n  {\"name\": \"Dev\", \"bookmarks\": [0]}\n]}\n```";
        assert_eq!(
            extract_json(reply).unwrap(),
            "{\"folders\": [\n  {\"name\": \"Dev\", \"bookmarks\": [0]}\n]}"
        );
    }

    #[test]
    fn bare_fence_without_tag() {
        let reply = "```\n{\"folders\": []}\n```\nthanks";
        assert_eq!(extract_json(reply).unwrap(), "{\"folders\": []}");
    }

    #[test]
    fn prose_around_object_is_sliced_off() {
        let reply = "Sure! Here you go: {\"folders\": []} Hope that helps.";
        assert_eq!(extract_json(reply).unwrap(), "{\"folders\": []}");
    }

    #[test]
    fn unclosed_fence_falls_back_to_braces() {
        let reply = "```json\n{\"folders\": []}";
        assert_eq!(extract_json(reply).unwrap(), "{\"folders\": []}");
    }

    #[test]
    fn prose_without_braces_fails() {
        let err = extract_json("I could not categorize these bookmarks.").unwrap_err();
        assert_eq!(err, OrganizeError::Extraction);
        assert_eq!(extract_json("} backwards {").unwrap_err(), OrganizeError::Extraction);
    }

    #[test]
    fn parse_requires_folders_array() {
        assert!(matches!(
            parse_plans("{\"categories\": []}"),
            Err(OrganizeError::Schema(_))
        ));
        assert!(matches!(
            parse_plans("{\"folders\": {}}"),
            Err(OrganizeError::Schema(_))
        ));
        assert!(matches!(parse_plans("{not json"), Err(OrganizeError::Schema(_))));
    }

    #[test]
    fn parse_keeps_plans_verbatim() {
        let plans =
            parse_plans(r#"{"folders":[{"name":"Dev","bookmarks":[2,0,2]},{"name":"Misc","bookmarks":[9]}]}"#)
                .unwrap();
        assert_eq!(
            plans,
            vec![
                CategoryPlan::new("Dev", vec![2, 0, 2]),
                CategoryPlan::new("Misc", vec![9]),
            ]
        );
    }

    #[test]
    fn truncate_counts_characters() {
        assert_eq!(truncate("short", 60), "short");
        let long = "x".repeat(61);
        let cut = truncate(&long, 60);
        assert_eq!(cut.chars().count(), 60);
        assert!(cut.ends_with("..."));
        assert_eq!(truncate("héllo wörld", 8), "héllo...");
    }

    #[test]
    fn user_prompt_lists_indexed_lines() {
        let records = vec![
            BookmarkRecord {
                id: "10".into(),
                title: "Rust".to_string(),
                url: "https://rust-lang.org".to_string(),
            },
            BookmarkRecord {
                id: "11".into(),
                title: "t".repeat(70),
                url: format!("https://example.com/{}", "p".repeat(100)),
            },
        ];
        let prompt = build_user_prompt(&records);
        let lines: Vec<_> = prompt.lines().collect();
        assert_eq!(lines[0], "Organize these bookmarks:");
        assert_eq!(lines[2], "[0] Rust | https://rust-lang.org");
        assert!(lines[3].starts_with(&format!("[1] {}... | https://example.com/", "t".repeat(57))));
        assert!(lines[3].ends_with("..."));
    }

    #[test]
    fn capped_prompt_states_the_limit() {
        let prompt = build_system_prompt(Some(6));
        assert!(prompt.contains("Create NO MORE than 6 folders"));
        assert!(!build_system_prompt(None).contains("NO MORE than"));
        assert!(build_system_prompt(None).contains("5-15 folders"));
    }
}
