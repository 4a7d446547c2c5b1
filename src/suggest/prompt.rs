/// Instruction sent upstream for a user's idea.
pub fn build(idea: &str) -> String {
    format!(
        r#"
You are a professional QR Code consultant.

Based on this idea: "{idea}", suggest 3 QR code use cases:
1) URL
2) vCard
3) WiFi or deep link

Return ONLY valid JSON like this:
[
  {{ "title": "...", "content": "...", "description": "..." }}
]
"#
    )
}
