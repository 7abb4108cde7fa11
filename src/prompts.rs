pub fn user_transcript_summary(transcript: &str) -> String {
    format!(r#"You'll receive the transcript of one customer conversation.
Return strict JSON with this structure:
{{
  "summary": "",
  "positive_feedback": ["", ...],
  "negative_feedback": ["", ...]
}}

- summary: 2–4 sentences, what the customer wanted and how it ended.
- positive_feedback: short phrases (2–6 words) the customer was happy about.
- negative_feedback: short phrases (2–6 words) the customer complained about.

TRANSCRIPT:
<{transcript}>

CONSTRAINTS:
- Phrases must come from the conversation, not from your own judgement.
- Empty arrays are fine when nothing applies.
- Output the JSON object only."#, transcript = transcript)
}
