const QUIZ_PROMPT_TEMPLATE: &str = r#"You are an education expert. Based on the "Course Material" below, write 3 multiple-answer multiple-choice questions for a formative assessment.
Each question must:
1. Have 4 answer options.
2. Have at least 2 correct answers.
3. Include a 'pre_hint' (shown before answering) and a 'feedback' (explanation shown after answering).

Course Material: "{context_text}"

Return only valid JSON in the following format. Do not include any text outside the JSON.
{
  "questions": [
    {
      "id": "q1",
      "text": "...",
      "pre_hint": "...",
      "feedback": "...",
      "options": [
        {"id": "a", "text": "...", "is_correct": true, "feedback": "..."}
      ]
    }
  ]
}
"#;

const HINT_PROMPT_TEMPLATE: &str = r#"You are a learning assistant who gives short hints based on course material.

Course Material:
"{context_text}"

Using that material, give a short hint (at most 2 sentences) that helps the student answer the question below without giving the answer away.

Question: "{question}"

Return the answer as JSON with the following structure and do NOT include any other text outside the JSON:
{
  "hint": "..."
}
"#;

pub fn quiz_prompt(context_text: &str) -> String {
    QUIZ_PROMPT_TEMPLATE.replacen("{context_text}", context_text, 1)
}

pub fn hint_prompt(context_text: &str, question: &str) -> String {
    // Question first so placeholder-like text in the material is left alone.
    HINT_PROMPT_TEMPLATE
        .replacen("{question}", question, 1)
        .replacen("{context_text}", context_text, 1)
}
