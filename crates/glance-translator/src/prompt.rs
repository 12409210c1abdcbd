use glance_types::{ModelConfig, PromptStyle, TargetLanguage};

/// Translation instruction framed for the model's prompt style
pub fn build_prompt(model: &ModelConfig, source: &str, target: TargetLanguage, text: &str) -> String {
    let instruction = format!(
        "Translate the following {source} text into {target}.\n\
         Reply with the {target} translation only. No explanations, notes or alternatives.\n\
         \"{text}\"\n\n\
         {target} translation:"
    );

    match model.prompt_style {
        PromptStyle::Instruction => instruction,
        PromptStyle::GemmaChat => format!(
            "<start_of_turn>user\n{instruction}<end_of_turn>\n<start_of_turn>model\n"
        ),
    }
}

/// Strip what models tend to wrap around the answer: whitespace, quotes, an
/// echoed "<target> translation:" label.
pub fn clean_response(raw: &str, target: TargetLanguage) -> String {
    let mut text = raw.trim();

    let label = format!("{} translation:", target.name());
    if text.len() >= label.len()
        && text.is_char_boundary(label.len())
        && text[..label.len()].eq_ignore_ascii_case(&label)
    {
        text = text[label.len()..].trim_start();
    }

    let text = text.trim_end_matches("<end_of_turn>").trim();

    for (open, close) in [('"', '"'), ('\u{201C}', '\u{201D}'), ('\'', '\'')] {
        if let Some(inner) = text
            .strip_prefix(open)
            .and_then(|rest| rest.strip_suffix(close))
        {
            return inner.trim().to_string();
        }
    }

    text.to_string()
}
