// Instruction templates for the translate and critique roles

use super::profile::AgentProfile;

/// Upper bound on critique length requested from the judge.
pub const CRITIQUE_WORD_LIMIT: usize = 100;

/// Build the translation instruction for `text`.
///
/// `guidance` is passed separately from the profile so the loop can thread
/// its accumulated guidance without touching the agent.
pub fn translation_prompt(profile: &AgentProfile, guidance: &str, text: &str) -> String {
    let source = profile.source_lang.trim();
    let dest = profile.dest_lang.trim();

    let mut prompt = format!(
        "{persona}\n\
         You translate text from {source} to {dest}.\n\
         You always ensure that the translation is accurate, contextually appropriate, \
         and maintains the original meaning.\n\n\
         Translate the following text from {source} to {dest}:\n\
         Text: {text}\n",
        persona = translator_persona(&profile.expertise),
    );

    let guidance = guidance.trim();
    if !guidance.is_empty() {
        prompt.push('\n');
        prompt.push_str(guidance);
        prompt.push('\n');
    }

    prompt.push_str(&format!(
        "\nProvide the output strictly in {dest} as a concise translation.\n\
         Do not provide any additional commentary."
    ));
    prompt
}

/// Build the judge's instruction asking for an improvement note addressed to
/// the forward translator.
pub fn critique_prompt(
    profile: &AgentProfile,
    original: &str,
    translation: &str,
    backtranslation: &str,
) -> String {
    let expertise = match profile.expertise.trim() {
        "" => "general translation",
        e => e,
    };
    let guidance = match profile.guidance.trim() {
        "" => "(none)",
        g => g,
    };

    format!(
        "The following is a translation of a text from {source} to {dest} and back.\n\
         This was done by two highly skilled bilingual translators with expertise in {expertise}.\n\
         They received the following guidelines to follow: {guidance}.\n\n\
         The original text is: {original}\n\
         The translated text from the first translator is: {translation}\n\
         The backtranslated text from the second translator is: {backtranslation}\n\n\
         Give instructions to the first bilingual translator that translates the original \
         on how to improve the translation based on the original text.\n\
         Provide the instructions in less than {limit} words. \
         Do not provide any additional commentary.",
        source = profile.source_lang.trim(),
        dest = profile.dest_lang.trim(),
        limit = CRITIQUE_WORD_LIMIT,
    )
}

fn translator_persona(expertise: &str) -> String {
    match expertise.trim() {
        "" => "You are a highly skilled bilingual translator.".to_string(),
        e => format!("You are a highly skilled bilingual translator with expertise in {e}."),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::profile::Role;

    fn profile() -> AgentProfile {
        AgentProfile::new(Role::Forward, "gemma3:4b", "English", "Dutch")
            .with_expertise("technology adoption research and survey design")
            .with_guidance("Translate 'Smart Signal' as 'Slim Signaal'.")
    }

    #[test]
    fn test_translation_prompt_contains_all_fields() {
        let prompt = translation_prompt(&profile(), "Use formal address.", "How often do you cycle?");
        assert!(prompt.contains("expertise in technology adoption research and survey design"));
        assert!(prompt.contains("from English to Dutch"));
        assert!(prompt.contains("Text: How often do you cycle?"));
        assert!(prompt.contains("Use formal address."));
        assert!(prompt.contains("strictly in Dutch"));
        assert!(prompt.contains("Do not provide any additional commentary."));
    }

    #[test]
    fn test_translation_prompt_uses_threaded_guidance_not_profile() {
        let prompt = translation_prompt(&profile(), "Threaded guidance", "x");
        assert!(prompt.contains("Threaded guidance"));
        assert!(!prompt.contains("Slim Signaal"));
    }

    #[test]
    fn test_translation_prompt_without_expertise_or_guidance() {
        let bare = AgentProfile::new(Role::Backward, "m", "Dutch", "English");
        let prompt = translation_prompt(&bare, "  ", "Hallo");
        assert!(prompt.starts_with("You are a highly skilled bilingual translator.\n"));
        assert!(!prompt.contains("\n\n\n"));
    }

    #[test]
    fn test_critique_prompt_contains_round_trip() {
        let prompt = critique_prompt(&profile(), "hello", "hallo", "hi");
        assert!(prompt.contains("from English to Dutch and back"));
        assert!(prompt.contains("The original text is: hello"));
        assert!(prompt.contains("first translator is: hallo"));
        assert!(prompt.contains("second translator is: hi"));
        assert!(prompt.contains("Slim Signaal"));
        assert!(prompt.contains("less than 100 words"));
    }

    #[test]
    fn test_critique_prompt_closes_guidelines_sentence() {
        let plain = AgentProfile::new(Role::Judge, "m", "English", "Dutch")
            .with_guidance("Keep it short");
        let prompt = critique_prompt(&plain, "a", "b", "c");
        assert!(prompt.contains("guidelines to follow: Keep it short.\n\nThe original text is: a"));
    }

    #[test]
    fn test_critique_prompt_placeholders_for_empty_fields() {
        let bare = AgentProfile::new(Role::Judge, "m", "English", "Dutch");
        let prompt = critique_prompt(&bare, "a", "b", "c");
        assert!(prompt.contains("expertise in general translation"));
        assert!(prompt.contains("guidelines to follow: (none).\n"));
    }
}
