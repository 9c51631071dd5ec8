//! Prompt sanitization and image-to-video intent classification.
//!
//! Text-to-video prompts are stripped of instructions to render
//! on-screen text, UI chrome, or brand marks: generation models that are
//! asked for text hallucinate garbled glyphs. Image-to-video prompts
//! must skip this pass entirely; the source image already contains real
//! brand and product content, and sanitizing would push the model to
//! erase it. Getting this branch backwards silently corrupts output
//! quality, so both directions are covered by tests.

/// Phrases that indicate a prompt fragment asks for rendered text or
/// branding. Matched case-insensitively against sentence fragments.
const TEXT_RENDER_MARKERS: &[&str] = &[
    "text overlay",
    "on-screen text",
    "onscreen text",
    "caption",
    "subtitle",
    "title card",
    "headline",
    "logo",
    "watermark",
    "brand name",
    "call-to-action button",
    "button",
    "ui element",
    "interface",
    "written",
    "lettering",
    "typography",
];

/// Words that indicate an image-to-video prompt introduces new scene
/// content (people, activities) rather than animating the still image.
const NEW_CONTENT_MARKERS: &[&str] = &[
    "person", "people", "man", "woman", "model", "customer", "hand", "hands", "child", "family",
    "walking", "running", "dancing", "holding", "using", "wearing", "pouring", "drinking",
    "eating", "typing", "smiling", "talking", "crowd",
];

/// Strip text-rendering instructions from a text-to-video prompt.
///
/// Sentence fragments containing any marker are dropped; a standing
/// guard clause is appended so the model stays away from glyphs even
/// when the remaining copy hints at them.
pub fn sanitize_t2v_prompt(prompt: &str) -> String {
    let kept: Vec<&str> = prompt
        .split(['.', ';', '\n'])
        .map(str::trim)
        .filter(|fragment| !fragment.is_empty())
        .filter(|fragment| {
            let lower = fragment.to_lowercase();
            !TEXT_RENDER_MARKERS.iter().any(|m| lower.contains(m))
        })
        .collect();

    let mut cleaned = kept.join(". ");
    if cleaned.is_empty() {
        // Everything was a text instruction; keep a minimal visual brief.
        cleaned = "clean product scene".to_string();
    }
    cleaned.push_str(". No text, no captions, no logos.");
    cleaned
}

/// Image-to-video branch selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum I2vIntent {
    /// The prompt describes new scene content (people, activities);
    /// the source image is used as a style/product reference.
    NewContent,
    /// The prompt animates the existing image; the source image is the
    /// first frame.
    AnimateExisting,
}

/// Classify an image-to-video prompt.
pub fn classify_i2v_intent(prompt: &str) -> I2vIntent {
    let lower = prompt.to_lowercase();
    let has_new_content = NEW_CONTENT_MARKERS.iter().any(|m| {
        lower
            .split(|c: char| !c.is_alphanumeric())
            .any(|word| word == *m)
    });

    if has_new_content {
        I2vIntent::NewContent
    } else {
        I2vIntent::AnimateExisting
    }
}

/// Phrase an image-to-video prompt for its branch.
///
/// The two branches use different provider parameters and different
/// wording: a reference-image request describes the new scene, while a
/// first-frame request anchors the model to the existing composition.
pub fn phrase_i2v_prompt(prompt: &str, intent: I2vIntent) -> String {
    match intent {
        I2vIntent::NewContent => format!(
            "Using the provided image as a product and style reference: {}",
            prompt.trim()
        ),
        I2vIntent::AnimateExisting => format!(
            "Bring this exact image to life with subtle natural motion. {} Keep the original composition and all visible details unchanged.",
            prompt.trim()
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_t2v_strips_text_instructions() {
        let prompt = "A barista pours latte art. Add a caption saying 50% off. Warm morning light";
        let cleaned = sanitize_t2v_prompt(prompt);
        assert!(!cleaned.to_lowercase().contains("caption"));
        assert!(cleaned.contains("barista"));
        assert!(cleaned.contains("Warm morning light"));
        assert!(cleaned.ends_with("No text, no captions, no logos."));
    }

    #[test]
    fn test_t2v_strips_logo_and_ui() {
        let prompt = "Show our logo spinning; a sleek dashboard interface; ocean waves at dawn";
        let cleaned = sanitize_t2v_prompt(prompt);
        assert!(!cleaned.to_lowercase().contains("logo"));
        assert!(!cleaned.to_lowercase().contains("interface"));
        assert!(cleaned.contains("ocean waves"));
    }

    #[test]
    fn test_t2v_all_text_falls_back_to_minimal_brief() {
        let cleaned = sanitize_t2v_prompt("Big headline with the brand name");
        assert!(cleaned.starts_with("clean product scene"));
    }

    #[test]
    fn test_i2v_new_content_branch() {
        // A new human subject selects the reference branch, never the
        // animate-existing branch.
        assert_eq!(
            classify_i2v_intent("A woman picks up the bottle and smiles"),
            I2vIntent::NewContent
        );
        assert_eq!(
            classify_i2v_intent("hands typing on the keyboard"),
            I2vIntent::NewContent
        );
    }

    #[test]
    fn test_i2v_animate_existing_branch() {
        assert_eq!(
            classify_i2v_intent("slow zoom with steam rising from the cup"),
            I2vIntent::AnimateExisting
        );
    }

    #[test]
    fn test_i2v_marker_matches_whole_words_only() {
        // "manual" contains "man" but is not a person.
        assert_eq!(
            classify_i2v_intent("the manual focus ring rotates gently"),
            I2vIntent::AnimateExisting
        );
    }

    #[test]
    fn test_i2v_phrasing_differs_by_branch() {
        let new_content = phrase_i2v_prompt("a chef plates the dish", I2vIntent::NewContent);
        let animate = phrase_i2v_prompt("gentle steam", I2vIntent::AnimateExisting);
        assert!(new_content.contains("reference"));
        assert!(animate.contains("exact image"));
        assert!(animate.contains("composition"));
    }
}
