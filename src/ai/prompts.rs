//! Prompt text sent to the generative model for the structured endpoints.

pub fn interpret_dream(title: &str, content: &str, tags: &[String]) -> String {
    format!(
        "You are a thoughtful dream analyst. Interpret the dream below.\n\
         Respond with a single JSON object and nothing else, using exactly these keys:\n\
         \"summary\" (string, two or three sentences), \"themes\" (array of strings), \
         \"symbols\" (array of objects with \"symbol\" and \"meaning\" strings), \
         \"mood\" (string, one word), \"tags\" (array of short lowercase strings).\n\n\
         Title: {title}\n\
         Existing tags: {}\n\
         Dream:\n{content}",
        join_tags(tags)
    )
}

pub fn suggest_tags(tags: &[String], content: Option<&str>) -> String {
    let mut prompt = format!(
        "Suggest up to 8 additional short, lowercase tags for a dream journal entry.\n\
         Current tags: {}\n",
        join_tags(tags)
    );
    if let Some(content) = content.filter(|c| !c.trim().is_empty()) {
        prompt.push_str(&format!("Dream text:\n{content}\n"));
    }
    prompt.push_str("Respond only with a JSON array of strings, excluding the current tags.");
    prompt
}

pub fn dream_image(prompt: &str) -> String {
    format!(
        "Create a surreal, dreamlike illustration of the following scene. \
         Do not include any text in the image.\n\n{prompt}"
    )
}

fn join_tags(tags: &[String]) -> String {
    if tags.is_empty() {
        "(none)".to_string()
    } else {
        tags.join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn suggest_tags_omits_blank_content() {
        let prompt = suggest_tags(&["ocean".to_string()], Some("   "));
        assert!(prompt.contains("Current tags: ocean"));
        assert!(!prompt.contains("Dream text"));
    }

    #[test]
    fn interpret_lists_no_tags_explicitly() {
        let prompt = interpret_dream("Falling", "I fell forever", &[]);
        assert!(prompt.contains("Existing tags: (none)"));
        assert!(prompt.ends_with("I fell forever"));
    }
}
