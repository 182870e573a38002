use super::session::{ChatMessage, ChatRole};
use crate::models::Role;

pub const DEFAULT_LANGUAGE: &str = "English";

const SYSTEM_PROMPT: &str = "You are the AI assistant of FarmBazaar, an agricultural marketplace that connects farmers and buyers in India.

You answer farming-related questions and give practical guidance on agriculture. You support both farmers and buyers on the platform.

Format responses clearly:
- Bullet points for lists
- Numbered lists for steps
- Line breaks between paragraphs
- Bold text (**text**) for important points
- No HTML and no complex markdown

For farmers you help with:
- Farming practices and crop recommendations
- Pesticides, fertilizers and organic farming
- Pricing produce competitively
- Writing effective contract listings
- Identifying and treating crop diseases

For buyers you help with:
- Seasonal crops
- Finding quality produce
- Storage and preservation
- Market trends and pricing
- Organic certification";

/// Full prompt for one turn: system text, caller context, history, new message.
pub fn build_prompt(
    role: Role,
    region: Option<&str>,
    language: Option<&str>,
    history: &[ChatMessage],
    message: &str,
) -> String {
    let mut prompt = String::from(SYSTEM_PROMPT);

    prompt.push_str(match role {
        Role::Farmer => "\n\nThe user is a farmer selling produce on FarmBazaar.",
        Role::Buyer => "\n\nThe user is a buyer looking to purchase agricultural products on FarmBazaar.",
    });

    if let Some(region) = region.map(str::trim).filter(|r| !r.is_empty()) {
        prompt.push_str(&format!("\n\nThe user is from the {} region in India.", region));
    }

    let language = language.map(str::trim).filter(|l| !l.is_empty()).unwrap_or(DEFAULT_LANGUAGE);
    prompt.push_str(&format!("\n\nPlease respond in {} and use appropriate formatting.", language));

    prompt.push_str("\n\nConversation history:\n");
    for entry in history {
        let speaker = match entry.role {
            ChatRole::User => "User",
            ChatRole::Assistant => "Assistant",
        };
        prompt.push_str(&format!("{}: {}\n", speaker, entry.content));
    }

    prompt.push_str(&format!("\nUser: {}\nAssistant:", message));
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn includes_context_and_history_in_order() {
        let history = vec![ChatMessage::user("Is it too late to sow wheat?"), ChatMessage::assistant("Not yet.")];
        let prompt = build_prompt(Role::Buyer, Some("Malwa"), Some("Hindi"), &history, "Which variety?");

        assert!(prompt.starts_with("You are the AI assistant of FarmBazaar"));
        assert!(prompt.contains("The user is a buyer"));
        assert!(prompt.contains("from the Malwa region"));
        assert!(prompt.contains("respond in Hindi"));

        let first = prompt.find("User: Is it too late").unwrap();
        let reply = prompt.find("Assistant: Not yet.").unwrap();
        assert!(first < reply);
        assert!(prompt.ends_with("User: Which variety?\nAssistant:"));
    }

    #[test]
    fn blank_region_and_language_fall_back() {
        let prompt = build_prompt(Role::Farmer, Some("  "), None, &[], "Hello");
        assert!(!prompt.contains("region in India"));
        assert!(prompt.contains("respond in English"));
    }
}
