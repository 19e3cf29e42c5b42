//! Banner prompt construction.

const HEADLINE_TEMPLATE_HEAD: &str = "Create Promo Banner that has products ";
const HEADLINE_TEMPLATE_TAIL: &str = " and has an awesome catchy headline to attract customers";
const CUSTOMIZATION_PREFIX: &str = "Include the following customization details: ";

/// Builds the image-generation prompt for a product description.
///
/// The customization clause is appended directly, without a separator, and
/// only when `customization` contains something other than whitespace.
pub fn build_banner_prompt(description: &str, customization: Option<&str>) -> String {
    let mut prompt = String::with_capacity(
        HEADLINE_TEMPLATE_HEAD.len() + description.len() + HEADLINE_TEMPLATE_TAIL.len(),
    );
    prompt.push_str(HEADLINE_TEMPLATE_HEAD);
    prompt.push_str(description);
    prompt.push_str(HEADLINE_TEMPLATE_TAIL);

    if let Some(customization) = customization.filter(|c| !c.trim().is_empty()) {
        prompt.push_str(CUSTOMIZATION_PREFIX);
        prompt.push_str(customization);
    }
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "Create Promo Banner that has products Coca-Cola, Pepsi and has an awesome catchy headline to attract customers";

    #[test]
    fn test_prompt_without_customization() {
        assert_eq!(build_banner_prompt("Coca-Cola, Pepsi", None), BASE);
    }

    #[test]
    fn test_blank_customization_is_ignored() {
        assert_eq!(build_banner_prompt("Coca-Cola, Pepsi", Some("")), BASE);
        assert_eq!(build_banner_prompt("Coca-Cola, Pepsi", Some("  \n\t")), BASE);
    }

    #[test]
    fn test_customization_is_appended_without_separator() {
        let prompt = build_banner_prompt("Coca-Cola, Pepsi", Some("Diwali theme, gold accents"));
        assert_eq!(
            prompt,
            format!("{BASE}Include the following customization details: Diwali theme, gold accents")
        );
    }

    #[test]
    fn test_customization_kept_verbatim() {
        let prompt = build_banner_prompt("tea", Some("  50% off "));
        assert!(prompt.ends_with("customization details:   50% off "));
    }
}
