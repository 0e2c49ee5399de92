//! Natural-language prompt construction.

use crate::model::{Character, Panel};

/// Style keywords appended to every prompt.
pub const STYLE_KEYWORDS: &str =
    "professional comic book art style, dynamic composition, clean lines, vibrant colors";

/// Style suffix for characters described from scratch.
pub const CHARACTER_STYLE: &str =
    "Highly detailed, professional comic art style, full body shot, clean lines, vibrant colors.";

/// Build the prompt for a panel.
///
/// Characters are described in the order the panel lists them; references
/// that don't resolve in `characters` are skipped.
pub fn panel_prompt(panel: &Panel, characters: &[Character]) -> String {
    let descriptions: Vec<String> = panel
        .characters
        .iter()
        .filter_map(|id| {
            let found = characters.iter().find(|c| &c.id == id);
            if found.is_none() {
                log::debug!("Panel {} references unknown character {}", panel.id, id);
            }
            found
        })
        .map(|c| format!("{}: {}", c.name, c.description))
        .collect();

    let mut prompt = format!("Comic book panel scene: {}.", panel.scene.trim());
    if !descriptions.is_empty() {
        prompt.push_str(&format!(" Characters present: {}.", descriptions.join(". ")));
    }
    if !panel.dialogue.trim().is_empty() {
        prompt.push_str(&format!(" Action/Dialogue context: \"{}\".", panel.dialogue.trim()));
    }
    prompt.push_str(&format!(
        " Style: {}. Include appropriate background setting \
         and character expressions based on the scene.",
        STYLE_KEYWORDS
    ));
    prompt
}

/// Build the prompt for a character portrait.
///
/// With a reference image the prompt asks for a style transform of that
/// image; otherwise the character is described from scratch.
pub fn character_prompt(character: &Character) -> String {
    let description = character.description.trim();
    if character.reference_image.is_some() {
        let mut prompt = format!(
            "Transform this reference image into a comic book style character named {}.",
            character.name
        );
        if !description.is_empty() {
            prompt.push_str(&format!(" Additional details: {}.", description));
        }
        prompt.push_str(&format!(" Style: {}.", STYLE_KEYWORDS));
        prompt
    } else {
        format!(
            "Create a comic book style character named {}: {}. {}",
            character.name, description, CHARACTER_STYLE
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_panel_prompt_lists_characters_in_panel_order() {
        let ada = Character::new("Ada", "a pilot");
        let bo = Character::new("Bo", "a robot");
        let panel = Panel::with_text("A hangar", "Ada: Go!", vec![bo.id.clone(), ada.id.clone()]);

        let prompt = panel_prompt(&panel, &[ada, bo]);
        assert!(prompt.starts_with("Comic book panel scene: A hangar."));
        assert!(prompt.contains("Characters present: Bo: a robot. Ada: a pilot."));
        assert!(prompt.contains("Action/Dialogue context: \"Ada: Go!\""));
        assert!(prompt.contains(STYLE_KEYWORDS));
    }

    #[test]
    fn test_panel_prompt_skips_unknown_characters() {
        let ada = Character::new("Ada", "a pilot");
        let panel = Panel::with_text("Sky", "", vec!["ghost".to_string(), ada.id.clone()]);

        let prompt = panel_prompt(&panel, &[ada]);
        assert!(prompt.contains("Characters present: Ada: a pilot."));
        assert!(!prompt.contains("ghost"));
        assert!(!prompt.contains("Action/Dialogue"));
    }

    #[test]
    fn test_character_prompt_from_scratch() {
        let character = Character::new("Ada", "a pilot with goggles");
        let prompt = character_prompt(&character);
        assert_eq!(
            prompt,
            "Create a comic book style character named Ada: a pilot with goggles. \
             Highly detailed, professional comic art style, full body shot, \
             clean lines, vibrant colors."
        );
    }

    #[test]
    fn test_character_prompt_with_reference_image() {
        let character =
            Character::new("Ada", "red scarf").with_reference_image(b"img", "image/png");
        let prompt = character_prompt(&character);
        assert!(prompt.starts_with(
            "Transform this reference image into a comic book style character named Ada."
        ));
        assert!(prompt.contains("Additional details: red scarf."));
        assert!(prompt.contains(STYLE_KEYWORDS));
    }

    #[test]
    fn test_character_prompt_reference_without_details() {
        let character = Character::new("Ada", "").with_reference_image(b"img", "image/png");
        assert!(!character_prompt(&character).contains("Additional details"));
    }
}
