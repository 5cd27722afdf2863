use crate::models::{Message, PointOfInterest, StoryResponse};

pub const GUIDE_NAME: &str = "Wanderlust Assistant";

fn poi_line(poi: &PointOfInterest) -> String {
    format!("{} ({}, {}m away)", poi.name, poi.kind, poi.distance_label())
}

pub fn format_history(history: &[Message]) -> String {
    history
        .iter()
        .map(|message| format!("{}: {}", message.role.as_code(), message.content))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn build_story_prompt(
    selected: &[PointOfInterest],
    history: &[Message],
    style: Option<&str>,
) -> String {
    let descriptions = selected
        .iter()
        .map(|poi| format!("- {}", poi_line(poi)))
        .collect::<Vec<_>>()
        .join("\n");

    let mut prompt = format!(
        "You are a local guide and storyteller named {GUIDE_NAME}.\n\
The user is currently at a location near these points of interest:\n\
{descriptions}\n\n"
    );

    if !history.is_empty() {
        prompt.push_str("Previous conversation context:\n");
        prompt.push_str(&format_history(history));
        prompt.push_str("\n\n");
    }

    prompt.push_str(
        "Create an engaging narrative that connects these locations. Make the story feel like an adventure or a discovery.\n\
Recommend the first location in the list as the next destination for the user to visit.\n\
Your response should be friendly and conversational, as if you're a knowledgeable local friend showing them around.\n\
Include some brief historical or interesting facts about these places.\n\
End with a question that encourages the user to visit the recommended destination.",
    );

    if let Some(style) = style.map(str::trim).filter(|value| !value.is_empty()) {
        prompt.push_str("\n\n");
        prompt.push_str(style);
    }

    prompt
}

/// Canned narrative used when the reasoning service is unavailable. Callers
/// pass a non-empty selection; the first entry is the recommendation.
pub fn templated_story(selected: Vec<PointOfInterest>, history: &[Message]) -> Option<StoryResponse> {
    let next = selected.first()?.clone();
    let listing = selected.iter().map(poi_line).collect::<Vec<_>>().join(", ");

    let story = if history.is_empty() {
        format!(
            "I've spotted some lovely places around here! Shall I suggest a little adventure?\n\
Not far from you, you'll find {listing}.\n\
I'd start with {name}, only {distance} meters from here. It's said to be an interesting {kind}. Let me know when you get there and I'll tell you more!\n\
What do you think, shall we head over?",
            name = next.name,
            distance = next.distance_label(),
            kind = next.kind,
        )
    } else {
        format!(
            "Good question! I can't look that up right now, but the places around you are still waiting: {listing}.\n\
My pick is still {name}, about {distance} meters away. Tell me when you've arrived and I'll share what I know.",
            name = next.name,
            distance = next.distance_label(),
        )
    };

    Some(StoryResponse {
        selected_pois: selected,
        story,
        next_destination: next,
    })
}

pub fn arrival_message(poi: &PointOfInterest, info: &str) -> String {
    format!(
        "You've arrived at {}! {}\n\nWould you like to explore more places nearby?",
        poi.name,
        info.trim()
    )
}

pub fn arrival_not_found(poi: &PointOfInterest) -> String {
    format!(
        "I couldn't find specific information about {} in the encyclopedia. This place appears to be a {} located about {}m from your earlier position.",
        poi.name,
        poi.kind,
        poi.distance_label()
    )
}

pub fn arrival_empty_extract(poi: &PointOfInterest) -> String {
    format!(
        "{} is a {} located about {}m from your earlier position, but I couldn't find detailed information about it.",
        poi.name,
        poi.kind,
        poi.distance_label()
    )
}

pub fn arrival_lookup_failed(poi: &PointOfInterest) -> String {
    format!(
        "{} is a {} located about {}m from your earlier position. I couldn't retrieve additional information due to an error.",
        poi.name,
        poi.kind,
        poi.distance_label()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn poi(id: &str, name: &str, distance: f64) -> PointOfInterest {
        PointOfInterest {
            id: id.to_string(),
            name: name.to_string(),
            kind: "museum".to_string(),
            latitude: 51.2,
            longitude: 4.4,
            distance: Some(distance),
            description: None,
        }
    }

    #[test]
    fn prompt_includes_history_only_when_present() {
        let selected = vec![poi("node/1", "MAS", 300.0)];
        let fresh = build_story_prompt(&selected, &[], None);
        assert!(fresh.contains("- MAS (museum, 300m away)"));
        assert!(!fresh.contains("Previous conversation context"));

        let history = vec![Message::user("Tell me about the harbour")];
        let follow_up = build_story_prompt(&selected, &history, Some("Answer in Dutch."));
        assert!(follow_up.contains("user: Tell me about the harbour"));
        assert!(follow_up.ends_with("Answer in Dutch."));
    }

    #[test]
    fn template_recommends_first_poi() {
        let selected = vec![poi("node/1", "MAS", 50.0), poi("node/2", "Het Steen", 80.0)];
        let response = templated_story(selected, &[]).unwrap();
        assert_eq!(response.next_destination, response.selected_pois[0]);
        assert!(response.story.contains("I'd start with MAS, only 50 meters"));
    }

    #[test]
    fn template_has_follow_up_variant() {
        let selected = vec![poi("node/1", "MAS", 50.0)];
        let response = templated_story(selected, &[Message::user("and then?")]).unwrap();
        assert!(response.story.contains("My pick is still MAS"));
    }

    #[test]
    fn template_needs_a_candidate() {
        assert!(templated_story(Vec::new(), &[]).is_none());
    }
}
