use std::path::PathBuf;

use wander_agents::{DefaultGuide, GuideConfig, NarrativeSource};
use wander_core::{Location, Message, SelectionStrategy};
use wander_observability::AppMetrics;

fn guide() -> DefaultGuide {
    let fixture = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("fixtures/antwerp.json");
    DefaultGuide::from_config(&GuideConfig::offline(fixture), AppMetrics::shared())
        .expect("guide should build")
}

#[tokio::test]
async fn radius_expands_until_something_is_found() {
    let guide = guide();
    let north_of_mas = Location::new(51.2330, 4.4100).unwrap();

    let discovery = guide.discover(north_of_mas, None).await;

    assert_eq!(discovery.radius_m, Some(1_400));
    assert_eq!(discovery.attempts, 2);
    let ids = discovery
        .pois
        .iter()
        .map(|poi| poi.id.as_str())
        .collect::<Vec<_>>();
    assert_eq!(ids, vec!["node/1007", "node/1006"]);
}

#[tokio::test]
async fn explicit_initial_radius_is_honoured() {
    let guide = guide();
    let grote_markt = Location::new(51.2213, 4.3997).unwrap();

    let discovery = guide.discover(grote_markt, Some(100)).await;

    assert_eq!(discovery.radius_m, Some(100));
    assert_eq!(discovery.pois.len(), 1);
    assert_eq!(discovery.pois[0].name, "Brabofontein");
}

#[tokio::test]
async fn follow_up_story_uses_the_second_template() {
    let guide = guide();
    let grote_markt = Location::new(51.2213, 4.3997).unwrap();
    let pois = guide.discover(grote_markt, None).await.pois;

    let history = vec![
        Message::assistant("Shall we head to the fountain?"),
        Message::user("Who built the cathedral?"),
    ];
    let narrative = guide.story(&pois, &history).await.unwrap();

    assert_eq!(narrative.source, NarrativeSource::Template);
    assert_eq!(narrative.selection, SelectionStrategy::Fallback);
    assert!(narrative.story.story.starts_with("Good question!"));
    assert_eq!(narrative.story.next_destination, narrative.story.selected_pois[0]);

    let snapshot = guide.metrics().snapshot();
    assert_eq!(snapshot.requests_total, 2);
    assert_eq!(snapshot.selector_fallback_total, 1);
    assert_eq!(snapshot.narrative_fallback_total, 1);
}
