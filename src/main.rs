//! Demo driver: a simulated host page taken through the full widget
//! lifecycle — enable on `/latest`, placement between rows, a pagination
//! mutation, then navigation to a disabled route.
//!
//! With a forum base url as the first argument the topics come from the
//! live tagged-topics endpoint; otherwise a canned topic set is used.

use std::sync::Arc;

use featured_topic_slider::carousel::images::SiteInfo;
use featured_topic_slider::data::fetch::{HttpTopicClient, TopicClient};
use featured_topic_slider::data::{DataError, TopicListResponse};
use featured_topic_slider::dom::parser::{outer_html, parse_html};
use featured_topic_slider::dom::Document;
use featured_topic_slider::{
    CarouselViewModel, FeaturedTopicDataSource, InsertMode, PlacementEngine, RouteInfo,
    SliderSettings,
};

/// Offline stand-in for the forum endpoint.
struct CannedClient;

impl TopicClient for CannedClient {
    fn list_tagged(&self, tag: &str, _per_page: usize) -> Result<TopicListResponse, DataError> {
        let body = format!(
            r#"{{
                "topic_list": {{
                    "topics": [
                        {{"id": 101, "title": "Jam kickoff thread", "slug": "jam-kickoff",
                          "tags": ["{tag}"], "image_url": "/uploads/kickoff.png"}},
                        {{"id": 102, "title": "Theme announcement", "slug": "theme",
                          "tags": ["{tag}"], "pinned": true}},
                        {{"id": 103, "title": "Submissions open", "slug": "submissions",
                          "tags": ["{tag}"]}},
                        {{"id": 104, "title": "Results and highlights", "slug": "results",
                          "tags": ["{tag}"]}}
                    ]
                }}
            }}"#
        );
        Ok(serde_json::from_str(&body)?)
    }
}

fn host_page() -> Document {
    parse_html(
        r#"
        <div class="container" data-featured-topic-slider-anchor="true">
            <div data-featured-topic-slider="true" class="featured-topic-slider"></div>
        </div>
        <div id="list-area">
            <div class="contents">
                <table class="topic-list">
                    <thead><tr><th>Topic</th><th>Replies</th><th>Views</th><th>Activity</th></tr></thead>
                    <tbody>
                        <tr class="topic-list-item"><td>A community topic</td></tr>
                        <tr class="topic-list-item"><td>Another community topic</td></tr>
                        <tr class="topic-list-item"><td>Weekly screenshots</td></tr>
                        <tr class="topic-list-item"><td>Engine talk</td></tr>
                        <tr class="topic-list-item"><td>Release party</td></tr>
                    </tbody>
                </table>
            </div>
        </div>
        "#,
    )
}

fn pump(engine: &mut PlacementEngine, doc: &mut Document) {
    while engine.run_frame(doc) {}
    // observer events the placement itself produced are drained and fed
    // back, which should settle immediately (positional idempotence)
    for _ in doc.take_mutations() {
        engine.handle_list_mutation(doc);
        while engine.run_frame(doc) {}
    }
}

fn run_demo<C: TopicClient + 'static>(client: C) {
    let settings = SliderSettings {
        insert_mode: InsertMode::AfterN,
        position_index: 2.0,
        show_on: "latest|top".into(),
        featured_tag: "game-jam".into(),
        topic_count: 4.0,
        shuffle_topics: false,
        show_title: true,
        title_text: "Featured topics".into(),
        ..SliderSettings::default()
    };

    let source = Arc::new(FeaturedTopicDataSource::new(client));
    let mut vm = CarouselViewModel::new(
        settings.clone(),
        SiteInfo::default(),
        Arc::clone(&source),
        "/latest",
        "en",
    );
    let mut engine = PlacementEngine::new(settings);
    let mut doc = host_page();

    println!("== navigate to /latest ==");
    engine.handle_navigation(&mut doc, &RouteInfo::new(Some("discovery.latest"), "/latest", ""));
    pump(&mut engine, &mut doc);
    println!("engine status: {:?}", engine.status());

    vm.load_topics(false);
    while !vm.check_fetch() {
        std::thread::yield_now();
    }
    match vm.error() {
        Some(error) => println!("topic fetch failed: {error}"),
        None => {
            println!("loaded {} topics:", vm.topics().len());
            for card in vm.topic_cards() {
                println!("  [{}] {} -> {}", card.id, card.title, card.url);
            }
        }
    }

    if let Some(list_area) = doc.find_by_id("list-area") {
        println!("\n== list after placement ==\n{}", outer_html(&doc, list_area));
    }

    println!("\n== host paginates (rows replaced) ==");
    simulate_pagination(&mut doc);
    engine.handle_list_mutation(&mut doc);
    pump(&mut engine, &mut doc);
    if let Some(list_area) = doc.find_by_id("list-area") {
        println!("{}", outer_html(&doc, list_area));
    }

    println!("\n== navigate to a topic page (disabled route) ==");
    engine.handle_navigation(&mut doc, &RouteInfo::new(Some("topic.show"), "/t/jam/101", ""));
    println!("engine status: {:?}", engine.status());
    if let Some(anchor) = engine.anchor() {
        println!("anchor html:\n{}", outer_html(&doc, anchor));
    }
}

fn simulate_pagination(doc: &mut Document) {
    let Some(tbody) = doc.find_by_tag(doc.root(), "tbody") else {
        return;
    };
    for row in doc.children(tbody).to_vec() {
        if doc.has_class(row, "topic-list-item") {
            doc.remove(row);
        }
    }
    for title in ["Page two topic", "Yet another thread", "Closing thoughts"] {
        let row = doc.create_element("tr");
        doc.set_attribute(row, "class", "topic-list-item");
        let text = doc.create_text(title);
        doc.append_child(row, text);
        doc.append_child(tbody, row);
    }
}

fn main() {
    env_logger::init();

    match std::env::args().nth(1) {
        Some(base_url) => match HttpTopicClient::new(&base_url) {
            Ok(client) => run_demo(client),
            Err(error) => {
                eprintln!("invalid base url {base_url}: {error}");
                std::process::exit(1);
            }
        },
        None => run_demo(CannedClient),
    }
}
