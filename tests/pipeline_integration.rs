//! End-to-end runs of the marker pipeline on small hand-built feeds.

use serde_json::json;
use townmap::color::{threshold_color, MapMode};
use townmap::data::parse_feed;
use townmap::gradients::{Color, ColorStop, Palette};
use townmap::{process_markers, RawMarker};

fn popup(name: &str, nation: Option<&str>, founded: &str, residents: &[&str]) -> String {
    let heading = match nation {
        Some(nation) => format!(r#"<a href="https://wiki/{name}">{name}</a> (<a href="https://wiki/{nation}">{nation}</a>)"#),
        None => name.to_string(),
    };
    format!(
        r#"
        <div class="infowindow">
            <span style="font-size:120%;">{heading}</span><br>
            <i>Board of {name}</i><br>
            <span>Mayor: <b>{mayor}</b></span><br>
            <span>Councillors: <b>None</b></span><br>
            <span>Founded: <b>{founded}</b></span><br>
            <span>PVP: <b>false</b></span><br>
            <span>Public: <b>true</b></span><br>
            <details>
                <summary>Residents</summary>
                {residents}
            </details>
        </div>"#,
        mayor = residents.first().copied().unwrap_or("nobody"),
        residents = residents.join(", "),
    )
}

/// Axis-aligned rectangle of `width` x `depth` blocks at `(x, z)`.
fn rect(x: i64, z: i64, width: i64, depth: i64) -> serde_json::Value {
    json!([
        {"x": x, "z": z},
        {"x": x + width, "z": z},
        {"x": x + width, "z": z + depth},
        {"x": x, "z": z + depth}
    ])
}

fn town_marker(popup: String, points: serde_json::Value) -> serde_json::Value {
    json!({
        "type": "polygon",
        "popup": popup,
        "points": points,
        "color": "#3FB4FF",
        "fillColor": "#3FB4FF",
        "opacity": 0.3,
        "weight": 1
    })
}

fn markers(values: Vec<serde_json::Value>) -> Vec<RawMarker> {
    serde_json::from_value(serde_json::Value::Array(values)).unwrap()
}

#[test]
fn nation_colors_use_combined_totals() {
    let residents_a = ["a1", "a2", "a3", "a4", "a5"];
    let residents_b = ["b1", "b2", "b3", "b4", "b5", "b6", "b7"];
    // 10 and 20 chunks
    let feed = markers(vec![
        town_marker(popup("Alpha", Some("Nordland"), "Jan 1 2021", &residents_a), rect(0, 0, 64, 40)),
        town_marker(popup("Beta", Some("Nordland"), "Jan 1 2023", &residents_b), rect(1000, 0, 64, 80)),
    ]);

    let palette = Palette::default();
    let ingestion = process_markers(&feed, &palette);
    assert_eq!(ingestion.records.len(), 2);

    let totals = ingestion.stats.nations.get("Nordland");
    assert_eq!(totals.population, 12);
    assert_eq!(totals.area_chunks, 30.0);

    let alpha = &ingestion.records[0];
    let beta = &ingestion.records[1];
    assert_eq!(alpha.residents_count, 5);
    assert_eq!(alpha.area_chunks, 10.0);
    assert_eq!(beta.residents_count, 7);
    assert_eq!(beta.area_chunks, 20.0);

    for record in [alpha, beta] {
        assert_eq!(record.nation_population, 12);
        assert_eq!(record.nation_area_chunks, 30.0);
        assert_eq!(
            record.colors.nation_population,
            threshold_color(12.0, &palette.nation_population, palette.fallback)
        );
        assert_eq!(
            record.colors.nation_claims,
            threshold_color(30.0, &palette.nation_claims, palette.fallback)
        );
    }

    // 12 residents reach the ">= 8" band that neither town reaches alone.
    assert_eq!(alpha.colors.nation_population, Color::hex(0x4D0000));
    assert_eq!(alpha.colors.population, Color::hex(0x7C0000));
    assert_eq!(
        threshold_color(5.0, &palette.nation_population, palette.fallback),
        Color::hex(0x2D0000)
    );

    // oldest is blue, newest is red
    assert_eq!(alpha.colors.founded, Color::rgb(0, 0, 255));
    assert_eq!(beta.colors.founded, Color::rgb(255, 0, 0));
}

#[test]
fn custom_palette_distinguishes_nation_claims() {
    let mut palette = Palette::default();
    palette.nation_claims = vec![ColorStop::new(25.0, 0x00FF00), ColorStop::new(1.0, 0xFF0000)];

    let feed = markers(vec![
        town_marker(popup("Alpha", Some("N"), "Jan 1 2021", &["a"]), rect(0, 0, 64, 40)),
        town_marker(popup("Beta", Some("N"), "Jan 1 2021", &["b"]), rect(500, 500, 64, 80)),
        town_marker(popup("Gamma", Some("M"), "Jan 1 2021", &["c"]), rect(900, 900, 64, 80)),
    ]);
    let ingestion = process_markers(&feed, &palette);

    let color_of = |name: &str| {
        ingestion
            .records
            .iter()
            .find(|r| r.town.name == name)
            .map(|r| r.colors.get(MapMode::NationClaims))
    };
    assert_eq!(color_of("Alpha"), Some(Color::hex(0x00FF00)));
    assert_eq!(color_of("Beta"), Some(Color::hex(0x00FF00)));
    assert_eq!(color_of("Gamma"), Some(Color::hex(0xFF0000)));
}

#[test]
fn mixed_layer_feed() {
    let feed = json!([
        {"id": "chunky", "markers": [town_marker(popup("Ghost", None, "Jan 1 2020", &["g"]), rect(0, 0, 16, 16))]},
        {"id": "towny", "markers": [
            town_marker(popup("Solo", None, "not a date", &["s", "", " "]), rect(0, 0, 16, 16)),
            town_marker("<div>Spawn area</div>".to_string(), rect(0, 0, 16, 16)),
            {"type": "icon", "popup": "Shop", "point": {"x": 3, "z": 4}},
            town_marker(popup("Split", Some("Isles"), "Mar 3 2022", &["x", "y"]), json!([rect(0, 0, 16, 16), rect(64, 64, 32, 16)]))
        ]}
    ]);
    let markers = parse_feed(feed.to_string().as_bytes(), "towny").unwrap();
    assert_eq!(markers.len(), 4);

    let palette = Palette::default();
    let ingestion = process_markers(&markers, &palette);
    let names: Vec<_> = ingestion.records.iter().map(|r| r.town.name.as_str()).collect();
    assert_eq!(names, ["Solo", "Split"]);

    let solo = &ingestion.records[0];
    assert_eq!(solo.residents_count, 1);
    assert_eq!(solo.founded_at, None);
    assert_eq!(solo.colors.founded, palette.no_date);
    assert_eq!(solo.colors.nation_population, palette.no_nation);
    assert_eq!(solo.density, 1.0);

    let split = &ingestion.records[1];
    assert_eq!(split.area_chunks, 3.0);
    assert_eq!(split.town.nation_name.as_deref(), Some("Isles"));
    // only one dated town
    assert_eq!(ingestion.stats.dates.map(|r| r.min), split.founded_at);
    assert_eq!(split.colors.founded, Color::rgb(0, 255, 0));

    let json = serde_json::to_value(split).unwrap();
    assert_eq!(json["points"].as_array().map(Vec::len), Some(2));
    assert_eq!(json["points"][1][0], json!([64.0, 64.0]));
}

#[test]
fn reingestion_is_deterministic() {
    let feed = markers(vec![
        town_marker(popup("Alpha", Some("N"), "Jan 1 2021", &["a", "b"]), rect(0, 0, 48, 48)),
        town_marker(popup("Beta", None, "Feb 1 2021", &["c"]), rect(100, 0, 16, 16)),
    ]);
    let palette = Palette::default();
    let first = process_markers(&feed, &palette);
    let second = process_markers(&feed, &palette);
    assert_eq!(first.records, second.records);
    assert_eq!(first.stats, second.stats);
}
