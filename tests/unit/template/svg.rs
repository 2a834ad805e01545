use std::f64::consts::{PI, TAU};

use super::*;

fn ring(cx: f64, cy: f64, r: f64, n: usize) -> String {
    (0..n)
        .map(|i| {
            let a = i as f64 * TAU / n as f64;
            format!("{:.3},{:.3}", cx + r * a.cos(), cy + r * a.sin())
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Six hexagons around a 24-vertex center, written in a scrambled document order.
fn hex_template() -> String {
    let mut body = String::new();
    // Angles in screen space (y down): right, bottom, left, top, top-right, bottom-left.
    let placements = [
        ("east", 0.0),
        ("south", PI / 2.0),
        ("west", PI),
        ("north", -PI / 2.0),
        ("north-east", -PI / 4.0),
        ("south-west", 3.0 * PI / 4.0),
    ];
    for (id, a) in placements {
        let (x, y) = (500.0 + 300.0 * a.cos(), 500.0 + 300.0 * a.sin());
        body.push_str(&format!(
            "<polygon id=\"{id}\" points=\"{}\"/>\n",
            ring(x, y, 80.0, 6)
        ));
    }
    body.push_str(&format!(
        "<polygon id=\"middle\" points=\"{}\"/>\n",
        ring(500.0, 500.0, 180.0, 24)
    ));
    format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" viewBox=\"0 0 1000 1000\">\n<g>{body}</g>\n</svg>"
    )
}

#[test]
fn extracts_one_center_and_orders_border_clockwise_from_top() {
    let t = extract_svg(&hex_template()).unwrap();
    assert_eq!(t.view_box, ViewBox::new(0.0, 0.0, 1000.0, 1000.0).unwrap());
    assert_eq!(t.slots.len(), 7);
    assert_eq!(t.slots.iter().filter(|s| s.is_center).count(), 1);
    assert_eq!(t.center().id, "middle");
    assert_eq!(t.center().vertex_count, 24);

    let ids: Vec<&str> = t.border().iter().map(|s| s.id.as_str()).collect();
    assert_eq!(
        ids,
        vec!["north", "north-east", "east", "south", "south-west", "west"]
    );

    let origin = t.view_box.center();
    let angles: Vec<f64> = t
        .border()
        .iter()
        .map(|s| clockwise_angle(s.centroid, origin))
        .collect();
    assert!(angles.windows(2).all(|w| w[0] <= w[1]));
}

#[test]
fn clockwise_angle_reference_points() {
    let o = Point::new(0.0, 0.0);
    assert!(clockwise_angle(Point::new(0.0, -1.0), o).abs() < 1e-12);
    assert!((clockwise_angle(Point::new(1.0, 0.0), o) - PI / 2.0).abs() < 1e-12);
    assert!((clockwise_angle(Point::new(0.0, 1.0), o) - PI).abs() < 1e-12);
    assert!((clockwise_angle(Point::new(-1.0, 0.0), o) - 1.5 * PI).abs() < 1e-12);
}

#[test]
fn centroid_bbox_and_path_data() {
    let svg = r#"<svg viewBox="0 0 100 100">
        <polygon id="sq" points="10,10 30,10 30,20 10,20"/>
        <polygon id="big" points="50,50 51,50 52,50 53,50 54,50 55,50 56,50 57,50 58,50 59,50 60,50 60,60 59,60 58,60 57,60 56,60"/>
    </svg>"#;
    let t = extract_svg(svg).unwrap();
    assert_eq!(t.center().id, "big");
    let sq = &t.border()[0];
    assert_eq!(sq.centroid, Point::new(20.0, 15.0));
    assert_eq!(
        sq.bounding_box,
        BoundingBox {
            x: 10.0,
            y: 10.0,
            w: 20.0,
            h: 10.0
        }
    );
    assert_eq!(sq.path_data, "M 10 10 L 30 10 L 30 20 L 10 20 Z");
    assert_eq!(sq.points().len(), 4);
}

#[test]
fn missing_view_box_uses_fallback() {
    let svg = format!(
        "<svg><polygon points=\"{}\"/><polygon points=\"0,0 10,0 5,8\"/></svg>",
        ring(500.0, 500.0, 100.0, 20)
    );
    let t = extract_svg(&svg).unwrap();
    assert_eq!(t.view_box, ViewBox::FALLBACK);
    assert_eq!(t.center().id, "polygon-0");
    assert_eq!(t.border()[0].id, "polygon-1");
}

#[test]
fn template_without_large_polygon_has_no_center() {
    let svg = format!(
        "<svg viewBox=\"0 0 10 10\"><polygon points=\"{}\"/><polygon points=\"{}\"/></svg>",
        ring(3.0, 3.0, 1.0, 6),
        ring(7.0, 7.0, 1.0, 15)
    );
    let err = extract_svg(&svg).unwrap_err();
    assert!(matches!(err, CollageError::SvgParse(_)));
}

#[test]
fn tied_center_candidates_keep_first_only() {
    let svg = format!(
        "<svg viewBox=\"0 0 100 100\"><polygon id=\"a\" points=\"{}\"/><polygon id=\"b\" points=\"{}\"/></svg>",
        ring(30.0, 50.0, 10.0, 16),
        ring(70.0, 50.0, 10.0, 16)
    );
    let t = extract_svg(&svg).unwrap();
    assert_eq!(t.center().id, "a");
    assert_eq!(t.slots.iter().filter(|s| s.is_center).count(), 1);
    assert_eq!(t.border()[0].id, "b");
}

#[test]
fn malformed_documents_are_parse_errors() {
    for bad in [
        "<svg",
        "<html></html>",
        "<svg viewBox=\"0 0 1 1\"></svg>",
        "<svg><polygon points=\"1,2 3\"/></svg>",
        "<svg><polygon points=\"1,2 3,4\"/></svg>",
        "<svg><polygon points=\"a,b c,d e,f\"/></svg>",
    ] {
        let err = extract_svg(bad).unwrap_err();
        assert!(matches!(err, CollageError::SvgParse(_)), "{bad}: {err}");
    }
}

#[test]
fn polygon_transform_moves_geometry_but_not_path_data() {
    let svg = format!(
        "<svg viewBox=\"0 0 100 100\"><polygon points=\"{}\"/><polygon id=\"t\" transform=\"translate(10 5) scale(2)\" points=\"0,0 4,0 4,4 0,4\"/></svg>",
        ring(50.0, 50.0, 10.0, 18)
    );
    let t = extract_svg(&svg).unwrap();
    let parsed = &t.border()[0];
    assert_eq!(parsed.transform.as_deref(), Some("matrix(2 0 0 2 10 5)"));
    assert_eq!(parsed.path_data, "M 0 0 L 4 0 L 4 4 L 0 4 Z");
    assert_eq!(
        parsed.bounding_box,
        BoundingBox {
            x: 10.0,
            y: 5.0,
            w: 8.0,
            h: 8.0
        }
    );
    assert_eq!(parsed.centroid, Point::new(14.0, 9.0));

    let slot = parsed.to_slot().unwrap();
    assert!((slot.bbox.x0 - 10.0).abs() < 1e-9);
    assert!((slot.bbox.y0 - 5.0).abs() < 1e-9);
    assert!((slot.bbox.width() - 8.0).abs() < 1e-9);
    assert!(!slot.is_center);

    let slots = t.to_slots().unwrap();
    assert!(slots[0].is_center);
    assert!(t.center().transform.is_none());
}

#[test]
fn group_transforms_compose_into_slot_geometry() {
    // Template drawn in local 0..1000 space, shifted right by a group onto the view box.
    let inner = hex_template()
        .replace(
            "<svg xmlns=\"http://www.w3.org/2000/svg\" viewBox=\"0 0 1000 1000\">",
            "<svg xmlns=\"http://www.w3.org/2000/svg\" viewBox=\"1000 0 1000 1000\"><g transform=\"translate(1000,0)\">",
        )
        .replace("</svg>", "</g></svg>");
    let t = extract_svg(&inner).unwrap();
    assert_eq!(t.center().id, "middle");

    let c = t.center().bounding_box;
    assert!((c.x - 1320.0).abs() < 1e-6, "{c:?}");
    assert!((c.x + c.w - 1680.0).abs() < 1e-6, "{c:?}");

    let ids: Vec<&str> = t.border().iter().map(|s| s.id.as_str()).collect();
    assert_eq!(
        ids,
        vec!["north", "north-east", "east", "south", "south-west", "west"]
    );

    let slots = t.to_slots().unwrap();
    assert!(slots.iter().all(|s| s.bbox.x0 >= 1000.0));
    assert!((slots[0].bbox.center().x - 1500.0).abs() < 1e-6);
}

#[test]
fn nested_transforms_apply_outermost_last() {
    let svg = format!(
        "<svg viewBox=\"0 0 100 100\"><polygon points=\"{}\"/>\
         <g transform=\"translate(50 0)\"><g transform=\"scale(2)\">\
         <polygon id=\"t\" transform=\"translate(1 1)\" points=\"0,0 2,0 2,2 0,2\"/></g></g></svg>",
        ring(50.0, 50.0, 10.0, 18)
    );
    let t = extract_svg(&svg).unwrap();
    let parsed = &t.border()[0];
    assert_eq!(parsed.transform.as_deref(), Some("matrix(2 0 0 2 52 2)"));
    assert_eq!(parsed.points()[0], Point::new(52.0, 2.0));
    assert_eq!(parsed.points()[2], Point::new(56.0, 6.0));
}

#[test]
fn invalid_group_transform_is_a_parse_error() {
    let svg = format!(
        "<svg viewBox=\"0 0 100 100\"><g transform=\"spin(3)\"><polygon points=\"{}\"/></g></svg>",
        ring(50.0, 50.0, 10.0, 18)
    );
    let err = extract_svg(&svg).unwrap_err();
    assert!(matches!(err, CollageError::SvgParse(_)), "{err}");
}

#[test]
fn transform_parser_variants() {
    let a = parse_transform("matrix(1 0 0 1 3 4)").unwrap();
    assert_eq!(a * Point::new(0.0, 0.0), Point::new(3.0, 4.0));
    let r = parse_transform("rotate(90)").unwrap() * Point::new(1.0, 0.0);
    assert!((r.x).abs() < 1e-9 && (r.y - 1.0).abs() < 1e-9);
    let about = parse_transform("rotate(180, 5, 5)").unwrap() * Point::new(0.0, 5.0);
    assert!((about.x - 10.0).abs() < 1e-9 && (about.y - 5.0).abs() < 1e-9);
    assert!(parse_transform("perspective(3)").is_err());
    assert!(parse_transform("translate(1").is_err());
}
