use super::*;

fn grid(n: u32) -> TemplateVariant {
    TemplateVariant {
        family: TemplateFamily::Grid,
        member_count: n,
    }
}

fn hexagon(n: u32) -> TemplateVariant {
    TemplateVariant {
        family: TemplateFamily::Hexagon,
        member_count: n,
    }
}

#[test]
fn available_templates_combines_both_families() {
    let mut reg = HexTemplateRegistry::new();
    reg.insert(33, "33.svg");
    reg.insert(12, "12.svg");

    assert_eq!(available_templates(33, &reg), vec![grid(33), hexagon(33)]);
    assert_eq!(available_templates(12, &reg), vec![hexagon(12)]);
    assert_eq!(available_templates(40, &reg), vec![grid(40)]);
    assert!(available_templates(3, &reg).is_empty());
}

#[test]
fn initial_index_prefers_requested_family() {
    let both = vec![grid(33), hexagon(33)];
    assert_eq!(initial_template_index(&both, Some(TemplateFamily::Hexagon)), Some(1));
    assert_eq!(initial_template_index(&both, Some(TemplateFamily::Grid)), Some(0));
    assert_eq!(initial_template_index(&both, None), Some(0));

    let only_grid = vec![grid(33)];
    assert_eq!(
        initial_template_index(&only_grid, Some(TemplateFamily::Hexagon)),
        Some(0)
    );
    assert_eq!(initial_template_index(&[], Some(TemplateFamily::Grid)), None);
}

#[test]
fn build_slots_for_grid_has_center_first() {
    let reg = HexTemplateRegistry::new();
    let layout = build_slots(grid(33), &reg, &GridMetrics::default()).unwrap();
    assert_eq!(layout.slots.len(), 34);
    assert!(layout.slots[0].is_center);
    assert!(layout.view_box.width > 0.0);
}

#[test]
fn build_slots_reports_missing_templates() {
    let reg = HexTemplateRegistry::new();
    assert!(
        build_slots(hexagon(33), &reg, &GridMetrics::default())
            .unwrap_err()
            .is_template_not_found()
    );
    assert!(
        build_slots(grid(5), &reg, &GridMetrics::default())
            .unwrap_err()
            .is_template_not_found()
    );
}
