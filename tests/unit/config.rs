use super::*;

#[test]
fn empty_object_gives_defaults() {
    let cfg = EngineConfig::from_reader("{}".as_bytes()).unwrap();
    assert_eq!(cfg, EngineConfig::default());
    assert_eq!(cfg.scale, 2.0);
    assert_eq!(cfg.dpi, 300.0);
    assert_eq!(cfg.threads, None);
}

#[test]
fn partial_nested_sections_merge_with_defaults() {
    let json = r##"{
        "scale": 1.5,
        "grid": { "cell": 80 },
        "style": { "stroke": "#112233" },
        "placeholders": { "even": "ph/a.png", "odd": "ph/b.png" },
        "threads": 2
    }"##;
    let cfg = EngineConfig::from_reader(json.as_bytes()).unwrap();
    assert_eq!(cfg.scale, 1.5);
    assert_eq!(cfg.grid.cell, 80.0);
    assert_eq!(cfg.grid.gap, GridMetrics::default().gap);
    assert_eq!(cfg.style.stroke.to_hex(), "#112233");
    assert_eq!(cfg.threads, Some(2));
    assert_eq!(
        cfg.placeholders.odd,
        crate::assets::photo::PhotoSource::uri("ph/b.png")
    );
}

#[test]
fn invalid_values_are_validation_errors() {
    for json in [
        r#"{"scale": 0}"#,
        r#"{"dpi": -1}"#,
        r#"{"threads": 0}"#,
        r#"{"grid": {"cell": 0}}"#,
        r#"{"style": {"stroke_width": -2}}"#,
        r#"{"scale": "big"}"#,
    ] {
        let err = EngineConfig::from_reader(json.as_bytes()).unwrap_err();
        assert!(matches!(err, CollageError::Validation(_)), "{json}: {err}");
    }
}

#[test]
fn from_path_resolves_relative_dirs_next_to_the_file() {
    let dir = std::env::temp_dir().join(format!(
        "collage_config_{}_{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos()
    ));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("collage.json");
    std::fs::write(
        &path,
        r#"{"assets_root": "photos", "templates_dir": "/abs/templates"}"#,
    )
    .unwrap();

    let cfg = EngineConfig::from_path(&path).unwrap();
    assert_eq!(cfg.assets_root, dir.join("photos"));
    assert_eq!(cfg.templates_dir, Some(PathBuf::from("/abs/templates")));

    assert!(EngineConfig::from_path(dir.join("missing.json")).is_err());
    std::fs::remove_dir_all(&dir).ok();
}
