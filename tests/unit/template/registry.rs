use super::*;

fn temp_dir(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!(
        "collage_{name}_{}_{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos()
    ))
}

const TINY: &str = r#"<svg viewBox="0 0 100 100">
<polygon id="c" points="50,30 55,31 60,33 64,36 67,40 69,45 70,50 69,55 67,60 64,64 60,67 55,69 50,70 45,69 40,67 36,64"/>
<polygon id="b0" points="50,0 55,5 50,10 45,5"/>
</svg>"#;

#[test]
fn from_dir_registers_numeric_svgs_only() {
    let dir = temp_dir("registry_from_dir");
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("12.svg"), TINY).unwrap();
    std::fs::write(dir.join("30.svg"), TINY).unwrap();
    std::fs::write(dir.join("readme.svg"), TINY).unwrap();
    std::fs::write(dir.join("40.txt"), "x").unwrap();

    let reg = HexTemplateRegistry::from_dir(&dir).unwrap();
    assert_eq!(reg.member_counts().collect::<Vec<_>>(), vec![12, 30]);
    assert!(reg.contains(12));
    assert!(!reg.contains(40));

    let handle = reg.resolve(12).unwrap();
    assert_eq!(handle.path, dir.join("12.svg"));
    let t = extract(&handle).unwrap();
    assert_eq!(t.slots.len(), 2);
    assert_eq!(t.center().id, "c");

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn missing_count_is_template_not_found() {
    let reg = HexTemplateRegistry::new();
    assert!(reg.is_empty());
    let err = reg.resolve(7).unwrap_err();
    assert!(matches!(
        err,
        CollageError::TemplateNotFound {
            family: TemplateFamily::Hexagon,
            member_count: 7
        }
    ));
}

#[test]
fn unreadable_asset_is_parse_error() {
    let mut reg = HexTemplateRegistry::new();
    reg.insert(5, temp_dir("registry_missing").join("5.svg"));
    let handle = reg.resolve(5).unwrap();
    assert!(matches!(
        extract(&handle).unwrap_err(),
        CollageError::SvgParse(_)
    ));
}

#[test]
fn missing_dir_is_an_error() {
    assert!(HexTemplateRegistry::from_dir(temp_dir("registry_nope")).is_err());
}
