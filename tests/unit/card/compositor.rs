use super::*;

fn compositor() -> CardCompositor {
    CardCompositor::new(CardGeometry::default(), BTreeMap::new(), false)
}

fn job(out: PathBuf) -> RenderJob {
    RenderJob {
        text: "Body text for the card.\n\nSecond paragraph.".to_string(),
        title: "Title".to_string(),
        color_template_key: "sunset".to_string(),
        title_font_key: "msyh".to_string(),
        body_font_key: "msyh".to_string(),
        output_path: out,
    }
}

#[test]
fn render_writes_a_png_of_the_planned_size() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("cards").join("card.png");
    let c = compositor();

    let written = c.render(&job(out.clone())).unwrap();
    assert_eq!(written, out);

    let plan = c.plan(&job(out.clone())).unwrap();
    let decoded = image::open(&out).unwrap().to_rgba8();
    assert_eq!(decoded.width(), plan.image_width);
    assert_eq!(decoded.height(), plan.image_height);

    let leftovers: Vec<_> = std::fs::read_dir(out.parent().unwrap())
        .unwrap()
        .map(|e| e.unwrap().file_name())
        .collect();
    assert_eq!(leftovers, vec![std::ffi::OsString::from("card.png")]);
}

#[test]
fn unknown_template_falls_back_to_default() {
    let c = compositor();
    let mut j = job(PathBuf::from("unused.png"));
    j.color_template_key = "no-such-template".to_string();
    let image = c.rasterize(&j).unwrap();
    let corner = image.pixel(0, 0).unwrap();
    assert!(corner[0].abs_diff(138) <= 2 && corner[2].abs_diff(226) <= 2);
}

#[test]
fn failed_render_leaves_no_file_behind() {
    let dir = tempfile::tempdir().unwrap();
    let blocker = dir.path().join("blocker");
    std::fs::write(&blocker, b"not a directory").unwrap();

    let out = blocker.join("card.png");
    assert!(compositor().render(&job(out.clone())).is_err());
    assert!(!out.exists());

    let entries = std::fs::read_dir(dir.path()).unwrap().count();
    assert_eq!(entries, 1);
}

#[test]
fn invalid_geometry_fails_before_writing() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("card.png");
    let geometry = CardGeometry {
        font_step: 0,
        ..CardGeometry::default()
    };
    let c = CardCompositor::new(geometry, BTreeMap::new(), false);
    let err = c.render(&job(out.clone())).unwrap_err();
    assert!(err.is_validation());
    assert!(!out.exists());
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[test]
fn empty_output_path_is_rejected() {
    let err = compositor().render(&job(PathBuf::new())).unwrap_err();
    assert!(err.is_validation());
}
