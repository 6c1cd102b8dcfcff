use super::*;

#[test]
fn block_metrics_scale_with_size() {
    let e = block_extent("abcd", 20.0);
    assert_eq!(e.width, 40.0);
    assert_eq!(e.height, 20.0);
    assert_eq!(block_extent("", 60.0).width, 0.0);
}

#[test]
fn builtin_book_resolves_every_key_to_block_face() {
    let mut book = FontBook::builtin_only();
    assert!(book.resolve("roboto").is_builtin());
    assert!(book.resolve("does-not-exist").is_builtin());
}

#[test]
fn missing_font_file_falls_back() {
    let mut paths = BTreeMap::new();
    paths.insert(
        "roboto".to_string(),
        PathBuf::from("/definitely/not/here/Roboto.ttf"),
    );
    let mut book = FontBook::new(paths, false);
    let face = book.resolve("roboto");
    assert!(face.is_builtin());
    assert_eq!(face.name(), "builtin-block");
}

#[test]
fn corrupt_font_file_falls_back() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.ttf");
    std::fs::write(&path, b"this is not a font").unwrap();

    let mut paths = BTreeMap::new();
    paths.insert("broken".to_string(), path);
    let mut book = FontBook::new(paths, false);
    assert!(book.resolve("broken").is_builtin());
}

#[test]
fn sized_block_font_measures_per_character() {
    let mut book = FontBook::builtin_only();
    let face = book.resolve("body");
    let mut font = book.sized(&face, 30.0);
    assert_eq!(font.size_px(), 30.0);
    assert_eq!(font.text_width("hello"), 75.0);
    assert_eq!(font.measure("hello").height, 30.0);
    assert!(font.layout_line("hello", TextBrushRgba8::default()).is_none());
    assert_eq!(font.block_ascent(), 24.0);
}

#[test]
fn outline_font_from_local_file_if_present() {
    let font_path = std::path::Path::new("static/fonts/Roboto-Regular.ttf");
    if !font_path.is_file() {
        return;
    }

    let mut paths = BTreeMap::new();
    paths.insert("roboto".to_string(), font_path.to_path_buf());
    let mut book = FontBook::new(paths, false);
    let face = book.resolve("roboto");
    assert!(!face.is_builtin());

    let mut font = book.sized(&face, 48.0);
    let short = font.text_width("hi");
    let long = font.text_width("hi there, a longer line");
    assert!(long > short);
    assert!(font.measure("hi").height > 0.0);
}
