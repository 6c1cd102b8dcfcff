use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(
        CardcastError::validation("x")
            .to_string()
            .contains("validation error:")
    );
    assert!(CardcastError::render("x").to_string().contains("render error:"));
    assert!(
        CardcastError::storage("x")
            .to_string()
            .contains("storage error:")
    );
    assert!(CardcastError::speech("x").to_string().contains("speech error:"));
    assert!(CardcastError::encode("x").to_string().contains("encode error:"));
    assert!(
        CardcastError::resource("x")
            .to_string()
            .contains("resource error:")
    );
    assert!(
        CardcastError::serde("x")
            .to_string()
            .contains("serialization error:")
    );
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = CardcastError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
    assert!(!err.is_validation());
}

#[test]
fn validation_is_classified_as_input_error() {
    assert!(CardcastError::validation("too long").is_validation());
    assert!(!CardcastError::render("x").is_validation());
}
