use cookie_session::SessionConfig;


#[test]
fn all_fields_have_a_default_value() {
    assert!(serde_json::from_str::<SessionConfig>("{}").is_ok());
}

#[test]
fn the_secret_is_not_leaked_by_debug() {
    let config = SessionConfig::default().with_secret("super-secret-key");
    let debug = format!("{config:?}");
    assert!(!debug.contains("super-secret-key"));
}

#[test]
fn the_secret_can_be_deserialized() {
    let config: SessionConfig = serde_json::from_str(r#"{"secret": "test"}"#).unwrap();
    assert!(config.secret.is_some());

    let config: SessionConfig = serde_json::from_str("{}").unwrap();
    assert!(config.secret.is_none());
}
