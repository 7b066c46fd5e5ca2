use userbase_core::{NewUser, User, UserPatch};

#[test]
fn new_user_keeps_input_as_given() {
    let user = NewUser::new(" Anna ", "anna@x.com", None);

    assert_eq!(user.name, " Anna ");
    assert_eq!(user.email, "anna@x.com");
    assert_eq!(user.age, None);
}

#[test]
fn user_serialization_uses_expected_wire_fields() {
    let user = User {
        id: 12,
        name: "Petr".to_string(),
        email: "petr@x.com".to_string(),
        age: Some(35),
        created_at: 1_700_000_000_000,
    };

    let json = serde_json::to_value(&user).unwrap();
    assert_eq!(json["id"], 12);
    assert_eq!(json["name"], "Petr");
    assert_eq!(json["email"], "petr@x.com");
    assert_eq!(json["age"], 35);
    assert_eq!(json["created_at"], 1_700_000_000_000_i64);

    let decoded: User = serde_json::from_value(json).unwrap();
    assert_eq!(decoded, user);
}

#[test]
fn missing_age_serializes_as_null() {
    let user = NewUser::new("Anna", "anna@x.com", None);
    let json = serde_json::to_value(&user).unwrap();
    assert!(json["age"].is_null());
}

#[test]
fn patch_builder_sets_only_requested_fields() {
    let patch = UserPatch::default().email("new@x.com");

    assert_eq!(patch.name, None);
    assert_eq!(patch.email.as_deref(), Some("new@x.com"));
    assert_eq!(patch.age, None);
    assert!(!patch.is_empty());
}
