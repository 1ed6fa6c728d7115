use super::*;

// =============================================================
// Helpers
// =============================================================

fn make_user() -> User {
    User {
        id: "u-1".to_owned(),
        name: "Alice".to_owned(),
        email: "alice@example.com".to_owned(),
        location: Some("Pune".to_owned()),
        profile_complete: true,
        ..User::default()
    }
}

// =============================================================
// Role
// =============================================================

#[test]
fn role_decodes_admin_case_insensitively() {
    assert_eq!(Role::from_wire(Some("admin")), Role::Admin);
    assert_eq!(Role::from_wire(Some(" ADMIN ")), Role::Admin);
}

#[test]
fn role_unknown_or_missing_is_regular() {
    assert_eq!(Role::from_wire(Some("user")), Role::Regular);
    assert_eq!(Role::from_wire(Some("superuser")), Role::Regular);
    assert_eq!(Role::from_wire(None), Role::Regular);
}

#[test]
fn role_serializes_to_lowercase() {
    assert_eq!(serde_json::to_string(&Role::Admin).unwrap(), "\"admin\"");
    assert_eq!(serde_json::to_string(&Role::Regular).unwrap(), "\"regular\"");
}

// =============================================================
// User decoding
// =============================================================

#[test]
fn user_decodes_integer_id_and_regular_role() {
    let user: User = serde_json::from_value(serde_json::json!({"id": 1, "role": "regular"})).unwrap();
    assert_eq!(user.id, "1");
    assert_eq!(user.role, Role::Regular);
    assert!(user.location.is_none());
    assert!(!user.profile_complete);
}

#[test]
fn user_accepts_mongo_style_id_and_profile_flags() {
    let user: User = serde_json::from_value(serde_json::json!({
        "_id": "65f0",
        "name": "Bob",
        "email": "bob@example.com",
        "role": "admin",
        "location": "Delhi",
        "isProfileComplete": true,
        "budget": 5000,
        "isLookingForRoommate": "yes"
    }))
    .unwrap();
    assert_eq!(user.id, "65f0");
    assert!(user.is_admin());
    assert!(user.has_complete_profile());
    assert_eq!(user.budget.as_deref(), Some("5000"));
    assert_eq!(user.is_looking_for_roommate.as_deref(), Some("yes"));
}

#[test]
fn user_null_role_is_regular() {
    let user: User = serde_json::from_value(serde_json::json!({"id": "u", "role": null})).unwrap();
    assert_eq!(user.role, Role::Regular);
}

#[test]
fn user_without_id_is_rejected() {
    let result = serde_json::from_value::<User>(serde_json::json!({"name": "nobody"}));
    assert!(result.is_err());
}

#[test]
fn auth_response_decodes_user_and_token() {
    let resp: AuthResponse = serde_json::from_value(serde_json::json!({
        "user": {"id": 2, "role": "admin"},
        "token": "xyz"
    }))
    .unwrap();
    assert_eq!(resp.token, "xyz");
    assert_eq!(resp.user.role, Role::Admin);
}

// =============================================================
// User helpers
// =============================================================

#[test]
fn display_name_falls_back_to_handle_then_email() {
    let mut user = make_user();
    assert_eq!(user.display_name(), "Alice");
    user.name = " ".to_owned();
    user.username = Some("alice99".to_owned());
    assert_eq!(user.display_name(), "alice99");
    user.username = None;
    assert_eq!(user.display_name(), "alice@example.com");
}

#[test]
fn incomplete_profile_requires_location_and_flag() {
    let mut user = make_user();
    user.location = Some("  ".to_owned());
    assert!(!user.has_complete_profile());
    user.location = Some("Pune".to_owned());
    user.profile_complete = false;
    assert!(!user.has_complete_profile());
}

#[test]
fn apply_merges_present_fields_only() {
    let mut user = make_user();
    let patch: UserPatch = serde_json::from_value(serde_json::json!({
        "location": "Mumbai",
        "bio": "hi",
        "isProfileComplete": false
    }))
    .unwrap();
    user.apply(patch);
    assert_eq!(user.location.as_deref(), Some("Mumbai"));
    assert_eq!(user.bio.as_deref(), Some("hi"));
    assert!(!user.profile_complete);
    assert_eq!(user.name, "Alice");
    assert_eq!(user.id, "u-1");
}

#[test]
fn apply_can_change_role() {
    let mut user = make_user();
    user.apply(UserPatch { role: Some(Role::Admin), ..UserPatch::default() });
    assert!(user.is_admin());
}

#[test]
fn patch_ignores_unknown_fields_and_id() {
    let patch: UserPatch = serde_json::from_value(serde_json::json!({
        "_id": "other",
        "createdAt": "2024-01-01",
        "role": "moderator"
    }))
    .unwrap();
    assert_eq!(patch.role, Some(Role::Regular));
    let mut user = make_user();
    user.apply(patch);
    assert_eq!(user.id, "u-1");
}

// =============================================================
// ProfileUpdate
// =============================================================

#[test]
fn profile_update_prefills_form_defaults() {
    let update = ProfileUpdate::from_user(&User { id: "u".to_owned(), ..User::default() });
    assert_eq!(update.gender, "Male");
    assert_eq!(update.smoking, "non-smoker");
    assert_eq!(update.cleanliness, "standard");
    assert_eq!(update.is_looking_for_roommate, "yes");
    assert_eq!(update.has_apartment, "no");
    assert_eq!(update.food_preference, "any");
    assert_eq!(update.sleep_schedule, "flexible");
    assert!(update.password.is_empty());
}

#[test]
fn profile_update_requires_location_for_regular_users() {
    let mut update = ProfileUpdate::from_user(&make_user());
    update.location = String::new();
    assert!(update.validate(Role::Regular).is_err());
    assert!(update.validate(Role::Admin).is_ok());
}

#[test]
fn profile_update_rejects_bad_email_and_budget() {
    let mut update = ProfileUpdate::from_user(&make_user());
    update.email = "not-an-email".to_owned();
    assert_eq!(update.validate(Role::Regular), Err("Enter a valid email address.".to_owned()));
    update.email = "a@b.com".to_owned();
    update.budget = "lots".to_owned();
    assert_eq!(update.validate(Role::Regular), Err("Budget must be a whole number.".to_owned()));
}

#[test]
fn form_fields_omit_blank_password() {
    let update = ProfileUpdate::from_user(&make_user());
    let fields = update.form_fields();
    assert!(fields.iter().all(|(k, _)| *k != "password"));
    assert!(fields.iter().all(|(k, _)| *k != "removeImage"));
    assert!(fields.contains(&("location", "Pune".to_owned())));
}

#[test]
fn form_fields_include_password_and_remove_flag_when_set() {
    let mut update = ProfileUpdate::from_user(&make_user());
    update.password = "hunter2".to_owned();
    update.remove_image = true;
    let fields = update.form_fields();
    assert!(fields.contains(&("password", "hunter2".to_owned())));
    assert!(fields.contains(&("removeImage", "true".to_owned())));
}

// =============================================================
// Joined date and refresh patches
// =============================================================

#[test]
fn joined_on_keeps_calendar_date() {
    let user = User { created_at: Some("2024-03-09T10:11:12.000Z".to_owned()), ..make_user() };
    assert_eq!(user.joined_on(), Some("2024-03-09"));
}

#[test]
fn joined_on_missing_or_short_timestamp_is_none() {
    assert_eq!(make_user().joined_on(), None);
    let user = User { created_at: Some("2024".to_owned()), ..make_user() };
    assert_eq!(user.joined_on(), None);
}

#[test]
fn fetched_user_patch_keeps_local_id() {
    let mut current = make_user();
    let fetched = User {
        id: "other".to_owned(),
        location: Some("Delhi".to_owned()),
        bio: Some("hi".to_owned()),
        ..make_user()
    };

    current.apply(fetched.into());

    assert_eq!(current.id, "u-1");
    assert_eq!(current.location.as_deref(), Some("Delhi"));
    assert_eq!(current.bio.as_deref(), Some("hi"));
}
