//! Backend JSON shapes for user records and session state.

use carelog_core::{Role, Session, SessionState, UserRecord};
use pretty_assertions::assert_eq;

#[test]
fn user_record_parses_backend_row() {
    let row = serde_json::json!({
        "id": "3f0c7a8e-0d1b-4c55-9b7e-5a1f2b9e0c11",
        "staff_number": "1001",
        "name": "Hana Sato",
        "role": "staff",
        "created_at": "2024-04-01T09:30:00Z"
    });

    let record: UserRecord = serde_json::from_value(row).expect("row should parse");
    assert_eq!(record.staff_number, "1001");
    assert_eq!(record.role, Role::Staff);
    assert_eq!(record.display_name(), "Hana Sato");
    assert_eq!(record.created_at.to_rfc3339(), "2024-04-01T09:30:00+00:00");
}

#[test]
fn user_record_without_name_uses_staff_number() {
    let row = serde_json::json!({
        "id": "uid",
        "staff_number": "admin",
        "role": "admin",
        "created_at": "2024-04-01T09:30:00Z"
    });

    let record: UserRecord = serde_json::from_value(row).expect("row should parse");
    assert_eq!(record.display_name(), "admin");
}

#[test]
fn user_record_rejects_unknown_role() {
    let row = serde_json::json!({
        "id": "uid",
        "staff_number": "1003",
        "name": "x",
        "role": "owner",
        "created_at": "2024-04-01T09:30:00Z"
    });

    assert!(serde_json::from_value::<UserRecord>(row).is_err());
}

#[test]
fn logged_in_state_carries_session_fields() {
    let record = UserRecord {
        id: "uid-2".into(),
        staff_number: "1002".into(),
        name: "Ken Mori".into(),
        role: Role::Admin,
        created_at: chrono::Utc::now(),
    };
    let state = SessionState::LoggedIn(Session::from_record(&record, chrono::Utc::now()));

    let json = serde_json::to_value(&state).expect("serialize");
    assert_eq!(json["status"], "logged_in");
    assert_eq!(json["subject_id"], "uid-2");
    assert_eq!(json["role"], "admin");

    let back: SessionState = serde_json::from_value(json).expect("deserialize");
    assert_eq!(back, state);
}
