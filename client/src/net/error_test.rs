use super::*;

fn message(text: &str) -> ErrorBody {
    ErrorBody {
        message: Some(text.to_owned()),
        msg: None,
    }
}

fn msg(text: &str) -> ErrorBody {
    ErrorBody {
        message: None,
        msg: Some(text.to_owned()),
    }
}

// =============================================================
// looks_like_auth_failure
// =============================================================

#[test]
fn unauthorized_status_always_matches() {
    assert!(looks_like_auth_failure(401, &ErrorBody::default()));
    assert!(looks_like_auth_failure(401, &message("Invalid credentials")));
}

#[test]
fn other_statuses_without_message_do_not_match() {
    assert!(!looks_like_auth_failure(403, &ErrorBody::default()));
    assert!(!looks_like_auth_failure(500, &ErrorBody::default()));
}

#[test]
fn each_marker_matches_in_message_field() {
    assert!(looks_like_auth_failure(422, &message("Bad token")));
    assert!(looks_like_auth_failure(422, &message("Signature has expired")));
    assert!(looks_like_auth_failure(422, &message("invalid header padding")));
}

#[test]
fn each_marker_matches_in_msg_field() {
    assert!(looks_like_auth_failure(422, &msg("Missing token")));
    assert!(looks_like_auth_failure(422, &msg("Token has expired")));
    assert!(looks_like_auth_failure(422, &msg("invalid crypto padding")));
}

#[test]
fn matching_is_case_sensitive() {
    assert!(!looks_like_auth_failure(422, &message("Token")));
    assert!(!looks_like_auth_failure(422, &message("EXPIRED")));
    assert!(!looks_like_auth_failure(422, &msg("Invalid")));
}

#[test]
fn unrelated_messages_do_not_match() {
    assert!(!looks_like_auth_failure(403, &message("Permission denied")));
    assert!(!looks_like_auth_failure(400, &msg("Username already exists")));
}

#[test]
fn unrelated_message_with_marker_word_still_matches() {
    assert!(looks_like_auth_failure(400, &message("invalid image format")));
}

#[test]
fn either_field_is_enough() {
    let body = ErrorBody {
        message: Some("Permission denied".to_owned()),
        msg: Some("token revoked".to_owned()),
    };
    assert!(looks_like_auth_failure(403, &body));
}

// =============================================================
// classify_failure
// =============================================================

#[test]
fn classify_unauthorized_uses_body_message() {
    let err = classify_failure(401, r#"{"message":"Invalid credentials"}"#, "Login failed");
    assert_eq!(
        err,
        ApiError::Unauthorized {
            status: 401,
            message: "Invalid credentials".to_owned()
        }
    );
    assert!(err.ends_session());
}

#[test]
fn classify_sniffed_message_as_unauthorized() {
    let err = classify_failure(422, r#"{"msg":"Signature verification failed: token"}"#, "x");
    assert!(err.ends_session());
}

#[test]
fn classify_other_failure_keeps_session() {
    let err = classify_failure(403, r#"{"message":"Permission denied"}"#, "Failed to delete post");
    assert_eq!(
        err,
        ApiError::Status {
            status: 403,
            message: "Permission denied".to_owned()
        }
    );
    assert!(!err.ends_session());
}

#[test]
fn classify_uses_fallback_for_non_json_body() {
    let err = classify_failure(502, "Bad Gateway", "Failed to load posts");
    assert_eq!(err.to_string(), "request failed (502): Failed to load posts");
}

#[test]
fn transport_errors_keep_session() {
    assert!(!ApiError::Transport("offline".to_owned()).ends_session());
    assert!(!ApiError::Decode("eof".to_owned()).ends_session());
}
