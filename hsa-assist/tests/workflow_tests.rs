//! Assistant workflow tests: chat, review and approval against the stub service

mod helpers;

use std::sync::Arc;

use helpers::{
    approval_response, fast_client, receipt_a_response, receipt_b_response, StubMode, StubService,
};
use hsa_assist::models::{Eligibility, Role};
use hsa_assist::review::ReceiptField;
use hsa_assist::services::FileAttachment;
use hsa_assist::workflow::{Assistant, SessionIdentity};
use hsa_assist::{AppState, AssistError, ValidationFailure};
use rust_decimal::Decimal;

const PNG_HEADER: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];

fn receipt_file() -> FileAttachment {
    FileAttachment::from_bytes("cvs_receipt.png", PNG_HEADER.to_vec())
}

fn assistant_for(stub: &StubService) -> Assistant {
    let identity = SessionIdentity {
        session_ref: "session-1".to_string(),
        user_ref: "user-1".to_string(),
    };
    Assistant::new(Arc::new(fast_client(&stub.base_url)), AppState::volatile(), identity)
}

#[tokio::test]
async fn test_upload_installs_draft() {
    let stub = StubService::start(StubMode::Success).await;
    let assistant = assistant_for(&stub);

    let outcome = assistant
        .send_message("", vec![receipt_file()])
        .await
        .unwrap();

    assert!(outcome.draft_installed);
    let draft = assistant.current_draft().await.unwrap();
    assert_eq!(draft.receipt_ref(), "receipt-a");
    assert_eq!(draft.items(Eligibility::Eligible).len(), 2);
    assert_eq!(draft.items(Eligibility::NonEligible).len(), 1);
    assert_eq!(draft.total_eligible_cost(), Decimal::new(2097, 2));

    let transcript = assistant.transcript().await;
    assert_eq!(transcript.len(), 2);
    assert_eq!(transcript[0].role, Role::User);
    assert_eq!(
        transcript[0].attachments[0].file_name.as_deref(),
        Some("cvs_receipt.png")
    );
    assert_eq!(transcript[1].role, Role::Assistant);
}

#[tokio::test]
async fn test_retried_classification_matches_first_try() {
    let flaky = StubService::start(StubMode::FailTwiceThenSucceed).await;
    let steady = StubService::start(StubMode::Success).await;
    let after_retries = assistant_for(&flaky);
    let first_try = assistant_for(&steady);

    after_retries.send_message("receipt", vec![receipt_file()]).await.unwrap();
    first_try.send_message("receipt", vec![receipt_file()]).await.unwrap();

    assert_eq!(flaky.chat_calls(), 3);
    assert_eq!(steady.chat_calls(), 1);

    let contents = |messages: Vec<hsa_assist::models::ChatMessage>| {
        messages
            .into_iter()
            .map(|m| (m.role, m.content))
            .collect::<Vec<_>>()
    };
    assert_eq!(
        contents(after_retries.transcript().await),
        contents(first_try.transcript().await)
    );

    let a = after_retries.current_draft().await.unwrap();
    let b = first_try.current_draft().await.unwrap();
    assert_eq!(a.receipt_ref(), b.receipt_ref());
    assert_eq!(a.total_eligible_cost(), b.total_eligible_cost());
    assert_eq!(a.item_count(), b.item_count());
}

#[tokio::test]
async fn test_failed_classification_leaves_one_error_entry() {
    let stub = StubService::start(StubMode::AlwaysStatus(503)).await;
    let assistant = assistant_for(&stub);

    let err = assistant.send_message("hello", Vec::new()).await.unwrap_err();

    assert!(matches!(err, AssistError::ServiceUnavailable { status: 503 }));
    let transcript = assistant.transcript().await;
    assert_eq!(transcript.len(), 2);
    assert_eq!(transcript[1].role, Role::Assistant);
    assert!(transcript[1]
        .content
        .starts_with("Sorry, there was an error: Service unavailable (503)"));
    assert!(transcript[1].content.ends_with("Please try again later."));
    assert!(assistant.current_draft().await.is_none());
}

#[tokio::test]
async fn test_out_of_range_price_is_invalid_response() {
    let stub = StubService::start(StubMode::Success).await;
    let mut body = receipt_a_response();
    body["review_request"]["hsa_eligible_items"][0]["price"] = serde_json::json!(5.0e28);
    body["review_request"]["hsa_eligible_items"][0]["quantity"] = serde_json::json!(2);
    stub.set_chat_body(body);
    let assistant = assistant_for(&stub);

    let err = assistant.send_message("", vec![receipt_file()]).await.unwrap_err();

    assert!(matches!(err, AssistError::InvalidResponse(_)), "got {:?}", err);
    assert!(assistant.current_draft().await.is_none());
    // The user turn and one error entry; the service's reply is not shown
    let transcript = assistant.transcript().await;
    assert_eq!(transcript.len(), 2);
    assert!(transcript[1].content.starts_with("Sorry, there was an error:"));
}

#[tokio::test]
async fn test_validation_failure_blocks_dispatch() {
    let stub = StubService::start(StubMode::Success).await;
    let assistant = assistant_for(&stub).with_max_upload_bytes(4);

    let err = assistant
        .send_message("too big", vec![receipt_file()])
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        AssistError::Validation(ValidationFailure::FileTooLarge { .. })
    ));

    let err = assistant
        .send_message("notes", vec![FileAttachment::from_bytes("notes.txt", b"hi".to_vec())])
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        AssistError::Validation(ValidationFailure::UnsupportedMediaType { .. })
    ));

    let err = assistant.send_message("   ", Vec::new()).await.unwrap_err();
    assert!(matches!(err, AssistError::Validation(ValidationFailure::EmptyMessage)));

    assert_eq!(stub.chat_calls(), 0);
    assert!(assistant.transcript().await.is_empty());
}

#[tokio::test]
async fn test_approval_keeps_exactly_the_returned_eligible_items() {
    let stub = StubService::start(StubMode::Success).await;
    stub.set_review_body(approval_response(&[("Aspirin", true), ("Bandages", true)]));
    let assistant = assistant_for(&stub);
    assistant.send_message("", vec![receipt_file()]).await.unwrap();

    let outcome = assistant.approve().await.unwrap();

    assert_eq!(outcome.ledger_items, 2);
    assert!(assistant.current_draft().await.is_none());

    let ledger = assistant.state().ledger.read().await;
    let names: Vec<_> = ledger.items().iter().map(|i| i.name.as_str()).collect();
    assert_eq!(names, vec!["Aspirin", "Bandages"]);
    assert_eq!(ledger.history().len(), 1);
    assert_eq!(ledger.history()[0].store_name, "CVS Pharmacy");
}

#[tokio::test]
async fn test_approval_payload_reflects_edits() {
    let stub = StubService::start(StubMode::Success).await;
    let assistant = assistant_for(&stub);
    assistant.send_message("", vec![receipt_file()]).await.unwrap();

    assistant
        .edit_draft(|draft| {
            let candy = draft.items(Eligibility::NonEligible)[0].id;
            draft.update_receipt_field(ReceiptField::LastFour("12a3456".to_string()));
            draft.move_item(candy, Eligibility::NonEligible, Eligibility::Eligible)
        })
        .await
        .unwrap()
        .unwrap();

    assistant.approve().await.unwrap();

    let body = stub.last_review_request().unwrap();
    assert_eq!(body["receipt_id"], "receipt-a");
    assert_eq!(body["card_last_four_digit"], "1234");
    assert_eq!(body["date"], "2024-11-20T00:00:00.000Z");
    assert_eq!(body["total_cost"].as_f64(), Some(27.97));
    assert_eq!(body["approved_hsa_eligible_items"].as_array().unwrap().len(), 3);
    assert!(body["approved_hsa_eligible_items"][0].get("id").is_none());
    assert!(body["approved_non_hsa_eligible_items"].as_array().unwrap().is_empty());

    // Echoed back with all three flagged eligible
    assert_eq!(assistant.state().ledger.read().await.items().len(), 3);
}

#[tokio::test]
async fn test_rejected_approval_leaves_draft_untouched() {
    let stub = StubService::start(StubMode::Success).await;
    let assistant = assistant_for(&stub);
    assistant.send_message("", vec![receipt_file()]).await.unwrap();
    let before = assistant.current_draft().await.unwrap();

    stub.set_mode(StubMode::AlwaysStatus(400));
    let err = assistant.approve().await.unwrap_err();

    assert!(matches!(err, AssistError::RequestRejected { status: 400, .. }));
    assert_eq!(stub.review_calls(), 3);
    assert_eq!(assistant.current_draft().await, Some(before));
    assert!(assistant.state().ledger.read().await.items().is_empty());
    assert!(assistant.state().ledger.read().await.history().is_empty());
}

#[tokio::test]
async fn test_second_approval_replaces_ledger() {
    let stub = StubService::start(StubMode::Success).await;
    let assistant = assistant_for(&stub);

    assistant.send_message("", vec![receipt_file()]).await.unwrap();
    assistant.approve().await.unwrap();

    stub.set_chat_body(receipt_b_response());
    assistant.send_message("", vec![receipt_file()]).await.unwrap();
    assistant
        .edit_draft(|draft| {
            let gummies = draft.items(Eligibility::Unsure)[0].id;
            draft.resolve_unsure(gummies, Eligibility::Eligible)
        })
        .await
        .unwrap()
        .unwrap();
    assistant.approve().await.unwrap();

    let ledger = assistant.state().ledger.read().await;
    let mut names: Vec<_> = ledger.items().iter().map(|i| i.name.as_str()).collect();
    names.sort();
    assert_eq!(names, vec!["Thermometer", "Vitamin C Gummies"]);
    assert!(ledger.items().iter().all(|i| i.store_name == "Walgreens"));
    // History accumulates independently of the ledger
    assert_eq!(ledger.history().len(), 2);
}

#[tokio::test]
async fn test_discard_never_calls_service() {
    let stub = StubService::start(StubMode::Success).await;
    let assistant = assistant_for(&stub);
    assistant.send_message("", vec![receipt_file()]).await.unwrap();

    assert!(assistant.discard().await);
    assert!(assistant.current_draft().await.is_none());
    assert_eq!(stub.review_calls(), 0);

    let err = assistant.approve().await.unwrap_err();
    assert!(matches!(err, AssistError::NoActiveDraft));
}
