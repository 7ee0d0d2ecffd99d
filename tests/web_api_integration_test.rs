use birthday_notifier::domain::model::{QueryFailurePolicy, SendFailurePolicy, SendOutcome};
use birthday_notifier::{
    BirthdayNotifier, ExecutionContext, FixedClock, NotifierError, NotifierSettings, RunParameters,
    UserId, WebApiClient,
};
use chrono::NaiveDate;
use httpmock::prelude::*;
use serde_json::json;

fn notifier(settings: NotifierSettings) -> BirthdayNotifier<FixedClock> {
    let today = NaiveDate::from_ymd_opt(2025, 3, 15).unwrap();
    BirthdayNotifier::new(FixedClock::new(today), settings)
}

fn params() -> RunParameters {
    RunParameters::new("Happy birthday!", "Warm wishes from all of us.")
}

fn mock_contacts(server: &MockServer, contacts: serde_json::Value) -> httpmock::Mock<'_> {
    server.mock(|when, then| {
        when.method(GET)
            .path("/contacts")
            .query_param("$select", "contactid,fullname,birthdate")
            .query_param("$filter", "birthdate ne null")
            .header("Authorization", "Bearer test-token");
        then.status(200)
            .header("Content-Type", "application/json")
            .json_body(json!({ "value": contacts }));
    })
}

#[tokio::test]
async fn test_end_to_end_sends_to_todays_birthdays() {
    let server = MockServer::start();

    let contacts_mock = mock_contacts(
        &server,
        json!([
            {"contactid": "c-1", "fullname": "Ada Lovelace", "birthdate": "1980-03-15"},
            {"contactid": "c-2", "fullname": "Alan Turing", "birthdate": "1912-06-23"},
            {"contactid": "c-3", "fullname": "Broken Date", "birthdate": "15.03.1980"}
        ]),
    );

    let create_mock = server.mock(|when, then| {
        when.method(POST)
            .path("/emails")
            .header("Prefer", "return=representation")
            .json_body(json!({
                "subject": "Happy birthday!",
                "description": "Warm wishes from all of us.",
                "directioncode": true,
                "regardingobjectid_contact@odata.bind": "/contacts(c-1)",
                "email_activity_parties": [
                    {"partyid_systemuser@odata.bind": "/systemusers(u-1)", "participationtypemask": 1},
                    {"partyid_contact@odata.bind": "/contacts(c-1)", "participationtypemask": 2}
                ]
            }));
        then.status(201).json_body(json!({ "activityid": "e-1" }));
    });

    let send_mock = server.mock(|when, then| {
        when.method(POST)
            .path("/emails(e-1)/Microsoft.Dynamics.CRM.SendEmail")
            .json_body(json!({ "IssueSend": true, "TrackingToken": "" }));
        then.status(200).json_body(json!({ "Subject": "Happy birthday!" }));
    });

    let client = WebApiClient::new(server.base_url(), Some("test-token".to_string()));
    let context = ExecutionContext {
        initiating_user: UserId("u-1".to_string()),
        store: &client,
        transport: &client,
    };

    let summary = notifier(NotifierSettings::default())
        .run(&context, &params())
        .await
        .unwrap();

    contacts_mock.assert();
    create_mock.assert();
    send_mock.assert();

    assert_eq!(summary.candidates, 3);
    assert_eq!(summary.matched, 1);
    assert_eq!(summary.skipped, 1);
    assert_eq!(summary.sent(), 1);
    assert!(matches!(
        &summary.outcomes[0],
        SendOutcome::Sent { receipt, .. } if receipt.message_id == "e-1"
    ));
}

#[tokio::test]
async fn test_follows_next_link_pages() {
    let server = MockServer::start();

    let second_page = server.mock(|when, then| {
        when.method(GET).path("/contacts/page2");
        then.status(200).json_body(json!({
            "value": [{"contactid": "c-2", "fullname": "Second", "birthdate": "1999-03-15"}]
        }));
    });
    let first_page = server.mock(|when, then| {
        when.method(GET)
            .path("/contacts")
            .query_param("$filter", "birthdate ne null");
        then.status(200).json_body(json!({
            "value": [{"contactid": "c-1", "fullname": "First", "birthdate": "1999-01-01"}],
            "@odata.nextLink": server.url("/contacts/page2")
        }));
    });

    let client = WebApiClient::new(server.base_url(), None);
    let records = birthday_notifier::core::RecordStore::query_records(
        &client,
        &birthday_notifier::domain::ports::RecordQuery::contacts_with_birthdate(),
    )
    .await
    .unwrap();

    first_page.assert();
    second_page.assert();
    assert_eq!(records.len(), 2);
    assert_eq!(records[1].id.0, "c-2");
}

#[tokio::test]
async fn test_receipt_from_entity_id_header() {
    let server = MockServer::start();

    mock_contacts(
        &server,
        json!([{"contactid": "c-1", "fullname": "Header Id", "birthdate": "2001-03-15T00:00:00Z"}]),
    );
    server.mock(|when, then| {
        when.method(POST).path("/emails");
        then.status(204)
            .header("OData-EntityId", server.url("/emails(e-77)"));
    });
    let send_mock = server.mock(|when, then| {
        when.method(POST)
            .path("/emails(e-77)/Microsoft.Dynamics.CRM.SendEmail");
        then.status(200);
    });

    let client = WebApiClient::new(server.base_url(), Some("test-token".to_string()));
    let context = ExecutionContext {
        initiating_user: UserId("u-1".to_string()),
        store: &client,
        transport: &client,
    };

    let summary = notifier(NotifierSettings::default())
        .run(&context, &params())
        .await
        .unwrap();

    send_mock.assert();
    assert_eq!(summary.sent(), 1);
}

#[tokio::test]
async fn test_query_failure_policies() {
    let server = MockServer::start();

    let contacts_mock = server.mock(|when, then| {
        when.method(GET).path("/contacts");
        then.status(403).body("principal lacks read privilege");
    });
    let create_mock = server.mock(|when, then| {
        when.method(POST).path("/emails");
        then.status(201).json_body(json!({ "activityid": "never" }));
    });

    let client = WebApiClient::new(server.base_url(), None);
    let context = ExecutionContext {
        initiating_user: UserId("u-1".to_string()),
        store: &client,
        transport: &client,
    };

    let err = notifier(NotifierSettings::default())
        .run(&context, &params())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        NotifierError::QueryFailure { ref message } if message.contains("403")
    ));

    let degrade = NotifierSettings {
        on_query_failure: QueryFailurePolicy::Degrade,
        ..NotifierSettings::default()
    };
    let summary = notifier(degrade).run(&context, &params()).await.unwrap();
    assert_eq!(summary.matched, 0);
    assert!(summary.outcomes.is_empty());

    contacts_mock.assert_hits(2);
    create_mock.assert_hits(0);
}

#[tokio::test]
async fn test_send_failure_policies() {
    let server = MockServer::start();

    mock_contacts(
        &server,
        json!([
            {"contactid": "c-1", "fullname": "First", "birthdate": "1980-03-15"},
            {"contactid": "c-2", "fullname": "Second", "birthdate": "1990-03-15"}
        ]),
    );
    let failing_create = server.mock(|when, then| {
        when.method(POST)
            .path("/emails")
            .json_body_partial(r#"{"regardingobjectid_contact@odata.bind": "/contacts(c-1)"}"#);
        then.status(500).body("mailbox not configured");
    });
    let working_create = server.mock(|when, then| {
        when.method(POST)
            .path("/emails")
            .json_body_partial(r#"{"regardingobjectid_contact@odata.bind": "/contacts(c-2)"}"#);
        then.status(201).json_body(json!({ "activityid": "e-2" }));
    });
    let send_mock = server.mock(|when, then| {
        when.method(POST)
            .path("/emails(e-2)/Microsoft.Dynamics.CRM.SendEmail");
        then.status(200);
    });

    let client = WebApiClient::new(server.base_url(), Some("test-token".to_string()));
    let context = ExecutionContext {
        initiating_user: UserId("u-1".to_string()),
        store: &client,
        transport: &client,
    };

    // Abort: the second contact is never attempted
    let abort = NotifierSettings {
        on_send_failure: SendFailurePolicy::Abort,
        ..NotifierSettings::default()
    };
    let err = notifier(abort).run(&context, &params()).await.unwrap_err();
    assert!(matches!(
        err,
        NotifierError::SendFailure { ref contact_id, ref message }
            if contact_id == "c-1" && message.contains("500")
    ));
    failing_create.assert_hits(1);
    working_create.assert_hits(0);

    // Continue: the failure is recorded and the second contact still gets mail
    let summary = notifier(NotifierSettings::default())
        .run(&context, &params())
        .await
        .unwrap();
    assert_eq!(summary.sent(), 1);
    assert_eq!(summary.failed(), 1);
    failing_create.assert_hits(2);
    working_create.assert_hits(1);
    send_mock.assert_hits(1);
}

#[tokio::test]
async fn test_undecodable_create_response_is_a_send_failure() {
    let server = MockServer::start();

    mock_contacts(
        &server,
        json!([{"contactid": "c-1", "fullname": "Gateway Page", "birthdate": "1980-03-15"}]),
    );
    server.mock(|when, then| {
        when.method(POST).path("/emails");
        then.status(201)
            .header("Content-Type", "text/html")
            .body("<html>proxy login</html>");
    });
    let send_mock = server.mock(|when, then| {
        when.method(POST).path_contains("SendEmail");
        then.status(200);
    });

    let client = WebApiClient::new(server.base_url(), Some("test-token".to_string()));
    let context = ExecutionContext {
        initiating_user: UserId("u-1".to_string()),
        store: &client,
        transport: &client,
    };

    let summary = notifier(NotifierSettings::default())
        .run(&context, &params())
        .await
        .unwrap();

    send_mock.assert_hits(0);
    assert_eq!(summary.failed(), 1);
    assert!(matches!(
        &summary.outcomes[0],
        SendOutcome::Failed { reason, .. } if reason.contains("Serialization error")
    ));
}
