mod common;

use common::{ACCESS_TOKEN, TestApp};
use reqwest::multipart::{Form, Part};
use serde_json::Value;

const CSV: &str = "name,email\nGrace Hopper,grace@x.com\n,bob@x.com\nLinus,bounce@x.com\n";

fn fields_form(csv: &str, subject: &str, body: &str, is_html: bool) -> Form {
    Form::new()
        .part("csv_file", Part::text(csv.to_string()).file_name("recipients.csv"))
        .text("email_subject", subject.to_string())
        .text("email_body", body.to_string())
        .text("isHtml", if is_html { "true" } else { "false" })
}

#[tokio::test]
async fn test_streams_progress_for_every_row() {
    let app = TestApp::spawn().await;

    let resp = app
        .client
        .post(app.url("/send-emails"))
        .bearer_auth(ACCESS_TOKEN)
        .multipart(fields_form(CSV, "Hello {name}", "Hi {name}, welcome aboard.", false))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 200);
    assert_eq!(resp.headers()["content-type"], "text/event-stream");
    assert_eq!(
        resp.text().await.unwrap(),
        "data: 1. Success: Name: Grace, Email: grace@x.com\n\n\
         data: 2. Failed: Missing field(s): name\n\n\
         data: 3. Failed: Gmail API returned 400 Bad Request: Invalid To header\n\n\
         data: \nFinished sending emails. \nSuccess: 1, Failures: 2\n\n"
    );

    let sent = app.google.sent_messages();
    assert_eq!(sent.len(), 2);
    assert!(sent[0].contains("To: grace@x.com"));
    assert!(sent[0].contains("Subject: Hello Grace"));
    assert!(sent[0].contains("Hi Grace, welcome aboard."));
    assert!(sent[0].contains("ada@example.com"));
    assert!(sent[0].contains("text/plain"));
}

#[tokio::test]
async fn test_html_flag_sets_content_type() {
    let app = TestApp::spawn().await;

    let resp = app
        .client
        .post(app.url("/send-emails"))
        .bearer_auth(ACCESS_TOKEN)
        .multipart(fields_form("name,email\nGrace,grace@x.com\n", "Hi", "<p>Hello {name}</p>", true))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.text().await.unwrap().lines().next(), Some("data: 1. Success: Name: Grace, Email: grace@x.com"));
    let sent = app.google.sent_messages();
    assert!(sent[0].contains("text/html"));
    assert!(sent[0].contains("<p>Hello Grace</p>"));
}

#[tokio::test]
async fn test_template_file_flow() {
    let app = TestApp::spawn().await;
    let template = "Subject: Invitation for {first_name}\nBody: Dear {name},\nSee you there.";
    let form = Form::new()
        .part("csv_file", Part::text("name,email\nAlan Turing,alan@x.com\n").file_name("recipients.csv"))
        .part("template_file", Part::text(template).file_name("invite.txt"));

    let resp = app.client.post(app.url("/send-emails")).bearer_auth(ACCESS_TOKEN).multipart(form).send().await.unwrap();

    assert_eq!(
        resp.text().await.unwrap(),
        "data: 1. Success: Name: Alan, Email: alan@x.com\n\n\
         data: \nFinished sending emails. \nSuccess: 1, Failures: 0\n\n"
    );
    let sent = app.google.sent_messages();
    assert!(sent[0].contains("Subject: Invitation for Alan"));
    assert!(sent[0].contains("Dear Alan,"));
}

#[tokio::test]
async fn test_all_rows_failing_reports_total_failure() {
    let app = TestApp::spawn().await;

    let resp = app
        .client
        .post(app.url("/send-emails"))
        .bearer_auth(ACCESS_TOKEN)
        .multipart(fields_form("name,email\nA,bounce@x.com\n,\n", "Hi", "Hello", false))
        .send()
        .await
        .unwrap();

    let text = resp.text().await.unwrap();
    assert!(text.ends_with("data: \nFailed to send all 2 emails.\n\n"), "unexpected stream: {text}");
}

#[tokio::test]
async fn test_missing_bearer_is_unauthorized() {
    let app = TestApp::spawn().await;

    let resp = app
        .client
        .post(app.url("/send-emails"))
        .multipart(fields_form(CSV, "Hi", "Hello", false))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 401);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["detail"], "Missing or invalid Authorization header");
    assert!(app.google.sent_messages().is_empty());
}

#[tokio::test]
async fn test_rejected_token_is_unauthorized() {
    let app = TestApp::spawn().await;

    let resp = app
        .client
        .post(app.url("/send-emails"))
        .bearer_auth("forged-token")
        .multipart(fields_form(CSV, "Hi", "Hello", false))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 401);
    let body: Value = resp.json().await.unwrap();
    assert!(body["detail"].as_str().unwrap().starts_with("Authentication failed: "));
    assert!(app.google.sent_messages().is_empty());
}

#[tokio::test]
async fn test_missing_template_is_bad_request() {
    let app = TestApp::spawn().await;
    let form = Form::new()
        .part("csv_file", Part::text(CSV).file_name("recipients.csv"))
        .text("email_subject", "Subject only");

    let resp = app.client.post(app.url("/send-emails")).bearer_auth(ACCESS_TOKEN).multipart(form).send().await.unwrap();

    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["detail"], "Provide either template_file or both email_subject and email_body");
}

#[tokio::test]
async fn test_missing_csv_is_bad_request() {
    let app = TestApp::spawn().await;
    let form = Form::new().text("email_subject", "Hi").text("email_body", "Hello");

    let resp = app.client.post(app.url("/send-emails")).bearer_auth(ACCESS_TOKEN).multipart(form).send().await.unwrap();

    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["detail"], "Missing csv_file upload");
}

#[tokio::test]
async fn test_shutdown_ends_open_streams() {
    let app = TestApp::spawn().await;
    app.shutdown_tx.send(true).unwrap();

    // The listener may already be closed; either way no row is sent.
    if let Ok(resp) = app
        .client
        .post(app.url("/send-emails"))
        .bearer_auth(ACCESS_TOKEN)
        .multipart(fields_form(CSV, "Hi", "Hello", false))
        .send()
        .await
    {
        let _ = resp.text().await;
    }
    assert!(app.google.sent_messages().is_empty());
}
