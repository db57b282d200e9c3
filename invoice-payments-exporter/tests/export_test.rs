//! HTTP tests for the export endpoints, backed by the bundled fixture.

mod common;

use common::{spawn_app, spawn_app_with, test_config};
use reqwest::StatusCode;
use serde_json::Value;

const HEADER: &str = "Invoice number,Line number,Description,Gross price,Net price,Tax,Tax rate,Tax name,Date,Order code,Type,Cancellation of,Gift card created in";

fn lines(body: &str) -> Vec<&str> {
    body.lines().collect()
}

#[tokio::test]
async fn health_and_readiness() {
    let app = spawn_app().await;

    let health = app.get("/health").await;
    assert_eq!(health.status(), StatusCode::OK);
    let body: Value = health.json().await.unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["service"], "invoice-payments-exporter-test");

    assert_eq!(app.get("/ready").await.status(), StatusCode::OK);
}

#[tokio::test]
async fn metrics_are_exposed() {
    let app = spawn_app().await;
    app.get("/exports/invoice_payments?events=democon").await;

    let response = app.get("/metrics").await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = response.text().await.unwrap();
    assert!(body.contains("exporter_exports_total"));
    assert!(body.contains("http_requests_total"));
}

#[tokio::test]
async fn full_report_for_one_event() {
    let app = spawn_app().await;

    let response = app.get("/exports/invoice_payments?events=democon").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()["content-type"],
        "text/csv; charset=utf-8"
    );
    assert_eq!(
        response.headers()["content-disposition"],
        "attachment; filename=\"democon_invoice_payments.csv\""
    );

    let body = response.text().await.unwrap();
    assert_eq!(
        lines(&body),
        vec![
            HEADER,
            "DC-00003,1,Gift card,50.00,50.00,0.00,0.00,,2021-02-01,GCBUY,Invoice,,",
            "DC-00001,1,Conference ticket,10.00,8.40,1.60,19.00,VAT,2021-03-01,ABC12,Invoice,,",
            "DC-00002,1,Conference ticket,-10.00,-8.40,-1.60,19.00,VAT,2021-03-02,ABC12,Invoice,DC-00001,",
            "DC-00002,,Payment,-10.00,,,,,2021-03-01 11:00:00+01:00,ABC12,Bank transfer,,",
            ",,Gift card,-20.00,,,,,2021-03-03 10:00:00+01:00,DEF34,Gift card,,DC-00003",
            "DC-00002,,Refund,10.00,,,,,2021-03-02 13:00:00+01:00,ABC12,Manual payment,,",
        ]
    );
}

#[tokio::test]
async fn single_day_window() {
    let app = spawn_app().await;

    let body = app
        .get("/exports/invoice_payments?events=democon&date_from=2021-03-02&date_to=2021-03-02")
        .await
        .text()
        .await
        .unwrap();

    assert_eq!(
        lines(&body),
        vec![
            HEADER,
            "DC-00002,1,Conference ticket,-10.00,-8.40,-1.60,19.00,VAT,2021-03-02,ABC12,Invoice,DC-00001,",
            "DC-00002,,Refund,10.00,,,,,2021-03-02 13:00:00+01:00,ABC12,Manual payment,,",
        ]
    );
}

#[tokio::test]
async fn several_events_share_one_sheet() {
    let app = spawn_app().await;

    let response = app
        .get("/exports/invoice_payments?events=democon,meetup")
        .await;
    assert_eq!(
        response.headers()["content-disposition"],
        "attachment; filename=\"invoice_payments.csv\""
    );

    let body = response.text().await.unwrap();
    // 4 invoice lines, 3 payments and 1 refund below the header.
    assert_eq!(lines(&body).len(), 1 + 4 + 3 + 1);
    assert!(body.contains("RM-00001,,Payment,-5.00,,,,,2021-03-01 19:00:00+01:00,XYZ99,PayPal,,"));
}

#[tokio::test]
async fn german_labels() {
    let app = spawn_app().await;

    let body = app
        .get("/exports/invoice_payments?events=democon&locale=de")
        .await
        .text()
        .await
        .unwrap();

    let header = lines(&body)[0];
    assert!(header.starts_with("Rechnungsnummer,Zeilennummer,Beschreibung"));
    assert!(body.contains(",Zahlung,-10.00,"));
    assert!(body.contains(",Überweisung,"));
}

#[tokio::test]
async fn configured_default_locale_and_providers() {
    let mut config = test_config();
    config.export.locale = "de".to_string();
    config.export.payment_providers = vec![("banktransfer".to_string(), "SEPA".to_string())];
    let app = spawn_app_with(config).await;

    let body = app
        .get("/exports/invoice_payments?events=democon")
        .await
        .text()
        .await
        .unwrap();

    assert!(lines(&body)[0].starts_with("Rechnungsnummer"));
    assert!(body.contains(",ABC12,SEPA,,"));
}

#[tokio::test]
async fn unknown_exporter_is_not_found() {
    let app = spawn_app().await;

    let response = app.get("/exports/orderlist?events=democon").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn unknown_event_is_not_found() {
    let app = spawn_app().await;

    let response = app
        .get("/exports/invoice_payments?events=democon,nope")
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body: Value = response.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().contains("nope"));
}

#[tokio::test]
async fn missing_events_is_a_bad_request() {
    let app = spawn_app().await;

    let response = app.get("/exports/invoice_payments").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn malformed_date_is_a_bad_request() {
    let app = spawn_app().await;

    let response = app
        .get("/exports/invoice_payments?events=democon&date_from=soon")
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().contains("soon"));
}

#[tokio::test]
async fn exporters_are_listed_with_fields() {
    let app = spawn_app().await;

    let body: Value = app.get("/exporters?locale=de").await.json().await.unwrap();
    let exporters = body.as_array().unwrap();

    assert_eq!(exporters.len(), 1);
    assert_eq!(exporters[0]["identifier"], "invoice_payments");
    assert_eq!(exporters[0]["name"], "Rechnungen und Zahlungen");
    assert_eq!(exporters[0]["fields"][0]["name"], "date_from");
    assert_eq!(exporters[0]["fields"][0]["label"], "Startdatum");
    assert_eq!(exporters[0]["fields"][1]["kind"], "date");
    assert_eq!(exporters[0]["fields"][1]["required"], false);
}

#[tokio::test]
async fn plugin_metadata() {
    let app = spawn_app().await;

    let body: Value = app.get("/plugin").await.json().await.unwrap();

    assert_eq!(body["name"], "Invoice & Payment exporter");
    assert_eq!(body["category"], "FORMAT");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    assert!(body["locales"]
        .as_array()
        .unwrap()
        .iter()
        .any(|l| l == "de"));
    assert!(body["providers"]
        .as_array()
        .unwrap()
        .iter()
        .any(|p| p["id"] == "giftcard" && p["name"] == "Gift card"));
}
