// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Result, anyhow};
use leadbook_app::{ChangeRecord, DatasetId, Field, RowFields, RowId, RowNotFound, SyncClient};
use leadbook_remote::Client;
use std::collections::BTreeMap;
use std::io::Read;
use std::thread;
use std::time::Duration;
use tiny_http::{Header, Method, Request, Response, Server};

fn dataset() -> DatasetId {
    DatasetId::parse("leads_q2").expect("valid dataset id")
}

fn mock_server() -> Result<(Server, String)> {
    let server =
        Server::http("127.0.0.1:0").map_err(|error| anyhow!("start mock server: {error}"))?;
    let addr = format!("http://{}", server.server_addr());
    Ok((server, addr))
}

fn respond_json(request: Request, status: u16, body: &str) {
    let response = Response::from_string(body)
        .with_status_code(status)
        .with_header(
            Header::from_bytes("Content-Type", "application/json")
                .expect("valid content type header"),
        );
    request.respond(response).expect("response should succeed");
}

fn header_value(request: &Request, name: &'static str) -> Option<String> {
    request
        .headers()
        .iter()
        .find(|header| header.field.equiv(name))
        .map(|header| header.value.as_str().to_owned())
}

fn read_body(request: &mut Request) -> String {
    let mut body = String::new();
    request
        .as_reader()
        .read_to_string(&mut body)
        .expect("request body should be readable");
    body
}

#[test]
fn unreachable_backend_error_names_the_config_key() {
    let mut client = Client::new("http://127.0.0.1:1", "key", Duration::from_millis(50))
        .expect("client should initialize");

    let error = client
        .fetch_rows(&dataset())
        .expect_err("fetch should fail for unreachable endpoint");
    assert!(format!("{error:#}").contains("[backend].base_url"));
}

#[test]
fn fetch_rows_sends_credentials_and_orders_by_id() -> Result<()> {
    let (server, addr) = mock_server()?;
    let handle = thread::spawn(move || {
        let request = server.recv().expect("request expected");
        assert_eq!(request.method(), &Method::Get);
        assert_eq!(request.url(), "/rest/v1/leads_q2?select=*&order=id.asc");
        assert_eq!(header_value(&request, "apikey").as_deref(), Some("secret"));
        assert_eq!(
            header_value(&request, "Authorization").as_deref(),
            Some("Bearer secret")
        );
        respond_json(
            request,
            200,
            r#"[
                {"id":1,"date":"2024-03-01","lead_owner":null,"source":"Website","deal_stage":"Interest","account_id":null,"first_name":"Ava","last_name":"Alvarez","company":"Acme","created_at":"2024-03-01T00:00:00Z"},
                {"id":2,"date":null,"deal_stage":"New Lead","company":""}
            ]"#,
        );
    });

    let mut client = Client::new(&addr, "secret", Duration::from_secs(1))?;
    let rows = client.fetch_rows(&dataset())?;
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].get(Field::DealStage), Some("Interest"));
    assert_eq!(rows[0].get(Field::LeadOwner), None);
    assert_eq!(rows[1].get(Field::Source), None);
    assert_eq!(rows[1].get(Field::Company), Some(""));

    handle.join().expect("server thread should join");
    Ok(())
}

#[test]
fn list_datasets_maps_upload_records() -> Result<()> {
    let (server, addr) = mock_server()?;
    let handle = thread::spawn(move || {
        let request = server.recv().expect("request expected");
        assert_eq!(
            request.url(),
            "/rest/v1/master_uploads?select=*&order=created_at.desc"
        );
        respond_json(
            request,
            200,
            r#"[{"id":3,"filename":"q2.csv","table_name":"leads_q2_csv_1714000000000","created_at":"2024-04-25T10:00:00.123456+00:00"}]"#,
        );
    });

    let mut client = Client::new(&addr, "", Duration::from_secs(1))?;
    let entries = client.list_datasets()?;
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].label, "q2.csv");
    assert_eq!(entries[0].dataset_id.as_str(), "leads_q2_csv_1714000000000");

    handle.join().expect("server thread should join");
    Ok(())
}

#[test]
fn add_row_posts_nulls_and_returns_assigned_id() -> Result<()> {
    let (server, addr) = mock_server()?;
    let handle = thread::spawn(move || {
        let mut request = server.recv().expect("request expected");
        assert_eq!(request.method(), &Method::Post);
        assert_eq!(request.url(), "/rest/v1/leads_q2");
        assert_eq!(
            header_value(&request, "Prefer").as_deref(),
            Some("return=representation")
        );
        let body: serde_json::Value =
            serde_json::from_str(&read_body(&mut request)).expect("json body");
        assert_eq!(body["deal_stage"], "Qualified");
        assert!(body["lead_owner"].is_null());
        respond_json(
            request,
            201,
            r#"[{"id":7,"date":"2024-06-01","deal_stage":"Qualified"}]"#,
        );
    });

    let mut client = Client::new(&addr, "secret", Duration::from_secs(1))?;
    let row = client.add_row(
        &dataset(),
        &RowFields {
            date: Some("2024-06-01".to_owned()),
            deal_stage: Some("Qualified".to_owned()),
            ..RowFields::default()
        },
    )?;
    assert_eq!(row.id, RowId::new(7));

    handle.join().expect("server thread should join");
    Ok(())
}

#[test]
fn batch_upsert_patches_each_record_and_reports_missing_rows() -> Result<()> {
    let (server, addr) = mock_server()?;
    let handle = thread::spawn(move || {
        let mut first = server.recv().expect("first request expected");
        assert_eq!(first.method(), &Method::Patch);
        assert_eq!(first.url(), "/rest/v1/leads_q2?id=eq.1");
        let body: serde_json::Value =
            serde_json::from_str(&read_body(&mut first)).expect("json body");
        assert_eq!(body, serde_json::json!({ "deal_stage": "Closed Won" }));
        respond_json(first, 200, r#"[{"id":1}]"#);

        let mut second = server.recv().expect("second request expected");
        assert_eq!(second.url(), "/rest/v1/leads_q2?id=eq.2");
        let body: serde_json::Value =
            serde_json::from_str(&read_body(&mut second)).expect("json body");
        assert_eq!(body, serde_json::json!({ "company": null }));
        respond_json(second, 200, "[]");
    });

    let mut client = Client::new(&addr, "secret", Duration::from_secs(1))?;
    let changes = vec![
        ChangeRecord {
            id: RowId::new(1),
            changed: BTreeMap::from([(Field::DealStage, Some("Closed Won".to_owned()))]),
        },
        ChangeRecord {
            id: RowId::new(2),
            changed: BTreeMap::from([(Field::Company, None)]),
        },
    ];
    let error = client
        .batch_upsert(&dataset(), &changes)
        .expect_err("missing row should fail");
    let not_found = error
        .downcast_ref::<RowNotFound>()
        .expect("error should be RowNotFound");
    assert_eq!(not_found.id, RowId::new(2));

    handle.join().expect("server thread should join");
    Ok(())
}

#[test]
fn delete_rows_filters_by_id_list() -> Result<()> {
    let (server, addr) = mock_server()?;
    let handle = thread::spawn(move || {
        let request = server.recv().expect("request expected");
        assert_eq!(request.method(), &Method::Delete);
        assert_eq!(
            request.url(),
            "/rest/v1/leads_q2?id=in.%281%2C2%29&select=id"
        );
        respond_json(request, 200, r#"[{"id":1}]"#);
    });

    let mut client = Client::new(&addr, "secret", Duration::from_secs(1))?;
    let deleted = client.delete_rows(&dataset(), &[RowId::new(1), RowId::new(2)])?;
    assert_eq!(deleted, vec![RowId::new(1)]);
    assert!(client.delete_rows(&dataset(), &[])?.is_empty());

    handle.join().expect("server thread should join");
    Ok(())
}

#[test]
fn server_errors_surface_postgrest_message() -> Result<()> {
    let (server, addr) = mock_server()?;
    let handle = thread::spawn(move || {
        let request = server.recv().expect("request expected");
        respond_json(
            request,
            404,
            r#"{"code":"42P01","message":"relation \"public.leads_q2\" does not exist","hint":null,"details":null}"#,
        );
    });

    let mut client = Client::new(&addr, "secret", Duration::from_secs(1))?;
    let error = client
        .fetch_rows(&dataset())
        .expect_err("missing table should fail");
    let message = format!("{error:#}");
    assert!(message.contains("server error (404)"));
    assert!(message.contains("does not exist"));

    handle.join().expect("server thread should join");
    Ok(())
}
