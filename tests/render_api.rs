mod support;

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
};
use mathoid::domain::features::FeatureConfig;
use mathoid::infra::{http::REQUEST_ID_HEADER, svg::XmlSvgMinifier};
use serde_json::json;
use uuid::Uuid;

use support::{
    FailingOptimizer, MAX_BODY_BYTES, PNG, SPEECH, STYLE, StubTypesetter, post_json, post_raw,
    router, router_with, send,
};

#[tokio::test]
async fn default_output_is_the_full_json_bundle() {
    let engine = StubTypesetter::rendering();
    let app = router(engine.clone());

    let response = post_json(&app, "/", json!({"q": "E=mc^{2}"})).await;
    assert_eq!(response.status, StatusCode::OK);

    let body = response.json();
    assert_eq!(body["success"], true);
    assert_eq!(body["log"], "success");
    assert_eq!(body["sanitizedTex"], "E=mc^{2}");
    let mml = body["mml"].as_str().expect("mml string");
    assert!(mml.contains("<math"), "{mml}");
    assert!(mml.contains("E=mc^{2}"), "{mml}");
    let svg = body["svg"].as_str().expect("svg string");
    assert!(svg.starts_with("<?xml"), "{svg}");
    assert!(!svg.contains("<!--"), "svg was not minimized: {svg}");
    assert_eq!(body["speech"], SPEECH);
    assert_eq!(body["png"], "iVBORw0KGgo=");

    let calls = engine.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].math, "E=mc^{2}");
    assert_eq!(calls[0].format, "TeX");
    assert!(calls[0].svg && calls[0].mml && calls[0].png && calls[0].mathoid_style);
}

#[tokio::test]
async fn missing_query_is_a_bad_request() {
    let engine = StubTypesetter::rendering();
    let app = router(engine.clone());

    let response = post_json(&app, "/", json!({})).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    let body = response.json();
    assert_eq!(body["error"], "q (query) post parameter is missing!");
    assert_eq!(body["success"], false);
    assert_eq!(body["status"], 400);
    assert_eq!(body["title"], "Bad Request");
    assert_eq!(body["type"], "bad_request");

    let response = post_raw(&app, "/", "application/json", "").await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.json()["error"], "q (query) post parameter is missing!");

    assert!(engine.calls().is_empty());
}

#[tokio::test]
async fn unknown_input_type_is_named_in_the_detail() {
    let app = router(StubTypesetter::rendering());

    let response = post_json(&app, "/", json!({"q": "E=mc^2", "type": "invalid"})).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(
        response.json()["detail"],
        "Input format \"invalid\" is not recognized!"
    );
}

#[tokio::test]
async fn texvcinfo_reports_identifiers_without_typesetting() {
    let engine = StubTypesetter::rendering();
    let app = router(engine.clone());

    let response = post_json(&app, "/texvcinfo", json!({"q": "\\mathcal{S}"})).await;
    assert_eq!(response.status, StatusCode::OK);
    let body = response.json();
    assert_eq!(body["identifiers"][0], "\\mathcal{S}");
    assert_eq!(body["success"], true);
    assert_eq!(body["checked"], "\\mathcal{S}");
    assert!(engine.calls().is_empty());
}

#[tokio::test]
async fn graph_returns_the_parse_tree() {
    let engine = StubTypesetter::rendering();
    let app = router(engine.clone());

    let response = post_json(&app, "/graph", json!({"q": "\\frac{a}{b}"})).await;
    assert_eq!(response.status, StatusCode::OK);
    let body = response.json();
    assert_eq!(body["name"], "root");
    assert_eq!(body["children"][0]["value"], "\\frac");
    assert!(engine.calls().is_empty());

    let response = post_json(&app, "/graph", json!({"q": "x", "type": "chem"})).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(
        response.json()["error"],
        "graph accepts only tex or inline-tex as the input type, chem given!"
    );
}

#[tokio::test]
async fn mml_output_carries_the_style_header() {
    let app = router(StubTypesetter::rendering());

    let response = post_json(&app, "/mml", json!({"q": "E=mc^2"})).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.header("x-mathoid-style"), Some(STYLE));
    assert_eq!(
        response.header("content-type"),
        Some("application/mathml+xml")
    );
    let body = String::from_utf8(response.body.to_vec()).expect("utf-8 body");
    assert!(body.starts_with("<math"), "{body}");
}

#[tokio::test]
async fn speech_output_is_the_raw_speech_text() {
    let app = router(StubTypesetter::rendering());

    let response = post_json(&app, "/speech", json!({"q": "E=mc^2"})).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body.as_ref(), SPEECH.as_bytes());
    assert_eq!(
        response.header("content-type"),
        Some("text/plain; charset=utf-8")
    );
}

#[tokio::test]
async fn png_output_is_binary_and_never_requests_speech() {
    let engine = StubTypesetter::rendering();
    let app = router(engine.clone());

    let response = post_json(&app, "/png", json!({"q": "x"})).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.header("content-type"), Some("image/png"));
    assert_eq!(response.body.as_ref(), PNG);

    let calls = engine.calls();
    assert!(calls[0].png);
    assert!(!calls[0].speak_text && !calls[0].svg && !calls[0].mml);
}

#[tokio::test]
async fn complete_wraps_payloads_with_their_headers() {
    let app = router(StubTypesetter::rendering());

    let response = post_json(&app, "/complete", json!({"q": "x^2"})).await;
    assert_eq!(response.status, StatusCode::OK);
    let body = response.json();
    assert_eq!(body["svg"]["headers"]["content-type"], "image/svg+xml");
    assert!(
        body["svg"]["body"]
            .as_str()
            .is_some_and(|svg| svg.starts_with("<?xml"))
    );
    assert_eq!(body["mml"]["headers"]["x-mathoid-style"], STYLE);
    assert_eq!(body["png"]["headers"]["content-type"], "image/png");
    assert_eq!(body["speech"], SPEECH);
    assert_eq!(body["sanitizedTex"], "x^{2}");
}

#[tokio::test]
async fn sanitizer_rejections_stop_before_the_engine() {
    let engine = StubTypesetter::rendering();
    let app = router(engine.clone());

    let response = post_json(&app, "/", json!({"q": "\\frac{1}{2"})).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    let body = response.json();
    assert_eq!(body["error"], "SyntaxError: Missing '}'");
    assert_eq!(body["detail"]["success"], false);
    assert_eq!(body["detail"]["error"]["name"], "SyntaxError");
    assert!(engine.calls().is_empty());

    let response = post_json(&app, "/", json!({"q": "\\def\\x{1}"})).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.json()["detail"]["error"]["name"], "IllegalFunctionError");
}

#[tokio::test]
async fn mathjax_html_macros_never_reach_the_engine() {
    let engine = StubTypesetter::rendering();
    let app = router(engine.clone());

    for q in [
        "\\style{color:red}{x}",
        "\\require{action}\\toggle{a}{b}\\endtoggle",
        "\\unicode{x3C}script\\unicode{x3E}",
        "\\cssId{evil}{x}",
    ] {
        let response = post_json(&app, "/", json!({"q": q})).await;
        assert_eq!(response.status, StatusCode::BAD_REQUEST, "{q}");
        let body = response.json();
        assert_eq!(body["detail"]["error"]["name"], "IllegalFunctionError", "{q}");
    }
    assert!(engine.calls().is_empty());
}

#[tokio::test]
async fn deeply_nested_input_is_a_bad_request() {
    let engine = StubTypesetter::rendering();
    let app = router(engine.clone());
    let q = format!("{}x{}", "{".repeat(100_000), "}".repeat(100_000));

    let response = post_json(&app, "/", json!({"q": q})).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    let body = response.json();
    assert_eq!(body["type"], "bad_request");
    assert_eq!(body["error"], "SyntaxError: Expression is nested too deeply");
    assert!(engine.calls().is_empty());

    let response = post_json(&app, "/", json!({"q": "{{x}}^2"})).await;
    assert_eq!(response.status, StatusCode::OK);
}

#[tokio::test]
async fn oversized_bodies_are_bad_requests() {
    let app = router(StubTypesetter::rendering());
    let q = "x".repeat(MAX_BODY_BYTES + 1);

    let response = post_json(&app, "/", json!({"q": q})).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.json()["success"], false);
}

#[tokio::test]
async fn engine_error_lists_become_bad_requests() {
    let app = router(StubTypesetter::rejecting(&["TeX parse error: Misplaced &"]));

    let response = post_json(&app, "/", json!({"q": "a & b"})).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    let body = response.json();
    assert_eq!(body["error"], json!(["TeX parse error: Misplaced &"]));
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn engine_failures_use_the_same_envelope() {
    let app = router(StubTypesetter::crashing());

    let response = post_json(&app, "/svg", json!({"q": "x"})).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    let body = response.json();
    assert_eq!(body["type"], "bad_request");
    assert!(
        body["error"]
            .as_str()
            .is_some_and(|error| error.contains("renderer crashed"))
    );
}

#[tokio::test]
async fn disabled_formats_name_the_flag() {
    let features = FeatureConfig {
        png: false,
        ..FeatureConfig::default()
    };
    let engine = StubTypesetter::rendering();
    let app = router_with(engine.clone(), Arc::new(XmlSvgMinifier::new()), features);

    let response = post_json(&app, "/png", json!({"q": "x"})).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(
        response.json()["error"],
        "Output format png is disabled via config, try setting \"png: true\" to enable png rendering."
    );

    let response = post_json(&app, "/pdf", json!({"q": "x"})).await;
    assert_eq!(
        response.json()["error"],
        "Output format \"pdf\" is not recognized!"
    );

    let response = post_json(&app, "/json", json!({"q": "x"})).await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(response.json().get("png").is_none());
    assert!(!engine.calls()[0].png);
}

#[tokio::test]
async fn minimizer_failures_keep_the_original_svg() {
    let app = router_with(
        StubTypesetter::rendering(),
        Arc::new(FailingOptimizer),
        FeatureConfig::default(),
    );

    let response = post_json(&app, "/svg", json!({"q": "x"})).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.header("content-type"), Some("image/svg+xml"));
    assert_eq!(response.body.as_ref(), support::SVG.as_bytes());
}

#[tokio::test]
async fn sanitized_tex_is_stable_when_resubmitted() {
    let app = router(StubTypesetter::rendering());

    let first = post_json(&app, "/", json!({"q": "\\frac12 + \\alpha x"})).await;
    let sanitized = first.json()["sanitizedTex"].clone();
    assert_eq!(sanitized, "\\frac{1}{2}+\\alpha x");

    let second = post_json(&app, "/", json!({"q": sanitized})).await;
    assert_eq!(second.json()["sanitizedTex"], sanitized);
}

#[tokio::test]
async fn nospeech_and_no_check_shape_the_engine_call() {
    let engine = StubTypesetter::rendering();
    let features = FeatureConfig {
        no_check: true,
        ..FeatureConfig::default()
    };
    let app = router_with(engine.clone(), Arc::new(XmlSvgMinifier::new()), features);

    let response = post_json(&app, "/", json!({"q": "E=mc^2", "nospeech": "true"})).await;
    assert_eq!(response.status, StatusCode::OK);
    let body = response.json();
    assert!(body.get("speech").is_none());
    assert!(body.get("sanitizedTex").is_none());

    let calls = engine.calls();
    assert_eq!(calls[0].math, "E=mc^2");
    assert!(!calls[0].speak_text);
}

#[tokio::test]
async fn chemistry_is_checked_with_mhchem_and_typeset_inline() {
    let engine = StubTypesetter::rendering();
    let app = router(engine.clone());

    let response = post_json(&app, "/mml", json!({"q": "\\ce{H2O}", "type": "chem"})).await;
    assert_eq!(response.status, StatusCode::OK);

    let calls = engine.calls();
    assert_eq!(calls[0].format, "inline-TeX");
    assert_eq!(calls[0].math, "\\ce{H2O}");

    let response = post_json(&app, "/mml", json!({"q": "\\ce{H2O}"})).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn mathml_input_passes_through_as_mml() {
    let engine = StubTypesetter::rendering();
    let app = router(engine.clone());
    let source = "<math><mi>x</mi></math>";

    let response = post_json(&app, "/mml", json!({"q": source, "type": "mml"})).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body.as_ref(), source.as_bytes());
    assert_eq!(response.header("x-mathoid-style"), Some(STYLE));
    assert!(!engine.calls()[0].mml);
}

#[tokio::test]
async fn form_bodies_and_trailing_slashes_are_accepted() {
    let app = router(StubTypesetter::rendering());

    let response = post_raw(
        &app,
        "/speech/",
        "application/x-www-form-urlencoded",
        "q=E%3Dmc%5E2&type=tex",
    )
    .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body.as_ref(), SPEECH.as_bytes());
}

#[tokio::test]
async fn malformed_json_is_a_bad_request() {
    let app = router(StubTypesetter::rendering());

    let response = post_raw(&app, "/", "application/json", "{\"q\":").await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    let body = response.json();
    assert_eq!(body["success"], false);
    assert!(
        body["error"]
            .as_str()
            .is_some_and(|error| error.starts_with("Invalid request body"))
    );
}

#[tokio::test]
async fn health_check_has_no_content() {
    let app = router(StubTypesetter::rendering());
    let request = Request::builder()
        .method(Method::GET)
        .uri("/_health")
        .body(Body::empty())
        .expect("request should build");

    let response = send(&app, request).await;
    assert_eq!(response.status, StatusCode::NO_CONTENT);
    assert!(response.body.is_empty());
}

#[tokio::test]
async fn every_response_carries_a_request_id() {
    let app = router(StubTypesetter::rendering());

    let ok = post_json(&app, "/mml", json!({"q": "x"})).await;
    let failed = post_json(&app, "/", json!({})).await;
    assert_eq!(ok.status, StatusCode::OK);
    assert_eq!(failed.status, StatusCode::BAD_REQUEST);

    let ids: Vec<Uuid> = [&ok, &failed]
        .iter()
        .map(|response| {
            let id = response
                .header(REQUEST_ID_HEADER.as_str())
                .expect("x-request-id header");
            Uuid::parse_str(id).expect("request id should be a UUID")
        })
        .collect();
    assert_ne!(ids[0], ids[1]);
}
