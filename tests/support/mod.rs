#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    Router,
    body::{Body, Bytes},
    http::{HeaderMap, Method, Request, StatusCode, header::CONTENT_TYPE},
};
use http_body_util::BodyExt;
use mathoid::{
    application::render::{
        EngineError, MathService, MinifyError, SvgOptimizer, TypesetOptions, TypesetResult,
        Typesetter,
    },
    domain::features::FeatureConfig,
    infra::{
        http::{HttpState, build_router},
        svg::XmlSvgMinifier,
        texvc::TexvcChecker,
    },
};
use serde_json::Value;
use tower::ServiceExt;

pub const SVG: &str = "<?xml version=\"1.0\" standalone=\"no\"?>\n<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"9.025ex\" height=\"2.676ex\">\n  <!-- E=mc^2 -->\n  <g stroke=\"currentColor\" fill=\"currentColor\">\n    <path d=\"M492 213Q472 213 472 226\"/>\n  </g>\n</svg>";
pub const STYLE: &str = "vertical-align: -0.338ex; width:9.025ex; height:2.676ex;";
pub const SPEECH: &str = "upper E equals m c squared";
pub const MAX_BODY_BYTES: usize = 1024 * 1024;
pub const PNG: &[u8] = &[0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a];

enum Behavior {
    Render,
    Reject(Vec<String>),
    Crash,
}

/// Engine stand-in that answers like the MathJax renderer and records every call.
pub struct StubTypesetter {
    behavior: Behavior,
    calls: Mutex<Vec<TypesetOptions>>,
}

impl StubTypesetter {
    pub fn rendering() -> Arc<Self> {
        Self::with(Behavior::Render)
    }

    pub fn rejecting(errors: &[&str]) -> Arc<Self> {
        Self::with(Behavior::Reject(
            errors.iter().map(|e| e.to_string()).collect(),
        ))
    }

    pub fn crashing() -> Arc<Self> {
        Self::with(Behavior::Crash)
    }

    fn with(behavior: Behavior) -> Arc<Self> {
        Arc::new(Self {
            behavior,
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> Vec<TypesetOptions> {
        self.calls.lock().expect("calls lock").clone()
    }
}

#[async_trait]
impl Typesetter for StubTypesetter {
    async fn typeset(&self, options: TypesetOptions) -> Result<TypesetResult, EngineError> {
        self.calls.lock().expect("calls lock").push(options.clone());

        match &self.behavior {
            Behavior::Reject(errors) => Ok(TypesetResult {
                errors: Some(errors.clone()),
                ..TypesetResult::default()
            }),
            Behavior::Crash => Err(EngineError::Exit {
                exit_code: Some(1),
                stderr: "renderer crashed".to_string(),
            }),
            Behavior::Render => Ok(TypesetResult {
                svg: options.svg.then(|| SVG.to_string()),
                mml: options.mml.then(|| {
                    format!(
                        "<math xmlns=\"http://www.w3.org/1998/Math/MathML\" display=\"block\">\
                         <semantics><mrow/><annotation encoding=\"application/x-tex\">{}</annotation>\
                         </semantics></math>",
                        options.math
                    )
                }),
                png: options.png.then(|| PNG.to_vec()),
                mathoid_style: options.mathoid_style.then(|| STYLE.to_string()),
                speak_text: options.speak_text.then(|| SPEECH.to_string()),
                ..TypesetResult::default()
            }),
        }
    }
}

pub struct FailingOptimizer;

#[async_trait]
impl SvgOptimizer for FailingOptimizer {
    async fn optimize(&self, _svg: String) -> Result<String, MinifyError> {
        Err(MinifyError::Parse("unexpected token".to_string()))
    }
}

pub fn math_service(
    typesetter: Arc<StubTypesetter>,
    optimizer: Arc<dyn SvgOptimizer>,
    features: FeatureConfig,
) -> MathService {
    MathService::new(
        features,
        typesetter,
        Arc::new(TexvcChecker::new()),
        optimizer,
    )
}

pub fn router(typesetter: Arc<StubTypesetter>) -> Router {
    router_with(
        typesetter,
        Arc::new(XmlSvgMinifier::new()),
        FeatureConfig::default(),
    )
}

pub fn router_with(
    typesetter: Arc<StubTypesetter>,
    optimizer: Arc<dyn SvgOptimizer>,
    features: FeatureConfig,
) -> Router {
    let math = math_service(typesetter, optimizer, features);
    build_router(HttpState::new(Arc::new(math)), MAX_BODY_BYTES)
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl TestResponse {
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).expect("response should be JSON")
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|value| value.to_str().ok())
    }
}

pub async fn send(router: &Router, request: Request<Body>) -> TestResponse {
    let response = router
        .clone()
        .oneshot(request)
        .await
        .expect("router should respond");
    let status = response.status();
    let headers = response.headers().clone();
    let body = response
        .into_body()
        .collect()
        .await
        .expect("body should collect")
        .to_bytes();
    TestResponse {
        status,
        headers,
        body,
    }
}

pub async fn post_json(router: &Router, path: &str, body: Value) -> TestResponse {
    let request = Request::builder()
        .method(Method::POST)
        .uri(path)
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("request should build");
    send(router, request).await
}

pub async fn post_raw(
    router: &Router,
    path: &str,
    content_type: &str,
    body: &'static str,
) -> TestResponse {
    let request = Request::builder()
        .method(Method::POST)
        .uri(path)
        .header(CONTENT_TYPE, content_type)
        .body(Body::from(body))
        .expect("request should build");
    send(router, request).await
}
