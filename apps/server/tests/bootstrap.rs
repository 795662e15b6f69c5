use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use dwaste_domain::environment::HostEnvironment;
use dwaste_domain::settings::SettingKey;
use dwaste_kernel::config::MapSettings;
use dwaste_kernel::diagnostics::NoticeCode;
use dwaste_model::classifier::{Classifier, ClassifierArtifact};
use dwaste_model::{ModelError, ModelSource, ModelWrapper, WarmupStatus};
use dwaste_server::{App, Bootstrapper, Stage};
use parking_lot::Mutex;
use std::io::{self, Write};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};
use tower::ServiceExt;
use tracing::Level;

#[derive(Debug, Default)]
struct CountingSource {
    loads: AtomicUsize,
    fail: bool,
}

impl ModelSource for CountingSource {
    fn load(&self) -> Result<Classifier, ModelError> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(ModelError::Artifact { message: "corrupt artifact".into(), context: None });
        }
        Classifier::from_artifact(ClassifierArtifact {
            version: "counting".to_owned(),
            labels: vec!["paper".to_owned(), "plastic".to_owned()],
            input_size: 4,
            bins: 1,
            weights: vec![vec![0.0; 3], vec![0.0; 3]],
            bias: vec![0.0, 0.0],
        })
    }
}

fn bootstrap(
    multithreaded: bool,
    environment: HostEnvironment,
    source: &Arc<CountingSource>,
    delay: Duration,
) -> anyhow::Result<App> {
    Bootstrapper::new()
        .settings(MapSettings::defaults().with(SettingKey::MultithreadedInit, multithreaded))
        .environment(environment)
        .model(ModelWrapper::with_warmup_delay(source.clone(), delay))
        .build()
}

async fn get(app: &App, uri: &str, origin: Option<&str>) -> axum::response::Response {
    let mut request = Request::builder().uri(uri);
    if let Some(origin) = origin {
        request = request.header(header::ORIGIN, origin);
    }
    app.router().oneshot(request.body(Body::empty()).expect("request")).await.expect("response")
}

#[test]
fn background_warmup_only_for_standalone_with_flag() {
    let cases = [
        (true, HostEnvironment::Standalone, true),
        (true, HostEnvironment::Hosted, false),
        (false, HostEnvironment::Standalone, false),
        (false, HostEnvironment::Hosted, false),
    ];

    for (flag, environment, background) in cases {
        let source = Arc::new(CountingSource::default());
        let app = bootstrap(flag, environment, &source, Duration::ZERO).expect("bootstrap");

        assert_eq!(app.warmup().is_some(), background, "flag={flag} env={environment}");
        assert_eq!(app.stages().contains(Stage::ModelWarming), background);
        if !background {
            assert_eq!(app.model().status(), WarmupStatus::Ready);
        }
    }
}

#[test]
fn stages_are_recorded_in_order() {
    let source = Arc::new(CountingSource::default());
    let app = bootstrap(true, HostEnvironment::Standalone, &source, Duration::ZERO).expect("bootstrap");

    assert_eq!(
        app.stages().as_slice(),
        [
            Stage::EnvironmentDetected,
            Stage::Configured,
            Stage::BlueprintRegistered,
            Stage::ModelWarming,
            Stage::Ready,
        ]
    );

    let configured = app.stages().position(Stage::Configured).expect("configured");
    let registered = app.stages().position(Stage::BlueprintRegistered).expect("registered");
    assert!(configured < registered);
}

#[derive(Clone, Default)]
struct CapturedLog(Arc<Mutex<Vec<u8>>>);

impl CapturedLog {
    fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock()).into_owned()
    }
}

impl Write for CapturedLog {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[test]
fn registration_runs_setup_hooks_without_late_setup_notices() {
    let log = CapturedLog::default();
    let writer = log.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(Level::DEBUG)
        .with_ansi(false)
        .with_writer(move || writer.clone())
        .finish();

    let source = Arc::new(CountingSource::default());
    let app = tracing::subscriber::with_default(subscriber, || {
        bootstrap(false, HostEnvironment::Hosted, &source, Duration::ZERO)
    })
    .expect("bootstrap");

    let output = log.contents();
    assert!(app.stages().contains(Stage::BlueprintRegistered));
    assert!(output.contains("Inference payload validation configured"), "{output}");
    assert!(!output.contains(NoticeCode::LateSetupMethod.as_str()), "{output}");
    assert!(!output.contains("WARN"), "{output}");
}

#[test]
fn unresolvable_setting_aborts_before_registration_and_warmup() {
    for key in SettingKey::all() {
        let source = Arc::new(CountingSource::default());
        let model = ModelWrapper::new(source.clone());

        let err = Bootstrapper::new()
            .settings(MapSettings::defaults().without(key))
            .environment(HostEnvironment::Hosted)
            .model(model.clone())
            .build()
            .expect_err("startup must fail");

        assert!(format!("{err:#}").contains(key.as_str()), "{key}: {err:#}");
        assert_eq!(source.loads.load(Ordering::SeqCst), 0, "{key}: model must not be loaded");
        assert_eq!(model.status(), WarmupStatus::Pending);
    }
}

#[test]
fn hosted_without_flag_blocks_on_a_single_init() {
    let source = Arc::new(CountingSource::default());
    let started = Instant::now();

    let app = bootstrap(false, HostEnvironment::Hosted, &source, Duration::from_millis(300))
        .expect("bootstrap");

    assert!(started.elapsed() >= Duration::from_millis(300), "startup returned before warm-up");
    assert_eq!(source.loads.load(Ordering::SeqCst), 1);
    assert_eq!(app.model().status(), WarmupStatus::Ready);
}

#[test]
fn blocking_warmup_failure_is_fatal() {
    let source = Arc::new(CountingSource { fail: true, ..CountingSource::default() });
    let err = bootstrap(false, HostEnvironment::Standalone, &source, Duration::ZERO)
        .expect_err("startup must fail");
    assert!(format!("{err:#}").contains("corrupt artifact"));
}

#[tokio::test]
async fn background_warmup_failure_only_affects_readiness() {
    let source = Arc::new(CountingSource { fail: true, ..CountingSource::default() });
    let app = bootstrap(true, HostEnvironment::Standalone, &source, Duration::ZERO).expect("bootstrap");

    let deadline = Instant::now() + Duration::from_secs(5);
    while !matches!(app.model().status(), WarmupStatus::Failed(_)) && Instant::now() < deadline {
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    let readiness = get(&app, "/api/health/readiness", None).await;
    assert_eq!(readiness.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(get(&app, "/api/health/liveness", None).await.status(), StatusCode::OK);
}

#[tokio::test]
async fn readiness_follows_slow_background_warmup() {
    let source = Arc::new(CountingSource::default());
    let app = bootstrap(true, HostEnvironment::Standalone, &source, Duration::from_secs(2))
        .expect("bootstrap");

    tokio::time::sleep(Duration::from_millis(500)).await;
    let early = get(&app, "/api/health/readiness", None).await;
    assert_eq!(early.status(), StatusCode::SERVICE_UNAVAILABLE);

    tokio::time::sleep(Duration::from_millis(2500)).await;
    let late = get(&app, "/api/health/readiness", None).await;
    assert_eq!(late.status(), StatusCode::OK);
}

#[tokio::test]
async fn root_redirects_to_api_regardless_of_configuration() {
    let settings = [
        MapSettings::defaults(),
        MapSettings::defaults()
            .with(SettingKey::WtfCsrfEnabled, true)
            .with(SettingKey::Error404Help, true)
            .with(SettingKey::RestxValidate, false),
    ];

    for settings in settings {
        let app = Bootstrapper::new()
            .settings(settings)
            .environment(HostEnvironment::Hosted)
            .model(ModelWrapper::new(Arc::new(CountingSource::default())))
            .build()
            .expect("bootstrap");

        let response = get(&app, "/", None).await;
        assert!(response.status().is_redirection());
        assert_eq!(response.headers().get(header::LOCATION).expect("location"), "/api");

        let foreign = get(&app, "/", Some("https://evil.example")).await;
        assert!(foreign.status().is_redirection(), "redirect is outside the CORS scope");
    }
}

#[tokio::test]
async fn api_honours_the_cors_allow_list() {
    let source = Arc::new(CountingSource::default());
    let app = bootstrap(false, HostEnvironment::Hosted, &source, Duration::ZERO).expect("bootstrap");

    for origin in ["https://www.dwaste.live", "https://dwaste.live"] {
        let response = get(&app, "/api/health/liveness", Some(origin)).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).expect("allow origin"),
            origin
        );
    }

    for path in ["/api/health/liveness", "/api/does-not-exist", "/api"] {
        let denied = get(&app, path, Some("https://evil.example")).await;
        assert_eq!(denied.status(), StatusCode::FORBIDDEN, "{path}");
        assert!(denied.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).is_none());
    }

    let unmatched = get(&app, "/api/does-not-exist", Some("https://dwaste.live")).await;
    assert_eq!(unmatched.status(), StatusCode::NOT_FOUND);

    let outside = get(&app, "/elsewhere", Some("https://evil.example")).await;
    assert_eq!(outside.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn openapi_document_carries_docs_settings() {
    let app = Bootstrapper::new()
        .settings(
            MapSettings::defaults()
                .with(SettingKey::SwaggerUiDocExpansion, "none")
                .with(SettingKey::RestxMaskSwagger, true),
        )
        .environment(HostEnvironment::Hosted)
        .model(ModelWrapper::new(Arc::new(CountingSource::default())))
        .build()
        .expect("bootstrap");

    let response = get(&app, "/api/swagger.json", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body");
    let doc: serde_json::Value = serde_json::from_slice(&bytes).expect("json");

    assert_eq!(doc["x-doc-expansion"], "none");
    assert_eq!(doc["x-mask-enabled"], true);
    assert!(doc["paths"]["/api/model/predict"].is_object());
    assert!(doc["paths"]["/api/health/readiness"].is_object());

    assert_eq!(get(&app, "/api", None).await.status(), StatusCode::OK);
}
