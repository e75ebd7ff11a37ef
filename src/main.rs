use std::{
    future::IntoFuture,
    io::{self, Write},
    process,
    sync::Arc,
    time::Duration,
};

use mathoid::{
    application::{
        error::{AppError, RenderError},
        render::{MathService, RenderRequest, RenderResponse},
    },
    config::{self, RenderArgs, Settings},
    infra::{
        engine::build_typesetter,
        error::InfraError,
        http::{self, ErrorEnvelope, HttpState},
        svg::XmlSvgMinifier,
        telemetry,
        texvc::TexvcChecker,
    },
};
use tokio::sync::oneshot;
use tracing::{Dispatch, Level, dispatcher, error, info, warn};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt()
        .with_max_level(Level::ERROR)
        .with_writer(io::stderr)
        .finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()?;

    let command = cli_args
        .command
        .unwrap_or(config::Command::Serve(Box::<config::ServeArgs>::default()));

    telemetry::init(&settings.logging)?;

    match command {
        config::Command::Serve(_) => run_serve(settings).await,
        config::Command::Render(args) => run_render(settings, *args).await,
    }
}

fn build_math_service(settings: &Settings) -> Arc<MathService> {
    Arc::new(MathService::new(
        settings.features,
        build_typesetter(&settings.engine),
        Arc::new(TexvcChecker::new()),
        Arc::new(XmlSvgMinifier::new()),
    ))
}

async fn run_serve(settings: Settings) -> Result<(), AppError> {
    let state = HttpState::new(build_math_service(&settings));
    let router = http::build_router(state, settings.server.max_body_bytes.get());

    let listener = tokio::net::TcpListener::bind(settings.server.addr)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;

    info!(
        target = "mathoid::serve",
        addr = %settings.server.addr,
        engine = ?settings.engine.kind,
        "Mathoid listening"
    );

    let (drain_tx, drain_rx) = oneshot::channel::<()>();
    let server = axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            let _ = drain_tx.send(());
        })
        .into_future();

    let grace = settings.server.graceful_shutdown;
    tokio::select! {
        result = server => {
            result.map_err(|err| AppError::unexpected(format!("server error: {err}")))?;
        }
        () = drain_deadline(drain_rx, grace) => {
            warn!(
                target = "mathoid::serve",
                grace_seconds = grace.as_secs(),
                "Graceful shutdown timed out; dropping open connections"
            );
        }
    }

    info!(target = "mathoid::serve", "Mathoid stopped");
    Ok(())
}

/// Resolves `grace` after shutdown begins; never resolves otherwise.
async fn drain_deadline(drain_rx: oneshot::Receiver<()>, grace: Duration) {
    if drain_rx.await.is_ok() {
        tokio::time::sleep(grace).await;
    } else {
        std::future::pending::<()>().await;
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!(target = "mathoid::serve", error = %err, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                error!(target = "mathoid::serve", error = %err, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    info!(target = "mathoid::serve", "Shutdown signal received");
}

async fn run_render(settings: Settings, args: RenderArgs) -> Result<(), AppError> {
    let math = build_math_service(&settings);

    let rendered = match RenderRequest::from_submission(
        Some(args.expression),
        Some(&args.input_type),
        args.no_speech,
        math.features(),
    ) {
        Ok(request) => math.render(request, args.format.as_deref()).await,
        Err(err) => Err(RenderError::from(err)),
    };

    match rendered {
        Ok(response) => write_response(response),
        Err(err) => {
            let envelope = serde_json::to_string_pretty(&ErrorEnvelope::from(&err))
                .map_err(|err| AppError::unexpected(err.to_string()))?;
            eprintln!("{envelope}");
            Err(AppError::from(err))
        }
    }
}

fn write_response(response: RenderResponse) -> Result<(), AppError> {
    let mut stdout = io::stdout().lock();
    match response {
        RenderResponse::Json(value) => {
            let text = serde_json::to_string_pretty(&value)
                .map_err(|err| AppError::unexpected(err.to_string()))?;
            writeln!(stdout, "{text}")
        }
        RenderResponse::Payload { body, .. } => stdout.write_all(&body),
    }
    .and_then(|()| stdout.flush())
    .map_err(|err| AppError::from(InfraError::from(err)))
}
