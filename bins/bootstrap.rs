use dotenvy::dotenv;
use tracing::{error, info};
use uuid::Uuid;

use user_context::UserContext;

fn init_logging() {
    // load .env first so RUST_LOG takes effect
    dotenv().ok();
    match std::env::var("LOG_FORMAT").as_deref() {
        Ok("json") => common::utils::logging::init_logging_json(),
        _ => common::utils::logging::init_logging_default(),
    }
    info!(service = "bootstrap", event = "logger_init", "tracing subscriber initialized");
}

fn main() -> std::process::ExitCode {
    init_logging();

    let run_id = Uuid::new_v4();
    let pid = std::process::id();
    let version = env!("CARGO_PKG_VERSION");

    std::panic::set_hook(Box::new(move |info| {
        error!(service = "bootstrap", event = "panic", %run_id, pid, message = %info, "unhandled panic occurred");
    }));

    let cfg = match configs::AppConfig::load_and_validate() {
        Ok(cfg) => cfg,
        Err(e) => {
            error!(service = "bootstrap", event = "config_invalid", error = %e, "failed to load config.toml");
            return std::process::ExitCode::FAILURE;
        }
    };

    let rt = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(rt) => rt,
        Err(e) => {
            error!(service = "bootstrap", event = "runtime_build_failed", error = %e, "failed to build tokio runtime");
            return std::process::ExitCode::FAILURE;
        }
    };

    info!(service = "bootstrap", event = "start", %run_id, pid, version, "building user context");

    rt.block_on(async move {
        let ctx = match user_context::build_account_context(&cfg).await {
            Ok(ctx) => ctx,
            Err(e) => {
                error!(service = "bootstrap", event = "context_build_failed", error = %e, "failed to build user context");
                return std::process::ExitCode::FAILURE;
            }
        };
        // an incomplete config would otherwise only fail on first use
        if let Err(e) = ctx.config().validate() {
            error!(service = "bootstrap", event = "context_incomplete", key = e.key(), error = %e, "user context is not usable");
            return std::process::ExitCode::FAILURE;
        }
        info!(
            service = "bootstrap",
            event = "ready",
            repo = ?cfg.context.repo,
            user = ?cfg.context.user,
            "user context ready"
        );
        std::process::ExitCode::SUCCESS
    })
}
