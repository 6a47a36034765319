#![deny(warnings)]

pub mod engine;
pub mod horizon;
pub mod score;
pub mod stats;
pub mod store;

type Result<T> = anyhow::Result<T>;

use chrono::Utc as TZ;
use common::config;
use engine::{ForecastGenerator, GenerationSummary};
use logging::*;
use std::future::Future;
use store::DbForecastStore;
use tokio::sync::Mutex;

/// 予測生成の排他ロック。生成は常に単一実行。
static RUN_GUARD: Mutex<()> = Mutex::const_new(());

#[derive(Debug, thiserror::Error)]
pub enum GenerateError {
    #[error("prediction generation is already running")]
    AlreadyRunning,
    #[error("horizon months must be a positive integer")]
    InvalidHorizon,
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

/// 予測セット全体を再生成する
///
/// 実行中に重ねて呼ばれた場合は待たずに `AlreadyRunning` を返す。
/// horizon 未指定時は設定値を使う。0 は受け付けない。
pub async fn regenerate(
    horizon_months: Option<u32>,
) -> std::result::Result<GenerationSummary, GenerateError> {
    if horizon_months == Some(0) {
        return Err(GenerateError::InvalidHorizon);
    }

    let _guard = RUN_GUARD
        .try_lock()
        .map_err(|_| GenerateError::AlreadyRunning)?;

    let horizon = horizon_months.unwrap_or_else(default_horizon_months);
    let generator = ForecastGenerator::new(DbForecastStore);
    Ok(generator.generate(horizon).await?)
}

fn default_horizon_months() -> u32 {
    config::get("FORECAST_HORIZON_MONTHS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(3)
}

pub async fn run() {
    const DEFAULT_CRON: &str = "0 0 3 * * *"; // デフォルト: 毎日午前3時
    let schedule = get_cron_schedule("FORECAST_CRON_SCHEDULE", DEFAULT_CRON);
    cronjob(schedule, run_generation, "forecast_generation").await;
}

async fn run_generation() -> Result<()> {
    let log = DEFAULT.new(o!("function" => "run_generation"));
    match regenerate(None).await {
        Ok(summary) => {
            info!(log, "predictions regenerated";
                "created" => summary.created,
                "horizon_months" => summary.horizon_months,
            );
            Ok(())
        }
        Err(GenerateError::AlreadyRunning) => {
            warn!(log, "generation already in progress, skipping this tick");
            Ok(())
        }
        Err(GenerateError::Storage(e)) => Err(e),
        Err(e) => Err(anyhow::Error::new(e)),
    }
}

/// 環境変数から cron スケジュールを取得してパースする
fn get_cron_schedule(env_var: &str, default: &str) -> cron::Schedule {
    let log = DEFAULT.new(o!("function" => "get_cron_schedule", "env_var" => env_var.to_owned()));
    let cron_conf = config::get(env_var).unwrap_or_else(|_| default.to_string());

    match cron_conf.parse() {
        Ok(s) => {
            info!(log, "cron schedule configured"; "schedule" => &cron_conf);
            s
        }
        Err(e) => {
            error!(log, "failed to parse cron schedule, using default";
                   "error" => ?e, "schedule" => &cron_conf, "default" => default);
            default.parse().unwrap()
        }
    }
}

async fn cronjob<F, Fut>(schedule: cron::Schedule, func: F, name: &str)
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<()>>,
{
    let log = DEFAULT.new(o!("function" => "cronjob", "name" => name.to_owned()));
    info!(log, "starting cron job");

    for (iteration, next) in schedule.upcoming(TZ).enumerate() {
        let now = TZ::now();
        debug!(log, "cron iteration"; "iteration" => iteration, "next" => %next, "now" => %now);

        // 実行時刻を過ぎている場合はスキップ
        if next <= now {
            warn!(log, "execution time already passed, skipping to next iteration";
                "next" => %next,
                "now" => %now,
                "iteration" => iteration
            );
            continue;
        }

        // 長時間sleepを避けるため、1分間隔でチェック
        loop {
            let now = TZ::now();
            if now >= next {
                break;
            }

            let remaining = match (next - now).to_std() {
                Ok(d) => d,
                Err(_) => break, // 時刻が過去になった場合は即座に実行
            };

            let sleep_duration = remaining.min(std::time::Duration::from_secs(60));

            if remaining.as_secs() > 300 {
                debug!(log, "still waiting for next execution";
                    "remaining_seconds" => remaining.as_secs(),
                    "next_time" => %next
                );
            }

            tokio::time::sleep(sleep_duration).await;
        }

        let exec_log = DEFAULT.new(o!("function" => "run", "name" => name.to_owned()));
        info!(exec_log, "executing scheduled task");

        match func().await {
            Ok(_) => info!(exec_log, "success"),
            Err(err) => error!(exec_log, "failure"; "error" => ?err),
        }
    }
}
