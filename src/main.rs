//! Daemon entry point.
//!
//! Wires configuration, the PostgreSQL store, the weather provider, and the
//! notification channels together, then hands control to the scheduler.
//! `--once` runs a single cycle and exits (useful under cron or for smoke
//! testing); the default is the resident fixed-interval loop.

use std::process::ExitCode;
use std::time::Duration;

use floodsense_service::config::{self, Secrets, ServiceConfig};
use floodsense_service::ingest::openweather::OpenWeatherClient;
use floodsense_service::logging::{self, Component};
use floodsense_service::notify::email::{EmailTransport, SmtpSettings};
use floodsense_service::notify::sms::SmsGateway;
use floodsense_service::notify::Notifier;
use floodsense_service::pipeline::scheduler::{self, Scheduler};
use floodsense_service::store::postgres_store::PgStore;

const DEFAULT_CONFIG_PATH: &str = "floodsense.toml";

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("floodsense_service: {}", err);
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let run_once = args.iter().any(|a| a == "--once");
    let config_path = args
        .iter()
        .position(|a| a == "--config")
        .and_then(|i| args.get(i + 1))
        .map(String::as_str)
        .unwrap_or(DEFAULT_CONFIG_PATH);

    let config = config::load_config(config_path)?;
    let secrets = Secrets::from_env()?;

    logging::init_logger(config.logging.min_level(), config.logging.file.as_deref());

    let mut store = PgStore::connect(&secrets.database_url)?;
    let provider = OpenWeatherClient::new(
        &config.provider.base_url,
        &secrets.openweather_api_key,
        config.provider.timeout(),
    )?;
    let notifier = build_notifier(&config, &secrets)?;

    let interval = Duration::from_secs(config.scheduler.interval_minutes * 60);
    logging::info(
        Component::Scheduler,
        None,
        &format!(
            "starting (interval {} min, email {}, sms {})",
            config.scheduler.interval_minutes,
            if notifier.email.is_some() { "on" } else { "off" },
            if notifier.sms.is_some() { "on" } else { "off" },
        ),
    );

    if run_once {
        let summary = scheduler::run_cycle(&mut store, &provider, &notifier, chrono::Utc::now())?;
        logging::info(
            Component::Scheduler,
            None,
            &format!("single cycle finished: {:?}", summary),
        );
        return Ok(());
    }

    Scheduler::new(interval).run_forever(&mut store, &provider, &notifier)
}

fn build_notifier(
    config: &ServiceConfig,
    secrets: &Secrets,
) -> Result<Notifier, Box<dyn std::error::Error>> {
    let email = match &config.smtp {
        Some(smtp) => Some(EmailTransport::new(&SmtpSettings {
            host: smtp.host.clone(),
            port: smtp.port,
            from_address: smtp.from_address.clone(),
            username: secrets.smtp_username.clone(),
            password: secrets.smtp_password.clone(),
            timeout: Duration::from_secs(smtp.timeout_secs),
        })?),
        None => None,
    };

    let sms = match &config.sms {
        Some(sms) => Some(SmsGateway::new(
            &sms.gateway_url,
            secrets.sms_gateway_token.clone(),
            Duration::from_secs(sms.timeout_secs),
        )?),
        None => None,
    };

    Ok(Notifier { email, sms })
}
