//! [`Config`]-related definitions.

use std::time;

use config::{builder::DefaultState, ConfigBuilder, ConfigError};
use derive_more::{Display, Error};
use serde::Deserialize;
use service::domain::user;
use smart_default::SmartDefault;

/// Application configuration.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct Config {
    /// Service configuration.
    pub service: Service,

    /// Postgres configuration.
    pub postgres: Postgres,

    /// Log configuration.
    pub log: Log,
}

impl Config {
    /// Creates a new [`Config`] by:
    /// - loading it from the provided `path` (if any);
    /// - merging it with the environment variables (if any);
    /// - using default values for missing fields.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn new(path: impl AsRef<str>) -> Result<Self, ConfigError> {
        ConfigBuilder::<DefaultState>::default()
            .add_source(config::File::with_name(path.as_ref()).required(false))
            .add_source(config::Environment::with_prefix("CONF").separator("."))
            .build()?
            .try_deserialize()
    }
}

/// Service configuration.
#[derive(Clone, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Service {
    /// Email administrative digests and notices are sent to.
    #[default("admin@localhost.localdomain".to_owned())]
    pub admin_email: String,

    /// Day of the month rent payment reminders are sent at.
    #[default(1)]
    pub rent_reminder_day: u8,

    /// Service tasks configuration.
    pub tasks: Tasks,
}

impl Service {
    /// Last day of the month rent payment reminders may be sent at, so they
    /// are sent every month.
    pub const MAX_RENT_REMINDER_DAY: u8 = 28;
}

impl TryFrom<Service> for service::Config {
    type Error = InvalidServiceConfig;

    fn try_from(value: Service) -> Result<Self, Self::Error> {
        let Service {
            admin_email,
            rent_reminder_day,
            tasks: Tasks { sweeps },
        } = value;

        if !(1..=Service::MAX_RENT_REMINDER_DAY).contains(&rent_reminder_day) {
            return Err(InvalidServiceConfig::RentReminderDay(
                rent_reminder_day,
            ));
        }
        Ok(Self {
            admin_email: user::Email::new(admin_email.as_str())
                .ok_or(InvalidServiceConfig::AdminEmail(admin_email))?,
            rent_reminder_day,
            sweeps: service::task::run_sweeps::Config {
                interval: sweeps.interval,
            },
        })
    }
}

/// Error of converting a [`Service`] configuration into a
/// [`service::Config`].
#[derive(Clone, Debug, Display, Error)]
pub enum InvalidServiceConfig {
    /// `service.admin_email` is not a valid email address.
    #[display("`service.admin_email` is not a valid email: `{_0}`")]
    AdminEmail(#[error(not(source))] String),

    /// `service.rent_reminder_day` is not a day every month has.
    #[display(
        "`service.rent_reminder_day` must be within `1..={}`, got `{_0}`",
        Service::MAX_RENT_REMINDER_DAY,
    )]
    RentReminderDay(#[error(not(source))] u8),
}

/// Service tasks configuration.
#[derive(Clone, Copy, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Tasks {
    /// `RunSweeps` task configuration.
    pub sweeps: Task,
}

/// Service task configuration.
#[derive(Clone, Copy, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Task {
    /// Task execution interval.
    #[default(time::Duration::from_secs(60 * 60 * 24))]
    #[serde(with = "humantime_serde")]
    pub interval: time::Duration,
}

/// Postgres configuration.
#[derive(Clone, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Postgres {
    /// Host to connect to.
    #[default("127.0.0.1".to_owned())]
    pub host: String,

    /// Port to connect to.
    #[default(5432)]
    pub port: u16,

    /// User to connect as.
    #[default("postgres".to_owned())]
    pub user: String,

    /// Password to connect with.
    #[default("postgres".to_owned())]
    pub password: String,

    /// Database name to connect to.
    #[default("postgres".to_owned())]
    pub dbname: String,
}

impl From<Postgres> for service::infra::postgres::Config {
    fn from(value: Postgres) -> Self {
        let Postgres {
            host,
            port,
            user,
            password,
            dbname,
        } = value;

        Self {
            host: Some(host),
            port: Some(port),
            user: Some(user),
            password: Some(password),
            dbname: Some(dbname),
            ..Self::default()
        }
    }
}

/// Log configuration.
#[derive(Clone, Copy, Debug, Default, Deserialize)]
#[serde(default)]
pub struct Log {
    /// Log level.
    pub level: LogLevel,
}

/// Log level.
#[derive(Clone, Copy, Debug, Default, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LogLevel {
    /// Designates very low priority, often extremely verbose, information.
    Trace,

    /// Designates lower priority information.
    Debug,

    /// Designates useful information.
    #[default]
    Info,

    /// Designates hazardous situations.
    Warn,

    /// Designates very serious errors.
    Error,
}

impl From<LogLevel> for tracing::Level {
    fn from(value: LogLevel) -> Self {
        match value {
            LogLevel::Trace => Self::TRACE,
            LogLevel::Debug => Self::DEBUG,
            LogLevel::Info => Self::INFO,
            LogLevel::Warn => Self::WARN,
            LogLevel::Error => Self::ERROR,
        }
    }
}

#[cfg(test)]
mod spec {
    use std::time::Duration;

    use super::{Config, InvalidServiceConfig, Service};

    #[test]
    fn defaults_to_daily_sweeps() {
        let conf = Config::default();

        assert_eq!(conf.service.rent_reminder_day, 1);
        assert_eq!(
            conf.service.tasks.sweeps.interval,
            Duration::from_secs(86_400),
        );

        let conf = service::Config::try_from(conf.service).unwrap();
        assert_eq!(conf.admin_email.to_string(), "admin@localhost.localdomain");
    }

    #[test]
    fn rejects_invalid_service_config() {
        let err = service::Config::try_from(Service {
            admin_email: "not an email".to_owned(),
            ..Service::default()
        })
        .unwrap_err();
        assert!(matches!(err, InvalidServiceConfig::AdminEmail(_)));

        for day in [0, 29] {
            let err = service::Config::try_from(Service {
                rent_reminder_day: day,
                ..Service::default()
            })
            .unwrap_err();
            assert!(
                matches!(
                    err,
                    InvalidServiceConfig::RentReminderDay(d) if d == day,
                ),
                "{day}",
            );
        }
    }
}
