use std::{backtrace::Backtrace, io, io::Write, process::ExitCode};

use chrono::{Local, SecondsFormat};
use users_api_sdk::{UsersApiClient, UsersApiError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    Completed(usize),
    Failed,
}

impl RefreshOutcome {
    pub fn exit_code(self) -> ExitCode {
        match self {
            Self::Completed(_) => ExitCode::SUCCESS,
            Self::Failed => ExitCode::FAILURE,
        }
    }
}

fn timestamp() -> String {
    Local::now().to_rfc3339_opts(SecondsFormat::Secs, false)
}

pub async fn refresh_user_cache<W: Write>(
    client: &UsersApiClient,
    out: &mut W,
) -> io::Result<RefreshOutcome> {
    writeln!(out, "[{}] Starting Refresh of Users Cache...", timestamp())?;

    match client.get_users(true).await {
        Ok(users) => {
            writeln!(
                out,
                "[{}] Users Cache refreshed with {} users.",
                timestamp(),
                users.len()
            )?;
            Ok(RefreshOutcome::Completed(users.len()))
        }
        Err(error) => report_failure(out, error),
    }
}

pub async fn refresh_subsidiary_cache<W: Write>(
    client: &UsersApiClient,
    out: &mut W,
) -> io::Result<RefreshOutcome> {
    writeln!(out, "[{}] Starting Refresh of Subsidiary Cache...", timestamp())?;

    match client.get_subsidiaries(true, None).await {
        Ok(subsidiaries) => {
            writeln!(
                out,
                "[{}] Subsidiary Cache refreshed with {} subsidiaries.",
                timestamp(),
                subsidiaries.len()
            )?;
            Ok(RefreshOutcome::Completed(subsidiaries.len()))
        }
        Err(error) => report_failure(out, error),
    }
}

fn report_failure<W: Write>(out: &mut W, error: UsersApiError) -> io::Result<RefreshOutcome> {
    writeln!(
        out,
        "[{}] Process finished with an error : {}",
        timestamp(),
        error
    )?;
    writeln!(out, "{error:?}")?;
    writeln!(out, "{}", Backtrace::force_capture())?;
    Ok(RefreshOutcome::Failed)
}
