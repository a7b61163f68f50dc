use std::process::ExitCode;

fn main() -> ExitCode {
    match macro_anomaly::app::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("event=app_exit module=app status=error exit_code={} error={err}", err.exit_code());
            eprintln!("{err}");
            ExitCode::from(err.exit_code())
        }
    }
}
