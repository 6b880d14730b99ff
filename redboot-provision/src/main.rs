//! `provision <command> <target ip address> <build name>`

use std::process::ExitCode;

use redboot_provision::request::USAGE;
use redboot_provision::{PingProber, Provisioner, ProvisioningRequest};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let request = match ProvisioningRequest::from_args(std::env::args().skip(1)) {
        Ok(request) => request,
        Err(e) => {
            log::debug!("{}", e);
            print!("{}", USAGE);
            return ExitCode::from(2);
        }
    };

    let provisioner = match Provisioner::builder(request).build() {
        Ok(provisioner) => provisioner,
        Err(e) => {
            eprintln!("provision: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let mut stdout = tokio::io::stdout();
    match provisioner.run(&mut PingProber::default(), &mut stdout).await {
        Ok(report) => {
            println!();
            for step in report.failed_steps() {
                eprintln!(
                    "provision: '{}' reported: {}",
                    step.command,
                    step.failure_message.as_deref().unwrap_or_default()
                );
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("\nprovision: {}", e);
            ExitCode::FAILURE
        }
    }
}
