use std::process::ExitCode;

fn main() -> ExitCode {
    giftfunnel_cli::run()
}
