use image_archive_retag::cli::{Args, Runner};
use image_archive_retag::logging::Logger;
use std::process;

fn main() {
    let args = Args::parse_args();

    let runner = match Runner::new(args) {
        Ok(runner) => runner,
        Err(e) => {
            Logger::default().error(&e.to_string());
            process::exit(2);
        }
    };

    if let Err(e) = runner.run() {
        runner.logger().error(&e.to_string());
        process::exit(1);
    }
}
