//! yarrow CLI entry point

fn main() {
    // Fancy diagnostic reports
    let _ = yarrow::cli::report::setup_error_reporting();

    yarrow::cli::run();
}
