fn main() {
    if let Err(err) = energy_dashboard::app::run() {
        eprintln!("api startup failed: {err}");
        std::process::exit(1);
    }
}
